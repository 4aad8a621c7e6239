//! The VM's partitioned memory image.
//!
//! One slot map per sector. The per-type sub-partitioning is implicit in
//! the address itself, so slots are keyed by raw address and the type of a
//! slot never has to be stored beside it.

use std::collections::HashMap;
use symphony_core::{ErrorKind, Operand, Sector, SymphonyError, Value};

/// A snapshot of the local sector, taken at `GOSUB` and restored at
/// `ENDPROC`.
pub type ActivationRecord = HashMap<u32, Value>;

#[derive(Debug, Default)]
pub struct Memory {
    global: HashMap<u32, Value>,
    temporal: HashMap<u32, Value>,
    constant: HashMap<u32, Value>,
    local: HashMap<u32, Value>,
}

impl Memory {
    /// A fresh image with the constant sector seeded from the compiled
    /// program's pool.
    pub fn new(constants: HashMap<u32, Value>) -> Self {
        Memory {
            constant: constants,
            ..Memory::default()
        }
    }

    fn slots(&self, sector: Sector) -> &HashMap<u32, Value> {
        match sector {
            Sector::Global => &self.global,
            Sector::Temporal => &self.temporal,
            Sector::Constant => &self.constant,
            Sector::Local => &self.local,
        }
    }

    fn slots_mut(&mut self, sector: Sector) -> &mut HashMap<u32, Value> {
        match sector {
            Sector::Global => &mut self.global,
            Sector::Temporal => &mut self.temporal,
            Sector::Constant => &mut self.constant,
            Sector::Local => &mut self.local,
        }
    }

    fn sector_of(address: u32) -> Result<Sector, SymphonyError> {
        Sector::of(address).ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::Index,
                format!("address {} is outside the memory image", address),
            )
        })
    }

    /// Resolve one level of `&` indirection down to a plain address.
    fn resolve(&self, operand: Operand) -> Result<u32, SymphonyError> {
        if !operand.indirect {
            return Ok(operand.address);
        }
        match self.read(operand.address)? {
            Value::Int(address) => u32::try_from(address).map_err(|_| {
                SymphonyError::runtime(
                    ErrorKind::Index,
                    format!("computed address {} is outside the memory image", address),
                )
            }),
            other => Err(SymphonyError::runtime(
                ErrorKind::Type,
                format!("a pointer slot held a {} instead of an address", other.data_type()),
            )),
        }
    }

    fn read(&self, address: u32) -> Result<Value, SymphonyError> {
        let sector = Self::sector_of(address)?;
        self.slots(sector).get(&address).cloned().ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::Uninitialized,
                "Sorry, but you tried to use a variable before assignment. \
                 Please check your program",
            )
        })
    }

    /// The value an operand refers to.
    pub fn value(&self, operand: Operand) -> Result<Value, SymphonyError> {
        let address = self.resolve(operand)?;
        self.read(address)
    }

    /// Store a value where an operand points.
    pub fn store(&mut self, value: Value, operand: Operand) -> Result<(), SymphonyError> {
        let address = self.resolve(operand)?;
        let sector = Self::sector_of(address)?;
        self.slots_mut(sector).insert(address, value);
        Ok(())
    }

    /// Copy of the local sector, for an activation record.
    pub fn snapshot_local(&self) -> ActivationRecord {
        self.local.clone()
    }

    /// Replace the local sector with a previously taken snapshot.
    pub fn restore_local(&mut self, frame: ActivationRecord) {
        self.local = frame;
    }

    /// Direct peek at one local slot, used by `ENDPROC` to carry the return
    /// value across the frame restore.
    pub fn local_slot(&self, address: u32) -> Option<&Value> {
        self.local.get(&address)
    }
}
