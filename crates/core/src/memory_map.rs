//! The partitioned address space shared by the compiler and the VM.
//!
//! One linear 32-bit space is split into four sectors, and each sector into
//! five equal sub-ranges, one per [`DataType`] in enum order. An address by
//! itself therefore reveals both its sector and its type; neither side of
//! the toolchain ever has to ship type tags next to addresses.

use crate::error::SymphonyError;
use crate::types::DataType;
use std::fmt;

pub const GLOBAL_START: u32 = 10_000;
pub const TEMPORAL_START: u32 = 130_000;
pub const CONSTANT_START: u32 = 200_000;
pub const LOCAL_START: u32 = 250_000;
pub const MEMORY_END: u32 = 350_000;

/// One of the four contiguous regions of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    /// Variables of the program's top scope
    Global,
    /// Expression intermediates
    Temporal,
    /// Interned literal constants
    Constant,
    /// Variables of the current function
    Local,
}

impl Sector {
    pub const ALL: [Sector; 4] = [
        Sector::Global,
        Sector::Temporal,
        Sector::Constant,
        Sector::Local,
    ];

    /// Half-open `[start, end)` address range of this sector.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            Sector::Global => (GLOBAL_START, TEMPORAL_START),
            Sector::Temporal => (TEMPORAL_START, CONSTANT_START),
            Sector::Constant => (CONSTANT_START, LOCAL_START),
            Sector::Local => (LOCAL_START, MEMORY_END),
        }
    }

    /// Half-open address range of one type's sub-range inside this sector.
    pub fn type_bounds(self, data_type: DataType) -> (u32, u32) {
        let (start, end) = self.bounds();
        let slice = (end - start) / DataType::COUNT as u32;
        let low = start + slice * data_type.index() as u32;
        (low, low + slice)
    }

    /// The sector an address belongs to, if any.
    pub fn of(address: u32) -> Option<Sector> {
        Sector::ALL
            .into_iter()
            .find(|sector| {
                let (start, end) = sector.bounds();
                (start..end).contains(&address)
            })
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sector::Global => "global",
            Sector::Temporal => "temporal",
            Sector::Constant => "constant",
            Sector::Local => "local",
        };
        write!(f, "{}", name)
    }
}

/// The type owning an address, derived from the partitioning alone.
pub fn type_of(address: u32) -> Option<DataType> {
    let sector = Sector::of(address)?;
    DataType::ALL.into_iter().find(|data_type| {
        let (start, end) = sector.type_bounds(*data_type);
        (start..end).contains(&address)
    })
}

/// Monotonic next-address counters, one per sector × type.
///
/// Used only during compilation; the VM never allocates. Array
/// declarations reserve `size` consecutive slots in one call.
#[derive(Debug)]
pub struct AddressAllocator {
    next: [[u32; DataType::COUNT]; Sector::ALL.len()],
}

impl AddressAllocator {
    pub fn new() -> Self {
        let mut next = [[0u32; DataType::COUNT]; Sector::ALL.len()];
        for sector in Sector::ALL {
            for data_type in DataType::ALL {
                next[sector.index()][data_type.index()] = sector.type_bounds(data_type).0;
            }
        }
        AddressAllocator { next }
    }

    /// Reserve `count` consecutive addresses and return the first one.
    pub fn reserve(
        &mut self,
        sector: Sector,
        data_type: DataType,
        count: u32,
        line: usize,
    ) -> Result<u32, SymphonyError> {
        let slot = &mut self.next[sector.index()][data_type.index()];
        let address = *slot;
        let (_, end) = sector.type_bounds(data_type);
        if count > end - address {
            return Err(SymphonyError::capacity(
                line,
                format!(
                    "your program needs more {} values in the {} sector than the orchestra provides",
                    data_type, sector
                ),
            ));
        }
        *slot = address + count;
        Ok(address)
    }
}

impl Default for AddressAllocator {
    fn default() -> Self {
        Self::new()
    }
}
