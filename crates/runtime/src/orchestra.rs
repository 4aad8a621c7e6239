//! The quadruple interpreter.
//!
//! A program counter walks the quad list; arithmetic quads advance it,
//! control quads return the next index. All state lives inside the
//! [`Orchestra`] value, so repeated plays are independent.

use crate::memory::{ActivationRecord, Memory};
use crate::ops;
use std::collections::HashMap;
use symphony_core::{
    CompiledProgram, ErrorKind, FunctionInfo, Operand, Quad, SymphonyError, Value,
};
use tracing::debug;

pub struct Orchestra {
    pub(crate) memory: Memory,
    activation_records: Vec<ActivationRecord>,
    stored_program_counters: Vec<usize>,
    /// Argument operands queued by `PARAM`, consumed LIFO by builtins and
    /// in order by `GOSUB`.
    pub(crate) parameters: Vec<Operand>,
    pub(crate) prints: Vec<String>,
    pub(crate) notes: Vec<String>,
    pub(crate) inputs: Vec<String>,
    pub(crate) input_counter: usize,
    functions: HashMap<String, FunctionInfo>,
}

impl Orchestra {
    /// Play a compiled program to completion. Returns the captured prints
    /// and notes, in emission order.
    pub fn play(
        program: &CompiledProgram,
        inputs: Vec<String>,
    ) -> Result<(Vec<String>, Vec<String>), SymphonyError> {
        let mut orchestra = Orchestra {
            memory: Memory::new(program.constants.clone()),
            activation_records: Vec::new(),
            stored_program_counters: Vec::new(),
            parameters: Vec::new(),
            prints: Vec::new(),
            notes: Vec::new(),
            inputs,
            input_counter: 0,
            functions: program.functions.clone(),
        };

        let mut pc = 0;
        while pc < program.quads.len() {
            pc = orchestra.step(&program.quads[pc], pc)?;
        }
        orchestra.finish()
    }

    /// Execute one quadruple and return the next program counter.
    fn step(&mut self, quad: &Quad, pc: usize) -> Result<usize, SymphonyError> {
        match quad {
            Quad::Binary {
                op,
                left,
                right,
                dest,
            } => {
                let left_value = self.memory.value(*left)?;
                let right_value = self.memory.value(*right)?;
                let result = ops::apply_binary(*op, &left_value, &right_value)?;
                self.memory.store(result, *dest)?;
                Ok(pc + 1)
            }
            Quad::Unary { op, src, dest } => {
                let value = self.memory.value(*src)?;
                let result = ops::apply_unary(*op, &value)?;
                self.memory.store(result, *dest)?;
                Ok(pc + 1)
            }
            Quad::Assign { src, dest } => {
                let value = self.memory.value(*src)?;
                self.memory.store(value, *dest)?;
                Ok(pc + 1)
            }
            Quad::Goto { target } => self.jump_target(*target),
            Quad::Gotof { cond, target } => match self.memory.value(*cond)? {
                Value::Bool(true) => Ok(pc + 1),
                Value::Bool(false) => self.jump_target(*target),
                other => Err(SymphonyError::runtime(
                    ErrorKind::Type,
                    format!(
                        "a branch condition held a {} instead of a BOOL",
                        other.data_type()
                    ),
                )),
            },
            Quad::Param { arg, .. } => {
                self.parameters.push(*arg);
                Ok(pc + 1)
            }
            Quad::Gosub { function } => self.gosub(function, pc),
            Quad::Endproc { function } => self.endproc(function),
            Quad::Ver {
                offset,
                lower,
                upper,
            } => {
                let offset = self.int_value(*offset)?;
                if offset < *lower || offset >= *upper {
                    return Err(SymphonyError::runtime(
                        ErrorKind::Index,
                        format!(
                            "Index out of bounds: {}. This one should be greater than or \
                             equal to {} and smaller than {}",
                            offset, lower, upper
                        ),
                    ));
                }
                Ok(pc + 1)
            }
            Quad::Access { base, offset, dest } => {
                let offset = self.int_value(*offset)?;
                // The offset was bound-checked by the preceding VER, so the
                // sum stays inside the array's reserved slots.
                let element = i64::from(*base) + offset;
                self.memory.store(Value::Int(element), *dest)?;
                Ok(pc + 1)
            }
            Quad::Special { op, result } => {
                self.call_special(*op, *result)?;
                Ok(pc + 1)
            }
        }
    }

    fn jump_target(&self, target: Option<usize>) -> Result<usize, SymphonyError> {
        target.ok_or_else(|| {
            SymphonyError::runtime(ErrorKind::NotImplemented, "jump with no target was played")
        })
    }

    /// Save the current activation record and enter a function.
    fn gosub(&mut self, name: &str, pc: usize) -> Result<usize, SymphonyError> {
        let function = self.function(name)?.clone();
        debug!(function = name, "entering");
        self.activation_records.push(self.memory.snapshot_local());

        // The callee inherits the caller's locals and overwrites its own
        // parameter slots, argument by argument.
        let arguments = std::mem::take(&mut self.parameters);
        for (address, argument) in function.parameter_addresses.iter().zip(arguments) {
            let value = self.memory.value(argument)?;
            self.memory.store(value, Operand::direct(*address))?;
        }

        self.stored_program_counters.push(pc);
        Ok(function.starting_quad)
    }

    /// Restore the previous activation record, carrying the return slot.
    fn endproc(&mut self, name: &str) -> Result<usize, SymphonyError> {
        let return_address = self.function(name)?.return_address;
        debug!(function = name, "leaving");
        if let Some(return_address) = return_address
            && let Some(value) = self.memory.local_slot(return_address).cloned()
            && let Some(frame) = self.activation_records.last_mut()
        {
            frame.insert(return_address, value);
        }

        let frame = self.activation_records.pop().ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::NotImplemented,
                format!("ENDPROC {} was played outside a call", name),
            )
        })?;
        self.memory.restore_local(frame);
        let return_pc = self.stored_program_counters.pop().ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::NotImplemented,
                format!("ENDPROC {} had no return program counter", name),
            )
        })?;
        Ok(return_pc + 1)
    }

    fn function(&self, name: &str) -> Result<&FunctionInfo, SymphonyError> {
        self.functions.get(name).ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::NotImplemented,
                format!("the function {} is not in the compiled program", name),
            )
        })
    }

    pub(crate) fn int_value(&self, operand: Operand) -> Result<i64, SymphonyError> {
        match self.memory.value(operand)? {
            Value::Int(n) => Ok(n),
            other => Err(SymphonyError::runtime(
                ErrorKind::Type,
                format!("expected an INT value, found a {}", other.data_type()),
            )),
        }
    }

    /// Termination: every supplied input line must have been consumed.
    fn finish(self) -> Result<(Vec<String>, Vec<String>), SymphonyError> {
        if self.input_counter != self.inputs.len() {
            return Err(SymphonyError::runtime(
                ErrorKind::Arity,
                "The wrong amount of input lines was submitted",
            ));
        }
        Ok((self.prints, self.notes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphony_core::{BinOp, SpecialOp};

    fn program(quads: Vec<Quad>, constants: Vec<(u32, Value)>) -> CompiledProgram {
        CompiledProgram {
            quads,
            constants: constants.into_iter().collect(),
            functions: HashMap::new(),
        }
    }

    #[test]
    fn test_straight_line_arithmetic_and_print() {
        // print(2 + 3)
        let program = program(
            vec![
                Quad::Binary {
                    op: BinOp::Add,
                    left: Operand::direct(200_000),
                    right: Operand::direct(200_001),
                    dest: Operand::direct(130_000),
                },
                Quad::Param {
                    arg: Operand::direct(130_000),
                    index: 1,
                },
                Quad::Special {
                    op: SpecialOp::Print,
                    result: None,
                },
            ],
            vec![(200_000, Value::Int(2)), (200_001, Value::Int(3))],
        );
        let (prints, notes) = Orchestra::play(&program, Vec::new()).unwrap();
        assert_eq!(prints, vec!["5".to_string()]);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_gotof_skips_on_false() {
        // if (false) { A(); }  -- the note must not play
        let program = program(
            vec![
                Quad::Gotof {
                    cond: Operand::direct(230_000),
                    target: Some(2),
                },
                Quad::Special {
                    op: SpecialOp::NoteA,
                    result: None,
                },
                Quad::Special {
                    op: SpecialOp::NoteB,
                    result: None,
                },
            ],
            vec![(230_000, Value::Bool(false))],
        );
        let (_, notes) = Orchestra::play(&program, Vec::new()).unwrap();
        assert_eq!(notes, vec!["B".to_string()]);
    }

    #[test]
    fn test_ver_raises_index_error() {
        let program = program(
            vec![Quad::Ver {
                offset: Operand::direct(200_000),
                lower: 0,
                upper: 2,
            }],
            vec![(200_000, Value::Int(2))],
        );
        let err = Orchestra::play(&program, Vec::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Index);
    }

    #[test]
    fn test_access_materializes_element_address() {
        // slot 130_000 becomes a pointer to base+offset; writing through it
        // lands in the array.
        let program = program(
            vec![
                Quad::Access {
                    base: 10_000,
                    offset: Operand::direct(200_000),
                    dest: Operand::direct(130_000),
                },
                Quad::Assign {
                    src: Operand::direct(200_001),
                    dest: Operand::indirect(130_000),
                },
                Quad::Param {
                    arg: Operand::indirect(130_000),
                    index: 1,
                },
                Quad::Special {
                    op: SpecialOp::Print,
                    result: None,
                },
            ],
            vec![(200_000, Value::Int(1)), (200_001, Value::Int(9))],
        );
        let (prints, _) = Orchestra::play(&program, Vec::new()).unwrap();
        assert_eq!(prints, vec!["9".to_string()]);
    }

    #[test]
    fn test_unconsumed_inputs_are_an_arity_error() {
        let program = program(vec![], vec![]);
        let err = Orchestra::play(&program, vec!["line".to_string()]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Arity);
    }

    #[test]
    fn test_unpatched_jump_is_reported() {
        let program = program(vec![Quad::Goto { target: None }], vec![]);
        let err = Orchestra::play(&program, Vec::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotImplemented);
    }
}
