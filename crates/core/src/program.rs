//! The compiled form of a Symphony program.

use crate::quad::Quad;
use crate::types::DataType;
use crate::value::Value;
use std::collections::HashMap;

/// Everything the VM needs to know about one function.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    /// `None` means `VOID`.
    pub return_type: Option<DataType>,
    /// Parameter types in declaration order.
    pub parameter_types: Vec<DataType>,
    /// Local addresses the arguments are copied into, matching
    /// `parameter_types` position for position.
    pub parameter_addresses: Vec<u32>,
    /// Index of the function's first quadruple.
    pub starting_quad: usize,
    /// The dedicated local return slot, once a `return` has been seen.
    pub return_address: Option<u32>,
}

/// Output of the compiler, input of the orchestra.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub quads: Vec<Quad>,
    /// Interned literals, keyed by their constant-sector address.
    pub constants: HashMap<u32, Value>,
    /// Every user-defined function, keyed by name. Top-level code is not a
    /// function; it is reachable through the quad-0 `GOTO`.
    pub functions: HashMap<String, FunctionInfo>,
}

impl CompiledProgram {
    /// Render the persisted `.note` form: one quadruple per line.
    pub fn to_note(&self) -> String {
        let lines: Vec<String> = self.quads.iter().map(Quad::to_string).collect();
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quad::{Operand, Quad};

    #[test]
    fn test_to_note_is_one_quad_per_line() {
        let program = CompiledProgram {
            quads: vec![
                Quad::Goto { target: Some(2) },
                Quad::Endproc {
                    function: "f".to_string(),
                },
                Quad::Assign {
                    src: Operand::direct(200_000),
                    dest: Operand::direct(10_000),
                },
            ],
            constants: HashMap::new(),
            functions: HashMap::new(),
        };
        assert_eq!(program.to_note(), "GOTO 2\nENDPROC f\n= 200000 10000");
    }
}
