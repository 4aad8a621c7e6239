//! Integration tests for the call discipline: GOSUB snapshots the local
//! sector, ENDPROC restores it and carries the return slot across.

use std::collections::HashMap;
use symphony_core::{BinOp, CompiledProgram, FunctionInfo, Operand, Quad, SpecialOp, Value};
use symphony_runtime::Orchestra;

/// A hand-assembled program equivalent to:
///
/// ```text
/// fun int double(int n) { return n * 2; }
/// int x;
/// x = 21;
/// print(double(x));
/// ```
fn double_program() -> CompiledProgram {
    let n = 250_000; // parameter slot
    let ret = 250_001; // dedicated return slot
    let x = 10_000; // global variable
    let result = 250_002; // caller-side result holder
    let temp = 130_000;

    let quads = vec![
        Quad::Goto { target: Some(5) },
        // double:
        Quad::Binary {
            op: BinOp::Mul,
            left: Operand::direct(n),
            right: Operand::direct(200_001),
            dest: Operand::direct(temp),
        },
        Quad::Assign {
            src: Operand::direct(temp),
            dest: Operand::direct(ret),
        },
        Quad::Goto { target: Some(4) },
        Quad::Endproc {
            function: "double".to_string(),
        },
        // main:
        Quad::Assign {
            src: Operand::direct(200_000),
            dest: Operand::direct(x),
        },
        Quad::Param {
            arg: Operand::direct(x),
            index: 1,
        },
        Quad::Gosub {
            function: "double".to_string(),
        },
        Quad::Assign {
            src: Operand::direct(ret),
            dest: Operand::direct(result),
        },
        Quad::Param {
            arg: Operand::direct(result),
            index: 1,
        },
        Quad::Special {
            op: SpecialOp::Print,
            result: None,
        },
    ];

    let mut functions = HashMap::new();
    functions.insert(
        "double".to_string(),
        FunctionInfo {
            name: "double".to_string(),
            return_type: Some(symphony_core::DataType::Int),
            parameter_types: vec![symphony_core::DataType::Int],
            parameter_addresses: vec![n],
            starting_quad: 1,
            return_address: Some(ret),
        },
    );

    let mut constants = HashMap::new();
    constants.insert(200_000, Value::Int(21));
    constants.insert(200_001, Value::Int(2));

    CompiledProgram {
        quads,
        constants,
        functions,
    }
}

#[test]
fn test_call_returns_through_the_return_slot() {
    let (prints, notes) = Orchestra::play(&double_program(), Vec::new()).unwrap();
    assert_eq!(prints, vec!["42".to_string()]);
    assert!(notes.is_empty());
}

#[test]
fn test_replaying_a_program_is_deterministic() {
    let program = double_program();
    let first = Orchestra::play(&program, Vec::new()).unwrap();
    let second = Orchestra::play(&program, Vec::new()).unwrap();
    assert_eq!(first, second);
}
