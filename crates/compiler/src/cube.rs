//! The semantic cube and the unary operator table.
//!
//! Static answers to "what type does `left op right` produce?"; `None`
//! means the combination is invalid and the caller raises a type error
//! naming the operator and operand types.

use symphony_core::{BinOp, DataType, UnOp};

/// Result type of a binary operation, per the cube.
pub fn binary_result(left: DataType, right: DataType, op: BinOp) -> Option<DataType> {
    use BinOp::*;
    use DataType::*;

    match (left, right) {
        (Int, Int) => match op {
            Div => Some(Dec),
            Add | Sub | Mul | Pow | Mod => Some(Int),
            Equals | Greater | Less | GreaterEqual | LessEqual => Some(Bool),
            And | Or => None,
        },
        (Int, Dec) | (Dec, Int) | (Dec, Dec) => match op {
            Add | Sub | Mul | Div | Pow | Mod => Some(Dec),
            Equals | Greater | Less | GreaterEqual | LessEqual => Some(Bool),
            And | Or => None,
        },
        (Str, Str) | (Char, Char) => match op {
            Add => Some(Str),
            Equals | Greater | Less | GreaterEqual | LessEqual => Some(Bool),
            _ => None,
        },
        (Str, Char) | (Char, Str) => match op {
            Add => Some(Str),
            _ => None,
        },
        (Bool, Bool) => match op {
            And | Or | Equals | Greater | Less | GreaterEqual | LessEqual => Some(Bool),
            _ => None,
        },
        _ => None,
    }
}

/// Result type of a unary operation.
pub fn unary_result(operand: DataType, op: UnOp) -> Option<DataType> {
    use DataType::*;
    use UnOp::*;

    match (operand, op) {
        (Int, Increment | Decrement | Plus | Minus) => Some(Int),
        (Dec, Increment | Decrement | Plus | Minus) => Some(Dec),
        (Bool, Not) => Some(Bool),
        _ => None,
    }
}
