//! Signatures of the reserved functions.
//!
//! Each implemented builtin maps to its VM opcode, its return type and the
//! accepted type sets of its arguments. `read` and `concat` are reserved
//! names without a signature; calling them is reported as not implemented.

use std::collections::HashMap;
use std::sync::LazyLock;
use symphony_core::{DataType, SpecialOp};

/// Signature of one builtin: opcode, return type (`None` for void) and one
/// accepted type set per argument.
#[derive(Debug, Clone)]
pub struct SpecialSignature {
    pub op: SpecialOp,
    pub return_type: Option<DataType>,
    pub parameter_types: Vec<&'static [DataType]>,
}

const ANY: &[DataType] = &DataType::ALL;
const NUMERIC: &[DataType] = &[DataType::Int, DataType::Dec];
const STR_ONLY: &[DataType] = &[DataType::Str];
const INT_ONLY: &[DataType] = &[DataType::Int];
const DEC_ONLY: &[DataType] = &[DataType::Dec];

static SPECIAL_SIGNATURES: LazyLock<HashMap<&'static str, SpecialSignature>> =
    LazyLock::new(|| {
        let mut signatures = HashMap::new();
        let mut insert = |op: SpecialOp,
                          return_type: Option<DataType>,
                          parameter_types: Vec<&'static [DataType]>| {
            signatures.insert(
                op.name(),
                SpecialSignature {
                    op,
                    return_type,
                    parameter_types,
                },
            );
        };

        insert(SpecialOp::Print, None, vec![ANY]);
        insert(SpecialOp::Println, None, vec![ANY]);
        insert(SpecialOp::ToStr, Some(DataType::Str), vec![ANY]);
        insert(SpecialOp::Get, Some(DataType::Char), vec![STR_ONLY, INT_ONLY]);
        insert(SpecialOp::Sqrt, Some(DataType::Dec), vec![NUMERIC]);
        insert(SpecialOp::Log, Some(DataType::Dec), vec![NUMERIC]);
        insert(SpecialOp::Random, Some(DataType::Dec), vec![]);
        insert(SpecialOp::LittleStar, None, vec![]);
        insert(SpecialOp::NoteA, None, vec![]);
        insert(SpecialOp::NoteB, None, vec![]);
        insert(SpecialOp::NoteC, None, vec![]);
        insert(SpecialOp::NoteD, None, vec![]);
        insert(SpecialOp::NoteE, None, vec![]);
        insert(SpecialOp::NoteF, None, vec![]);
        insert(SpecialOp::NoteG, None, vec![]);
        insert(SpecialOp::Length, Some(DataType::Int), vec![STR_ONLY]);
        insert(SpecialOp::Copy, None, vec![STR_ONLY, STR_ONLY]);
        insert(SpecialOp::Input, Some(DataType::Str), vec![]);
        insert(SpecialOp::Floor, Some(DataType::Int), vec![DEC_ONLY]);
        insert(SpecialOp::Ceil, Some(DataType::Int), vec![DEC_ONLY]);
        signatures
    });

/// The signature of a reserved function, if it has one.
pub fn special_signature(name: &str) -> Option<&'static SpecialSignature> {
    SPECIAL_SIGNATURES.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_str_is_listed_once_and_returns_str() {
        let signature = special_signature("to_str").unwrap();
        assert_eq!(signature.return_type, Some(DataType::Str));
        assert_eq!(signature.parameter_types.len(), 1);
    }

    #[test]
    fn test_reserved_but_unsigned_names_have_no_signature() {
        assert!(special_signature("read").is_none());
        assert!(special_signature("concat").is_none());
    }

    #[test]
    fn test_note_letters_take_no_arguments() {
        for name in ["A", "B", "C", "D", "E", "F", "G", "little_star"] {
            let signature = special_signature(name).unwrap();
            assert!(signature.return_type.is_none());
            assert!(signature.parameter_types.is_empty());
        }
    }

    #[test]
    fn test_get_signature() {
        let signature = special_signature("get").unwrap();
        assert_eq!(signature.return_type, Some(DataType::Char));
        assert_eq!(signature.parameter_types, vec![STR_ONLY, INT_ONLY]);
    }
}
