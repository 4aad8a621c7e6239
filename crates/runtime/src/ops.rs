//! Arithmetic, comparison and assignment semantics over runtime values.
//!
//! The semantic cube already validated every combination at compile time;
//! the checks here exist so that a corrupt quadruple stream degrades into a
//! typed error instead of a panic. Integer arithmetic wraps.

use symphony_core::{BinOp, ErrorKind, SymphonyError, UnOp, Value};

/// Apply a binary operator to two fetched values.
pub fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, SymphonyError> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub | BinOp::Mul | BinOp::Mod | BinOp::Pow => arithmetic(op, left, right),
        BinOp::Div => divide(left, right),
        BinOp::Equals
        | BinOp::Greater
        | BinOp::Less
        | BinOp::GreaterEqual
        | BinOp::LessEqual => compare(op, left, right),
        BinOp::And | BinOp::Or => logical(op, left, right),
    }
}

/// Apply a unary operator to one fetched value.
pub fn apply_unary(op: UnOp, value: &Value) -> Result<Value, SymphonyError> {
    match (op, value) {
        (UnOp::Increment, Value::Int(n)) => Ok(Value::Int(n.wrapping_add(1))),
        (UnOp::Increment, Value::Dec(d)) => Ok(Value::Dec(d + 1.0)),
        (UnOp::Decrement, Value::Int(n)) => Ok(Value::Int(n.wrapping_sub(1))),
        (UnOp::Decrement, Value::Dec(d)) => Ok(Value::Dec(d - 1.0)),
        (UnOp::Plus, Value::Int(n)) => Ok(Value::Int(*n)),
        (UnOp::Plus, Value::Dec(d)) => Ok(Value::Dec(*d)),
        (UnOp::Minus, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnOp::Minus, Value::Dec(d)) => Ok(Value::Dec(-d)),
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, value) => Err(unary_mismatch(op, value)),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, SymphonyError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Str(a), Value::Char(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Char(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Char(a), Value::Char(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        _ => match as_decimals(left, right) {
            Some((a, b)) => Ok(Value::Dec(a + b)),
            None => Err(binary_mismatch(BinOp::Add, left, right)),
        },
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, SymphonyError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return match op {
            BinOp::Sub => Ok(Value::Int(a.wrapping_sub(*b))),
            BinOp::Mul => Ok(Value::Int(a.wrapping_mul(*b))),
            BinOp::Mod => {
                if *b == 0 {
                    Err(division_by_zero(left))
                } else {
                    Ok(Value::Int(floored_mod(*a, *b)))
                }
            }
            BinOp::Pow => Ok(int_pow(*a, *b)),
            _ => Err(binary_mismatch(op, left, right)),
        };
    }
    let (a, b) = as_decimals(left, right).ok_or_else(|| binary_mismatch(op, left, right))?;
    match op {
        BinOp::Sub => Ok(Value::Dec(a - b)),
        BinOp::Mul => Ok(Value::Dec(a * b)),
        BinOp::Mod => {
            if b == 0.0 {
                Err(division_by_zero(left))
            } else {
                Ok(Value::Dec((a % b + b) % b))
            }
        }
        BinOp::Pow => Ok(Value::Dec(a.powf(b))),
        _ => Err(binary_mismatch(op, left, right)),
    }
}

/// `/` always divides as decimals, whatever the operand types.
fn divide(left: &Value, right: &Value) -> Result<Value, SymphonyError> {
    let (a, b) =
        as_decimals(left, right).ok_or_else(|| binary_mismatch(BinOp::Div, left, right))?;
    if b == 0.0 {
        return Err(division_by_zero(left));
    }
    Ok(Value::Dec(a / b))
}

/// Floored modulo: the result takes the divisor's sign.
fn floored_mod(a: i64, b: i64) -> i64 {
    a.wrapping_rem(b).wrapping_add(b).wrapping_rem(b)
}

/// Integer exponentiation; a negative exponent degrades to host float math.
fn int_pow(base: i64, exponent: i64) -> Value {
    match u32::try_from(exponent) {
        Ok(exponent) => Value::Int(base.wrapping_pow(exponent)),
        Err(_) => Value::Dec((base as f64).powf(exponent as f64)),
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> Result<Value, SymphonyError> {
    use std::cmp::Ordering;

    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
        _ => match as_decimals(left, right) {
            Some((a, b)) => a.partial_cmp(&b),
            None => return Err(binary_mismatch(op, left, right)),
        },
    };
    // NaN comparisons come back as None; every comparison against NaN is
    // false, except its inequality.
    let result = match op {
        BinOp::Equals => ordering == Some(Ordering::Equal),
        BinOp::Greater => ordering == Some(Ordering::Greater),
        BinOp::Less => ordering == Some(Ordering::Less),
        BinOp::GreaterEqual => {
            matches!(ordering, Some(Ordering::Greater) | Some(Ordering::Equal))
        }
        BinOp::LessEqual => matches!(ordering, Some(Ordering::Less) | Some(Ordering::Equal)),
        _ => return Err(binary_mismatch(op, left, right)),
    };
    Ok(Value::Bool(result))
}

fn logical(op: BinOp, left: &Value, right: &Value) -> Result<Value, SymphonyError> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinOp::And => Ok(Value::Bool(*a && *b)),
            BinOp::Or => Ok(Value::Bool(*a || *b)),
            _ => Err(binary_mismatch(op, left, right)),
        },
        _ => Err(binary_mismatch(op, left, right)),
    }
}

fn as_decimals(left: &Value, right: &Value) -> Option<(f64, f64)> {
    let a = numeric(left)?;
    let b = numeric(right)?;
    Some((a, b))
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Dec(d) => Some(*d),
        _ => None,
    }
}

fn division_by_zero(dividend: &Value) -> SymphonyError {
    SymphonyError::runtime(
        ErrorKind::DivisionByZero,
        format!(
            "Oops! You tried to divide {} by 0. Please correct your program",
            dividend
        ),
    )
}

fn binary_mismatch(op: BinOp, left: &Value, right: &Value) -> SymphonyError {
    SymphonyError::runtime(
        ErrorKind::Type,
        format!(
            "the {} operation cannot combine {} and {} values",
            op,
            left.data_type(),
            right.data_type()
        ),
    )
}

fn unary_mismatch(op: UnOp, value: &Value) -> SymphonyError {
    SymphonyError::runtime(
        ErrorKind::Type,
        format!(
            "the {} operation cannot be applied to a {} value",
            op,
            value.data_type()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic_stays_integer() {
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Int(2), &Value::Int(3)).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            apply_binary(BinOp::Mul, &Value::Int(4), &Value::Int(5)).unwrap(),
            Value::Int(20)
        );
        assert_eq!(
            apply_binary(BinOp::Mod, &Value::Int(7), &Value::Int(3)).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            apply_binary(BinOp::Pow, &Value::Int(2), &Value::Int(10)).unwrap(),
            Value::Int(1024)
        );
    }

    #[test]
    fn test_division_is_always_decimal() {
        assert_eq!(
            apply_binary(BinOp::Div, &Value::Int(7), &Value::Int(2)).unwrap(),
            Value::Dec(3.5)
        );
    }

    #[test]
    fn test_division_by_zero() {
        let err = apply_binary(BinOp::Div, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        let err = apply_binary(BinOp::Mod, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_mod_takes_the_divisor_sign() {
        assert_eq!(
            apply_binary(BinOp::Mod, &Value::Int(-7), &Value::Int(3)).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            apply_binary(BinOp::Mod, &Value::Int(7), &Value::Int(-3)).unwrap(),
            Value::Int(-2)
        );
        assert_eq!(
            apply_binary(BinOp::Mod, &Value::Int(-7), &Value::Int(-3)).unwrap(),
            Value::Int(-1)
        );
        assert_eq!(
            apply_binary(BinOp::Mod, &Value::Dec(-7.5), &Value::Dec(2.0)).unwrap(),
            Value::Dec(0.5)
        );
    }

    #[test]
    fn test_mixed_arithmetic_widens_to_decimal() {
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Int(1), &Value::Dec(0.5)).unwrap(),
            Value::Dec(1.5)
        );
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(
            apply_binary(
                BinOp::Add,
                &Value::Str("do".to_string()),
                &Value::Str("re".to_string())
            )
            .unwrap(),
            Value::Str("dore".to_string())
        );
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Char('d'), &Value::Char('o')).unwrap(),
            Value::Str("do".to_string())
        );
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Str("d".to_string()), &Value::Char('o')).unwrap(),
            Value::Str("do".to_string())
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            apply_binary(BinOp::Equals, &Value::Int(1), &Value::Int(1)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            apply_binary(BinOp::Less, &Value::Str("ab".to_string()), &Value::Str("b".to_string()))
                .unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            apply_binary(BinOp::GreaterEqual, &Value::Dec(2.0), &Value::Int(2)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            apply_binary(BinOp::Greater, &Value::Bool(true), &Value::Bool(false)).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_logical() {
        assert_eq!(
            apply_binary(BinOp::Or, &Value::Bool(true), &Value::Bool(false)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            apply_binary(BinOp::And, &Value::Bool(true), &Value::Bool(false)).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            apply_unary(UnOp::Increment, &Value::Int(41)).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            apply_unary(UnOp::Minus, &Value::Dec(1.5)).unwrap(),
            Value::Dec(-1.5)
        );
        assert_eq!(
            apply_unary(UnOp::Not, &Value::Bool(false)).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_type_mismatch_is_an_error_not_a_panic() {
        let err = apply_binary(BinOp::And, &Value::Int(1), &Value::Int(2)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        let err = apply_unary(UnOp::Not, &Value::Int(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_negative_exponent_degrades_to_decimal() {
        assert_eq!(
            apply_binary(BinOp::Pow, &Value::Int(2), &Value::Int(-1)).unwrap(),
            Value::Dec(0.5)
        );
    }
}
