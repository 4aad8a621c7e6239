//! Special functions: printing, math, stdin, strings and musical notes.
//!
//! Builtins consume their arguments by popping the `PARAM` queue (last
//! argument first) and store results through the operand the compiler
//! reserved for them.

use crate::orchestra::Orchestra;
use symphony_core::{ErrorKind, Operand, SpecialOp, SymphonyError, Value};

/// The sample song, as note letters.
const LITTLE_STAR: [&str; 14] = [
    "C", "C", "G", "G", "A", "A", "G", "F", "F", "E", "E", "D", "D", "C",
];

impl Orchestra {
    pub(crate) fn call_special(
        &mut self,
        op: SpecialOp,
        result: Option<Operand>,
    ) -> Result<(), SymphonyError> {
        match op {
            SpecialOp::Print => self.print(""),
            SpecialOp::Println => self.print("\n"),
            SpecialOp::Sqrt => self.math(result, f64::sqrt),
            SpecialOp::Log => self.math(result, f64::ln),
            SpecialOp::Random => self.store_result(result, Value::Dec(rand::random::<f64>())),
            SpecialOp::Input => self.input(result),
            SpecialOp::Length => self.length(result),
            SpecialOp::Copy => self.copy(),
            SpecialOp::Get => self.get(result),
            SpecialOp::ToStr => self.to_str(result),
            SpecialOp::Floor => self.round(result, f64::floor),
            SpecialOp::Ceil => self.round(result, f64::ceil),
            SpecialOp::LittleStar => {
                self.notes.extend(LITTLE_STAR.iter().map(|s| s.to_string()));
                Ok(())
            }
            SpecialOp::NoteA
            | SpecialOp::NoteB
            | SpecialOp::NoteC
            | SpecialOp::NoteD
            | SpecialOp::NoteE
            | SpecialOp::NoteF
            | SpecialOp::NoteG => {
                self.notes.push(op.name().to_string());
                Ok(())
            }
        }
    }

    fn pop_param(&mut self) -> Result<Operand, SymphonyError> {
        self.parameters.pop().ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::NotImplemented,
                "a builtin was played without its PARAM quadruples",
            )
        })
    }

    fn pop_value(&mut self) -> Result<Value, SymphonyError> {
        let operand = self.pop_param()?;
        self.memory.value(operand)
    }

    fn store_result(
        &mut self,
        result: Option<Operand>,
        value: Value,
    ) -> Result<(), SymphonyError> {
        let operand = result.ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::NotImplemented,
                "a builtin with a return value was played without a result address",
            )
        })?;
        self.memory.store(value, operand)
    }

    fn print(&mut self, end: &str) -> Result<(), SymphonyError> {
        let value = self.pop_value()?;
        self.prints.push(format!("{}{}", value, end));
        Ok(())
    }

    fn math(
        &mut self,
        result: Option<Operand>,
        f: impl Fn(f64) -> f64,
    ) -> Result<(), SymphonyError> {
        let value = self.pop_decimal()?;
        self.store_result(result, Value::Dec(f(value)))
    }

    /// `floor`/`ceil` take a decimal and produce an integer.
    fn round(
        &mut self,
        result: Option<Operand>,
        f: impl Fn(f64) -> f64,
    ) -> Result<(), SymphonyError> {
        let value = self.pop_decimal()?;
        self.store_result(result, Value::Int(f(value) as i64))
    }

    fn pop_decimal(&mut self) -> Result<f64, SymphonyError> {
        match self.pop_value()? {
            Value::Int(n) => Ok(n as f64),
            Value::Dec(d) => Ok(d),
            other => Err(SymphonyError::runtime(
                ErrorKind::Type,
                format!("expected a numeric value, found a {}", other.data_type()),
            )),
        }
    }

    fn pop_string(&mut self) -> Result<String, SymphonyError> {
        match self.pop_value()? {
            Value::Str(s) => Ok(s),
            other => Err(SymphonyError::runtime(
                ErrorKind::Type,
                format!("expected a STR value, found a {}", other.data_type()),
            )),
        }
    }

    fn input(&mut self, result: Option<Operand>) -> Result<(), SymphonyError> {
        let line = self.inputs.get(self.input_counter).cloned().ok_or_else(|| {
            SymphonyError::runtime(
                ErrorKind::Arity,
                "The wrong amount of input lines was submitted",
            )
        })?;
        self.input_counter += 1;
        self.store_result(result, Value::Str(line))
    }

    fn length(&mut self, result: Option<Operand>) -> Result<(), SymphonyError> {
        let string = self.pop_string()?;
        self.store_result(result, Value::Int(string.chars().count() as i64))
    }

    /// `copy(destination, source)`: the destination arrives as an address,
    /// never as a value; the source's value is written through it.
    fn copy(&mut self) -> Result<(), SymphonyError> {
        let source = self.pop_value()?;
        let destination = self.pop_param()?;
        self.memory.store(source, destination)
    }

    /// `get(string, index)`: the index-th character of the string.
    fn get(&mut self, result: Option<Operand>) -> Result<(), SymphonyError> {
        let index = self.int_value_from_param()?;
        let string = self.pop_string()?;
        let character = usize::try_from(index)
            .ok()
            .and_then(|i| string.chars().nth(i))
            .ok_or_else(|| {
                SymphonyError::runtime(
                    ErrorKind::Index,
                    format!(
                        "Index out of bounds: {}. This one should be greater than or \
                         equal to 0 and smaller than {}",
                        index,
                        string.chars().count()
                    ),
                )
            })?;
        self.store_result(result, Value::Char(character))
    }

    fn int_value_from_param(&mut self) -> Result<i64, SymphonyError> {
        let operand = self.pop_param()?;
        self.int_value(operand)
    }

    fn to_str(&mut self, result: Option<Operand>) -> Result<(), SymphonyError> {
        let value = self.pop_value()?;
        self.store_result(result, Value::Str(value.to_string()))
    }
}
