//! Symphony Core
//!
//! Shared foundation for the Symphony compiler and the orchestra VM:
//! the user-type enumeration, runtime values, the partitioned memory map,
//! the quadruple model, the compiled-program container and the error type.
//!
//! Both ends of the toolchain meet in this crate: the compiler assigns
//! addresses and emits quadruples using the conventions defined here, and
//! the VM decodes the same conventions when it plays a program back.

pub mod error;
pub mod memory_map;
pub mod program;
pub mod quad;
pub mod types;
pub mod value;

pub use error::{ErrorKind, SymphonyError};
pub use memory_map::{AddressAllocator, Sector};
pub use program::{CompiledProgram, FunctionInfo};
pub use quad::{BinOp, Operand, Quad, SpecialOp, UnOp};
pub use types::DataType;
pub use value::Value;
