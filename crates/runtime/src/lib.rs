//! Orchestra, the Symphony virtual machine.
//!
//! Interprets the quadruple stream produced by the compiler against a
//! partitioned memory image. Each run is a fresh [`Orchestra`] value; no
//! state leaks between plays. The two outputs of a run are the ordered
//! list of printed strings and the ordered list of musical note tokens.

pub mod builtins;
pub mod memory;
pub mod ops;
pub mod orchestra;

pub use memory::Memory;
pub use orchestra::Orchestra;
