pub mod code;
pub mod error;
pub mod inst;
pub mod op;
pub mod set;

pub use code::{Code, Reference, Value};
pub use error::Error;
pub use inst::{Instruction, Operand};
pub use op::{Group, Op};
pub use set::InstructionSet;
