pub mod assembler;
pub mod error;
mod parser;
mod scope;

pub use assembler::{assemble, Assembler, Assembly};
pub use error::Error;
