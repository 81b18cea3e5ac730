pub mod backend;
pub mod compiler;
pub mod error;
pub mod frontend;
pub mod grammer;

pub use backend::builtins::BuiltIns;
pub use backend::linker::Program;
pub use compiler::{run, Compiler, CompilerConfig};
pub use error::Error;
pub use grammer::reducer::Rules;
