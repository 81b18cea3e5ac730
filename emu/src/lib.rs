pub mod emulator;
pub mod error;
mod exec;
pub mod hooks;

pub use emulator::{Emulator, DEFAULT_MAX_CYCLES, DEFAULT_MEMORY_SIZE};
pub use error::EmulatorError;
