use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmulatorError {
    #[error("{0}")]
    Runtime(String),

    #[error("Maximum execution cycles exceeded, stuck in infinite loop perhaps?")]
    CyclesExceeded,

    #[error("Invalid instruction {id} at address {addr}")]
    InvalidInstruction { id: u8, addr: u8 },

    #[error("Operand of {width} bytes at address {addr}, registers hold one byte")]
    OperandWidth { width: usize, addr: u8 },

    #[error("Failed to load config `{0}`: {1}")]
    Config(String, String),

    #[error("Failed to read `{0}`: {1}")]
    FileRead(String, String),
}

impl EmulatorError {
    pub fn out_of_range(addr: usize, size: usize) -> Self {
        EmulatorError::Runtime(format!(
            "Trying to access memory at {addr}, which is outside memory range 0..{size}"
        ))
    }
}
