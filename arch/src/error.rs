use crate::code::Reference;
use crate::op::Op;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Instruction has an empty mnemonic")]
    EmptyMnemonic,

    #[error("Mnemonic `{mnemonic}` has {found} operands, but `{op}` takes {expected}")]
    OperandCount {
        mnemonic: String,
        op: Op,
        found: usize,
        expected: usize,
    },

    #[error("Operand `{0}` must be 1 or 2 bytes wide")]
    OperandWidth(String),

    #[error("Instruction id {0} is already in use")]
    DuplicateId(u8),

    #[error("Mnemonic `{0}` is already defined")]
    DuplicateMnemonic(String),

    #[error("Instruction id {0} is out of range")]
    IdOutOfRange(u8),

    #[error("No vacant instruction id left")]
    SetFull,

    #[error("Missing value for `#{0}` in `{1}`")]
    MissingOperand(String, String),

    #[error("`{1}` has no operand named `#{0}`")]
    UnknownOperand(String, String),

    #[error("Value {value} does not fit in `#{name}` ({width} byte)")]
    OutOfRange {
        name: String,
        value: i32,
        width: usize,
    },

    #[error("Undefined reference: `{0}`")]
    UndefinedReference(Reference),

    #[error("Unknown opcode {0} at address {1}")]
    UnknownOpcode(u8, usize),

    #[error("Instruction at address {0} is truncated")]
    Truncated(usize),

    #[error("No instruction implements `{0}`")]
    UnsupportedOp(Op),
}
