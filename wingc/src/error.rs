use crate::grammer::token::{Pos, Token};
use color_print::cprintln;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{message}")]
    Token { message: String, pos: Pos },

    #[error("{message}")]
    Parse {
        message: String,
        token: Option<Token>,
    },

    #[error("{0}")]
    Compile(String),

    #[error(transparent)]
    Assembler(#[from] wingasm::Error),

    #[error(transparent)]
    Instruction(#[from] arch::Error),

    #[error(transparent)]
    Emulator(#[from] wingemu::EmulatorError),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),
}

impl Error {
    pub fn compile(message: impl Into<String>) -> Self {
        Error::Compile(message.into())
    }

    /// Name the function a compile error was found in
    pub fn in_function(self, function: impl std::fmt::Display) -> Self {
        match self {
            Error::Compile(message) => Error::Compile(format!("{message} (in {function})")),
            other => other,
        }
    }

    /// Source position the error points at, if any
    pub fn pos(&self) -> Option<Pos> {
        match self {
            Error::Token { pos, .. } => Some(*pos),
            Error::Parse {
                token: Some(token), ..
            } => Some(token.pos),
            _ => None,
        }
    }

    /// Print error with the file location and line content
    pub fn print_diag(&self, file: &str, lines: &[&str]) {
        cprintln!("<red,bold>error</>: {}", self);
        if let Error::Parse {
            token: Some(token), ..
        } = self
        {
            cprintln!("       <blue>near</> {}", token.kind);
        }

        let Some(pos) = self.pos() else {
            cprintln!("     <blue>--></> <underline>{}</>", file);
            return;
        };
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, pos);
        cprintln!("      <blue>|</>");
        let line_content = lines.get(pos.row).copied().unwrap_or("");
        cprintln!(" <blue>{:>4} |</> {}", pos.row + 1, line_content);
        cprintln!("      <blue>|</> {}<red,bold>^</>", " ".repeat(pos.col));
    }
}
