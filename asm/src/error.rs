use color_print::cprintln;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No instruction matches `{0}`")]
    UnknownInstruction(String),

    #[error("Undefined label or variable: `{0}`")]
    UndefinedSymbol(String),

    #[error("Re-defined label: `{0}`")]
    RedefinedLabel(String),

    #[error("Cannot reassign variable `#{0}`")]
    ReassignedVariable(String),

    #[error("Label `{0}` cannot be assigned to a variable")]
    LabelAsVariable(String),

    #[error("`endscope` without an open scope")]
    ScopeUnderflow,

    #[error("Forgot to close a scope")]
    UnclosedScope,

    #[error(transparent)]
    Instruction(#[from] arch::Error),

    #[error("line {}: {}", .0 + 1, .1)]
    Line(usize, Box<Error>),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),
}

impl Error {
    /// Print error with the file location and line content
    pub fn print_diag(&self, file: &str, lines: &[&str]) {
        let (line_idx, error) = match self {
            Error::Line(idx, inner) => (Some(*idx), inner.as_ref()),
            other => (None, other),
        };
        cprintln!("<red,bold>error</>: {}", error);

        let Some(line_idx) = line_idx else {
            cprintln!("     <blue>--></> <underline>{}</>", file);
            return;
        };
        let line_num = line_idx + 1;
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, line_num);
        cprintln!("      <blue>|</>");
        let line_content = lines.get(line_idx).copied().unwrap_or("");
        cprintln!(" <blue>{:>4} |</> {}", line_num, line_content);
        cprintln!("      <blue>|</>");
    }
}
