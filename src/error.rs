use std::fmt;
use std::path::PathBuf;

/// Where a compile diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// At the given lexeme.
    At(String),
    /// At the end of input.
    End,
    /// Scanner error tokens have no lexeme to show.
    Unknown,
}

/// A single compile-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub(crate) line: usize,
    pub(crate) location: Location,
    pub(crate) message: String,
}

impl Diagnostic {
    pub fn new(line: usize, location: Location, message: impl Into<String>) -> Self {
        Self {
            line,
            location,
            message: message.into(),
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[line {}] Error", self.line)?;
        match &self.location {
            Location::At(lexeme) => write!(f, " at '{}'", lexeme)?,
            Location::End => write!(f, " at end")?,
            Location::Unknown => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// Compilation failed; carries every diagnostic the compiler reported.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", display_diagnostics(.diagnostics))]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

fn display_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<String>>()
        .join("\n")
}

/// What went wrong while executing a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UnknownOpcode(u8),
    InvalidConstant(usize),
    MissingReturn,
    StackOverflow,
    StackUnderflow,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use RuntimeErrorKind::*;
        match self {
            UnknownOpcode(byte) => write!(f, "Unknown opcode {}", byte),
            InvalidConstant(index) => write!(f, "Constant index {} out of range", index),
            MissingReturn => write!(f, "Instruction stream ended without a return"),
            StackOverflow => write!(f, "Stack overflow"),
            StackUnderflow => write!(f, "Stack underflow"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", display_runtime(.line, .kind))]
pub struct RuntimeError {
    pub(crate) line: Option<usize>,
    pub(crate) kind: RuntimeErrorKind,
}

fn display_runtime(line: &Option<usize>, kind: &RuntimeErrorKind) -> String {
    match line {
        Some(line) => format!("[line {}] {}", line, kind),
        None => kind.to_string(),
    }
}

impl RuntimeError {
    pub fn new(line: Option<usize>, kind: RuntimeErrorKind) -> Self {
        Self { line, kind }
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn kind(&self) -> &RuntimeErrorKind {
        &self.kind
    }
}

/// Outcome status of one `interpret` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpretError {
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl InterpretError {
    pub fn status(&self) -> InterpretResult {
        match self {
            InterpretError::Compile(_) => InterpretResult::CompileError,
            InterpretError::Runtime(_) => InterpretResult::RuntimeError,
        }
    }
}

impl<T> From<&Result<T, InterpretError>> for InterpretResult {
    fn from(result: &Result<T, InterpretError>) -> Self {
        match result {
            Ok(_) => InterpretResult::Ok,
            Err(err) => err.status(),
        }
    }
}

/// Failures of the command line driver around the core.
#[derive(thiserror::Error, Debug)]
pub enum LoxError {
    #[error("Could not read {}: {source}", .path.display())]
    FileNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IOError: {0}")]
    IO(#[from] std::io::Error),
    #[error("{0}")]
    Interpret(#[from] InterpretError),
    #[error("SerializeError: {0}")]
    Serialize(#[from] serde_json::Error),
}
