use std::{error::Error, fmt::Display};

#[derive(Clone, Debug)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A relation is missing a required field or holds an invalid record.
    MalformedCatalog,
    /// A nulltype has no matching datatype.
    UnknownDatatype,
    /// A nulltype's datatype condition is not `equals(...)`.
    UnsupportedCondition,
    IoError,
}

impl Error for CompileError {}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MalformedCatalog => write!(f, "Malformed Catalog"),
            ErrorKind::UnknownDatatype => write!(f, "Unknown Datatype"),
            ErrorKind::UnsupportedCondition => write!(f, "Unsupported Condition"),
            ErrorKind::IoError => write!(f, "IO Error"),
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl AsRef<str>) -> Self {
        Self {
            kind,
            message: message.as_ref().to_string(),
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::new(ErrorKind::IoError, e.to_string())
    }
}
