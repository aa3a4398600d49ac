use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed query, bad configuration value, unknown field, type conflict
    InvalidArgument,
    NotFound,
    /// Another writer holds the index lock
    LockHeld,
    /// Storage read/write failure, including corrupt on-disk data
    Io,
    /// Requested page lies past the last hit
    OutOfRange,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidArgument, context.into())
    }

    pub fn not_found(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotFound, context.into())
    }

    pub fn corrupt(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Io, format!("corrupt index data: {}", context.into()))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

// Decoding failures only happen on damaged files, so they surface as I/O failures.
impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::corrupt(err.to_string())
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error::corrupt(format!("term dictionary: {}", err))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::invalid_argument(format!("invalid pattern: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::invalid_argument(format!("invalid configuration: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
