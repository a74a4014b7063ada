use std::fmt;

/// Error taxonomy for build and query paths. `Load`/`Decode` are always
/// fatal: once either occurs an engine instance refuses further queries.
///
/// §7 also names a `NotReady` kind ("operation requested before init
/// completes"). There is no runtime variant for it here: `SearchEngine::init`
/// returns `Result<SearchEngine>`, so no `SearchEngine` value exists to call
/// `search`/`get_entry` on until init has already succeeded — the type
/// system rules the state out rather than a checked error path needing to.
#[derive(Debug)]
pub enum ErrorKind {
    Io,
    Load,
    Decode,
    InvalidArgument,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error { kind, context: context.into() }
    }

    pub fn load(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Load, context)
    }

    pub fn decode(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Decode, context)
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
        Error { kind: ErrorKind::Io, context: err.to_string() }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error { kind: ErrorKind::Decode, context: err.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
