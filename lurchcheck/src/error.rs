use core::fmt::{self, Display};
use std::io;

/// Central error type.
#[derive(Debug)]
pub enum Error {
    /// file path that cannot be used as document name
    Module,
    Io(io::Error),
    Json(serde_json::Error),
    Lurch(lurch::Error),
    /// number of expected results that were not met
    Unmet(usize),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<lurch::Error> for Error {
    fn from(err: lurch::Error) -> Self {
        Self::Lurch(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Module => write!(f, "file name is not valid UTF-8"),
            Self::Io(e) => e.fmt(f),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::Lurch(e) => e.fmt(f),
            Self::Unmet(n) => write!(f, "{} expected results were not met", n),
        }
    }
}
