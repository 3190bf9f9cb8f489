//! Error types for library loading and binding utilities
//!
//! This layer never interprets native call results: a failed X call is
//! reported through the native library's own convention (e.g. an X11 error
//! handler), not through these types. The errors here cover the loading
//! path and the small parsing utilities only.

use std::error::Error as StdError;
use std::fmt;

/// Errors produced by the loader and binding utilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The shared library could not be loaded
    LibraryLoad {
        /// Library name or path as passed to the loader
        name: String,
        /// Reason reported by the platform loader (dlerror / GetLastError)
        reason: String,
    },

    /// A required function is missing from the loaded library
    MissingSymbol {
        /// Name of the library the symbol was looked up in
        library: String,
        /// The symbol that could not be resolved
        symbol: String,
    },

    /// A version string did not match `[PREFIX] MAJOR.MINOR[.REVISION] [IMPL]`
    MalformedVersion(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LibraryLoad { name, reason } => {
                write!(f, "failed to load library \"{}\": {}", name, reason)
            }
            Error::MissingSymbol { library, symbol } => {
                write!(f, "required function \"{}\" missing from \"{}\"", symbol, library)
            }
            Error::MalformedVersion(version) => {
                write!(f, "malformed API version string [{}]", version)
            }
        }
    }
}

impl StdError for Error {}

/// Result type for loader and utility operations
pub type Result<T> = std::result::Result<T, Error>;
