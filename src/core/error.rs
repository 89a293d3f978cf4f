use std::io;
use std::path::PathBuf;
use std::result;

use thiserror::Error;

pub type Result<T, E = InputError> = result::Result<T, E>;

/// Every failure the library can surface.
#[derive(Debug, Error)]
pub enum InputError {
    /// Malformed text: block nesting/naming, keyword lines, position lines, lattice blocks.
    #[error("format error: {0}")]
    Format(String),
    /// Well-formed text or caller input that cannot be used for the request.
    #[error("validation error: {0}")]
    Validation(String),
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InputError {
    pub fn format(message: impl Into<String>) -> Self {
        InputError::Format(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        InputError::Validation(message.into())
    }

    pub fn is_format(&self) -> bool {
        matches!(self, InputError::Format(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, InputError::Validation(_))
    }
}
