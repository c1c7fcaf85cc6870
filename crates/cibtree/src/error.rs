//! Error types for document reading and writing.

use thiserror::Error;

/// Errors that can occur while loading or serializing a document.
#[derive(Debug, Error)]
pub enum Error {
    /// The XML input is not well formed
    #[error("XML parse error: {message}")]
    Parse {
        /// Description from the XML reader
        message: String,
    },

    /// Serializing the tree failed
    #[error("XML write error: {message}")]
    Write {
        /// Description from the XML writer
        message: String,
    },

    /// The input contains no element at all
    #[error("document has no root element")]
    NoRoot,

    /// A second top-level element follows the root
    #[error("document has more than one root element, found extra '{0}'")]
    MultipleRoots(String),

    /// Input ended while an element was still open
    #[error("unclosed element '{0}'")]
    Unclosed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(err: impl std::fmt::Display) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }

    pub(crate) fn write(err: impl std::fmt::Display) -> Self {
        Self::Write {
            message: err.to_string(),
        }
    }
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, Error>;
