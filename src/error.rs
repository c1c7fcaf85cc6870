//! Error types for CIB editing operations.
//!
//! Validation problems found in user input are not errors here: they are
//! collected as [`ReportItem`](crate::reports::ReportItem)s and only turn
//! into [`Error::Reports`] when an operation aborts because of them. The
//! remaining variants describe broken documents or programming mistakes.

use crate::reports::ReportList;
use thiserror::Error;

/// Errors that can occur while editing a CIB.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the document failed
    #[error(transparent)]
    Document(#[from] cibtree::Error),

    /// More than one configuration element carries the same id
    #[error("found {count} elements with id '{id}', ids must be unique")]
    AmbiguousId {
        /// The duplicated id
        id: String,
        /// How many elements carry it
        count: usize,
    },

    /// A report was requested for a validator that found nothing
    #[error("nothing to report: {context}")]
    EmptyReport {
        /// Which report was being built
        context: String,
    },

    /// The document lacks a section every CIB has
    #[error("unable to find '{0}' section in the CIB")]
    MissingSection(String),

    /// The operation was aborted because of error reports
    #[error("operation aborted:\n{0}")]
    Reports(ReportList),

    /// A rule could not be parsed
    #[error("rule syntax error at token {position}: {message}")]
    RuleParse {
        /// Index of the offending token
        position: usize,
        /// What was expected
        message: String,
    },

    /// Configuration is invalid
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error carries user-facing reports rather than a fault.
    pub fn is_reports(&self) -> bool {
        matches!(self, Self::Reports(_))
    }

    /// Reports carried by this error, if any.
    pub fn reports(&self) -> Option<&ReportList> {
        match self {
            Self::Reports(list) => Some(list),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(format!("{err:#}"))
    }
}

/// Result type for CIB editing operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_config_error_keeps_context() {
        let err: Error = Config::from_toml_str("[ids]\nset_constraint_prefix = \"1x\"\n")
            .unwrap_err()
            .into();
        assert!(matches!(&err, Error::Config(message) if message.contains("1x")));
        assert!(!err.is_reports());
        assert!(err.reports().is_none());
    }
}
