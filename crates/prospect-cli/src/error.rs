//! Error types for the operator binary.

use prospect_core::{ConfigError, ProgressionError};
use prospect_db::DbError;

/// Top-level error for the `prospect` binary.
///
/// Each variant wraps one subsystem so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The command line could not be understood.
    #[error("{message}\n\n{usage}", usage = crate::command::USAGE)]
    Usage {
        /// What was wrong with the arguments.
        message: String,
    },

    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The database could not be reached or migrated.
    #[error("database error: {source}")]
    Db {
        /// The underlying data layer error.
        #[from]
        source: DbError,
    },

    /// The engine rejected the command.
    #[error("{source}")]
    Progression {
        /// The underlying engine error.
        #[from]
        source: ProgressionError,
    },

    /// A result could not be rendered.
    #[error("output error: {source}")]
    Output {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CliError {
    /// Shorthand for a [`Usage`](Self::Usage) error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}
