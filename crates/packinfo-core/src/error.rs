//! Error types for pack inspection.

use thiserror::Error;

/// Result type alias using `InspectError`.
pub type Result<T> = std::result::Result<T, InspectError>;

/// Boxed error returned by unpacker compatibility probes.
pub type ProbeFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while inspecting a pack.
#[derive(Error, Debug)]
pub enum InspectError {
    /// I/O operation failed (pack missing, unreadable, truncated stream).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata document is missing or malformed.
    #[error("invalid pack configuration: {0}")]
    Config(String),

    /// Archive structure could not be read.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// An unpacker's compatibility probe failed.
    #[error("compatibility probe for unpacker '{unpacker}' failed: {source}")]
    Probe {
        /// Registry name of the unpacker.
        unpacker: String,
        /// Error raised by the probe.
        #[source]
        source: ProbeFailure,
    },

    /// A size value was negative.
    #[error("size cannot be negative: {0}")]
    NegativeSize(i64),

    /// A `NAME:PATH` file binding could not be parsed.
    #[error("invalid file binding '{0}': expected NAME:PATH")]
    InvalidBinding(String),

    /// A replay step exited unsuccessfully.
    #[error("replay step `{command}` failed: {status}")]
    Replay {
        /// Command line of the failed step.
        command: String,
        /// Exit status it reported.
        status: std::process::ExitStatus,
    },
}

impl InspectError {
    /// Returns `true` if this error comes from the metadata document.
    ///
    /// # Examples
    ///
    /// ```
    /// use packinfo_core::InspectError;
    ///
    /// let err = InspectError::Config("missing runs".to_string());
    /// assert!(err.is_config_error());
    ///
    /// let err = InspectError::NegativeSize(-1);
    /// assert!(!err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<serde_yaml::Error> for InspectError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}
