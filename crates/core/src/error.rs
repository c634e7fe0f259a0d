/// Error type for domain validation, configuration and catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A value or catalog failed a domain rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An environment variable was missing or could not be parsed.
    #[error("Invalid configuration for {var}: {reason}")]
    Config { var: &'static str, reason: String },

    /// Reading a catalog file or directory failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
