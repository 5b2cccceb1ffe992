//! CLI-level errors (wraps library errors)

use thiserror::Error;

use crate::config::SettingsError;
use crate::document::DocumentError;
use crate::domain::TagError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Tag(#[from] TagError),

    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("config error: {0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Tag(TagError::Validation(_)) => crate::exitcode::DATAERR,
            CliError::Tag(_) => crate::exitcode::SOFTWARE,
            CliError::Document(DocumentError::Read { .. }) => crate::exitcode::NOINPUT,
            CliError::Document(DocumentError::Parse(_)) => crate::exitcode::DATAERR,
            CliError::Settings(_) => crate::exitcode::CONFIG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;

    #[test]
    fn test_exit_codes() {
        let invalid = CliError::from(TagError::from(ValidationError::new("missing")));
        assert_eq!(invalid.exit_code(), crate::exitcode::DATAERR);
        assert_eq!(
            CliError::Usage("no command".into()).exit_code(),
            crate::exitcode::USAGE
        );
    }
}
