use thiserror::Error;

/// All errors that can occur in combo-core.
#[derive(Debug, Error)]
pub enum ComboError {
    #[error("Paper not found: {0}")]
    PaperNotFound(String),

    #[error("Author not found: {0}")]
    AuthorNotFound(String),

    #[error("Tag not found: {0}")]
    TagNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Migration error at version {version}: {message}")]
    Migration { version: u32, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Process exit codes used by the `combo` binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    DictionaryError = 5,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl ComboError {
    /// Map an error onto the exit code the CLI reports for it.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::PaperNotFound(_) | Self::AuthorNotFound(_) | Self::TagNotFound(_) => {
                ExitCode::NotFound
            }
            Self::ValidationError(_) => ExitCode::InvalidArgs,
            Self::Io(_) => ExitCode::FileSystemError,
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, ComboError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_map_to_exit_code_2() {
        let err = ComboError::PaperNotFound("2401.00001".into());
        assert_eq!(err.exit_code().code(), 2);
        assert_eq!(err.to_string(), "Paper not found: 2401.00001");
    }

    #[test]
    fn sqlite_errors_are_general() {
        let err = ComboError::from(rusqlite::Error::InvalidQuery);
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
    }
}
