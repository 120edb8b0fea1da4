use std::path::PathBuf;

use combo_core::{ComboError, ExitCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("invalid arXiv ID: {0}")]
    InvalidArxivId(String),

    #[error("could not parse '{0}' as an arXiv ID or DOI")]
    UnrecognizedInput(String),

    #[error("cannot read keyword dictionary {path}: {source}")]
    DictionaryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed keyword dictionary: {0}")]
    DictionaryFormat(#[from] serde_json::Error),

    #[error("keyword dictionary entry '{0}' has an empty term, variant or URL")]
    EmptyTerm(String),

    #[error("variant '{variant}' is claimed by both '{first}' and '{second}'")]
    DuplicateVariant {
        variant: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Core(#[from] ComboError),
}

impl ScienceError {
    pub fn is_dictionary_error(&self) -> bool {
        matches!(
            self,
            Self::DictionaryIo { .. }
                | Self::DictionaryFormat(_)
                | Self::EmptyTerm(_)
                | Self::DuplicateVariant { .. }
        )
    }
}

impl ScienceError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Core(e) => e.exit_code(),
            Self::InvalidDoi(_) | Self::InvalidArxivId(_) | Self::UnrecognizedInput(_) => {
                ExitCode::InvalidArgs
            }
            e if e.is_dictionary_error() => ExitCode::DictionaryError,
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
