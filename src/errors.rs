/*!
 * Error types for the chaptrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Propagation policy: per-file failures are converted into batch events and
 * never abort the whole run; only misconfiguration detected before the first
 * file (unknown provider or model) fails a batch outright.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to a provider API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails (network, timeout)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The provider identifier is not present in the catalog
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The model identifier is not configured for the provider
    #[error("Unknown model '{model}' for provider '{provider}'")]
    UnknownModel {
        /// Provider identifier
        provider: String,
        /// Model identifier
        model: String,
    },

    /// No API key could be resolved for the provider
    #[error("No API key configured for provider: {0}")]
    MissingApiKey(String),
}

/// Errors that can occur while resolving or rendering prompts
#[derive(Error, Debug)]
pub enum PromptError {
    /// No prompt file exists in any resolution layer
    #[error("No '{kind}' prompt found for language pair {source_lang}_{target_lang}")]
    NotFound {
        /// Prompt kind file name
        kind: String,
        /// Source language code
        source_lang: String,
        /// Target language code
        target_lang: String,
    },

    /// A prompt file exists but could not be read
    #[error("Failed to read prompt file {path}: {message}")]
    ReadFailed {
        /// Path of the offending file
        path: PathBuf,
        /// Underlying I/O error text
        message: String,
    },
}

/// Errors that can occur during translation of one text
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error resolving a prompt template
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// The quality check returned "no" on the initial attempt and the retry
    #[error("Translation failed quality verification{}", cause.as_deref().map(|c| format!(": {c}")).unwrap_or_default())]
    CheckFailed {
        /// Cause line reported by the checking model, if any
        cause: Option<String>,
    },
}

/// Errors from the completion ledger stores
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The primary SQLite store could not be used
    #[error("Primary ledger store unavailable: {0}")]
    PrimaryUnavailable(String),

    /// The JSON sidecar fallback also failed
    #[error("Fallback ledger store failed: {0}")]
    FallbackFailed(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the completion ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
