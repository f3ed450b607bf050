//! Shared error types for the services crate.

use thiserror::Error;

use sabelo_core::flow::FlowError;
use sabelo_core::model::{ProgressError, StudyDataError};
use storage::sqlite::SqliteInitError;

/// Message shown to the user whenever content generation fails.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Falló la generación de contenido de la IA. Por favor, revisá tu clave de API y volvé a intentarlo.";

/// Errors emitted by content generators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("content generation is not configured")]
    Disabled,
    #[error("content generation returned an empty response")]
    EmptyResponse,
    #[error("content generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("content generation returned malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidContent(#[from] StudyDataError),
}

impl GenerationError {
    /// What the user sees; the underlying cause only goes to the log.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        GENERATION_FAILED_MESSAGE
    }
}

/// Errors emitted by leaderboard notifiers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotifierError {
    #[error("leaderboard request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `StudySession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudySessionError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Input(#[from] StudyDataError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error("invalid {name} url '{raw}': {source}")]
    InvalidUrl {
        name: &'static str,
        raw: String,
        source: url::ParseError,
    },
}
