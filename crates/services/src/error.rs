//! Shared error types for the services crate.

use thiserror::Error;

use kanji_core::model::CatalogError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while loading the progress store.
///
/// Writes never surface here: they are best effort and retried on the next
/// mutation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A quiz transition that was rejected; the session is left untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz is not in progress")]
    NotInProgress,
    #[error("an answer is already pending for this question")]
    AnswerPending,
    #[error("no answer has been submitted for this question")]
    NoPendingAnswer,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
