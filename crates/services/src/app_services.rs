use std::sync::Arc;

use kanji_core::model::Catalog;
use storage::repository::Storage;

use crate::Clock;
use crate::dashboard::ProgressOverview;
use crate::error::AppServicesError;
use crate::flashcards::{FlashcardDeck, FlashcardFilter};
use crate::progress_service::ProgressService;
use crate::quiz::QuizLoopService;

/// Assembles app-facing services around one shared catalog and progress store.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    progress: Arc<ProgressService>,
    quiz_loop: Arc<QuizLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or progress loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: Catalog,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::with_storage(storage, catalog, clock).await
    }

    /// Build services over a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if progress loading fails.
    pub async fn in_memory(catalog: Catalog, clock: Clock) -> Result<Self, AppServicesError> {
        Self::with_storage(Storage::in_memory(), catalog, clock).await
    }

    /// # Errors
    ///
    /// Returns `AppServicesError` if progress loading fails.
    pub async fn with_storage(
        storage: Storage,
        catalog: Catalog,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(catalog);
        let progress = Arc::new(
            ProgressService::load(Arc::clone(&catalog), Arc::clone(&storage.kv), clock).await?,
        );
        let quiz_loop = Arc::new(QuizLoopService::new(Arc::clone(&progress)));

        Ok(Self {
            catalog,
            progress,
            quiz_loop,
        })
    }

    /// Resolve the catalog from optional JSON text, defaulting to the built-in list.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Catalog` if the JSON is malformed or has invalid entries.
    pub fn catalog_from_source(json: Option<&str>) -> Result<Catalog, AppServicesError> {
        match json {
            Some(text) => Ok(Catalog::from_json(text)?),
            None => Ok(Catalog::builtin()?),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn overview(&self) -> ProgressOverview {
        ProgressOverview::collect(&self.progress)
    }

    #[must_use]
    pub fn flashcards(&self, filter: FlashcardFilter) -> FlashcardDeck {
        FlashcardDeck::new(Arc::clone(&self.progress), filter)
    }
}
