use std::sync::Arc;

use kanji_core::model::KanjiRecord;

use crate::progress_service::ProgressService;

/// Which records a flashcard deck walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashcardFilter {
    #[default]
    Unlearned,
    All,
}

/// Flip-card study over the catalog.
pub struct FlashcardDeck {
    progress: Arc<ProgressService>,
    filter: FlashcardFilter,
    cards: Vec<KanjiRecord>,
    index: usize,
    revealed: bool,
}

impl FlashcardDeck {
    #[must_use]
    pub fn new(progress: Arc<ProgressService>, filter: FlashcardFilter) -> Self {
        let cards = progress
            .catalog()
            .iter()
            .filter(|record| filter == FlashcardFilter::All || !progress.is_learned(record.id()))
            .cloned()
            .collect();
        Self {
            progress,
            filter,
            cards,
            index: 0,
            revealed: false,
        }
    }

    #[must_use]
    pub fn filter(&self) -> FlashcardFilter {
        self.filter
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn current(&self) -> Option<&KanjiRecord> {
        self.cards.get(self.index)
    }

    /// One-based position of the current card, or 0 for an empty deck.
    #[must_use]
    pub fn position(&self) -> usize {
        if self.cards.is_empty() { 0 } else { self.index + 1 }
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn reveal(&mut self) {
        if !self.cards.is_empty() {
            self.revealed = true;
        }
    }

    /// Next card, wrapping to the first after the last.
    pub fn next(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.cards.len();
        self.revealed = false;
    }

    /// Previous card; stays put on the first one.
    pub fn previous(&mut self) {
        if self.index == 0 {
            return;
        }
        self.index -= 1;
        self.revealed = false;
    }

    /// Mark the current card learned and move on.
    ///
    /// An unlearned deck drops the card. Returns false for an empty deck.
    pub async fn mark_current_learned(&mut self) -> bool {
        let Some(id) = self.current().map(KanjiRecord::id) else {
            return false;
        };
        self.progress.mark_learned(id).await;

        match self.filter {
            FlashcardFilter::Unlearned => {
                self.cards.remove(self.index);
                if self.index >= self.cards.len() {
                    self.index = 0;
                }
                self.revealed = false;
            }
            FlashcardFilter::All => self.next(),
        }
        true
    }
}
