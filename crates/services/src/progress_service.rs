use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use kanji_core::Clock;
use kanji_core::model::{
    Catalog, JlptLevel, KanjiId, KanjiRecord, MasteryLabel, ProgressState, fraction_of,
};
use storage::repository::{KeyValueStore, PersistedValue, StorageError};

use crate::error::ProgressError;

/// Persisted key for the learned kanji ids (list of decimal strings).
pub const LEARNED_IDS_KEY: &str = "learnedKanjiIds";
/// Persisted key for the practice streak in days.
pub const PRACTICE_STREAK_KEY: &str = "practiceStreak";
/// Persisted key for the accumulated practice minutes.
pub const TOTAL_MINUTES_KEY: &str = "totalPracticeTime";
/// Persisted key for the last practice day (`YYYY-MM-DD`).
pub const LAST_PRACTICE_DAY_KEY: &str = "lastPracticeDay";

const ALL_KEYS: [&str; 4] = [
    LEARNED_IDS_KEY,
    PRACTICE_STREAK_KEY,
    TOTAL_MINUTES_KEY,
    LAST_PRACTICE_DAY_KEY,
];

/// In-memory progress plus the keys whose latest value has not reached storage yet.
#[derive(Debug, Default)]
struct Ledger {
    state: ProgressState,
    revision: u64,
    dirty: HashMap<&'static str, u64>,
}

impl Ledger {
    fn touch(&mut self, key: &'static str) {
        self.revision += 1;
        self.dirty.insert(key, self.revision);
    }

    fn pending_writes(&self) -> Vec<(&'static str, u64, PersistedValue)> {
        ALL_KEYS
            .iter()
            .filter_map(|key| {
                self.dirty
                    .get(key)
                    .map(|rev| (*key, *rev, encode_key(&self.state, key)))
            })
            .collect()
    }
}

/// The single progress store shared by every screen.
///
/// The in-memory state is the source of truth. Every mutation that changes
/// it is flushed right away; failed writes are logged and retried with the
/// next mutation. Flushes run one at a time, so an older value never lands
/// after a newer one.
pub struct ProgressService {
    catalog: Arc<Catalog>,
    store: Arc<dyn KeyValueStore>,
    clock: Clock,
    ledger: Mutex<Ledger>,
    flush_gate: AsyncMutex<()>,
}

impl ProgressService {
    /// Load persisted progress, defaulting missing values to empty / zero.
    ///
    /// Values with an unexpected shape are skipped with a warning, and learned
    /// ids that the catalog does not know are dropped from memory.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the backend cannot be read.
    pub async fn load(
        catalog: Arc<Catalog>,
        store: Arc<dyn KeyValueStore>,
        clock: Clock,
    ) -> Result<Self, ProgressError> {
        let learned = read_learned(store.as_ref(), &catalog).await?;
        let streak = read_counter(store.as_ref(), PRACTICE_STREAK_KEY).await?;
        let minutes = read_counter(store.as_ref(), TOTAL_MINUTES_KEY).await?;
        let last_day = read_day(store.as_ref()).await?;

        let state = ProgressState::from_persisted(learned, streak, minutes, last_day);
        info!(
            learned = state.learned_count(),
            catalog = catalog.len(),
            streak,
            minutes,
            "progress loaded"
        );

        Ok(Self {
            catalog,
            store,
            clock,
            ledger: Mutex::new(Ledger {
                state,
                ..Ledger::default()
            }),
            flush_gate: AsyncMutex::new(()),
        })
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Clone of the current in-memory progress.
    #[must_use]
    pub fn snapshot(&self) -> ProgressState {
        self.ledger().state.clone()
    }

    #[must_use]
    pub fn is_learned(&self, id: KanjiId) -> bool {
        self.ledger().state.is_learned(id)
    }

    #[must_use]
    pub fn learned_count(&self) -> usize {
        self.ledger().state.learned_count()
    }

    #[must_use]
    pub fn catalog_size(&self) -> usize {
        self.catalog.len()
    }

    /// Learned share of the whole catalog; `0.0` for an empty catalog.
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        fraction_of(self.learned_count(), self.catalog_size())
    }

    /// `(learned, total)` for the records of one level.
    #[must_use]
    pub fn level_counts(&self, level: JlptLevel) -> (usize, usize) {
        let members = self.catalog.by_level(level);
        let ledger = self.ledger();
        let learned = members
            .iter()
            .filter(|record| ledger.state.is_learned(record.id()))
            .count();
        (learned, members.len())
    }

    /// Learned share within one level; `0.0` when the level has no records.
    #[must_use]
    pub fn level_progress_fraction(&self, level: JlptLevel) -> f64 {
        let (learned, total) = self.level_counts(level);
        fraction_of(learned, total)
    }

    #[must_use]
    pub fn mastery_label(&self) -> MasteryLabel {
        MasteryLabel::from_fraction(self.progress_fraction())
    }

    #[must_use]
    pub fn practice_streak(&self) -> u32 {
        self.ledger().state.practice_streak()
    }

    #[must_use]
    pub fn total_practice_minutes(&self) -> u32 {
        self.ledger().state.total_practice_minutes()
    }

    /// All learned records, in catalog order.
    #[must_use]
    pub fn kanji_for_review(&self) -> Vec<KanjiRecord> {
        let ledger = self.ledger();
        self.catalog
            .iter()
            .filter(|record| ledger.state.is_learned(record.id()))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn review_count(&self) -> usize {
        self.kanji_for_review().len()
    }

    /// Add `id` to the learned set.
    ///
    /// Returns true if the set changed. Already-learned ids and ids outside
    /// the catalog are no-ops and trigger no write.
    pub async fn mark_learned(&self, id: KanjiId) -> bool {
        if !self.catalog.contains(id) {
            warn!(%id, "ignoring mark-learned for a kanji outside the catalog");
            return false;
        }
        let changed = {
            let mut ledger = self.ledger();
            let changed = ledger.state.mark_learned(id);
            if changed {
                ledger.touch(LEARNED_IDS_KEY);
            }
            changed
        };
        if changed {
            debug!(%id, "kanji marked learned");
            self.flush().await;
        }
        changed
    }

    /// Remove `id` from the learned set. Returns true if the set changed.
    pub async fn mark_unlearned(&self, id: KanjiId) -> bool {
        let changed = {
            let mut ledger = self.ledger();
            let changed = ledger.state.mark_unlearned(id);
            if changed {
                ledger.touch(LEARNED_IDS_KEY);
            }
            changed
        };
        if changed {
            debug!(%id, "kanji marked unlearned");
            self.flush().await;
        }
        changed
    }

    pub async fn add_practice_minutes(&self, minutes: u32) {
        {
            let mut ledger = self.ledger();
            ledger.state.add_practice_minutes(minutes);
            ledger.touch(TOTAL_MINUTES_KEY);
        }
        self.flush().await;
    }

    /// Count today toward the practice streak.
    pub async fn record_practice_day(&self) {
        let today = self.clock.today();
        let changed = {
            let mut ledger = self.ledger();
            let changed = ledger.state.record_practice_day(today);
            if changed {
                ledger.touch(PRACTICE_STREAK_KEY);
                ledger.touch(LAST_PRACTICE_DAY_KEY);
            }
            changed
        };
        if changed {
            self.flush().await;
        }
    }

    /// Forget every learned kanji and zero the counters.
    pub async fn reset_progress(&self) {
        {
            let mut ledger = self.ledger();
            ledger.state.reset();
            for key in ALL_KEYS {
                ledger.touch(key);
            }
        }
        info!("progress reset");
        self.flush().await;
    }

    /// True if some key still waits for a successful write.
    #[must_use]
    pub fn has_pending_writes(&self) -> bool {
        !self.ledger().dirty.is_empty()
    }

    async fn flush(&self) {
        let _gate = self.flush_gate.lock().await;
        // Encoded under the gate so the values reflect every mutation so far.
        let pending = self.ledger().pending_writes();
        for (key, revision, value) in pending {
            match self.store.set(key, &value).await {
                Ok(()) => {
                    let mut ledger = self.ledger();
                    if ledger.dirty.get(key) == Some(&revision) {
                        ledger.dirty.remove(key);
                    }
                }
                Err(err) => {
                    warn!(key, error = %err, "progress write failed; will retry on next change");
                }
            }
        }
    }
}

fn encode_key(state: &ProgressState, key: &str) -> PersistedValue {
    match key {
        LEARNED_IDS_KEY => {
            let mut ids: Vec<KanjiId> = state.learned().iter().copied().collect();
            ids.sort();
            PersistedValue::TextList(ids.iter().map(ToString::to_string).collect())
        }
        PRACTICE_STREAK_KEY => PersistedValue::Integer(i64::from(state.practice_streak())),
        TOTAL_MINUTES_KEY => PersistedValue::Integer(i64::from(state.total_practice_minutes())),
        _ => PersistedValue::Text(
            state
                .last_practice_day()
                .map(|day| day.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ),
    }
}

async fn read_learned(
    store: &dyn KeyValueStore,
    catalog: &Catalog,
) -> Result<HashSet<KanjiId>, StorageError> {
    let Some(value) = store.get(LEARNED_IDS_KEY).await? else {
        return Ok(HashSet::new());
    };
    let Some(raw_ids) = value.as_text_list() else {
        warn!(key = LEARNED_IDS_KEY, kind = value.kind(), "unexpected value kind; using default");
        return Ok(HashSet::new());
    };

    let mut learned = HashSet::with_capacity(raw_ids.len());
    for raw in raw_ids {
        match raw.parse::<KanjiId>() {
            Ok(id) if catalog.contains(id) => {
                learned.insert(id);
            }
            Ok(id) => warn!(%id, "dropping learned id unknown to the catalog"),
            Err(err) => warn!(error = %err, "skipping unparseable learned id"),
        }
    }
    Ok(learned)
}

async fn read_counter(store: &dyn KeyValueStore, key: &'static str) -> Result<u32, StorageError> {
    let Some(value) = store.get(key).await? else {
        return Ok(0);
    };
    match value.as_integer().map(u32::try_from) {
        Some(Ok(n)) => Ok(n),
        _ => {
            warn!(key, kind = value.kind(), "unexpected counter value; using 0");
            Ok(0)
        }
    }
}

async fn read_day(store: &dyn KeyValueStore) -> Result<Option<NaiveDate>, StorageError> {
    let Some(value) = store.get(LAST_PRACTICE_DAY_KEY).await? else {
        return Ok(None);
    };
    let raw = value.as_text().unwrap_or_default();
    if raw.is_empty() {
        return Ok(None);
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(day) => Ok(Some(day)),
        Err(err) => {
            warn!(key = LAST_PRACTICE_DAY_KEY, error = %err, "unparseable practice day; ignoring");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use kanji_core::model::KanjiDraft;
    use kanji_core::time::fixed_clock;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;
    use storage::repository::InMemoryStore;

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_drafts(vec![
                KanjiDraft::new("日", "sun", 4).with_level("N5"),
                KanjiDraft::new("月", "moon", 4).with_level("N5"),
                KanjiDraft::new("学", "study", 8).with_level("N4"),
                KanjiDraft::new("生", "life", 5).with_level("N4"),
            ])
            .unwrap(),
        )
    }

    async fn load(store: &InMemoryStore) -> ProgressService {
        ProgressService::load(catalog(), Arc::new(store.clone()), fixed_clock())
            .await
            .unwrap()
    }

    /// Store that counts writes and can be switched into a failing mode.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryStore,
        failing: AtomicBool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<PersistedValue>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &PersistedValue) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("disk full".into()));
            }
            self.inner.set(key, value).await
        }
    }

    #[tokio::test]
    async fn first_run_defaults_to_empty_progress() {
        let progress = load(&InMemoryStore::new()).await;

        assert_eq!(progress.learned_count(), 0);
        assert_eq!(progress.practice_streak(), 0);
        assert_eq!(progress.total_practice_minutes(), 0);
        assert_eq!(progress.mastery_label(), MasteryLabel::Beginner);
        assert!(progress.kanji_for_review().is_empty());
    }

    #[tokio::test]
    async fn mark_learned_is_idempotent_and_writes_once() {
        let store = Arc::new(FlakyStore::default());
        let progress = ProgressService::load(catalog(), store.clone(), fixed_clock())
            .await
            .unwrap();

        assert!(progress.mark_learned(KanjiId::new(1)).await);
        assert!(!progress.mark_learned(KanjiId::new(1)).await);

        assert_eq!(progress.learned_count(), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mark_then_unmark_restores_learned_set() {
        let progress = load(&InMemoryStore::new()).await;
        progress.mark_learned(KanjiId::new(2)).await;
        let before = progress.snapshot();

        progress.mark_learned(KanjiId::new(3)).await;
        assert!(progress.mark_unlearned(KanjiId::new(3)).await);
        assert!(!progress.mark_unlearned(KanjiId::new(3)).await);

        assert_eq!(progress.snapshot().learned(), before.learned());
    }

    #[tokio::test]
    async fn unknown_ids_are_rejected() {
        let progress = load(&InMemoryStore::new()).await;
        assert!(!progress.mark_learned(KanjiId::new(99)).await);
        assert_eq!(progress.learned_count(), 0);
    }

    #[tokio::test]
    async fn fractions_and_levels() {
        let progress = load(&InMemoryStore::new()).await;
        progress.mark_learned(KanjiId::new(1)).await;

        assert_eq!(progress.progress_fraction(), 0.25);
        assert_eq!(progress.mastery_label(), MasteryLabel::Apprentice);
        assert_eq!(progress.level_progress_fraction(JlptLevel::N5), 0.5);
        assert_eq!(progress.level_progress_fraction(JlptLevel::N4), 0.0);
        assert_eq!(progress.level_progress_fraction(JlptLevel::N1), 0.0);
        assert_eq!(progress.level_counts(JlptLevel::N5), (1, 2));

        for id in 2..=4 {
            progress.mark_learned(KanjiId::new(id)).await;
        }
        assert_eq!(progress.mastery_label(), MasteryLabel::Sensei);
    }

    #[tokio::test]
    async fn empty_catalog_fraction_is_zero() {
        let progress = ProgressService::load(
            Arc::new(Catalog::default()),
            Arc::new(InMemoryStore::new()),
            fixed_clock(),
        )
        .await
        .unwrap();

        assert_eq!(progress.progress_fraction(), 0.0);
        assert_eq!(progress.mastery_label(), MasteryLabel::Beginner);
    }

    #[tokio::test]
    async fn progress_survives_reload() {
        let store = InMemoryStore::new();
        {
            let progress = load(&store).await;
            progress.mark_learned(KanjiId::new(3)).await;
            progress.mark_learned(KanjiId::new(1)).await;
            progress.add_practice_minutes(2).await;
            progress.record_practice_day().await;
        }

        let progress = load(&store).await;
        let review: Vec<_> = progress
            .kanji_for_review()
            .iter()
            .map(|r| r.symbol().to_string())
            .collect();
        assert_eq!(review, vec!["日", "学"]);
        assert_eq!(progress.total_practice_minutes(), 2);
        assert_eq!(progress.practice_streak(), 1);
        assert_eq!(
            store.get(LEARNED_IDS_KEY).await.unwrap(),
            Some(PersistedValue::TextList(vec!["1".into(), "3".into()]))
        );
    }

    #[tokio::test]
    async fn malformed_and_stale_values_fall_back() {
        let store = InMemoryStore::new();
        store
            .set(
                LEARNED_IDS_KEY,
                &PersistedValue::TextList(vec!["2".into(), "uuid-ish".into(), "42".into()]),
            )
            .await
            .unwrap();
        store
            .set(PRACTICE_STREAK_KEY, &PersistedValue::Text("lots".into()))
            .await
            .unwrap();
        store
            .set(TOTAL_MINUTES_KEY, &PersistedValue::Integer(-5))
            .await
            .unwrap();

        let progress = load(&store).await;
        assert_eq!(progress.learned_count(), 1);
        assert!(progress.is_learned(KanjiId::new(2)));
        assert_eq!(progress.practice_streak(), 0);
        assert_eq!(progress.total_practice_minutes(), 0);
    }

    #[tokio::test]
    async fn failed_write_keeps_memory_and_retries_on_next_change() {
        let store = Arc::new(FlakyStore::default());
        let progress = ProgressService::load(catalog(), store.clone(), fixed_clock())
            .await
            .unwrap();

        store.failing.store(true, Ordering::SeqCst);
        progress.mark_learned(KanjiId::new(1)).await;
        assert!(progress.is_learned(KanjiId::new(1)));
        assert!(progress.has_pending_writes());

        store.failing.store(false, Ordering::SeqCst);
        progress.add_practice_minutes(1).await;
        assert!(!progress.has_pending_writes());
        assert_eq!(
            store.inner.get(LEARNED_IDS_KEY).await.unwrap(),
            Some(PersistedValue::TextList(vec!["1".into()]))
        );
        assert_eq!(
            store.inner.get(TOTAL_MINUTES_KEY).await.unwrap(),
            Some(PersistedValue::Integer(1))
        );
    }

    /// Store whose first write stalls, so a later write can queue behind it.
    #[derive(Default)]
    struct SlowFirstWrite {
        inner: InMemoryStore,
        stalled: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for SlowFirstWrite {
        async fn get(&self, key: &str) -> Result<Option<PersistedValue>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &PersistedValue) -> Result<(), StorageError> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(StdDuration::from_millis(50)).await;
            }
            self.inner.set(key, value).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_marks_store_the_newest_learned_set() {
        let store = Arc::new(SlowFirstWrite::default());
        let progress = ProgressService::load(catalog(), store.clone(), fixed_clock())
            .await
            .unwrap();

        tokio::join!(
            progress.mark_learned(KanjiId::new(1)),
            progress.mark_learned(KanjiId::new(2)),
        );

        assert_eq!(progress.learned_count(), 2);
        assert!(!progress.has_pending_writes());
        assert_eq!(
            store.inner.get(LEARNED_IDS_KEY).await.unwrap(),
            Some(PersistedValue::TextList(vec!["1".into(), "2".into()]))
        );
    }

    #[tokio::test]
    async fn streak_follows_the_clock() {
        let store = InMemoryStore::new();
        let mut clock = fixed_clock();

        for _ in 0..3 {
            let progress = ProgressService::load(catalog(), Arc::new(store.clone()), clock)
                .await
                .unwrap();
            progress.record_practice_day().await;
            progress.record_practice_day().await;
            clock.advance(Duration::days(1));
        }

        let progress = load(&store).await;
        assert_eq!(progress.practice_streak(), 3);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let store = InMemoryStore::new();
        let progress = load(&store).await;
        progress.mark_learned(KanjiId::new(1)).await;
        progress.add_practice_minutes(5).await;
        progress.record_practice_day().await;

        progress.reset_progress().await;
        assert_eq!(progress.snapshot(), ProgressState::default());

        let reloaded = load(&store).await;
        assert_eq!(reloaded.snapshot(), ProgressState::default());
    }
}
