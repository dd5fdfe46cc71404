use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::KanjiId;
use crate::model::kanji::{JlptLevel, KanjiDraft, KanjiError, KanjiRecord};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid catalog entry #{index}: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: KanjiError,
    },

    #[error("duplicate kanji id in catalog: {0}")]
    DuplicateId(KanjiId),

    #[error("catalog is not valid JSON: {0}")]
    Json(String),
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Immutable, ordered list of kanji records, fixed for the process lifetime.
///
/// Every id in a catalog is unique. Ids handed out by [`Catalog::from_drafts`]
/// follow the entry position (1-based), so they stay stable across runs as
/// long as the source list is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    records: Vec<KanjiRecord>,
}

impl Catalog {
    /// Validate drafts in order and assign positional ids.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidEntry` for the first draft that fails validation.
    pub fn from_drafts(drafts: impl IntoIterator<Item = KanjiDraft>) -> Result<Self, CatalogError> {
        let records = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                let id = KanjiId::new(index as u64 + 1);
                draft
                    .validate(id)
                    .map_err(|source| CatalogError::InvalidEntry { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// Build a catalog from already-validated records.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two records share an id.
    pub fn from_records(records: Vec<KanjiRecord>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(CatalogError::DuplicateId(record.id()));
            }
        }
        Ok(Self { records })
    }

    /// Parse a JSON array of kanji drafts.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Json` for malformed input and
    /// `CatalogError::InvalidEntry` for entries that fail validation.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let drafts: Vec<KanjiDraft> =
            serde_json::from_str(text).map_err(|err| CatalogError::Json(err.to_string()))?;
        Self::from_drafts(drafts)
    }

    /// The bundled N5 starter list.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidEntry` if a bundled entry fails validation.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_drafts(builtin_drafts())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KanjiRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn records(&self) -> &[KanjiRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, id: KanjiId) -> Option<&KanjiRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: KanjiId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&KanjiRecord> {
        let symbol = symbol.trim();
        self.records.iter().find(|record| record.symbol() == symbol)
    }

    /// Records tagged with the given level, in catalog order.
    #[must_use]
    pub fn by_level(&self, level: JlptLevel) -> Vec<&KanjiRecord> {
        self.records
            .iter()
            .filter(|record| record.level() == Some(level))
            .collect()
    }

    /// Records whose level is any of `levels`, in catalog order.
    #[must_use]
    pub fn in_levels(&self, levels: &[JlptLevel]) -> Vec<&KanjiRecord> {
        self.records
            .iter()
            .filter(|record| record.level().is_some_and(|level| levels.contains(&level)))
            .collect()
    }
}

fn n5(symbol: &str, meaning: &str, reading: &str, strokes: u32, examples: [&str; 2]) -> KanjiDraft {
    KanjiDraft::new(symbol, meaning, strokes)
        .with_reading(reading)
        .with_level("N5")
        .with_examples(examples)
}

#[rustfmt::skip]
fn builtin_drafts() -> Vec<KanjiDraft> {
    vec![
        n5("日", "sun, day", "にち, ひ", 4, ["日曜日 (にちようび) - Sunday", "日本 (にほん) - Japan"]),
        n5("月", "moon, month", "げつ, つき", 4, ["月曜日 (げつようび) - Monday", "一月 (いちがつ) - January"]),
        n5("火", "fire", "か, ひ", 4, ["火曜日 (かようび) - Tuesday", "火山 (かざん) - volcano"]),
        n5("水", "water", "すい, みず", 4, ["水曜日 (すいようび) - Wednesday", "水泳 (すいえい) - swimming"]),
        n5("木", "tree", "もく, き", 4, ["木曜日 (もくようび) - Thursday", "木造 (もくぞう) - wooden"]),
        n5("金", "gold, money", "きん, かね", 8, ["金曜日 (きんようび) - Friday", "お金 (おかね) - money"]),
        n5("土", "earth, soil", "ど, つち", 3, ["土曜日 (どようび) - Saturday", "土地 (とち) - land"]),
        n5("人", "person", "じん, にん, ひと", 2, ["日本人 (にほんじん) - Japanese person", "一人 (ひとり) - one person"]),
        n5("山", "mountain", "さん, やま", 3, ["山 (やま) - mountain", "富士山 (ふじさん) - Mount Fuji"]),
        n5("川", "river", "せん, かわ", 3, ["川 (かわ) - river", "河川 (かせん) - rivers"]),
        n5("田", "rice field", "でん, た", 5, ["田舎 (いなか) - countryside", "田んぼ (たんぼ) - rice paddy"]),
        n5("口", "mouth, entrance", "こう, くち", 3, ["入口 (いりぐち) - entrance", "口座 (こうざ) - bank account"]),
        n5("目", "eye", "もく, め", 5, ["目 (め) - eye", "目的 (もくてき) - purpose"]),
        n5("手", "hand", "しゅ, て", 4, ["手紙 (てがみ) - letter", "下手 (へた) - unskilled"]),
        n5("足", "foot, enough", "そく, あし", 7, ["足 (あし) - foot", "満足 (まんぞく) - satisfaction"]),
    ]
}
