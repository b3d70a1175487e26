//! Bundled Hadith collections
//!
//! Each collection ships as a JSON array whose entries follow one of three
//! shapes. Records are parsed once at startup, shared read-only behind an
//! `Arc`, and only ever filtered into subsets.

use crate::error::{MushafError, Result};
use crate::filter::{filter_indices, DebouncedFilter, FieldSelector, MatchOptions};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const NO_TITLE: &str = "No Title";
pub const NO_CONTENT: &str = "No content available for this hadith.";
pub const NO_REFERENCE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    SahihBukhari,
    SahihMuslim,
    MalikMuwatta,
    Qudsi,
    Nawawi,
    Hadith500,
}

/// Wire layout of a collection's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// `{Heading, Content, Reference}`
    Headed,
    /// `{Introduction}`
    Introduced,
    /// `{hadith_number, text}`
    Numbered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HadithField {
    Heading,
    Content,
    Reference,
    Introduction,
    HadithNumber,
    Text,
}

impl RecordShape {
    /// Fields a search query is matched against.
    pub fn search_fields(&self) -> &'static [HadithField] {
        match self {
            RecordShape::Headed => &[HadithField::Heading, HadithField::Content],
            RecordShape::Introduced => &[HadithField::Introduction],
            RecordShape::Numbered => &[HadithField::HadithNumber, HadithField::Text],
        }
    }
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::SahihBukhari,
        Collection::SahihMuslim,
        Collection::MalikMuwatta,
        Collection::Qudsi,
        Collection::Nawawi,
        Collection::Hadith500,
    ];

    pub fn shape(&self) -> RecordShape {
        match self {
            Collection::SahihBukhari
            | Collection::SahihMuslim
            | Collection::MalikMuwatta
            | Collection::Qudsi => RecordShape::Headed,
            Collection::Nawawi => RecordShape::Numbered,
            Collection::Hadith500 => RecordShape::Introduced,
        }
    }

    pub fn search_fields(&self) -> &'static [HadithField] {
        self.shape().search_fields()
    }

    /// Route segment of the collection's view.
    pub fn slug(&self) -> &'static str {
        match self {
            Collection::SahihBukhari => "sahihbukhari",
            Collection::SahihMuslim => "sahihmuslim",
            Collection::MalikMuwatta => "malikmut",
            Collection::Qudsi => "hudsi",
            Collection::Nawawi => "nawawi",
            Collection::Hadith500 => "hadith500",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.slug() == slug)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Collection::SahihBukhari => "Sahih Bukhari",
            Collection::SahihMuslim => "Sahih Muslim",
            Collection::MalikMuwatta => "Malik Muwatta",
            Collection::Qudsi => "Hadith Qudsi",
            Collection::Nawawi => "Nawawi",
            Collection::Hadith500 => "Hadith 500",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Collection::Nawawi => "A collection of Hadiths from Imam Nawawi",
            Collection::Hadith500 => "A collection of important Hadiths related to the teachings of Islam",
            _ => "One of the most authentic collections of the Prophet's (ﷺ) traditions",
        }
    }

    /// Dataset file under the Hadith directory. Qudsi reads its own
    /// `hadith_qudsi.json` rather than sharing the Bukhari file, so a data
    /// directory without it reports `NotFound` on `/hudsi`.
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::SahihBukhari => "sahih_bukhari.json",
            Collection::SahihMuslim => "sahih_muslim.json",
            Collection::MalikMuwatta => "malik_muwatta.json",
            Collection::Qudsi => "hadith_qudsi.json",
            Collection::Nawawi => "nawawi.json",
            Collection::Hadith500 => "hadith500.json",
        }
    }
}

/// Accepts a string, a number or null.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadedHadith {
    #[serde(rename = "Heading", default, deserialize_with = "lenient_string")]
    pub heading: Option<String>,
    #[serde(rename = "Content", default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
    #[serde(rename = "Reference", default, deserialize_with = "lenient_string")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntroducedHadith {
    #[serde(rename = "Introduction", default, deserialize_with = "lenient_string")]
    pub introduction: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberedHadith {
    #[serde(default, deserialize_with = "lenient_string")]
    pub hadith_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum HadithRecord {
    Headed(HeadedHadith),
    Introduced(IntroducedHadith),
    Numbered(NumberedHadith),
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl HadithRecord {
    pub fn shape(&self) -> RecordShape {
        match self {
            HadithRecord::Headed(_) => RecordShape::Headed,
            HadithRecord::Introduced(_) => RecordShape::Introduced,
            HadithRecord::Numbered(_) => RecordShape::Numbered,
        }
    }

    pub fn field(&self, field: HadithField) -> Option<&str> {
        match (self, field) {
            (HadithRecord::Headed(h), HadithField::Heading) => non_empty(&h.heading),
            (HadithRecord::Headed(h), HadithField::Content) => non_empty(&h.content),
            (HadithRecord::Headed(h), HadithField::Reference) => non_empty(&h.reference),
            (HadithRecord::Introduced(h), HadithField::Introduction) => non_empty(&h.introduction),
            (HadithRecord::Numbered(h), HadithField::HadithNumber) => non_empty(&h.hadith_number),
            (HadithRecord::Numbered(h), HadithField::Text) => non_empty(&h.text),
            _ => None,
        }
    }

    /// Present values of the fields searched for this record's shape.
    pub fn searchable_fields(&self) -> Vec<&str> {
        self.shape()
            .search_fields()
            .iter()
            .filter_map(|f| self.field(*f))
            .collect()
    }

    /// Heading shown for the record at `position` (0-based) of its collection.
    pub fn title(&self, position: usize) -> String {
        match self {
            HadithRecord::Introduced(_) => format!("Hadith # {}", position + 1),
            HadithRecord::Headed(_) => self.field(HadithField::Heading).unwrap_or(NO_TITLE).to_string(),
            HadithRecord::Numbered(_) => self
                .field(HadithField::HadithNumber)
                .unwrap_or(NO_TITLE)
                .to_string(),
        }
    }

    pub fn body(&self) -> &str {
        let field = match self {
            HadithRecord::Headed(_) => HadithField::Content,
            HadithRecord::Introduced(_) => HadithField::Introduction,
            HadithRecord::Numbered(_) => HadithField::Text,
        };
        self.field(field).unwrap_or(NO_CONTENT)
    }

    pub fn reference(&self) -> &str {
        self.field(HadithField::Reference)
            .or_else(|| self.field(HadithField::HadithNumber))
            .unwrap_or(NO_REFERENCE)
    }
}

/// One loaded collection.
#[derive(Debug, Clone)]
pub struct HadithCollection {
    collection: Collection,
    records: Arc<Vec<HadithRecord>>,
}

impl HadithCollection {
    pub fn from_records(collection: Collection, records: Vec<HadithRecord>) -> Self {
        Self {
            collection,
            records: Arc::new(records),
        }
    }

    pub fn from_json(collection: Collection, json: &str) -> Result<Self> {
        let parsed: serde_json::Result<Vec<HadithRecord>> = match collection.shape() {
            RecordShape::Headed => serde_json::from_str::<Vec<HeadedHadith>>(json)
                .map(|v| v.into_iter().map(HadithRecord::Headed).collect()),
            RecordShape::Introduced => serde_json::from_str::<Vec<IntroducedHadith>>(json)
                .map(|v| v.into_iter().map(HadithRecord::Introduced).collect()),
            RecordShape::Numbered => serde_json::from_str::<Vec<NumberedHadith>>(json)
                .map(|v| v.into_iter().map(HadithRecord::Numbered).collect()),
        };

        let records = parsed.map_err(|e| {
            MushafError::Dataset(format!("Malformed {}: {}", collection.file_name(), e))
        })?;
        Ok(Self::from_records(collection, records))
    }

    pub fn load(collection: Collection, dir: &Path) -> Result<Self> {
        let path = dir.join(collection.file_name());
        let content = fs::read_to_string(&path)
            .map_err(|e| MushafError::Dataset(format!("Failed to read {:?}: {}", path, e)))?;
        Self::from_json(collection, &content)
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn records(&self) -> &Arc<Vec<HadithRecord>> {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&HadithRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn selector() -> FieldSelector<HadithRecord> {
        Arc::new(HadithRecord::searchable_fields)
    }

    /// Immediate filtering, in original order.
    pub fn filter(&self, query: &str, options: MatchOptions) -> Vec<&HadithRecord> {
        filter_indices(&self.records, query, &HadithRecord::searchable_fields, options)
            .into_iter()
            .filter_map(|i| self.records.get(i))
            .collect()
    }

    /// A debounced search box over this collection's records.
    pub fn debounced_filter(&self, delay: Duration, options: MatchOptions) -> DebouncedFilter<HadithRecord> {
        DebouncedFilter::new(Arc::clone(&self.records), Self::selector(), delay).with_options(options)
    }
}

/// Every collection found in the data directory.
#[derive(Debug, Clone, Default)]
pub struct HadithLibrary {
    collections: HashMap<Collection, HadithCollection>,
}

impl HadithLibrary {
    /// Load the collections present in `dir`. Missing files are skipped;
    /// a malformed file fails the whole load.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut library = Self::default();
        for collection in Collection::ALL {
            if !dir.join(collection.file_name()).exists() {
                warn!(?collection, dir = ?dir, "Hadith dataset not found, skipping");
                continue;
            }
            let loaded = HadithCollection::load(collection, dir)?;
            info!(?collection, records = loaded.len(), "Loaded hadith collection");
            library.insert(loaded);
        }
        Ok(library)
    }

    pub fn insert(&mut self, collection: HadithCollection) {
        self.collections.insert(collection.collection(), collection);
    }

    pub fn get(&self, collection: Collection) -> Option<&HadithCollection> {
        self.collections.get(&collection)
    }

    pub fn require(&self, collection: Collection) -> Result<&HadithCollection> {
        self.get(collection).ok_or_else(|| {
            MushafError::NotFound(format!("{} dataset ({}) is not installed", collection.title(), collection.file_name()))
        })
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BUKHARI: &str = r#"[
        {"Heading": "Faith", "Content": "Actions are judged by intentions", "Reference": "1"},
        {"Heading": "Prayer", "Content": "The first matter to be judged", "Reference": 2}
    ]"#;

    #[test]
    fn test_query_matches_heading() {
        let bukhari = HadithCollection::from_json(Collection::SahihBukhari, BUKHARI).unwrap();
        let hits = bukhari.filter("pray", MatchOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0], &bukhari.records()[1]);
        assert_eq!(hits[0].reference(), "2");
    }

    #[test]
    fn test_empty_query_returns_collection() {
        let bukhari = HadithCollection::from_json(Collection::SahihBukhari, BUKHARI).unwrap();
        let all: Vec<HadithRecord> = bukhari.filter("", MatchOptions::default()).into_iter().cloned().collect();
        assert_eq!(&all, bukhari.records().as_ref());
    }

    #[test]
    fn test_shapes_search_their_own_fields() {
        let nawawi = HadithCollection::from_json(
            Collection::Nawawi,
            r#"[{"hadith_number": 1, "text": "Deeds are by intentions"}, {"hadith_number": "2", "text": "Islam, Iman, Ihsan"}]"#,
        )
        .unwrap();
        assert_eq!(nawawi.filter("ihsan", MatchOptions::default()).len(), 1);
        assert_eq!(nawawi.filter("1", MatchOptions::default())[0].title(0), "1");

        let h500 = HadithCollection::from_json(
            Collection::Hadith500,
            r#"[{"Introduction": "On patience"}, {"Introduction": "On gratitude"}]"#,
        )
        .unwrap();
        let hits = h500.filter("GRATITUDE", MatchOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(h500.records()[1].title(1), "Hadith # 2");
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let muslim = HadithCollection::from_json(Collection::SahihMuslim, r#"[{}, {"Heading": ""}]"#).unwrap();
        let record = &muslim.records()[0];
        assert_eq!(record.title(0), NO_TITLE);
        assert_eq!(record.body(), NO_CONTENT);
        assert_eq!(record.reference(), NO_REFERENCE);
        assert_eq!(muslim.records()[1].title(1), NO_TITLE);
        // Records without text never match a non-empty query
        assert!(muslim.filter("a", MatchOptions::default()).is_empty());
    }

    #[test]
    fn test_malformed_dataset_is_rejected() {
        let err = HadithCollection::from_json(Collection::Qudsi, r#"{"Heading": "not an array"}"#).unwrap_err();
        assert!(matches!(err, MushafError::Dataset(_)));
    }

    #[test]
    fn test_library_load_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sahih_bukhari.json"), BUKHARI).unwrap();

        let library = HadithLibrary::load(dir.path()).unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.require(Collection::SahihBukhari).unwrap().len(), 2);
        assert!(matches!(
            library.require(Collection::Nawawi),
            Err(MushafError::NotFound(_))
        ));
    }

    #[test]
    fn test_library_load_fails_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("nawawi.json"), "not json").unwrap();
        assert!(HadithLibrary::load(dir.path()).is_err());
    }

    #[test]
    fn test_slugs_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_slug(collection.slug()), Some(collection));
        }
    }

    #[test]
    fn test_qudsi_has_its_own_dataset_file() {
        assert_eq!(Collection::Qudsi.file_name(), "hadith_qudsi.json");
        assert_ne!(Collection::Qudsi.file_name(), Collection::SahihBukhari.file_name());

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(Collection::SahihBukhari.file_name()), BUKHARI).unwrap();
        let library = HadithLibrary::load(dir.path()).unwrap();
        assert!(library.require(Collection::SahihBukhari).is_ok());
        assert!(matches!(library.require(Collection::Qudsi), Err(MushafError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_collection_search() {
        let bukhari = HadithCollection::from_json(Collection::SahihBukhari, BUKHARI).unwrap();
        let search = bukhari.debounced_filter(crate::filter::DEFAULT_DEBOUNCE, MatchOptions::default());

        search.set_query("jud");
        search.set_query("judged by");
        let state = search.settled().await;
        assert_eq!(*state.matches, vec![0]);
        assert_eq!(search.evaluations(), 1);
    }
}
