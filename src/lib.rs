//! Mushaf - Quran and Hadith reader
//!
//! Backend library: verse sources and alignment, Hadith filtering, views and
//! routing.

pub mod error;
pub mod verses;
pub mod cache;
pub mod source;
pub mod align;
pub mod filter;
pub mod hadith;
pub mod search;
pub mod translations;
pub mod audio;
pub mod view;
pub mod shell;
pub mod config;
pub mod state;

pub use error::{MushafError, Result};
pub use state::AppState;
pub use verses::{AyahRef, Edition, QuranText, SurahRef, UnitKind, UnitText, Verse};
pub use cache::{QueryCache, QueryKey};
pub use source::{FetchPolicy, RecordSource, RemoteSource, StaticSource};
pub use align::{align, align_quran, AlignMode, AlignedVerse, Alignment};
pub use filter::{filter_indices, DebouncedFilter, FieldSelector, MatchOptions, SearchState};
pub use hadith::{Collection, HadithCollection, HadithLibrary, HadithRecord};
pub use search::{filter_surahs, highlight, search_quran, SearchOutcome, Segment};
pub use translations::{TranslatedAyah, TranslationClient, TRANSLATIONS};
pub use audio::{AudioClient, AudioSink, LogSink, PlaybackSlot, SurahAudio};
pub use view::{AyahView, DualSourceView, QuranView, UnitView, ViewState};
pub use shell::Route;
pub use config::{get_data_dir, Settings};
