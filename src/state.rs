//! Application state management

use crate::audio::{AudioClient, PlaybackSlot};
use crate::cache::QueryCache;
use crate::config::{Settings, HADITH_DIR};
use crate::hadith::HadithLibrary;
use crate::source::{FetchPolicy, RemoteSource};
use crate::translations::TranslationClient;
use crate::verses::UnitKind;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Everything the views share: settings, the HTTP client, the query cache,
/// the bundled Hadith collections and the playback slot.
pub struct AppState {
    pub settings: Settings,
    pub client: reqwest::Client,
    pub cache: Arc<QueryCache>,
    pub hadith: Arc<HadithLibrary>,
    pub playback: Arc<PlaybackSlot>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize application state
    pub fn new(settings: Settings, data_dir: PathBuf) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let hadith = HadithLibrary::load(&data_dir.join(HADITH_DIR))
            .context("Failed to load hadith collections")?;
        info!(collections = hadith.len(), data_dir = ?data_dir, "Application state ready");

        Ok(Self {
            cache: Arc::new(QueryCache::new(settings.cache_capacity)),
            settings,
            client,
            hadith: Arc::new(hadith),
            playback: Arc::new(PlaybackSlot::default()),
            data_dir,
        })
    }

    /// Remote source for `kind`. Manzils are fetched patiently: one retry
    /// and a five minute cache window.
    pub fn quran_source(&self, kind: UnitKind) -> RemoteSource {
        let source = RemoteSource::new(self.client.clone(), self.settings.quran_api.clone(), Arc::clone(&self.cache));
        if kind == UnitKind::Manzil {
            source.with_policy(FetchPolicy::patient())
        } else {
            source
        }
    }

    pub fn translation_client(&self) -> TranslationClient {
        TranslationClient::new(self.client.clone(), self.settings.translation_api.clone())
    }

    pub fn audio_client(&self) -> AudioClient {
        AudioClient::new(self.client.clone(), self.settings.audio_api.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hadith::Collection;
    use std::fs;

    #[test]
    fn test_state_loads_available_collections() {
        let dir = tempfile::tempdir().unwrap();
        let hadith_dir = dir.path().join(HADITH_DIR);
        fs::create_dir_all(&hadith_dir).unwrap();
        fs::write(
            hadith_dir.join(Collection::Hadith500.file_name()),
            r#"[{"Introduction": "On sincerity"}]"#,
        )
        .unwrap();

        let state = AppState::new(Settings::default(), dir.path().to_path_buf()).unwrap();
        assert_eq!(state.hadith.len(), 1);
        assert_eq!(state.quran_source(UnitKind::Manzil).policy(), FetchPolicy::patient());
        assert_eq!(state.quran_source(UnitKind::Ruku).policy(), FetchPolicy::default());
    }

    #[test]
    fn test_state_without_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Settings::default(), dir.path().to_path_buf()).unwrap();
        assert!(state.hadith.is_empty());
    }
}
