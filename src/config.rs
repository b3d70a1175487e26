//! Settings file and data directory resolution

use crate::align::AlignMode;
use crate::audio::AUDIO_API_BASE;
use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::filter::{MatchOptions, DEFAULT_DEBOUNCE};
use crate::source::QURAN_API_BASE;
use crate::translations::{DEFAULT_TRANSLATION, QURANENC_API_BASE};
use crate::verses::Edition;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

/// Folder of bundled Hadith datasets inside the data directory
pub const HADITH_DIR: &str = "hadith";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quran_api: String,
    pub translation_api: String,
    pub audio_api: String,
    /// Translation edition shown beside the script
    pub edition: Edition,
    pub arabic_edition: Edition,
    pub translation: String,
    pub align_mode: AlignMode,
    pub debounce_ms: u64,
    pub cache_capacity: usize,
    pub request_timeout_secs: u64,
    pub fold_arabic: bool,
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quran_api: QURAN_API_BASE.to_string(),
            translation_api: QURANENC_API_BASE.to_string(),
            audio_api: AUDIO_API_BASE.to_string(),
            edition: Edition::asad(),
            arabic_edition: Edition::uthmani(),
            translation: DEFAULT_TRANSLATION.to_string(),
            align_mode: AlignMode::default(),
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            request_timeout_secs: 30,
            fold_arabic: false,
            data_dir: None,
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings in {:?}", path))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            fold_arabic: self.fold_arabic,
        }
    }

    /// The configured data directory, else the platform default.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(get_data_dir)
    }
}

#[cfg(debug_assertions)]
fn has_datasets(dir: &Path) -> bool {
    dir.join(HADITH_DIR).is_dir()
}

/// Where the bundled Hadith datasets live.
///
/// Debug builds prefer a `data/` checkout with a Hadith directory, found
/// beside the working directory or up to five levels above the binary.
/// Otherwise macOS uses `~/Library/Application Support/Mushaf` and other
/// platforms keep `data/` beside the binary.
pub fn get_data_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        if let Some(dir) = dev_data_dir() {
            return dir;
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(dir) = dirs::data_dir() {
            return dir.join("Mushaf");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Some(dir) = exe_dir() {
            return dir.join("data");
        }
    }

    PathBuf::from("data")
}

#[cfg(any(debug_assertions, not(target_os = "macos")))]
fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe().ok()?.parent().map(Path::to_path_buf)
}

#[cfg(debug_assertions)]
fn dev_data_dir() -> Option<PathBuf> {
    let relative = ["data", "../data", "../../data"]
        .into_iter()
        .map(PathBuf::from)
        .find(|dir| has_datasets(dir))
        .map(|dir| dir.canonicalize().unwrap_or(dir));
    if relative.is_some() {
        return relative;
    }

    // cargo puts the binary in target/<profile>, below the checkout
    exe_dir()?
        .ancestors()
        .take(5)
        .map(|dir| dir.join("data"))
        .find(|dir| has_datasets(dir))
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.debounce(), Duration::from_millis(300));
        assert_eq!(settings.edition, Edition::asad());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = settings_path(dir.path());
        fs::write(&path, r#"{"edition": "en.pickthall", "align_mode": "by_index", "fold_arabic": true}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.edition.as_str(), "en.pickthall");
        assert_eq!(settings.align_mode, AlignMode::ByIndex);
        assert!(settings.match_options().fold_arabic);
        assert_eq!(settings.quran_api, QURAN_API_BASE);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = Settings {
            debounce_ms: 150,
            data_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
        assert_eq!(settings.resolve_data_dir(), dir.path());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_checkout_needs_hadith_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_datasets(dir.path()));
        fs::create_dir_all(dir.path().join(HADITH_DIR)).unwrap();
        assert!(has_datasets(dir.path()));
    }

    #[test]
    fn test_data_dir_is_named_for_its_platform() {
        let dir = get_data_dir();
        assert!(dir.ends_with("data") || dir.ends_with("Mushaf"), "{:?}", dir);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = settings_path(dir.path());
        fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
