//! Surah recitations and the single active playback

use crate::error::{MushafError, Result};
use crate::verses::TOTAL_SURAHS;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub const AUDIO_API_BASE: &str = "https://quranapi.pages.dev/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recitation {
    pub reciter: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurahAudio {
    pub surah_name: String,
    pub surah_name_arabic: String,
    #[serde(default)]
    pub surah_name_arabic_long: Option<String>,
    #[serde(default)]
    pub surah_name_translation: Option<String>,
    #[serde(default)]
    pub revelation_place: Option<String>,
    pub total_ayah: u32,
    #[serde(default)]
    pub surah_no: Option<u32>,
    /// Reciter key -> recitation
    #[serde(default)]
    pub audio: BTreeMap<String, Recitation>,
}

impl SurahAudio {
    pub fn recitations(&self) -> impl Iterator<Item = &Recitation> {
        self.audio.values()
    }

    /// Recitation selected when the user has not picked one.
    pub fn default_recitation(&self) -> Option<&Recitation> {
        self.audio.values().next()
    }

    pub fn recitation_by_reciter(&self, reciter: &str) -> Option<&Recitation> {
        let needle = reciter.to_lowercase();
        self.audio
            .values()
            .find(|r| r.reciter.to_lowercase().contains(&needle))
    }
}

#[derive(Clone)]
pub struct AudioClient {
    client: reqwest::Client,
    base_url: String,
}

impl AudioClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Recitations of one surah.
    pub async fn fetch(&self, surah: u32) -> Result<SurahAudio> {
        if surah == 0 || surah > TOTAL_SURAHS {
            return Err(MushafError::InvalidLocator(format!(
                "Surah {} is out of range (1-{})",
                surah, TOTAL_SURAHS
            )));
        }

        let url = format!("{}/{}.json", self.base_url.trim_end_matches('/'), surah);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MushafError::Network(format!("Failed to fetch Surah {}: {}", surah, e)))?;

        if !response.status().is_success() {
            return Err(MushafError::Fetch(format!(
                "Failed to fetch Surah {}: HTTP {}",
                surah,
                response.status()
            )));
        }

        let audio: SurahAudio = response
            .json()
            .await
            .map_err(|e| MushafError::Network(format!("Failed to parse Surah {} audio: {}", surah, e)))?;
        Ok(audio)
    }

    /// Every surah, in order. Any failure fails the whole listing.
    pub async fn fetch_all(&self) -> Result<Vec<SurahAudio>> {
        let surahs = try_join_all((1..=TOTAL_SURAHS).map(|n| self.fetch(n))).await?;
        info!(count = surahs.len(), "Loaded surah recitations");
        Ok(surahs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playback {
    pub surah: u32,
    pub reciter: String,
    pub url: String,
    pub started_at: DateTime<Utc>,
}

/// Output device of the playback slot.
pub trait AudioSink: Send + Sync {
    fn play(&self, playback: &Playback);
    fn stop(&self, playback: &Playback);
}

/// Sink that only traces what would be played.
#[derive(Debug, Default)]
pub struct LogSink;

impl AudioSink for LogSink {
    fn play(&self, playback: &Playback) {
        info!(surah = playback.surah, reciter = %playback.reciter, url = %playback.url, "Playing");
    }

    fn stop(&self, playback: &Playback) {
        info!(surah = playback.surah, "Stopped");
    }
}

/// At most one recitation plays at a time.
pub struct PlaybackSlot {
    current: Mutex<Option<Playback>>,
    sink: Arc<dyn AudioSink>,
}

impl PlaybackSlot {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            current: Mutex::new(None),
            sink,
        }
    }

    /// Start playing `url`, stopping whatever plays now.
    pub fn start(&self, surah: u32, reciter: impl Into<String>, url: impl Into<String>) -> Playback {
        let playback = Playback {
            surah,
            reciter: reciter.into(),
            url: url.into(),
            started_at: Utc::now(),
        };

        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            self.sink.stop(&previous);
        }
        self.sink.play(&playback);
        *current = Some(playback.clone());
        playback
    }

    pub fn stop(&self) -> Option<Playback> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let stopped = current.take();
        if let Some(ref playback) = stopped {
            self.sink.stop(playback);
        }
        stopped
    }

    /// Playback of `surah` reached its end. A stale notification for a
    /// surah that is no longer playing changes nothing.
    pub fn finished(&self, surah: u32) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        match current.as_ref() {
            Some(playback) if playback.surah == surah => {
                *current = None;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<Playback> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_playing(&self, surah: u32) -> bool {
        self.current().map_or(false, |p| p.surah == surah)
    }
}

impl Default for PlaybackSlot {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl AudioSink for RecordingSink {
        fn play(&self, playback: &Playback) {
            self.events.lock().unwrap().push(format!("play {}", playback.surah));
        }

        fn stop(&self, playback: &Playback) {
            self.events.lock().unwrap().push(format!("stop {}", playback.surah));
        }
    }

    fn surah_body(n: u32) -> serde_json::Value {
        json!({
            "surahName": format!("Surah {}", n),
            "surahNameArabic": "الفاتحة",
            "revelationPlace": "Mecca",
            "totalAyah": 7,
            "surahNo": n,
            "audio": {
                "1": {"reciter": "Mishary Rashid Al Afasy", "url": "https://example.org/1.mp3", "originalUrl": "https://example.org/o1.mp3"},
                "2": {"reciter": "Abu Bakr Al Shatri", "url": "https://example.org/2.mp3"}
            }
        })
    }

    #[test]
    fn test_single_active_playback() {
        let sink = Arc::new(RecordingSink::default());
        let slot = PlaybackSlot::new(sink.clone());

        slot.start(1, "Afasy", "a.mp3");
        slot.start(2, "Shatri", "b.mp3");
        assert!(slot.is_playing(2));
        assert!(!slot.is_playing(1));

        // Surah 1 was replaced, its end notification is stale
        assert!(!slot.finished(1));
        assert!(slot.is_playing(2));

        assert_eq!(slot.stop().map(|p| p.surah), Some(2));
        assert!(slot.current().is_none());
        assert!(slot.stop().is_none());

        let events = sink.events.lock().unwrap().clone();
        assert_eq!(events, vec!["play 1", "stop 1", "play 2", "stop 2"]);
    }

    #[test]
    fn test_finished_clears_playing_surah() {
        let slot = PlaybackSlot::default();
        slot.start(36, "Afasy", "yasin.mp3");
        assert!(slot.finished(36));
        assert!(slot.current().is_none());
    }

    #[tokio::test]
    async fn test_fetch_surah_audio() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(surah_body(1)))
            .mount(&server)
            .await;

        let client = AudioClient::new(reqwest::Client::new(), server.uri());
        let audio = client.fetch(1).await.unwrap();
        assert_eq!(audio.total_ayah, 7);
        assert_eq!(audio.default_recitation().unwrap().reciter, "Mishary Rashid Al Afasy");
        assert_eq!(audio.recitation_by_reciter("shatri").unwrap().url, "https://example.org/2.mp3");
        assert!(client.fetch(115).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_all_is_ordered() {
        let server = MockServer::start().await;
        for n in 1..=TOTAL_SURAHS {
            Mock::given(method("GET"))
                .and(path(format!("/{}.json", n)))
                .respond_with(ResponseTemplate::new(200).set_body_json(surah_body(n)))
                .mount(&server)
                .await;
        }

        let client = AudioClient::new(reqwest::Client::new(), server.uri());
        let all = client.fetch_all().await.unwrap();
        assert_eq!(all.len(), TOTAL_SURAHS as usize);
        assert!(all.iter().enumerate().all(|(i, s)| s.surah_no == Some(i as u32 + 1)));
    }

    #[tokio::test]
    async fn test_fetch_all_fails_on_any_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/57.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/\d+\.json$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(surah_body(1)))
            .mount(&server)
            .await;

        let client = AudioClient::new(reqwest::Client::new(), server.uri());
        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(err, MushafError::Fetch(ref m) if m.contains("Surah 57")));
    }
}
