//! Per-surah translations in regional languages from QuranEnc

use crate::error::{MushafError, Result};
use crate::verses::TOTAL_SURAHS;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const QURANENC_API_BASE: &str = "https://quranenc.com/api/v1";

pub const DEFAULT_TRANSLATION: &str = "tamil_baqavi";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Translation {
    pub key: &'static str,
    pub label: &'static str,
}

const fn translation(key: &'static str, label: &'static str) -> Translation {
    Translation { key, label }
}

pub const TRANSLATIONS: [Translation; 19] = [
    translation("tamil_baqavi", "Tamil - Abdulhamid Albaqoi"),
    translation("tamil_omar", "Tamil - Omar Sharif"),
    translation("hindi_omari", "Hindi - Azizul-Haqq Al-Umary"),
    translation("urdu_junagarhi", "Urdu - Muhammad Ibrahim Gunakry"),
    translation("telugu_muhammad", "Telugu - Abder-Rahim ibn Muhammad"),
    translation("gujarati_omari", "Gujarati - Rabila Al-Umry"),
    translation(
        "malayalam_kunhi",
        "Malayalam - Abdul-Hamid Haidar Al-Madany and Kanhi Muhammad",
    ),
    translation("kannada_hamza", "Kannada - Muhammad Hamza Battur"),
    translation("assamese_rafeeq", "Assamese - Arif Halim"),
    translation("punjabi_arif", "Punjabi - Arif Halim"),
    translation("sinhalese_mahir", "Sinhalese - Rowwad"),
    translation("swahili_barawani", "Swahili - Ali Muhsen Alberwany"),
    translation("hausa_gummi", "Hausa - Abu Bakr Jomy"),
    translation("yoruba_mikail", "Yoruba - Abu Rahima Mikhail Aikweiny"),
    translation("dutch_center", "Dutch - Dutch Islamic Center"),
    translation(
        "german_bubenheim",
        "German - Abu Reda Muhammad ibn Ahmad ibn Rasoul",
    ),
    translation("turkish_rwwad", "Turkish - Rowwad Translation Center"),
    translation("spanish_garcia", "Spanish - Isa Garcia"),
    translation("french_hameedullah", "French - Muhammad Hamidullah"),
];

pub fn find_translation(key: &str) -> Option<&'static Translation> {
    TRANSLATIONS.iter().find(|t| t.key == key)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedAyah {
    pub id: String,
    pub sura: String,
    pub aya: String,
    pub arabic_text: String,
    pub translation: String,
    #[serde(default)]
    pub footnotes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuraResponse {
    result: Vec<TranslatedAyah>,
}

#[derive(Clone)]
pub struct TranslationClient {
    client: reqwest::Client,
    base_url: String,
}

impl TranslationClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn sura_url(&self, key: &str, sura: u32) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| MushafError::Other(format!("Invalid translation base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| MushafError::Other(format!("Translation base URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(&["translation", "sura", key, &sura.to_string()]);
        Ok(url)
    }

    /// Every ayah of `sura` in the translation `key`.
    pub async fn fetch_sura(&self, key: &str, sura: u32) -> Result<Vec<TranslatedAyah>> {
        let translation = find_translation(key)
            .ok_or_else(|| MushafError::NotFound("Translation not found".to_string()))?;
        if sura == 0 || sura > TOTAL_SURAHS {
            return Err(MushafError::InvalidLocator(format!(
                "Surah {} is out of range (1-{})",
                sura, TOTAL_SURAHS
            )));
        }

        let url = self.sura_url(translation.key, sura)?;
        debug!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(MushafError::Fetch(format!(
                "Failed to fetch surah translations: HTTP {}",
                response.status()
            )));
        }

        let body: SuraResponse = response
            .json()
            .await
            .map_err(|e| MushafError::Network(format!("Failed to parse translations from {}: {}", url, e)))?;
        Ok(body.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_catalog() {
        assert_eq!(TRANSLATIONS.len(), 19);
        assert_eq!(TRANSLATIONS[0].key, DEFAULT_TRANSLATION);
        assert_eq!(find_translation("french_hameedullah").unwrap().label, "French - Muhammad Hamidullah");
        assert!(find_translation("klingon").is_none());
    }

    #[tokio::test]
    async fn test_fetch_sura() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translation/sura/tamil_baqavi/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{
                    "id": "1",
                    "sura": "1",
                    "aya": "1",
                    "arabic_text": "بِسۡمِ ٱللَّهِ ٱلرَّحۡمَٰنِ ٱلرَّحِيمِ",
                    "translation": "அளவற்ற அருளாளனும்",
                    "footnotes": ""
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TranslationClient::new(reqwest::Client::new(), server.uri());
        let ayahs = client.fetch_sura(DEFAULT_TRANSLATION, 1).await.unwrap();
        assert_eq!(ayahs.len(), 1);
        assert_eq!(ayahs[0].aya, "1");
        assert_eq!(ayahs[0].footnotes.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_unknown_key_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = TranslationClient::new(reqwest::Client::new(), server.uri());
        let err = client.fetch_sura("klingon", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: Translation not found");
    }

    #[tokio::test]
    async fn test_non_success_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = TranslationClient::new(reqwest::Client::new(), server.uri());
        let err = client.fetch_sura("urdu_junagarhi", 2).await.unwrap_err();
        assert!(matches!(err, MushafError::Fetch(_)));
    }
}
