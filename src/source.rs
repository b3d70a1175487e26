//! Record sources: the remote Quran API and in-memory bundled units
//!
//! Both implement [`RecordSource`], so views can pair any two of them. The
//! remote source caches every unit it fetches in the shared [`QueryCache`].

use crate::cache::{QueryCache, QueryKey};
use crate::error::{MushafError, Result};
use crate::verses::{AyahRef, Edition, QuranText, SurahRef, UnitKind, UnitText, Verse};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Public Quran API
pub const QURAN_API_BASE: &str = "https://api.alquran.cloud/v1";

/// Fetches one structural unit in one edition.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, kind: UnitKind, locator: u32, edition: &Edition) -> Result<Arc<UnitText>>;
}

/// Retry and staleness settings of a remote source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FetchPolicy {
    /// Extra attempts after a failed request
    pub retries: u32,
    /// Cached units older than this are refetched; `None` keeps them until evicted
    pub max_age: Option<chrono::Duration>,
}

impl FetchPolicy {
    /// One retry and a five minute retention window, as used by the Manzil reader.
    pub fn patient() -> Self {
        Self {
            retries: 1,
            max_age: Some(chrono::Duration::minutes(5)),
        }
    }
}

/// `{ code, status, data }` wrapper around every API payload
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    base_url: String,
    cache: Arc<QueryCache>,
    policy: FetchPolicy,
}

impl RemoteSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, cache: Arc<QueryCache>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            cache,
            policy: FetchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| MushafError::Other(format!("Invalid API base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| MushafError::Other(format!("API base URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Endpoint of one unit: `{base}/{unit-type}/{locator}/{edition}`.
    pub fn unit_url(&self, kind: UnitKind, locator: u32, edition: &Edition) -> Result<Url> {
        if kind.is_indexed() {
            let locator = locator.to_string();
            self.endpoint(&[kind.segment(), &locator, edition.as_str()])
        } else {
            self.endpoint(&[kind.segment(), edition.as_str()])
        }
    }

    /// GET a URL and unwrap the envelope's `data`, retrying per policy.
    pub(crate) async fn get_data<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        match self.get_optional(url.clone()).await? {
            Some(data) => Ok(data),
            None => Err(MushafError::Fetch(format!("HTTP {} for {}", StatusCode::NOT_FOUND, url))),
        }
    }

    /// Like [`Self::get_data`], with a 404 answered as `None`.
    pub(crate) async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let mut attempt = 0;
        loop {
            match self.get_once(url.clone()).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_fetch_failure() && attempt < self.policy.retries => {
                    attempt += 1;
                    warn!(url = %url, attempt, error = %e, "Request failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MushafError::Network(format!("Request to {} failed: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(MushafError::Fetch(format!("HTTP {} for {}", response.status(), url)));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| MushafError::Network(format!("Failed to parse response from {}: {}", url, e)))?;
        Ok(Some(envelope.data))
    }

    /// Whole text in one edition.
    pub async fn fetch_quran(&self, edition: &Edition) -> Result<QuranText> {
        let url = self.endpoint(&["quran", edition.as_str()])?;
        let mut quran: QuranText = self.get_data(url).await?;
        for surah in &mut quran.surahs {
            surah.attach_surah();
        }
        Ok(quran)
    }

    pub async fn fetch_ayah(&self, reference: AyahRef, edition: &Edition) -> Result<Verse> {
        let reference = reference.to_string();
        let url = self.endpoint(&["ayah", &reference, edition.as_str()])?;
        self.get_data(url).await
    }

    /// One verse in several editions at once, in the order requested.
    pub async fn fetch_ayah_editions(&self, reference: AyahRef, editions: &[Edition]) -> Result<Vec<Verse>> {
        let reference = reference.to_string();
        let joined = editions.iter().map(Edition::as_str).collect::<Vec<_>>().join(",");
        let url = self.endpoint(&["ayah", &reference, "editions", &joined])?;
        self.get_data(url).await
    }

    /// A slice of a manzil. Not cached: windows overlap arbitrarily.
    pub async fn fetch_manzil_window(
        &self,
        manzil: u32,
        edition: &Edition,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<UnitText> {
        let manzil = UnitKind::Manzil
            .check(manzil)
            .map_err(|e| MushafError::Fetch(e.to_string()))?;
        let mut url = self.unit_url(UnitKind::Manzil, manzil, edition)?;
        if offset.is_some() || limit.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(offset) = offset {
                query.append_pair("offset", &offset.to_string());
            }
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        self.get_data(url).await
    }

    /// Header of every surah, in order.
    pub async fn surah_list(&self) -> Result<Vec<SurahRef>> {
        let url = self.endpoint(&["surah"])?;
        self.get_data(url).await
    }
}

#[async_trait]
impl RecordSource for RemoteSource {
    async fn fetch(&self, kind: UnitKind, locator: u32, edition: &Edition) -> Result<Arc<UnitText>> {
        let locator = if kind.is_indexed() {
            kind.check(locator).map_err(|e| MushafError::Fetch(e.to_string()))?
        } else {
            1
        };

        let key = QueryKey::new(kind, locator, edition);
        if let Some(unit) = self.cache.get(&key, self.policy.max_age) {
            debug!(%kind, locator, %edition, "Served from cache");
            return Ok(unit);
        }

        let url = self.unit_url(kind, locator, edition)?;
        let mut unit: UnitText = self.get_data(url).await?;
        if kind == UnitKind::Surah {
            unit.attach_surah();
        }

        let unit = Arc::new(unit);
        self.cache.put(key, Arc::clone(&unit));
        Ok(unit)
    }
}

/// Units held in memory, either built in code or loaded from a bundled file
/// mapping `"{unit-type}/{locator}/{edition}"` to a unit.
#[derive(Debug, Default)]
pub struct StaticSource {
    units: HashMap<QueryKey, Arc<UnitText>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, kind: UnitKind, locator: u32, edition: &Edition, unit: UnitText) -> Self {
        self.insert(kind, locator, edition, unit);
        self
    }

    pub fn insert(&mut self, kind: UnitKind, locator: u32, edition: &Edition, unit: UnitText) {
        self.units.insert(QueryKey::new(kind, locator, edition), Arc::new(unit));
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, UnitText> = serde_json::from_str(json)
            .map_err(|e| MushafError::Dataset(format!("Malformed bundled units: {}", e)))?;

        let mut source = Self::new();
        for (key, unit) in raw {
            let parts: Vec<&str> = key.splitn(3, '/').collect();
            let (kind, locator, edition) = match parts.as_slice() {
                [kind, locator, edition] => (
                    UnitKind::from_segment(kind),
                    locator.parse::<u32>().ok(),
                    Edition::new(*edition),
                ),
                _ => (None, None, Edition::new("")),
            };
            match (kind, locator) {
                (Some(kind), Some(locator)) => source.insert(kind, locator, &edition, unit),
                _ => {
                    return Err(MushafError::Dataset(format!(
                        "Bundled unit key '{}' is not unit-type/locator/edition",
                        key
                    )))
                }
            }
        }
        Ok(source)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| MushafError::Dataset(format!("Failed to read {:?}: {}", path, e)))?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch(&self, kind: UnitKind, locator: u32, edition: &Edition) -> Result<Arc<UnitText>> {
        let locator = if kind.is_indexed() { locator } else { 1 };
        let key = QueryKey::new(kind, locator, edition);
        Ok(self
            .units
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Arc::new(UnitText::from_verses(locator, Vec::new()))))
    }
}
