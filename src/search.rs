//! Quran keyword search, surah list filtering and match highlighting

use crate::error::{MushafError, Result};
use crate::source::RemoteSource;
use crate::verses::{Edition, SurahRef, Verse, TOTAL_SURAHS};
use regex_lite::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Queries shorter than this are never sent
pub const MIN_QUERY_CHARS: usize = 3;

/// Editions offered by the search view
pub const SEARCH_EDITIONS: [(&str, &str); 2] = [
    (Edition::PICKTHALL, "Pickthall"),
    (Edition::ASAD, "Muhammad Asad"),
];

/// The search view's edition for `id`, if it is one of [`SEARCH_EDITIONS`].
pub fn search_edition(id: &str) -> Result<Edition> {
    SEARCH_EDITIONS
        .iter()
        .find(|(edition, _)| *edition == id)
        .map(|(edition, _)| Edition::new(*edition))
        .ok_or_else(|| {
            let offered: Vec<String> = SEARCH_EDITIONS
                .iter()
                .map(|(edition, label)| format!("{} ({})", edition, label))
                .collect();
            MushafError::NotFound(format!(
                "Search edition {}; choose one of {}",
                id,
                offered.join(", ")
            ))
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    All,
    Surah(u32),
}

impl SearchScope {
    fn segment(&self) -> String {
        match self {
            SearchScope::All => "all".to_string(),
            SearchScope::Surah(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    count: usize,
    #[serde(default)]
    matches: Vec<Verse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Fewer than [`MIN_QUERY_CHARS`] characters; nothing was sent
    TooShort,
    NoMatches,
    Matches { count: usize, verses: Vec<Verse> },
}

impl SearchOutcome {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SearchOutcome::TooShort => Some("Enter at least 3 characters to search"),
            SearchOutcome::NoMatches => Some("No results found"),
            SearchOutcome::Matches { .. } => None,
        }
    }
}

/// Search verse text of one edition for `keyword`.
pub async fn search_quran(
    source: &RemoteSource,
    keyword: &str,
    scope: SearchScope,
    edition: &Edition,
) -> Result<SearchOutcome> {
    let keyword = keyword.trim();
    if keyword.chars().count() < MIN_QUERY_CHARS {
        return Ok(SearchOutcome::TooShort);
    }
    if let SearchScope::Surah(n) = scope {
        if n == 0 || n > TOTAL_SURAHS {
            return Err(MushafError::InvalidLocator(format!(
                "Surah {} is out of range (1-{})",
                n, TOTAL_SURAHS
            )));
        }
    }

    let scope = scope.segment();
    let url = source.endpoint(&["search", keyword, &scope, edition.as_str()])?;
    let payload: Option<SearchPayload> = source.get_optional(url).await?;

    match payload {
        Some(p) if !p.matches.is_empty() => {
            let count = p.count.max(p.matches.len());
            debug!(keyword, count, "Search matched");
            Ok(SearchOutcome::Matches {
                count,
                verses: p.matches,
            })
        }
        _ => Ok(SearchOutcome::NoMatches),
    }
}

/// Surahs whose English name contains `query` (case-insensitive) or whose
/// number equals it. An empty query keeps the list.
pub fn filter_surahs<'a>(surahs: &'a [SurahRef], query: &str) -> Vec<&'a SurahRef> {
    let query = query.trim();
    if query.is_empty() {
        return surahs.iter().collect();
    }

    let needle = query.to_lowercase();
    let number = query.parse::<u32>().ok();
    surahs
        .iter()
        .filter(|s| Some(s.number) == number || s.english_name.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

fn highlighter(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex_lite::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Split `text` around every case-insensitive occurrence of `query`.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let re = match highlighter(query) {
        Some(re) => re,
        None => return vec![Segment::Plain(text)],
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Plain(&text[last..m.start()]));
        }
        segments.push(Segment::Match(m.as_str()));
        last = m.end();
    }
    if last < text.len() || segments.is_empty() {
        segments.push(Segment::Plain(&text[last..]));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryCache;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote(base: &str) -> RemoteSource {
        RemoteSource::new(reqwest::Client::new(), base, Arc::new(QueryCache::new(4)))
    }

    fn surah(number: u32, english_name: &str) -> SurahRef {
        SurahRef {
            number,
            name: String::new(),
            english_name: english_name.to_string(),
            english_name_translation: String::new(),
            revelation_type: None,
            number_of_ayahs: None,
        }
    }

    #[test]
    fn test_search_edition_accepts_offered_editions_only() {
        assert_eq!(search_edition("en.asad").unwrap(), Edition::asad());
        assert_eq!(search_edition(Edition::PICKTHALL).unwrap().as_str(), "en.pickthall");

        let err = search_edition("en.sahih").unwrap_err();
        assert!(matches!(err, MushafError::NotFound(_)));
        assert!(err.to_string().contains("en.pickthall (Pickthall)"));
    }

    #[tokio::test]
    async fn test_short_query_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = search_quran(&remote(&server.uri()), "ab", SearchScope::All, &Edition::asad())
            .await
            .unwrap();
        assert_eq!(outcome, SearchOutcome::TooShort);
    }

    #[tokio::test]
    async fn test_matches_and_no_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/mercy/all/en.asad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "status": "OK",
                "data": {
                    "count": 1,
                    "matches": [{
                        "number": 1,
                        "numberInSurah": 1,
                        "text": "the Most Gracious, the Dispenser of Grace",
                        "surah": {"number": 1, "name": "سُورَةُ ٱلْفَاتِحَةِ", "englishName": "Al-Faatiha", "englishNameTranslation": "The Opening"}
                    }]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/xyzzy/all/en.asad"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404, "status": "NOT FOUND", "data": "Not found"
            })))
            .mount(&server)
            .await;

        let source = remote(&server.uri());
        match search_quran(&source, "mercy", SearchScope::All, &Edition::asad()).await.unwrap() {
            SearchOutcome::Matches { count, verses } => {
                assert_eq!(count, 1);
                assert_eq!(verses[0].surah.as_ref().unwrap().english_name, "Al-Faatiha");
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let outcome = search_quran(&source, "xyzzy", SearchScope::All, &Edition::asad()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::NoMatches);
        assert_eq!(outcome.message(), Some("No results found"));
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = search_quran(&remote(&server.uri()), "light", SearchScope::Surah(24), &Edition::asad())
            .await
            .unwrap_err();
        assert!(err.is_fetch_failure());
    }

    #[test]
    fn test_filter_surahs() {
        let surahs = vec![surah(1, "Al-Faatiha"), surah(2, "Al-Baqara"), surah(12, "Yusuf")];

        let names: Vec<u32> = filter_surahs(&surahs, "BAQ").iter().map(|s| s.number).collect();
        assert_eq!(names, vec![2]);

        let numbered: Vec<u32> = filter_surahs(&surahs, "12").iter().map(|s| s.number).collect();
        assert_eq!(numbered, vec![12]);

        assert_eq!(filter_surahs(&surahs, "").len(), 3);
        assert!(filter_surahs(&surahs, "3").is_empty());
    }

    #[test]
    fn test_highlight_is_case_insensitive() {
        let segments = highlight("Mercy and mercy", "MERCY");
        assert_eq!(
            segments,
            vec![
                Segment::Match("Mercy"),
                Segment::Plain(" and "),
                Segment::Match("mercy"),
            ]
        );
    }

    #[test]
    fn test_highlight_escapes_query() {
        let segments = highlight("Is it (a) test?", "(a)");
        assert_eq!(
            segments,
            vec![Segment::Plain("Is it "), Segment::Match("(a)"), Segment::Plain(" test?")]
        );
        assert_eq!(highlight("abc", ""), vec![Segment::Plain("abc")]);
        assert_eq!(highlight("abc", "x.c"), vec![Segment::Plain("abc")]);
    }
}
