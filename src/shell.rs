//! Navigation menu and path routing

use crate::error::{MushafError, Result};
use crate::hadith::Collection;
use crate::verses::UnitKind;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Search,
    Quran,
    Languages,
    Surahs,
    Audio,
    Juz,
    Ruku,
    Page,
    Hizb,
    Ayah,
    Manzil,
    Sajda,
    Hadith(Collection),
}

impl Route {
    /// Menu order.
    pub const MENU: [Route; 18] = [
        Route::Search,
        Route::Quran,
        Route::Languages,
        Route::Surahs,
        Route::Audio,
        Route::Juz,
        Route::Ruku,
        Route::Page,
        Route::Hizb,
        Route::Ayah,
        Route::Manzil,
        Route::Sajda,
        Route::Hadith(Collection::SahihBukhari),
        Route::Hadith(Collection::SahihMuslim),
        Route::Hadith(Collection::MalikMuwatta),
        Route::Hadith(Collection::Qudsi),
        Route::Hadith(Collection::Nawawi),
        Route::Hadith(Collection::Hadith500),
    ];

    pub fn segment(&self) -> &'static str {
        match self {
            Route::Search => "search",
            Route::Quran => "quran",
            Route::Languages => "languages",
            Route::Surahs => "surahs",
            Route::Audio => "audio",
            Route::Juz => "juz",
            Route::Ruku => "ruku",
            Route::Page => "page",
            Route::Hizb => "hizb",
            Route::Ayah => "ayah",
            Route::Manzil => "manzil",
            Route::Sajda => "sajda",
            Route::Hadith(collection) => collection.slug(),
        }
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segment())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Search => "Search",
            Route::Quran => "Complete Quran",
            Route::Languages => "Quran in Wide Languages",
            Route::Surahs => "Surahs",
            Route::Audio => "Audio",
            Route::Juz => "Juz",
            Route::Ruku => "Ruku",
            Route::Page => "Page",
            Route::Hizb => "Hizb Quarter",
            Route::Ayah => "Ayah",
            Route::Manzil => "Manzil",
            Route::Sajda => "Sajda",
            Route::Hadith(Collection::Qudsi) => "Hudsi",
            Route::Hadith(collection) => collection.title(),
        }
    }

    /// Parse `/ruku`, `ruku` or `/ruku/`. The root path opens the complete text.
    pub fn from_path(path: &str) -> Result<Route> {
        let segment = path.trim().trim_matches('/');
        if segment.is_empty() {
            return Ok(Route::Quran);
        }
        Route::MENU
            .into_iter()
            .find(|r| r.segment() == segment)
            .ok_or_else(|| MushafError::NotFound(format!("No view at /{}", segment)))
    }

    /// Structural unit shown by the route, if it shows one.
    pub fn unit_kind(&self) -> Option<UnitKind> {
        match self {
            Route::Surahs => Some(UnitKind::Surah),
            Route::Juz => Some(UnitKind::Juz),
            Route::Ruku => Some(UnitKind::Ruku),
            Route::Page => Some(UnitKind::Page),
            Route::Hizb => Some(UnitKind::HizbQuarter),
            Route::Manzil => Some(UnitKind::Manzil),
            Route::Sajda => Some(UnitKind::Sajda),
            _ => None,
        }
    }

    /// Routes that pair a translation with the Arabic script.
    pub fn is_dual_source(&self) -> bool {
        matches!(
            self,
            Route::Ruku | Route::Page | Route::Hizb | Route::Manzil | Route::Sajda
        )
    }
}

impl FromStr for Route {
    type Err = MushafError;

    fn from_str(s: &str) -> Result<Self> {
        Route::from_path(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_menu_paths_are_unique() {
        let paths: HashSet<String> = Route::MENU.iter().map(Route::path).collect();
        assert_eq!(paths.len(), 18);
        for route in Route::MENU {
            assert_eq!(Route::from_path(&route.path()).unwrap(), route);
        }
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/").unwrap(), Route::Quran);
        assert_eq!(Route::from_path("").unwrap(), Route::Quran);
        assert_eq!(Route::from_path("hizb").unwrap(), Route::Hizb);
        assert_eq!(
            Route::from_path("/hudsi/").unwrap(),
            Route::Hadith(Collection::Qudsi)
        );
        assert!(matches!(
            Route::from_path("/tafsir"),
            Err(MushafError::NotFound(_))
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(Route::Languages.label(), "Quran in Wide Languages");
        assert_eq!(Route::Hadith(Collection::Qudsi).label(), "Hudsi");
        assert_eq!(Route::Hadith(Collection::MalikMuwatta).label(), "Malik Muwatta");
        assert_eq!(Route::Hizb.unit_kind(), Some(UnitKind::HizbQuarter));
        assert!(Route::Sajda.is_dual_source());
        assert!(!Route::Juz.is_dual_source());
    }
}
