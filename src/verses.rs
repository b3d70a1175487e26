//! Verse, edition and structural unit types

use crate::error::{MushafError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of verses in the whole text; upper bound of global verse numbers.
pub const TOTAL_AYAHS: u32 = 6236;
pub const TOTAL_SURAHS: u32 = 114;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurahRef {
    pub number: u32,
    pub name: String,
    pub english_name: String,
    pub english_name_translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revelation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_ayahs: Option<u32>,
}

/// Prostration marker. The API sends `false` for ordinary verses and an
/// object for verses carrying a sajda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sajda {
    Flag(bool),
    Detail {
        id: u32,
        recommended: bool,
        obligatory: bool,
    },
}

impl Default for Sajda {
    fn default() -> Self {
        Sajda::Flag(false)
    }
}

impl Sajda {
    pub fn is_sajda(&self) -> bool {
        match self {
            Sajda::Flag(flag) => *flag,
            Sajda::Detail { .. } => true,
        }
    }

    pub fn is_obligatory(&self) -> bool {
        matches!(self, Sajda::Detail { obligatory: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    /// Global verse number, unique across the whole text
    pub number: u32,
    #[serde(default)]
    pub number_in_surah: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surah: Option<SurahRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub juz: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manzil: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruku: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hizb_quarter: Option<u32>,
    #[serde(default)]
    pub sajda: Sajda,
}

impl Verse {
    pub fn new(number: u32, number_in_surah: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            number_in_surah,
            text: text.into(),
            surah: None,
            juz: None,
            manzil: None,
            page: None,
            ruku: None,
            hizb_quarter: None,
            sajda: Sajda::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditionInfo {
    pub identifier: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub english_name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, rename = "type")]
    pub edition_type: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
}

/// Edition identifier: selects a script rendering, a translator or a reciter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Edition(String);

impl Edition {
    pub const QURAN_UTHMANI: &'static str = "quran-uthmani";
    pub const ALAFASY: &'static str = "ar.alafasy";
    pub const ASAD: &'static str = "en.asad";
    pub const PICKTHALL: &'static str = "en.pickthall";

    pub fn new(id: impl Into<String>) -> Self {
        Edition(id.into())
    }

    pub fn uthmani() -> Self {
        Edition::new(Self::QURAN_UTHMANI)
    }

    pub fn asad() -> Self {
        Edition::new(Self::ASAD)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Edition {
    fn from(s: &str) -> Self {
        Edition::new(s)
    }
}

/// Structural partition of the text selectable by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitKind {
    Surah,
    Juz,
    HizbQuarter,
    Ruku,
    Page,
    Manzil,
    /// All prostration verses; the only unit without a locator
    Sajda,
}

impl UnitKind {
    pub const ALL: [UnitKind; 7] = [
        UnitKind::Surah,
        UnitKind::Juz,
        UnitKind::HizbQuarter,
        UnitKind::Ruku,
        UnitKind::Page,
        UnitKind::Manzil,
        UnitKind::Sajda,
    ];

    /// Highest valid locator (locators start at 1).
    pub fn max(&self) -> u32 {
        match self {
            UnitKind::Surah => 114,
            UnitKind::Juz => 30,
            UnitKind::HizbQuarter => 240,
            UnitKind::Ruku => 556,
            UnitKind::Page => 604,
            UnitKind::Manzil => 7,
            UnitKind::Sajda => 1,
        }
    }

    pub fn contains(&self, locator: u32) -> bool {
        (1..=self.max()).contains(&locator)
    }

    pub fn is_indexed(&self) -> bool {
        !matches!(self, UnitKind::Sajda)
    }

    /// Path segment used by the Quran API.
    pub fn segment(&self) -> &'static str {
        match self {
            UnitKind::Surah => "surah",
            UnitKind::Juz => "juz",
            UnitKind::HizbQuarter => "hizbQuarter",
            UnitKind::Ruku => "ruku",
            UnitKind::Page => "page",
            UnitKind::Manzil => "manzil",
            UnitKind::Sajda => "sajda",
        }
    }

    pub fn from_segment(segment: &str) -> Option<UnitKind> {
        UnitKind::ALL.into_iter().find(|k| k.segment() == segment)
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Surah => "Surah",
            UnitKind::Juz => "Juz",
            UnitKind::HizbQuarter => "Hizb Quarter",
            UnitKind::Ruku => "Ruku",
            UnitKind::Page => "Page",
            UnitKind::Manzil => "Manzil",
            UnitKind::Sajda => "Sajda",
        }
    }

    pub fn check(&self, locator: u32) -> Result<u32> {
        if self.contains(locator) {
            Ok(locator)
        } else {
            Err(MushafError::InvalidLocator(format!(
                "{} {} is out of range 1-{}",
                self.label(),
                locator,
                self.max()
            )))
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One structural unit as returned for one edition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitText {
    #[serde(default)]
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_name_translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revelation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_ayahs: Option<u32>,
    #[serde(default)]
    pub ayahs: Vec<Verse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<EditionInfo>,
}

impl UnitText {
    pub fn from_verses(number: u32, ayahs: Vec<Verse>) -> Self {
        Self {
            number,
            ayahs,
            ..Default::default()
        }
    }

    /// Surah header, present on surah responses only.
    pub fn surah_ref(&self) -> Option<SurahRef> {
        Some(SurahRef {
            number: self.number,
            name: self.name.clone()?,
            english_name: self.english_name.clone()?,
            english_name_translation: self.english_name_translation.clone().unwrap_or_default(),
            revelation_type: self.revelation_type.clone(),
            number_of_ayahs: self.number_of_ayahs,
        })
    }

    /// Copy the surah header onto verses that arrived without one.
    pub fn attach_surah(&mut self) {
        if let Some(surah) = self.surah_ref() {
            for verse in self.ayahs.iter_mut().filter(|v| v.surah.is_none()) {
                verse.surah = Some(surah.clone());
            }
        }
    }
}

/// The complete text in one edition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuranText {
    #[serde(default)]
    pub surahs: Vec<UnitText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<EditionInfo>,
}

/// User-entered verse reference: `262` or `2:255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AyahRef {
    Global(u32),
    InSurah { surah: u32, ayah: u32 },
}

impl FromStr for AyahRef {
    type Err = MushafError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || MushafError::InvalidLocator(format!("'{}' is not an ayah reference", s));

        match s.split_once(':') {
            Some((surah, ayah)) => {
                let surah: u32 = surah.trim().parse().map_err(|_| invalid())?;
                let ayah: u32 = ayah.trim().parse().map_err(|_| invalid())?;
                if !(1..=TOTAL_SURAHS).contains(&surah) || ayah == 0 {
                    return Err(invalid());
                }
                Ok(AyahRef::InSurah { surah, ayah })
            }
            None => {
                let number: u32 = s.parse().map_err(|_| invalid())?;
                if !(1..=TOTAL_AYAHS).contains(&number) {
                    return Err(invalid());
                }
                Ok(AyahRef::Global(number))
            }
        }
    }
}

impl fmt::Display for AyahRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AyahRef::Global(n) => write!(f, "{}", n),
            AyahRef::InSurah { surah, ayah } => write!(f, "{}:{}", surah, ayah),
        }
    }
}
