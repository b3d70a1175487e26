//! Pairing a translation edition with an Arabic script edition
//!
//! Two editions of the same unit are fetched independently, so nothing
//! guarantees they list the same verses in the same order. Pairing by global
//! verse number is the default; positional pairing is kept for sources that
//! carry no usable numbers. Either way, entries that could not be paired are
//! reported on the [`Alignment`] instead of being silently mis-paired.

use crate::verses::{QuranText, Sajda, SurahRef, Verse};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    /// Pair element i with element i
    ByIndex,
    /// Pair verses with equal global numbers
    #[default]
    ByNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedVerse {
    pub number: u32,
    pub number_in_surah: u32,
    pub surah: Option<SurahRef>,
    /// Translation text (primary edition)
    pub text: String,
    /// Script text (secondary edition)
    pub arabic_text: String,
    pub sajda: Sajda,
}

impl AlignedVerse {
    fn pair(primary: &Verse, secondary: &Verse) -> Self {
        Self {
            number: primary.number,
            number_in_surah: primary.number_in_surah,
            surah: primary.surah.clone().or_else(|| secondary.surah.clone()),
            text: primary.text.clone(),
            arabic_text: secondary.text.clone(),
            sajda: primary.sajda.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub pairs: Vec<AlignedVerse>,
    /// Global numbers of primary verses left without a partner
    pub unmatched_primary: Vec<u32>,
    /// Global numbers of secondary verses left without a partner
    pub unmatched_secondary: Vec<u32>,
    /// By-index mode only: positions whose two verse numbers differ
    pub misnumbered: Vec<usize>,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Every verse of both editions found its partner.
    pub fn is_exact(&self) -> bool {
        self.unmatched_primary.is_empty()
            && self.unmatched_secondary.is_empty()
            && self.misnumbered.is_empty()
    }
}

/// Pair `primary` (translation) with `secondary` (script). An absent side
/// yields an empty alignment; output order follows `primary`.
pub fn align(primary: Option<&[Verse]>, secondary: Option<&[Verse]>, mode: AlignMode) -> Alignment {
    let (primary, secondary) = match (primary, secondary) {
        (Some(p), Some(s)) => (p, s),
        _ => return Alignment::default(),
    };

    match mode {
        AlignMode::ByIndex => align_by_index(primary, secondary),
        AlignMode::ByNumber => align_by_number(primary, secondary),
    }
}

fn align_by_index(primary: &[Verse], secondary: &[Verse]) -> Alignment {
    let mut alignment = Alignment::default();

    for (i, (p, s)) in primary.iter().zip(secondary).enumerate() {
        if p.number != s.number {
            alignment.misnumbered.push(i);
        }
        alignment.pairs.push(AlignedVerse::pair(p, s));
    }

    let shared = alignment.pairs.len();
    alignment.unmatched_primary = primary[shared..].iter().map(|v| v.number).collect();
    alignment.unmatched_secondary = secondary[shared..].iter().map(|v| v.number).collect();
    alignment
}

fn align_by_number(primary: &[Verse], secondary: &[Verse]) -> Alignment {
    // First occurrence wins; repeats are reported unmatched below
    let mut by_number: HashMap<u32, &Verse> = HashMap::with_capacity(secondary.len());
    for verse in secondary {
        by_number.entry(verse.number).or_insert(verse);
    }

    let mut alignment = Alignment::default();
    let mut paired: HashSet<u32> = HashSet::with_capacity(primary.len());

    for p in primary {
        match by_number.get(&p.number) {
            Some(s) => {
                alignment.pairs.push(AlignedVerse::pair(p, s));
                paired.insert(p.number);
            }
            None => alignment.unmatched_primary.push(p.number),
        }
    }

    let mut seen: HashSet<u32> = HashSet::with_capacity(secondary.len());
    alignment.unmatched_secondary = secondary
        .iter()
        .map(|v| v.number)
        .filter(|n| !seen.insert(*n) || !paired.contains(n))
        .collect();
    alignment
}

/// One surah of the complete text with its verses aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSurah {
    pub surah: Option<SurahRef>,
    pub verses: Alignment,
}

fn verse_numbers(verses: &[Verse]) -> Vec<u32> {
    verses.iter().map(|v| v.number).collect()
}

/// Align two complete texts surah by surah. Surahs are matched by number and
/// listed in `primary` order. A surah missing from `secondary` keeps all its
/// verses in `unmatched_primary`; surahs only `secondary` has follow at the
/// end with their verses in `unmatched_secondary`.
pub fn align_quran(primary: &QuranText, secondary: &QuranText, mode: AlignMode) -> Vec<AlignedSurah> {
    let secondary_surahs: HashMap<u32, &[Verse]> = secondary
        .surahs
        .iter()
        .map(|s| (s.number, s.ayahs.as_slice()))
        .collect();
    let primary_numbers: HashSet<u32> = primary.surahs.iter().map(|s| s.number).collect();

    let mut aligned: Vec<AlignedSurah> = primary
        .surahs
        .iter()
        .map(|surah| {
            let verses = match secondary_surahs.get(&surah.number) {
                Some(script) => align(Some(surah.ayahs.as_slice()), Some(script), mode),
                None => Alignment {
                    unmatched_primary: verse_numbers(&surah.ayahs),
                    ..Alignment::default()
                },
            };
            AlignedSurah {
                surah: surah.surah_ref(),
                verses,
            }
        })
        .collect();

    aligned.extend(
        secondary
            .surahs
            .iter()
            .filter(|s| !primary_numbers.contains(&s.number))
            .map(|surah| AlignedSurah {
                surah: surah.surah_ref(),
                verses: Alignment {
                    unmatched_secondary: verse_numbers(&surah.ayahs),
                    ..Alignment::default()
                },
            }),
    );
    aligned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verses::UnitText;

    fn verses(numbers: &[u32], prefix: &str) -> Vec<Verse> {
        numbers
            .iter()
            .map(|&n| Verse::new(n, n, format!("{}{}", prefix, n)))
            .collect()
    }

    #[test]
    fn test_by_index_equal_lengths() {
        let primary = verses(&[10, 11, 12, 13], "en");
        let secondary = verses(&[10, 11, 12, 13], "ar");

        let alignment = align(Some(primary.as_slice()), Some(secondary.as_slice()), AlignMode::ByIndex);
        assert_eq!(alignment.len(), secondary.len());
        for (i, pair) in alignment.pairs.iter().enumerate() {
            assert_eq!(pair.arabic_text, secondary[i].text);
            assert_eq!(pair.text, primary[i].text);
        }
        assert!(alignment.is_exact());
    }

    #[test]
    fn test_by_index_flags_divergence() {
        let primary = verses(&[1, 2, 3, 4], "en");
        let secondary = verses(&[1, 3, 4], "ar");

        let alignment = align(Some(primary.as_slice()), Some(secondary.as_slice()), AlignMode::ByIndex);
        assert_eq!(alignment.len(), 3);
        assert_eq!(alignment.misnumbered, vec![1, 2]);
        assert_eq!(alignment.unmatched_primary, vec![4]);
        assert!(!alignment.is_exact());
    }

    #[test]
    fn test_by_number_skips_missing_verse() {
        let primary = verses(&[1, 2, 3, 4], "en");
        let secondary = verses(&[4, 1, 3, 9], "ar");

        let alignment = align(Some(primary.as_slice()), Some(secondary.as_slice()), AlignMode::ByNumber);
        let numbers: Vec<u32> = alignment.pairs.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 3, 4]);
        assert_eq!(alignment.pairs[2].arabic_text, "ar4");
        assert_eq!(alignment.unmatched_primary, vec![2]);
        assert_eq!(alignment.unmatched_secondary, vec![9]);
    }

    #[test]
    fn test_absent_input_is_empty() {
        let primary = verses(&[1, 2], "en");
        assert!(align(Some(primary.as_slice()), None, AlignMode::ByNumber).is_empty());
        assert!(align(None, Some(primary.as_slice()), AlignMode::ByIndex).is_empty());
        assert!(align(Some(&[] as &[Verse]), Some(primary.as_slice()), AlignMode::ByNumber).is_empty());
    }

    #[test]
    fn test_align_quran_by_surah_number() {
        let primary = QuranText {
            surahs: vec![
                UnitText::from_verses(1, verses(&[1, 2], "en")),
                UnitText::from_verses(2, verses(&[8, 9], "en")),
            ],
            edition: None,
        };
        let secondary = QuranText {
            surahs: vec![UnitText::from_verses(2, verses(&[8, 9], "ar"))],
            edition: None,
        };

        let aligned = align_quran(&primary, &secondary, AlignMode::ByNumber);
        assert_eq!(aligned.len(), 2);
        assert!(aligned[0].verses.is_empty());
        assert_eq!(aligned[0].verses.unmatched_primary, vec![1, 2]);
        assert!(!aligned[0].verses.is_exact());
        assert_eq!(aligned[1].verses.pairs[0].arabic_text, "ar8");
        assert!(aligned[1].verses.is_exact());
    }

    #[test]
    fn test_align_quran_reports_surahs_on_one_side_only() {
        let primary = QuranText {
            surahs: vec![
                UnitText::from_verses(1, verses(&[1, 2], "en")),
                UnitText::from_verses(2, verses(&[8, 9], "en")),
            ],
            edition: None,
        };
        let secondary = QuranText {
            surahs: vec![
                UnitText::from_verses(2, verses(&[8, 9], "ar")),
                UnitText::from_verses(3, verses(&[300, 301], "ar")),
            ],
            edition: None,
        };

        let aligned = align_quran(&primary, &secondary, AlignMode::ByNumber);
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[0].verses.unmatched_primary, vec![1, 2]);
        assert!(aligned[1].verses.is_exact());
        assert_eq!(aligned[2].verses.unmatched_secondary, vec![300, 301]);
        assert!(!aligned.iter().all(|s| s.verses.is_exact()));
    }

    #[test]
    fn test_by_number_flags_repeated_secondary_verse() {
        let primary = verses(&[1, 2], "en");
        let mut secondary = verses(&[1, 2], "ar");
        secondary.push(Verse::new(2, 2, "ar2-again"));

        let alignment = align(Some(primary.as_slice()), Some(secondary.as_slice()), AlignMode::ByNumber);
        assert_eq!(alignment.len(), 2);
        assert_eq!(alignment.pairs[1].arabic_text, "ar2");
        assert_eq!(alignment.unmatched_secondary, vec![2]);
        assert!(!alignment.is_exact());
    }
}
