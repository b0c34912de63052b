//! Morphological normalization.
//!
//! The analyzer itself is an injected capability: anything implementing
//! [`MorphAnalyzer`] can back a [`Normalizer`]. Lemmas and part-of-speech
//! tags come from an external form/lemma/grammeme table read by
//! [`DictionaryAnalyzer`]; [`SurfaceAnalyzer`] only tags digits, Latin words
//! and punctuation for forms the table does not list.

use crate::error::LoadError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Grammatical category tag attached to a parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Grammeme {
    /// Preposition.
    Prep,
    /// Conjunction.
    Conj,
    /// Number written with digits.
    Numb,
    /// Numeral written as a word.
    Numr,
    /// Non-Cyrillic (Latin) token.
    Latn,
    /// Punctuation.
    Pnct,
    /// Roman numeral.
    Romn,
    /// Unrecognized word.
    Unkn,
    Other(String),
}

impl Grammeme {
    /// Tags whose presence makes the normalizer drop a token.
    pub const REJECTED: [Grammeme; 8] = [
        Grammeme::Prep,
        Grammeme::Conj,
        Grammeme::Numb,
        Grammeme::Numr,
        Grammeme::Latn,
        Grammeme::Pnct,
        Grammeme::Romn,
        Grammeme::Unkn,
    ];

    pub fn is_rejected(&self) -> bool {
        Self::REJECTED.contains(self)
    }
}

impl FromStr for Grammeme {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "PREP" => Grammeme::Prep,
            "CONJ" => Grammeme::Conj,
            "NUMB" => Grammeme::Numb,
            "NUMR" => Grammeme::Numr,
            "LATN" => Grammeme::Latn,
            "PNCT" => Grammeme::Pnct,
            "ROMN" => Grammeme::Romn,
            "UNKN" => Grammeme::Unkn,
            other => Grammeme::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Grammeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grammeme::Prep => "PREP",
            Grammeme::Conj => "CONJ",
            Grammeme::Numb => "NUMB",
            Grammeme::Numr => "NUMR",
            Grammeme::Latn => "LATN",
            Grammeme::Pnct => "PNCT",
            Grammeme::Romn => "ROMN",
            Grammeme::Unkn => "UNKN",
            Grammeme::Other(tag) => tag,
        };
        f.write_str(s)
    }
}

/// Best-ranked analysis of a single word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    /// Surface form as analyzed (lower-cased).
    pub word: String,
    pub normal_form: String,
    pub tags: HashSet<Grammeme>,
}

impl Parse {
    pub fn new(word: impl Into<String>, normal_form: impl Into<String>, tags: impl IntoIterator<Item = Grammeme>) -> Self {
        Self { word: word.into(), normal_form: normal_form.into(), tags: tags.into_iter().collect() }
    }

    fn tagged(word: &str, tag: Grammeme) -> Self {
        Self::new(word, word, [tag])
    }

    pub fn is_rejected(&self) -> bool {
        self.tags.iter().any(Grammeme::is_rejected)
    }
}

/// External morphological capability: returns the single best parse of a word.
///
/// `None` means the analyzer has nothing to say about the word at all; the
/// normalizer treats that the same way as an `UNKN` parse.
pub trait MorphAnalyzer: Send + Sync {
    fn parse(&self, word: &str) -> Option<Parse>;
}

impl<A: MorphAnalyzer + ?Sized> MorphAnalyzer for Arc<A> {
    fn parse(&self, word: &str) -> Option<Parse> {
        (**self).parse(word)
    }
}

impl<A: MorphAnalyzer + ?Sized> MorphAnalyzer for Box<A> {
    fn parse(&self, word: &str) -> Option<Parse> {
        (**self).parse(word)
    }
}

/// Filters closed-class and noise tokens and maps the rest to their lemma.
#[derive(Clone)]
pub struct Normalizer {
    analyzer: Arc<dyn MorphAnalyzer>,
}

impl Normalizer {
    pub fn new(analyzer: impl MorphAnalyzer + 'static) -> Self {
        Self { analyzer: Arc::new(analyzer) }
    }

    pub fn from_shared(analyzer: Arc<dyn MorphAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Backed by the `form \t lemma \t TAGS` table at `path`.
    pub fn from_dictionary<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Ok(Self::new(DictionaryAnalyzer::load(path)?))
    }

    /// Returns the lemma of `word`, or `None` when the word is rejected.
    pub fn normalize(&self, word: &str) -> Option<String> {
        self.analyze(word).map(|p| p.normal_form)
    }

    /// Like [`Normalizer::normalize`] but keeps the whole accepted parse.
    pub fn analyze(&self, word: &str) -> Option<Parse> {
        let parse = self.analyzer.parse(word)?;
        if parse.is_rejected() || parse.normal_form.is_empty() {
            return None;
        }
        Some(parse)
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer").finish_non_exhaustive()
    }
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

fn is_roman(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| matches!(c, 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M'))
}

/// Classifies tokens by their characters alone.
///
/// Digits, Roman numerals, Latin words and punctuation get the matching
/// noise tag. A Cyrillic word is returned as its own normal form with no
/// tags: this analyzer knows nothing about Russian grammar, so it only
/// backs [`DictionaryAnalyzer`] for forms missing from the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceAnalyzer;

impl MorphAnalyzer for SurfaceAnalyzer {
    fn parse(&self, word: &str) -> Option<Parse> {
        if word.is_empty() {
            return Some(Parse::tagged(word, Grammeme::Unkn));
        }
        if is_roman(word) {
            return Some(Parse::tagged(word, Grammeme::Romn));
        }
        let lower = word.to_lowercase();
        if lower.chars().all(|c| c.is_ascii_digit()) {
            return Some(Parse::tagged(&lower, Grammeme::Numb));
        }
        if lower.chars().all(|c| c.is_ascii_alphabetic()) {
            return Some(Parse::tagged(&lower, Grammeme::Latn));
        }
        if lower.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
            return Some(Parse::tagged(&lower, Grammeme::Pnct));
        }
        if !lower.chars().all(is_cyrillic) {
            return Some(Parse::tagged(&lower, Grammeme::Unkn));
        }
        Some(Parse::new(lower.clone(), lower, []))
    }
}

#[derive(Debug, Clone)]
struct DictionaryEntry {
    lemma: String,
    tags: HashSet<Grammeme>,
}

/// Analyzer backed by a form → (lemma, grammemes) table.
///
/// The table file holds one `form \t lemma \t TAG,TAG` line per entry; blank
/// lines and lines starting with `#` are skipped. When a form is listed more
/// than once the first line wins. Tags use the OpenCorpora names (`NOUN`,
/// `PREP`, `NUMR`, ...), so closed classes are whatever the table says they
/// are. Forms missing from the table are handed to the fallback analyzer.
pub struct DictionaryAnalyzer<F = SurfaceAnalyzer> {
    entries: HashMap<String, DictionaryEntry>,
    fallback: F,
}

impl DictionaryAnalyzer<SurfaceAnalyzer> {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::load_with_fallback(path, SurfaceAnalyzer)
    }
}

impl<F: MorphAnalyzer> DictionaryAnalyzer<F> {
    pub fn from_entries<I, S>(entries: I, fallback: F) -> Self
    where
        I: IntoIterator<Item = (S, S, Vec<Grammeme>)>,
        S: Into<String>,
    {
        let mut table = HashMap::new();
        for (form, lemma, tags) in entries {
            let form: String = form.into();
            table
                .entry(form.to_lowercase())
                .or_insert_with(|| DictionaryEntry { lemma: lemma.into(), tags: tags.into_iter().collect() });
        }
        Self { entries: table, fallback }
    }

    pub fn load_with_fallback<P: AsRef<Path>>(path: P, fallback: F) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::io(path, source))?;
        let mut rows = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| LoadError::io(path, source))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut cols = trimmed.split('\t');
            let (form, lemma) = match (cols.next(), cols.next()) {
                (Some(form), Some(lemma)) if !form.is_empty() && !lemma.is_empty() => (form, lemma),
                _ => return Err(LoadError::malformed(path, i + 1, "expected `form<TAB>lemma[<TAB>TAGS]`")),
            };
            let tags: Vec<Grammeme> = cols
                .next()
                .unwrap_or("")
                .split(',')
                .filter(|t| !t.trim().is_empty())
                .filter_map(|t| t.parse().ok())
                .collect();
            rows.push((form.to_string(), lemma.to_string(), tags));
        }
        tracing::debug!(path = %path.display(), entries = rows.len(), "loaded morphology dictionary");
        Ok(Self::from_entries(rows, fallback))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: MorphAnalyzer> MorphAnalyzer for DictionaryAnalyzer<F> {
    fn parse(&self, word: &str) -> Option<Parse> {
        let lower = word.to_lowercase();
        match self.entries.get(&lower) {
            Some(entry) => Some(Parse { word: lower, normal_form: entry.lemma.clone(), tags: entry.tags.clone() }),
            None => self.fallback.parse(word),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noun() -> Vec<Grammeme> {
        vec![Grammeme::Other("NOUN".into())]
    }

    fn table() -> Normalizer {
        Normalizer::new(DictionaryAnalyzer::from_entries(
            vec![
                ("кошками", "кошка", noun()),
                ("кошки", "кошка", noun()),
                ("спит", "спать", vec![Grammeme::Other("VERB".into())]),
                ("под", "под", vec![Grammeme::Prep]),
                ("и", "и", vec![Grammeme::Conj]),
                ("пятью", "пять", vec![Grammeme::Numr, Grammeme::Other("ablt".into())]),
            ],
            SurfaceAnalyzer,
        ))
    }

    #[test]
    fn rejects_closed_classes_and_noise() {
        let n = table();
        for w in ["под", "и", "пятью", "hello", "123", "XIV", "...", ""] {
            assert_eq!(n.normalize(w), None, "{w} should be rejected");
        }
    }

    #[test]
    fn lemmas_come_from_the_table() {
        let n = table();
        assert_eq!(n.normalize("Кошками").as_deref(), Some("кошка"));
        assert_eq!(n.normalize("кошки").as_deref(), Some("кошка"));
        assert_eq!(n.normalize("Спит").as_deref(), Some("спать"));
    }

    #[test]
    fn unlisted_words_keep_their_surface_form() {
        let n = table();
        assert_eq!(n.normalize("Жирафы").as_deref(), Some("жирафы"));
        assert_eq!(SurfaceAnalyzer.parse("12").unwrap().tags, HashSet::from([Grammeme::Numb]));
        assert_eq!(SurfaceAnalyzer.parse("ok").unwrap().tags, HashSet::from([Grammeme::Latn]));
    }

    #[test]
    fn only_listed_grammemes_reject() {
        for tag in Grammeme::REJECTED {
            assert!(tag.is_rejected());
            assert_eq!(tag.to_string().parse::<Grammeme>().unwrap(), tag);
        }
        let noun: Grammeme = "NOUN".parse().unwrap();
        assert_eq!(noun, Grammeme::Other("NOUN".into()));
        assert!(!noun.is_rejected());
        assert!(!Grammeme::Other("Anum".into()).is_rejected());
    }
}
