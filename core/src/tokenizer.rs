use crate::morph::Normalizer;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_CYRILLIC: Regex = Regex::new(r"[^А-Яа-яЁё ]+").expect("valid regex");
}

/// Replace every run of characters other than Cyrillic letters and spaces with a single space.
///
/// Text is NFC-composed first so that a decomposed `ё` survives as one letter.
pub fn clean(text: &str) -> String {
    let composed = text.nfc().collect::<String>();
    NON_CYRILLIC.replace_all(&composed, " ").into_owned()
}

/// Token-level view: cleaned words in document order, no normalization.
pub fn raw_terms(text: &str) -> Vec<String> {
    clean(text).split_whitespace().map(str::to_string).collect()
}

/// Lemma-level view: cleaned words run through the normalizer, rejections dropped, order kept.
pub fn tokenize(text: &str, normalizer: &Normalizer) -> Vec<String> {
    clean(text).split_whitespace().filter_map(|w| normalizer.normalize(w)).collect()
}

/// Distinct lemmas of a document; a lemma counts once however often it repeats.
pub fn lemma_set(text: &str, normalizer: &Normalizer) -> BTreeSet<String> {
    tokenize(text, normalizer).into_iter().collect()
}

/// Lemma → surface forms that normalized to it.
pub fn surface_forms(text: &str, normalizer: &Normalizer) -> BTreeMap<String, BTreeSet<String>> {
    let mut forms: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for word in clean(text).split_whitespace() {
        if let Some(parse) = normalizer.analyze(word) {
            forms.entry(parse.normal_form).or_default().insert(parse.word);
        }
    }
    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_keeps_only_cyrillic_and_spaces() {
        let cleaned = clean("Кот, spat!\n42 ёж");
        assert!(cleaned.chars().all(|c| c == ' ' || c.is_alphabetic()));
        assert_eq!(cleaned.split_whitespace().collect::<Vec<_>>(), vec!["Кот", "ёж"]);
        assert_eq!(raw_terms("привет\tмир\r\n"), vec!["привет", "мир"]);
    }

    #[test]
    fn tokenize_drops_rejected_words() {
        use crate::morph::{DictionaryAnalyzer, Grammeme, SurfaceAnalyzer};
        let n = Normalizer::new(DictionaryAnalyzer::from_entries(
            vec![("и", "и", vec![Grammeme::Conj]), ("в", "в", vec![Grammeme::Prep]), ("доме", "дом", vec![])],
            SurfaceAnalyzer,
        ));
        assert_eq!(tokenize("кошка и собака в доме 2024", &n), vec!["кошка", "собака", "дом"]);
    }
}
