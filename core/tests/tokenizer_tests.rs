use postsearch_core::tokenizer::{clean, lemma_set, raw_terms, surface_forms, tokenize};
use postsearch_core::Normalizer;

fn normalizer() -> Normalizer {
    Normalizer::from_dictionary(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/ru_morph_sample.tsv")).unwrap()
}

#[test]
fn it_strips_non_cyrillic_characters() {
    let words = raw_terms("Привет, world! 2024 — ёлка\u{0435}\u{0308}");
    assert_eq!(words, vec!["Привет", "ёлкаё"]);
    assert!(!clean("строка\nвторая").contains('\n'));
}

#[test]
fn it_filters_closed_classes() {
    let n = normalizer();
    let lemmas = tokenize("Кошка и собака спали под столом в доме", &n);
    // "и", "под", "в" are dropped
    assert_eq!(lemmas, vec!["кошка", "собака", "спать", "стол", "дом"]);
}

#[test]
fn it_is_deterministic() {
    let n = normalizer();
    let text = "Собаки бегали за голубями, а дети запускали воздушных змеев";
    assert_eq!(lemma_set(text, &n), lemma_set(text, &n));
    assert_eq!(tokenize(text, &n), tokenize(text, &n));
}

#[test]
fn it_groups_surface_forms_by_lemma() {
    let n = normalizer();
    let forms = surface_forms("Кошка кошки кошку", &n);
    assert_eq!(forms.len(), 1);
    let (lemma, words) = forms.into_iter().next().unwrap();
    assert_eq!(lemma, "кошка");
    assert_eq!(words.into_iter().collect::<Vec<_>>(), vec!["кошка", "кошки", "кошку"]);
}
