use crate::index::{DocId, TermId};
use crate::morph::Normalizer;
use crate::rank::SparseVector;
use crate::tokenizer::{raw_terms, tokenize};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Which term stream a vector is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Cleaned surface words, unnormalized.
    Tokens,
    #[default]
    Lemmas,
}

impl View {
    pub const ALL: [View; 2] = [View::Tokens, View::Lemmas];

    /// Name used in query strings and logs.
    pub fn name(self) -> &'static str {
        match self {
            View::Tokens => "tokens",
            View::Lemmas => "lemmas",
        }
    }

    /// File name prefix of the persisted per-document vectors.
    pub fn prefix(self) -> &'static str {
        match self {
            View::Tokens => "tokens",
            View::Lemmas => "lemmes",
        }
    }

    pub fn terms(self, text: &str, normalizer: &Normalizer) -> Vec<String> {
        match self {
            View::Tokens => raw_terms(text),
            View::Lemmas => tokenize(text, normalizer),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tokens" => Ok(View::Tokens),
            "lemmas" => Ok(View::Lemmas),
            other => anyhow::bail!("unknown view `{other}`, expected `tokens` or `lemmas`"),
        }
    }
}

/// One row of a TF-IDF vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TermWeight {
    pub term: String,
    pub tf: f64,
    pub idf: f64,
}

impl TermWeight {
    pub fn weight(&self) -> f64 {
        self.tf * self.idf
    }
}

/// Document frequencies over a whole corpus, computed once per load.
#[derive(Debug, Clone, Default)]
pub struct CorpusSnapshot {
    num_docs: usize,
    document_frequency: HashMap<String, usize>,
    /// Distinct terms in first-seen order.
    terms: Vec<String>,
}

impl CorpusSnapshot {
    /// Build from each document's term sequence; repeats within a document count once.
    pub fn new<I, D>(documents: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator<Item = String>,
    {
        let mut snapshot = Self::default();
        for doc in documents {
            snapshot.num_docs += 1;
            let mut seen = HashSet::new();
            for term in doc {
                if !seen.insert(term.clone()) {
                    continue;
                }
                match snapshot.document_frequency.get_mut(&term) {
                    Some(df) => *df += 1,
                    None => {
                        snapshot.terms.push(term.clone());
                        snapshot.document_frequency.insert(term, 1);
                    }
                }
            }
        }
        snapshot
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    /// `log10(N / df)`, or 0 for a term no document contains.
    pub fn idf(&self, term: &str) -> f64 {
        match self.document_frequency(term) {
            0 => 0.0,
            df => (self.num_docs as f64 / df as f64).log10(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// One (term, tf, idf) row per distinct term, in order of first occurrence.
pub fn vectorize(terms: &[String], snapshot: &CorpusSnapshot) -> Vec<TermWeight> {
    if terms.is_empty() {
        return Vec::new();
    }
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for term in terms {
        match slots.get(term.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slots.insert(term.as_str(), counts.len());
                counts.push((term.as_str(), 1));
            }
        }
    }
    let total = terms.len() as f64;
    counts
        .into_iter()
        .map(|(term, count)| TermWeight { term: term.to_string(), tf: count as f64 / total, idf: snapshot.idf(term) })
        .collect()
}

/// Term sequences of every document under `view`, plus the snapshot built from them.
pub fn corpus_terms(
    documents: &BTreeMap<DocId, String>,
    view: View,
    normalizer: &Normalizer,
) -> (BTreeMap<DocId, Vec<String>>, CorpusSnapshot) {
    let terms: BTreeMap<DocId, Vec<String>> =
        documents.iter().map(|(id, text)| (id.clone(), view.terms(text, normalizer))).collect();
    let snapshot = CorpusSnapshot::new(terms.values().cloned());
    (terms, snapshot)
}

/// Ordered, deduplicated corpus terms; a term's position is its [`TermId`].
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self::default();
        for term in terms {
            let term = term.into();
            if vocab.ids.contains_key(&term) {
                continue;
            }
            vocab.ids.insert(term.clone(), vocab.terms.len() as TermId);
            vocab.terms.push(term);
        }
        vocab
    }

    pub fn id(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Project weights onto vocabulary indices. Terms outside the vocabulary
    /// and zero weights are dropped.
    pub fn sparse(&self, weights: &[TermWeight]) -> SparseVector {
        weights
            .iter()
            .filter_map(|w| {
                let weight = w.weight();
                match self.id(&w.term) {
                    Some(id) if weight != 0.0 => Some((id, weight)),
                    _ => None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn tf_is_length_normalized() {
        let snapshot = CorpusSnapshot::new(vec![words("a b"), words("a c")]);
        let v = vectorize(&words("a a b c"), &snapshot);
        let sum: f64 = v.iter().map(|w| w.tf).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(v[0].term, "a");
        assert!((v[0].tf - 0.5).abs() < 1e-12);
    }

    #[test]
    fn idf_uses_log10_and_zero_for_unseen() {
        let snapshot = CorpusSnapshot::new(vec![words("a b b"), words("a"), words("c"), words("d")]);
        assert_eq!(snapshot.num_docs(), 4);
        assert_eq!(snapshot.document_frequency("b"), 1);
        assert!((snapshot.idf("a") - 2f64.log10()).abs() < 1e-12);
        assert!((snapshot.idf("b") - 4f64.log10()).abs() < 1e-12);
        assert_eq!(snapshot.idf("zzz"), 0.0);
        assert_eq!(snapshot.terms(), &words("a b c d")[..]);
    }

    #[test]
    fn vocabulary_drops_unknown_and_zero_weights() {
        let vocab = Vocabulary::from_terms(["a", "b", "a"]);
        assert_eq!(vocab.len(), 2);
        let sparse = vocab.sparse(&[
            TermWeight { term: "a".into(), tf: 0.5, idf: 0.0 },
            TermWeight { term: "b".into(), tf: 0.25, idf: 1.0 },
            TermWeight { term: "x".into(), tf: 0.25, idf: 1.0 },
        ]);
        assert_eq!(sparse.len(), 1);
        assert_eq!(sparse.get(1), 0.25);
    }

    #[test]
    fn view_parses_from_its_name() {
        for view in View::ALL {
            assert_eq!(view.name().parse::<View>().unwrap(), view);
            assert_eq!(view.to_string(), view.name());
        }
        assert!("stems".parse::<View>().is_err());
        assert_eq!(View::Tokens.prefix(), "tokens");
        assert_eq!(View::Lemmas.prefix(), "lemmes");
    }
}
