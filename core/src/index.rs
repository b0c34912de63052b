use crate::morph::Normalizer;
use crate::tokenizer::lemma_set;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Document identifier, the source file name (e.g. `1234.txt`).
pub type DocId = String;
/// Position of a term in a [`crate::Vocabulary`].
pub type TermId = u32;

/// Set of documents containing a lemma. Document frequency is its size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    documents: BTreeSet<DocId>,
}

impl Posting {
    pub fn documents(&self) -> &BTreeSet<DocId> {
        &self.documents
    }

    /// Document frequency.
    pub fn count(&self) -> usize {
        self.documents.len()
    }

    fn insert(&mut self, doc: DocId) {
        self.documents.insert(doc);
    }
}

impl FromIterator<DocId> for Posting {
    fn from_iter<T: IntoIterator<Item = DocId>>(iter: T) -> Self {
        Self { documents: iter.into_iter().collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub word: String,
    pub posting: Posting,
}

/// Lemma → posting set, iterated in ascending document frequency.
///
/// Immutable once built; the universe of indexed documents is computed at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    entries: Vec<IndexEntry>,
    lookup: HashMap<String, usize>,
    universe: BTreeSet<DocId>,
}

impl InvertedIndex {
    /// Index every document, processing ids in ascending order.
    pub fn build(documents: &BTreeMap<DocId, String>, normalizer: &Normalizer) -> Self {
        let mut builder = InvertedIndexBuilder::default();
        for (doc_id, text) in documents {
            builder.add_document(doc_id, lemma_set(text, normalizer));
        }
        let index = builder.finish();
        tracing::info!(num_docs = documents.len(), num_terms = index.len(), "built inverted index");
        index
    }

    /// Assemble an index from finished entries; entries are stably re-sorted by count.
    pub fn from_entries(mut entries: Vec<IndexEntry>) -> Self {
        entries.sort_by_key(|e| e.posting.count());
        let lookup = entries.iter().enumerate().map(|(i, e)| (e.word.clone(), i)).collect();
        let universe = entries.iter().flat_map(|e| e.posting.documents().iter().cloned()).collect();
        Self { entries, lookup, universe }
    }

    pub fn get(&self, word: &str) -> Option<&Posting> {
        self.lookup.get(word).map(|&i| &self.entries[i].posting)
    }

    /// Documents containing `word`; empty when the word is not indexed.
    pub fn documents(&self, word: &str) -> BTreeSet<DocId> {
        self.get(word).map(|p| p.documents().clone()).unwrap_or_default()
    }

    /// Union of every posting set.
    pub fn universe(&self) -> &BTreeSet<DocId> {
        &self.universe
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates postings document by document; words keep first-seen order
/// until [`InvertedIndexBuilder::finish`] sorts them.
#[derive(Debug, Default)]
pub struct InvertedIndexBuilder {
    order: Vec<String>,
    postings: HashMap<String, Posting>,
}

impl InvertedIndexBuilder {
    pub fn add_document<I>(&mut self, doc_id: &str, lemmas: I)
    where
        I: IntoIterator<Item = String>,
    {
        for lemma in lemmas {
            if !self.postings.contains_key(&lemma) {
                self.order.push(lemma.clone());
            }
            self.postings.entry(lemma).or_default().insert(doc_id.to_string());
        }
    }

    pub fn finish(mut self) -> InvertedIndex {
        let entries = self
            .order
            .into_iter()
            .filter_map(|word| self.postings.remove(&word).map(|posting| IndexEntry { word, posting }))
            .collect();
        InvertedIndex::from_entries(entries)
    }
}
