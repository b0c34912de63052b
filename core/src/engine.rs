use crate::index::{DocId, InvertedIndex};
use crate::morph::Normalizer;
use crate::persist::{check_vector_set, load_index, load_references, load_vectors, IndexPaths};
use crate::query::BooleanSearch;
use crate::rank::{rank, SparseVector};
use crate::tfidf::{corpus_terms, vectorize, CorpusSnapshot, TermWeight, View, Vocabulary};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Document vectors of one view together with the vocabulary and snapshot they were weighted against.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    view: View,
    vocabulary: Vocabulary,
    snapshot: CorpusSnapshot,
    documents: Vec<(DocId, SparseVector)>,
}

impl VectorSpace {
    /// Vectorize a corpus from scratch.
    pub fn build(documents: &BTreeMap<DocId, String>, view: View, normalizer: &Normalizer) -> Self {
        let (terms, snapshot) = corpus_terms(documents, view, normalizer);
        let weights = terms.into_iter().map(|(doc, terms)| (doc, vectorize(&terms, &snapshot))).collect();
        Self::assemble(view, snapshot, weights)
    }

    /// Rebuild from persisted per-document rows. Each file lists exactly the
    /// distinct terms of its document, so the snapshot is recovered from them.
    pub fn from_weights(view: View, weights: BTreeMap<DocId, Vec<TermWeight>>) -> Self {
        let snapshot = CorpusSnapshot::new(weights.values().map(|rows| rows.iter().map(|w| w.term.clone()).collect::<Vec<_>>()));
        Self::assemble(view, snapshot, weights)
    }

    fn assemble(view: View, snapshot: CorpusSnapshot, weights: BTreeMap<DocId, Vec<TermWeight>>) -> Self {
        let vocabulary = Vocabulary::from_terms(snapshot.terms().iter().cloned());
        let documents = weights.into_iter().map(|(doc, rows)| (doc, vocabulary.sparse(&rows))).collect();
        Self { view, vocabulary, snapshot, documents }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn snapshot(&self) -> &CorpusSnapshot {
        &self.snapshot
    }

    pub fn documents(&self) -> &[(DocId, SparseVector)] {
        &self.documents
    }

    pub fn query_vector(&self, query: &str, normalizer: &Normalizer) -> SparseVector {
        let terms = self.view.terms(query, normalizer);
        self.vocabulary.sparse(&vectorize(&terms, &self.snapshot))
    }

    /// Documents by descending cosine similarity; empty when the query carries no weight.
    pub fn rank(&self, query: &str, normalizer: &Normalizer) -> Vec<(DocId, f64)> {
        let q = self.query_vector(query, normalizer);
        if q.is_zero() {
            return Vec::new();
        }
        rank(&q, &self.documents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedHit {
    pub document: DocId,
    pub reference: String,
    pub score: f64,
}

/// Everything needed to answer queries, loaded once and read-only afterwards.
pub struct SearchEngine {
    normalizer: Normalizer,
    index: InvertedIndex,
    tokens: VectorSpace,
    lemmas: VectorSpace,
    references: HashMap<DocId, String>,
}

impl SearchEngine {
    pub fn new(
        normalizer: Normalizer,
        index: InvertedIndex,
        tokens: VectorSpace,
        lemmas: VectorSpace,
        references: HashMap<DocId, String>,
    ) -> Self {
        Self { normalizer, index, tokens, lemmas, references }
    }

    /// Build every structure in memory from raw documents.
    pub fn from_documents(
        documents: &BTreeMap<DocId, String>,
        references: HashMap<DocId, String>,
        normalizer: Normalizer,
    ) -> Self {
        let index = InvertedIndex::build(documents, &normalizer);
        let tokens = VectorSpace::build(documents, View::Tokens, &normalizer);
        let lemmas = VectorSpace::build(documents, View::Lemmas, &normalizer);
        Self::new(normalizer, index, tokens, lemmas, references)
    }

    /// Load the artifacts written by the indexer. Any malformed file fails the
    /// whole load, as does a vector view that is empty or misses an indexed
    /// document or a document of the other view.
    pub fn load(paths: &IndexPaths, references: &Path, normalizer: Normalizer) -> Result<Self> {
        let index = load_index(paths).context("loading inverted index")?;
        let token_rows = load_vectors(paths, View::Tokens).context("loading token vectors")?;
        let lemma_rows = load_vectors(paths, View::Lemmas).context("loading lemma vectors")?;
        check_vector_set(paths, View::Lemmas, index.universe(), &lemma_rows)?;
        check_vector_set(paths, View::Lemmas, token_rows.keys(), &lemma_rows)?;
        check_vector_set(paths, View::Tokens, lemma_rows.keys(), &token_rows)?;
        let tokens = VectorSpace::from_weights(View::Tokens, token_rows);
        let lemmas = VectorSpace::from_weights(View::Lemmas, lemma_rows);
        let references = load_references(references).context("loading document references")?;

        let missing = lemmas.documents().iter().filter(|(doc, _)| !references.contains_key(doc)).count();
        if missing > 0 {
            tracing::warn!(missing, "documents without a reference will be shown by file name");
        }
        tracing::info!(
            num_terms = index.len(),
            num_docs = lemmas.documents().len(),
            vocabulary = lemmas.vocabulary().len(),
            "search engine ready"
        );
        Ok(Self::new(normalizer, index, tokens, lemmas, references))
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn space(&self, view: View) -> &VectorSpace {
        match view {
            View::Tokens => &self.tokens,
            View::Lemmas => &self.lemmas,
        }
    }

    /// Evaluate a boolean query (`a b`, `a | b`, `-a`).
    pub fn boolean(&self, query: &str) -> BTreeSet<DocId> {
        BooleanSearch::new(&self.index, &self.normalizer).search(query)
    }

    /// Ranked search, optionally truncated to the best `top_k` hits.
    pub fn search(&self, query: &str, view: View, top_k: Option<usize>) -> Vec<RankedHit> {
        let ranked = self.space(view).rank(query, &self.normalizer);
        let limit = top_k.unwrap_or(ranked.len());
        ranked
            .into_iter()
            .take(limit)
            .map(|(document, score)| RankedHit { reference: self.reference(&document).to_string(), document, score })
            .collect()
    }

    /// Display reference of a document, falling back to its id.
    pub fn reference<'a>(&'a self, document: &'a str) -> &'a str {
        self.references.get(document).map(String::as_str).unwrap_or(document)
    }
}
