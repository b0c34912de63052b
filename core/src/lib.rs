//! Indexing and retrieval over a corpus of Russian-language posts.
//!
//! Raw text is cleaned and normalized through an injected morphological
//! analyzer ([`morph`], [`tokenizer`]), folded into an inverted index that
//! answers boolean queries ([`index`], [`query`]), and weighted into TF-IDF
//! vectors ranked by cosine similarity ([`tfidf`], [`rank`]). [`SearchEngine`]
//! ties the pieces together once everything has been loaded.

pub mod engine;
pub mod error;
pub mod index;
pub mod morph;
pub mod persist;
pub mod query;
pub mod rank;
pub mod tfidf;
pub mod tokenizer;

pub use engine::{RankedHit, SearchEngine, VectorSpace};
pub use error::LoadError;
pub use index::{DocId, IndexEntry, InvertedIndex, InvertedIndexBuilder, Posting, TermId};
pub use morph::{DictionaryAnalyzer, Grammeme, MorphAnalyzer, Normalizer, Parse, SurfaceAnalyzer};
pub use rank::SparseVector;
pub use tfidf::{CorpusSnapshot, TermWeight, View, Vocabulary};
