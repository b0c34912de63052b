use crate::index::{DocId, TermId};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Sparse TF-IDF vector keyed by vocabulary index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: BTreeMap<TermId, f64>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, term: TermId, weight: f64) {
        self.weights.insert(term, weight);
    }

    pub fn get(&self, term: TermId) -> f64 {
        self.weights.get(&term).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f64)> + '_ {
        self.weights.iter().map(|(&t, &w)| (t, w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// True when the vector has no non-zero weight, i.e. cannot be ranked against.
    pub fn is_zero(&self) -> bool {
        self.weights.values().all(|&w| w == 0.0)
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.iter().map(|(t, w)| w * large.get(t)).sum()
    }
}

impl FromIterator<(TermId, f64)> for SparseVector {
    fn from_iter<T: IntoIterator<Item = (TermId, f64)>>(iter: T) -> Self {
        Self { weights: iter.into_iter().collect() }
    }
}

/// Cosine similarity of two sparse vectors.
///
/// Callers must not pass a zero query vector. A zero document vector scores 0.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    a.dot(b) / denom
}

/// Score every document against `query`, highest first. Equal scores keep
/// the order of `documents`.
pub fn rank(query: &SparseVector, documents: &[(DocId, SparseVector)]) -> Vec<(DocId, f64)> {
    debug_assert!(!query.is_zero(), "zero query vector must be filtered before ranking");
    let mut scored: Vec<(DocId, f64)> =
        documents.iter().map(|(doc, vector)| (doc.clone(), cosine_similarity(query, vector))).collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(pairs: &[(TermId, f64)]) -> SparseVector {
        pairs.iter().copied().collect()
    }

    #[test]
    fn self_similarity_is_one() {
        let a = v(&[(0, 0.3), (4, 0.1), (7, 0.25)]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let a = v(&[(0, 0.3), (1, 0.2)]);
        let b = v(&[(1, 0.5), (2, 0.9)]);
        let ab = cosine_similarity(&a, &b);
        assert!((ab - cosine_similarity(&b, &a)).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&ab));
        assert_eq!(cosine_similarity(&a, &v(&[(9, 1.0)])), 0.0);
    }

    #[test]
    fn rank_orders_descending_and_keeps_ties_stable() {
        let q = v(&[(0, 1.0)]);
        let docs = vec![
            ("c".to_string(), v(&[(1, 1.0)])),
            ("a".to_string(), v(&[(0, 1.0), (1, 1.0)])),
            ("b".to_string(), v(&[(2, 1.0)])),
            ("d".to_string(), v(&[(0, 2.0)])),
        ];
        let ranked: Vec<String> = rank(&q, &docs).into_iter().map(|(d, _)| d).collect();
        assert_eq!(ranked, vec!["d", "a", "c", "b"]);
    }
}
