//! Boolean query language over the inverted index.
//!
//! ```text
//! expr   := clause ('|' clause)*      union
//! clause := term+                     intersection
//! term   := '-'? word                 leading '-' subtracts
//! ```
//!
//! `здесь -есть | другой` finds documents containing "здесь" but not "есть",
//! plus documents containing "другой".

use crate::index::{DocId, InvertedIndex};
use crate::morph::Normalizer;
use crate::tokenizer::clean;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Matches nothing.
    Empty,
    Word(String),
    /// Universe minus the word's documents.
    Not(String),
    /// Intersection, starting from the universe.
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// Parse a query string into an expression tree.
pub fn parse(query: &str) -> Expr {
    let mut clauses: Vec<Expr> = query.split('|').map(parse_clause).collect();
    match clauses.len() {
        1 => clauses.pop().unwrap_or(Expr::Empty),
        _ => Expr::Or(clauses),
    }
}

fn parse_clause(clause: &str) -> Expr {
    let mut terms: Vec<Expr> = clause.split_ascii_whitespace().map(parse_term).collect();
    if terms.is_empty() {
        return Expr::Empty;
    }
    // A lone positive word is a direct lookup; anything else starts from the universe.
    if terms.len() == 1 && matches!(terms[0], Expr::Word(_)) {
        return terms.remove(0);
    }
    Expr::And(terms)
}

fn parse_term(term: &str) -> Expr {
    match term.strip_prefix('-') {
        Some(word) => Expr::Not(word.to_string()),
        None => Expr::Word(term.to_string()),
    }
}

/// Evaluates boolean queries against a read-only index.
pub struct BooleanSearch<'a> {
    index: &'a InvertedIndex,
    normalizer: &'a Normalizer,
}

impl<'a> BooleanSearch<'a> {
    pub fn new(index: &'a InvertedIndex, normalizer: &'a Normalizer) -> Self {
        Self { index, normalizer }
    }

    pub fn search(&self, query: &str) -> BTreeSet<DocId> {
        let expr = parse(query);
        tracing::debug!(query, ?expr, "evaluating boolean query");
        self.evaluate(&expr)
    }

    pub fn evaluate(&self, expr: &Expr) -> BTreeSet<DocId> {
        match expr {
            Expr::Empty => BTreeSet::new(),
            Expr::Word(word) => self.lookup(word),
            Expr::Not(word) => self.index.universe().difference(&self.lookup(word)).cloned().collect(),
            Expr::And(terms) => {
                let mut result = self.index.universe().clone();
                for term in terms {
                    match term {
                        Expr::Not(word) => {
                            let excluded = self.lookup(word);
                            result.retain(|d| !excluded.contains(d));
                        }
                        other => {
                            let matched = self.evaluate(other);
                            result.retain(|d| matched.contains(d));
                        }
                    }
                }
                result
            }
            Expr::Or(clauses) => clauses.iter().flat_map(|c| self.evaluate(c)).collect(),
        }
    }

    /// Documents for a single query word; rejected or unindexed words match nothing.
    fn lookup(&self, word: &str) -> BTreeSet<DocId> {
        let cleaned = clean(word);
        match self.normalizer.normalize(cleaned.trim()) {
            Some(lemma) => self.index.documents(&lemma),
            None => BTreeSet::new(),
        }
    }
}
