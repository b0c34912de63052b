use crate::error::LoadError;
use crate::index::{DocId, IndexEntry, InvertedIndex, Posting};
use crate::tfidf::{TermWeight, View};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::{self, create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One line of `index.jsonl`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexLine {
    pub word: String,
    pub documents: Vec<DocId>,
    pub count: usize,
}

/// Layout of the artifacts produced by the indexer.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self) -> PathBuf { self.root.join("index.jsonl") }
    pub fn lemmas(&self) -> PathBuf { self.root.join("lemmas.txt") }
    pub fn tokens(&self) -> PathBuf { self.root.join("tokens.txt") }
    pub fn vectors_dir(&self) -> PathBuf { self.root.join("tf_idf") }
    pub fn vector(&self, view: View, doc_id: &str) -> PathBuf {
        self.vectors_dir().join(format!("{}{}", view.prefix(), doc_id))
    }
}

/// Read every `.txt` file directly inside `dir`, keyed by file name.
pub fn load_documents<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<DocId, String>> {
    let dir = dir.as_ref();
    let mut documents = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|s| s.to_str()) != Some("txt") {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        documents.insert(name, text);
    }
    tracing::info!(dir = %dir.display(), num_docs = documents.len(), "loaded documents");
    Ok(documents)
}

pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let path = paths.index();
    let mut f = BufWriter::new(File::create(&path).with_context(|| format!("creating {}", path.display()))?);
    for entry in index.entries() {
        let line = IndexLine {
            word: entry.word.clone(),
            documents: entry.posting.documents().iter().cloned().collect(),
            count: entry.posting.count(),
        };
        serde_json::to_writer(&mut f, &line)?;
        f.write_all(b"\n")?;
    }
    f.flush()?;
    Ok(())
}

/// Load `index.jsonl`, checking every stored count against its document list.
pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex, LoadError> {
    let path = paths.index();
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    for (line_no, line) in read_lines(&path)? {
        let parsed: IndexLine =
            serde_json::from_str(&line).map_err(|e| LoadError::malformed(&path, line_no, e.to_string()))?;
        let posting: Posting = parsed.documents.into_iter().collect();
        if posting.count() != parsed.count {
            return Err(LoadError::CountMismatch {
                path,
                line: line_no,
                word: parsed.word,
                stored: parsed.count,
                actual: posting.count(),
            });
        }
        if !seen.insert(parsed.word.clone()) {
            return Err(LoadError::malformed(&path, line_no, format!("duplicate word `{}`", parsed.word)));
        }
        entries.push(IndexEntry { word: parsed.word, posting });
    }
    let index = InvertedIndex::from_entries(entries);
    tracing::info!(path = %path.display(), num_terms = index.len(), num_docs = index.universe().len(), "loaded index");
    Ok(index)
}

/// Write `lemmas.txt` (`lemma form form ...`) and `tokens.txt` (one form per line, same grouping).
pub fn save_lemmas(paths: &IndexPaths, forms: &BTreeMap<String, BTreeSet<String>>) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut lemmas = BufWriter::new(File::create(paths.lemmas())?);
    let mut tokens = BufWriter::new(File::create(paths.tokens())?);
    for (lemma, words) in forms {
        write!(lemmas, "{lemma}")?;
        for word in words {
            write!(lemmas, " {word}")?;
            writeln!(tokens, "{word}")?;
        }
        writeln!(lemmas)?;
    }
    lemmas.flush()?;
    tokens.flush()?;
    Ok(())
}

pub fn save_vector(paths: &IndexPaths, view: View, doc_id: &str, weights: &[TermWeight]) -> Result<()> {
    create_dir_all(paths.vectors_dir())?;
    let path = paths.vector(view, doc_id);
    let mut f = BufWriter::new(File::create(&path).with_context(|| format!("creating {}", path.display()))?);
    for w in weights {
        writeln!(f, "{} {} {}", w.term, w.tf, w.idf)?;
    }
    f.flush()?;
    Ok(())
}

/// Parse one `term tf idf` vector file.
pub fn load_vector(path: &Path) -> Result<Vec<TermWeight>, LoadError> {
    let mut weights = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [term, tf, idf] = fields.as_slice() else {
            return Err(LoadError::malformed(path, line_no, "expected `term tf idf`"));
        };
        let number = |s: &str| s.parse::<f64>().map_err(|e| LoadError::malformed(path, line_no, format!("`{s}`: {e}")));
        weights.push(TermWeight { term: term.to_string(), tf: number(*tf)?, idf: number(*idf)? });
    }
    Ok(weights)
}

/// All persisted vectors of one view, keyed by document id. A view with no
/// vector files at all is an error.
pub fn load_vectors(paths: &IndexPaths, view: View) -> Result<BTreeMap<DocId, Vec<TermWeight>>, LoadError> {
    let dir = paths.vectors_dir();
    let mut vectors = BTreeMap::new();
    for entry in fs::read_dir(&dir).map_err(|e| LoadError::io(&dir, e))? {
        let entry = entry.map_err(|e| LoadError::io(&dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(doc_id) = name.strip_prefix(view.prefix()) else { continue };
        if doc_id.is_empty() {
            continue;
        }
        vectors.insert(doc_id.to_string(), load_vector(&entry.path())?);
    }
    if vectors.is_empty() {
        return Err(LoadError::MissingVectors { dir, prefix: view.prefix() });
    }
    tracing::info!(%view, num_docs = vectors.len(), "loaded tf-idf vectors");
    Ok(vectors)
}

/// Check that every document in `expected` has a vector of `view`.
///
/// Vector sets may hold extra documents: a post with no accepted lemma gets an
/// empty vector file but never appears in a posting.
pub fn check_vector_set<'a, I>(
    paths: &IndexPaths,
    view: View,
    expected: I,
    vectors: &BTreeMap<DocId, Vec<TermWeight>>,
) -> Result<(), LoadError>
where
    I: IntoIterator<Item = &'a DocId>,
{
    let missing: Vec<DocId> = expected.into_iter().filter(|doc| !vectors.contains_key(*doc)).cloned().collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(LoadError::VectorSetMismatch { dir: paths.vectors_dir(), prefix: view.prefix(), missing })
}

/// Load the `filename \t reference` table mapping documents to display references.
pub fn load_references<P: AsRef<Path>>(path: P) -> Result<HashMap<DocId, String>, LoadError> {
    let path = path.as_ref();
    let mut references = HashMap::new();
    for (line_no, line) in read_lines(path)? {
        match line.split_once('\t') {
            Some((doc, reference)) if !doc.trim().is_empty() => {
                references.insert(doc.trim().to_string(), reference.trim().to_string());
            }
            _ => return Err(LoadError::malformed(path, line_no, "expected `filename<TAB>reference`")),
        }
    }
    Ok(references)
}

/// Non-blank lines with 1-based line numbers.
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>, LoadError> {
    let f = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line.map_err(|e| LoadError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        out.push((i + 1, line));
    }
    Ok(out)
}
