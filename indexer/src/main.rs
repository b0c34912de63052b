use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use postsearch_core::persist::{load_documents, load_index, save_index, save_lemmas, save_vector, IndexPaths};
use postsearch_core::query::BooleanSearch;
use postsearch_core::tfidf::{corpus_terms, vectorize};
use postsearch_core::tokenizer::surface_forms;
use postsearch_core::{DocId, InvertedIndex, Normalizer, SearchEngine, View};
use tracing_subscriber::{fmt, EnvFilter};

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the inverted index and TF-IDF vectors for a directory of posts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Source {
    /// Directory of unpacked `.txt` posts
    #[arg(long, env = "POSTS_DIR_PATH")]
    input: PathBuf,
    /// Output directory for every artifact
    #[arg(long, env = "OUTPUT_PATH")]
    output: PathBuf,
    #[command(flatten)]
    morph: Morph,
}

#[derive(Args, Clone)]
struct Morph {
    /// `form<TAB>lemma<TAB>TAGS` morphology table
    #[arg(long, env = "MORPH_DICTIONARY_PATH")]
    dictionary: PathBuf,
}

impl Morph {
    fn normalizer(&self) -> Result<Normalizer> {
        Normalizer::from_dictionary(&self.dictionary)
            .with_context(|| format!("loading morphology dictionary {}", self.dictionary.display()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write lemmas.txt and tokens.txt
    Lemmas(Source),
    /// Write index.jsonl
    Index(Source),
    /// Write per-document TF-IDF vectors for the token and lemma views
    Vectors(Source),
    /// Run every stage
    Build(Source),
    /// Evaluate a boolean query against a built index
    Query {
        /// Directory holding index.jsonl
        #[arg(long, env = "OUTPUT_PATH")]
        output: PathBuf,
        #[command(flatten)]
        morph: Morph,
        /// Query, e.g. `кот -пёс | собака`
        query: String,
    },
    /// Rank documents by TF-IDF cosine similarity; reads queries from stdin when none is given
    Rank {
        /// Directory written by `build`
        #[arg(long, env = "OUTPUT_PATH")]
        output: PathBuf,
        /// Tab-separated `filename<TAB>url` table
        #[arg(long, env = "REFERENCES_PATH")]
        references: PathBuf,
        #[command(flatten)]
        morph: Morph,
        /// Number of hits printed per query
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        #[arg(long, default_value_t = View::Lemmas)]
        view: View,
        query: Option<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Lemmas(src) => run(&src, write_lemmas),
        Commands::Index(src) => run(&src, |docs, paths, n| write_index(docs, paths, n).map(|_| ())),
        Commands::Vectors(src) => run(&src, write_vectors),
        Commands::Build(src) => run(&src, |docs, paths, n| {
            write_lemmas(docs, paths, n)?;
            write_index(docs, paths, n)?;
            write_vectors(docs, paths, n)
        }),
        Commands::Query { output, morph, query } => {
            let paths = IndexPaths::new(&output);
            let index = load_index(&paths)?;
            let normalizer = morph.normalizer()?;
            let found = BooleanSearch::new(&index, &normalizer).search(&query);
            println!("{}", serde_json::to_string_pretty(&found)?);
            Ok(())
        }
        Commands::Rank { output, references, morph, top_k, view, query } => {
            let engine = SearchEngine::load(&IndexPaths::new(&output), &references, morph.normalizer()?)?;
            let mut out = io::stdout().lock();
            match query {
                Some(query) => print_ranked(&engine, &query, view, top_k, &mut out),
                None => rank_interactive(&engine, view, top_k, io::stdin().lock(), &mut out),
            }
        }
    }
}

/// Numbered `reference (сходство: score)` lines for the best `top_k` hits.
fn print_ranked<W: Write>(engine: &SearchEngine, query: &str, view: View, top_k: usize, out: &mut W) -> Result<()> {
    for (i, hit) in engine.search(query, view, Some(top_k)).iter().enumerate() {
        writeln!(out, "{}. {} (сходство: {})", i + 1, hit.reference, hit.score)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Answer one query per input line until an empty line or end of input.
fn rank_interactive<R: BufRead, W: Write>(engine: &SearchEngine, view: View, top_k: usize, input: R, out: &mut W) -> Result<()> {
    let mut lines = input.lines();
    loop {
        write!(out, "Введите запрос: ")?;
        out.flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        print_ranked(engine, &line, view, top_k, out)?;
    }
    Ok(())
}

fn run<F>(src: &Source, stage: F) -> Result<()>
where
    F: FnOnce(&BTreeMap<DocId, String>, &IndexPaths, &Normalizer) -> Result<()>,
{
    let normalizer = src.morph.normalizer()?;
    let documents = load_documents(&src.input)?;
    let paths = IndexPaths::new(&src.output);
    stage(&documents, &paths, &normalizer)?;
    tracing::info!(output = %src.output.display(), "done");
    Ok(())
}

/// Lemma → surface forms over the whole corpus.
fn write_lemmas(documents: &BTreeMap<DocId, String>, paths: &IndexPaths, normalizer: &Normalizer) -> Result<()> {
    let mut forms: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for text in documents.values() {
        for (lemma, words) in surface_forms(text, normalizer) {
            forms.entry(lemma).or_default().extend(words);
        }
    }
    save_lemmas(paths, &forms)?;
    tracing::info!(num_lemmas = forms.len(), "wrote lemma and token files");
    Ok(())
}

fn write_index(documents: &BTreeMap<DocId, String>, paths: &IndexPaths, normalizer: &Normalizer) -> Result<InvertedIndex> {
    let index = InvertedIndex::build(documents, normalizer);
    save_index(paths, &index)?;
    tracing::info!(path = %paths.index().display(), num_terms = index.len(), "wrote inverted index");
    Ok(index)
}

fn write_vectors(documents: &BTreeMap<DocId, String>, paths: &IndexPaths, normalizer: &Normalizer) -> Result<()> {
    for view in View::ALL {
        let (terms, snapshot) = corpus_terms(documents, view, normalizer);
        for (doc_id, doc_terms) in &terms {
            save_vector(paths, view, doc_id, &vectorize(doc_terms, &snapshot))?;
        }
        tracing::info!(%view, num_docs = terms.len(), num_terms = snapshot.terms().len(), "wrote tf-idf vectors");
    }
    Ok(())
}
