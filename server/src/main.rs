use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::{build_app, AppConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory written by `indexer build`
    #[arg(long, env = "OUTPUT_PATH", default_value = "./index")]
    index: PathBuf,
    /// Tab-separated `filename<TAB>url` table
    #[arg(long, env = "REFERENCES_PATH")]
    references: PathBuf,
    /// `form<TAB>lemma<TAB>TAGS` morphology table; must match the one used at build time
    #[arg(long, env = "MORPH_DICTIONARY_PATH")]
    dictionary: PathBuf,
    /// Number of ranked results returned when the request has no `k`
    #[arg(long, env = "TOP_K")]
    top_k: Option<usize>,
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = AppConfig {
        index_dir: args.index,
        references: args.references,
        dictionary: args.dictionary,
        top_k: args.top_k,
    };
    let app: Router = build_app(&config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
