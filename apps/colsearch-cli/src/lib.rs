//! Shared wiring for the `colsearch` binaries.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colsearch_core::config::{expand_path, Settings};
use colsearch_core::format_results;
use colsearch_core::traits::{DenseEncoder, TokenEncoder};
use colsearch_engine::{Comparison, ModeOutcome, Retriever};
use colsearch_lance::LanceStore;

pub const LATE_INTERACTION_LABEL: &str = "ColBERT";
pub const DENSE_LABEL: &str = "all-MiniLM-L6-v2";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub top_k: Option<usize>,
    /// A single query to run instead of the prompt loop.
    pub query: Option<String>,
}

pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--top-k" | "-k" => {
                let value = args.get(i + 1).context("--top-k requires a number")?;
                let k = value.parse::<usize>().with_context(|| format!("--top-k requires a number, got '{value}'"))?;
                out.top_k = Some(k);
                i += 1;
            }
            flag if flag.starts_with('-') => bail!("unknown flag '{flag}'"),
            _ => out.query = Some(args[i].clone()),
        }
        i += 1;
    }
    Ok(out)
}

/// Install the fmt subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Build encoders and the LanceDB store once and wire them into a `Retriever`.
pub async fn open_retriever(settings: &Settings) -> Result<Retriever> {
    let encoders = colsearch_embed::load_encoders(&settings.embedding)?;
    let uri = expand_path(&settings.data.lancedb_dir);
    let store = Arc::new(
        LanceStore::open(
            &uri.to_string_lossy(),
            &settings.data,
            &settings.retrieval,
            encoders.dense.dim(),
            encoders.tokens.dim(),
        )
        .await?,
    );
    Ok(Retriever::new(encoders.dense, encoders.tokens, store.clone(), store, settings.retrieval.clone()))
}

fn render_mode(label: &str, outcome: &ModeOutcome) -> String {
    let body = match &outcome.results {
        Ok(records) => format_results(records),
        Err(e) => format!("error: {e}"),
    };
    format!("# Retrieving from {label} (took {:.3}s)#\n\n{body}", outcome.elapsed.as_secs_f64())
}

/// Both modes as printed by the prompt loop, late interaction first.
pub fn render_comparison(cmp: &Comparison) -> String {
    format!(
        "\n{}\n\n\n{}\n",
        render_mode(LATE_INTERACTION_LABEL, &cmp.late_interaction),
        render_mode(DENSE_LABEL, &cmp.dense)
    )
}
