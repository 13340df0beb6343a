use std::time::Duration;

use colsearch_cli::{open_retriever, parse_args, render_comparison, CliArgs};
use colsearch_core::config::Settings;
use colsearch_core::{ChunkKey, ResultRecord, RetrievalError, SearchSpace};
use colsearch_engine::{Comparison, ModeOutcome};
use tempfile::TempDir;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn parses_top_k_and_query() -> anyhow::Result<()> {
    assert_eq!(parse_args(&[])?, CliArgs::default());
    let cli = parse_args(&args(&["--top-k", "3", "solar eclipse"]))?;
    assert_eq!(cli, CliArgs { top_k: Some(3), query: Some("solar eclipse".into()) });
    assert!(parse_args(&args(&["--top-k"])).is_err());
    assert!(parse_args(&args(&["--top-k", "many"])).is_err());
    assert!(parse_args(&args(&["--verbose"])).is_err());
    Ok(())
}

#[test]
fn renders_both_modes_even_when_one_fails() {
    let cmp = Comparison {
        late_interaction: ModeOutcome {
            results: Err(RetrievalError::IndexUnavailable { space: SearchSpace::Token, reason: "no table".into() }),
            elapsed: Duration::from_millis(4),
        },
        dense: ModeOutcome {
            results: Ok(vec![ResultRecord::new(ChunkKey::new("Moon", 2), "tides".into())]),
            elapsed: Duration::from_millis(2),
        },
    };
    let out = render_comparison(&cmp);
    let colbert = out.find("# Retrieving from ColBERT").expect("late interaction block");
    let minilm = out.find("# Retrieving from all-MiniLM-L6-v2").expect("dense block");
    assert!(colbert < minilm);
    assert!(out.contains("error: "), "{out}");
    assert!(out.contains("1. Moon [chunk 2]\ntides"), "{out}");
}

#[tokio::test]
async fn empty_database_reports_unavailable_per_mode() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let mut settings = Settings::default();
    settings.data.lancedb_dir = tmp.path().to_string_lossy().to_string();
    settings.embedding.use_fake = true;
    let retriever = open_retriever(&settings).await?;

    let cmp = retriever.compare("anything", None).await;
    let spaces: Vec<SearchSpace> = cmp.failures().into_iter().map(|(space, _)| space).collect();
    assert_eq!(spaces, vec![SearchSpace::Token, SearchSpace::Dense]);
    assert!(cmp
        .failures()
        .iter()
        .all(|(_, e)| matches!(e, RetrievalError::IndexUnavailable { .. })));
    Ok(())
}
