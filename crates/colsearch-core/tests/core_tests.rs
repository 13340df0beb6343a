use std::fs;

use colsearch_core::config::{resolve_with_base, Config};
use colsearch_core::types::format_results;
use colsearch_core::{ChunkKey, ResultRecord, RetrievalError, SearchSpace};
use tempfile::TempDir;

#[test]
fn settings_defaults_without_files() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_for_env(tmp.path(), "none").expect("load");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.retrieval.token_fanout, 5);
    assert_eq!(settings.data.tokens_table, "chunk_tokens");
    assert_eq!(settings.embedding.token_dim, 128);
}

#[test]
fn env_overlay_overrides_base_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[retrieval]\ntop_k = 7\ntoken_fanout = 3\n").unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[retrieval]\ntop_k = 2\n").unwrap();

    let config = Config::load_for_env(tmp.path(), "test").expect("load");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.top_k, 2, "overlay wins");
    assert_eq!(settings.retrieval.token_fanout, 3, "base value kept");
    let fanout: usize = config.get("retrieval.token_fanout").expect("get");
    assert_eq!(fanout, 3);
}

#[test]
fn zero_top_k_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[retrieval]\ntop_k = 0\n").unwrap();
    let err = Config::load_for_env(tmp.path(), "none").err().expect("must fail");
    assert!(err.to_string().contains("top_k"), "{err}");
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/srv/colsearch");
    assert_eq!(resolve_with_base(base, "data/lancedb"), base.join("data/lancedb"));
    assert_eq!(resolve_with_base(base, "/abs/db"), std::path::PathBuf::from("/abs/db"));
}

#[test]
fn chunk_keys_order_by_title_then_number() {
    let mut keys = vec![ChunkKey::new("b", 0), ChunkKey::new("a", 10), ChunkKey::new("a", 2)];
    keys.sort();
    assert_eq!(keys, vec![ChunkKey::new("a", 2), ChunkKey::new("a", 10), ChunkKey::new("b", 0)]);
}

#[test]
fn errors_name_their_retrieval_mode() {
    let dense = RetrievalError::IndexUnavailable { space: SearchSpace::Dense, reason: "no table".into() };
    assert_eq!(dense.space(), Some(SearchSpace::Dense));
    let partial = RetrievalError::PartialSearchFailure {
        token: 1,
        total: 4,
        source: Box::new(RetrievalError::backend(SearchSpace::Token, "timeout")),
    };
    assert_eq!(partial.space(), Some(SearchSpace::Token));
    assert!(partial.to_string().contains("token search 1 of 4"));
    let fault = RetrievalError::BodyFetchInconsistency { key: ChunkKey::new("Rust", 3) };
    assert_eq!(fault.space(), Some(SearchSpace::Token));
    assert!(fault.to_string().contains("Rust [chunk 3]"));
}

#[test]
fn results_format_as_numbered_blocks() {
    let results = vec![
        ResultRecord::new(ChunkKey::new("Moon", 0), "Earth's satellite.".into()),
        ResultRecord::new(ChunkKey::new("Sun", 4), "A star.".into()),
    ];
    assert_eq!(
        format_results(&results),
        "1. Moon [chunk 0]\nEarth's satellite.\n\n2. Sun [chunk 4]\nA star."
    );
}

fn workspace_root() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).expect("workspace root").to_path_buf()
}

#[test]
fn shipped_config_requires_built_ann_indexes() {
    let root = workspace_root();
    let prod = Config::load_for_env(&root, "prod").expect("load").settings().expect("settings");
    assert!(prod.retrieval.require_ann_index, "unindexed tables must be reported, not scanned");

    let test = Config::load_for_env(&root, "test").expect("load").settings().expect("settings");
    assert!(!test.retrieval.require_ann_index);
    assert!(test.embedding.use_fake);
}

#[test]
fn encoder_errors_keep_their_source_chain() {
    use std::error::Error as _;

    let cause = anyhow::anyhow!("tokenizer.json missing").context("loading ColBERT checkpoint");
    let err = RetrievalError::encoder(SearchSpace::Token, cause);
    assert_eq!(err.space(), Some(SearchSpace::Token));
    assert!(err.to_string().contains("tokenizer.json missing"), "{err}");

    let source = err.source().expect("encoder error has a source");
    assert_eq!(source.to_string(), "loading ColBERT checkpoint");
    let root = source.source().expect("context keeps the root cause");
    assert_eq!(root.to_string(), "tokenizer.json missing");
}
