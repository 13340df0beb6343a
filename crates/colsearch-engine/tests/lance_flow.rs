use std::sync::Arc;

use colsearch_core::config::{DataSettings, RetrievalSettings};
use colsearch_core::traits::DenseEncoder;
use colsearch_core::{format_results, ChunkKey, RetrievalError, SearchSpace};
use colsearch_embed::{FakeDenseEncoder, FakeTokenEncoder};
use colsearch_engine::Retriever;
use colsearch_lance::table::open_db;
use colsearch_lance::{ChunkRow, ChunkWriter, LanceStore, TokenRow};
use tempfile::TempDir;

const DENSE_DIM: usize = 32;
const TOKEN_DIM: usize = 16;

const CORPUS: &[(&str, i32, &str)] = &[
    ("Moon", 0, "the moon orbits the earth"),
    ("Moon", 1, "tides follow the moon"),
    ("Volcano", 0, "lava flows from the volcano"),
    ("Airport", 0, "planes land at the airport"),
];

async fn seed(uri: &str, with_tokens: bool) -> anyhow::Result<()> {
    let writer = ChunkWriter::new(open_db(uri).await?, &DataSettings::default(), DENSE_DIM, TOKEN_DIM);
    let dense = FakeDenseEncoder::new(DENSE_DIM);
    let tokens = FakeTokenEncoder::new(TOKEN_DIM);
    let mut chunk_rows = Vec::new();
    let mut token_rows = Vec::new();
    for (title, chunk_no, body) in CORPUS {
        let key = ChunkKey::new(*title, *chunk_no);
        chunk_rows.push(ChunkRow { key: key.clone(), body: body.to_string(), dense: dense.encode_dense(body)? });
        token_rows.extend(TokenRow::for_chunk(&key, body.split_whitespace().map(|w| tokens.token_vector(w)).collect()));
    }
    writer.write_chunks(&chunk_rows).await?;
    if with_tokens {
        writer.write_tokens(&token_rows).await?;
    }
    Ok(())
}

async fn retriever(uri: &str) -> anyhow::Result<Retriever> {
    let settings = RetrievalSettings::default();
    let store = Arc::new(LanceStore::open(uri, &DataSettings::default(), &settings, DENSE_DIM, TOKEN_DIM).await?);
    Ok(Retriever::new(
        Arc::new(FakeDenseEncoder::new(DENSE_DIM)),
        Arc::new(FakeTokenEncoder::new(TOKEN_DIM)),
        store.clone(),
        store,
        settings,
    ))
}

#[tokio::test]
async fn lance_full_flow_both_modes() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let uri = tmp.path().to_string_lossy().to_string();
    seed(&uri, true).await?;
    let r = retriever(&uri).await?;

    let cmp = r.compare("tides moon", Some(3)).await;
    let late = cmp.late_interaction.results?;
    eprintln!("late interaction:\n{}", format_results(&late));
    assert!(!late.is_empty() && late.len() <= 3);
    assert_eq!(late[0].key(), ChunkKey::new("Moon", 1));
    assert_eq!(late[0].body, "tides follow the moon");

    let dense = cmp.dense.results?;
    assert_eq!(dense.len(), 3);
    assert!(dense.iter().all(|r| !r.body.is_empty()));
    Ok(())
}

#[tokio::test]
async fn lance_without_token_table_serves_dense_only() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let uri = tmp.path().to_string_lossy().to_string();
    seed(&uri, false).await?;
    let r = retriever(&uri).await?;

    let cmp = r.compare("lava volcano", None).await;
    let err = cmp.late_interaction.results.as_ref().err().expect("no token table");
    assert!(matches!(err, RetrievalError::IndexUnavailable { space: SearchSpace::Token, .. }), "{err}");
    let dense = cmp.dense.results?;
    assert_eq!(dense[0].key(), ChunkKey::new("Volcano", 0));
    Ok(())
}
