use anyhow::{ensure, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;

use colsearch_core::config::DataSettings;
use colsearch_core::types::{ChunkKey, Vector};

use crate::schema::{build_chunks_schema, build_tokens_schema};
use crate::table::ensure_table;

const BATCH_SIZE: usize = 1000;

/// A chunk row: identity, body text and dense embedding.
#[derive(Debug, Clone)]
pub struct ChunkRow {
    pub key: ChunkKey,
    pub body: String,
    pub dense: Vector,
}

/// One document-token embedding row.
#[derive(Debug, Clone)]
pub struct TokenRow {
    pub key: ChunkKey,
    pub token_no: i32,
    pub vector: Vector,
}

impl TokenRow {
    /// Rows for every token of one chunk, numbered in order.
    pub fn for_chunk(key: &ChunkKey, vectors: Vec<Vector>) -> Vec<TokenRow> {
        vectors
            .into_iter()
            .enumerate()
            .map(|(i, vector)| TokenRow { key: key.clone(), token_no: i as i32, vector })
            .collect()
    }
}

/// Appends chunk and token rows to the two tables, creating them on first use.
pub struct ChunkWriter {
    conn: Connection,
    chunks_table: String,
    tokens_table: String,
    dense_dim: i32,
    token_dim: i32,
}

fn progress(len: usize, what: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {what} ({{percent}}%)"))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn vectors_array(vectors: Vec<Option<Vec<Option<f32>>>>, dim: i32) -> FixedSizeListArray {
    FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)
}

impl ChunkWriter {
    pub fn new(conn: Connection, data: &DataSettings, dense_dim: usize, token_dim: usize) -> Self {
        Self {
            conn,
            chunks_table: data.chunks_table.clone(),
            tokens_table: data.tokens_table.clone(),
            dense_dim: dense_dim as i32,
            token_dim: token_dim as i32,
        }
    }

    pub async fn write_chunks(&self, rows: &[ChunkRow]) -> Result<usize> {
        if rows.is_empty() { return Ok(0); }
        for row in rows {
            ensure!(row.dense.len() == self.dense_dim as usize, "chunk {} has dense dim {}, expected {}", row.key, row.dense.len(), self.dense_dim);
        }
        let schema = build_chunks_schema(self.dense_dim);
        ensure_table(&self.conn, &self.chunks_table, schema.clone()).await?;
        let table = self.conn.open_table(&self.chunks_table).execute().await?;
        let pb = progress(rows.len(), "chunks")?;
        for batch in rows.chunks(BATCH_SIZE) {
            let rb = RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(StringArray::from_iter_values(batch.iter().map(|r| r.key.title.as_str()))),
                    Arc::new(Int32Array::from_iter_values(batch.iter().map(|r| r.key.chunk_no))),
                    Arc::new(StringArray::from_iter_values(batch.iter().map(|r| r.body.as_str()))),
                    Arc::new(vectors_array(batch.iter().map(|r| Some(r.dense.iter().map(|&x| Some(x)).collect())).collect(), self.dense_dim)),
                ],
            )?;
            let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema.clone()));
            table.add(reader).execute().await?;
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        tracing::info!(rows = rows.len(), table = %self.chunks_table, "chunk rows written");
        Ok(rows.len())
    }

    pub async fn write_tokens(&self, rows: &[TokenRow]) -> Result<usize> {
        if rows.is_empty() { return Ok(0); }
        for row in rows {
            ensure!(row.vector.len() == self.token_dim as usize, "token {} of {} has dim {}, expected {}", row.token_no, row.key, row.vector.len(), self.token_dim);
        }
        let schema = build_tokens_schema(self.token_dim);
        ensure_table(&self.conn, &self.tokens_table, schema.clone()).await?;
        let table = self.conn.open_table(&self.tokens_table).execute().await?;
        let pb = progress(rows.len(), "token embeddings")?;
        for batch in rows.chunks(BATCH_SIZE) {
            let rb = RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(StringArray::from_iter_values(batch.iter().map(|r| r.key.title.as_str()))),
                    Arc::new(Int32Array::from_iter_values(batch.iter().map(|r| r.key.chunk_no))),
                    Arc::new(Int32Array::from_iter_values(batch.iter().map(|r| r.token_no))),
                    Arc::new(vectors_array(batch.iter().map(|r| Some(r.vector.iter().map(|&x| Some(x)).collect())).collect(), self.token_dim)),
                ],
            )?;
            let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema.clone()));
            table.add(reader).execute().await?;
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        tracing::info!(rows = rows.len(), table = %self.tokens_table, "token rows written");
        Ok(rows.len())
    }
}
