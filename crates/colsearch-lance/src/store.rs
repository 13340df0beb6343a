//! LanceDB-backed `VectorIndex` and `ChunkStore`.
//!
//! Dense-space searches run against the chunks table and return bodies
//! directly; token-space searches run against the token table and return the
//! matched embedding with its owning chunk key. A missing table (or, with
//! `require_ann_index`, a table without an index on `vector`) is reported as
//! `IndexUnavailable` for that space only.

use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Int32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::table::Table;
use lancedb::{Connection, DistanceType};
use tokio::sync::OnceCell;

use colsearch_core::config::{DataSettings, RetrievalSettings};
use colsearch_core::error::{Result, RetrievalError};
use colsearch_core::traits::{ChunkStore, VectorIndex};
use colsearch_core::types::{AnnHit, ChunkKey, SearchSpace};

use crate::index_build::has_ann_index;
use crate::schema::VECTOR_COLUMN;
use crate::table::{open_db, sql_literal, table_exists};

pub struct LanceStore {
    conn: Connection,
    chunks_table: String,
    tokens_table: String,
    dense_dim: usize,
    token_dim: usize,
    require_ann_index: bool,
    dense: OnceCell<Table>,
    tokens: OnceCell<Table>,
    bodies: OnceCell<Table>,
}

impl LanceStore {
    pub async fn open(
        uri: &str,
        data: &DataSettings,
        retrieval: &RetrievalSettings,
        dense_dim: usize,
        token_dim: usize,
    ) -> anyhow::Result<Self> {
        let conn = open_db(uri).await?;
        tracing::info!(uri, chunks = %data.chunks_table, tokens = %data.tokens_table, "opened LanceDB");
        Ok(Self::with_connection(conn, data, retrieval, dense_dim, token_dim))
    }

    pub fn with_connection(
        conn: Connection,
        data: &DataSettings,
        retrieval: &RetrievalSettings,
        dense_dim: usize,
        token_dim: usize,
    ) -> Self {
        Self {
            conn,
            chunks_table: data.chunks_table.clone(),
            tokens_table: data.tokens_table.clone(),
            dense_dim,
            token_dim,
            require_ann_index: retrieval.require_ann_index,
            dense: OnceCell::new(),
            tokens: OnceCell::new(),
            bodies: OnceCell::new(),
        }
    }

    pub fn connection(&self) -> &Connection { &self.conn }

    async fn open_existing(&self, space: SearchSpace, name: &str) -> Result<Table> {
        let exists = table_exists(&self.conn, name).await.map_err(|e| RetrievalError::backend(space, e))?;
        if !exists {
            return Err(RetrievalError::IndexUnavailable { space, reason: format!("table '{name}' does not exist") });
        }
        self.conn.open_table(name).execute().await.map_err(|e| RetrievalError::backend(space, e))
    }

    /// The searchable table for `space`; opened once, then reused.
    async fn search_table(&self, space: SearchSpace) -> Result<&Table> {
        let (cell, name) = match space {
            SearchSpace::Dense => (&self.dense, &self.chunks_table),
            SearchSpace::Token => (&self.tokens, &self.tokens_table),
        };
        cell.get_or_try_init(|| async {
            let table = self.open_existing(space, name).await?;
            if self.require_ann_index {
                let indexed = has_ann_index(&table, VECTOR_COLUMN).await.map_err(|e| RetrievalError::backend(space, e))?;
                if !indexed {
                    return Err(RetrievalError::IndexUnavailable {
                        space,
                        reason: format!("table '{name}' has no ANN index on '{VECTOR_COLUMN}'"),
                    });
                }
            }
            Ok::<Table, RetrievalError>(table)
        })
        .await
    }

    fn dim(&self, space: SearchSpace) -> usize {
        match space {
            SearchSpace::Dense => self.dense_dim,
            SearchSpace::Token => self.token_dim,
        }
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str, space: SearchSpace) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| RetrievalError::backend(space, format!("result batch has no usable '{name}' column")))
}

/// Append the hits in one result batch of a `space` search to `out`.
pub fn rows_to_hits(batch: &RecordBatch, space: SearchSpace, out: &mut Vec<AnnHit>) -> Result<()> {
    let titles = column::<StringArray>(batch, "title", space)?;
    let chunk_nos = column::<Int32Array>(batch, "chunk_no", space)?;
    match space {
        SearchSpace::Dense => {
            let bodies = column::<StringArray>(batch, "body", space)?;
            for i in 0..batch.num_rows() {
                let key = ChunkKey::new(titles.value(i), chunk_nos.value(i));
                out.push(AnnHit::dense(key, bodies.value(i)));
            }
        }
        SearchSpace::Token => {
            let token_nos = column::<Int32Array>(batch, "token_no", space)?;
            let vectors = column::<FixedSizeListArray>(batch, VECTOR_COLUMN, space)?;
            for i in 0..batch.num_rows() {
                let key = ChunkKey::new(titles.value(i), chunk_nos.value(i));
                if vectors.is_null(i) {
                    return Err(RetrievalError::backend(
                        space,
                        format!("token {} of {key} has a null vector", token_nos.value(i)),
                    ));
                }
                let values = vectors.value(i);
                let embedding = values.as_primitive::<arrow_array::types::Float32Type>().values().to_vec();
                out.push(AnnHit::token(key, Some(token_nos.value(i)), embedding));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl VectorIndex for LanceStore {
    async fn ann_search(&self, space: SearchSpace, vector: &[f32], limit: usize) -> Result<Vec<AnnHit>> {
        let expected = self.dim(space);
        if vector.len() != expected {
            return Err(RetrievalError::DimensionMismatch { space, expected, actual: vector.len() });
        }
        let table = self.search_table(space).await?;
        let columns: &[&str] = match space {
            SearchSpace::Dense => &["title", "chunk_no", "body"],
            SearchSpace::Token => &["title", "chunk_no", "token_no", VECTOR_COLUMN],
        };
        let mut stream = table
            .vector_search(vector.to_vec())
            .map_err(|e| RetrievalError::backend(space, e))?
            .column(VECTOR_COLUMN)
            .distance_type(DistanceType::Dot)
            .select(Select::columns(columns))
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RetrievalError::backend(space, e))?;
        let mut hits = Vec::with_capacity(limit);
        while let Some(batch) = stream.try_next().await.map_err(|e| RetrievalError::backend(space, e))? {
            rows_to_hits(&batch, space, &mut hits)?;
        }
        hits.truncate(limit);
        tracing::debug!(%space, limit, hits = hits.len(), "ann search");
        Ok(hits)
    }
}

#[async_trait]
impl ChunkStore for LanceStore {
    async fn fetch_body(&self, key: &ChunkKey) -> Result<String> {
        let space = SearchSpace::Token;
        let table = match self.bodies.get_or_try_init(|| self.open_existing(space, &self.chunks_table)).await {
            Ok(table) => table,
            // No chunks table means no body row for any key.
            Err(RetrievalError::IndexUnavailable { .. }) => return Err(RetrievalError::NotFound(key.clone())),
            Err(e) => return Err(e),
        };
        let filter = format!("title = {} AND chunk_no = {}", sql_literal(&key.title), key.chunk_no);
        let mut stream = table
            .query()
            .only_if(filter)
            .select(Select::columns(&["body"]))
            .limit(1)
            .execute()
            .await
            .map_err(|e| RetrievalError::backend(space, e))?;
        while let Some(batch) = stream.try_next().await.map_err(|e| RetrievalError::backend(space, e))? {
            if batch.num_rows() == 0 { continue; }
            let bodies = column::<StringArray>(&batch, "body", space)?;
            return Ok(bodies.value(0).to_string());
        }
        Err(RetrievalError::NotFound(key.clone()))
    }
}
