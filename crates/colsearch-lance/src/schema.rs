use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const VECTOR_COLUMN: &str = "vector";

fn vector_field(dim: i32) -> Field {
    Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true)
}

/// One row per chunk: body text plus the dense embedding.
pub fn build_chunks_schema(dense_dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("chunk_no", DataType::Int32, false),
        Field::new("body", DataType::Utf8, false),
        vector_field(dense_dim),
    ]))
}

/// One row per document token; bodies live only in the chunks table.
pub fn build_tokens_schema(token_dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("chunk_no", DataType::Int32, false),
        Field::new("token_no", DataType::Int32, false),
        vector_field(token_dim),
    ]))
}
