//! colsearch-lance
//!
//! LanceDB storage for chunk bodies, dense chunk embeddings and per-token
//! embeddings. `LanceStore` serves both the `VectorIndex` and `ChunkStore`
//! roles; `ChunkWriter` and `index_build` populate and index the tables.

pub mod index_build;
pub mod schema;
pub mod store;
pub mod table;
pub mod writer;

pub use store::{rows_to_hits, LanceStore};
pub use writer::{ChunkRow, ChunkWriter, TokenRow};
