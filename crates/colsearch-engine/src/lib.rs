//! colsearch-engine
//!
//! Late-interaction (ColBERT-style) retrieval over an ANN index of document
//! token embeddings, plus the single-vector dense baseline.
//!
//! Late-interaction flow for one query: one token-space ANN search per query
//! token (`aggregator`), MaxSim scoring of every discovered chunk (`scorer`),
//! deterministic top-K (`topk`), then body resolution from fetches started
//! during aggregation (`materialize`). `Retriever` wires encoders, index and
//! chunk store together and is the surface callers use.

pub mod aggregator;
pub mod dense;
pub mod materialize;
pub mod memory;
pub mod retriever;
pub mod scorer;
pub mod topk;

pub use aggregator::{BodyFetch, CandidateAggregator, CandidateEvidence, Candidates};
pub use dense::DenseRetriever;
pub use materialize::materialize;
pub use memory::{InMemoryChunkStore, InMemoryIndex};
pub use retriever::{Comparison, ModeOutcome, Retriever};
pub use scorer::{dot, maxsim, score, score_all};
pub use topk::{select, ScoredCandidate};
