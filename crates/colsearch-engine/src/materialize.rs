use colsearch_core::error::{Result, RetrievalError};
use colsearch_core::types::ResultRecord;

use crate::topk::ScoredCandidate;

/// Await the body of each selected candidate, keeping rank order.
///
/// A selected chunk with no body row is a consistency fault between the
/// token table and the chunk table and fails the query.
pub async fn materialize(selected: Vec<ScoredCandidate>) -> Result<Vec<ResultRecord>> {
    let mut records = Vec::with_capacity(selected.len());
    for candidate in selected {
        let key = candidate.key().clone();
        let body = match candidate.evidence.into_body().resolve().await {
            Ok(body) => body,
            Err(RetrievalError::NotFound(_)) => {
                tracing::error!(%key, "selected candidate has no body row");
                return Err(RetrievalError::BodyFetchInconsistency { key });
            }
            Err(e) => return Err(e),
        };
        records.push(ResultRecord::new(key, body));
    }
    Ok(records)
}
