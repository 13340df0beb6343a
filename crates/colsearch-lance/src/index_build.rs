//! Build and inspect IVF_PQ indices on the vector columns.

use anyhow::Result;
use lancedb::index::{vector::IvfPqIndexBuilder, Index};
use lancedb::table::Table;
use lancedb::{Connection, DistanceType};

use crate::schema::VECTOR_COLUMN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvfPqParams {
    pub nlist: usize,
    pub m: usize,
}

pub fn compute_ivfpq_params(total_rows: usize, dim: usize) -> IvfPqParams {
    let sqrt_n = (total_rows as f64).sqrt() as usize;
    let mut nlist = std::cmp::max(2048, 2 * sqrt_n);
    nlist = std::cmp::min(nlist, 65536);
    // Clamp nlist below the row count for tiny tables
    if total_rows > 1 {
        nlist = std::cmp::min(nlist, total_rows - 1);
    } else {
        nlist = 1;
    }
    // Sub-vectors must divide the dimension.
    let mut m = if dim >= 1024 { 32 } else { 16 };
    while m > 1 && dim % m != 0 { m /= 2; }
    IvfPqParams { nlist, m }
}

/// True when some index covers `column`.
pub async fn has_ann_index(table: &Table, column: &str) -> Result<bool> {
    let indices = table.list_indices().await?;
    Ok(indices.iter().any(|idx| idx.columns.iter().any(|c| c == column)))
}

/// Build a dot-product IVF_PQ index over `table_name.vector`.
pub async fn build_ann_index(conn: &Connection, table_name: &str, dim: usize) -> Result<IvfPqParams> {
    let table = conn.open_table(table_name).execute().await?;
    let rows = table.count_rows(None).await?;
    let params = compute_ivfpq_params(rows, dim);
    tracing::info!(table = table_name, rows, nlist = params.nlist, m = params.m, "building IVF_PQ index");
    table
        .create_index(
            &[VECTOR_COLUMN],
            Index::IvfPq(
                IvfPqIndexBuilder::default()
                    .distance_type(DistanceType::Dot)
                    .num_partitions(params.nlist as u32)
                    .num_sub_vectors(params.m as u32),
            ),
        )
        .name(format!("{table_name}_{VECTOR_COLUMN}_ivfpq"))
        .execute()
        .await?;
    Ok(params)
}
