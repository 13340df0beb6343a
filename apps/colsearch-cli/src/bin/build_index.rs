use std::env;

use colsearch_cli::init_tracing;
use colsearch_core::config::{expand_path, Config};
use colsearch_lance::index_build::build_ann_index;
use colsearch_lance::table::{open_db, table_exists};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut dense = true; let mut tokens = true;
    for arg in &args { match arg.as_str() {
        "--dense-only" => tokens = false,
        "--tokens-only" => dense = false,
        other => { eprintln!("Usage: colsearch-build-index [--dense-only | --tokens-only] (got '{}')", other); std::process::exit(1); }
    } }

    let uri = expand_path(&settings.data.lancedb_dir);
    println!("ANN index builder\n=================");
    println!("Database: {}", uri.display());
    let conn = open_db(&uri.to_string_lossy()).await?;
    let mut targets = Vec::new();
    if dense { targets.push((settings.data.chunks_table.as_str(), settings.embedding.dense_dim)); }
    if tokens { targets.push((settings.data.tokens_table.as_str(), settings.embedding.token_dim)); }
    for (table, dim) in targets {
        if !table_exists(&conn, table).await? { println!("⚠️  Skipping '{}': table does not exist", table); continue; }
        let params = build_ann_index(&conn, table, dim).await?;
        println!("✅ Built IVF_PQ on '{}' (nlist={}, m={})", table, params.nlist, params.m);
    }
    Ok(())
}
