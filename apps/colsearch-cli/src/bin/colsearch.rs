use std::env;
use std::io::{self, BufRead, Write};

use colsearch_cli::{init_tracing, open_retriever, parse_args, render_comparison};
use colsearch_core::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = parse_args(&args).map_err(|e| { eprintln!("Usage: colsearch [--top-k N] [query]"); e })?;
    let settings = config.settings()?;
    let retriever = open_retriever(&settings).await?;

    if let Some(query) = cli.query {
        print!("{}", render_comparison(&retriever.compare(&query, cli.top_k).await));
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Enter a query: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let query = line?;
        let query = query.trim();
        if query.is_empty() { continue; }
        println!("{}", render_comparison(&retriever.compare(query, cli.top_k).await));
    }
    Ok(())
}
