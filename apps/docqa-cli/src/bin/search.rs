use std::env;

use docqa_core::config::Config;
use docqa_hybrid::{retrieve_passages, RetrieverFactory};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: docqa-search <query> [strategy_id] [k]");
        eprintln!("Example: docqa-search 'multifactor authentication requirements'");
        std::process::exit(1);
    }
    let query = &args[0];
    let strategy_id = args.get(1).cloned().unwrap_or_else(|| {
        config.get::<String>("agent.strategy").unwrap_or_else(|_| "fixed_1000".to_string())
    });
    let k = args
        .get(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(|| config.get::<usize>("agent.retriever_k").unwrap_or(4));

    let strategy = config.strategy(&strategy_id)?;
    let retriever = RetrieverFactory::from_config(&config)?.build(&strategy)?;
    let passages = retrieve_passages(retriever.as_ref(), query, k)?;

    println!("\n🔍 Found {} passages for: \"{}\" (strategy '{}')", passages.len(), query, strategy_id);
    for (i, passage) in passages.iter().enumerate() {
        println!("\n  {}. {} (page {})", i + 1, passage.source, passage.page);
        println!("     {}", passage.text);
    }
    if passages.is_empty() {
        println!("(nothing relevant above the store's thresholds)");
    }
    Ok(())
}
