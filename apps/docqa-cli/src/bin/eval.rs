use std::fs;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use docqa_agent::{judge_relevance, LlmClient, OpenAiClient};
use docqa_core::config::{expand_path, Config};
use docqa_hybrid::{retrieve_passages, RetrieverFactory};

#[derive(Debug, Deserialize)]
struct TestCase {
    question: String,
}

#[derive(Debug, Serialize)]
struct StrategyResult {
    strategy_id: String,
    chunk_size: usize,
    embedding_model: String,
    accuracy_percent: f64,
    hits: usize,
    total: usize,
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let test_set_path = expand_path(config.get::<String>("evaluator.test_set_path")?);
    let cases: Vec<TestCase> = serde_json::from_str(&fs::read_to_string(&test_set_path)?)?;
    println!("Loaded {} test questions from {}", cases.len(), test_set_path.display());

    let retriever_k: usize = config.get("evaluator.retriever_k").unwrap_or(5);
    let llm = config
        .get::<String>("evaluator.llm_judge")
        .ok()
        .and_then(OpenAiClient::from_env)
        .map(|c| Box::new(c) as Box<dyn LlmClient>);
    if llm.is_none() {
        println!("⚠️  No LLM judge available; relevance falls back to the term heuristic");
    }

    let factory = RetrieverFactory::from_config(&config)?;
    let mut results = Vec::new();
    for strategy in config.strategies()? {
        println!("\n--- Evaluating strategy '{}' (partition '{}') ---", strategy.id, strategy.partition);
        let retriever = match factory.build(&strategy) {
            Ok(retriever) => retriever,
            Err(err) => {
                tracing::error!("cannot evaluate strategy '{}': {err:#}", strategy.id);
                results.push(StrategyResult {
                    strategy_id: strategy.id.clone(),
                    chunk_size: strategy.chunk_size,
                    embedding_model: strategy.embedding_model.clone(),
                    accuracy_percent: 0.0,
                    hits: 0,
                    total: cases.len(),
                });
                continue;
            }
        };

        let mut hits = 0usize;
        for case in &cases {
            let passages = match retrieve_passages(retriever.as_ref(), &case.question, retriever_k)
            {
                Ok(passages) => passages,
                Err(err) => {
                    tracing::error!("retrieval failed for '{}': {err:#}", case.question);
                    Vec::new()
                }
            };
            let judgement = judge_relevance(llm.as_deref(), &case.question, &passages);
            if judgement.is_relevant {
                hits += 1;
            }
            println!("  {}... | relevant: {}", truncate(&case.question, 50), judgement.is_relevant);
        }

        let accuracy = if cases.is_empty() { 0.0 } else { hits as f64 * 100.0 / cases.len() as f64 };
        println!("Strategy '{}': {:.2}% ({}/{})", strategy.id, accuracy, hits, cases.len());
        results.push(StrategyResult {
            strategy_id: strategy.id.clone(),
            chunk_size: strategy.chunk_size,
            embedding_model: strategy.embedding_model.clone(),
            accuracy_percent: accuracy,
            hits,
            total: cases.len(),
        });
    }

    let results_path = expand_path(
        config
            .get::<String>("data.results_path")
            .unwrap_or_else(|_| "data/eval_results.json".to_string()),
    );
    if let Some(parent) = results_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&results_path, serde_json::to_string_pretty(&results)?)?;
    println!("\n📊 Results written to {}", results_path.display());
    Ok(())
}
