use std::env;

use docqa_agent::{DocAgent, LlmClient, OpenAiClient};
use docqa_core::config::Config;
use docqa_core::traits::Retriever;
use docqa_hybrid::RetrieverFactory;
use tracing_subscriber::EnvFilter;

fn build_retriever(config: &Config, strategy_id: &str) -> anyhow::Result<Box<dyn Retriever>> {
    let strategy = config.strategy(strategy_id)?;
    RetrieverFactory::from_config(config)?.build(&strategy)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: docqa-ask <question>");
        std::process::exit(1);
    }
    let question = args.join(" ");

    let strategy_id: String = config.get("agent.strategy")?;
    let retriever_k: usize = config.get("agent.retriever_k").unwrap_or(4);

    // A failed build must not crash the agent; it answers "unavailable".
    let retriever = match build_retriever(&config, &strategy_id) {
        Ok(retriever) => Some(retriever),
        Err(err) => {
            tracing::error!("failed to build the retriever for the agent: {err:#}");
            None
        }
    };

    let llm_model: String =
        config.get("agent.llm_model").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    let llm = OpenAiClient::from_env(llm_model).map(|c| Box::new(c) as Box<dyn LlmClient>);
    if llm.is_none() {
        println!("⚠️  OPENAI_API_KEY not set; printing retrieved context instead of a model answer");
    }

    let agent = DocAgent::new(retriever, llm, retriever_k);
    let answer = agent.answer(&question)?;
    println!("\n{}", answer);
    Ok(())
}
