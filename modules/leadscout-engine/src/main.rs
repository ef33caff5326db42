use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use leadscout_common::{
    Config, DiscoveryRequest, DiscoveryResult, LlmProvider, PipelineConfig, TargetCategory,
};
use leadscout_engine::traits::{ContextRetrieval, StaticContext, TextGeneration, WebSearch};
use leadscout_engine::DiscoveryPipeline;
use llm_client::{Claude, OpenAi};
use tavily_client::TavilyClient;

/// Built-in vendor profile used when no profile file is supplied.
const DEFAULT_VENDOR_PROFILE: &str = "\
AxleWave Technologies builds a cloud platform for automotive dealerships: \
inventory management, digital retailing, and a modern DMS alternative. \
Target customers are dealer groups with 5-200 rooftops in North America, \
especially ones modernizing away from legacy on-premise systems. \
Partners include payment processors, CRM vendors, lenders, and analytics \
providers with automotive experience and open APIs.";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Category {
    Customers,
    Partners,
}

impl From<Category> for TargetCategory {
    fn from(c: Category) -> Self {
        match c {
            Category::Customers => TargetCategory::Customer,
            Category::Partners => TargetCategory::Partner,
        }
    }
}

/// Discover prospective customers or partners via web search and LLM
/// extraction.
#[derive(Debug, Parser)]
#[command(name = "leadscout", version)]
struct Cli {
    /// What to hunt for.
    #[arg(long, value_enum, default_value = "customers")]
    category: Category,

    /// Free-text constraints, e.g. "Focus on California".
    #[arg(long)]
    criteria: Option<String>,

    /// How many companies to return.
    #[arg(long, default_value_t = 10)]
    top_n: usize,

    /// Minimum fit score (0-100, inclusive).
    #[arg(long, default_value_t = 40)]
    min_score: u8,

    /// Max search results per generated query.
    #[arg(long, default_value_t = 5)]
    max_results: u32,

    /// Override the LLM_PROVIDER environment selection.
    #[arg(long, value_parser = ["openai", "anthropic"])]
    provider: Option<String>,

    /// Read the vendor profile from a file instead of the built-in text.
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Write the full result as JSON to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Some(provider) = &cli.provider {
        std::env::set_var("LLM_PROVIDER", provider);
    }
    let config = Config::from_env();

    let pipeline_config = PipelineConfig::default();
    let call_timeout = pipeline_config.call_timeout;

    let llm: Arc<dyn TextGeneration> = match config.llm_provider {
        LlmProvider::Anthropic => Arc::new(
            Claude::new(config.anthropic_api_key.clone(), config.llm_model.clone())
                .with_timeout(call_timeout),
        ),
        LlmProvider::OpenAi => Arc::new(
            OpenAi::new(config.openai_api_key.clone(), config.llm_model.clone())
                .with_timeout(call_timeout),
        ),
    };
    let search: Arc<dyn WebSearch> = Arc::new(
        TavilyClient::new(config.tavily_api_key.clone()).with_timeout(call_timeout),
    );

    let profile = match &cli.profile_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading profile file {}", path.display()))?,
        None => DEFAULT_VENDOR_PROFILE.to_string(),
    };
    let context: Arc<dyn ContextRetrieval> = Arc::new(StaticContext::new(profile));

    let mut request = DiscoveryRequest::new(cli.category.into())
        .with_requested_count(cli.top_n)
        .with_max_results_per_query(cli.max_results)
        .with_min_score(cli.min_score);
    if let Some(criteria) = &cli.criteria {
        request = request.with_criteria(criteria.clone());
    }

    // Ctrl-C turns into between-stage cancellation with a partial result.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing current stage");
            signal_token.cancel();
        }
    });

    let pipeline = DiscoveryPipeline::new(llm, search, context).with_config(pipeline_config);
    match pipeline.run_with_cancellation(&request, cancel).await {
        Ok(result) => {
            print_report(&result);
            if let Some(path) = &cli.output {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(path, json)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "Result written");
            }
            Ok(())
        }
        Err(failure) => {
            error!(error = %failure, "Discovery run failed");
            if !failure.funnel.is_empty() {
                eprintln!("{}", failure.funnel);
            }
            std::process::exit(1);
        }
    }
}

fn print_report(result: &DiscoveryResult) {
    println!("{}", result.funnel);

    println!("=== Accepted ({}) ===", result.accepted.len());
    for (rank, c) in result.accepted.iter().enumerate() {
        println!(
            "{:>2}. [{:>3}] {} — {}",
            rank + 1,
            c.fit_score.unwrap_or_default(),
            c.company_name,
            c.website_url,
        );
        println!(
            "      locations: {} | size: {}",
            c.locations.join(", "),
            c.size_class.map(|s| s.to_string()).unwrap_or_default(),
        );
        if let Some(rationale) = &c.rationale {
            println!("      {rationale}");
        }
        println!(
            "      via {} ({})",
            c.provenance.source_url, c.provenance.query
        );
    }

    if !result.criteria_rejected.is_empty() {
        println!("\n=== Rejected: criteria ({}) ===", result.criteria_rejected.len());
        for r in &result.criteria_rejected {
            println!("  {} — {}", r.company_name, r.reason);
        }
    }
    if !result.validation_rejected.is_empty() {
        println!(
            "\n=== Rejected: validation ({}) ===",
            result.validation_rejected.len()
        );
        for r in &result.validation_rejected {
            println!("  {} — {}", r.company_name, r.reason);
        }
    }
}
