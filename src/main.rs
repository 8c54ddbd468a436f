//! ShopBuddy - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use shopbuddy::{
    agent::ResponsePipeline,
    cli::{Args, Commands, Verbosity},
    config::{BotConfig, ModelRole},
    memory::{default_facts, load_facts_file, Embedder, EmbeddingEngine, KnowledgeStore},
    models::OpenAiCompatClient,
    rag::{ContextBuilder, RetrievalEngine},
    repl::{display::format_details, ReplSession},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command();
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => BotConfig::default_path()?,
    };

    if command == Commands::InitConfig {
        init_tracing(args.verbosity(), args.debug);
        return init_config(&config_path);
    }

    // Configuration errors are fatal before any conversation starts
    let mut config = match BotConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Configuration error:".red().bold(), e);
            eprintln!("Create a default file with: shopbuddy init-config");
            std::process::exit(2);
        }
    };
    if args.debug {
        config.settings.debug_mode = true;
    }
    init_tracing(args.verbosity(), config.settings.debug_mode);

    let show_details = args.verbosity().show_details() || config.settings.debug_mode;

    match command {
        Commands::Chat => run_chat(&config, show_details).await?,
        Commands::Ask { question } => {
            let pipeline = build_pipeline(&config).await?;
            let mut session = pipeline.session();
            let result = session.respond(&question).await;
            println!("{}", result.answer);
            if show_details {
                eprintln!("{}", format_details(&result).dimmed());
            }
        }
        Commands::Retrieve { query, k } => {
            let retriever = build_retriever(&config).await?;
            let facts = retriever
                .try_retrieve_scored(&query, k)
                .context("failed to embed query")?;
            if facts.is_empty() {
                println!("{}", "No facts in the knowledge base.".yellow());
            } else {
                println!("{}", ContextBuilder::new().build_scored(&facts));
            }
        }
        Commands::Config => show_config(&config_path, &config)?,
        Commands::InitConfig => {}
    }

    Ok(())
}

/// Log to stderr so answers on stdout stay clean; RUST_LOG wins
fn init_tracing(verbosity: Verbosity, debug_mode: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter(debug_mode))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the embedding model and encode the corpus
async fn build_retriever(config: &BotConfig) -> Result<RetrievalEngine> {
    let facts = match &config.settings.knowledge_file {
        Some(path) => load_facts_file(path)?,
        None => default_facts(),
    };

    // Model download and corpus encoding are blocking work
    let (embedder, store) = tokio::task::spawn_blocking(move || -> shopbuddy::Result<_> {
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingEngine::new()?);
        let store = KnowledgeStore::build(facts, embedder.as_ref())?;
        Ok((embedder, store))
    })
    .await
    .context("embedding task panicked")?
    .context("failed to build knowledge store")?;

    Ok(RetrievalEngine::new(Arc::new(store), embedder))
}

async fn build_pipeline(config: &BotConfig) -> Result<Arc<ResponsePipeline>> {
    let retriever = build_retriever(config).await?;
    let client = OpenAiCompatClient::from_config(config).context("failed to create model client")?;
    info!(mode = %config.mode, "pipeline ready");
    Ok(Arc::new(ResponsePipeline::new(config, Arc::new(client), retriever)))
}

/// Run interactive chat
async fn run_chat(config: &BotConfig, show_details: bool) -> Result<()> {
    println!("{}", "Loading knowledge base...".dimmed());
    let pipeline = build_pipeline(config).await?;

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shopbuddy")
        .join("history");
    let mut repl = ReplSession::with_history(pipeline.session(), history_path)?;
    repl.set_show_details(show_details);
    repl.show_welcome(
        env!("CARGO_PKG_VERSION"),
        &config.mode,
        &config.model(ModelRole::Responder).name,
    );

    repl.run().await
}

fn init_config(path: &Path) -> Result<()> {
    BotConfig::write_template(path)
        .with_context(|| format!("cannot write {}", path.display()))?;
    println!("{} {}", "Wrote default configuration to".green(), path.display());
    println!("Edit the API keys and models, then run: shopbuddy chat");
    Ok(())
}

fn show_config(path: &Path, config: &BotConfig) -> Result<()> {
    let masked = config.masked();

    println!("\n{}", "ShopBuddy Configuration".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    println!("File: {}", path.display());
    println!("Mode: {}\n", masked.mode);

    println!("Models:");
    for role in [ModelRole::Classifier, ModelRole::Responder, ModelRole::Validator] {
        let model = masked.model(role);
        println!(
            "  {:<11} {} via {} (temperature {}, max_tokens {})",
            role.as_str(),
            model.name,
            model.api_type.as_str(),
            model.temperature,
            model.max_tokens
        );
        let endpoint = masked.endpoint(model.api_type).unwrap_or("-");
        let key = masked.api_key(model.api_type).unwrap_or("-");
        println!("  {:<11} endpoint {} key {}", "", endpoint, key);
    }

    let settings = &masked.settings;
    println!("\nSettings:");
    println!("  debug_mode:           {}", settings.debug_mode);
    println!("  validation_threshold: {}", settings.validation_threshold);
    println!("  max_retries:          {}", settings.max_retries);
    println!("  retry_policy:         {:?}", settings.retry_policy);
    println!("  request_timeout_secs: {}", settings.request_timeout_secs);
    println!("  max_history_pairs:    {}", settings.max_history_pairs);
    match &settings.knowledge_file {
        Some(file) => println!("  knowledge_file:       {}", file.display()),
        None => println!("  knowledge_file:       (built-in corpus)"),
    }
    println!();

    Ok(())
}
