//! Command-line weather assistant
//!
//! Loads configuration, registers the weather tools, and either answers one
//! prompt given on the command line or runs an interactive session on stdin.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use weather_agent::config::AppConfig;
use weather_agent::llm::{create_provider, ConversationOrchestrator, DispatchMode, ToolRegistry};
use weather_agent::repl::Repl;
use weather_agent::weather::{register_weather_tools, WeatherClient};

#[derive(Debug, Parser)]
#[command(name = "weather-agent", version, about = "Ask a Gemini model about the weather")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Gemini model id, overriding GEMINI_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Let the model write the answer from the tool output instead of
    /// returning the output directly
    #[arg(long)]
    summarize: bool,

    /// Answer this prompt and exit instead of starting a session
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // A missing .env file is fine; the variables may already be exported
    let _ = dotenvy::dotenv();

    let mut config = AppConfig::from_env().context("Configuration error")?;
    if let Some(model) = cli.model {
        config.gemini.model = model.parse().unwrap_or_default();
    }
    if cli.summarize {
        config.agent.dispatch_mode = DispatchMode::Summarize;
    }
    info!(model = %config.gemini.model, mode = ?config.agent.dispatch_mode, "Starting weather agent");

    let weather = Arc::new(WeatherClient::new(&config.weather).context("Failed to build weather client")?);
    let mut registry = ToolRegistry::new();
    register_weather_tools(&mut registry, weather)?;

    let provider = create_provider(&config.gemini)?;
    let mut orchestrator = ConversationOrchestrator::new(provider, Box::new(registry), &config.agent);

    if let Some(prompt) = cli.prompt {
        let reply = orchestrator.respond(prompt).await?;
        println!("{}", reply);
        return Ok(());
    }

    println!("Ask about current weather, air quality, or a forecast.");
    println!("Type 'exit', 'quit' or 'bye' (or Ctrl+D) to leave.\n");

    let mut repl = Repl::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let answered = repl.run(&mut orchestrator).await?;
    repl.into_output().flush().await?;

    let usage = orchestrator.session().usage();
    info!(
        prompts = answered,
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "Session ended"
    );
    Ok(())
}
