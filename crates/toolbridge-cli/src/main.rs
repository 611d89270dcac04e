//! toolbridge CLI
//!
//! Asks a function-calling model a question, letting it call tools discovered
//! on an MCP server, and prints the grounded answer.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use toolbridge_core::{
    resolve_api_key, BridgeConfig, ConfigFile, EnvSecretStore, GenaiInvoker, Logger,
    McpConnector, Orchestrator, TracingLogger,
};

#[derive(Parser, Debug)]
#[command(name = "toolbridge")]
#[command(about = "Answer questions with tools discovered from an MCP server", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tool registry endpoint (http(s)://… or unix:///path)
    #[arg(long, global = true)]
    registry: Option<String>,

    /// Model identifier, e.g. gemini-2.5-flash or openai/gpt-4o
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the model, letting it call a tool
    Ask {
        /// Prompt; falls back to the configured prompt or TOOLBRIDGE_PROMPT
        prompt: Option<String>,
    },
    /// List the tools the registry offers
    Tools,
    /// Call a tool directly, without the model
    Call {
        /// Tool name
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<BridgeConfig> {
    let file = match &cli.config {
        Some(path) => ConfigFile::new(path),
        None => ConfigFile::user(),
    };
    if cli.config.is_some() && !file.exists() {
        bail!("config file not found: {}", file.path().display());
    }

    let mut config = file.load()?;
    config.apply_env();

    if let Some(registry) = &cli.registry {
        config.registry.endpoint = Some(registry.clone());
    }
    if let Some(model) = &cli.model {
        config.model.id = model.clone();
    }

    config.validate()?;
    Ok(config)
}

fn parse_args(raw: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str(raw).context("--args is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("--args must be a JSON object, got {}", other)),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new());

    let connector = McpConnector::new(config.endpoint()?, Arc::clone(&logger))
        .with_client_name(config.registry.client_name.clone());

    // Only `ask` needs a model; keep `tools` and `call` usable without credentials
    let api_key = match &cli.command {
        Commands::Ask { .. } => {
            let provider = config.model.provider();
            match resolve_api_key(&EnvSecretStore::new(), provider) {
                Ok(key) => Some(key),
                Err(e) if config.model.api_base.is_some() => {
                    tracing::debug!("{}; continuing against custom api_base", e);
                    None
                }
                Err(e) => return Err(e.into()),
            }
        }
        _ => None,
    };
    let model = GenaiInvoker::new(
        config.model.id.clone(),
        api_key,
        config.model.api_base.clone(),
        Arc::clone(&logger),
    );

    let orchestrator = Orchestrator::new(
        Arc::new(connector),
        Arc::new(model),
        config.orchestrator_options(),
        logger,
    );

    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    match cli.command {
        Commands::Ask { prompt } => {
            let prompt = prompt
                .or_else(|| config.prompt.clone())
                .ok_or_else(|| {
                    anyhow!(
                        "no prompt given: pass one, set `prompt` in the config, \
                         or TOOLBRIDGE_PROMPT"
                    )
                })?;

            let report = orchestrator.run(&prompt).await?;
            for exchange in &report.exchanges {
                match &exchange.error {
                    None => tracing::info!("called {}", exchange.call.name),
                    Some(e) => tracing::warn!("call to {} failed: {}", exchange.call.name, e),
                }
            }
            println!("{}", report.text.trim_end());
        }
        Commands::Tools => {
            let tools = orchestrator.list_tools().await?;
            if tools.is_empty() {
                println!("No tools available.");
            }
            for tool in tools {
                println!("{}", tool.name);
                if !tool.description.is_empty() {
                    println!("  {}", tool.description);
                }
                let schema = serde_json::to_string_pretty(&tool.input_schema)?;
                for line in schema.lines() {
                    println!("  {}", line);
                }
            }
        }
        Commands::Call { name, args } => {
            let args = parse_args(&args)?;
            let response = orchestrator.call_tool_directly(&name, args).await?;
            match response.text_payload() {
                Some(text) => println!("{}", text),
                None => println!("{}", Value::Object(response.response)),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = parse_args(r#"{"city":"nyc"}"#).unwrap();
        assert_eq!(args["city"], "nyc");

        assert!(parse_args("[1,2]").is_err());
        assert!(parse_args("not json").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "toolbridge",
            "--registry",
            "http://localhost:8000",
            "ask",
            "What is the time in ny?",
        ])
        .unwrap();
        assert_eq!(cli.registry.as_deref(), Some("http://localhost:8000"));
        assert!(matches!(cli.command, Commands::Ask { prompt: Some(_) }));

        let cli =
            Cli::try_parse_from(["toolbridge", "call", "cityTime", "--args", r#"{"city":"sf"}"#])
                .unwrap();
        assert!(matches!(cli.command, Commands::Call { ref name, .. } if name == "cityTime"));
    }
}
