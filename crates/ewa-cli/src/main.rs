//! Ewa CLI - Command-line interface
//!
//! Usage:
//!   ewa ask <question>
//!   ewa invoke [--event <file>] [--json <event>]
//!
//! Both commands run the same handler as the server and Lambda entry
//! points, against the services named in the environment.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ewa_api::{handle_event, response::AskRequest, AppState, GatewayResponse};
use ewa_core::config::AppConfig;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ewa")]
#[command(about = "Ewa customer support assistant CLI")]
#[command(version)]
struct Cli {
    /// TOML config file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a support question and print the answer
    Ask {
        /// Question to ask
        question: String,
    },
    /// Run a raw event through the handler and print the response envelope
    Invoke {
        /// Read the event from a JSON file
        #[arg(long, conflicts_with = "json")]
        event: Option<PathBuf>,

        /// Pass the event inline
        #[arg(long)]
        json: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::load()?,
    };

    // Logs go to stderr so stdout carries only the result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask { question } => {
            let event = serde_json::to_value(AskRequest {
                question: Some(question),
                message: None,
            })?;
            let state = AppState::initialize(config).await?;
            let response = handle_event(&state, event).await;
            println!("{}", render_answer(&response)?);
        }
        Commands::Invoke { event, json } => {
            let raw = match (event, json) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, Some(inline)) => inline,
                (None, None) => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let event = parse_event(&raw)?;
            let state = AppState::initialize(config).await?;
            let response = handle_event(&state, event).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn parse_event(raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw.trim()).context("event is not valid JSON")
}

/// Extract the answer from a 200 envelope, or fail with the error body
fn render_answer(response: &GatewayResponse) -> anyhow::Result<String> {
    let body: Value = serde_json::from_str(&response.body)
        .with_context(|| format!("unexpected response body: {}", response.body))?;

    match (response.status_code, body.get("answer").and_then(Value::as_str)) {
        (200, Some(answer)) => Ok(answer.to_string()),
        (status, _) => {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            bail!("request failed with status {status}: {error}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        let event = parse_event("  {\"question\": \"Hours?\"}\n").unwrap();
        assert_eq!(event["question"], "Hours?");
        assert!(parse_event("not json").is_err());
    }

    #[test]
    fn test_render_answer() {
        let ok = GatewayResponse::answer("Open 9 to 5.");
        assert_eq!(render_answer(&ok).unwrap(), "Open 9 to 5.");

        let failed = GatewayResponse::internal_error("LLM error: timeout");
        let err = render_answer(&failed).unwrap_err().to_string();
        assert!(err.contains("500"));
        assert!(err.contains("LLM error: timeout"));
    }

    #[test]
    fn test_cli_parses_invoke() {
        let cli = Cli::try_parse_from(["ewa", "invoke", "--json", "{}"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Invoke { json: Some(_), event: None }
        ));
        assert!(Cli::try_parse_from(["ewa", "invoke", "--json", "{}", "--event", "e.json"]).is_err());
    }
}
