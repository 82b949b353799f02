#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use quizbeat_server::config;
use quizbeat_server::logging;
use quizbeat_server::server;

/// Quizbeat -- in-memory coordinator for real-time music-trivia games
#[derive(Parser, Debug)]
#[command(name = "quizbeat-server")]
#[command(about = "In-memory WebSocket coordinator for real-time music-trivia games")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    /// Useful for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present; otherwise use code defaults.
    let cfg = config::load();

    // Handle --print-config: output the loaded configuration as JSON
    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    // config::load() already ran validation warn-only; capture the result
    // here to provide a proper exit code and to fail startup on bad config.
    let validation_result =
        config::validate_config(&cfg).map_err(|e| anyhow::anyhow!("invalid configuration:\n{e}"));

    // Handle --validate-config: exit after validation
    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  Game code length: {}", cfg.protocol.game_code_length);
                println!("  Idle room TTL: {} s", cfg.server.idle_room_ttl);
                println!("  Catalog mode: {:?}", cfg.catalog.mode);
                println!("  Catalog base URL: {}", cfg.catalog.base_url);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    // In normal operation, propagate validation errors
    validation_result?;

    // Initialize logging from config.
    logging::init_with_config(&cfg.logging);

    tracing::info!(port = cfg.port, "Starting Quizbeat server");

    server::run_server(cfg).await
}
