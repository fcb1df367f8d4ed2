// SPDX-FileCopyrightText: 2026 Fleetlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fleetlens - natural-language fleet-history analytics.
//!
//! Binary entry point: loads and validates configuration, wires the
//! composition root, and dispatches subcommands. Raw internal errors are
//! logged for operators but never shown to end users untranslated.

use clap::{Parser, Subcommand};
use fleetlens_core::FleetlensError;

mod ask;
mod context;
mod dashboard;

use context::AppContext;

/// Fleetlens - ask the fleet analytics service about fleet history.
#[derive(Parser, Debug)]
#[command(name = "fleetlens", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one natural-language question about fleet history.
    Ask {
        /// The question, e.g. "which vehicles idled the most last week?"
        question: String,
        /// Skip the cache for this call (ignored in demo mode).
        #[arg(long)]
        no_cache: bool,
    },
    /// Run every dashboard query sequentially and print a summary.
    Dashboard,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match fleetlens_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            fleetlens_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.runtime.log_level);

    let ctx = match AppContext::from_config(config) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("fleetlens: {}", user_message(&err));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Ask { question, no_cache }) => ask::run(&ctx, &question, no_cache).await,
        Some(Commands::Dashboard) => dashboard::run(&ctx).await,
        Some(Commands::Config) => {
            print_config(&ctx);
            Ok(())
        }
        None => {
            println!("fleetlens: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "command failed");
        eprintln!("fleetlens: {}", user_message(&err));
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fleetlens={log_level},warn")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_config(ctx: &AppContext) {
    let config = &ctx.config;
    println!("endpoint:        {}", config.service.endpoint);
    println!("service id:      {}", config.service.service_id);
    println!("fallback dir:    {}", config.cache.fallback_dir);
    println!("default ttl:     {}s", config.cache.default_ttl_secs);
    println!("demo mode:       {}", config.cache.demo_mode);
    println!(
        "poll budget:     {} attempts, {}ms warm-up, {}ms interval",
        config.protocol.poll_max_attempts,
        config.protocol.poll_first_delay_ms,
        config.protocol.poll_interval_ms
    );
}

/// Translate an internal failure into text fit for an end user.
fn user_message(err: &FleetlensError) -> String {
    match err {
        FleetlensError::Config(message) => format!("configuration problem: {message}"),
        FleetlensError::NoFallback { key } => {
            format!("no demo data is available for `{key}`")
        }
        FleetlensError::PollTimeout { .. } => {
            "the analytics service is taking too long; try again later".to_string()
        }
        FleetlensError::Transport { .. }
        | FleetlensError::Remote(_)
        | FleetlensError::Schema(_)
        | FleetlensError::EmptyResult(_)
        | FleetlensError::QueryFailed { .. } => {
            "fleet analytics is currently unavailable; try again later".to_string()
        }
        FleetlensError::Cache(_) | FleetlensError::Internal(_) => {
            "an unexpected internal problem occurred".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_never_leak_internals() {
        let err = FleetlensError::Schema("result.apiResult.results missing".into());
        let message = user_message(&err);
        assert!(!message.contains("apiResult"), "got: {message}");

        let err = FleetlensError::Transport {
            message: "connect ECONNREFUSED 10.1.2.3:443".into(),
            source: None,
        };
        assert!(!user_message(&err).contains("ECONNREFUSED"));
    }

    #[test]
    fn config_errors_keep_their_guidance() {
        let err = FleetlensError::Config("service.api_token is not set".into());
        assert!(user_message(&err).contains("api_token"));
    }
}
