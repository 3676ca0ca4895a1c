//! BankChat CLI and REST API entry point.
//!
//! Binary name: `bankchat`
//!
//! Parses CLI arguments, loads configuration, then runs the requested
//! command or starts the chat API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use bankchat_infra::config::{default_config_path, load_config};
use bankchat_observe::{init_tracing, shutdown_tracing, verbosity_filter};
use bankchat_types::config::BankChatConfig;
use cli::{Cli, Commands, Overrides};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions need neither tracing nor config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "bankchat", &mut std::io::stdout());
        return Ok(());
    }

    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    init_tracing(verbosity_filter(cli.verbose, cli.quiet), otel)
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let base = load_config(&config_path).await;

    let result = match cli.command {
        Commands::Serve { overrides, .. } => serve(effective(base, &overrides), cli.quiet).await,
        Commands::Config { overrides } => cli::config::print_config(&effective(base, &overrides), cli.json),
        Commands::Emi {
            principal,
            rate,
            tenure,
            schedule,
        } => cli::emi::print_emi(principal, rate, tenure, schedule, cli.json),
        Commands::Completions { .. } => Ok(()),
    };

    shutdown_tracing();
    result
}

fn effective(mut config: BankChatConfig, overrides: &Overrides) -> BankChatConfig {
    overrides.apply(&mut config);
    config
}

async fn serve(config: BankChatConfig, quiet: bool) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::init(config)?;

    let cancel = CancellationToken::new();
    let reapers = state.reaper().spawn(cancel.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, model = %state.config.generator.model, "chat API listening");

    if !quiet {
        println!();
        println!(
            "  {} BankChat API listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!(
            "  {} generator: {} ({})",
            console::style("·").dim(),
            console::style(&state.config.generator.model).yellow(),
            state.config.generator.url
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let router = http::router::build_router(state);
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    for reaper in reapers {
        if let Err(e) = reaper.await {
            tracing::warn!(error = %e, "reaper task did not stop cleanly");
        }
    }

    served?;
    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
