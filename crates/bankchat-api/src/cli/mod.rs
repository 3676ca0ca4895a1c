//! CLI command definitions for the `bankchat` binary.
//!
//! Uses clap derive macros for argument parsing. Settings resolve in the
//! order flag, environment variable, config file, built-in default.

pub mod config;
pub mod emi;

use std::path::PathBuf;

use bankchat_types::config::BankChatConfig;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Banking chat assistant server.
#[derive(Parser)]
#[command(name = "bankchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the TOML config file.
    #[arg(long, global = true, env = "BANKCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat API server.
    Serve {
        #[command(flatten)]
        overrides: Overrides,

        /// Export spans to stdout through OpenTelemetry.
        #[arg(long)]
        otel: bool,
    },

    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Calculate a loan EMI and its amortization schedule.
    Emi {
        /// Loan amount.
        principal: f64,

        /// Annual interest rate in percent.
        rate: f64,

        /// Tenure in months.
        tenure: u32,

        /// Print the month-by-month schedule.
        #[arg(long)]
        schedule: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Settings that may override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Host to bind to.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Generator endpoint URL.
    #[arg(long, env = "LLAMA_URL")]
    pub llama_url: Option<String>,

    /// Generator model name.
    #[arg(long, env = "LLAMA_MODEL")]
    pub llama_model: Option<String>,

    /// Bearer key for hosted generator endpoints.
    #[arg(long, env = "LLAMA_API_KEY", hide_env_values = true)]
    pub llama_api_key: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut BankChatConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.llama_url {
            config.generator.url = url.clone();
        }
        if let Some(model) = &self.llama_model {
            config.generator.model = model.clone();
        }
        if let Some(key) = &self.llama_api_key {
            config.generator.api_key = Some(key.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut config = BankChatConfig::default();
        let overrides = Overrides {
            port: Some(9090),
            llama_model: Some("mistral".into()),
            ..Overrides::default()
        };

        overrides.apply(&mut config);

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, BankChatConfig::default().server.host);
        assert_eq!(config.generator.model, "mistral");
        assert!(config.generator.api_key.is_none());
    }

    #[test]
    fn emi_arguments_parse() {
        let cli = Cli::try_parse_from(["bankchat", "emi", "100000", "12", "24", "--schedule"]).unwrap();
        match cli.command {
            Commands::Emi {
                principal,
                rate,
                tenure,
                schedule,
            } => {
                assert_eq!(principal, 100_000.0);
                assert_eq!(rate, 12.0);
                assert_eq!(tenure, 24);
                assert!(schedule);
            }
            _ => panic!("expected emi command"),
        }
    }
}
