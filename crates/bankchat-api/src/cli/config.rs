//! `bankchat config` - Print the configuration the server would run with.

use anyhow::Result;

use bankchat_infra::config::render_config;
use bankchat_types::config::BankChatConfig;

const REDACTED: &str = "********";

pub fn print_config(config: &BankChatConfig, json: bool) -> Result<()> {
    let shown = redacted(config);
    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print!("{}", render_config(&shown)?);
    }
    Ok(())
}

fn redacted(config: &BankChatConfig) -> BankChatConfig {
    let mut shown = config.clone();
    if shown.generator.api_key.is_some() {
        shown.generator.api_key = Some(REDACTED.to_string());
    }
    shown
}
