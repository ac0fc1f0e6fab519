//! Triage policy commands: show, set.

use clap::Subcommand;
use tracing::info;

use crate::model::TriageConfig;
use crate::storage::Storage;

use super::format::format_config;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the triage policy in effect.
    Show,

    /// Change the triage policy. Unset options keep their current value.
    Set {
        /// Whether confident tickets may be resolved without a human.
        #[arg(long)]
        auto_close: Option<bool>,

        /// Minimum confidence to auto-close, between 0 and 1.
        #[arg(long)]
        threshold: Option<f64>,

        /// Hours before an unresolved ticket is overdue.
        #[arg(long)]
        sla_hours: Option<u32>,
    },
}

pub(super) fn run(command: ConfigCommand, storage: &Storage) -> Result<(), String> {
    match command {
        ConfigCommand::Show => cmd_show(storage),
        ConfigCommand::Set {
            auto_close,
            threshold,
            sla_hours,
        } => cmd_set(storage, auto_close, threshold, sla_hours),
    }
}

fn current(storage: &Storage) -> Result<Option<TriageConfig>, String> {
    storage
        .load_triage_config()
        .map_err(|e| format!("failed to load triage config: {e}"))
}

fn cmd_show(storage: &Storage) -> Result<(), String> {
    match current(storage)? {
        Some(config) => println!("{}", format_config(&config)),
        None => {
            println!("{}", format_config(&TriageConfig::default()));
            println!("(defaults; nothing saved yet)");
        }
    }
    Ok(())
}

fn cmd_set(
    storage: &Storage,
    auto_close: Option<bool>,
    threshold: Option<f64>,
    sla_hours: Option<u32>,
) -> Result<(), String> {
    if auto_close.is_none() && threshold.is_none() && sla_hours.is_none() {
        return Err("nothing to change: pass --auto-close, --threshold, or --sla-hours".into());
    }

    let mut config = current(storage)?.unwrap_or_default();
    if let Some(enabled) = auto_close {
        config.auto_close_enabled = enabled;
    }
    if let Some(threshold) = threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(hours) = sla_hours {
        config.sla_hours = hours;
    }
    config.validate()?;

    storage
        .save_triage_config(&config)
        .map_err(|e| format!("failed to save triage config: {e}"))?;
    info!(?config, "triage config updated");

    println!("{}", format_config(&config));
    Ok(())
}
