//! Configuration management commands.

use std::path::PathBuf;

use beatvault_cli::StoreBackend;
use clap::{Args, Subcommand};
use serde::Serialize;

use super::{get_config, output_result, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Configuration is stored in ~/.beatvault/beatvault/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// View the current configuration
    Show,
    /// Switch the content store backend
    #[command(name = "set-store")]
    SetStore {
        /// Backend: file, redb or memory
        backend: StoreBackend,
        /// Store location (default: next to the config file)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ConfigView<'a> {
    config_file: String,
    store_path: String,
    #[serde(flatten)]
    config: &'a beatvault_cli::Config,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                let cfg = get_config(cli)?;
                output_result(
                    cli,
                    &ConfigView {
                        config_file: cfg.path().display().to_string(),
                        store_path: cfg.store_path().display().to_string(),
                        config: &cfg,
                    },
                )
            }

            ConfigSubcommand::SetStore { backend, path } => {
                let mut cfg = get_config(cli)?;
                cfg.set_store(*backend, path.clone())?;
                print_success(&format!(
                    "Store set to {:?} at {}",
                    backend,
                    cfg.store_path().display()
                ));
                Ok(())
            }
        }
    }
}
