//! `config show|init|path`.

use std::path::PathBuf;

use clap::Subcommand;

use super::Outcome;
use crate::output::{print_details, print_json};
use libris_client::{ClientConfig, ClientError, ClientResult};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config, session and demo database locations
    Path,
}

pub fn run(
    cmd: &ConfigCommand,
    config: &ClientConfig,
    config_path: Option<PathBuf>,
    json: bool,
) -> ClientResult<Outcome> {
    match cmd {
        ConfigCommand::Show => {
            if json {
                print_json(config)?;
            } else {
                let text = toml::to_string_pretty(config)
                    .map_err(|e| ClientError::Config(e.to_string()))?;
                print!("{}", text);
            }
        }

        ConfigCommand::Init { force } => {
            let target = config_path
                .or_else(ClientConfig::default_config_path)
                .ok_or_else(|| ClientError::Config("No config path available".into()))?;
            if target.exists() && !force {
                return Err(ClientError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                )));
            }
            let written = config.save(Some(target))?;
            println!("Wrote {}", written.display());
        }

        ConfigCommand::Path => {
            let show = |p: Option<PathBuf>| {
                p.map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".to_string())
            };
            let rows = [
                (
                    "Config file",
                    show(config_path.clone().or_else(ClientConfig::default_config_path)),
                ),
                ("Session file", show(config.session_path())),
                ("Demo database", show(config.demo.database_path.clone())),
            ];
            if json {
                print_json(&rows.iter().cloned().collect::<std::collections::BTreeMap<_, _>>())?;
            } else {
                print_details(&rows);
            }
        }
    }
    Ok(Outcome::Done)
}
