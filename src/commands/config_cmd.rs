use clap::{Args, Subcommand};
use std::fs;

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a config file with the default values
    Init,
}

const DEFAULT_CONFIG: &str = r#"# sportlib configuration

# Directory holding the library data (default: ~/.local/share/<library_name>)
# data_dir: ~/.local/share/sportlib

# Library name
library_name: sportlib
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        match &config.config_file {
                            Some(path) => println!("Config file: {}", path.display()),
                            None => println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            ),
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("library_name: {}", config.library_name.value);
                        println!("  source: {}", config.library_name.source);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = Config::default_config_path();
                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&config_path, DEFAULT_CONFIG)?;

                println!("Created config file: {}", config_path.display());
                Ok(())
            }
        }
    }
}
