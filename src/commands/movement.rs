use clap::{Args, Subcommand};

use super::OutputFormat;
use sportlib_core::{MovementType, Repository};

#[derive(Args)]
pub struct MovementCommand {
    #[command(subcommand)]
    pub command: MovementSubcommand,
}

#[derive(Subcommand)]
pub enum MovementSubcommand {
    /// List movement types
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl MovementCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MovementSubcommand::List { format } => {
                let mut movement_types: Vec<MovementType> = repo.find_all()?;
                movement_types.sort_by(|a, b| a.key.cmp(&b.key));

                if movement_types.is_empty() {
                    println!("No movement types found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&movement_types)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<4} {:<8} {:>10} {:>12}", "KEY", "COLOR", "km/h", "min/km");
                        for mt in &movement_types {
                            println!(
                                "{:<4} {:<8} {:>10.1} {:>12.2}",
                                mt.key, mt.color, mt.speed, mt.pace
                            );
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
