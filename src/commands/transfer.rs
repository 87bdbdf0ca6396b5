use clap::{Args, Subcommand};
use std::fs;
use std::path::PathBuf;

use sportlib_core::{export, templates, Repository};

#[derive(Args)]
pub struct ExportCommand {
    #[command(subcommand)]
    pub command: ExportSubcommand,
}

#[derive(Subcommand)]
pub enum ExportSubcommand {
    /// Export all running plans as JSON
    Plans {
        /// Output file, stdout if omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

impl ExportCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ExportSubcommand::Plans { output } => {
                let json = export::running_plans_json(repo)?;
                match output {
                    Some(path) => {
                        fs::write(path, json)?;
                        println!("Exported plans to {}", path.display());
                    }
                    None => println!("{}", json),
                }
                Ok(())
            }
        }
    }
}

#[derive(Args)]
pub struct ImportCommand {
    #[command(subcommand)]
    pub command: ImportSubcommand,
}

#[derive(Subcommand)]
pub enum ImportSubcommand {
    /// Import running plans from a JSON file in export format
    Plans {
        /// JSON file
        file: PathBuf,
    },
}

impl ImportCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ImportSubcommand::Plans { file } => {
                let json = fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let count = templates::import_plans_json(repo, &json)?;
                println!("Imported {} plan(s) from {}", count, file.display());
                Ok(())
            }
        }
    }
}
