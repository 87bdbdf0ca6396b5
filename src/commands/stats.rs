use clap::Args;
use serde::Serialize;

use super::OutputFormat;
use sportlib_core::{EntityKind, Repository, RepositoryError};

#[derive(Args)]
pub struct StatsCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct KindCount {
    pub kind: String,
    pub collection: &'static str,
    pub count: usize,
}

impl StatsCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        let counts = record_counts(repo)?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&counts)?),
            OutputFormat::Text => {
                for row in &counts {
                    println!("{:<18} {:>6}", row.kind, row.count);
                }
                let total: usize = counts.iter().map(|r| r.count).sum();
                println!("{:<18} {:>6}", "Total", total);
            }
        }
        Ok(())
    }
}

pub(crate) fn record_counts(repo: &Repository) -> Result<Vec<KindCount>, RepositoryError> {
    EntityKind::ALL
        .iter()
        .map(|kind| -> Result<KindCount, RepositoryError> {
            Ok(KindCount {
                kind: kind.to_string(),
                collection: kind.collection(),
                count: repo.count(kind.collection())?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sportlib_core::{MovementType, TrainingType};
    use tempfile::TempDir;

    #[test]
    fn test_record_counts() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::open(temp_dir.path().to_path_buf()).unwrap();
        repo.add(&MovementType::with_key("L")).unwrap();
        repo.add(&MovementType::with_key("G")).unwrap();
        repo.add(&TrainingType::new("Running")).unwrap();

        let counts = record_counts(&repo).unwrap();
        assert_eq!(counts.len(), EntityKind::ALL.len());

        let find = |kind: &str| counts.iter().find(|c| c.kind == kind).unwrap().count;
        assert_eq!(find("MovementType"), 2);
        assert_eq!(find("TrainingType"), 1);
        assert_eq!(find("Training"), 0);
    }
}
