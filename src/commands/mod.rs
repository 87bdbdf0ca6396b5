mod config_cmd;
mod init;
mod movement;
mod plan;
mod stats;
mod training;
mod transfer;

pub use config_cmd::ConfigCommand;
pub use init::InitCommand;
pub use movement::MovementCommand;
pub use plan::PlanCommand;
pub use stats::StatsCommand;
pub use training::TrainingCommand;
pub use transfer::{ExportCommand, ImportCommand};

use chrono::NaiveDate;
use clap::ValueEnum;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-03-03").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
        );
        assert!(parse_date("03/03/2025").unwrap_err().contains("YYYY-MM-DD"));
    }
}
