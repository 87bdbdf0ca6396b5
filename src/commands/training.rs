use chrono::{Local, NaiveTime, TimeZone, Utc};
use clap::{Args, Subcommand};

use super::{parse_date, OutputFormat};
use sportlib_core::{Repository, Training, TrainingType};

#[derive(Args)]
pub struct TrainingCommand {
    #[command(subcommand)]
    pub command: TrainingSubcommand,
}

#[derive(Subcommand)]
pub enum TrainingSubcommand {
    /// Record a training
    Add {
        /// Training name
        name: String,

        /// Training type (e.g. Running, Cycling); created if unknown
        #[arg(long = "type", short = 't', value_name = "TYPE", default_value = "Running")]
        training_type: String,

        /// Duration in minutes
        #[arg(long, short)]
        duration: i64,

        /// Distance in km
        #[arg(long)]
        distance: Option<f64>,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        remarks: Option<String>,
    },

    /// List recorded trainings, newest first
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only trainings of this type
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        training_type: Option<String>,
    },

    /// Delete a training. Its type and track are kept.
    Delete {
        /// Training ID
        id: String,
    },
}

impl TrainingCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TrainingSubcommand::Add {
                name,
                training_type,
                duration,
                distance,
                date,
                remarks,
            } => {
                let date = match date {
                    Some(d) => parse_date(d)?,
                    None => Local::now().date_naive(),
                };
                let timestamp = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));

                // Existing types are looked up so the output shows the stored one
                let training_type = repo
                    .find_by_key::<TrainingType>(training_type)?
                    .unwrap_or_else(|| TrainingType::new(training_type.clone()));

                let mut training = Training::new(timestamp, name.clone(), training_type)
                    .with_duration(*duration);
                if let Some(km) = distance {
                    training = training.with_distance(*km);
                }
                if let Some(r) = remarks {
                    training = training.with_remarks(r.clone());
                }

                repo.add(&training)?;
                println!("Recorded training:");
                println!("{}", training);
                println!("ID: {}", training.id);
                Ok(())
            }

            TrainingSubcommand::List {
                format,
                training_type,
            } => {
                let mut trainings: Vec<Training> = match training_type {
                    Some(tt) => repo.find_by_attribute("training_type", tt.as_str())?,
                    None => repo.find_all()?,
                };
                trainings.sort_by(|a, b| b.date.cmp(&a.date));

                if trainings.is_empty() {
                    println!("No trainings found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&trainings)?);
                    }
                    OutputFormat::Text => {
                        for training in &trainings {
                            println!("{}", training);
                            println!("    {}", training.id);
                        }
                        let minutes: i64 = trainings.iter().map(|t| t.duration).sum();
                        let km: f64 = trainings.iter().map(|t| t.distance_km()).sum();
                        println!(
                            "\nTotal: {} training(s), {} min, {:.2} km",
                            trainings.len(),
                            minutes,
                            km
                        );
                    }
                }
                Ok(())
            }

            TrainingSubcommand::Delete { id } => {
                let training = repo
                    .find_by_key::<Training>(id)?
                    .ok_or_else(|| format!("Training not found: {}", id))?;
                repo.delete(&training)?;
                println!("Deleted training '{}'", training.name);
                Ok(())
            }
        }
    }
}
