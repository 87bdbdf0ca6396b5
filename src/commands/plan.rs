use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};

use super::{parse_date, OutputFormat};
use sportlib_core::{Identifier, Repository, RunningPlan};

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// List running plans
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show templates
        #[arg(long)]
        templates: bool,
    },

    /// Show a plan with its schedule
    Show {
        /// Plan ID or name
        plan: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Start a plan and make it the active one. Templates are copied first.
    Start {
        /// Plan ID or name
        plan: String,

        /// Start date (YYYY-MM-DD), moved to the following Monday; defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Mark a training day of a plan as done
    Complete {
        /// Plan ID or name
        plan: String,

        #[arg(long, short)]
        week: u32,

        #[arg(long, short)]
        day: u32,
    },

    /// Delete a plan with its entries and units
    Delete {
        /// Plan ID or name
        plan: String,

        /// Also delete templates
        #[arg(long, short)]
        force: bool,
    },
}

impl PlanCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            PlanSubcommand::List { format, templates } => {
                let mut plans: Vec<RunningPlan> = repo.find_all()?;
                if *templates {
                    plans.retain(|p| p.template);
                }
                plans.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

                if plans.is_empty() {
                    println!("No plans found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&plans)?);
                    }
                    OutputFormat::Text => {
                        let active = active_plan_id(repo)?;
                        for plan in &plans {
                            let marker = if active.as_ref() == Some(&plan.id) { "*" } else { " " };
                            let (done, total) = plan.progress();
                            let tag = if plan.template { " [template]" } else { "" };
                            println!(
                                "{} {:>2}  {}  ({}/{} days, from {}){}",
                                marker, plan.order, plan.name, done, total, plan.start_date, tag
                            );
                            println!("       {}", plan.id);
                        }
                        println!("\nTotal: {} plan(s)", plans.len());
                    }
                }
                Ok(())
            }

            PlanSubcommand::Show { plan, format } => {
                let plan = resolve_plan(repo, plan)?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                    OutputFormat::Text => {
                        println!("{}", plan);
                        if let Some(next) = plan.next_entry() {
                            println!("Next: {} (week {} day {})", plan.entry_date(next), next.week, next.day);
                        } else if plan.is_completed() {
                            println!("Plan completed");
                        }
                    }
                }
                Ok(())
            }

            PlanSubcommand::Start { plan, date } => {
                let plan = resolve_plan(repo, plan)?;
                let date = match date {
                    Some(d) => parse_date(d)?,
                    None => Local::now().date_naive(),
                };

                let started = start_plan(repo, &plan, date)?;
                println!("Started plan '{}' on {}", started.name, started.start_date);
                println!("ID: {}", started.id);
                Ok(())
            }

            PlanSubcommand::Complete { plan, week, day } => {
                let plan = resolve_plan(repo, plan)?;
                let plan = complete_day(repo, plan, *week, *day)?;

                let (done, total) = plan.progress();
                println!("Completed week {} day {} ({}/{} days)", week, day, done, total);
                if plan.is_completed() {
                    println!("Plan '{}' completed", plan.name);
                }
                Ok(())
            }

            PlanSubcommand::Delete { plan, force } => {
                let plan = resolve_plan(repo, plan)?;
                delete_plan(repo, &plan, *force)?;
                println!("Deleted plan '{}'", plan.name);
                Ok(())
            }
        }
    }
}

fn active_plan_id(repo: &Repository) -> Result<Option<Identifier>, Box<dyn std::error::Error>> {
    Ok(repo.user()?.and_then(|u| u.active_plan_id))
}

/// Finds a plan by ID, then by exact name.
pub(crate) fn resolve_plan(
    repo: &Repository,
    identifier: &str,
) -> Result<RunningPlan, Box<dyn std::error::Error>> {
    if let Some(plan) = repo.find_by_key::<RunningPlan>(identifier)? {
        return Ok(plan);
    }

    let mut matches: Vec<RunningPlan> = repo.find_by_attribute("name", identifier)?;
    match matches.len() {
        0 => Err(format!("Plan not found: {}", identifier).into()),
        1 => Ok(matches.remove(0)),
        n => Err(format!("{} plans are named '{}'. Use the plan ID.", n, identifier).into()),
    }
}

/// Stores a startable copy of `plan` and makes it the user's active plan.
pub(crate) fn start_plan(
    repo: &Repository,
    plan: &RunningPlan,
    date: NaiveDate,
) -> Result<RunningPlan, Box<dyn std::error::Error>> {
    let started = if plan.template {
        plan.fresh_copy(date)
    } else {
        let mut plan = plan.clone();
        if !plan.set_start_date(date) {
            println!("Plan is already in progress, keeping start date {}", plan.start_date);
        }
        plan
    };
    repo.add(&started)?;

    match repo.user()? {
        Some(mut user) => {
            user.active_plan_id = Some(started.id.clone());
            repo.update(&user)?;
        }
        None => tracing::warn!("No user set up, plan not marked active. Run 'sportlib init --name <name>'."),
    }
    Ok(started)
}

pub(crate) fn complete_day(
    repo: &Repository,
    mut plan: RunningPlan,
    week: u32,
    day: u32,
) -> Result<RunningPlan, Box<dyn std::error::Error>> {
    if plan.template {
        return Err(format!("Plan '{}' is a template. Start it first.", plan.name).into());
    }
    if !plan.complete_entry(week, day) {
        return Err(format!("Plan '{}' has no entry for week {} day {}", plan.name, week, day).into());
    }
    repo.update(&plan)?;
    Ok(plan)
}

pub(crate) fn delete_plan(
    repo: &Repository,
    plan: &RunningPlan,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if plan.template && !force {
        return Err(format!("Plan '{}' is a template. Use --force to delete it.", plan.name).into());
    }
    repo.delete(plan)?;

    if let Some(mut user) = repo.user()? {
        if user.active_plan_id.as_ref() == Some(&plan.id) {
            user.active_plan_id = None;
            repo.update(&user)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::set_user_name;
    use sportlib_core::{MovementType, RunningPlanEntry, RunningUnit};
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Repository, TempDir, RunningPlan) {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::open(temp_dir.path().to_path_buf()).unwrap();
        let template = RunningPlan::new("Base", date(2025, 3, 3))
            .as_template()
            .with_entries(vec![
                RunningPlanEntry::new(1, 1)
                    .with_units(vec![RunningUnit::new(20, MovementType::with_key("L"))]),
                RunningPlanEntry::new(1, 3)
                    .with_units(vec![RunningUnit::new(25, MovementType::with_key("L"))]),
            ]);
        repo.add(&template).unwrap();
        (repo, temp_dir, template)
    }

    #[test]
    fn test_resolve_plan_by_id_and_name() {
        let (repo, _temp, template) = setup();

        assert_eq!(resolve_plan(&repo, template.id.as_str()).unwrap().id, template.id);
        assert_eq!(resolve_plan(&repo, "Base").unwrap().id, template.id);
        assert!(resolve_plan(&repo, "Missing").is_err());
    }

    #[test]
    fn test_start_template_creates_copy() {
        let (repo, _temp, template) = setup();
        set_user_name(&repo, "Sam").unwrap();

        let started = start_plan(&repo, &template, date(2025, 4, 2)).unwrap();

        assert_ne!(started.id, template.id);
        assert_eq!(started.start_date, date(2025, 4, 7));
        assert_eq!(repo.count("RunningPlan").unwrap(), 2);
        assert_eq!(repo.user().unwrap().unwrap().active_plan_id, Some(started.id.clone()));

        // Name is now ambiguous
        assert!(resolve_plan(&repo, "Base").is_err());
    }

    #[test]
    fn test_complete_day_persists() {
        let (repo, _temp, template) = setup();
        let started = start_plan(&repo, &template, date(2025, 4, 2)).unwrap();

        complete_day(&repo, started.clone(), 1, 1).unwrap();
        let stored = resolve_plan(&repo, started.id.as_str()).unwrap();
        assert!(stored.is_active());
        assert_eq!(stored.progress(), (1, 2));

        assert!(complete_day(&repo, stored, 5, 5).is_err());
        assert!(complete_day(&repo, template, 1, 1).is_err());
    }

    #[test]
    fn test_delete_plan_protects_templates_and_clears_active() {
        let (repo, _temp, template) = setup();
        set_user_name(&repo, "Sam").unwrap();
        let started = start_plan(&repo, &template, date(2025, 4, 2)).unwrap();

        assert!(delete_plan(&repo, &template, false).is_err());

        delete_plan(&repo, &started, false).unwrap();
        assert_eq!(repo.user().unwrap().unwrap().active_plan_id, None);
        assert_eq!(repo.count("RunningUnit").unwrap(), 2);

        delete_plan(&repo, &template, true).unwrap();
        assert_eq!(repo.count("RunningPlan").unwrap(), 0);
        assert_eq!(repo.count("RunningUnit").unwrap(), 0);
        assert_eq!(repo.count("MovementType").unwrap(), 1);
    }
}
