//! JSON templates: bundled reference data and running plans.
//!
//! The same format is used for the bundled first-run data, for plan files the
//! user imports and for [`crate::export`]. Units name their movement type by
//! key. Templates that carry ids can be imported repeatedly; the second import
//! updates instead of duplicating.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::Identifier;
use crate::models::{MovementType, RunningPlan, RunningPlanEntry, RunningUnit, TrainingType};
use crate::repository::{Repository, RepositoryError};

const BUNDLED_MOVEMENT_TYPES: &str = include_str!("../templates/movement_types.json");
const BUNDLED_TRAINING_TYPES: &str = include_str!("../templates/training_types.json");
const BUNDLED_RUNNING_PLANS: &str = include_str!("../templates/running_plans.json");

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Number of objects added by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub movement_types: usize,
    pub training_types: usize,
    pub running_plans: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementTypeTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub color: String,
    /// km/h
    #[serde(default)]
    pub speed: f64,
}

impl From<MovementTypeTemplate> for MovementType {
    fn from(t: MovementTypeTemplate) -> Self {
        let mut mt = MovementType::new(t.key, t.color, t.speed);
        if let Some(id) = t.id {
            mt.id = Identifier::from(id);
        }
        mt
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingTypeTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl From<TrainingTypeTemplate> for TrainingType {
    fn from(t: TrainingTypeTemplate) -> Self {
        let mut tt = TrainingType::new(t.name).with_remarks(t.remarks);
        tt.icon = t.icon;
        if let Some(id) = t.id {
            tt.id = Identifier::from(id);
        }
        tt
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub template: bool,
    #[serde(default)]
    pub entries: Vec<EntryTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub week: u32,
    pub day: u32,
    #[serde(default)]
    pub units: Vec<UnitTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// minutes
    pub duration: i64,
    /// Movement type key
    pub movement_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn id_or_new(id: Option<String>) -> Identifier {
    id.map(Identifier::from).unwrap_or_default()
}

impl PlanTemplate {
    /// Builds the plan graph. Movement type keys missing from `known` become
    /// new movement types carrying only their key.
    pub fn into_plan(self, known: &HashMap<String, MovementType>, today: NaiveDate) -> RunningPlan {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| entry.into_entry(known))
            .collect();

        let mut plan = RunningPlan::new(self.name, self.start_date.unwrap_or(today))
            .with_id(id_or_new(self.id))
            .with_remarks(self.remarks)
            .with_order(self.order)
            .with_entries(entries);
        plan.template = self.template;

        // Plans in progress keep their original start date
        if let Some(date) = self.start_date {
            if plan.is_active() {
                plan.start_date = date;
            }
        }
        plan
    }
}

impl EntryTemplate {
    fn into_entry(self, known: &HashMap<String, MovementType>) -> RunningPlanEntry {
        let units = self
            .units
            .into_iter()
            .map(|unit| {
                let movement_type = known.get(&unit.movement_type).cloned().unwrap_or_else(|| {
                    tracing::debug!("Unknown movement type '{}' in template", unit.movement_type);
                    MovementType::with_key(unit.movement_type.clone())
                });

                let mut running_unit = RunningUnit::new(unit.duration, movement_type)
                    .with_completed(unit.completed);
                running_unit.id = id_or_new(unit.id);
                if let (Some(min), Some(max)) = (unit.pulse_min, unit.pulse_max) {
                    running_unit = running_unit.with_pulse_range(min, max);
                }
                if let Some(pace) = unit.pace {
                    running_unit = running_unit.with_pace(pace);
                }
                running_unit
            })
            .collect();

        let mut entry = RunningPlanEntry::new(self.week, self.day).with_units(units);
        entry.id = id_or_new(self.id);
        entry.fixed_duration = self.fixed_duration;
        entry.distance = self.distance;
        entry.remarks = self.remarks;
        entry
    }
}

impl From<&RunningPlan> for PlanTemplate {
    fn from(plan: &RunningPlan) -> Self {
        Self {
            id: Some(plan.id.to_string()),
            name: plan.name.clone(),
            remarks: plan.remarks.clone(),
            order: plan.order,
            start_date: Some(plan.start_date),
            template: plan.template,
            entries: plan.entries.iter().map(EntryTemplate::from).collect(),
        }
    }
}

impl From<&RunningPlanEntry> for EntryTemplate {
    fn from(entry: &RunningPlanEntry) -> Self {
        Self {
            id: Some(entry.id.to_string()),
            week: entry.week,
            day: entry.day,
            units: entry
                .units
                .iter()
                .map(|unit| UnitTemplate {
                    id: Some(unit.id.to_string()),
                    duration: unit.duration,
                    movement_type: unit.movement_type.key.clone(),
                    completed: unit.completed,
                    pulse_min: unit.pulse_min,
                    pulse_max: unit.pulse_max,
                    pace: unit.pace,
                })
                .collect(),
            fixed_duration: entry.fixed_duration,
            distance: entry.distance,
            remarks: entry.remarks.clone(),
        }
    }
}

pub fn parse_movement_types(json: &str) -> Result<Vec<MovementType>, TemplateError> {
    let templates: Vec<MovementTypeTemplate> = serde_json::from_str(json)?;
    Ok(templates.into_iter().map(MovementType::from).collect())
}

pub fn parse_training_types(json: &str) -> Result<Vec<TrainingType>, TemplateError> {
    let templates: Vec<TrainingTypeTemplate> = serde_json::from_str(json)?;
    Ok(templates.into_iter().map(TrainingType::from).collect())
}

/// Parses running plans, resolving unit movement types against `known`.
pub fn parse_running_plans(
    json: &str,
    known: &[MovementType],
    today: NaiveDate,
) -> Result<Vec<RunningPlan>, TemplateError> {
    let templates: Vec<PlanTemplate> = serde_json::from_str(json)?;
    let by_key: HashMap<String, MovementType> = known
        .iter()
        .map(|mt| (mt.key.clone(), mt.clone()))
        .collect();

    Ok(templates
        .into_iter()
        .map(|t| t.into_plan(&by_key, today))
        .collect())
}

/// Adds the bundled movement types, training types and template plans.
pub fn import_bundled(repo: &Repository) -> Result<ImportSummary, TemplateError> {
    let movement_types = parse_movement_types(BUNDLED_MOVEMENT_TYPES)?;
    for mt in &movement_types {
        repo.add(mt)?;
    }

    let training_types = parse_training_types(BUNDLED_TRAINING_TYPES)?;
    for tt in &training_types {
        repo.add(tt)?;
    }

    let today = Local::now().date_naive();
    let plans = parse_running_plans(BUNDLED_RUNNING_PLANS, &movement_types, today)?;
    for plan in &plans {
        repo.add(&plan.clone().as_template())?;
    }

    let summary = ImportSummary {
        movement_types: movement_types.len(),
        training_types: training_types.len(),
        running_plans: plans.len(),
    };
    tracing::info!(
        "Imported {} movement types, {} training types, {} plans",
        summary.movement_types,
        summary.training_types,
        summary.running_plans
    );
    Ok(summary)
}

/// Adds the plans from a JSON document in template format. Returns the
/// number of plans added or updated.
pub fn import_plans_json(repo: &Repository, json: &str) -> Result<usize, TemplateError> {
    let known = repo.find_all::<MovementType>()?;
    let plans = parse_running_plans(json, &known, Local::now().date_naive())?;
    for plan in &plans {
        repo.add(plan)?;
    }
    tracing::info!("Imported {} plans", plans.len());
    Ok(plans.len())
}
