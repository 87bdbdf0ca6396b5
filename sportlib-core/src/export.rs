//! JSON export in template format.

use crate::models::RunningPlan;
use crate::repository::Repository;
use crate::templates::{PlanTemplate, TemplateError};

/// Serializes every stored plan, ordered by `order` then name. The output can
/// be read back with [`crate::templates::import_plans_json`].
pub fn running_plans_json(repo: &Repository) -> Result<String, TemplateError> {
    let mut plans: Vec<RunningPlan> = repo.find_all()?;
    plans.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

    let templates: Vec<PlanTemplate> = plans.iter().map(PlanTemplate::from).collect();
    Ok(serde_json::to_string_pretty(&templates)?)
}
