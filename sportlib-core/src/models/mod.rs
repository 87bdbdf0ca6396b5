mod location_data;
mod movement_type;
mod running_plan;
mod running_plan_entry;
mod running_unit;
mod track;
mod training;
mod training_type;
mod user;

pub use location_data::LocationData;
pub use movement_type::MovementType;
pub use running_plan::{next_monday, RunningPlan};
pub use running_plan_entry::RunningPlanEntry;
pub use running_unit::RunningUnit;
pub use track::Track;
pub use training::Training;
pub use training_type::TrainingType;
pub use user::User;
