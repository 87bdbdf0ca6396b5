use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::running_unit::RunningUnit;
use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

/// One training day of a running plan.
///
/// Week numbers start at 1; day numbers are 1 (Monday) to 7 (Sunday). Out of
/// range values are clamped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunningPlanEntry {
    pub id: Identifier,
    pub week: u32,
    pub day: u32,
    pub units: Vec<RunningUnit>,
    /// Fixed duration in minutes for imported plans
    pub fixed_duration: Option<i64>,
    /// km
    pub distance: Option<f64>,
    pub remarks: Option<String>,
}

impl RunningPlanEntry {
    pub fn new(week: u32, day: u32) -> Self {
        Self {
            id: Identifier::new(),
            week: week.max(1),
            day: day.clamp(1, 7),
            units: Vec::new(),
            fixed_duration: None,
            distance: None,
            remarks: None,
        }
    }

    pub fn with_units(mut self, units: Vec<RunningUnit>) -> Self {
        self.units = units;
        self
    }

    pub fn with_fixed_duration(mut self, minutes: i64) -> Self {
        self.fixed_duration = Some(minutes);
        self
    }

    pub fn with_distance(mut self, km: f64) -> Self {
        self.distance = Some(km);
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn set_week(&mut self, week: u32) {
        self.week = week.max(1);
    }

    pub fn set_day(&mut self, day: u32) {
        self.day = day.clamp(1, 7);
    }

    pub fn add_unit(&mut self, unit: RunningUnit) {
        self.units.push(unit);
    }

    /// Total minutes: the sum of the units, or the fixed duration if it is larger.
    pub fn duration(&self) -> i64 {
        let sum: i64 = self.units.iter().map(|u| u.duration).sum();
        match self.fixed_duration {
            Some(fixed) if fixed > sum => fixed,
            _ => sum,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.units.iter().all(|u| u.completed)
    }

    /// True if at least one unit has been completed.
    pub fn is_started(&self) -> bool {
        self.units.iter().any(|u| u.completed)
    }

    /// Marks all units as completed (or not).
    pub fn set_completed(&mut self, completed: bool) {
        for unit in &mut self.units {
            unit.completed = completed;
        }
    }

    /// Orders entries by week, then day.
    pub fn cmp_schedule(&self, other: &Self) -> Ordering {
        (self.week, self.day).cmp(&(other.week, other.day))
    }
}

impl fmt::Display for RunningPlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Week {} Day {}: {} min",
            self.week,
            self.day,
            self.duration()
        )?;
        if self.is_completed() && !self.units.is_empty() {
            write!(f, " (done)")?;
        }
        for unit in &self.units {
            write!(f, "\n    {}", unit)?;
        }
        if let Some(remarks) = &self.remarks {
            write!(f, "\n    {}", remarks)?;
        }
        Ok(())
    }
}

impl Entity for RunningPlanEntry {
    const KIND: EntityKind = EntityKind::RunningPlanEntry;

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("week", self.week)
            .with("day", self.day)
            .with_ids("unit_ids", self.units.iter().map(|u| &u.id))
            .with("fixed_duration", self.fixed_duration)
            .with("distance", self.distance)
            .with("remarks", self.remarks.clone())
    }

    /// Units are left empty; they are resolved through `unit_ids`.
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        let week = record.require_int("week")?;
        let day = record.require_int("day")?;

        let mut entry = Self::new(week.clamp(1, i64::from(u32::MAX)) as u32, day.clamp(1, 7) as u32);
        entry.id = record.require_id("id")?;
        entry.fixed_duration = record.int("fixed_duration");
        entry.distance = record.float("distance");
        entry.remarks = record.text("remarks");
        Ok(entry)
    }
}
