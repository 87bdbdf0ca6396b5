use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::running_plan_entry::RunningPlanEntry;
use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

/// A multi-week running plan made of training days.
///
/// A plan is active once any unit of any entry has been completed. The start
/// date of a plan that is not active always falls on a Monday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunningPlan {
    pub id: Identifier,
    pub name: String,
    pub remarks: String,
    /// Position in the default plan sequence
    pub order: i64,
    pub start_date: NaiveDate,
    /// Bundled plans are templates and must not be edited or deleted by callers
    pub template: bool,
    pub entries: Vec<RunningPlanEntry>,
}

impl RunningPlan {
    pub fn new(name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id: Identifier::new(),
            name: name.into(),
            remarks: String::new(),
            order: 0,
            start_date: next_monday(start_date),
            template: false,
            entries: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Identifier>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn as_template(mut self) -> Self {
        self.template = true;
        self
    }

    pub fn with_entries(mut self, entries: Vec<RunningPlanEntry>) -> Self {
        self.entries = entries;
        self.sort_entries();
        self
    }

    pub fn add_entry(&mut self, entry: RunningPlanEntry) {
        self.entries.push(entry);
        self.sort_entries();
    }

    pub fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| a.cmp_schedule(b));
    }

    pub fn is_active(&self) -> bool {
        self.entries.iter().any(|e| e.is_started())
    }

    pub fn is_completed(&self) -> bool {
        self.entries.iter().all(|e| e.is_completed())
    }

    /// Moves the start date forward to the next Monday. Ignored while the plan is active.
    ///
    /// Returns whether the start date was changed.
    pub fn set_start_date(&mut self, date: NaiveDate) -> bool {
        if self.is_active() {
            tracing::debug!("Plan '{}' is active, keeping start date {}", self.name, self.start_date);
            return false;
        }
        self.start_date = next_monday(date);
        true
    }

    /// Total duration of all entries in minutes.
    pub fn duration(&self) -> i64 {
        self.entries.iter().map(|e| e.duration()).sum()
    }

    /// Number of weeks covered by the entries.
    pub fn weeks(&self) -> u32 {
        self.entries.iter().map(|e| e.week).max().unwrap_or(0)
    }

    /// Calendar date of an entry relative to the plan's start date.
    pub fn entry_date(&self, entry: &RunningPlanEntry) -> NaiveDate {
        let offset = u64::from(entry.week.saturating_sub(1)) * 7 + u64::from(entry.day.saturating_sub(1));
        self.start_date
            .checked_add_days(Days::new(offset))
            .unwrap_or(self.start_date)
    }

    /// First entry in schedule order that is not completed yet.
    pub fn next_entry(&self) -> Option<&RunningPlanEntry> {
        self.entries
            .iter()
            .filter(|e| !e.is_completed())
            .min_by(|a, b| a.cmp_schedule(b))
    }

    /// `(completed entries, total entries)`
    pub fn progress(&self) -> (usize, usize) {
        let done = self.entries.iter().filter(|e| e.is_completed()).count();
        (done, self.entries.len())
    }

    pub fn entry_mut(&mut self, week: u32, day: u32) -> Option<&mut RunningPlanEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.week == week && e.day == day)
    }

    /// Copy with new identifiers for the plan, its entries and units. The copy
    /// is not a template and has no completed units.
    pub fn fresh_copy(&self, start_date: NaiveDate) -> RunningPlan {
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let mut copy = entry.clone();
                copy.id = Identifier::new();
                for unit in &mut copy.units {
                    unit.id = Identifier::new();
                    unit.completed = false;
                }
                copy
            })
            .collect();

        RunningPlan::new(self.name.clone(), start_date)
            .with_remarks(self.remarks.clone())
            .with_order(self.order)
            .with_entries(entries)
    }

    /// Marks every unit of the entry at `week`/`day` as completed.
    ///
    /// Returns `false` if the plan has no such entry.
    pub fn complete_entry(&mut self, week: u32, day: u32) -> bool {
        match self.entry_mut(week, day) {
            Some(entry) => {
                entry.set_completed(true);
                true
            }
            None => false,
        }
    }
}

/// Returns `date` if it is a Monday, otherwise the following Monday.
pub fn next_monday(date: NaiveDate) -> NaiveDate {
    let from_monday = date.weekday().num_days_from_monday();
    if from_monday == 0 {
        return date;
    }
    date.checked_add_days(Days::new(u64::from(7 - from_monday)))
        .unwrap_or(date)
}

impl fmt::Display for RunningPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        if !self.remarks.is_empty() {
            writeln!(f, "{}", self.remarks)?;
        }
        writeln!(f, "Start: {}", self.start_date)?;

        let (done, total) = self.progress();
        writeln!(f, "Progress: {}/{} days", done, total)?;

        for entry in &self.entries {
            writeln!(f, "\n{} - {}", self.entry_date(entry), entry)?;
        }

        Ok(())
    }
}

impl Entity for RunningPlan {
    const KIND: EntityKind = EntityKind::RunningPlan;

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("name", self.name.as_str())
            .with("remarks", self.remarks.as_str())
            .with("order", self.order)
            .with("start_date", self.start_date.to_string())
            .with("template", self.template)
            .with_ids("entry_ids", self.entries.iter().map(|e| &e.id))
    }

    /// Entries are left empty; they are resolved through `entry_ids`. The
    /// stored start date is taken as-is.
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.require_id("id")?,
            name: record.require_text("name")?,
            remarks: record.text("remarks").unwrap_or_default(),
            order: record.int("order").unwrap_or(0),
            start_date: record.require_date("start_date")?,
            template: record.bool("template").unwrap_or(false),
            entries: Vec::new(),
        })
    }
}
