use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use sportlib_core::{
    EntityKind, LocationData, MovementType, Repository, RunningPlan, RunningPlanEntry,
    RunningUnit, Track, Training, TrainingType,
};
use tempfile::TempDir;

fn open_repo() -> (Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::open(temp_dir.path().to_path_buf()).unwrap();
    (repo, temp_dir)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn new_movement_type_is_stored_once_with_plan() {
    let (repo, _temp) = open_repo();

    let run = MovementType::new("L", "green", 10.0);
    repo.add(&run).unwrap();

    let unit1 = RunningUnit::new(30, run.clone());
    let unit2 = RunningUnit::new(5, MovementType::with_key("Y"));
    let plan = RunningPlan::new("Scenario", date(2025, 3, 3)).with_entries(vec![
        RunningPlanEntry::new(1, 1).with_units(vec![unit1.clone(), unit2.clone()]),
    ]);
    repo.add(&plan).unwrap();

    let movement_types: Vec<MovementType> = repo.find_all().unwrap();
    let mut keys: Vec<&str> = movement_types.iter().map(|mt| mt.key.as_str()).collect();
    keys.sort();
    assert_eq!(keys, vec!["L", "Y"]);

    assert!(repo
        .find_by_key::<RunningUnit>(unit1.id.as_str())
        .unwrap()
        .is_some());
    assert!(repo
        .find_by_key::<RunningUnit>(unit2.id.as_str())
        .unwrap()
        .is_some());
}

#[test]
fn add_then_find_returns_same_identity() {
    let (repo, _temp) = open_repo();

    let tt = TrainingType::new("Swimming");
    let mt = MovementType::new("T", "orange", 12.0);
    let plan = RunningPlan::new("Plan", date(2025, 3, 3));
    repo.add(&tt).unwrap();
    repo.add(&mt).unwrap();
    repo.add(&plan).unwrap();

    assert_eq!(repo.find_by_key::<TrainingType>("Swimming").unwrap().unwrap().id, tt.id);
    assert_eq!(repo.find_by_key::<MovementType>("T").unwrap().unwrap().id, mt.id);
    assert_eq!(
        repo.find_by_key::<RunningPlan>(plan.id.as_str()).unwrap().unwrap().id,
        plan.id
    );
}

#[test]
fn second_add_updates_instead_of_duplicating() {
    let (repo, _temp) = open_repo();

    let mut plan = RunningPlan::new("First name", date(2025, 3, 3)).with_entries(vec![
        RunningPlanEntry::new(1, 1).with_units(vec![RunningUnit::new(20, MovementType::with_key("L"))]),
    ]);
    repo.add(&plan).unwrap();

    plan.name = "Second name".to_string();
    repo.add(&plan).unwrap();

    assert_eq!(repo.count("RunningPlan").unwrap(), 1);
    assert_eq!(repo.count("RunningPlanEntry").unwrap(), 1);
    assert_eq!(repo.count("RunningUnit").unwrap(), 1);
    let stored: RunningPlan = repo.find_by_key(plan.id.as_str()).unwrap().unwrap();
    assert_eq!(stored.name, "Second name");
}

#[test]
fn movement_type_key_is_unique() {
    let (repo, _temp) = open_repo();

    repo.add(&MovementType::new("L", "green", 10.0)).unwrap();
    repo.add(&MovementType::new("L", "red", 11.0)).unwrap();

    assert_eq!(repo.count_kind(EntityKind::MovementType).unwrap(), 1);
    assert_eq!(
        repo.find_by_key::<MovementType>("L").unwrap().unwrap().color,
        "red"
    );
}

#[test]
fn deleting_plan_removes_owned_children_only() {
    let (repo, _temp) = open_repo();

    let plan = RunningPlan::new("Plan", date(2025, 3, 3)).with_entries(vec![
        RunningPlanEntry::new(1, 1).with_units(vec![RunningUnit::new(20, MovementType::with_key("L"))]),
        RunningPlanEntry::new(1, 2).with_units(vec![RunningUnit::new(25, MovementType::with_key("L"))]),
    ]);
    repo.add(&plan).unwrap();
    repo.delete(&plan).unwrap();

    assert!(repo.find_all::<RunningPlanEntry>().unwrap().is_empty());
    assert!(repo.find_all::<RunningUnit>().unwrap().is_empty());
    assert!(repo.find_by_key::<MovementType>("L").unwrap().is_some());
}

#[test]
fn deleting_training_keeps_track_and_training_type() {
    let (repo, _temp) = open_repo();

    let start = Utc.with_ymd_and_hms(2025, 4, 2, 6, 30, 0).unwrap();
    let track = Track::new("River").with_locations(vec![
        LocationData::new(start, 50.0, 8.0),
        LocationData::new(start + Duration::minutes(6), 50.01, 8.0),
    ]);
    let training = Training::new(start, "Easy run", TrainingType::new("Running"))
        .with_track(track.clone())
        .with_duration(6);
    repo.add(&training).unwrap();

    repo.delete(&training).unwrap();

    assert!(repo.find_all::<Training>().unwrap().is_empty());
    let kept: Track = repo.find_by_key(track.id.as_str()).unwrap().unwrap();
    assert_eq!(kept.locations.len(), 2);
    assert!(repo.find_by_key::<TrainingType>("Running").unwrap().is_some());

    repo.delete(&track).unwrap();
    assert!(repo.find_all::<LocationData>().unwrap().is_empty());
}

#[test]
fn entries_are_ordered_by_week_then_day() {
    let (repo, _temp) = open_repo();

    let plan = RunningPlan::new("Order", date(2025, 3, 3)).with_entries(vec![
        RunningPlanEntry::new(2, 3),
        RunningPlanEntry::new(1, 1),
        RunningPlanEntry::new(1, 2),
        RunningPlanEntry::new(2, 7),
    ]);
    repo.add(&plan).unwrap();

    let stored: RunningPlan = repo.find_by_key(plan.id.as_str()).unwrap().unwrap();
    let schedule: Vec<(u32, u32)> = stored.entries.iter().map(|e| (e.week, e.day)).collect();
    assert_eq!(schedule, vec![(1, 1), (1, 2), (2, 3), (2, 7)]);
}

#[test]
fn plan_completion_follows_units() {
    let (repo, _temp) = open_repo();

    let run = MovementType::with_key("L");
    let mut plan = RunningPlan::new("Done", date(2025, 3, 3)).with_entries(vec![
        RunningPlanEntry::new(1, 1).with_units(vec![RunningUnit::new(20, run.clone())]),
        RunningPlanEntry::new(1, 3).with_units(vec![
            RunningUnit::new(10, run.clone()),
            RunningUnit::new(10, run),
        ]),
    ]);
    plan.complete_entry(1, 1);
    plan.complete_entry(1, 3);
    repo.add(&plan).unwrap();

    let mut stored: RunningPlan = repo.find_by_key(plan.id.as_str()).unwrap().unwrap();
    assert!(stored.is_completed());

    stored.entries[1].units[0].completed = false;
    assert!(!stored.is_completed());
    repo.update(&stored).unwrap();

    let reloaded: RunningPlan = repo.find_by_key(plan.id.as_str()).unwrap().unwrap();
    assert!(!reloaded.is_completed());
    assert!(reloaded.is_active());
}

#[test]
fn start_date_moves_to_monday_until_active() {
    // 2025-03-05 is a Wednesday
    let mut plan = RunningPlan::new("Dates", date(2025, 3, 5)).with_entries(vec![
        RunningPlanEntry::new(1, 1).with_units(vec![RunningUnit::new(20, MovementType::with_key("L"))]),
    ]);
    assert_eq!(plan.start_date, date(2025, 3, 10));
    assert_eq!(plan.start_date.weekday(), Weekday::Mon);

    assert!(plan.set_start_date(date(2025, 4, 1)));
    assert_eq!(plan.start_date, date(2025, 4, 7));

    plan.complete_entry(1, 1);
    assert!(!plan.set_start_date(date(2025, 5, 1)));
    assert_eq!(plan.start_date, date(2025, 4, 7));
}

#[test]
fn data_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let plan = RunningPlan::new("Persistent", date(2025, 3, 3)).with_entries(vec![
        RunningPlanEntry::new(1, 1).with_units(vec![RunningUnit::new(20, MovementType::with_key("L"))]),
    ]);

    {
        let mut repo = Repository::open(temp_dir.path().to_path_buf()).unwrap();
        repo.add(&plan).unwrap();
        repo.close();
    }

    let repo = Repository::open(temp_dir.path().to_path_buf()).unwrap();
    let stored: RunningPlan = repo.find_by_key(plan.id.as_str()).unwrap().unwrap();
    assert_eq!(stored, plan);
}
