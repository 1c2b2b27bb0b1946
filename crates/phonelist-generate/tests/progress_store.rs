use std::fs;
use std::path::PathBuf;

use phonelist_core::{AreaCode, CountryCode, DialingPlan, partition};
use phonelist_generate::{GenerationError, PROGRESS_VERSION, ProgressStore, WorkerState};

fn store(dir: &std::path::Path) -> ProgressStore {
    let plan = DialingPlan::new(3, 2).expect("plan");
    let country = CountryCode::parse("1").expect("country");
    let area = AreaCode::parse("212", &plan).expect("area");
    let mut store = ProgressStore::new(&country, &plan, false, &dir.join("numbers.txt"));
    store.ensure_area(&area, &partition(plan.space_size(), 2).expect("partition"));
    store
}

#[test]
fn missing_file_loads_as_none() {
    let dir = temp_dir("missing");
    let loaded = ProgressStore::load(&dir.join("absent.json")).expect("load");
    assert!(loaded.is_none());
}

#[test]
fn saved_store_loads_back() {
    let dir = temp_dir("save");
    let path = dir.join("progress.json");
    let mut original = store(&dir);
    original.record("212", 1, 73).expect("record");
    original.save(&path).expect("save");

    let loaded = ProgressStore::load(&path).expect("load").expect("present");
    assert_eq!(loaded, original);
    assert_eq!(loaded.version, PROGRESS_VERSION);
    assert_eq!(loaded.remaining(), 50 + 27);
    assert!(!dir.join("progress.json.tmp").exists());
}

#[test]
fn file_stores_markers_as_plain_integers() {
    let dir = temp_dir("format");
    let path = dir.join("progress.json");
    let mut progress = store(&dir);
    progress.record("212", 0, 12).expect("record");
    progress.save(&path).expect("save");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
    let ranges = json["areas"]["212"]["ranges"].as_array().expect("ranges");
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0]["next"], 12);
    assert_eq!(ranges[1]["start"], 50);
    assert_eq!(json["country_code"], "1");
    assert_eq!(json["version"], 2);
    assert_eq!(json["output_bytes"], 0);
}

#[test]
fn markers_only_move_forward_within_range() {
    let dir = temp_dir("forward");
    let mut progress = store(&dir);
    progress.record("212", 0, 20).expect("forward");

    assert!(matches!(
        progress.record("212", 0, 10),
        Err(GenerationError::Checkpoint(_))
    ));
    assert!(progress.record("212", 0, 51).is_err());
    assert!(progress.record("212", 5, 1).is_err());
    assert!(progress.record("646", 0, 1).is_err());

    progress.record("212", 0, 50).expect("finalize");
    progress.record("212", 1, 100).expect("finalize");
    assert!(progress.is_complete());
}

#[test]
fn gapped_layout_is_rejected_on_load() {
    let dir = temp_dir("gapped");
    let path = dir.join("progress.json");
    let mut progress = store(&dir);
    progress.areas.get_mut("212").expect("area").ranges[1].start = 60;
    progress.save(&path).expect("save");

    assert!(matches!(
        ProgressStore::load(&path),
        Err(GenerationError::Checkpoint(_))
    ));
}

#[test]
fn incompatible_plan_is_rejected() {
    let dir = temp_dir("plan");
    let progress = store(&dir);
    let country = CountryCode::parse("1").expect("country");

    assert!(
        progress
            .check_compatible(&country, &DialingPlan::new(3, 2).expect("plan"), false)
            .is_ok()
    );
    assert!(
        progress
            .check_compatible(&country, &DialingPlan::default(), false)
            .is_err()
    );
    assert!(
        progress
            .check_compatible(&country, &DialingPlan::new(3, 2).expect("plan"), true)
            .is_err()
    );
}

#[test]
fn worker_state_machine_allows_only_documented_edges() {
    use WorkerState::*;

    assert!(Idle.can_transition_to(Enumerating));
    assert!(Enumerating.can_transition_to(Flushing));
    assert!(Flushing.can_transition_to(Enumerating));
    assert!(Enumerating.can_transition_to(Completed));
    assert!(Enumerating.can_transition_to(Aborted));
    assert!(Flushing.can_transition_to(Aborted));

    assert!(!Idle.can_transition_to(Completed));
    assert!(!Idle.can_transition_to(Flushing));
    assert!(!Completed.can_transition_to(Enumerating));
    assert!(!Aborted.can_transition_to(Enumerating));
    assert!(Completed.is_terminal() && Aborted.is_terminal());
}

fn temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("phonelist_progress_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
