//! Package processor behavior against the fake backend

mod common;

use std::sync::Mutex;

use common::{FakeBackend, describe, write_fake};
use pkgtool::extract::{
    Executor, ExtractOptions, ExtractPhase, ExtractProgress, ExtractionOutcome, PackageTask,
    process_package,
};
use pkgtool::PackageStage;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn run(task: &PackageTask, options: &ExtractOptions) -> (pkgtool::extract::PackageSummary, Vec<ExtractProgress>) {
    let events = Mutex::new(Vec::new());
    let record = |p: &ExtractProgress| events.lock().unwrap().push(p.clone());
    let summary = process_package(task, &FakeBackend, options, &record).unwrap();
    (summary, events.into_inner().unwrap())
}

fn entry_points(events: &[ExtractProgress]) -> Vec<usize> {
    events
        .iter()
        .filter(|p| p.phase == ExtractPhase::ExtractingEntries)
        .map(|p| p.current)
        .collect()
}

#[test]
fn test_counts_add_up_to_entry_count() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", "title=CUSA00001\nentries=12\nfail=0,11\npanic=6\n");
    let task = PackageTask::new(&pkg, dir.path().join("out"));

    let (summary, _) = run(&task, &ExtractOptions::default());

    assert_eq!(summary.total_entries, 12);
    assert_eq!(summary.failed_count, 3);
    assert_eq!(summary.succeeded_count + summary.failed_count, summary.total_entries);
    let failed: Vec<u32> = summary.failures.iter().map(|o| o.entry_index).collect();
    assert_eq!(failed, vec![0, 6, 11]);
}

#[test]
fn test_single_entry_failure_is_isolated() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", "title=CUSA00001\nentries=8\nfail=3\n");
    let out = dir.path().join("out");
    let task = PackageTask::new(&pkg, &out);

    let (summary, _) = run(&task, &ExtractOptions::default());

    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.succeeded_count, 7);
    assert!(!summary.is_success());
    for index in (0..8).filter(|&i| i != 3) {
        assert!(out.join("CUSA00001").join(format!("entry_{index}.txt")).is_file());
    }
    assert_eq!(
        summary.failures[0].error_message.as_deref(),
        Some("IO error: simulated failure in entry 3")
    );
}

#[test]
fn test_panicking_entry_does_not_stop_later_entries() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", "title=CUSA00001\nentries=4\npanic=1\n");
    let task = PackageTask::new(&pkg, dir.path());

    let (summary, _) = run(&task, &ExtractOptions::default());

    assert_eq!(
        summary.failures,
        vec![ExtractionOutcome::failure(
            1,
            "entry extraction panicked: simulated panic in entry 1"
        )]
    );
    assert!(dir.path().join("CUSA00001").join("entry_3.txt").is_file());
}

#[test]
fn test_progress_cadence_for_25_entries() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", &describe("CUSA00001", 25));
    let task = PackageTask::new(&pkg, dir.path());

    let (_, events) = run(&task, &ExtractOptions::default());

    assert_eq!(entry_points(&events), vec![10, 20, 25]);
    assert_eq!(events.first().map(|p| p.phase), Some(ExtractPhase::Opening));
    assert_eq!(events.last().map(|p| p.phase), Some(ExtractPhase::Complete));
}

#[test]
fn test_custom_progress_interval() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", &describe("CUSA00001", 7));
    let task = PackageTask::new(&pkg, dir.path());

    let (_, events) = run(&task, &ExtractOptions::new().with_progress_interval(3));
    assert_eq!(entry_points(&events), vec![3, 6, 7]);
}

#[test]
fn test_output_directory_not_nested_twice() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", &describe("CUSA00001", 2));
    let titled = dir.path().join("out").join("CUSA00001");

    let (summary, _) = run(&PackageTask::new(&pkg, &titled), &ExtractOptions::default());

    assert_eq!(summary.output_directory, titled);
    assert!(titled.join("entry_1.txt").is_file());
    assert!(!titled.join("CUSA00001").exists());
}

#[test]
fn test_rerun_reuses_output_directory() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", &describe("CUSA00001", 3));
    let task = PackageTask::new(&pkg, dir.path().join("out"));

    let (first, _) = run(&task, &ExtractOptions::default());
    let (second, _) = run(&task, &ExtractOptions::default());

    assert_eq!(first, second);
    assert!(first.is_success());
}

#[test]
fn test_open_failure_is_fatal_to_package() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "junk.pkg", "not a package\n");
    let task = PackageTask::new(&pkg, dir.path());

    let err = process_package(&task, &FakeBackend, &ExtractOptions::default(), &|_| {}).unwrap_err();
    assert_eq!(err.stage, PackageStage::Open);
    assert_eq!(err.path, pkg);
}

#[test]
fn test_missing_package_fails_open() {
    let dir = tempdir().unwrap();
    let task = PackageTask::new(dir.path().join("missing.pkg"), dir.path());

    let err = process_package(&task, &FakeBackend, &ExtractOptions::default(), &|_| {}).unwrap_err();
    assert_eq!(err.stage, PackageStage::Open);
}

#[test]
fn test_empty_title_id_fails_metadata() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", "title=\nentries=3\n");
    let task = PackageTask::new(&pkg, dir.path());

    let err = process_package(&task, &FakeBackend, &ExtractOptions::default(), &|_| {}).unwrap_err();
    assert_eq!(err.stage, PackageStage::ReadMetadata);
}

#[test]
fn test_header_failure_skips_entries() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", "title=CUSA00001\nentries=3\nheader=fail\n");
    let task = PackageTask::new(&pkg, dir.path());

    let err = process_package(&task, &FakeBackend, &ExtractOptions::default(), &|_| {}).unwrap_err();
    assert_eq!(err.stage, PackageStage::ExtractHeader);
    assert!(!dir.path().join("CUSA00001").join("entry_0.txt").exists());
}

#[test]
fn test_output_directory_failure_is_fatal_to_package() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", &describe("CUSA00001", 3));
    let blocker = write_fake(dir.path(), "blocker", "a file, not a directory");
    let task = PackageTask::new(&pkg, &blocker);

    let err = process_package(&task, &FakeBackend, &ExtractOptions::default(), &|_| {}).unwrap_err();
    assert_eq!(err.stage, PackageStage::ResolveOutput);
}

#[test]
fn test_parallel_executor_matches_sequential() {
    let dir = tempdir().unwrap();
    let pkg = write_fake(dir.path(), "a.pkg", "title=CUSA00001\nentries=40\nfail=2,17,33\npanic=25\n");
    let task = PackageTask::new(&pkg, dir.path().join("out"));

    let (sequential, seq_events) = run(&task, &ExtractOptions::default());
    let parallel_options =
        ExtractOptions::new().with_executor(Executor::Parallel { threads: Some(4) });
    let (parallel, par_events) = run(&task, &parallel_options);

    assert_eq!(parallel, sequential);
    assert_eq!(entry_points(&par_events), entry_points(&seq_events));
    assert_eq!(entry_points(&par_events), vec![10, 20, 30, 40]);
}
