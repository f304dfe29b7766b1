//! Tests for a backup pass
//!
//! A pass adds today's version of every source to every destination and
//! prunes the versions the retention policy marks obsolete.

use backup_rotator::error::BackupError;
use backup_rotator::BackupManager;
use std::fs;
use std::sync::Arc;
use test_utils::{
    plain_day, thinning_day, ConfigBuilder, ErrorPolicy, MockExecutor, MockResponse,
    ResultAssertions,
};

#[test]
fn test_run_copies_all_files_into_dated_directory() {
    let builder = ConfigBuilder::minimal();
    let backups = builder.destination_path("local").unwrap();
    let data = builder.temp_dir().join("data");
    let (config, _temp_dir) = builder.persist();

    let executor = Arc::new(MockExecutor::new());
    let mut manager = BackupManager::from_config(&config, executor.clone()).unwrap();
    let summary = manager.run(plain_day()).assert_ok();

    assert_eq!(summary.sources, 1);
    assert_eq!(summary.succeeded, 1);

    let calls = executor.get_calls();
    assert_eq!(calls.len(), 1, "nothing exists at the obsolete date");
    assert_eq!(calls[0].program, "rsync");
    assert_eq!(
        calls[0].args,
        vec![
            "-avP".to_string(),
            data.join("a.txt").display().to_string(),
            data.join("b.txt").display().to_string(),
            format!("{}/2024-03-06/data", backups.display()),
        ]
    );
    assert!(backups.join("2024-03-06/data").is_dir());
}

#[test]
fn test_run_removes_week_old_version() {
    let builder = ConfigBuilder::minimal();
    let backups = builder.destination_path("local").unwrap();
    fs::create_dir_all(backups.join("2024-02-28/data")).unwrap();
    fs::create_dir_all(backups.join("2024-02-27/data")).unwrap();
    let (config, _temp_dir) = builder.persist();

    let executor = Arc::new(MockExecutor::new());
    let mut manager = BackupManager::from_config(&config, executor.clone()).unwrap();
    manager.run(plain_day()).assert_ok();

    let removals: Vec<_> = executor
        .get_calls()
        .into_iter()
        .filter(|call| call.program == "rm")
        .collect();
    assert_eq!(removals.len(), 1);
    assert_eq!(
        removals[0].args,
        vec![
            "-rf".to_string(),
            format!("{}/2024-02-28/data", backups.display())
        ]
    );
}

#[test]
fn test_thinning_day_removes_monthly_and_yearly_candidates() {
    let builder = ConfigBuilder::minimal();
    let backups = builder.destination_path("local").unwrap();
    for version in ["2024-10-08", "2023-11-07", "2024-10-29", "2024-10-01"] {
        fs::create_dir_all(backups.join(version).join("data")).unwrap();
    }
    let (config, _temp_dir) = builder.persist();

    let executor = Arc::new(MockExecutor::new());
    let mut manager = BackupManager::from_config(&config, executor.clone()).unwrap();
    manager.run(thinning_day()).assert_ok();

    let removed: Vec<String> = executor
        .get_calls()
        .into_iter()
        .filter(|call| call.program == "rm")
        .map(|call| call.args[1].clone())
        .collect();
    assert_eq!(
        removed,
        vec![
            format!("{}/2023-11-07/data", backups.display()),
            format!("{}/2024-10-08/data", backups.display()),
        ]
    );
}

#[test]
fn test_every_destination_receives_the_same_paths() {
    let builder = ConfigBuilder::minimal().add_s3_destination("offsite", "backups");
    let data = builder.temp_dir().join("data");
    let (config, _temp_dir) = builder.persist();

    let executor = Arc::new(MockExecutor::new());
    let mut manager = BackupManager::from_config(&config, executor.clone()).unwrap();
    manager.run(plain_day()).assert_ok();

    let syncs: Vec<_> = executor
        .get_calls()
        .into_iter()
        .filter(|call| call.program == "rclone" && call.args[0] == "sync")
        .collect();
    assert_eq!(syncs.len(), 2);
    assert_eq!(syncs[0].args[1], data.join("a.txt").display().to_string());
    assert_eq!(syncs[1].args[1], data.join("b.txt").display().to_string());
    assert!(syncs
        .iter()
        .all(|call| call.args[2] == ":s3:backups/2024-03-06/data"));

    // S3 cannot cheaply check for a version, so the obsolete one is purged
    assert!(executor.get_calls().iter().any(|call| call.program == "rclone"
        && call.args[0] == "purge"
        && call.args[1] == ":s3:backups/2024-02-28/data"));
}

#[test]
fn test_failing_source_does_not_stop_the_next_one() {
    let builder = ConfigBuilder::minimal();
    let data = builder.temp_dir().join("data");
    let (config, _temp_dir) = builder
        .add_source("logs", vec![format!("{}/a.txt", data.display())])
        .add_source("missing", vec!["/nonexistent/backup-rotator/*".to_string()])
        .persist();

    let executor = Arc::new(MockExecutor::new());
    let mut manager = BackupManager::from_config(&config, executor.clone()).unwrap();
    let err = manager.run(plain_day()).unwrap_err();

    match err {
        BackupError::SourcesFailed { count, details } => {
            assert_eq!(count, 1);
            assert!(details.contains("missing: Path not found /nonexistent/backup-rotator/*"));
        }
        other => panic!("Expected SourcesFailed, got {}", other),
    }

    // "data" and "logs" were both copied
    assert_eq!(executor.call_count("rsync"), 2);
}

#[test]
fn test_alert_policy_keeps_run_successful() {
    let builder = ConfigBuilder::minimal();
    let (config, _temp_dir) = builder
        .add_source_with_policy(
            "flaky",
            vec!["/nonexistent/backup-rotator/*".to_string()],
            ErrorPolicy::Alert,
        )
        .persist();

    let executor = Arc::new(MockExecutor::new());
    let mut manager = BackupManager::from_config(&config, executor.clone()).unwrap();
    let summary = manager.run(plain_day()).assert_ok();

    assert_eq!(summary.sources, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(executor.call_count("rsync"), 1);
}

#[test]
fn test_transfer_failure_routed_to_policy() {
    let (mut config, _temp_dir) = ConfigBuilder::minimal()
        .add_s3_destination("offsite", "backups")
        .persist();
    config.source[0].onerror = ErrorPolicy::Continue;

    let executor = Arc::new(MockExecutor::new().expect("rclone", MockResponse::Timeout));
    let mut manager = BackupManager::from_config(&config, executor.clone()).unwrap();
    let summary = manager.run(plain_day()).assert_ok();

    assert_eq!(summary.failed, 1);
    // The local store was still updated
    assert_eq!(executor.call_count("rsync"), 1);
    // The first rclone failure ends work on the offsite store
    assert_eq!(executor.call_count("rclone"), 1);
}
