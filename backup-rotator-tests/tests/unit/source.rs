//! Unit tests for backup sources
//!
//! These tests verify placeholder substitution and include path resolution.

use backup_rotator::error::BackupError;
use backup_rotator::source::{substitute_placeholders, BackupSource, PathTemplate};
use rstest::rstest;
use std::fs;
use test_utils::{date, ErrorPolicy, RecordingAlerter, SourceConfig, TestContext};

fn source(include: Vec<String>, onerror: ErrorPolicy) -> BackupSource {
    BackupSource::new(&SourceConfig {
        name: "db".to_string(),
        include,
        exclude: vec!["*.tmp".to_string()],
        onerror,
    })
    .unwrap()
}

#[rstest]
#[case("/data/%Y/%m/%d", "/data/2024/01/09")]
#[case("/data/%{Y}%{m}%{d}.tar", "/data/20240109.tar")]
#[case("/data/%LATEST/db", "/data/LATEST/db")]
#[case("/data/50%", "/data/50%")]
#[case("/data/%%", "/data/%%")]
#[case("/data/plain", "/data/plain")]
fn test_placeholder_substitution(#[case] pattern: &str, #[case] expected: &str) {
    assert_eq!(substitute_placeholders(pattern, date(2024, 1, 9)).unwrap(), expected);
}

#[rstest]
#[case("/data/%H")]
#[case("/data/%{month}")]
#[case("/data/%{Y")]
fn test_unknown_placeholders_rejected(#[case] pattern: &str) {
    assert!(PathTemplate::parse(pattern).is_err());
}

#[test]
fn test_template_keeps_configured_text() {
    let template = PathTemplate::parse("/data/%Y/*.sql").unwrap();
    assert_eq!(template.as_str(), "/data/%Y/*.sql");
}

#[test]
fn test_placeholders_use_run_date() {
    let ctx = TestContext::new();
    ctx.create_file("2024-03-05/dump.sql", "today");
    ctx.create_file("2024-03-04/dump.sql", "yesterday");

    let mut source = source(
        vec![format!("{}/%Y-%m-%d/*.sql", ctx.temp_dir().display())],
        ErrorPolicy::Fail,
    );
    let alerter = RecordingAlerter::default();

    let paths = source.resolve_included_paths(date(2024, 3, 5), &alerter).unwrap().to_vec();
    assert_eq!(paths, vec![ctx.temp_dir().join("2024-03-05/dump.sql")]);

    // Resolving again for another date replaces the previous result
    let paths = source.resolve_included_paths(date(2024, 3, 4), &alerter).unwrap().to_vec();
    assert_eq!(paths, vec![ctx.temp_dir().join("2024-03-04/dump.sql")]);
    assert_eq!(source.included_paths(), paths.as_slice());
}

#[test]
fn test_recursive_pattern() {
    let ctx = TestContext::new();
    ctx.create_file("logs/app/a.log", "a");
    ctx.create_file("logs/app/nested/b.log", "b");
    ctx.create_file("logs/app/nested/c.txt", "c");

    let mut source = source(
        vec![format!("{}/logs/**/*.log", ctx.temp_dir().display())],
        ErrorPolicy::Fail,
    );
    let alerter = RecordingAlerter::default();

    let paths = source.resolve_included_paths(date(2024, 3, 5), &alerter).unwrap();
    assert_eq!(
        paths,
        &[
            ctx.temp_dir().join("logs/app/a.log"),
            ctx.temp_dir().join("logs/app/nested/b.log"),
        ]
    );
}

#[test]
fn test_every_missing_pattern_is_reported() {
    let mut source = source(
        vec!["/nonexistent/a/*".to_string(), "/nonexistent/b/*".to_string()],
        ErrorPolicy::Alert,
    );
    let alerter = RecordingAlerter::default();

    let paths = source.resolve_included_paths(date(2024, 3, 5), &alerter).unwrap();
    assert!(paths.is_empty());

    let alerts = alerter.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].2, "Path not found /nonexistent/a/*");
    assert_eq!(alerts[1].2, "Path not found /nonexistent/b/*");
    assert!(alerts.iter().all(|(_, destination, _)| destination.is_none()));
}

#[test]
fn test_fail_policy_stops_at_first_missing_pattern() {
    let ctx = TestContext::new();
    let present = ctx.create_file("present.txt", "x");

    let mut source = source(
        vec!["/nonexistent/*".to_string(), present.display().to_string()],
        ErrorPolicy::Fail,
    );
    let alerter = RecordingAlerter::default();

    let result = source.resolve_included_paths(date(2024, 3, 5), &alerter);
    match result {
        Err(BackupError::Resolution { pattern }) => assert_eq!(pattern, "/nonexistent/*"),
        other => panic!("Expected resolution error, got {:?}", other),
    }
}

#[test]
fn test_excludes_are_passed_through_verbatim() {
    let source = source(vec!["/data".to_string()], ErrorPolicy::Fail);
    assert_eq!(source.excluded_paths(), &["*.tmp".to_string()]);
    assert_eq!(source.on_error(), ErrorPolicy::Fail);
}

#[test]
fn test_hidden_files_match_explicit_patterns() {
    let ctx = TestContext::new();
    let hidden = ctx.create_file(".env", "x");
    fs::write(ctx.temp_dir().join("visible"), "y").unwrap();

    let mut source = source(
        vec![format!("{}/.env", ctx.temp_dir().display())],
        ErrorPolicy::Fail,
    );
    let alerter = RecordingAlerter::default();

    let paths = source.resolve_included_paths(date(2024, 3, 5), &alerter).unwrap();
    assert_eq!(paths, &[hidden]);
}
