//! Unit tests for the retention policy
//!
//! These tests replay daily runs and check which snapshots survive.

use backup_rotator::retention::{obsolete_versions, THINNING_WEEKDAY};
use chrono::{Datelike, Duration, NaiveDate};
use rstest::rstest;
use std::collections::BTreeSet;
use test_utils::{date, plain_day, thinning_day};

/// Run once a day from `start` through `end`, returning surviving versions
fn simulate(start: NaiveDate, end: NaiveDate) -> BTreeSet<NaiveDate> {
    let mut versions = BTreeSet::new();
    let mut now = start;
    while now <= end {
        versions.insert(now);
        for obsolete in &obsolete_versions(now) {
            versions.remove(obsolete);
        }
        now += Duration::days(1);
    }
    versions
}

#[test]
fn test_fixture_dates() {
    assert_eq!(
        obsolete_versions(plain_day()).iter().copied().collect::<Vec<_>>(),
        vec![date(2024, 2, 28)]
    );
    assert_eq!(
        obsolete_versions(thinning_day()).iter().copied().collect::<Vec<_>>(),
        vec![date(2023, 11, 7), date(2024, 10, 8)]
    );
}

#[test]
fn test_last_week_is_always_complete() {
    let end = date(2024, 12, 31);
    let versions = simulate(date(2021, 1, 1), end);

    for days in 0..7 {
        assert!(versions.contains(&(end - Duration::days(days))));
    }
}

#[test]
fn test_older_snapshots_follow_thinning_schedule() {
    let end = date(2024, 12, 31);
    let versions = simulate(date(2021, 1, 1), end);

    for version in &versions {
        let age = (end - *version).num_days();
        if age >= 7 {
            assert_eq!(version.weekday(), THINNING_WEEKDAY, "{}", version);
        }
        if age >= 28 {
            assert!(version.day() <= 7, "{} should be a first-week snapshot", version);
        }
        if age >= 364 {
            assert_eq!(version.month(), 1, "{} should be a January snapshot", version);
        }
    }
}

#[test]
fn test_one_january_snapshot_survives_per_year() {
    let versions = simulate(date(2021, 1, 1), date(2024, 12, 31));

    for year in 2021..=2023 {
        let kept: Vec<_> = versions.iter().filter(|v| v.year() == year).collect();
        assert_eq!(kept.len(), 1, "year {}: {:?}", year, kept);
    }
}

#[rstest]
#[case(date(2024, 3, 4))]
#[case(date(2024, 3, 6))]
#[case(date(2024, 3, 10))]
#[case(date(2024, 12, 30))]
fn test_non_thinning_days_only_drop_last_week(#[case] now: NaiveDate) {
    assert_ne!(now.weekday(), THINNING_WEEKDAY);
    let obsolete = obsolete_versions(now);
    assert_eq!(obsolete.len(), 1);
    assert!(obsolete.contains(&(now - Duration::days(7))));
}

#[test]
fn test_policy_is_deterministic() {
    assert_eq!(obsolete_versions(thinning_day()), obsolete_versions(thinning_day()));
}
