//! Calendar-based thinning of dated snapshots
//!
//! Every day, the snapshot from a week ago is dropped. On the thinning day
//! (Tuesday) that rule is replaced by two others:
//! - the 28-day-old snapshot is dropped unless it falls in the first week of
//!   its month, so one snapshot per month survives;
//! - the 364-day-old snapshot is dropped if it falls in the first eight days
//!   of any month but January, so one snapshot per year survives.
//!
//! The policy only computes dates. Whether anything exists for a date is the
//! store's concern.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Day of the week on which monthly and yearly thinning runs
pub const THINNING_WEEKDAY: Weekday = Weekday::Tue;

/// Dates whose snapshots are obsolete as of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionSet(BTreeSet<NaiveDate>);

impl RetentionSet {
    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.0.iter()
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0.contains(date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<NaiveDate> for RetentionSet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RetentionSet {
    type Item = &'a NaiveDate;
    type IntoIter = std::collections::btree_set::Iter<'a, NaiveDate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Versions to prune on a run dated `now`
pub fn obsolete_versions(now: NaiveDate) -> RetentionSet {
    let mut obsolete = BTreeSet::new();

    if now.weekday() == THINNING_WEEKDAY {
        let monthly = now - Duration::days(28);
        if monthly.day() > 7 {
            obsolete.insert(monthly);
        }

        let yearly = now - Duration::days(364);
        if yearly.day() <= 8 && yearly.month() > 1 {
            obsolete.insert(yearly);
        }
    } else {
        obsolete.insert(now - Duration::days(7));
    }

    RetentionSet(obsolete)
}
