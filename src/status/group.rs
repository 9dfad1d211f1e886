use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::status::color::JobColor;
use crate::status::extract::JobSnapshot;

/// Aggregate verdict over every job of a group for one evaluation cycle.
///
/// `Default` is the all-false value a group holds before its first cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupStatus {
    /// Every job is `NotBuilt` or `Disabled` (also true for no jobs at all).
    pub all_disabled: bool,
    /// At least one active job is building.
    pub is_building: bool,
    /// Every active job is blue. Vacuously true with no active jobs.
    pub is_success: bool,
    /// At least one active job's last build is older than the threshold.
    pub is_stale: bool,
}

impl GroupStatus {
    /// Fold job snapshots into a group verdict.
    ///
    /// Pure and order-independent: each field is a plain AND or OR over the
    /// active jobs.
    pub fn evaluate<'a, I>(snapshots: I, now: DateTime<Utc>, stale_after: Duration) -> Self
    where
        I: IntoIterator<Item = &'a JobSnapshot>,
    {
        let stale_after_secs = i64::try_from(stale_after.as_secs()).unwrap_or(i64::MAX);

        snapshots.into_iter().fold(
            GroupStatus {
                all_disabled: true,
                is_building: false,
                is_success: true,
                is_stale: false,
            },
            |mut status, job| {
                if job.color.is_inactive() {
                    return status;
                }
                let age_secs = (now - job.last_build_at).num_seconds();
                status.all_disabled = false;
                status.is_success &= job.color == JobColor::Blue;
                status.is_building |= job.animated;
                status.is_stale |= age_secs > stale_after_secs;
                status
            },
        )
    }

    /// Active, settled, fresh and green: the only state that shows blue.
    pub fn is_settled_success(&self) -> bool {
        !self.all_disabled && !self.is_building && !self.is_stale && self.is_success
    }
}
