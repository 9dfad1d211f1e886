//! Status Extractor.
//!
//! Turns the two per-job artifacts written by the fetcher into a
//! [`JobSnapshot`]. Both artifacts are JSON documents from the build
//! server's API; only one field of each is read and everything else is
//! ignored. Nothing here returns an error: a missing, truncated or malformed
//! document collapses to the zero value of the field it should have carried.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::Job;
use crate::status::color::{parse_color_token, JobColor};

/// The part of a job document that carries its color.
#[derive(Debug, Default, Deserialize)]
struct StatusDoc {
    color: Option<String>,
}

/// The part of a last-build document that carries its start time.
#[derive(Debug, Default, Deserialize)]
struct LastBuildDoc {
    timestamp: Option<i64>,
}

/// One job's state as observed in a single evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobSnapshot {
    pub color: JobColor,
    pub animated: bool,
    /// Completion time of the last build, second resolution. Epoch when unknown.
    pub last_build_at: DateTime<Utc>,
}

impl JobSnapshot {
    pub fn new(color: JobColor, animated: bool, last_build_at: DateTime<Utc>) -> Self {
        Self {
            color,
            animated,
            last_build_at,
        }
    }
}

/// Read both artifacts of `job` and build its snapshot.
pub async fn read_snapshot(job: &Job) -> JobSnapshot {
    let (color, animated) = match tokio::fs::read_to_string(&job.status_artifact).await {
        Ok(text) => parse_status(&text),
        Err(e) => {
            tracing::debug!(
                job = %job.name,
                path = %job.status_artifact.display(),
                error = %e,
                "Status artifact unreadable"
            );
            (JobColor::None, false)
        }
    };

    let last_build_at = match tokio::fs::read_to_string(&job.last_build_artifact).await {
        Ok(text) => parse_last_build(&text),
        Err(e) => {
            tracing::debug!(
                job = %job.name,
                path = %job.last_build_artifact.display(),
                error = %e,
                "Last build artifact unreadable"
            );
            DateTime::<Utc>::default()
        }
    };

    JobSnapshot::new(color, animated, last_build_at)
}

/// Extract `(color, animated)` from a current-status document.
pub fn parse_status(text: &str) -> (JobColor, bool) {
    serde_json::from_str::<StatusDoc>(text)
        .unwrap_or_default()
        .color
        .map(|token| parse_color_token(&token))
        .unwrap_or((JobColor::None, false))
}

/// Extract the last build's completion time from a last-build document.
///
/// The server reports milliseconds; the fractional second is dropped.
pub fn parse_last_build(text: &str) -> DateTime<Utc> {
    serde_json::from_str::<LastBuildDoc>(text)
        .unwrap_or_default()
        .timestamp
        .and_then(|millis| DateTime::from_timestamp(millis / 1000, 0))
        .unwrap_or_default()
}
