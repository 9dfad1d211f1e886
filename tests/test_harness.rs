//! Shared fixtures for ci-lamp integration tests.
//!
//! Provides a scripted fetcher that writes job artifacts the way the real
//! build server does, a recording lamp output, and group configs rooted in a
//! temporary artifact directory.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use ci_lamp::config::{GroupConfig, IndicatorPins, MonitorConfig};
use ci_lamp::fetch::{FetchError, StatusFetcher};
use ci_lamp::indicator::{ChannelLevels, IndicatorOutput};

/// Render a current-status document as the build server pretty-prints it.
pub fn status_doc(name: &str, color: &str) -> String {
    format!(
        "{{\n  \"_class\" : \"hudson.model.FreeStyleProject\",\n  \"name\" : \"{name}\",\n  \"color\" : \"{color}\"\n}}\n"
    )
}

/// Render a last-build document with a millisecond timestamp.
pub fn last_build_doc(name: &str, finished: DateTime<Utc>) -> String {
    format!(
        "{{\n  \"fullDisplayName\" : \"{name} #1\",\n  \"id\" : \"1\",\n  \"result\" : \"SUCCESS\",\n  \"timestamp\" : {}\n}}\n",
        finished.timestamp_millis()
    )
}

#[derive(Debug, Clone)]
struct ScriptedJob {
    color: String,
    finished: DateTime<Utc>,
}

#[derive(Default)]
struct FakeState {
    jobs: HashMap<String, ScriptedJob>,
    failing: bool,
    calls: usize,
}

/// Writes artifacts for whatever jobs it has been told about.
///
/// Jobs it knows nothing about get no artifacts at all.
#[derive(Clone, Default)]
pub struct FakeFetcher {
    state: Arc<Mutex<FakeState>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_job(&self, name: &str, color: &str, finished: DateTime<Utc>) {
        self.state.lock().unwrap().jobs.insert(
            name.to_string(),
            ScriptedJob {
                color: color.to_string(),
                finished,
            },
        );
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl StatusFetcher for FakeFetcher {
    async fn fetch(
        &self,
        group: &GroupConfig,
        _cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        let (failing, jobs) = {
            let mut state = self.state.lock().unwrap();
            state.calls += 1;
            (state.failing, state.jobs.clone())
        };

        if failing {
            return Err(FetchError::Failed {
                code: Some(7),
                stderr: "Failed to connect".to_string(),
            });
        }

        for job in &group.jobs {
            if let Some(scripted) = jobs.get(&job.name) {
                tokio::fs::write(&job.status_artifact, status_doc(&job.name, &scripted.color))
                    .await
                    .map_err(FetchError::Wait)?;
                tokio::fs::write(
                    &job.last_build_artifact,
                    last_build_doc(&job.name, scripted.finished),
                )
                .await
                .map_err(FetchError::Wait)?;
            }
        }
        Ok(())
    }
}

/// Lamp output that remembers every write.
#[derive(Clone, Default)]
pub struct RecordingOutput {
    writes: Arc<Mutex<Vec<ChannelLevels>>>,
}

impl RecordingOutput {
    pub fn writes(&self) -> Vec<ChannelLevels> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<ChannelLevels> {
        self.writes.lock().unwrap().last().copied()
    }
}

impl IndicatorOutput for RecordingOutput {
    async fn write(&mut self, levels: ChannelLevels) -> ci_lamp::Result<()> {
        self.writes.lock().unwrap().push(levels);
        Ok(())
    }
}

/// Group with fast test timings and the given jobs (all under `/job/`).
pub fn test_group(name: &str, jobs: &[&str]) -> GroupConfig {
    let mut group = GroupConfig::new(name, "http://ci.test", IndicatorPins::new(17, 27, 22))
        .with_staleness_threshold(Duration::from_secs(3600))
        .with_success_timeout(Duration::from_secs(300))
        .with_poll_interval(Duration::from_millis(20))
        .with_fetch_timeout(Duration::from_secs(1));
    for job in jobs {
        group = group.with_job("/job/", *job);
    }
    group
}

/// Monitor config with fast blinking, artifacts in a fresh temp dir.
pub fn test_config(groups: Vec<GroupConfig>) -> (MonitorConfig, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = MonitorConfig {
        blink_interval: Duration::from_millis(10),
        lamp_test: false,
        ..MonitorConfig::default()
    }
    .with_artifact_dir(dir.path().to_path_buf());
    for group in groups {
        config = config.with_group(group);
    }
    config.validate().unwrap();
    (config, dir)
}

/// Poll `check` every 10ms until it holds or `timeout` passes.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Like [`wait_until`] for checks that need no awaiting.
pub async fn eventually<F: FnMut() -> bool>(timeout: Duration, mut check: F) -> bool {
    wait_until(timeout, || std::future::ready(check())).await
}
