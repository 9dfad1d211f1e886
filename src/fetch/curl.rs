use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::{GroupConfig, Job};
use crate::fetch::{FetchError, StatusFetcher};

/// Extra wall-clock time allowed on top of curl's own `--max-time`.
const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Fetches every job of a group with a single `curl` invocation.
///
/// Each job contributes two transfers: the job document (color) and its last
/// build document (timestamp), each saved to the job's artifact path.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    program: String,
    grace: Duration,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self {
            program: "curl".to_string(),
            grace: DEFAULT_GRACE,
        }
    }
}

impl CurlFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a different executable with the same arguments.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Arguments for one fetch of `group`.
    pub fn build_args(group: &GroupConfig) -> Vec<String> {
        let mut args = vec![
            "--silent".to_string(),
            "--max-time".to_string(),
            group.fetch_timeout.as_secs_f64().to_string(),
        ];

        if let Some(ref creds) = group.credentials {
            args.push("--anyauth".to_string());
            args.push("-u".to_string());
            args.push(format!("{}:{}", creds.username, creds.password));
        }

        for job in &group.jobs {
            args.push(status_url(&group.server, job));
            args.push("-o".to_string());
            args.push(job.status_artifact.display().to_string());

            args.push(last_build_url(&group.server, job));
            args.push("-o".to_string());
            args.push(job.last_build_artifact.display().to_string());
        }

        args
    }
}

impl StatusFetcher for CurlFetcher {
    async fn fetch(
        &self,
        group: &GroupConfig,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        let args = Self::build_args(group);
        tracing::debug!(group = %group.name, jobs = group.jobs.len(), "Fetching job status");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(FetchError::Spawn)?;

        // Dropping the wait future drops the child, which kills it.
        let limit = group.fetch_timeout + self.grace;
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = tokio::time::timeout(limit, child.wait_with_output()) => match result {
                Ok(output) => output.map_err(FetchError::Wait)?,
                Err(_) => return Err(FetchError::Timeout(limit)),
            },
        };

        if output.status.success() {
            tracing::debug!(group = %group.name, "Fetch completed");
            Ok(())
        } else {
            Err(FetchError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

fn status_url(server: &str, job: &Job) -> String {
    format!(
        "{}{}{}/api/json?pretty=true&tree=name,color",
        server, job.path, job.name
    )
}

fn last_build_url(server: &str, job: &Job) -> String {
    format!(
        "{}{}{}/lastBuild/api/json?pretty=true&tree=fullDisplayName,id,timestamp,result",
        server, job.path, job.name
    )
}
