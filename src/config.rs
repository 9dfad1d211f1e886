use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{LampError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ci-lamp/config.toml";
pub const DEFAULT_ARTIFACT_DIR: &str = "/var/lib/ci-lamp";
pub const DEFAULT_BLINK_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_JOB_PATH: &str = "/job/";

/// Login used against a group's build server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// GPIO numbers of a lamp's red, green and blue lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorPins {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl IndicatorPins {
    pub fn new(red: u32, green: u32, blue: u32) -> Self {
        Self { red, green, blue }
    }

    fn all(&self) -> [u32; 3] {
        [self.red, self.green, self.blue]
    }
}

impl std::fmt::Display for IndicatorPins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.red, self.green, self.blue)
    }
}

/// One monitored build job and where its fetched artifacts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// URL path between the server address and the job name, e.g. `/job/`.
    pub path: String,
    pub name: String,
    /// Current status document (color).
    pub status_artifact: PathBuf,
    /// Last build document (completion timestamp).
    pub last_build_artifact: PathBuf,
}

impl Job {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        status_artifact: PathBuf,
        last_build_artifact: PathBuf,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            status_artifact,
            last_build_artifact,
        }
    }
}

/// A set of jobs sharing one build server and one lamp.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    pub name: String,
    /// Base address, prepended verbatim to every job path.
    pub server: String,
    pub credentials: Option<Credentials>,
    pub pins: IndicatorPins,
    /// A job whose last build is older than this marks the group stale.
    pub staleness_threshold: Duration,
    /// How long blue stays lit after the group turns green.
    pub success_timeout: Duration,
    pub poll_interval: Duration,
    /// Upper bound for one fetch of every job in the group.
    pub fetch_timeout: Duration,
    pub jobs: Vec<Job>,
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, server: impl Into<String>, pins: IndicatorPins) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            credentials: None,
            pins,
            staleness_threshold: Duration::from_secs(86_400),
            success_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            jobs: Vec::new(),
        }
    }

    /// Add a job. Artifact paths are assigned when the group is added to a
    /// [`MonitorConfig`].
    pub fn with_job(mut self, path: impl Into<String>, name: impl Into<String>) -> Self {
        self.jobs
            .push(Job::new(path, name, PathBuf::new(), PathBuf::new()));
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    pub fn with_success_timeout(mut self, timeout: Duration) -> Self {
        self.success_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    fn assign_artifacts(&mut self, artifact_dir: &Path, group_index: usize) {
        for (job_index, job) in self.jobs.iter_mut().enumerate() {
            job.status_artifact = artifact_dir.join(format!("s{group_index}_{job_index}"));
            job.last_build_artifact = artifact_dir.join(format!("l{group_index}_{job_index}"));
        }
    }
}

/// Everything the monitor needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Directory holding every job's fetched artifacts.
    pub artifact_dir: PathBuf,
    /// Driver tick, which is also the blink half-period.
    pub blink_interval: Duration,
    pub allow_animation: bool,
    /// Flash every lamp white once at startup.
    pub lamp_test: bool,
    pub groups: Vec<GroupConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            blink_interval: Duration::from_millis(DEFAULT_BLINK_INTERVAL_MS),
            allow_animation: true,
            lamp_test: true,
            groups: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Read, resolve and validate a TOML configuration file.
    ///
    /// `artifact_dir` overrides the directory named in the file.
    pub fn load(path: &Path, artifact_dir: Option<&Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LampError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text, artifact_dir)
    }

    pub fn from_toml(text: &str, artifact_dir: Option<&Path>) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;

        let mut config = MonitorConfig {
            artifact_dir: artifact_dir
                .map(Path::to_path_buf)
                .or(file.artifact_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR)),
            blink_interval: Duration::from_millis(file.blink_interval_ms),
            allow_animation: file.allow_animation,
            lamp_test: file.lamp_test,
            groups: Vec::new(),
        };
        for group in file.groups {
            config = config.with_group(group.resolve()?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Relocate every artifact below `dir`.
    pub fn with_artifact_dir(mut self, dir: PathBuf) -> Self {
        self.artifact_dir = dir;
        for (index, group) in self.groups.iter_mut().enumerate() {
            group.assign_artifacts(&self.artifact_dir, index);
        }
        self
    }

    /// Append a group, assigning its artifact paths from its position.
    pub fn with_group(mut self, mut group: GroupConfig) -> Self {
        group.assign_artifacts(&self.artifact_dir, self.groups.len());
        self.groups.push(group);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(LampError::Config("no groups configured".to_string()));
        }
        if self.blink_interval.is_zero() {
            return Err(LampError::Config("blink_interval_ms must be > 0".to_string()));
        }

        let mut names = HashSet::new();
        for group in &self.groups {
            let invalid = |msg: &str| LampError::Config(format!("group '{}': {}", group.name, msg));

            if group.name.trim().is_empty() {
                return Err(LampError::Config("group with empty name".to_string()));
            }
            if !names.insert(group.name.as_str()) {
                return Err(invalid("duplicate group name"));
            }
            if group.server.trim().is_empty() {
                return Err(invalid("server is empty"));
            }
            if group.jobs.is_empty() {
                return Err(invalid("no jobs configured"));
            }
            if group.jobs.iter().any(|job| job.name.trim().is_empty()) {
                return Err(invalid("job with empty name"));
            }
            let [red, green, blue] = group.pins.all();
            if red == green || green == blue || red == blue {
                return Err(invalid("red, green and blue pins must differ"));
            }
            if group.poll_interval.is_zero() {
                return Err(invalid("poll_interval_secs must be > 0"));
            }
            if group.fetch_timeout.is_zero() {
                return Err(invalid("fetch_timeout_secs must be > 0"));
            }
        }
        Ok(())
    }

    /// Create the artifact directory if it does not exist yet.
    pub fn prepare_artifact_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.artifact_dir)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    artifact_dir: Option<PathBuf>,
    #[serde(default = "default_blink_interval_ms")]
    blink_interval_ms: u64,
    #[serde(default = "default_true")]
    allow_animation: bool,
    #[serde(default = "default_true")]
    lamp_test: bool,
    #[serde(default, rename = "group")]
    groups: Vec<GroupFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupFile {
    name: String,
    server: String,
    username: Option<String>,
    password: Option<String>,
    red_pin: u32,
    green_pin: u32,
    blue_pin: u32,
    staleness_threshold_secs: u64,
    success_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    fetch_timeout_secs: u64,
    #[serde(default, rename = "job")]
    jobs: Vec<JobFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JobFile {
    #[serde(default = "default_job_path")]
    path: String,
    name: String,
}

impl GroupFile {
    fn resolve(self) -> Result<GroupConfig> {
        let credentials = match (self.username, self.password) {
            (Some(user), Some(pass)) => Some(Credentials::new(user, pass)),
            (None, None) => None,
            _ => {
                return Err(LampError::Config(format!(
                    "group '{}': username and password must be set together",
                    self.name
                )))
            }
        };

        let mut group = GroupConfig::new(
            self.name,
            self.server,
            IndicatorPins::new(self.red_pin, self.green_pin, self.blue_pin),
        )
        .with_staleness_threshold(Duration::from_secs(self.staleness_threshold_secs))
        .with_success_timeout(Duration::from_secs(self.success_timeout_secs))
        .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
        .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs));
        group.credentials = credentials;

        for job in self.jobs {
            group = group.with_job(job.path, job.name);
        }
        Ok(group)
    }
}

fn default_true() -> bool {
    true
}

fn default_blink_interval_ms() -> u64 {
    DEFAULT_BLINK_INTERVAL_MS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_job_path() -> String {
    DEFAULT_JOB_PATH.to_string()
}
