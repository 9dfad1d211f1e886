//! Concurrency coordinator.
//!
//! Every group runs as an independent pair of tasks that share nothing but
//! the group's [`IndicatorCell`]:
//!
//! - **Evaluator** ([`GroupEvaluator::run`]): fetch, extract, fold, apply
//!   the LED rules, publish the lamp state, sleep for the poll interval
//! - **Driver** ([`IndicatorDriver::run`]): copy the lamp state out, blink
//!   or hold, sleep for the blink interval
//!
//! Both watch the same process-wide [`CancellationToken`]. [`Monitor::join`]
//! waits for every task after cancellation before the groups are dropped.

pub mod evaluator;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{GroupConfig, MonitorConfig};
use crate::error::{LampError, Result};
use crate::fetch::StatusFetcher;
use crate::indicator::{IndicatorCell, IndicatorDriver, IndicatorOutput, IndicatorState};

pub use evaluator::GroupEvaluator;

/// One group's running task pair.
pub struct GroupHandle {
    pub name: String,
    pub cell: IndicatorCell,
    evaluator: JoinHandle<()>,
    driver: JoinHandle<()>,
}

/// All groups of a running monitor.
pub struct Monitor {
    groups: Vec<GroupHandle>,
    cancel: CancellationToken,
}

impl Monitor {
    /// Open every group's output, then spawn every group's task pair.
    ///
    /// Outputs are opened up front so that a bad pin fails startup before
    /// any loop is running.
    pub fn start<F, O, M>(
        config: &MonitorConfig,
        fetcher: F,
        mut open_output: M,
        cancel: CancellationToken,
    ) -> Result<Self>
    where
        F: StatusFetcher,
        O: IndicatorOutput,
        M: FnMut(&GroupConfig) -> Result<O>,
    {
        let outputs = config
            .groups
            .iter()
            .map(&mut open_output)
            .collect::<Result<Vec<O>>>()?;

        let fetcher = Arc::new(fetcher);
        let groups = config
            .groups
            .iter()
            .zip(outputs)
            .map(|(group, output)| Self::spawn_group(config, group, output, fetcher.clone(), &cancel))
            .collect();

        Ok(Self { groups, cancel })
    }

    fn spawn_group<F: StatusFetcher, O: IndicatorOutput>(
        config: &MonitorConfig,
        group: &GroupConfig,
        output: O,
        fetcher: Arc<F>,
        cancel: &CancellationToken,
    ) -> GroupHandle {
        let group = Arc::new(group.clone());
        let cell = IndicatorCell::new(IndicatorState::OFF);

        tracing::info!(
            group = %group.name,
            server = %group.server,
            pins = %group.pins,
            jobs = group.jobs.len(),
            poll_interval_secs = group.poll_interval.as_secs_f64(),
            staleness_threshold_secs = group.staleness_threshold.as_secs(),
            success_timeout_secs = group.success_timeout.as_secs(),
            "Starting group"
        );

        let evaluator = GroupEvaluator::new(group.clone(), cell.clone());
        let evaluator_cancel = cancel.clone();
        let evaluator = tokio::spawn(async move {
            evaluator.run(fetcher, evaluator_cancel).await;
        });

        let driver = IndicatorDriver::new(group.name.clone(), output, config.allow_animation);
        let driver = tokio::spawn(driver.run(
            cell.clone(),
            config.blink_interval,
            config.lamp_test,
            cancel.clone(),
        ));

        GroupHandle {
            name: group.name.clone(),
            cell,
            evaluator,
            driver,
        }
    }

    pub fn groups(&self) -> &[GroupHandle] {
        &self.groups
    }

    /// Shared lamp state of the named group.
    pub fn cell(&self, name: &str) -> Option<&IndicatorCell> {
        self.groups.iter().find(|g| g.name == name).map(|g| &g.cell)
    }

    /// Cancel every loop and wait for all of them.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for every group's tasks to finish.
    ///
    /// Returns once all tasks are done, reporting the first task that
    /// panicked if any did.
    pub async fn join(self) -> Result<()> {
        let mut first_error = None;
        for group in self.groups {
            for (role, handle) in [("evaluator", group.evaluator), ("driver", group.driver)] {
                if let Err(e) = handle.await {
                    tracing::error!(group = %group.name, role, error = %e, "Task ended abnormally");
                    first_error.get_or_insert_with(|| {
                        LampError::Join(format!("{} {}: {}", group.name, role, e))
                    });
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
