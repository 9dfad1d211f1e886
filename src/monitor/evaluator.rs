use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::GroupConfig;
use crate::fetch::{FetchError, StatusFetcher};
use crate::indicator::{IndicatorCell, IndicatorState, LedStateMachine};
use crate::status::extract::{read_snapshot, JobSnapshot};
use crate::status::GroupStatus;

/// Owns everything one group's evaluation loop mutates.
///
/// Only the lamp state leaves this struct, through the shared cell.
pub struct GroupEvaluator {
    group: Arc<GroupConfig>,
    cell: IndicatorCell,
    current: GroupStatus,
    previous: GroupStatus,
    machine: LedStateMachine,
}

impl GroupEvaluator {
    pub fn new(group: Arc<GroupConfig>, cell: IndicatorCell) -> Self {
        let machine = LedStateMachine::new(group.success_timeout);
        Self {
            group,
            cell,
            current: GroupStatus::default(),
            previous: GroupStatus::default(),
            machine,
        }
    }

    pub fn current(&self) -> GroupStatus {
        self.current
    }

    pub fn previous(&self) -> GroupStatus {
        self.previous
    }

    pub fn machine(&self) -> &LedStateMachine {
        &self.machine
    }

    /// Read every job's artifacts and run one evaluation cycle.
    pub async fn evaluate(&mut self, now: DateTime<Utc>) -> IndicatorState {
        let mut snapshots = Vec::with_capacity(self.group.jobs.len());
        for job in &self.group.jobs {
            snapshots.push(read_snapshot(job).await);
        }
        self.apply(&snapshots, now).await
    }

    /// Run one evaluation cycle over already extracted snapshots.
    ///
    /// Shifts the current status into `previous` before computing the new
    /// one, then publishes the resulting lamp state.
    pub async fn apply(&mut self, snapshots: &[JobSnapshot], now: DateTime<Utc>) -> IndicatorState {
        self.previous = self.current;
        self.current = GroupStatus::evaluate(snapshots, now, self.group.staleness_threshold);

        let state = self.machine.next(&self.current, &self.previous, now);
        let replaced = self.cell.store(state).await;

        if replaced != state {
            tracing::info!(
                group = %self.group.name,
                from = %replaced,
                to = %state,
                status = ?self.current,
                "Indicator state changed"
            );
        } else {
            tracing::debug!(group = %self.group.name, state = %state, "Indicator state unchanged");
        }
        state
    }

    /// Fetch, evaluate, sleep; until `cancel` fires.
    ///
    /// A failed fetch skips evaluation for that cycle only.
    pub async fn run<F: StatusFetcher>(mut self, fetcher: Arc<F>, cancel: CancellationToken) {
        let name = self.group.name.clone();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match fetcher.fetch(&self.group, &cancel).await {
                Ok(()) if cancel.is_cancelled() => break,
                Ok(()) => {
                    self.evaluate(Utc::now()).await;
                }
                Err(FetchError::Cancelled) => break,
                Err(e) => {
                    tracing::warn!(group = %name, error = %e, "Status fetch failed, skipping cycle");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.group.poll_interval) => {}
            }
        }

        tracing::info!(group = %name, "Evaluator stopped");
    }
}
