//! Indicator Driver.
//!
//! Sole authority over what the lamp physically shows and when it blinks.
//! Each tick copies the target state out of the group's [`IndicatorCell`]
//! and compares it with the state it last put on the lamp, which it keeps
//! to itself:
//!
//! - target changed: write the new color in its lit phase
//! - unchanged and animated: flip between lit and dark
//! - unchanged and steady: no write

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::indicator::cell::IndicatorCell;
use crate::indicator::output::IndicatorOutput;
use crate::indicator::state::{ChannelLevels, IndicatorColor, IndicatorState};

pub struct IndicatorDriver<O> {
    group: String,
    output: O,
    allow_animation: bool,
    displayed: Option<IndicatorState>,
    lit: bool,
}

impl<O: IndicatorOutput> IndicatorDriver<O> {
    pub fn new(group: impl Into<String>, output: O, allow_animation: bool) -> Self {
        Self {
            group: group.into(),
            output,
            allow_animation,
            displayed: None,
            lit: false,
        }
    }

    /// State currently on the lamp, if anything has been written yet.
    pub fn displayed(&self) -> Option<IndicatorState> {
        self.displayed
    }

    /// Whether the current blink phase is the lit one.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Reconcile the lamp with `target` for one tick.
    ///
    /// On a failed write nothing is recorded, so the same write is attempted
    /// again on the next tick.
    pub async fn tick(&mut self, target: IndicatorState) -> Result<()> {
        let target = if self.allow_animation {
            target
        } else {
            IndicatorState::steady(target.color)
        };

        match self.displayed {
            Some(shown) if shown == target => {
                if target.animated {
                    let lit = !self.lit;
                    self.output.write(phase_levels(target.color, lit)).await?;
                    self.lit = lit;
                }
            }
            previous => {
                self.output.write(target.color.levels()).await?;
                self.displayed = Some(target);
                self.lit = true;
                tracing::info!(
                    group = %self.group,
                    from = %previous.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                    to = %target,
                    "Lamp changed"
                );
            }
        }
        Ok(())
    }

    /// Flash white for one interval, then go dark.
    pub async fn lamp_test(&mut self, hold: Duration, cancel: &CancellationToken) -> Result<()> {
        self.output.write(IndicatorColor::White.levels()).await?;
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(hold) => {}
        }
        self.output.write(ChannelLevels::OFF).await
    }

    /// Drive the lamp until `cancel` fires.
    pub async fn run(
        mut self,
        cell: IndicatorCell,
        interval: Duration,
        lamp_test: bool,
        cancel: CancellationToken,
    ) {
        if lamp_test {
            if let Err(e) = self.lamp_test(interval, &cancel).await {
                tracing::warn!(group = %self.group, error = %e, "Lamp test failed");
            }
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let target = cell.load().await;
            if let Err(e) = self.tick(target).await {
                tracing::warn!(group = %self.group, target = %target, error = %e, "Lamp write failed");
            }
        }

        tracing::info!(group = %self.group, "Driver stopped");
    }
}

fn phase_levels(color: IndicatorColor, lit: bool) -> ChannelLevels {
    if lit {
        color.levels()
    } else {
        ChannelLevels::OFF
    }
}
