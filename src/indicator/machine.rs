//! LED State Machine.
//!
//! Maps a group's current and previous [`GroupStatus`] to the lamp state the
//! driver should show. The group status is first reduced to a [`Condition`]
//! by a strict priority order; the mapping from condition to lamp state then
//! only needs the success-display timer to resolve the blue case.
//!
//! | Priority | Condition      | Lamp             |
//! |----------|----------------|------------------|
//! | 1        | `AllDisabled`  | off              |
//! | 2        | `Building`     | yellow, blinking |
//! | 3a       | `StaleSuccess` | yellow, steady   |
//! | 3b       | `Success`      | blue until the success timeout, then off |
//! | 4        | `Failure`      | red, blinking    |

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::indicator::state::{IndicatorColor, IndicatorState};
use crate::status::GroupStatus;

/// A group status reduced to the single rule that applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    AllDisabled,
    Building,
    StaleSuccess,
    Success,
    Failure,
}

impl Condition {
    /// First matching rule wins.
    pub fn of(status: &GroupStatus) -> Self {
        if status.all_disabled {
            Condition::AllDisabled
        } else if status.is_building {
            Condition::Building
        } else if status.is_success && status.is_stale {
            Condition::StaleSuccess
        } else if status.is_success {
            Condition::Success
        } else {
            Condition::Failure
        }
    }
}

/// Per-group state machine. Owned by the evaluator loop.
#[derive(Debug, Clone)]
pub struct LedStateMachine {
    success_timeout: Duration,
    last_success_at: Option<DateTime<Utc>>,
    success_timer_armed: bool,
}

impl LedStateMachine {
    pub fn new(success_timeout: Duration) -> Self {
        Self {
            success_timeout,
            last_success_at: None,
            success_timer_armed: false,
        }
    }

    /// Compute the lamp state for this cycle.
    ///
    /// `previous` must be the status computed on the immediately preceding
    /// cycle. Only the success rule touches the timer.
    pub fn next(
        &mut self,
        current: &GroupStatus,
        previous: &GroupStatus,
        now: DateTime<Utc>,
    ) -> IndicatorState {
        match Condition::of(current) {
            Condition::AllDisabled => IndicatorState::OFF,
            Condition::Building => IndicatorState::blinking(IndicatorColor::Yellow),
            Condition::StaleSuccess => IndicatorState::steady(IndicatorColor::Yellow),
            Condition::Success if previous.is_settled_success() => self.hold_success(now),
            Condition::Success => {
                self.last_success_at = Some(now);
                self.success_timer_armed = true;
                IndicatorState::steady(IndicatorColor::Blue)
            }
            Condition::Failure => IndicatorState::blinking(IndicatorColor::Red),
        }
    }

    /// Success persisted from the last cycle: keep blue until the timeout
    /// fires once, then stay dark without re-arming.
    fn hold_success(&mut self, now: DateTime<Utc>) -> IndicatorState {
        let Some(since) = self.last_success_at.filter(|_| self.success_timer_armed) else {
            return IndicatorState::OFF;
        };

        let timeout_secs = i64::try_from(self.success_timeout.as_secs()).unwrap_or(i64::MAX);
        if (now - since).num_seconds() > timeout_secs {
            self.success_timer_armed = false;
            IndicatorState::OFF
        } else {
            IndicatorState::steady(IndicatorColor::Blue)
        }
    }

    pub fn success_timer_armed(&self) -> bool {
        self.success_timer_armed
    }

    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn status(all_disabled: bool, building: bool, success: bool, stale: bool) -> GroupStatus {
        GroupStatus {
            all_disabled,
            is_building: building,
            is_success: success,
            is_stale: stale,
        }
    }

    const GREEN: GroupStatus = GroupStatus {
        all_disabled: false,
        is_building: false,
        is_success: true,
        is_stale: false,
    };

    #[test]
    fn condition_priority_order() {
        // all_disabled beats everything
        assert_eq!(Condition::of(&status(true, true, false, true)), Condition::AllDisabled);
        // building beats failure and staleness
        assert_eq!(Condition::of(&status(false, true, false, false)), Condition::Building);
        assert_eq!(Condition::of(&status(false, true, true, true)), Condition::Building);
        // staleness only degrades success
        assert_eq!(Condition::of(&status(false, false, true, true)), Condition::StaleSuccess);
        assert_eq!(Condition::of(&status(false, false, false, true)), Condition::Failure);
        assert_eq!(Condition::of(&GREEN), Condition::Success);
        assert_eq!(Condition::of(&status(false, false, false, false)), Condition::Failure);
    }

    #[test]
    fn fresh_success_arms_timer() {
        let mut machine = LedStateMachine::new(Duration::from_secs(5));
        let now = Utc::now();

        let state = machine.next(&GREEN, &GroupStatus::default(), now);

        assert_eq!(state, IndicatorState::steady(IndicatorColor::Blue));
        assert!(machine.success_timer_armed());
        assert_eq!(machine.last_success_at(), Some(now));
    }

    #[test]
    fn success_holds_blue_until_timeout() {
        let mut machine = LedStateMachine::new(Duration::from_secs(5));
        let t0 = Utc::now();
        machine.next(&GREEN, &GroupStatus::default(), t0);

        let state = machine.next(&GREEN, &GREEN, t0 + TimeDelta::seconds(5));
        assert_eq!(state, IndicatorState::steady(IndicatorColor::Blue));
        assert!(machine.success_timer_armed());
        assert_eq!(machine.last_success_at(), Some(t0));
    }

    #[test]
    fn timeout_fires_once_and_never_rearms() {
        let mut machine = LedStateMachine::new(Duration::from_secs(5));
        let t0 = Utc::now();
        machine.next(&GREEN, &GroupStatus::default(), t0);

        let state = machine.next(&GREEN, &GREEN, t0 + TimeDelta::seconds(6));
        assert_eq!(state, IndicatorState::OFF);
        assert!(!machine.success_timer_armed());

        for later in 7..20 {
            let state = machine.next(&GREEN, &GREEN, t0 + TimeDelta::seconds(later));
            assert_eq!(state, IndicatorState::OFF);
            assert!(!machine.success_timer_armed());
        }
    }

    #[test]
    fn new_transition_into_success_rearms() {
        let mut machine = LedStateMachine::new(Duration::from_secs(5));
        let t0 = Utc::now();
        machine.next(&GREEN, &GroupStatus::default(), t0);
        machine.next(&GREEN, &GREEN, t0 + TimeDelta::seconds(6));

        let building = status(false, true, true, false);
        let state = machine.next(&building, &GREEN, t0 + TimeDelta::seconds(7));
        assert_eq!(state, IndicatorState::blinking(IndicatorColor::Yellow));

        let t1 = t0 + TimeDelta::seconds(8);
        let state = machine.next(&GREEN, &building, t1);
        assert_eq!(state, IndicatorState::steady(IndicatorColor::Blue));
        assert!(machine.success_timer_armed());
        assert_eq!(machine.last_success_at(), Some(t1));
    }

    #[test]
    fn stale_previous_cycle_counts_as_fresh_arrival() {
        let mut machine = LedStateMachine::new(Duration::from_secs(5));
        let now = Utc::now();
        let stale = status(false, false, true, true);

        assert_eq!(
            machine.next(&stale, &GroupStatus::default(), now),
            IndicatorState::steady(IndicatorColor::Yellow)
        );
        assert!(!machine.success_timer_armed());

        assert_eq!(
            machine.next(&GREEN, &stale, now),
            IndicatorState::steady(IndicatorColor::Blue)
        );
        assert!(machine.success_timer_armed());
    }

    #[test]
    fn non_success_rules_leave_timer_alone() {
        let mut machine = LedStateMachine::new(Duration::from_secs(5));
        let t0 = Utc::now();
        machine.next(&GREEN, &GroupStatus::default(), t0);

        let failing = status(false, false, false, false);
        assert_eq!(
            machine.next(&failing, &GREEN, t0),
            IndicatorState::blinking(IndicatorColor::Red)
        );
        assert_eq!(
            machine.next(&status(true, false, true, false), &failing, t0),
            IndicatorState::OFF
        );
        assert!(machine.success_timer_armed());
        assert_eq!(machine.last_success_at(), Some(t0));
    }
}
