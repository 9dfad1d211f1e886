//! Lamp side of a group: what to show, and showing it.
//!
//! - [`state`]: lamp colors and the shared [`IndicatorState`] value
//! - [`machine`]: status → lamp state rules ([`LedStateMachine`])
//! - [`cell`]: the lock-guarded value shared with the driver
//! - [`output`]: physical backends (sysfs GPIO, simulated)
//! - [`driver`]: the blink/hold loop ([`IndicatorDriver`])

pub mod cell;
pub mod driver;
pub mod machine;
pub mod output;
pub mod state;

pub use cell::IndicatorCell;
pub use driver::IndicatorDriver;
pub use machine::{Condition, LedStateMachine};
pub use output::{IndicatorOutput, LampOutput, OutputKind, SimulatedOutput, SysfsGpio};
pub use state::{ChannelLevels, IndicatorColor, IndicatorState};
