use std::future::Future;
use std::path::{Path, PathBuf};

use crate::config::{GroupConfig, IndicatorPins};
use crate::error::{LampError, Result};
use crate::indicator::state::ChannelLevels;

/// Default mount point of the sysfs GPIO interface.
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// Physical sink for one group's three lamp lines.
///
/// A write sets all three lines; implementations must not leave a partial
/// triple behind on success.
pub trait IndicatorOutput: Send + 'static {
    fn write(&mut self, levels: ChannelLevels) -> impl Future<Output = Result<()>> + Send;
}

/// Output selected at startup from [`OutputKind`].
#[derive(Debug)]
pub enum LampOutput {
    Gpio(SysfsGpio),
    Simulated(SimulatedOutput),
}

impl IndicatorOutput for LampOutput {
    async fn write(&mut self, levels: ChannelLevels) -> Result<()> {
        match self {
            LampOutput::Gpio(gpio) => gpio.write(levels).await,
            LampOutput::Simulated(sim) => sim.write(levels).await,
        }
    }
}

/// Where lamp writes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    /// Real LEDs on exported sysfs GPIO lines below `root`.
    Gpio { root: PathBuf },
    /// Log every write instead of touching hardware.
    Simulated,
}

impl OutputKind {
    pub fn open(&self, group: &GroupConfig) -> Result<LampOutput> {
        match self {
            OutputKind::Gpio { root } => Ok(LampOutput::Gpio(SysfsGpio::open(root, group.pins)?)),
            OutputKind::Simulated => Ok(LampOutput::Simulated(SimulatedOutput::new(
                &group.name,
                group.pins,
            ))),
        }
    }
}

impl Default for OutputKind {
    fn default() -> Self {
        OutputKind::Gpio {
            root: PathBuf::from(DEFAULT_GPIO_ROOT),
        }
    }
}

/// Three already-exported, output-direction sysfs GPIO lines.
///
/// The lamp is wired active-low: a lit line is driven to `0`.
#[derive(Debug)]
pub struct SysfsGpio {
    pins: IndicatorPins,
    values: [PathBuf; 3],
}

impl SysfsGpio {
    pub fn open(root: &Path, pins: IndicatorPins) -> Result<Self> {
        let values = [pins.red, pins.green, pins.blue].map(|pin| value_path(root, pin));
        for (pin, path) in [pins.red, pins.green, pins.blue].into_iter().zip(&values) {
            std::fs::metadata(path).map_err(|source| LampError::Output {
                pin,
                path: path.clone(),
                source,
            })?;
        }
        Ok(Self { pins, values })
    }

    async fn write_line(pin: u32, path: &Path, lit: bool) -> Result<()> {
        let level = if lit { "0" } else { "1" };
        tokio::fs::write(path, level)
            .await
            .map_err(|source| LampError::Output {
                pin,
                path: path.to_path_buf(),
                source,
            })
    }
}

impl IndicatorOutput for SysfsGpio {
    async fn write(&mut self, levels: ChannelLevels) -> Result<()> {
        let [red, green, blue] = &self.values;
        Self::write_line(self.pins.red, red, levels.red).await?;
        Self::write_line(self.pins.green, green, levels.green).await?;
        Self::write_line(self.pins.blue, blue, levels.blue).await
    }
}

fn value_path(root: &Path, pin: u32) -> PathBuf {
    root.join(format!("gpio{pin}")).join("value")
}

/// Stand-in used with `--simulate`.
#[derive(Debug, Clone)]
pub struct SimulatedOutput {
    group: String,
    pins: IndicatorPins,
}

impl SimulatedOutput {
    pub fn new(group: &str, pins: IndicatorPins) -> Self {
        Self {
            group: group.to_string(),
            pins,
        }
    }
}

impl IndicatorOutput for SimulatedOutput {
    async fn write(&mut self, levels: ChannelLevels) -> Result<()> {
        tracing::info!(
            group = %self.group,
            pins = %self.pins,
            levels = %levels,
            "Lamp write"
        );
        Ok(())
    }
}
