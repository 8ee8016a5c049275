//! Binary signal-output side channel.
//!
//! When the line halts on a defect, the gate asserts a brief low pulse on
//! whatever hardware is present. The pulse is best-effort: failures are
//! logged and never affect gate transitions, and the hold time bounds how
//! long a pulse can block the tick.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// How long the line is held low before restoring.
pub const PULSE_HOLD: Duration = Duration::from_millis(500);

pub trait SignalLine: Send {
    /// Assert a brief low pulse. Best-effort; bounded by `PULSE_HOLD`.
    fn pulse_low(&mut self) -> Result<()>;
}

/// No hardware attached: the pulse is a logged no-op.
pub struct NoopSignal;

impl SignalLine for NoopSignal {
    fn pulse_low(&mut self) -> Result<()> {
        log::info!("signal: low pulse (no hardware attached)");
        Ok(())
    }
}

/// Drives a Linux GPIO line through the sysfs value file. The pin must be
/// exported and configured as an output beforehand.
pub struct SysfsGpioSignal {
    value_path: PathBuf,
}

impl SysfsGpioSignal {
    pub fn new(pin: u32) -> Self {
        Self {
            value_path: PathBuf::from(format!("/sys/class/gpio/gpio{pin}/value")),
        }
    }

    #[cfg(test)]
    fn with_value_path(value_path: PathBuf) -> Self {
        Self { value_path }
    }

    fn write_level(&self, level: u8) -> Result<()> {
        std::fs::write(&self.value_path, if level == 0 { "0" } else { "1" })
            .with_context(|| format!("write gpio value {}", self.value_path.display()))
    }
}

impl SignalLine for SysfsGpioSignal {
    fn pulse_low(&mut self) -> Result<()> {
        self.write_level(0)?;
        std::thread::sleep(PULSE_HOLD);
        self.write_level(1)?;
        log::info!("signal: low pulse via {}", self.value_path.display());
        Ok(())
    }
}

/// Counts pulses. For tests asserting "exactly one pulse per halt".
#[derive(Clone, Default)]
pub struct CountingSignal {
    count: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl CountingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> usize {
        self.count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl SignalLine for CountingSignal {
    fn pulse_low(&mut self) -> Result<()> {
        self.count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sysfs_pulse_writes_low_then_high() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        let mut signal = SysfsGpioSignal::with_value_path(file.path().to_path_buf());

        signal.pulse_low()?;

        let restored = std::fs::read_to_string(file.path())?;
        assert_eq!(restored, "1");
        Ok(())
    }

    #[test]
    fn missing_gpio_reports_an_error() {
        let mut signal =
            SysfsGpioSignal::with_value_path(PathBuf::from("/nonexistent/gpio/value"));
        assert!(signal.pulse_low().is_err());
    }

    #[test]
    fn counting_signal_counts() -> Result<()> {
        let signal = CountingSignal::new();
        let mut line = signal.clone();
        line.pulse_low()?;
        line.pulse_low()?;
        assert_eq!(signal.pulses(), 2);
        Ok(())
    }
}
