use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::DEFAULT_CONF_THRESHOLD;
use crate::ingest::CaptureSettings;
use crate::source::SLOT_COUNT;
use crate::storage::DEFAULT_SAVE_ROOT;

const DEFAULT_TICK_MS: u64 = 30;
const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 1024;

#[derive(Debug, Deserialize, Default)]
struct ChainwatchConfigFile {
    tick_ms: Option<u64>,
    save_dir: Option<String>,
    cameras: Option<Vec<u32>>,
    capture: Option<CaptureConfigFile>,
    detector: Option<DetectorConfigFile>,
    signal: Option<SignalConfigFile>,
    video: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    model_path: Option<PathBuf>,
    conf_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct SignalConfigFile {
    gpio_pin: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ChainwatchConfig {
    /// Polling cadence.
    pub tick: Duration,
    /// Root directory for saved defect images.
    pub save_dir: PathBuf,
    /// Capture device index per slot.
    pub cameras: [u32; SLOT_COUNT],
    pub capture: CaptureSettings,
    /// Path to the detector model, if one is deployed.
    pub model_path: Option<PathBuf>,
    pub conf_threshold: f32,
    /// GPIO pin for the halt signal line, if wired.
    pub gpio_pin: Option<u32>,
    /// Start directly in video-demo mode with this file.
    pub video: Option<PathBuf>,
}

impl ChainwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CHAINWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ChainwatchConfigFile) -> Result<Self> {
        let tick = Duration::from_millis(file.tick_ms.unwrap_or(DEFAULT_TICK_MS));
        let save_dir = PathBuf::from(
            file.save_dir
                .unwrap_or_else(|| DEFAULT_SAVE_ROOT.to_string()),
        );
        let cameras = match file.cameras {
            Some(list) => parse_cameras(&list)?,
            None => default_cameras(),
        };
        let capture = CaptureSettings {
            width: file
                .capture
                .as_ref()
                .and_then(|c| c.width)
                .unwrap_or(DEFAULT_WIDTH),
            height: file
                .capture
                .as_ref()
                .and_then(|c| c.height)
                .unwrap_or(DEFAULT_HEIGHT),
        };
        let model_path = file.detector.as_ref().and_then(|d| d.model_path.clone());
        let conf_threshold = file
            .detector
            .as_ref()
            .and_then(|d| d.conf_threshold)
            .unwrap_or(DEFAULT_CONF_THRESHOLD);
        let gpio_pin = file.signal.and_then(|s| s.gpio_pin);
        let video = file.video.map(PathBuf::from);
        Ok(Self {
            tick,
            save_dir,
            cameras,
            capture,
            model_path,
            conf_threshold,
            gpio_pin,
            video,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(tick) = std::env::var("CHAINWATCH_TICK_MS") {
            let ms: u64 = tick
                .parse()
                .map_err(|_| anyhow!("CHAINWATCH_TICK_MS must be an integer of milliseconds"))?;
            self.tick = Duration::from_millis(ms);
        }
        if let Ok(dir) = std::env::var("CHAINWATCH_SAVE_DIR") {
            if !dir.trim().is_empty() {
                self.save_dir = PathBuf::from(dir);
            }
        }
        if let Ok(cameras) = std::env::var("CHAINWATCH_CAMERAS") {
            let list = split_csv(&cameras)
                .iter()
                .map(|entry| {
                    entry
                        .parse::<u32>()
                        .map_err(|_| anyhow!("CHAINWATCH_CAMERAS must be device indices"))
                })
                .collect::<Result<Vec<_>>>()?;
            if !list.is_empty() {
                self.cameras = parse_cameras(&list)?;
            }
        }
        if let Ok(threshold) = std::env::var("CHAINWATCH_CONF_THRESHOLD") {
            self.conf_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("CHAINWATCH_CONF_THRESHOLD must be a number"))?;
        }
        if let Ok(pin) = std::env::var("CHAINWATCH_GPIO") {
            self.gpio_pin = Some(
                pin.parse()
                    .map_err(|_| anyhow!("CHAINWATCH_GPIO must be a pin number"))?,
            );
        }
        if let Ok(video) = std::env::var("CHAINWATCH_VIDEO") {
            if !video.trim().is_empty() {
                self.video = Some(PathBuf::from(video));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(anyhow!("tick interval must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.conf_threshold) || self.conf_threshold == 0.0 {
            return Err(anyhow!("confidence threshold must be in (0, 1]"));
        }
        Ok(())
    }
}

fn default_cameras() -> [u32; SLOT_COUNT] {
    let mut cameras = [0u32; SLOT_COUNT];
    for (i, cam) in cameras.iter_mut().enumerate() {
        *cam = i as u32;
    }
    cameras
}

fn parse_cameras(list: &[u32]) -> Result<[u32; SLOT_COUNT]> {
    if list.len() != SLOT_COUNT {
        return Err(anyhow!(
            "expected exactly {} camera indices, got {}",
            SLOT_COUNT,
            list.len()
        ));
    }
    let mut cameras = [0u32; SLOT_COUNT];
    cameras.copy_from_slice(list);
    Ok(cameras)
}

fn read_config_file(path: &Path) -> Result<ChainwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
