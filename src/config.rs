use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::actuator::ChannelPins;
use crate::controller::ControllerSettings;
use crate::error::Result;
use crate::mapping::WristHold;
use crate::record::RecordFile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub calibration: CalibrationConfig,
    pub mapping: MappingConfig,
    pub input: InputConfig,
    pub actuator: ActuatorConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub record_path: PathBuf,
    pub dwell_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Thumb-to-wrist vertical offset above which wrist updates are held.
    pub thumb_motion_threshold_px: f64,
    pub wrist_hold_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub hand_index: usize,
    pub tick_interval_ms: u64,
    // Frame size used by the simulated hand.
    pub frame_width: u32,
    pub frame_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Serial port of the servo board, e.g. "/dev/ttyACM0" or "COM3".
    pub port: Option<String>,
    pub pins: ChannelPins,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            record_path: PathBuf::from(RecordFile::DEFAULT_PATH),
            dwell_ms: 2000,
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            thumb_motion_threshold_px: 20.0,
            wrist_hold_ms: 1000,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            hand_index: 0,
            tick_interval_ms: 33,
            frame_width: 1280,
            frame_height: 720,
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            port: None,
            pins: ChannelPins::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            mapping: MappingConfig::default(),
            input: InputConfig::default(),
            actuator: ActuatorConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "servo_hand.json";

    /// Loads the config, falling back to defaults when the file is missing
    /// or unparsable. A parsed or missing file is written back so new fields
    /// show up; an unparsable one is left as it is.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "configuration file not found, creating default");
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)?;
        // Missing fields take their defaults thanks to #[serde(default)].
        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!(path = %path.display(), "loaded configuration");
                config.save(path)?;
                Ok(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error parsing config, loading defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            dwell: Duration::from_millis(self.calibration.dwell_ms),
            hold: WristHold {
                thumb_threshold_px: self.mapping.thumb_motion_threshold_px,
                window: Duration::from_millis(self.mapping.wrist_hold_ms),
            },
            hand_index: self.input.hand_index,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.input.tick_interval_ms)
    }
}
