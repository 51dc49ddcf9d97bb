use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::ranges::CalibrationRanges;

/// Where the calibration session persists the range store.
pub trait RecordStore {
    /// Loads the stored ranges. Missing or malformed records yield an empty store.
    fn load(&self) -> CalibrationRanges;

    /// Replaces the whole stored record.
    fn save(&mut self, ranges: &CalibrationRanges) -> Result<()>;
}

/// JSON file on disk, `calibration_data.json` by default.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub const DEFAULT_PATH: &'static str = "calibration_data.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for RecordFile {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATH)
    }
}

impl RecordStore for RecordFile {
    fn load(&self) -> CalibrationRanges {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no calibration record, starting empty");
                return CalibrationRanges::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read calibration record, starting empty");
                return CalibrationRanges::new();
            }
        };

        match CalibrationRanges::deserialize(&bytes) {
            Ok(ranges) => {
                info!(
                    path = %self.path.display(),
                    fingers = ranges.is_finger_ready(),
                    wrist = ranges.is_wrist_ready(),
                    "loaded calibration record"
                );
                ranges
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring calibration record");
                CalibrationRanges::new()
            }
        }
    }

    fn save(&mut self, ranges: &CalibrationRanges) -> Result<()> {
        let bytes = ranges.serialize()?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        // Write beside the target and rename so readers never see half a record.
        let tmp = self.temp_path();
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), "calibration record saved");
        Ok(())
    }
}

/// In-memory record, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecord {
    pub bytes: Option<Vec<u8>>,
    pub writes: usize,
}

impl RecordStore for MemoryRecord {
    fn load(&self) -> CalibrationRanges {
        self.bytes
            .as_deref()
            .and_then(|b| CalibrationRanges::deserialize(b).ok())
            .unwrap_or_default()
    }

    fn save(&mut self, ranges: &CalibrationRanges) -> Result<()> {
        self.bytes = Some(ranges.serialize()?);
        self.writes += 1;
        Ok(())
    }
}
