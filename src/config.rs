use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Lowest wavelength (nm) the supported spectrometers report.
pub const MIN_SUPPORTED_NM: f64 = 200.0;
/// Highest wavelength (nm) the supported spectrometers report.
pub const MAX_SUPPORTED_NM: f64 = 1050.0;
/// Pixel count of the detector; the default grid density.
pub const DEFAULT_INTERPOLATION_POINTS: usize = 3648;
pub const DEFAULT_CALIBRATION_SHIFT_NM: f64 = 2.0;

// ---------------------------------------------------------------------------
// WavelengthRange
// ---------------------------------------------------------------------------

/// Inclusive analysis bandwidth in nanometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavelengthRange {
    pub min: f64,
    pub max: f64,
}

impl WavelengthRange {
    /// Build a range, rejecting anything outside `200 <= min < max <= 1050`.
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigError> {
        let range = WavelengthRange { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Written so that NaN bounds fail too.
        let ok = self.min >= MIN_SUPPORTED_NM && self.max <= MAX_SUPPORTED_NM && self.min < self.max;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidRange {
                min: self.min,
                max: self.max,
            })
        }
    }

    pub fn contains(&self, wavelength: f64) -> bool {
        wavelength >= self.min && wavelength <= self.max
    }
}

impl Default for WavelengthRange {
    fn default() -> Self {
        WavelengthRange {
            min: MIN_SUPPORTED_NM,
            max: MAX_SUPPORTED_NM,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Parameters consumed by [`crate::pipeline::SpectralPipeline`].
///
/// Every field has a default, so a JSON document only needs the keys it
/// wants to override:
///
/// ```json
/// { "wavelength_range": { "min": 300, "max": 1050 }, "calibration_shift_nm": 3 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub wavelength_range: WavelengthRange,
    /// Number of points of the shared wavelength grid.
    pub interpolation_points: usize,
    /// Offset added to the axis of spectrometer `300` before filtering.
    pub calibration_shift_nm: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            wavelength_range: WavelengthRange::default(),
            interpolation_points: DEFAULT_INTERPOLATION_POINTS,
            calibration_shift_nm: DEFAULT_CALIBRATION_SHIFT_NM,
        }
    }
}

impl PipelineConfig {
    pub fn new(
        wavelength_range: (f64, f64),
        interpolation_points: usize,
        calibration_shift_nm: f64,
    ) -> Result<Self, ConfigError> {
        let config = PipelineConfig {
            wavelength_range: WavelengthRange::new(wavelength_range.0, wavelength_range.1)?,
            interpolation_points,
            calibration_shift_nm,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wavelength_range.validate()?;
        if self.interpolation_points == 0 {
            return Err(ConfigError::InvalidPointCount(self.interpolation_points));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
