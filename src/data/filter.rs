use super::loader::{RawInstrumentFile, RawRow};
use crate::config::WavelengthRange;
use crate::error::FileError;

/// The one instrument class whose axis is reported with a systematic offset.
pub const CALIBRATED_SPECTROMETER_ID: &str = "300";

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Native axis after the per-instrument offset correction.
///
/// Only spectrometer `300` is shifted; every other id is returned unchanged.
pub fn calibrated_axis(spectrometer_id: &str, wavelengths: &[f64], shift_nm: f64) -> Vec<f64> {
    if spectrometer_id == CALIBRATED_SPECTROMETER_ID {
        wavelengths.iter().map(|w| w + shift_nm).collect()
    } else {
        wavelengths.to_vec()
    }
}

// ---------------------------------------------------------------------------
// Range filter
// ---------------------------------------------------------------------------

/// Positions of the axis that fall inside the inclusive analysis range.
pub fn columns_in_range(wavelengths: &[f64], range: &WavelengthRange) -> Vec<usize> {
    wavelengths
        .iter()
        .enumerate()
        .filter(|(_, w)| range.contains(**w))
        .map(|(i, _)| i)
        .collect()
}

/// A file's rows restricted to the analysis range, on the calibrated axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredFile {
    pub wavelengths: Vec<f64>,
    pub rows: Vec<RawRow>,
}

/// Apply the calibration shift, then drop every column outside `range`.
///
/// Fails with [`FileError::Empty`] when no column survives.
pub fn calibrate_and_filter(
    raw: &RawInstrumentFile,
    range: &WavelengthRange,
    shift_nm: f64,
) -> Result<FilteredFile, FileError> {
    let axis = calibrated_axis(&raw.spectrometer_id, &raw.wavelengths, shift_nm);
    let keep = columns_in_range(&axis, range);
    if keep.is_empty() {
        return Err(FileError::Empty);
    }

    let wavelengths = keep.iter().map(|&i| axis[i]).collect();
    let rows = raw
        .rows
        .iter()
        .map(|row| RawRow {
            timestamp: row.timestamp,
            intensities: keep.iter().map(|&i| row.intensities[i]).collect(),
        })
        .collect();

    Ok(FilteredFile { wavelengths, rows })
}
