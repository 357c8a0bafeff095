use super::model::{round2, WavelengthGrid};
use crate::error::FileError;

// ---------------------------------------------------------------------------
// Segment lookup
// ---------------------------------------------------------------------------

/// Where each grid wavelength sits on a native axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    /// Left end of the axis segment used for this target.
    lo: usize,
    /// `axis[lo + 1] - axis[lo]`.
    width: f64,
    /// `target - axis[lo]`; negative or beyond `width` when extrapolating.
    offset: f64,
}

/// Precomputed mapping from one native axis onto a grid.
///
/// Built once per file and applied to each of its rows, so every row of a
/// file goes through exactly the same arithmetic.
#[derive(Debug, Clone)]
pub struct AxisMapping {
    segments: Vec<Segment>,
    native_len: usize,
}

impl AxisMapping {
    /// `axis` must be strictly increasing with at least 2 points.
    pub fn new(axis: &[f64], targets: &[f64]) -> Result<Self, FileError> {
        if axis.len() < 2 {
            return Err(FileError::TooFewPoints(axis.len()));
        }
        let last = axis.len() - 1;
        let segments = targets
            .iter()
            .map(|&t| {
                // First index with axis[k] >= t, clamped so [k-1, k] is a real segment.
                let hi = axis.partition_point(|&x| x < t).clamp(1, last);
                let lo = hi - 1;
                Segment {
                    lo,
                    width: axis[hi] - axis[lo],
                    offset: t - axis[lo],
                }
            })
            .collect();
        Ok(AxisMapping {
            segments,
            native_len: axis.len(),
        })
    }

    /// Linear interpolation of `values` at every target, boundary segments
    /// extended outside the axis.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        debug_assert_eq!(values.len(), self.native_len);
        self.segments
            .iter()
            .map(|s| {
                let y_lo = values[s.lo];
                let y_hi = values[s.lo + 1];
                let slope = (y_hi - y_lo) / s.width;
                slope * s.offset + y_lo
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Grid resampling
// ---------------------------------------------------------------------------

/// Resample every row of a file onto `grid`, rounding each value to 2 decimals.
pub fn resample_rows<'a, I>(
    axis: &[f64],
    rows: I,
    grid: &WavelengthGrid,
) -> Result<Vec<Vec<f64>>, FileError>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mapping = AxisMapping::new(axis, grid.wavelengths())?;
    Ok(rows
        .into_iter()
        .map(|values| mapping.apply(values).into_iter().map(round2).collect())
        .collect())
}

/// Resample a single row onto `grid`.
pub fn resample_row(axis: &[f64], values: &[f64], grid: &WavelengthGrid) -> Result<Vec<f64>, FileError> {
    let mapping = AxisMapping::new(axis, grid.wavelengths())?;
    Ok(mapping.apply(values).into_iter().map(round2).collect())
}
