use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::config::WavelengthRange;
use crate::error::{ConfigError, Error, Result};

/// Timestamp layout used by the instrument dumps and by exported tables.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Metadata column names, in table order.
pub const METADATA_COLUMNS: [&str; 4] = ["name", "spectrometer_id", "file_index", "datetime"];
pub const INTEGRATION_TIME_COLUMN: &str = "integration_time";

/// Round to 2 decimals, ties to even (the rounding every table value goes through).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

// ---------------------------------------------------------------------------
// WavelengthGrid – the shared x axis of a processing run
// ---------------------------------------------------------------------------

/// Strictly increasing, evenly spaced wavelengths rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthGrid {
    wavelengths: Vec<f64>,
}

impl WavelengthGrid {
    /// `points` evenly spaced values from `range.min` to `range.max`, both included.
    pub fn new(range: &WavelengthRange, points: usize) -> std::result::Result<Self, ConfigError> {
        if points == 0 {
            return Err(ConfigError::InvalidPointCount(points));
        }
        let wavelengths = if points == 1 {
            vec![round2(range.min)]
        } else {
            let step = (range.max - range.min) / (points - 1) as f64;
            let mut values: Vec<f64> = (0..points)
                .map(|i| round2(range.min + i as f64 * step))
                .collect();
            values[points - 1] = round2(range.max);
            values
        };

        // Too many points for 0.01 nm resolution collapse after rounding.
        if !is_strictly_increasing(&wavelengths) {
            return Err(ConfigError::InvalidPointCount(points));
        }
        Ok(WavelengthGrid { wavelengths })
    }

    /// Wrap an explicit axis. Values are rounded to 2 decimals.
    pub fn from_wavelengths(values: &[f64]) -> std::result::Result<Self, ConfigError> {
        let wavelengths: Vec<f64> = values.iter().copied().map(round2).collect();
        if wavelengths.is_empty() || !is_strictly_increasing(&wavelengths) {
            return Err(ConfigError::InvalidPointCount(wavelengths.len()));
        }
        Ok(WavelengthGrid { wavelengths })
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    /// Always false for a constructed grid.
    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Column headers for the wavelength part of a table.
    pub fn column_labels(&self) -> Vec<String> {
        self.wavelengths.iter().map(|w| format!("{w:.2}")).collect()
    }
}

pub(crate) fn is_strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

// ---------------------------------------------------------------------------
// SpectralRecord – one row of a processed / derived table
// ---------------------------------------------------------------------------

/// Named metadata of a row. Kept apart from the intensities so no
/// transform ever has to slice columns by position.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMeta {
    pub name: String,
    pub spectrometer_id: String,
    /// Groups all rows that came from one input file (the file stem).
    pub file_index: String,
    pub timestamp: NaiveDateTime,
    /// Seconds. `None` once rows have been averaged together.
    pub integration_time: Option<f64>,
}

/// A single spectrum: metadata plus one intensity per grid wavelength.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralRecord {
    pub meta: RecordMeta,
    pub intensities: Vec<f64>,
}

// ---------------------------------------------------------------------------
// SpectralDataset – the complete table
// ---------------------------------------------------------------------------

/// Ordered records sharing one [`WavelengthGrid`].
///
/// Every record holds exactly `grid.len()` intensities; the constructor
/// enforces it, and the transforms only ever produce new datasets through
/// constructors that keep it.
#[derive(Debug, Clone)]
pub struct SpectralDataset {
    grid: Arc<WavelengthGrid>,
    records: Vec<SpectralRecord>,
}

/// Output of the assembler.
pub type ProcessedDataset = SpectralDataset;
/// Output of a transform (standardized, normalized, smoothed, averaged...).
pub type DerivedDataset = SpectralDataset;

impl SpectralDataset {
    pub fn new(grid: Arc<WavelengthGrid>, records: Vec<SpectralRecord>) -> Result<Self> {
        if let Some(bad) = records.iter().find(|r| r.intensities.len() != grid.len()) {
            return Err(Error::GridMismatch {
                expected: grid.len(),
                found: bad.intensities.len(),
            });
        }
        Ok(SpectralDataset { grid, records })
    }

    /// Trusted constructor for transforms that build rows on the grid themselves.
    pub(crate) fn from_parts(grid: Arc<WavelengthGrid>, records: Vec<SpectralRecord>) -> Self {
        debug_assert!(records.iter().all(|r| r.intensities.len() == grid.len()));
        SpectralDataset { grid, records }
    }

    /// Same metadata and grid, intensities replaced record by record.
    pub(crate) fn map_rows<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&SpectralRecord) -> Vec<f64>,
    {
        let records = self
            .records
            .iter()
            .map(|r| SpectralRecord {
                meta: r.meta.clone(),
                intensities: f(r),
            })
            .collect();
        Self::from_parts(Arc::clone(&self.grid), records)
    }

    pub fn grid(&self) -> &WavelengthGrid {
        &self.grid
    }

    pub fn shared_grid(&self) -> Arc<WavelengthGrid> {
        Arc::clone(&self.grid)
    }

    pub fn records(&self) -> &[SpectralRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SpectralRecord> {
        self.records
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Intensities of one wavelength column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(move |r| r.intensities[index])
    }

    /// Distinct file indices in first-seen order.
    pub fn file_indices(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.meta.file_index.as_str())
            .filter(|idx| seen.insert(*idx))
            .collect()
    }

    /// True when every record carries an integration time.
    pub fn has_integration_time(&self) -> bool {
        self.records.iter().all(|r| r.meta.integration_time.is_some())
    }

    /// Metadata column names followed by one label per grid wavelength.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = METADATA_COLUMNS.iter().map(|c| c.to_string()).collect();
        if self.has_integration_time() {
            names.push(INTEGRATION_TIME_COLUMN.to_string());
        }
        names.extend(self.grid.column_labels());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn meta(file_index: &str) -> RecordMeta {
        RecordMeta {
            name: "sample".into(),
            spectrometer_id: "123".into(),
            file_index: file_index.into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_micro_opt(10, 0, 0, 500)
                .unwrap(),
            integration_time: Some(0.1),
        }
    }

    #[test]
    fn grid_spans_range_inclusive() {
        let range = WavelengthRange::new(200.0, 1050.0).unwrap();
        let grid = WavelengthGrid::new(&range, 3648).unwrap();
        assert_eq!(grid.len(), 3648);
        assert_eq!(grid.wavelengths()[0], 200.0);
        assert_eq!(grid.wavelengths()[3647], 1050.0);
        assert!(is_strictly_increasing(grid.wavelengths()));
        for w in grid.wavelengths() {
            assert_eq!(*w, round2(*w));
        }
    }

    #[test]
    fn grid_rejects_resolution_collapse() {
        let range = WavelengthRange::new(400.0, 401.0).unwrap();
        assert!(WavelengthGrid::new(&range, 1000).is_err());
        assert!(WavelengthGrid::new(&range, 101).is_ok());
    }

    #[test]
    fn single_point_grid_is_range_start() {
        let range = WavelengthRange::new(300.0, 900.0).unwrap();
        let grid = WavelengthGrid::new(&range, 1).unwrap();
        assert_eq!(grid.wavelengths(), &[300.0]);
    }

    #[test]
    fn round2_ties_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-1.234), -1.23);
    }

    #[test]
    fn dataset_rejects_off_grid_record() {
        let grid = Arc::new(WavelengthGrid::from_wavelengths(&[400.0, 500.0]).unwrap());
        let bad = SpectralRecord {
            meta: meta("a"),
            intensities: vec![1.0, 2.0, 3.0],
        };
        let err = SpectralDataset::new(grid, vec![bad]).unwrap_err();
        assert!(matches!(err, Error::GridMismatch { expected: 2, found: 3 }));
    }

    #[test]
    fn file_indices_keep_first_seen_order() {
        let grid = Arc::new(WavelengthGrid::from_wavelengths(&[400.0]).unwrap());
        let records = ["b", "a", "b", "c", "a"]
            .iter()
            .map(|idx| SpectralRecord {
                meta: meta(idx),
                intensities: vec![0.0],
            })
            .collect();
        let ds = SpectralDataset::new(grid, records).unwrap();
        assert_eq!(ds.file_indices(), vec!["b", "a", "c"]);
        assert_eq!(
            ds.column_names(),
            vec!["name", "spectrometer_id", "file_index", "datetime", "integration_time", "400.00"]
        );

        let owned: Vec<String> = ds.into_records().into_iter().map(|r| r.meta.file_index).collect();
        assert_eq!(owned, vec!["b", "a", "b", "c", "a"]);
    }
}
