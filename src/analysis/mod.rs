//! Statistical views over a processed table.
//!
//! Every transform reads a dataset snapshot and returns a new one with the
//! same grid. Degenerate inputs are not guarded: a constant row normalizes
//! to non-finite values, a zero-variance column standardizes to non-finite
//! values.

pub mod savgol;

use std::collections::HashMap;

use crate::data::model::{DerivedDataset, RecordMeta, SpectralDataset, SpectralRecord};
use crate::error::{ConfigError, Error, Result};

pub use savgol::SavitzkyGolay;

// ---------------------------------------------------------------------------
// Column / row scaling
// ---------------------------------------------------------------------------

/// Per-wavelength z-score across all rows, using the population standard deviation.
pub fn standardize(dataset: &SpectralDataset) -> DerivedDataset {
    let n = dataset.len() as f64;
    let (means, stds): (Vec<f64>, Vec<f64>) = (0..dataset.grid().len())
        .map(|j| {
            let mean = dataset.column(j).sum::<f64>() / n;
            let var = dataset.column(j).map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            (mean, var.sqrt())
        })
        .unzip();

    dataset.map_rows(|r| {
        r.intensities
            .iter()
            .zip(means.iter().zip(&stds))
            .map(|(x, (mean, std))| (x - mean) / std)
            .collect()
    })
}

/// Per-row min-max scaling to `[0, 1]`.
pub fn normalize(dataset: &SpectralDataset) -> DerivedDataset {
    dataset.map_rows(|r| {
        let row = &r.intensities;
        let min = row.iter().copied().fold(f64::INFINITY, f64::min);
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        row.iter().map(|x| (x - min) / span).collect()
    })
}

/// Divide every intensity by its record's integration time (counts per second).
pub fn scale_by_integration_time(dataset: &SpectralDataset) -> Result<DerivedDataset> {
    if let Some(r) = dataset.records().iter().find(|r| r.meta.integration_time.is_none()) {
        return Err(Error::MissingIntegrationTime {
            file_index: r.meta.file_index.clone(),
        });
    }
    Ok(dataset.map_rows(|r| {
        let t = r.meta.integration_time.unwrap_or(f64::NAN);
        r.intensities.iter().map(|x| x / t).collect()
    }))
}

// ---------------------------------------------------------------------------
// Smoothing
// ---------------------------------------------------------------------------

/// Savitzky–Golay smoothing of every row along the wavelength axis.
///
/// `window_length` must be odd and no longer than the grid; `polyorder`
/// must be below `window_length`.
pub fn smooth(
    dataset: &SpectralDataset,
    window_length: usize,
    polyorder: usize,
) -> std::result::Result<DerivedDataset, ConfigError> {
    let filter = SavitzkyGolay::new(window_length, polyorder)?;
    filter.check_len(dataset.grid().len())?;
    Ok(dataset.map_rows(|r| filter.apply(&r.intensities)))
}

/// Caller-owned memo of smoothed views of one dataset snapshot.
///
/// Borrowing the source ties the cache's lifetime to that snapshot; a new
/// snapshot needs a new cache.
#[derive(Debug)]
pub struct SmoothingCache<'a> {
    source: &'a SpectralDataset,
    entries: HashMap<(usize, usize), DerivedDataset>,
}

impl<'a> SmoothingCache<'a> {
    pub fn new(source: &'a SpectralDataset) -> Self {
        SmoothingCache {
            source,
            entries: HashMap::new(),
        }
    }

    pub fn source(&self) -> &'a SpectralDataset {
        self.source
    }

    /// Smoothed view for these parameters, computed on first request.
    pub fn get_or_smooth(
        &mut self,
        window_length: usize,
        polyorder: usize,
    ) -> std::result::Result<&DerivedDataset, ConfigError> {
        let key = (window_length, polyorder);
        if !self.entries.contains_key(&key) {
            let smoothed = smooth(self.source, window_length, polyorder)?;
            self.entries.insert(key, smoothed);
        }
        Ok(&self.entries[&key])
    }

    pub fn get(&self, window_length: usize, polyorder: usize) -> Option<&DerivedDataset> {
        self.entries.get(&(window_length, polyorder))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Averaging
// ---------------------------------------------------------------------------

/// One mean spectrum per file index, in first-seen order.
///
/// Metadata comes from the first row of each group; the integration time
/// is dropped.
pub fn average(dataset: &SpectralDataset) -> DerivedDataset {
    let width = dataset.grid().len();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(RecordMeta, Vec<f64>, usize)> = Vec::new();

    for record in dataset.records() {
        let slot = *slots.entry(record.meta.file_index.as_str()).or_insert_with(|| {
            groups.push((
                RecordMeta {
                    integration_time: None,
                    ..record.meta.clone()
                },
                vec![0.0; width],
                0,
            ));
            groups.len() - 1
        });
        let (_, sums, count) = &mut groups[slot];
        for (sum, x) in sums.iter_mut().zip(&record.intensities) {
            *sum += x;
        }
        *count += 1;
    }

    let records = groups
        .into_iter()
        .map(|(meta, sums, count)| SpectralRecord {
            meta,
            intensities: sums.into_iter().map(|s| s / count as f64).collect(),
        })
        .collect();
    SpectralDataset::from_parts(dataset.shared_grid(), records)
}
