use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::data::filter::calibrate_and_filter;
use crate::data::loader::{load_instrument_file, RawInstrumentFile};
use crate::data::model::{ProcessedDataset, RecordMeta, SpectralDataset, SpectralRecord, WavelengthGrid};
use crate::data::resample::resample_rows;
use crate::error::{ConfigError, Error, FileError, Result};

// ---------------------------------------------------------------------------
// Batch result
// ---------------------------------------------------------------------------

/// A file the assembler had to leave out, and why.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: FileError,
}

/// Resampled rows of one file.
#[derive(Debug, Clone)]
pub struct FileRecords {
    pub records: Vec<SpectralRecord>,
    pub skipped_rows: usize,
}

/// Outcome of a batch run: the table plus what was dropped on the way.
#[derive(Debug)]
pub struct ProcessedBatch {
    pub dataset: ProcessedDataset,
    /// Files excluded from `dataset`, in input order.
    pub failures: Vec<FileFailure>,
    /// Data rows skipped across all included files.
    pub skipped_rows: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Parse → calibrate/filter → resample, for a closed list of files.
#[derive(Debug, Clone)]
pub struct SpectralPipeline {
    config: PipelineConfig,
    grid: Arc<WavelengthGrid>,
}

impl SpectralPipeline {
    /// Validate the configuration and build the shared grid.
    pub fn new(config: PipelineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let grid = WavelengthGrid::new(&config.wavelength_range, config.interpolation_points)?;
        Ok(SpectralPipeline {
            config,
            grid: Arc::new(grid),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn grid(&self) -> &WavelengthGrid {
        &self.grid
    }

    /// Process every path in order. Files that fail are logged and left out;
    /// only a batch where nothing survives is an error.
    pub fn process<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ProcessedBatch> {
        let (records, failures, skipped_rows) = paths.iter().fold(
            (Vec::new(), Vec::new(), 0),
            |(mut records, mut failures, skipped), path| {
                let path: &Path = path.as_ref();
                log::info!("Processing file: {}", path.display());
                match self.process_file(path) {
                    Ok(file) => {
                        records.extend(file.records);
                        (records, failures, skipped + file.skipped_rows)
                    }
                    Err(error) => {
                        if error.is_empty() {
                            log::warn!("{} is empty, skipping", path.display());
                        } else {
                            log::error!("Error processing {}: {error}", path.display());
                        }
                        failures.push(FileFailure {
                            path: path.to_path_buf(),
                            error,
                        });
                        (records, failures, skipped)
                    }
                }
            },
        );

        if failures.len() == paths.len() {
            return Err(Error::NoValidData {
                attempted: paths.len(),
            });
        }

        let dataset = SpectralDataset::new(Arc::clone(&self.grid), records)?;
        log::info!(
            "Assembled {} spectra from {} of {} files",
            dataset.len(),
            paths.len() - failures.len(),
            paths.len()
        );
        Ok(ProcessedBatch {
            dataset,
            failures,
            skipped_rows,
        })
    }

    /// Read one file and run it through the pipeline.
    pub fn process_file(&self, path: &Path) -> std::result::Result<FileRecords, FileError> {
        let raw = load_instrument_file(path)?;
        self.process_raw(&raw)
    }

    /// Calibrate, filter and resample an already parsed file.
    pub fn process_raw(&self, raw: &RawInstrumentFile) -> std::result::Result<FileRecords, FileError> {
        if raw.skipped_rows > 0 {
            log::debug!("{}: skipped {} unparseable rows", raw.file_index, raw.skipped_rows);
        }
        if raw.rows.is_empty() {
            return Err(FileError::Empty);
        }

        let filtered = calibrate_and_filter(
            raw,
            &self.config.wavelength_range,
            self.config.calibration_shift_nm,
        )?;
        let resampled = resample_rows(
            &filtered.wavelengths,
            filtered.rows.iter().map(|r| r.intensities.as_slice()),
            &self.grid,
        )?;

        let records = filtered
            .rows
            .iter()
            .zip(resampled)
            .map(|(row, intensities)| SpectralRecord {
                meta: RecordMeta {
                    name: raw.sample_name.clone(),
                    spectrometer_id: raw.spectrometer_id.clone(),
                    file_index: raw.file_index.clone(),
                    timestamp: row.timestamp,
                    integration_time: Some(raw.integration_time),
                },
                intensities,
            })
            .collect();

        Ok(FileRecords {
            records,
            skipped_rows: raw.skipped_rows,
        })
    }
}

/// Build a pipeline from `config` and process `paths` with it.
pub fn process_files<P: AsRef<Path>>(paths: &[P], config: PipelineConfig) -> Result<ProcessedBatch> {
    SpectralPipeline::new(config)?.process(paths)
}
