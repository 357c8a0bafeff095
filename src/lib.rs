//! Spectrometer dump ingestion and alignment.
//!
//! Raw text dumps from several spectrometers are parsed, corrected for the
//! known wavelength offset of spectrometer `300`, cut to an analysis range
//! and resampled onto one shared wavelength grid. The resulting table can
//! then be standardized, normalized, smoothed or averaged per file.
//!
//! ```no_run
//! use spectro_align::{analysis, PipelineConfig, SpectralPipeline};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new((300.0, 1050.0), 3648, 3.0)?;
//! let batch = SpectralPipeline::new(config)?.process(&["day1/cooling_01.txt", "day1/cooling_02.txt"])?;
//! let smoothed = analysis::smooth(&batch.dataset, 51, 2)?;
//! let means = analysis::average(&smoothed);
//! # let _ = means;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod pipeline;

pub use config::{PipelineConfig, WavelengthRange};
pub use data::model::{
    DerivedDataset, ProcessedDataset, RecordMeta, SpectralDataset, SpectralRecord, WavelengthGrid,
};
pub use error::{ConfigError, Error, FileError, Result};
pub use pipeline::{process_files, FileFailure, ProcessedBatch, SpectralPipeline};
