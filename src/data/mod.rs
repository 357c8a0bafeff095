//! Data layer: core types, parsing, calibration and resampling.
//!
//! Architecture:
//! ```text
//!   instrument dump (.txt)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse header + rows → RawInstrumentFile
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  spectrometer 300 shift, range cut → FilteredFile
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ resample  │  linear interpolation onto WavelengthGrid
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────────┐
//!   │ SpectralDataset│  Vec<SpectralRecord>, shared grid
//!   └───────────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod resample;
