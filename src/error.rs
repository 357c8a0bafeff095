use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration errors – fatal, raised at construction time
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid wavelength range ({min}, {max}): must satisfy 200 <= min < max <= 1050 nm")]
    InvalidRange { min: f64, max: f64 },

    #[error("interpolation point count must be positive, got {0}")]
    InvalidPointCount(usize),

    #[error("invalid smoothing parameters (window_length={window_length}, polyorder={polyorder}): {reason}")]
    InvalidSmoothingParams {
        window_length: usize,
        polyorder: usize,
        reason: String,
    },

    #[error("reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Per-file errors – the assembler logs these and excludes the file
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FileError {
    #[error("reading file: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing 'Spectrometer:' header line")]
    MalformedHeader,

    #[error("missing '{0}' header line")]
    MissingField(&'static str),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("missing '>>>>>Begin Spectral Data<<<<<' marker")]
    MissingDataMarker,

    #[error("missing wavelength axis after the data marker")]
    MissingAxis,

    #[error("no spectral data left to process")]
    Empty,

    #[error("need at least 2 wavelengths to interpolate, got {0}")]
    TooFewPoints(usize),
}

impl FileError {
    /// Whether the file was readable but simply had nothing to contribute.
    pub fn is_empty(&self) -> bool {
        matches!(self, FileError::Empty)
    }
}

// ---------------------------------------------------------------------------
// Crate-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no valid data files found to process ({attempted} attempted)")]
    NoValidData { attempted: usize },

    #[error("record has {found} intensities but the wavelength grid has {expected} points")]
    GridMismatch { expected: usize, found: usize },

    #[error("record from '{file_index}' has no integration time")]
    MissingIntegrationTime { file_index: String },
}

pub type Result<T> = std::result::Result<T, Error>;
