use std::path::Path;

use chrono::NaiveDateTime;

use super::model::is_strictly_increasing;
use crate::error::FileError;

const SPECTROMETER_PREFIX: &str = "Spectrometer:";
const NAME_PREFIX: &str = "Name:";
const INTEGRATION_TIME_PREFIX: &str = "Integration Time (sec):";
const DATA_MARKER: &str = ">>>>>Begin Spectral Data<<<<<";

/// Date and time tokens of a data row, joined by a space.
const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Fraction digits of a row time: at least one, at most microseconds.
const MAX_FRACTION_DIGITS: usize = 6;

// ---------------------------------------------------------------------------
// Parsed file
// ---------------------------------------------------------------------------

/// One timestamped spectrum on the instrument's native axis.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub timestamp: NaiveDateTime,
    /// Same length as [`RawInstrumentFile::wavelengths`].
    pub intensities: Vec<f64>,
}

/// Everything read from one instrument dump.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInstrumentFile {
    pub file_index: String,
    /// Last 3 characters of the `Spectrometer:` value.
    pub spectrometer_id: String,
    pub sample_name: String,
    /// Seconds, strictly positive.
    pub integration_time: f64,
    /// Native wavelength axis, strictly increasing.
    pub wavelengths: Vec<f64>,
    pub rows: Vec<RawRow>,
    /// Non-blank data lines dropped because they could not be parsed.
    pub skipped_rows: usize,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read and parse an instrument dump. The file stem becomes the file index.
pub fn load_instrument_file(path: &Path) -> Result<RawInstrumentFile, FileError> {
    let text = std::fs::read_to_string(path)?;
    parse_instrument_text(&text, file_index_for(path))
}

/// Identifier grouping every row of one input file: its basename without extension.
pub fn file_index_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse the text of an instrument dump.
///
/// Expected layout:
///
/// ```text
/// Spectrometer: USB2+H16300
/// Name: ammonia_cooling
/// Integration Time (sec): 0.1
/// ...
/// >>>>>Begin Spectral Data<<<<<
/// 200.12 200.35 200.58 ...
/// 2024-03-01 10:00:00.000123 512.0 530.5 498.25 ...
/// ```
///
/// Header problems fail the whole file; bad data rows are only counted.
pub fn parse_instrument_text(
    text: &str,
    file_index: impl Into<String>,
) -> Result<RawInstrumentFile, FileError> {
    let lines: Vec<&str> = text.lines().collect();

    let spectrometer = header_value(&lines, SPECTROMETER_PREFIX).ok_or(FileError::MalformedHeader)?;
    let spectrometer_id = last_chars(spectrometer, 3);

    let sample_name = header_value(&lines, NAME_PREFIX)
        .ok_or(FileError::MissingField("Name"))?
        .to_string();

    let integration_raw = header_value(&lines, INTEGRATION_TIME_PREFIX)
        .ok_or(FileError::MissingField("IntegrationTime"))?;
    let integration_time: f64 = integration_raw.parse().map_err(|_| {
        FileError::InvalidFormat(format!("integration time '{integration_raw}' is not a number"))
    })?;
    if !(integration_time.is_finite() && integration_time > 0.0) {
        return Err(FileError::InvalidFormat(format!(
            "integration time must be positive, got {integration_time}"
        )));
    }

    let marker = lines
        .iter()
        .position(|l| l.contains(DATA_MARKER))
        .ok_or(FileError::MissingDataMarker)?;
    let axis_line = lines.get(marker + 1).ok_or(FileError::MissingAxis)?;
    let wavelengths = parse_axis(axis_line)?;

    let mut rows = Vec::new();
    let mut skipped_rows = 0;
    for line in &lines[marker + 2..] {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line, wavelengths.len()) {
            Some(row) => rows.push(row),
            None => skipped_rows += 1,
        }
    }

    Ok(RawInstrumentFile {
        file_index: file_index.into(),
        spectrometer_id,
        sample_name,
        integration_time,
        wavelengths,
        rows,
        skipped_rows,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trimmed field after `prefix` on the first line starting with it. The field
/// ends at the next colon, so `Name: a:b` yields `a`.
fn header_value<'a>(lines: &[&'a str], prefix: &str) -> Option<&'a str> {
    lines
        .iter()
        .copied()
        .find(|l| l.starts_with(prefix))
        .and_then(|l| l[prefix.len()..].split(':').next())
        .map(str::trim)
}

fn last_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}

fn parse_axis(line: &str) -> Result<Vec<f64>, FileError> {
    let wavelengths = line
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| FileError::InvalidFormat(format!("wavelength '{tok}' is not a number")))
        })
        .collect::<Result<Vec<f64>, FileError>>()?;

    if wavelengths.is_empty() {
        return Err(FileError::MissingAxis);
    }
    if !is_strictly_increasing(&wavelengths) {
        return Err(FileError::InvalidFormat(
            "wavelength axis is not strictly increasing".into(),
        ));
    }
    Ok(wavelengths)
}

/// `None` for anything that is not `<date> <time.micros> <v1> ... <vN>`.
fn parse_row(line: &str, axis_len: usize) -> Option<RawRow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }

    let timestamp = parse_timestamp(tokens[0], tokens[1])?;
    let intensities = tokens[2..]
        .iter()
        .map(|t| t.parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;
    if intensities.len() != axis_len {
        return None;
    }

    Some(RawRow {
        timestamp,
        intensities,
    })
}

fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    // chrono's `%.f` takes a missing or nanosecond fraction; the dumps carry 1..=6 digits.
    let (_, fraction) = time.split_once('.')?;
    if fraction.is_empty() || fraction.len() > MAX_FRACTION_DIGITS {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), ROW_TIMESTAMP_FORMAT).ok()
}
