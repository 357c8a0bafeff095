use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

const PIXELS: usize = 3648;
const ROWS_PER_FILE: usize = 5;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Native axis of a CCD spectrometer: a mildly non-linear pixel → nm mapping.
fn native_axis(start_nm: f64, end_nm: f64) -> Vec<f64> {
    let span = end_nm - start_nm;
    (0..PIXELS)
        .map(|i| {
            let p = i as f64 / (PIXELS - 1) as f64;
            start_nm + span * (0.92 * p + 0.08 * p * p)
        })
        .collect()
}

fn generate_spectrum(
    wavelengths: &[f64],
    peaks: &[(f64, f64, f64)],
    baseline: f64,
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wl, mu, sigma, amp))
                .sum();
            baseline + signal + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Capture<'a> {
    file_stem: &'a str,
    spectrometer: &'a str,
    sample: &'a str,
    integration_time: f64,
    axis: (f64, f64),
    peaks: Vec<(f64, f64, f64)>,
}

fn render_dump(capture: &Capture, start: chrono::NaiveDateTime, rng: &mut SimpleRng) -> Result<String> {
    let axis = native_axis(capture.axis.0, capture.axis.1);
    let mut out = String::new();
    writeln!(out, "Data from {}.txt Node", capture.file_stem)?;
    writeln!(out)?;
    writeln!(out, "Date: {}", start.format("%a %b %d %H:%M:%S %Y"))?;
    writeln!(out, "User: lab")?;
    writeln!(out, "Spectrometer: {}", capture.spectrometer)?;
    writeln!(out, "Name: {}", capture.sample)?;
    writeln!(out, "Integration Time (sec): {}", capture.integration_time)?;
    writeln!(out, "Scans to average: 1")?;
    writeln!(out, "Number of Pixels in Spectrum: {PIXELS}")?;
    writeln!(out, ">>>>>Begin Spectral Data<<<<<")?;

    let header: Vec<String> = axis.iter().map(|w| format!("{w:.3}")).collect();
    writeln!(out, "{}", header.join(" "))?;

    for row in 0..ROWS_PER_FILE {
        // Signal slowly decays across the capture session.
        let decay = 1.0 - 0.08 * row as f64;
        let peaks: Vec<(f64, f64, f64)> = capture
            .peaks
            .iter()
            .map(|&(mu, sigma, amp)| (mu, sigma, amp * decay))
            .collect();
        let values = generate_spectrum(&axis, &peaks, 900.0, 12.0, rng);
        let ts = start + Duration::milliseconds(row as i64 * 1500 + 37);
        let cells: Vec<String> = values.iter().map(|v| format!("{v:.2}")).collect();
        writeln!(out, "{} {}", ts.format("%Y-%m-%d %H:%M:%S%.6f"), cells.join(" "))?;
    }
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "sample_data".to_string()),
    );
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .context("building start timestamp")?;

    let captures = [
        Capture {
            file_stem: "cooling_upper_01",
            spectrometer: "USB2+H16300",
            sample: "ammonia_upper",
            integration_time: 0.1,
            axis: (186.0, 1041.0),
            peaks: vec![(336.0, 4.0, 2400.0), (589.0, 3.0, 5200.0), (656.3, 2.5, 3100.0)],
        },
        Capture {
            file_stem: "cooling_lower_01",
            spectrometer: "USB2+H16412",
            sample: "ammonia_lower",
            integration_time: 0.25,
            axis: (190.5, 1046.2),
            peaks: vec![(336.0, 4.5, 1900.0), (589.0, 3.0, 4700.0), (777.4, 2.0, 1600.0)],
        },
        Capture {
            file_stem: "cooling_side_01",
            spectrometer: "QE65000 QEP01127",
            sample: "ammonia_side",
            integration_time: 0.2,
            axis: (201.3, 1049.9),
            peaks: vec![(486.1, 3.5, 1200.0), (589.0, 3.0, 3900.0)],
        },
    ];

    for (i, capture) in captures.iter().enumerate() {
        let session_start = start + Duration::minutes(i as i64 * 10);
        let text = render_dump(capture, session_start, &mut rng)?;
        let path = out_dir.join(format!("{}.txt", capture.file_stem));
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {} ({})", path.display(), capture.spectrometer);
    }

    println!(
        "Wrote {} instrument dumps ({} rows × {PIXELS} pixels each) to {}",
        captures.len(),
        ROWS_PER_FILE,
        out_dir.display()
    );
    Ok(())
}
