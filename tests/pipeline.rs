use std::path::{Path, PathBuf};

use spectro_align::analysis::{average, normalize, smooth, standardize};
use spectro_align::export::write_csv_path;
use spectro_align::{ConfigError, Error, FileError, PipelineConfig, SpectralPipeline};
use tempfile::TempDir;

/// Write an instrument dump whose rows are `intensity = wavelength * scale + row`.
fn write_dump(dir: &Path, stem: &str, spectrometer: &str, axis: &[f64], rows: usize) -> PathBuf {
    let mut text = format!(
        "Data from {stem}.txt Node\nSpectrometer: USB2+{spectrometer}\nName: {stem}-sample\n\
         Integration Time (sec): 0.1\n>>>>>Begin Spectral Data<<<<<\n"
    );
    let header: Vec<String> = axis.iter().map(|w| w.to_string()).collect();
    text.push_str(&header.join(" "));
    text.push('\n');
    for row in 0..rows {
        let values: Vec<String> = axis.iter().map(|w| (w * 0.5 + row as f64).to_string()).collect();
        text.push_str(&format!("2024-03-01 10:00:0{row}.250000 {}\n", values.join(" ")));
    }
    let path = dir.join(format!("{stem}.txt"));
    std::fs::write(&path, text).unwrap();
    path
}

fn axis(start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((end - start) / step).round() as usize;
    (0..=n).map(|i| start + i as f64 * step).collect()
}

fn pipeline(min: f64, max: f64, points: usize) -> SpectralPipeline {
    SpectralPipeline::new(PipelineConfig::new((min, max), points, 2.0).unwrap()).unwrap()
}

#[test]
fn every_record_sits_on_the_shared_grid() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        write_dump(dir.path(), "a", "H16300", &axis(190.0, 1060.0, 5.0), 3),
        write_dump(dir.path(), "b", "H16412", &axis(195.5, 1055.5, 2.5), 2),
        write_dump(dir.path(), "c", "H16127", &axis(250.0, 900.0, 10.0), 4),
    ];
    let p = pipeline(300.0, 800.0, 251);
    let batch = p.process(&paths).unwrap();

    assert!(batch.failures.is_empty());
    assert_eq!(batch.dataset.len(), 9);
    assert_eq!(batch.dataset.grid().len(), 251);
    assert_eq!(batch.dataset.grid(), p.grid());
    for record in batch.dataset.records() {
        assert_eq!(record.intensities.len(), 251);
    }
}

#[test]
fn spectrometer_300_is_shifted_others_are_not() {
    let dir = TempDir::new().unwrap();
    let native = axis(380.0, 620.0, 1.0);
    let paths = vec![
        write_dump(dir.path(), "shifted", "H16300", &native, 1),
        write_dump(dir.path(), "plain", "H16301", &native, 1),
    ];
    let batch = pipeline(400.0, 600.0, 201).process(&paths).unwrap();
    let grid = batch.dataset.grid().wavelengths().to_vec();
    let records = batch.dataset.records();

    // intensity = 0.5 * native wavelength, so a +2 nm axis shift reads 1.0 lower.
    for (j, w) in grid.iter().enumerate() {
        assert!((records[0].intensities[j] - (w - 2.0) * 0.5).abs() < 0.011);
        assert!((records[1].intensities[j] - w * 0.5).abs() < 0.011);
    }
    assert_eq!(records[0].meta.spectrometer_id, "300");
    assert_eq!(records[1].meta.spectrometer_id, "301");
}

#[test]
fn one_malformed_file_is_excluded_and_reported() {
    let dir = TempDir::new().unwrap();
    let good_axis = axis(400.0, 600.0, 4.0);
    let first = write_dump(dir.path(), "first", "H16412", &good_axis, 2);
    let broken = write_dump(dir.path(), "broken", "H16412", &good_axis, 2);
    let text = std::fs::read_to_string(&broken).unwrap();
    std::fs::write(&broken, text.replace("Name: broken-sample\n", "")).unwrap();
    let last = write_dump(dir.path(), "last", "H16412", &good_axis, 3);

    let batch = pipeline(400.0, 600.0, 51)
        .process(&[first, broken.clone(), last])
        .unwrap();

    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].path, broken);
    assert!(matches!(batch.failures[0].error, FileError::MissingField("Name")));
    assert_eq!(batch.dataset.file_indices(), vec!["first", "last"]);
    assert_eq!(batch.dataset.len(), 5);
}

#[test]
fn input_order_decides_output_order() {
    let dir = TempDir::new().unwrap();
    let ax = axis(400.0, 600.0, 4.0);
    let x = write_dump(dir.path(), "x", "H16412", &ax, 2);
    let y = write_dump(dir.path(), "y", "H16412", &ax, 2);

    let batch = pipeline(400.0, 600.0, 11).process(&[y, x]).unwrap();
    let order: Vec<(&str, f64)> = batch
        .dataset
        .records()
        .iter()
        .map(|r| (r.meta.file_index.as_str(), r.intensities[0]))
        .collect();
    assert_eq!(order, vec![("y", 200.0), ("y", 201.0), ("x", 200.0), ("x", 201.0)]);
}

#[test]
fn all_malformed_is_fatal() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does_not_exist.txt");
    let garbage = dir.path().join("garbage.txt");
    std::fs::write(&garbage, "hello\nworld\n").unwrap();

    let err = pipeline(400.0, 600.0, 11).process(&[missing, garbage]).unwrap_err();
    assert!(matches!(err, Error::NoValidData { attempted: 2 }));
}

#[test]
fn out_of_range_and_rowless_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let good = write_dump(dir.path(), "good", "H16412", &axis(400.0, 600.0, 4.0), 1);
    let outside = write_dump(dir.path(), "outside", "H16412", &axis(700.0, 900.0, 4.0), 1);
    let rowless = write_dump(dir.path(), "rowless", "H16412", &axis(400.0, 600.0, 4.0), 0);

    let batch = pipeline(400.0, 600.0, 11)
        .process(&[good, outside, rowless])
        .unwrap();
    assert_eq!(batch.dataset.len(), 1);
    assert_eq!(batch.failures.len(), 2);
    assert!(batch.failures.iter().all(|f| f.error.is_empty()));
}

#[test]
fn unparseable_rows_are_counted() {
    let dir = TempDir::new().unwrap();
    let path = write_dump(dir.path(), "noisy", "H16412", &axis(400.0, 600.0, 4.0), 2);
    let mut text = std::fs::read_to_string(&path).unwrap();
    text.push_str("2024-03-01 garbage 1 2 3\n");
    text.push_str("2024-03-01 10:00:09.0 1\n");
    text.push_str("too short\n");
    std::fs::write(&path, text).unwrap();

    let batch = pipeline(400.0, 600.0, 11).process(&[path]).unwrap();
    assert_eq!(batch.dataset.len(), 2);
    assert_eq!(batch.skipped_rows, 3);
}

#[test]
fn invalid_range_is_rejected_at_construction() {
    let err = PipelineConfig::new((100.0, 1050.0), 3648, 2.0).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRange { .. }));
}

#[test]
fn config_file_drives_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("pipeline.json");
    std::fs::write(
        &config_path,
        r#"{ "wavelength_range": { "min": 450, "max": 550 }, "interpolation_points": 21 }"#,
    )
    .unwrap();
    let config = PipelineConfig::from_json_file(&config_path).unwrap();
    let p = SpectralPipeline::new(config).unwrap();
    assert_eq!(p.grid().wavelengths()[0], 450.0);
    assert_eq!(p.grid().wavelengths()[1], 455.0);
    assert_eq!(p.grid().len(), 21);
}

#[test]
fn transforms_over_a_processed_batch() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        write_dump(dir.path(), "s1", "H16300", &axis(350.0, 700.0, 3.0), 4),
        write_dump(dir.path(), "s2", "H16412", &axis(360.0, 690.0, 2.0), 3),
    ];
    let batch = pipeline(400.0, 650.0, 126).process(&paths).unwrap();
    let ds = &batch.dataset;

    let averaged = average(ds);
    assert_eq!(averaged.len(), ds.file_indices().len());
    assert_eq!(averaged.len(), 2);

    let normalized = normalize(ds);
    for r in normalized.records() {
        let min = r.intensities.iter().copied().fold(f64::INFINITY, f64::min);
        let max = r.intensities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(min.abs() < 1e-12 && (max - 1.0).abs() < 1e-12);
    }

    let standardized = standardize(ds);
    assert_eq!(standardized.len(), ds.len());

    let smoothed = smooth(ds, 11, 2).unwrap();
    assert_eq!(smoothed.grid(), ds.grid());
    assert!(matches!(
        smooth(ds, 127, 2),
        Err(ConfigError::InvalidSmoothingParams { .. })
    ));

    let out = dir.path().join("averaged.csv");
    write_csv_path(&averaged, &out).unwrap();
    let csv = std::fs::read_to_string(&out).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("name,spectrometer_id,file_index,datetime,400.00,"));
}
