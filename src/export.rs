use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::data::model::{SpectralDataset, INTEGRATION_TIME_COLUMN, TIMESTAMP_FORMAT};

// ---------------------------------------------------------------------------
// CSV – wide table, one column per grid wavelength
// ---------------------------------------------------------------------------

/// Write the table as CSV:
/// `name, spectrometer_id, file_index, datetime[, integration_time], <wavelengths...>`.
///
/// `integration_time` is written only when every record carries one.
pub fn write_csv<W: Write>(dataset: &SpectralDataset, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(dataset.column_names())
        .context("writing CSV header")?;

    let with_time = dataset.has_integration_time();
    for (row_no, record) in dataset.records().iter().enumerate() {
        let meta = &record.meta;
        let mut fields = vec![
            meta.name.clone(),
            meta.spectrometer_id.clone(),
            meta.file_index.clone(),
            meta.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ];
        if with_time {
            fields.extend(meta.integration_time.map(|t| t.to_string()));
        }
        fields.extend(record.intensities.iter().map(|v| v.to_string()));
        csv.write_record(&fields)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }

    csv.flush().context("flushing CSV")?;
    Ok(())
}

pub fn write_csv_path(dataset: &SpectralDataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(dataset, file)
}

// ---------------------------------------------------------------------------
// Arrow / Parquet – long layout with `x` and `y` list columns
// ---------------------------------------------------------------------------

/// Convert the table to a single Arrow batch.
///
/// Schema:
/// - `x`: List<Float64> – the grid, repeated per row
/// - `y`: List<Float64> – intensities
/// - `name`, `spectrometer_id`, `file_index`, `datetime`: Utf8
/// - `integration_time`: Float64, nullable
pub fn to_record_batch(dataset: &SpectralDataset) -> Result<RecordBatch> {
    let records = dataset.records();
    let wavelengths = dataset.grid().wavelengths();

    let mut x_builder = ListBuilder::new(Float64Builder::new());
    let mut y_builder = ListBuilder::new(Float64Builder::new());
    for record in records {
        x_builder.values().append_slice(wavelengths);
        x_builder.append(true);
        y_builder.values().append_slice(&record.intensities);
        y_builder.append(true);
    }

    let text_column = |f: fn(&crate::data::model::RecordMeta) -> String| -> ArrayRef {
        Arc::new(StringArray::from(
            records.iter().map(|r| f(&r.meta)).collect::<Vec<String>>(),
        ))
    };
    let name = text_column(|m| m.name.clone());
    let spectrometer_id = text_column(|m| m.spectrometer_id.clone());
    let file_index = text_column(|m| m.file_index.clone());
    let datetime = text_column(|m| m.timestamp.format(TIMESTAMP_FORMAT).to_string());
    let integration_time: ArrayRef = Arc::new(Float64Array::from(
        records
            .iter()
            .map(|r| r.meta.integration_time)
            .collect::<Vec<Option<f64>>>(),
    ));

    let list = |name: &str| {
        Field::new(
            name,
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        )
    };
    let schema = Arc::new(Schema::new(vec![
        list("x"),
        list("y"),
        Field::new("name", DataType::Utf8, false),
        Field::new("spectrometer_id", DataType::Utf8, false),
        Field::new("file_index", DataType::Utf8, false),
        Field::new("datetime", DataType::Utf8, false),
        Field::new(INTEGRATION_TIME_COLUMN, DataType::Float64, true),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(x_builder.finish()),
            Arc::new(y_builder.finish()),
            name,
            spectrometer_id,
            file_index,
            datetime,
            integration_time,
        ],
    )
    .context("building record batch")
}

/// Write the table as a Parquet file readable by the spectral viewer.
pub fn write_parquet(dataset: &SpectralDataset, path: &Path) -> Result<()> {
    let batch = to_record_batch(dataset)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    log::info!("Wrote {} spectra to {}", dataset.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use super::*;
    use crate::analysis::average;
    use crate::data::model::{RecordMeta, SpectralRecord, WavelengthGrid};

    fn dataset() -> SpectralDataset {
        let grid = Arc::new(WavelengthGrid::from_wavelengths(&[400.0, 450.5]).unwrap());
        let record = |file_index: &str, intensities: Vec<f64>| SpectralRecord {
            meta: RecordMeta {
                name: "ammonia".into(),
                spectrometer_id: "300".into(),
                file_index: file_index.into(),
                timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_micro_opt(10, 0, 0, 123)
                    .unwrap(),
                integration_time: Some(0.1),
            },
            intensities,
        };
        SpectralDataset::new(
            grid,
            vec![record("f1", vec![1.5, 2.25]), record("f1", vec![3.5, 4.25])],
        )
        .unwrap()
    }

    #[test]
    fn csv_follows_column_contract() {
        let mut buf = Vec::new();
        write_csv(&dataset(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "name,spectrometer_id,file_index,datetime,integration_time,400.00,450.50"
        );
        assert_eq!(lines[1], "ammonia,300,f1,2024-03-01 10:00:00.000123,0.1,1.5,2.25");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_of_averaged_table_has_no_integration_time() {
        let mut buf = Vec::new();
        write_csv(&average(&dataset()), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,spectrometer_id,file_index,datetime,400.00,450.50");
        assert_eq!(lines[1], "ammonia,300,f1,2024-03-01 10:00:00.000123,2.5,3.25");
    }

    #[test]
    fn parquet_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.parquet");
        write_parquet(&dataset(), &path).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 2);
        let schema = batches[0].schema();
        assert!(schema.index_of("x").is_ok());
        assert!(schema.index_of("y").is_ok());
        assert!(schema.index_of("file_index").is_ok());
    }
}
