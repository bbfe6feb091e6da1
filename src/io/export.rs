//! Write the Unified Table to disk.
//!
//! Three formats are supported:
//!
//! - `parquet` (columnar, compressed) via `parquet::arrow::ArrowWriter`
//! - `csv` via the `csv` crate, header row first, nulls as empty cells
//! - `feather` (Arrow IPC file) via `arrow_ipc::writer::FileWriter`
//!
//! Parquet and feather share one Arrow `RecordBatch`. Column types are inferred
//! from the cells: any string makes the column `Utf8`, otherwise any float makes
//! it `Float64`, otherwise `Int64`. An all-null column is written as `Float64`.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_ipc::writer::FileWriter;
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use tracing::info;

use crate::domain::{OutputFormat, Table, Value};
use crate::error::PipelineError;

/// Write `table` to `path` in `format`, creating parent directories.
pub fn write_table(path: &Path, table: &Table, format: OutputFormat) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| export_error(path, format!("failed to create directory: {e}")))?;
    }

    match format {
        OutputFormat::Csv => write_csv(path, table)?,
        OutputFormat::Parquet => write_parquet(path, table)?,
        OutputFormat::Feather => write_feather(path, table)?,
    }

    info!(path = %path.display(), format = %format, rows = table.len(), "saved unified table");
    Ok(())
}

fn write_csv(path: &Path, table: &Table) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| export_error(path, e.to_string()))?;

    writer
        .write_record(table.columns())
        .map_err(|e| export_error(path, format!("failed to write header: {e}")))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(Value::to_string))
            .map_err(|e| export_error(path, format!("failed to write row: {e}")))?;
    }
    writer.flush().map_err(|e| export_error(path, e.to_string()))
}

fn write_parquet(path: &Path, table: &Table) -> Result<(), PipelineError> {
    let batch = to_record_batch(table).map_err(|e| export_error(path, e))?;
    let file = File::create(path).map_err(|e| export_error(path, e.to_string()))?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| export_error(path, format!("opening parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| export_error(path, format!("writing parquet batch: {e}")))?;
    writer
        .close()
        .map_err(|e| export_error(path, format!("closing parquet writer: {e}")))?;
    Ok(())
}

fn write_feather(path: &Path, table: &Table) -> Result<(), PipelineError> {
    let batch = to_record_batch(table).map_err(|e| export_error(path, e))?;
    let file = File::create(path).map_err(|e| export_error(path, e.to_string()))?;

    let mut writer = FileWriter::try_new(file, &batch.schema())
        .map_err(|e| export_error(path, format!("opening feather writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| export_error(path, format!("writing feather batch: {e}")))?;
    writer
        .finish()
        .map_err(|e| export_error(path, format!("closing feather writer: {e}")))
}

/// Arrow type a column is written with.
pub fn column_type<'a>(cells: impl Iterator<Item = &'a Value>) -> DataType {
    let (mut any_float, mut any_int) = (false, false);
    for cell in cells {
        match cell {
            Value::Str(_) => return DataType::Utf8,
            Value::Float(_) => any_float = true,
            Value::Int(_) => any_int = true,
            Value::Null => {}
        }
    }
    if any_int && !any_float { DataType::Int64 } else { DataType::Float64 }
}

pub fn to_record_batch(table: &Table) -> Result<RecordBatch, String> {
    let mut fields = Vec::with_capacity(table.width());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.width());

    for (idx, name) in table.columns().iter().enumerate() {
        let cells = || table.rows().iter().map(move |row| &row[idx]);
        let data_type = column_type(cells());

        let array: ArrayRef = match data_type {
            DataType::Utf8 => Arc::new(StringArray::from(
                cells()
                    .map(|v| (!v.is_null()).then(|| v.to_string()))
                    .collect::<Vec<Option<String>>>(),
            )),
            DataType::Int64 => Arc::new(Int64Array::from(
                cells()
                    .map(|v| match v {
                        Value::Int(i) => Some(*i),
                        _ => None,
                    })
                    .collect::<Vec<Option<i64>>>(),
            )),
            _ => Arc::new(Float64Array::from(cells().map(Value::as_f64).collect::<Vec<Option<f64>>>())),
        };

        fields.push(Field::new(name.as_str(), data_type, true));
        arrays.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(|e| format!("building record batch: {e}"))
}

fn export_error(path: &Path, message: impl Into<String>) -> PipelineError {
    PipelineError::Export {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use arrow_array::Array;

    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["agency".into(), "volume".into(), "count".into(), "empty".into()],
            vec![
                vec![Value::Str("Agency_01".into()), Value::Float(1.5), Value::Int(3), Value::Null],
                vec![Value::Str("Agency_02".into()), Value::Int(2), Value::Null, Value::Null],
            ],
        )
    }

    #[test]
    fn infers_arrow_types() {
        let batch = to_record_batch(&sample()).unwrap();
        let schema = batch.schema();
        let types: Vec<_> = schema.fields().iter().map(|f| f.data_type().clone()).collect();
        assert_eq!(types, vec![DataType::Utf8, DataType::Float64, DataType::Int64, DataType::Float64]);
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(2).null_count(), 1);
    }

    #[test]
    fn csv_writes_nulls_as_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        write_table(&path, &sample(), OutputFormat::Csv).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("agency,volume,count,empty"));
        assert_eq!(lines.next(), Some("Agency_01,1.5,3,"));
        assert_eq!(lines.next(), Some("Agency_02,2,,"));
    }

    #[test]
    fn binary_formats_produce_files() {
        let dir = tempfile::tempdir().unwrap();
        for format in [OutputFormat::Parquet, OutputFormat::Feather] {
            let path = dir.path().join(format!("unified.{format}"));
            write_table(&path, &sample(), format).unwrap();
            assert!(fs::metadata(&path).unwrap().len() > 0);
        }
    }
}
