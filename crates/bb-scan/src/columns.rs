//! Named-column extraction from Parquet record batches.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, Float64Array, Int64Array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use bb_core::{Error, Result};

/// Read a Parquet file into Arrow RecordBatches.
///
/// A file that cannot be opened or parsed at all is fatal for the whole
/// scan, so errors here carry the offending path.
pub fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path).map_err(|e| Error::open(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| Error::open(path, e))?;
    let reader = builder.build()?;
    let batches: std::result::Result<Vec<_>, _> = reader.collect();
    Ok(batches?)
}

/// Extract an Int64 column by name, coercing from Int32/Int16.
///
/// Returns `Ok(None)` when the column is absent (the caller treats the file
/// as carrying no subrun information); an unsupported type for a column that
/// *is* present is an input error.
pub fn try_i64_column(batch: &RecordBatch, col_name: &str) -> Result<Option<Vec<i64>>> {
    let Some(col) = batch.column_by_name(col_name) else {
        return Ok(None);
    };
    let out = match col.data_type() {
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            arr.iter().map(|v| v.unwrap_or(0)).collect()
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<arrow::array::Int32Array>().unwrap();
            arr.iter().map(|v| v.map_or(0, i64::from)).collect()
        }
        DataType::Int16 => {
            let arr = col.as_any().downcast_ref::<arrow::array::Int16Array>().unwrap();
            arr.iter().map(|v| v.map_or(0, i64::from)).collect()
        }
        dt => {
            return Err(Error::Input(format!(
                "column '{}' has unsupported type {:?} (expected integer)",
                col_name, dt
            )))
        }
    };
    Ok(Some(out))
}

/// Extract a Float64 column by name, coercing from Float32/Int64/Int32.
///
/// Returns `Ok(None)` when the column is absent; null entries read as 0.0.
pub fn try_f64_column(batch: &RecordBatch, col_name: &str) -> Result<Option<Vec<f64>>> {
    let Some(col) = batch.column_by_name(col_name) else {
        return Ok(None);
    };
    let out = match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            arr.iter().map(|v| v.unwrap_or(0.0)).collect()
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<arrow::array::Float32Array>().unwrap();
            arr.iter().map(|v| v.map_or(0.0, f64::from)).collect()
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            arr.iter().map(|v| v.map_or(0.0, |x| x as f64)).collect()
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<arrow::array::Int32Array>().unwrap();
            arr.iter().map(|v| v.map_or(0.0, f64::from)).collect()
        }
        dt => {
            return Err(Error::Input(format!(
                "column '{}' has unsupported type {:?} (expected numeric)",
                col_name, dt
            )))
        }
    };
    Ok(Some(out))
}
