use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::GridError;
use crate::rows::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileType {
    Csv,
    Parquet,
    Arrow,
    Json,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    file_type: FileType,
}

fn detect_file_type(path: &Path) -> Result<FileType, GridError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        Some("JSON") => Ok(FileType::Json),
        _ => Err(GridError::UnknownFileType),
    }
}

pub fn file_info(path: PathBuf) -> Result<FileInfo, GridError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GridError::FileNotFound,
        ErrorKind::PermissionDenied => GridError::PermissionDenied,
        _ => GridError::Io(e),
    })?;
    if !metadata.is_file() {
        return Err(GridError::LoadingFailed("Not a file!".into()));
    }
    let file_type = detect_file_type(&path)?;
    Ok(FileInfo { path, file_size: metadata.len(), file_type })
}

fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.as_path().into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(
        PlPath::Local(path.as_path().into()),
        ScanArgsParquet::default(),
    )
}

fn load_arrow(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.as_path().into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// Cell values of one column. Numeric dtypes keep their numeric identity so
// type-aware sorting works without re-parsing, everything else becomes text.
fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Value>, PolarsError> {
    let column = df.column(name)?;
    if is_numeric_type(column.dtype()) {
        let casted = column.cast(&DataType::Float64)?;
        let series = casted.f64()?;
        Ok(series
            .into_iter()
            .map(|v| v.map(Value::from).unwrap_or(Value::Null))
            .collect())
    } else {
        let casted = column.cast(&DataType::String)?;
        let series = casted.str()?;
        Ok(series
            .into_iter()
            .map(|v| v.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null))
            .collect())
    }
}

/// Load a data file into row maps. Columns are converted in parallel, one
/// rayon task each, then zipped back into rows in source order.
pub fn load_rows(path: PathBuf) -> Result<Vec<Row>, GridError> {
    let info = file_info(path)?;
    info!("Loading {:?} ({} bytes)", info.path, info.file_size);

    if info.file_type == FileType::Json {
        return load_json_rows(&info.path);
    }

    let frame = match info.file_type {
        FileType::Csv => load_csv(&info.path)?,
        FileType::Parquet => load_parquet(&info.path)?,
        FileType::Arrow => load_arrow(&info.path)?,
        FileType::Json => unreachable!(),
    };

    let start_time = Instant::now();
    let df = frame.collect()?;
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

    let columns: Result<Vec<Vec<Value>>, PolarsError> =
        names.par_iter().map(|name| column_values(&df, name)).collect();
    let columns = columns?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let mut row = Row::new();
        for (name, column) in names.iter().zip(columns.iter()) {
            row.insert(name.clone(), column[idx].clone());
        }
        rows.push(row);
    }

    debug!("Loaded {} rows in {}ms", rows.len(), start_time.elapsed().as_millis());
    Ok(rows)
}

// A JSON file is either a bare row array or a {rows, totalRows} page.
fn load_json_rows(path: &Path) -> Result<Vec<Row>, GridError> {
    let body = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&body)?;
    let rows = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("rows") {
            Some(Value::Array(items)) => items,
            _ => return Err(GridError::BadPayload("expected a row array".into())),
        },
        _ => return Err(GridError::BadPayload("expected a row array".into())),
    };
    rows.into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(GridError::BadPayload(format!("row is not an object: {other}"))),
        })
        .collect()
}
