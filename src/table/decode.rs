//! Per-format decoders producing one [`Frame`] per file

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::{Cell, ColumnType, TableError, TableResult};
use crate::DistributionFormat;

/// One decoded file before concatenation
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// File the frame was decoded from
    pub source: PathBuf,
    /// Column names in file order
    pub columns: Vec<String>,
    /// Rows, each exactly `columns.len()` cells wide
    pub rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Join of the non-null cell types in column `idx`; `None` when all null
    pub fn column_type(&self, idx: usize) -> Option<ColumnType> {
        self.rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(Cell::column_type))
            .reduce(ColumnType::join)
    }
}

/// Decode `path` according to its extension
pub fn decode_file(path: &Path) -> TableResult<Frame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match DistributionFormat::from_extension(ext) {
        DistributionFormat::Csv => decode_delimited(path, b','),
        DistributionFormat::Psv => decode_delimited(path, b'|'),
        DistributionFormat::Json => decode_json(path),
        DistributionFormat::Parquet => decode_parquet(path),
        DistributionFormat::Other(format) => Err(TableError::UnsupportedFormat {
            path: path.to_path_buf(),
            format,
        }),
    }
}

fn decode_error(path: &Path, reason: impl ToString) -> TableError {
    TableError::Decode {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Delimited text with a header row; cells are type-inferred
pub fn decode_delimited(path: &Path, delimiter: u8) -> TableResult<Frame> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| decode_error(path, e))?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| decode_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| decode_error(path, e))?;
        rows.push(record.iter().map(Cell::infer).collect());
    }

    Ok(Frame {
        source: path.to_path_buf(),
        columns,
        rows,
    })
}

/// JSON records: a top-level array of objects or one object per line
pub fn decode_json(path: &Path) -> TableResult<Frame> {
    let text = std::fs::read_to_string(path).map_err(|e| decode_error(path, e))?;
    let trimmed = text.trim_start();

    let objects: Vec<Map<String, Value>> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| decode_error(path, e))?
    } else {
        trimmed
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str::<Map<String, Value>>(line)
                    .map_err(|e| decode_error(path, format!("record {}: {}", n + 1, e)))
            })
            .collect::<TableResult<_>>()?
    };

    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for object in &objects {
        for key in object.keys() {
            if !index.contains_key(key) {
                index.insert(key.clone(), columns.len());
                columns.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|object| {
            let mut row = vec![Cell::Null; columns.len()];
            for (key, value) in object {
                if let Some(&idx) = index.get(key) {
                    row[idx] = json_to_cell(value);
                }
            }
            row
        })
        .collect();

    Ok(Frame {
        source: path.to_path_buf(),
        columns,
        rows,
    })
}

fn json_to_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
        },
        Value::String(s) => Cell::Str(s.clone()),
        other => Cell::Str(other.to_string()),
    }
}

/// Parquet file read row by row through the record API
pub fn decode_parquet(path: &Path) -> TableResult<Frame> {
    let file = File::open(path).map_err(|e| decode_error(path, e))?;
    let reader = SerializedFileReader::new(file).map_err(|e| decode_error(path, e))?;

    let columns: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();
    let index: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let iter = reader
        .get_row_iter(None)
        .map_err(|e| decode_error(path, e))?;

    let mut rows = Vec::new();
    for row in iter {
        let row = row.map_err(|e| decode_error(path, e))?;
        let mut cells = vec![Cell::Null; columns.len()];
        for (name, field) in row.get_column_iter() {
            if let Some(&idx) = index.get(name.as_str()) {
                cells[idx] = field_to_cell(field);
            }
        }
        rows.push(cells);
    }

    Ok(Frame {
        source: path.to_path_buf(),
        columns,
        rows,
    })
}

fn field_to_cell(field: &Field) -> Cell {
    match field {
        Field::Null => Cell::Null,
        Field::Bool(b) => Cell::Bool(*b),
        Field::Byte(v) => Cell::Int(i64::from(*v)),
        Field::Short(v) => Cell::Int(i64::from(*v)),
        Field::Int(v) => Cell::Int(i64::from(*v)),
        Field::Long(v) => Cell::Int(*v),
        Field::UByte(v) => Cell::Int(i64::from(*v)),
        Field::UShort(v) => Cell::Int(i64::from(*v)),
        Field::UInt(v) => Cell::Int(i64::from(*v)),
        Field::ULong(v) => i64::try_from(*v)
            .map(Cell::Int)
            .unwrap_or(Cell::Float(*v as f64)),
        Field::Float(v) => Cell::Float(f64::from(*v)),
        Field::Double(v) => Cell::Float(*v),
        Field::Str(s) => Cell::Str(s.clone()),
        // Dates, timestamps, decimals and nested values keep their printed form
        other => Cell::Str(other.to_string()),
    }
}
