//! Tabular materialization of downloaded distributions
//!
//! Successful outcomes are decoded in order and concatenated into one
//! [`Table`]. Columns are unioned across files in first-seen order; a file
//! lacking a column contributes `Null` cells for it.
//!
//! # Column types
//!
//! Inside one file a column's type is the join of its non-null cells: `Int`
//! and `Float` join to `Float`, any other mix becomes `Str`. Across files a
//! column must agree on its type, with `Int`/`Float` widening to `Float`;
//! anything else is a [`TableError::SchemaMismatch`].

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::downloader::DownloadOutcome;

pub mod decode;

pub use decode::{decode_file, Frame};

/// Materialization errors
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// File content unreadable in its declared format
    #[error("failed to decode {}: {reason}", .path.display())]
    Decode {
        /// Offending file
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// No decoder for the file's extension
    #[error("unsupported format '{format}' for {}", .path.display())]
    UnsupportedFormat {
        /// Offending file
        path: PathBuf,
        /// Extension found
        format: String,
    },

    /// A column's type disagrees between files
    #[error("schema mismatch on column '{column}': {expected} vs {found} in {}", .path.display())]
    SchemaMismatch {
        /// Column name
        column: String,
        /// Type established by earlier files
        expected: ColumnType,
        /// Type found in `path`
        found: ColumnType,
        /// File that disagreed
        path: PathBuf,
    },

    /// Projection named a column the table does not have
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// Failure writing the table out
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// One table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Text
    Str(String),
}

impl Cell {
    /// Infer a cell from delimited text
    pub fn infer(raw: &str) -> Cell {
        let value = raw.trim();
        if value.is_empty() {
            return Cell::Null;
        }
        if let Ok(i) = value.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = value.parse::<f64>() {
            if f.is_finite() {
                return Cell::Float(f);
            }
        }
        match value {
            "true" | "TRUE" | "True" => Cell::Bool(true),
            "false" | "FALSE" | "False" => Cell::Bool(false),
            _ => Cell::Str(raw.to_string()),
        }
    }

    /// Type of a non-null cell
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Cell::Null => None,
            Cell::Bool(_) => Some(ColumnType::Bool),
            Cell::Int(_) => Some(ColumnType::Int),
            Cell::Float(_) => Some(ColumnType::Float),
            Cell::Str(_) => Some(ColumnType::Str),
        }
    }

    /// Whether the cell is [`Cell::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    fn coerce(self, ty: ColumnType) -> Cell {
        match (self, ty) {
            (Cell::Null, _) => Cell::Null,
            (Cell::Int(i), ColumnType::Float) => Cell::Float(i as f64),
            (cell @ Cell::Str(_), ColumnType::Str) => cell,
            (cell, ColumnType::Str) => Cell::Str(cell.to_string()),
            (cell, _) => cell,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Str(s) => f.write_str(s),
        }
    }
}

/// Logical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Booleans
    Bool,
    /// Integers
    Int,
    /// Floats
    Float,
    /// Text
    Str,
}

impl ColumnType {
    /// Join of two cell types within one file
    pub fn join(self, other: ColumnType) -> ColumnType {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                ColumnType::Float
            }
            _ => ColumnType::Str,
        }
    }

    /// Merge the types a column has in two files, `None` when irreconcilable
    pub fn unify(self, other: ColumnType) -> Option<ColumnType> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                Some(ColumnType::Float)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Bool => "bool",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Str => "string",
        };
        f.write_str(name)
    }
}

/// In-memory table built from downloaded files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Empty table with no columns
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Keep only `names`, in the given order
    pub fn project(&self, names: &[String]) -> TableResult<Table> {
        let positions = names
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| TableError::UnknownColumn(name.clone()))
            })
            .collect::<TableResult<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Table {
            columns: names.to_vec(),
            rows,
        })
    }

    /// Concatenate frames in order under a unioned schema
    pub fn concat(frames: Vec<Frame>) -> TableResult<Table> {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut types: Vec<Option<ColumnType>> = Vec::new();

        for frame in &frames {
            for (idx, name) in frame.columns.iter().enumerate() {
                let slot = match positions.get(name) {
                    Some(&slot) => slot,
                    None => {
                        positions.insert(name.clone(), columns.len());
                        columns.push(name.clone());
                        types.push(None);
                        columns.len() - 1
                    }
                };

                let Some(found) = frame.column_type(idx) else {
                    continue;
                };
                types[slot] = match types[slot] {
                    None => Some(found),
                    Some(expected) => Some(expected.unify(found).ok_or_else(|| {
                        TableError::SchemaMismatch {
                            column: name.clone(),
                            expected,
                            found,
                            path: frame.source.clone(),
                        }
                    })?),
                };
            }
        }

        let mut rows = Vec::with_capacity(frames.iter().map(|f| f.rows.len()).sum());
        for frame in frames {
            let mapping: Vec<Option<usize>> = columns
                .iter()
                .map(|name| frame.columns.iter().position(|c| c == name))
                .collect();
            let frame_types: Vec<Option<ColumnType>> = (0..frame.columns.len())
                .map(|idx| frame.column_type(idx))
                .collect();

            for row in frame.rows {
                let cells = mapping
                    .iter()
                    .zip(&types)
                    .map(|(source, ty)| {
                        let cell = source
                            .and_then(|i| row.get(i).cloned())
                            .unwrap_or(Cell::Null);
                        // Frame-level join first, then cross-file widening
                        let cell = match source.and_then(|i| frame_types[i]) {
                            Some(local) => cell.coerce(local),
                            None => cell,
                        };
                        match ty {
                            Some(ty) => cell.coerce(*ty),
                            None => cell,
                        }
                    })
                    .collect();
                rows.push(cells);
            }
        }

        Ok(Table { columns, rows })
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> TableResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(&self.columns)
            .map_err(|e| TableError::IoError(e.to_string()))?;
        for row in &self.rows {
            csv_writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .map_err(|e| TableError::IoError(e.to_string()))?;
        }
        csv_writer
            .flush()
            .map_err(|e| TableError::IoError(e.to_string()))
    }

    /// Write the table as CSV to `path`
    pub fn write_csv_path(&self, path: &Path) -> TableResult<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| TableError::IoError(format!("{}: {}", path.display(), e)))?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

/// Decode every successful outcome and concatenate in order
///
/// Failed outcomes are skipped; with no successes the result is an empty table.
pub fn materialize(outcomes: &[DownloadOutcome]) -> TableResult<Table> {
    materialize_with_columns(outcomes, None)
}

/// [`materialize`] followed by an optional column projection
pub fn materialize_with_columns(
    outcomes: &[DownloadOutcome],
    columns: Option<&[String]>,
) -> TableResult<Table> {
    let mut frames = Vec::new();
    for outcome in outcomes {
        if let DownloadOutcome::Success { path } = outcome {
            let frame = decode_file(path)?;
            debug!(path = %path.display(), rows = frame.rows.len(), "Decoded distribution");
            frames.push(frame);
        }
    }

    let table = Table::concat(frames)?;
    let table = match columns {
        Some(names) => table.project(names)?,
        None => table,
    };
    info!(
        rows = table.num_rows(),
        columns = table.num_columns(),
        "Materialized table"
    );
    Ok(table)
}
