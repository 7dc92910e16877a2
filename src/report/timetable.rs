//! Pipe-delimited timing table: parse, sort, render, rewrite.
//!
//! One file per (program, order, domain, mesh, mode label, platform,
//! topology) combination. The file is semantically append-only but
//! physically rewritten in full on every run: the existing body is
//! re-read, the new row added, and the whole table re-sorted ascending
//! by total time.

use std::fmt;
use std::fs;
use std::path::Path;

use log::warn;

use crate::error::HarnessError;

/// Column names, in row order.
pub const COLUMNS: [&str; 11] = [
    "time",
    "ACT",
    "ACCT",
    "timesteps",
    "mode",
    "tilesize",
    "partmode",
    "extrahalo",
    "glbmaps",
    "coloring",
    "prefetch",
];

/// Width of the dash separator under the header.
const SEPARATOR_WIDTH: usize = 133;

/// One parsed table field. Historical rows are coerced by ordered
/// attempt: integer, then float, then trimmed text; fields that trim to
/// nothing are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Field {
    /// Coerce a raw `|`-separated segment. Returns `None` for segments
    /// that are empty after trimming.
    pub fn coerce(raw: &str) -> Option<Field> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(Field::Int(i));
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Some(Field::Float(f));
        }
        Some(Field::Text(trimmed.to_string()))
    }

    /// Numeric view used for ordering; text fields have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Int(i) => Some(*i as f64),
            Field::Float(f) => Some(*f),
            Field::Text(_) => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(i) => write!(f, "{}", i),
            Field::Float(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row of the table.
pub type Row = Vec<Field>;

/// One run's result row, still typed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRecord {
    pub total_time: f64,
    pub avg_compute: f64,
    pub avg_compute_comm: f64,
    pub timesteps: u32,
    pub mode: String,
    pub tile_size: u32,
    pub partitioning: String,
    pub extra_halo: bool,
    pub glb_maps: bool,
    pub coloring: String,
    pub prefetch: bool,
}

impl TimingRecord {
    /// Flatten into table fields, bools as yes/no.
    pub fn fields(&self) -> Row {
        let yes_no = |b: bool| Field::Text(if b { "yes" } else { "no" }.to_string());
        vec![
            Field::Float(self.total_time),
            Field::Float(self.avg_compute),
            Field::Float(self.avg_compute_comm),
            Field::Int(self.timesteps as i64),
            Field::Text(self.mode.clone()),
            Field::Int(self.tile_size as i64),
            Field::Text(self.partitioning.clone()),
            yes_no(self.extra_halo),
            yes_no(self.glb_maps),
            Field::Text(self.coloring.clone()),
            yes_no(self.prefetch),
        ]
    }
}

/// Parse the body of an existing table: everything after the two header
/// lines, coerced field by field. A corrupted row degrades to whatever
/// fields survive coercion instead of failing the run.
pub fn parse_rows(content: &str) -> Vec<Row> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .skip(2)
        .map(|line| {
            let row: Row = line.split('|').filter_map(Field::coerce).collect();
            if row.len() != COLUMNS.len() {
                warn!(
                    "timing row has {} fields, expected {}: {:?}",
                    row.len(),
                    COLUMNS.len(),
                    line
                );
            }
            row
        })
        .collect()
}

/// Stable ascending sort by the leading total-time column. Rows whose
/// first field is missing or non-numeric order last.
pub fn sort_rows(rows: &mut [Row]) {
    rows.sort_by(|a, b| {
        let ka = a.first().and_then(Field::as_f64).unwrap_or(f64::INFINITY);
        let kb = b.first().and_then(Field::as_f64).unwrap_or(f64::INFINITY);
        ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Render header, separator and rows in the fixed 9-wide pipe format.
pub fn render(rows: &[Row]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_cells(COLUMNS.iter().map(|c| c.to_string())));
    lines.push("-".repeat(SEPARATOR_WIDTH));
    for row in rows {
        lines.push(format_cells(row.iter().map(|f| f.to_string())));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn format_cells(cells: impl Iterator<Item = String>) -> String {
    let mut line = String::from("| ");
    for cell in cells {
        line.push_str(&format!("{:>9} | ", cell));
    }
    line
}

/// Append a record to the table at `path`, creating parent directories
/// and the file when absent, and rewrite the whole table sorted by
/// total time.
pub fn append_record(path: &Path, record: &TimingRecord) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(HarnessError::io(path, e)),
    };
    let mut rows = parse_rows(&content);
    rows.push(record.fields());
    sort_rows(&mut rows);
    fs::write(path, render(&rows)).map_err(|e| HarnessError::io(path, e))
}
