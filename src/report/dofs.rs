//! Degrees-of-freedom summary file.
//!
//! One line per run, keyed by polynomial order and process count, with
//! the global DoF total of each function space. Append-only: unlike the
//! timing tables, this file is never re-sorted or rewritten.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::HarnessError;

/// Header written once when the file is created.
const HEADER: &str = "poly:numprocs:[fs1_dofs;fs2_dofs;...]";

/// Append one run's DoF line, creating the file (with its header) and
/// parent directories when absent.
pub fn append_summary(
    path: &Path,
    poly_order: u32,
    num_procs: u32,
    dofs: &[u64],
) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }
    let fresh = !path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| HarnessError::io(path, e))?;
    if fresh {
        writeln!(file, "{}", HEADER).map_err(|e| HarnessError::io(path, e))?;
    }
    let joined = dofs
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(";");
    writeln!(file, "{}:{}:{}", poly_order, num_procs, joined)
        .map_err(|e| HarnessError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_once_then_append_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sub").join("dofs_summary.txt");

        append_summary(&path, 1, 4, &[1000, 2000]).unwrap();
        append_summary(&path, 2, 4, &[4000, 8000]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1:4:1000;2000");
        assert_eq!(lines[2], "2:4:4000;8000");
    }
}
