//! Performance-log snapshot: dump seam and explicit parser.
//!
//! The kernel runtime can dump its accumulated per-rank timings to a
//! text artifact. The reporter needs exactly two series out of that
//! dump: pure kernel compute time and halo-exchange time, one value per
//! rank. Rather than evaluating the artifact as generated code, the
//! parser here reads the flat `key=value` line format:
//!
//! ```text
//! event=kernel_compute rank=0 time=1.2345
//! event=halo_exchange rank=0 time=0.0871
//! ```
//!
//! Lines for other events, comments and blank lines are ignored. Ranks
//! may appear in any order; a later line for the same (event, rank)
//! overwrites the earlier one; a series missing any rank is an error.

use std::fs;
use std::path::Path;

use crate::error::HarnessError;

/// Series name for pure kernel compute time.
pub const COMPUTE_SERIES: &str = "kernel_compute";

/// Series name for halo-exchange (communication) time.
pub const EXCHANGE_SERIES: &str = "halo_exchange";

/// Producer of the performance-log artifact.
///
/// `dump` is collective: every rank must call it, and after the call the
/// artifact at `path` holds the series for all ranks. Only root reads it
/// back.
pub trait PerfLogSource {
    fn dump(&self, path: &Path) -> Result<(), HarnessError>;
}

/// The two per-rank timing series extracted from a snapshot, indexed by
/// rank.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfSeries {
    pub compute: Vec<f64>,
    pub exchange: Vec<f64>,
}

impl PerfSeries {
    /// Mean of a series; empty series average to 0.0.
    fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    /// Average compute time across ranks.
    pub fn avg_compute(&self) -> f64 {
        Self::mean(&self.compute)
    }

    /// Average halo-exchange time across ranks.
    pub fn avg_exchange(&self) -> f64 {
        Self::mean(&self.exchange)
    }
}

/// Parse a snapshot into per-rank series for `num_procs` ranks.
pub fn parse(content: &str, num_procs: u32) -> Result<PerfSeries, HarnessError> {
    let n = num_procs as usize;
    let mut compute: Vec<Option<f64>> = vec![None; n];
    let mut exchange: Vec<Option<f64>> = vec![None; n];

    for line in content.lines() {
        let Some((event, rank, time)) = parse_line(line) else {
            continue;
        };
        let slot = match event {
            COMPUTE_SERIES => &mut compute,
            EXCHANGE_SERIES => &mut exchange,
            _ => continue,
        };
        if rank >= n {
            return Err(HarnessError::PerfLog(format!(
                "rank {} out of range for {} processes",
                rank, num_procs
            )));
        }
        slot[rank] = Some(time);
    }

    let collect = |name: &str, slots: Vec<Option<f64>>| -> Result<Vec<f64>, HarnessError> {
        slots
            .into_iter()
            .enumerate()
            .map(|(rank, v)| {
                v.ok_or_else(|| {
                    HarnessError::PerfLog(format!("series '{}' missing rank {}", name, rank))
                })
            })
            .collect()
    };

    Ok(PerfSeries {
        compute: collect(COMPUTE_SERIES, compute)?,
        exchange: collect(EXCHANGE_SERIES, exchange)?,
    })
}

/// Read and parse a snapshot artifact.
pub fn read(path: &Path, num_procs: u32) -> Result<PerfSeries, HarnessError> {
    let content = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    parse(&content, num_procs)
}

/// Extract (event, rank, time) from one line, if it carries all three
/// keys.
fn parse_line(line: &str) -> Option<(&str, usize, f64)> {
    let mut event = None;
    let mut rank = None;
    let mut time = None;
    for token in line.split_whitespace() {
        let (key, value) = token.split_once('=')?;
        match key {
            "event" => event = Some(value),
            "rank" => rank = value.parse::<usize>().ok(),
            "time" => time = value.parse::<f64>().ok(),
            _ => {}
        }
    }
    Some((event?, rank?, time?))
}

/// In-process snapshot source backed by already-measured series.
///
/// Used by the single-process driver, where the harness itself timed the
/// kernels, and by tests that script a multi-rank dump.
#[derive(Debug, Clone)]
pub struct RecordedPerfLog {
    pub compute: Vec<f64>,
    pub exchange: Vec<f64>,
}

impl RecordedPerfLog {
    pub fn new(compute: Vec<f64>, exchange: Vec<f64>) -> RecordedPerfLog {
        RecordedPerfLog { compute, exchange }
    }
}

impl PerfLogSource for RecordedPerfLog {
    fn dump(&self, path: &Path) -> Result<(), HarnessError> {
        let mut out = String::new();
        for (rank, time) in self.compute.iter().enumerate() {
            out.push_str(&format!(
                "event={} rank={} time={}\n",
                COMPUTE_SERIES, rank, time
            ));
        }
        for (rank, time) in self.exchange.iter().enumerate() {
            out.push_str(&format!(
                "event={} rank={} time={}\n",
                EXCHANGE_SERIES, rank, time
            ));
        }
        fs::write(path, out).map_err(|e| HarnessError::io(path, e))
    }
}
