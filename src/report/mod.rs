//! End-of-run reporting: aggregate spans across ranks, derive average
//! kernel timings from the runtime's performance snapshot, and persist
//! result rows.
//!
//! Rank 0 is the sole filesystem writer. The reporting pass runs once,
//! after the simulation completes; there is no resumability and no
//! partial report on mid-run failure.

pub mod dofs;
pub mod summary;
pub mod timetable;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;
use serde::Serialize;

use crate::comm::{Communicator, RunSpan};
use crate::error::HarnessError;
use crate::perflog::{self, PerfLogSource};
use crate::runmode::{ExecutionMode, RunEnv};
use crate::schemes::ResolvedScheme;
use self::timetable::TimingRecord;

/// File name of the temporary performance snapshot, removed by root
/// once the reporting pass is over.
const PERFLOG_ARTIFACT: &str = "perflog_snapshot.txt";

/// One function space of the discretization: name and the DoF count
/// owned by this rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSpace {
    pub name: String,
    pub local_dofs: u64,
}

/// Everything the reporter needs to know about the finished run.
#[derive(Debug, Clone)]
pub struct RunInfo {
    /// Program name, first path component under `times/`.
    pub program: String,
    /// Problem domain name.
    pub domain: String,
    /// Mesh identifier.
    pub mesh_id: String,
    pub poly_order: u32,
    pub num_timesteps: u32,
    /// Number of chain loops that were tiled (0 = untiled run).
    pub nloops: u32,
    pub tile_size: u32,
    /// Explicit fusion-scheme id, 0 when none was requested.
    pub explicit_mode: u32,
    /// Partitioning label for the result row.
    pub partitioning: String,
    /// Extra halo layers requested (recorded as yes/no).
    pub extra_halo: u32,
    pub glb_maps: bool,
    pub coloring: String,
    pub prefetch: bool,
    pub verbose: bool,
    /// When false the reporter stops after the wall-clock aggregation.
    pub tofile: bool,
    pub function_spaces: Vec<FunctionSpace>,
    /// Directory the `times/` tree and the temporary snapshot live in.
    pub out_dir: PathBuf,
}

/// What the reporting pass produced; non-root ranks see `None`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportOutcome {
    pub total_time: Option<f64>,
    pub avg_compute: Option<f64>,
    pub avg_compute_comm: Option<f64>,
    pub timing_files: Vec<PathBuf>,
}

/// Derive the row's mode label and effective tile size.
///
/// Untiled runs force the tile size to 0; explicit schemes are tagged
/// `fs<id>`, everything else by how many loops were tiled.
pub fn mode_label(nloops: u32, explicit_mode: u32, tile_size: u32) -> (String, u32) {
    if nloops == 0 {
        ("untiled".to_string(), 0)
    } else if explicit_mode > 0 {
        (format!("fs{}", explicit_mode), tile_size)
    } else {
        (format!("loops{}", nloops), tile_size)
    }
}

/// Round to 3 decimals, the precision timing rows are stored at.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Path of one timing table.
fn timing_file_path(info: &RunInfo, mode: ExecutionMode, env: &RunEnv, num_procs: u32) -> PathBuf {
    info.out_dir
        .join("times")
        .join(&info.program)
        .join(format!("poly_{}", info.poly_order))
        .join(&info.domain)
        .join(&info.mesh_id)
        .join(mode.label())
        .join(&env.platform)
        .join(format!("np{}_nt{}.txt", num_procs, env.num_threads))
}

/// Record the finished run: gather spans, derive kernel averages from
/// the performance snapshot, and append a row to every timing table the
/// run's topology maps to, plus one line to the DoF summary.
///
/// Collective: every rank must call this with its own span.
pub fn record_run(
    comm: &dyn Communicator,
    perf: &dyn PerfLogSource,
    env: &RunEnv,
    span: RunSpan,
    info: &RunInfo,
) -> Result<ReportOutcome, HarnessError> {
    let num_procs = comm.size();
    let mut outcome = ReportOutcome::default();

    // Whole-run wall clock: earliest start to latest end across ranks.
    let spans = comm.gather_spans(span);
    if let Some(ref spans) = spans {
        let min_start = spans.iter().map(|s| s.start).fold(f64::INFINITY, f64::min);
        let max_end = spans.iter().map(|s| s.end).fold(f64::NEG_INFINITY, f64::max);
        let total = round3(max_end - min_start);
        summary::print_timestepping(total);
        outcome.total_time = Some(total);
    }

    if !info.tofile {
        return Ok(outcome);
    }

    fs::create_dir_all(&info.out_dir).map_err(|e| HarnessError::io(&info.out_dir, e))?;
    let snapshot = info.out_dir.join(PERFLOG_ARTIFACT);
    perf.dump(&snapshot)?;

    let series = if comm.is_root() {
        let series = perflog::read(&snapshot, num_procs)?;
        let act = round3(series.avg_compute());
        let amt = round3(series.avg_exchange());
        let acct = act + amt;
        summary::print_averages(act, acct);
        outcome.avg_compute = Some(act);
        outcome.avg_compute_comm = Some(acct);
        Some(series)
    } else {
        None
    };

    let (mode, tile_size) = mode_label(info.nloops, info.explicit_mode, info.tile_size);

    if let (true, Some(total), Some(act), Some(acct)) = (
        comm.is_root(),
        outcome.total_time,
        outcome.avg_compute,
        outcome.avg_compute_comm,
    ) {
        let record = TimingRecord {
            total_time: total,
            avg_compute: act,
            avg_compute_comm: acct,
            timesteps: info.num_timesteps,
            mode,
            tile_size,
            partitioning: info.partitioning.clone(),
            extra_halo: info.extra_halo > 0,
            glb_maps: info.glb_maps,
            coloring: info.coloring.clone(),
            prefetch: info.prefetch,
        };
        for exec_mode in ExecutionMode::for_topology(num_procs, env.num_threads) {
            let path = timing_file_path(info, exec_mode, env, num_procs);
            timetable::append_record(&path, &record)?;
            debug!("timing row appended to {:?}", path);
            outcome.timing_files.push(path);
        }
    }

    // Global DoF totals: all ranks join the reduction, root writes.
    let totals: Vec<u64> = info
        .function_spaces
        .iter()
        .map(|fs| comm.allreduce_sum(fs.local_dofs))
        .collect();
    if comm.is_root() {
        let dofs_path = info
            .out_dir
            .join("times")
            .join(&info.program)
            .join("dofs_summary.txt");
        dofs::append_summary(&dofs_path, info.poly_order, num_procs, &totals)?;
    }

    if info.verbose {
        if let (Some(spans), Some(series)) = (&spans, &series) {
            let spaces: Vec<(String, u64)> = info
                .function_spaces
                .iter()
                .zip(&totals)
                .map(|(fs, total)| (fs.name.clone(), *total))
                .collect();
            summary::print_rank_breakdown(spans, series, &spaces);
        }
    }

    // All ranks must be done with the snapshot before root removes it.
    comm.barrier();
    if comm.is_root() {
        fs::remove_file(&snapshot).map_err(|e| HarnessError::io(&snapshot, e))?;
    }

    Ok(outcome)
}

/// Machine-readable record of the resolved run configuration, written
/// when `--log` is passed.
#[derive(Debug, Serialize)]
pub struct TilingPlan<'a> {
    pub timestamp: String,
    pub program: &'a str,
    pub num_procs: u32,
    pub num_threads: u32,
    pub platform: &'a str,
    pub num_unroll: u32,
    pub fusion_mode: &'a str,
    pub part_mode: &'a str,
    pub coloring: &'a str,
    pub kernel_opt: &'a str,
    pub tile_size: u32,
    pub extra_halo: u32,
    pub sdepth: u32,
    pub scheme: Option<&'a ResolvedScheme>,
}

impl<'a> TilingPlan<'a> {
    /// Serialize the plan to `tiling_plan.json` under `out_dir`.
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf, HarnessError> {
        fs::create_dir_all(out_dir).map_err(|e| HarnessError::io(out_dir, e))?;
        let path = out_dir.join("tiling_plan.json");
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| HarnessError::Report(format!("plan serialization failed: {}", e)))?;
        fs::write(&path, json).map_err(|e| HarnessError::io(&path, e))?;
        Ok(path)
    }
}

/// Current wall-clock time in seconds, for building [`RunSpan`]s.
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1e6
}
