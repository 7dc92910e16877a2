//! End-to-end reporter semantics: span aggregation, perf-log derivation,
//! timing-table and DoF-summary persistence, artifact cleanup.

mod common;

use std::path::Path;

use tempfile::TempDir;

use common::ScriptedComm;
use tile_bench::comm::{RunSpan, SingleProcess};
use tile_bench::perflog::RecordedPerfLog;
use tile_bench::report::{record_run, timetable, FunctionSpace, RunInfo};
use tile_bench::runmode::{Backend, RunEnv};

fn run_info(dir: &Path, tofile: bool) -> RunInfo {
    RunInfo {
        program: "demo".to_string(),
        domain: "rectangle".to_string(),
        mesh_id: "default_mesh".to_string(),
        poly_order: 2,
        num_timesteps: 100,
        nloops: 25,
        tile_size: 20,
        explicit_mode: 4,
        partitioning: "chunk".to_string(),
        extra_halo: 1,
        glb_maps: false,
        coloring: "default".to_string(),
        prefetch: false,
        verbose: false,
        tofile,
        function_spaces: vec![
            FunctionSpace {
                name: "velocity".to_string(),
                local_dofs: 1000,
            },
            FunctionSpace {
                name: "stress".to_string(),
                local_dofs: 2000,
            },
        ],
        out_dir: dir.to_path_buf(),
    }
}

fn env(num_threads: u32) -> RunEnv {
    RunEnv {
        backend: if num_threads > 1 {
            Backend::OpenMp
        } else {
            Backend::Sequential
        },
        num_threads,
        platform: "testnode".to_string(),
    }
}

#[test]
fn baseline_run_is_filed_under_all_four_labels() {
    let dir = TempDir::new().unwrap();
    let comm = SingleProcess;
    let perf = RecordedPerfLog::new(vec![1.5], vec![0.5]);
    let info = run_info(dir.path(), true);

    let outcome = record_run(&comm, &perf, &env(1), RunSpan::new(10.0, 14.5), &info).unwrap();

    assert_eq!(outcome.total_time, Some(4.5));
    assert_eq!(outcome.avg_compute, Some(1.5));
    assert_eq!(outcome.avg_compute_comm, Some(2.0));
    assert_eq!(outcome.timing_files.len(), 4);

    for label in ["sequential", "openmp", "mpi", "mpi_openmp"] {
        let path = dir
            .path()
            .join("times")
            .join("demo")
            .join("poly_2")
            .join("rectangle")
            .join("default_mesh")
            .join(label)
            .join("testnode")
            .join("np1_nt1.txt");
        assert!(path.exists(), "missing table for {label}");
        let rows = timetable::parse_rows(&std::fs::read_to_string(&path).unwrap());
        assert_eq!(rows.len(), 1);
        assert!((rows[0][0].as_f64().unwrap() - 4.5).abs() < 1e-12);
        assert_eq!(rows[0][4], timetable::Field::Text("fs4".to_string()));
        assert_eq!(rows[0][7], timetable::Field::Text("yes".to_string()));
    }
}

#[test]
fn multi_rank_run_is_filed_under_one_label() {
    let dir = TempDir::new().unwrap();
    let comm = ScriptedComm::new(
        4,
        vec![
            RunSpan::new(9.5, 14.0),
            RunSpan::new(10.2, 15.25),
            RunSpan::new(10.0, 14.8),
        ],
    );
    let perf = RecordedPerfLog::new(vec![1.0, 2.0, 3.0, 4.0], vec![0.1, 0.2, 0.3, 0.4]);
    let info = run_info(dir.path(), true);

    let outcome = record_run(&comm, &perf, &env(1), RunSpan::new(10.0, 15.0), &info).unwrap();

    // Earliest start 9.5, latest end 15.25.
    assert_eq!(outcome.total_time, Some(5.75));
    assert_eq!(outcome.avg_compute, Some(2.5));
    assert_eq!(outcome.avg_compute_comm, Some(2.75));
    assert_eq!(outcome.timing_files.len(), 1);
    assert!(outcome.timing_files[0].ends_with(
        Path::new("times/demo/poly_2/rectangle/default_mesh/mpi/testnode/np4_nt1.txt")
    ));

    // No baseline duplicates.
    for label in ["sequential", "openmp", "mpi_openmp"] {
        let path = dir
            .path()
            .join("times")
            .join("demo")
            .join("poly_2")
            .join("rectangle")
            .join("default_mesh")
            .join(label);
        assert!(!path.exists(), "unexpected table tree for {label}");
    }
}

#[test]
fn hybrid_topology_maps_to_mpi_openmp() {
    let dir = TempDir::new().unwrap();
    let comm = ScriptedComm::new(2, vec![RunSpan::new(0.0, 1.0)]);
    let perf = RecordedPerfLog::new(vec![0.5, 0.5], vec![0.0, 0.0]);
    let info = run_info(dir.path(), true);

    let outcome = record_run(&comm, &perf, &env(8), RunSpan::new(0.0, 1.0), &info).unwrap();

    assert_eq!(outcome.timing_files.len(), 1);
    assert!(outcome.timing_files[0].ends_with(Path::new("mpi_openmp/testnode/np2_nt8.txt")));
}

#[test]
fn dof_summary_accumulates_reduced_totals() {
    let dir = TempDir::new().unwrap();
    let comm = ScriptedComm::new(
        4,
        vec![
            RunSpan::new(0.0, 1.0),
            RunSpan::new(0.0, 1.0),
            RunSpan::new(0.0, 1.0),
        ],
    );
    let perf = RecordedPerfLog::new(vec![1.0; 4], vec![0.0; 4]);
    let info = run_info(dir.path(), true);

    record_run(&comm, &perf, &env(1), RunSpan::new(0.0, 1.0), &info).unwrap();
    record_run(&comm, &perf, &env(1), RunSpan::new(0.0, 2.0), &info).unwrap();

    let path = dir
        .path()
        .join("times")
        .join("demo")
        .join("dofs_summary.txt");
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "poly:numprocs:[fs1_dofs;fs2_dofs;...]");
    // 4 ranks x (1000, 2000) local DoFs.
    assert_eq!(lines[1], "2:4:4000;8000");
    assert_eq!(lines[2], "2:4:4000;8000");
}

#[test]
fn tofile_false_skips_all_persistence() {
    let dir = TempDir::new().unwrap();
    let comm = SingleProcess;
    let perf = RecordedPerfLog::new(vec![1.0], vec![0.0]);
    let info = run_info(dir.path(), false);

    let outcome = record_run(&comm, &perf, &env(1), RunSpan::new(1.0, 2.0), &info).unwrap();

    assert_eq!(outcome.total_time, Some(1.0));
    assert_eq!(outcome.avg_compute, None);
    assert!(outcome.timing_files.is_empty());
    assert!(!dir.path().join("times").exists());
    assert!(!dir.path().join("perflog_snapshot.txt").exists());
}

#[test]
fn snapshot_artifact_is_removed_after_reporting() {
    let dir = TempDir::new().unwrap();
    let comm = SingleProcess;
    let perf = RecordedPerfLog::new(vec![1.0], vec![0.2]);
    let info = run_info(dir.path(), true);

    record_run(&comm, &perf, &env(1), RunSpan::new(0.0, 3.0), &info).unwrap();

    assert!(!dir.path().join("perflog_snapshot.txt").exists());
    assert!(dir.path().join("times").exists());
}

#[test]
fn repeated_runs_keep_the_table_sorted() {
    let dir = TempDir::new().unwrap();
    let comm = SingleProcess;
    let info = run_info(dir.path(), true);
    let e = env(1);

    for (start, end, compute) in [(0.0, 3.0, 2.0), (0.0, 1.0, 0.8), (0.0, 2.0, 1.5)] {
        let perf = RecordedPerfLog::new(vec![compute], vec![0.1]);
        record_run(&comm, &perf, &e, RunSpan::new(start, end), &info).unwrap();
    }

    let path = dir
        .path()
        .join("times")
        .join("demo")
        .join("poly_2")
        .join("rectangle")
        .join("default_mesh")
        .join("sequential")
        .join("testnode")
        .join("np1_nt1.txt");
    let rows = timetable::parse_rows(&std::fs::read_to_string(&path).unwrap());
    let totals: Vec<f64> = rows.iter().map(|r| r[0].as_f64().unwrap()).collect();
    assert_eq!(totals, vec![1.0, 2.0, 3.0]);
}
