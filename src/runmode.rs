//! Execution-mode labels and environment probing.
//!
//! Result rows are tagged by how the run was parallelized. The thread
//! count only counts when the threading backend is active, so the label
//! derivation takes both the process count and the interpreted thread
//! count.

use std::env;

/// Environment variable selecting the threading backend.
pub const BACKEND_VAR: &str = "TILE_BACKEND";

/// Environment variable carrying the OpenMP thread count.
pub const THREADS_VAR: &str = "OMP_NUM_THREADS";

/// Environment variable naming the node/platform for result paths.
pub const PLATFORM_VAR: &str = "NODENAME";

/// Threading backend the kernel runtime was built to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sequential,
    OpenMp,
}

impl Backend {
    /// Interpret the backend-selector variable; anything other than an
    /// OpenMP selector means sequential execution within a rank.
    pub fn from_env_value(value: Option<&str>) -> Backend {
        match value {
            Some(v) if v.eq_ignore_ascii_case("omp") => Backend::OpenMp,
            _ => Backend::Sequential,
        }
    }
}

/// Per-run environment: backend, interpreted thread count, platform name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEnv {
    pub backend: Backend,
    pub num_threads: u32,
    pub platform: String,
}

impl RunEnv {
    /// Probe the process environment.
    ///
    /// The thread-count variable is only honored under the OpenMP
    /// backend; unset or unparseable values fall back to 1. The platform
    /// defaults to "unknown".
    pub fn detect() -> RunEnv {
        let backend = Backend::from_env_value(env::var(BACKEND_VAR).ok().as_deref());
        let num_threads = match backend {
            Backend::OpenMp => env::var(THREADS_VAR)
                .ok()
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(1),
            Backend::Sequential => 1,
        };
        let platform = env::var(PLATFORM_VAR).unwrap_or_else(|_| "unknown".to_string());
        RunEnv {
            backend,
            num_threads,
            platform,
        }
    }
}

/// Execution-mode label a timing row is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    OpenMp,
    Mpi,
    MpiOpenMp,
}

impl ExecutionMode {
    /// Path component / row tag for this mode.
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::OpenMp => "openmp",
            ExecutionMode::Mpi => "mpi",
            ExecutionMode::MpiOpenMp => "mpi_openmp",
        }
    }

    /// Modes a run with the given topology is recorded under.
    ///
    /// A single-process, single-thread run is the comparison baseline for
    /// every mode and is recorded under all four labels; any other
    /// topology maps to exactly one.
    pub fn for_topology(num_procs: u32, num_threads: u32) -> Vec<ExecutionMode> {
        if num_procs == 1 && num_threads == 1 {
            vec![
                ExecutionMode::Sequential,
                ExecutionMode::OpenMp,
                ExecutionMode::Mpi,
                ExecutionMode::MpiOpenMp,
            ]
        } else if num_procs == 1 {
            vec![ExecutionMode::OpenMp]
        } else if num_threads == 1 {
            vec![ExecutionMode::Mpi]
        } else {
            vec![ExecutionMode::MpiOpenMp]
        }
    }
}
