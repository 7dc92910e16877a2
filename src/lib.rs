//! tile-bench: run-configuration and timing harness for loop-chain
//! fusion/tiling experiments.
//!
//! The harness resolves a fusion scheme (which loops of a fixed 25-loop
//! computational chain are fused into tiled groups, and with what tile
//! size), derives the halo depth a distributed run needs to stay correct
//! under chain unrolling, drives a workload, and records wall-clock and
//! kernel timings into on-disk result tables.
//!
//! The solver, mesh and message-passing runtime are collaborators behind
//! the [`comm::Communicator`] and [`perflog::PerfLogSource`] seams; this
//! crate ships single-process implementations so the binary and tests run
//! without an MPI launcher.

pub mod chain;
pub mod cli;
pub mod comm;
pub mod error;
pub mod halo;
pub mod perflog;
pub mod report;
pub mod runmode;
pub mod schemes;

pub use crate::comm::{Communicator, RunSpan, SingleProcess};
pub use crate::error::HarnessError;
pub use crate::halo::compute_sdepth;
pub use crate::report::{record_run, RunInfo};
pub use crate::schemes::{resolve, LoopGroup, ResolvedScheme, CHAIN_LENGTH};
