//! Command-line argument parsing via clap derive.
//!
//! The surface mirrors what an operator tunes between runs: the tiling
//! configuration (unroll factor, scheme id, tile size, partitioning,
//! halo), correctness switches, and the simulation parameters the timing
//! rows are keyed by.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};

/// Run a loop-tiling experiment and record its timings.
#[derive(Parser, Debug)]
#[command(name = "tile-bench", version, about)]
pub struct HarnessArgs {
    /// Time-loop unroll factor (0 disables tiling).
    #[arg(short = 'n', long, default_value_t = 1)]
    pub num_unroll: u32,

    /// Explicit fusion-scheme id splitting the chain as [(first, last, tile), ...].
    #[arg(short = 'z', long, default_value_t = 0)]
    pub explicit_mode: u32,

    /// Initial average tile size.
    #[arg(short = 't', long, default_value_t = 5)]
    pub tile_size: u32,

    /// Fusion mode.
    #[arg(short = 'e', long, value_enum, default_value = "tile")]
    pub fusion_mode: FusionMode,

    /// Partition mode.
    #[arg(short = 'p', long, value_enum, default_value = "chunk")]
    pub part_mode: PartMode,

    /// Additional halo layers beyond the computed depth.
    #[arg(short = 'x', long, default_value_t = 0)]
    pub extra_halo: u32,

    /// Print additional information.
    #[arg(long)]
    pub verbose: bool,

    /// Write the resolved tiling plan to a file.
    #[arg(long)]
    pub log: bool,

    /// Use global maps.
    #[arg(long)]
    pub glb_maps: bool,

    /// Use software prefetching.
    #[arg(long)]
    pub prefetch: bool,

    /// Iteration-set coloring strategy.
    #[arg(long, value_enum, default_value = "default")]
    pub coloring: Coloring,

    /// Execute in debug mode.
    #[arg(long)]
    pub debug: bool,

    /// Enable harness-level profiling.
    #[arg(long)]
    pub profile: bool,

    /// Check the numerical results.
    #[arg(long)]
    pub check: bool,

    /// The method's order in space.
    #[arg(short = 'y', long, default_value_t = 1)]
    pub poly_order: u32,

    /// Use a specific mesh file.
    #[arg(short = 'f', long)]
    pub mesh_file: Option<PathBuf>,

    /// Rectangular mesh extents, format: LxxLy (e.g. 300x150).
    #[arg(short = 'm', long, value_parser = MeshSize::from_str)]
    pub mesh_size: Option<MeshSize>,

    /// Mesh spacing.
    #[arg(long, default_value_t = 2.5)]
    pub mesh_spacing: f64,

    /// Timesteps between two solution field writes.
    #[arg(short = 'o', long, default_value_t = 1)]
    pub output: u32,

    /// Courant number.
    #[arg(long, default_value_t = 0.05)]
    pub courant_number: f64,

    /// Simulation duration.
    #[arg(long, default_value_t = 2.5)]
    pub time_max: f64,

    /// Maximum number of timesteps (0 = bounded by --time-max only).
    #[arg(long, default_value_t = 0)]
    pub timesteps_max: u32,

    /// Do not store timings to file.
    #[arg(long = "no-tofile", default_value_t = true, action = clap::ArgAction::SetFalse)]
    pub tofile: bool,

    /// Kernel optimization level.
    #[arg(long, value_enum, default_value = "O2")]
    pub kernel_opt: KernelOpt,

    /// Ask the kernel runtime to capture its own performance log.
    #[arg(long)]
    pub runtime_log: bool,
}

impl HarnessArgs {
    /// Number of timesteps to run: the Courant-limited step count for
    /// `--time-max`, capped by `--timesteps-max` when that is nonzero.
    pub fn timesteps(&self) -> u32 {
        let dt = self.courant_number * self.mesh_spacing;
        let steps = if dt > 0.0 {
            (self.time_max / dt).ceil().max(1.0) as u32
        } else {
            1
        };
        if self.timesteps_max > 0 {
            steps.min(self.timesteps_max)
        } else {
            steps
        }
    }
}

/// How fused groups are formed from the loop chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FusionMode {
    Soft,
    Hard,
    Tile,
    #[value(name = "only_tile")]
    OnlyTile,
}

impl FusionMode {
    pub fn label(&self) -> &'static str {
        match self {
            FusionMode::Soft => "soft",
            FusionMode::Hard => "hard",
            FusionMode::Tile => "tile",
            FusionMode::OnlyTile => "only_tile",
        }
    }
}

/// How each fused group's iteration space is partitioned into tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartMode {
    /// Contiguous chunks; tile sizes honor the scheme multiplier.
    Chunk,
    /// Graph partitioning; tile sizes are used as-is.
    Metis,
}

impl PartMode {
    /// Label used in timing-table rows and result paths.
    pub fn label(&self) -> &'static str {
        match self {
            PartMode::Chunk => "chunk",
            PartMode::Metis => "metis",
        }
    }
}

/// Iteration-set coloring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Coloring {
    Default,
    Rand,
    Omp,
}

impl Coloring {
    pub fn label(&self) -> &'static str {
        match self {
            Coloring::Default => "default",
            Coloring::Rand => "rand",
            Coloring::Omp => "omp",
        }
    }
}

/// Kernel optimization level forwarded to the compiler backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KernelOpt {
    #[value(name = "O0")]
    O0,
    #[value(name = "O1")]
    O1,
    #[value(name = "O2")]
    O2,
    #[value(name = "O3")]
    O3,
}

impl KernelOpt {
    pub fn label(&self) -> &'static str {
        match self {
            KernelOpt::O0 => "O0",
            KernelOpt::O1 => "O1",
            KernelOpt::O2 => "O2",
            KernelOpt::O3 => "O3",
        }
    }
}

/// Rectangular mesh extents; either side may be left unset to fall back
/// to the driver default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshSize {
    pub lx: Option<f64>,
    pub ly: Option<f64>,
}

impl FromStr for MeshSize {
    type Err = String;

    /// Parse "LxxLy" extents, e.g. "300x150". Either side may be empty
    /// ("300x", "x150") to leave that extent unset.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (lx_raw, ly_raw) = s
            .split_once('x')
            .ok_or_else(|| format!("invalid mesh size '{}': expected LxxLy", s))?;

        let parse_side = |raw: &str| -> Result<Option<f64>, String> {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse::<f64>()
                .map(Some)
                .map_err(|e| format!("invalid mesh extent '{}': {}", raw, e))
        };

        Ok(MeshSize {
            lx: parse_side(lx_raw)?,
            ly: parse_side(ly_raw)?,
        })
    }
}
