//! tile-bench binary: resolve the tiling configuration, drive the
//! synthetic chain workload, and record timings.

use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use tile_bench::chain::ChainWorkload;
use tile_bench::cli::HarnessArgs;
use tile_bench::comm::{Communicator, RunSpan, SingleProcess};
use tile_bench::halo::compute_sdepth;
use tile_bench::perflog::RecordedPerfLog;
use tile_bench::report::{self, summary, FunctionSpace, RunInfo, TilingPlan};
use tile_bench::runmode::RunEnv;
use tile_bench::schemes::{resolve, LoopGroup, ResolvedScheme, CHAIN_LENGTH};

fn main() {
    let args = HarnessArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let env = RunEnv::detect();
    let comm = SingleProcess;
    let program = program_name();

    // Resolve the fusion scheme up front: an unknown id is fatal before
    // any work is done.
    let scheme: Option<ResolvedScheme> = if args.num_unroll > 0 && args.explicit_mode > 0 {
        match resolve(args.explicit_mode, args.part_mode, args.tile_size) {
            Ok(s) => Some(s),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let num_solves = scheme.as_ref().map(|s| s.num_solves).unwrap_or(1);
    let sdepth = compute_sdepth(comm.size(), num_solves, args.num_unroll, args.extra_halo);
    let timesteps = args.timesteps();
    let elements = workload_elements(&args);

    println!("{}: loop-chain tiling harness", program);
    println!(
        "  Platform: {} ({} procs, {} threads)",
        env.platform,
        comm.size(),
        env.num_threads
    );
    println!(
        "  Tiling: unroll={}, scheme={}, tile size={}, partitioning={}, sdepth={}",
        args.num_unroll,
        scheme
            .as_ref()
            .map(|s| format!("fs{}", s.mode))
            .unwrap_or_else(|| "none".to_string()),
        args.tile_size,
        args.part_mode.label(),
        sdepth
    );
    println!("  Workload: {} elements, {} timesteps", elements, timesteps);
    println!();

    if args.verbose {
        if let Some(ref s) = scheme {
            summary::print_scheme(s);
        }
    }

    let out_dir = std::env::current_dir().unwrap_or_else(|_| ".".into());

    if args.log {
        let plan = TilingPlan {
            timestamp: chrono::Utc::now().to_rfc3339(),
            program: &program,
            num_procs: comm.size(),
            num_threads: env.num_threads,
            platform: &env.platform,
            num_unroll: args.num_unroll,
            fusion_mode: args.fusion_mode.label(),
            part_mode: args.part_mode.label(),
            coloring: args.coloring.label(),
            kernel_opt: args.kernel_opt.label(),
            tile_size: args.tile_size,
            extra_halo: args.extra_halo,
            sdepth,
            scheme: scheme.as_ref(),
        };
        match plan.write(&out_dir) {
            Ok(path) => info!("tiling plan written to {:?}", path),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    // The groups the chain actually runs with: explicit scheme if one
    // was resolved, a single whole-chain group when tiling is on without
    // one, nothing when unrolling is disabled.
    let groups: Vec<LoopGroup> = if args.num_unroll == 0 {
        Vec::new()
    } else if let Some(ref s) = scheme {
        s.groups.clone()
    } else {
        vec![LoopGroup {
            first: 1,
            last: CHAIN_LENGTH,
            tile_size: args.tile_size,
        }]
    };
    let nloops = if groups.is_empty() { 0 } else { CHAIN_LENGTH };

    let mut workload = ChainWorkload::new(42, elements);

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    let progress = |step: u32| {
        bar.set_message(format!("timestep {}/{}", step, timesteps));
    };
    let progress_cb: &dyn Fn(u32) = &progress;

    let start = report::now_seconds();
    let timings = workload.run(&groups, timesteps, Some(progress_cb));
    let end = report::now_seconds();
    bar.finish_and_clear();

    if args.check {
        let checksum = workload.checksum();
        if !checksum.is_finite() {
            eprintln!("Error: field checksum is not finite ({})", checksum);
            std::process::exit(2);
        }
        println!("Field checksum: {:.6}", checksum);
    }

    if args.runtime_log {
        info!(
            "runtime kernel timings: compute={:.3}s exchange={:.3}s",
            timings.compute_secs, timings.exchange_secs
        );
    }

    let perf = RecordedPerfLog::new(vec![timings.compute_secs], vec![timings.exchange_secs]);

    let dofs_per_space = (elements as u64) * (args.poly_order as u64 + 1);
    let info = RunInfo {
        program,
        domain: domain_name(&args),
        mesh_id: mesh_id(&args),
        poly_order: args.poly_order,
        num_timesteps: timesteps,
        nloops,
        tile_size: args.tile_size,
        explicit_mode: args.explicit_mode,
        partitioning: args.part_mode.label().to_string(),
        extra_halo: args.extra_halo,
        glb_maps: args.glb_maps,
        coloring: args.coloring.label().to_string(),
        prefetch: args.prefetch,
        verbose: args.verbose,
        tofile: args.tofile,
        function_spaces: vec![
            FunctionSpace {
                name: "velocity".to_string(),
                local_dofs: dofs_per_space,
            },
            FunctionSpace {
                name: "stress".to_string(),
                local_dofs: dofs_per_space * 2,
            },
        ],
        out_dir,
    };

    if let Err(e) = report::record_run(&comm, &perf, &env, RunSpan::new(start, end), &info) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Basename of the running executable, first path component of result
/// files.
fn program_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "tile-bench".to_string())
}

/// Domain name for result paths: the mesh file's stem when one was
/// given, the built-in rectangle otherwise.
fn domain_name(args: &HarnessArgs) -> String {
    args.mesh_file
        .as_deref()
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "rectangle".to_string())
}

/// Mesh identifier for result paths.
fn mesh_id(args: &HarnessArgs) -> String {
    match args.mesh_size {
        Some(ms) => {
            let lx = ms.lx.unwrap_or(300.0);
            let ly = ms.ly.unwrap_or(150.0);
            format!("{}x{}_s{}", lx, ly, args.mesh_spacing)
        }
        None => "default_mesh".to_string(),
    }
}

/// Synthetic field size: mesh extents over the spacing, scaled by the
/// spatial order, clamped to keep demo runs short.
fn workload_elements(args: &HarnessArgs) -> usize {
    let ms = args.mesh_size.unwrap_or_default();
    let lx = ms.lx.unwrap_or(300.0);
    let ly = ms.ly.unwrap_or(150.0);
    let spacing = args.mesh_spacing.max(1e-6);
    let cells = (lx / spacing).ceil().max(1.0) * (ly / spacing).ceil().max(1.0);
    let order = (args.poly_order + 1) as f64;
    ((cells * order * order) as usize).clamp(1 << 10, 1 << 20)
}
