//! Screen output: run totals, averages, the resolved-scheme table and
//! the per-rank breakdown printed under --verbose.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::comm::RunSpan;
use crate::perflog::PerfSeries;
use crate::schemes::ResolvedScheme;

/// Total wall-clock span of the run, root's headline number.
pub fn print_timestepping(total: f64) {
    println!("Time stepping: {} s", total);
}

/// Average compute and compute+communication times across ranks.
pub fn print_averages(act: f64, acct: f64) {
    println!("Average Compute Time: {} s", act);
    println!("Average Compute and Communication Time: {} s", acct);
}

/// Render the resolved fusion scheme as a table of fused groups.
pub fn print_scheme(scheme: &ResolvedScheme) {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["group", "first loop", "last loop", "tile size"]);
    for (index, group) in scheme.groups.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1).set_alignment(CellAlignment::Right),
            Cell::new(group.first).set_alignment(CellAlignment::Right),
            Cell::new(group.last).set_alignment(CellAlignment::Right),
            Cell::new(group.tile_size).set_alignment(CellAlignment::Right),
        ]);
    }
    println!(
        "\nFusion scheme fs{} ({} solves per chain iteration):",
        scheme.mode, scheme.num_solves
    );
    println!("{table}");
}

/// Per-rank breakdown: kernel seconds, exchange seconds, their share of
/// the rank's wall-clock span, and the DoF layout.
pub fn print_rank_breakdown(spans: &[RunSpan], series: &PerfSeries, spaces: &[(String, u64)]) {
    let fs_info = spaces
        .iter()
        .map(|(name, dofs)| format!("{}={}", name, dofs))
        .collect::<Vec<_>>()
        .join(", ");

    for (rank, span) in spans.iter().enumerate() {
        let compute = series.compute.get(rank).copied().unwrap_or(0.0);
        let exchange = series.exchange.get(rank).copied().unwrap_or(0.0);
        let kernel_total = compute + exchange;
        let wall = span.elapsed();
        let off_kernel = wall - kernel_total;
        let (off_pct, comm_pct) = if wall > 0.0 {
            (off_kernel / wall * 100.0, exchange / wall * 100.0)
        } else {
            (0.0, 0.0)
        };
        println!(
            "Rank {}: comp={:.2}s, comm={:.2}s -- tot={:.2}s (host={:.2}s, {:.2}%; comm_oh={:.2}%; fs=[{}])",
            rank, compute, exchange, kernel_total, off_kernel, off_pct, comm_pct, fs_info
        );
    }
}
