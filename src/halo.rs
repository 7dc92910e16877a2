//! Halo (ghost-region) depth calculation for distributed tiled runs.

/// Minimum ghost-layer depth (sdepth) a distributed run needs so that
/// tiled, unrolled execution across process boundaries stays correct.
///
/// Single-process runs, and runs with chain unrolling disabled, only ever
/// read one layer past the owned region, so the depth is exactly 1.
/// With unrolling active across ranks, the depth grows with the number of
/// solves fused into one chain iteration: `ceil(num_solves / 2)`, floored
/// at 1, plus any extra layers requested to cover schemes whose true
/// dependency distance exceeds the estimate.
///
/// The floor to 1 is applied before `extra_halo` is added, so a
/// zero-solve chain with `extra_halo = e` yields `1 + e`.
pub fn compute_sdepth(num_procs: u32, num_solves: u32, num_unroll: u32, extra_halo: u32) -> u32 {
    if num_procs > 1 && num_unroll > 0 {
        num_solves.div_ceil(2).max(1) + extra_halo
    } else {
        1
    }
}
