//! Fusion-scheme table and resolver.
//!
//! A fusion scheme groups consecutive loops of the fixed 25-loop
//! computational chain into fused, tiled units. Each scheme entry carries
//! the number of solves performed per unrolled chain iteration and an
//! ordered list of `(first_loop, last_loop, tile_size_multiplier)` groups.
//! The table is static and never mutated; resolving a scheme builds a
//! fresh group vector with effective tile sizes baked in.

use serde::Serialize;

use crate::cli::PartMode;
use crate::error::HarnessError;

/// Number of loops in the computational chain every scheme partitions.
pub const CHAIN_LENGTH: u32 = 25;

/// One fused group of consecutive chain loops, with its effective tile
/// size (the base tile size scaled by the scheme's multiplier under
/// chunk partitioning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoopGroup {
    /// 1-based index of the first loop in the group.
    pub first: u32,
    /// 1-based index of the last loop in the group (inclusive).
    pub last: u32,
    /// Effective tile size for the fused group.
    pub tile_size: u32,
}

impl LoopGroup {
    /// Number of chain loops covered by this group.
    pub fn len(&self) -> u32 {
        self.last - self.first + 1
    }

    /// True when the group covers no loops. Cannot happen for groups
    /// produced by [`resolve`]; provided for completeness.
    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

/// A fusion scheme with effective tile sizes resolved for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedScheme {
    /// Scheme id the resolution came from.
    pub mode: u32,
    /// Solves performed per unrolled chain iteration.
    pub num_solves: u32,
    /// Fused groups in chain order.
    pub groups: Vec<LoopGroup>,
}

/// Static table entry: solves per iteration plus
/// `(first, last, multiplier)` groups.
struct SchemeEntry {
    num_solves: u32,
    groups: &'static [(u32, u32, u32)],
}

/// The five supported schemes. Ids 2 and 3 tile short runs of loops with
/// large multipliers; 4-6 fuse progressively longer spans around solves.
fn scheme_entry(mode: u32) -> Option<SchemeEntry> {
    match mode {
        2 => Some(SchemeEntry {
            num_solves: 1,
            groups: &[
                (1, 4, 4),
                (5, 8, 4),
                (9, 12, 2),
                (13, 17, 4),
                (18, 21, 4),
                (22, 25, 1),
            ],
        }),
        3 => Some(SchemeEntry {
            num_solves: 1,
            groups: &[
                (1, 3, 4),
                (4, 7, 4),
                (8, 12, 2),
                (13, 16, 4),
                (17, 19, 4),
                (20, 25, 1),
            ],
        }),
        4 => Some(SchemeEntry {
            num_solves: 2,
            groups: &[(1, 7, 1), (8, 16, 1), (17, 25, 1)],
        }),
        5 => Some(SchemeEntry {
            num_solves: 4,
            groups: &[(1, 12, 1), (13, 25, 1)],
        }),
        6 => Some(SchemeEntry {
            num_solves: 8,
            groups: &[(1, 25, 1)],
        }),
        _ => None,
    }
}

/// Scheme ids present in the table, in ascending order.
pub fn supported_modes() -> &'static [u32] {
    &[2, 3, 4, 5, 6]
}

/// Resolve a fusion scheme id into its solve count and fused groups with
/// effective tile sizes.
///
/// Under [`PartMode::Chunk`] each group's tile size is
/// `tile_size * multiplier`; any other partitioning ignores the
/// multiplier and uses `tile_size` unchanged.
///
/// An id outside the table is a hard failure: there is no fallback
/// scheme.
pub fn resolve(
    mode: u32,
    part_mode: PartMode,
    tile_size: u32,
) -> Result<ResolvedScheme, HarnessError> {
    let entry = scheme_entry(mode).ok_or(HarnessError::UnknownScheme(mode))?;
    let groups = entry
        .groups
        .iter()
        .map(|&(first, last, multiplier)| LoopGroup {
            first,
            last,
            tile_size: match part_mode {
                PartMode::Chunk => tile_size * multiplier,
                _ => tile_size,
            },
        })
        .collect();
    Ok(ResolvedScheme {
        mode,
        num_solves: entry.num_solves,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_is_fatal() {
        for mode in [0, 1, 7, 42] {
            match resolve(mode, PartMode::Chunk, 5) {
                Err(HarnessError::UnknownScheme(m)) => assert_eq!(m, mode),
                other => panic!("expected UnknownScheme for {mode}, got {other:?}"),
            }
        }
    }

    #[test]
    fn chunk_partitioning_scales_by_multiplier() {
        let scheme = resolve(2, PartMode::Chunk, 10).unwrap();
        let tile_sizes: Vec<u32> = scheme.groups.iter().map(|g| g.tile_size).collect();
        assert_eq!(tile_sizes, vec![40, 40, 20, 40, 40, 10]);
    }

    #[test]
    fn other_partitioning_ignores_multiplier() {
        let scheme = resolve(2, PartMode::Metis, 10).unwrap();
        assert!(scheme.groups.iter().all(|g| g.tile_size == 10));
    }

    #[test]
    fn solve_counts_match_table() {
        let expected = [(2, 1), (3, 1), (4, 2), (5, 4), (6, 8)];
        for (mode, solves) in expected {
            let scheme = resolve(mode, PartMode::Chunk, 5).unwrap();
            assert_eq!(scheme.num_solves, solves, "mode {mode}");
        }
    }

    #[test]
    fn resolution_does_not_mutate_the_table() {
        let first = resolve(3, PartMode::Chunk, 7).unwrap();
        let _ = resolve(3, PartMode::Metis, 99).unwrap();
        let again = resolve(3, PartMode::Chunk, 7).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn group_order_is_preserved() {
        let scheme = resolve(3, PartMode::Chunk, 5).unwrap();
        let firsts: Vec<u32> = scheme.groups.iter().map(|g| g.first).collect();
        let mut sorted = firsts.clone();
        sorted.sort_unstable();
        assert_eq!(firsts, sorted);
    }
}
