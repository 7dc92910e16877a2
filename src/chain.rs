//! Synthetic 25-loop computational chain.
//!
//! Stands in for the solver so the harness can be driven end to end
//! without the numerical stack: each chain loop is a weighted 3-point
//! stencil sweep over a seeded field, executed tile by tile according to
//! the resolved fusion groups. Timings are split the same way the real
//! runtime splits them: kernel compute versus boundary (halo) updates.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::schemes::{LoopGroup, CHAIN_LENGTH};

/// Elements a tile-size unit corresponds to in the synthetic field.
const TILE_QUANTUM: usize = 256;

/// Accumulated timings for a chain run, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChainTimings {
    pub compute_secs: f64,
    pub exchange_secs: f64,
}

/// Seeded stencil workload over a 1-D field.
pub struct ChainWorkload {
    field: Vec<f64>,
    scratch: Vec<f64>,
}

impl ChainWorkload {
    /// Build a workload of `elements` points from a fixed seed, so
    /// repeated runs sweep identical data.
    pub fn new(seed: u64, elements: usize) -> ChainWorkload {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = elements.max(4);
        let field: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let scratch = vec![0.0; n];
        ChainWorkload { field, scratch }
    }

    pub fn elements(&self) -> usize {
        self.field.len()
    }

    /// Run `timesteps` iterations of the chain under the given fused
    /// groups. An empty group list means untiled execution: every loop
    /// sweeps the full field in one piece.
    ///
    /// `progress_cb` is invoked once per completed timestep.
    pub fn run(
        &mut self,
        groups: &[LoopGroup],
        timesteps: u32,
        progress_cb: Option<&dyn Fn(u32)>,
    ) -> ChainTimings {
        let mut timings = ChainTimings::default();
        for step in 0..timesteps {
            if groups.is_empty() {
                let full = LoopGroup {
                    first: 1,
                    last: CHAIN_LENGTH,
                    tile_size: 0,
                };
                self.run_group(&full, &mut timings);
            } else {
                for group in groups {
                    self.run_group(group, &mut timings);
                }
            }
            if let Some(cb) = progress_cb {
                cb(step + 1);
            }
        }
        timings
    }

    /// Sweep the loops of one fused group, tile by tile.
    fn run_group(&mut self, group: &LoopGroup, timings: &mut ChainTimings) {
        let n = self.field.len();
        let tile_elems = if group.tile_size == 0 {
            n
        } else {
            (group.tile_size as usize * TILE_QUANTUM).min(n)
        };

        for loop_index in group.first..=group.last {
            // Each chain loop gets a slightly different stencil weight so
            // the sweeps are not trivially foldable.
            let w = 0.25 + (loop_index as f64 / CHAIN_LENGTH as f64) * 0.25;

            let started = Instant::now();
            let mut lo = 0;
            while lo < n {
                let hi = (lo + tile_elems).min(n);
                for i in lo..hi {
                    let left = self.field[if i == 0 { n - 1 } else { i - 1 }];
                    let right = self.field[if i + 1 == n { 0 } else { i + 1 }];
                    self.scratch[i] = w * left + (1.0 - 2.0 * w) * self.field[i] + w * right;
                }
                lo = hi;
            }
            timings.compute_secs += started.elapsed().as_secs_f64();

            // Periodic boundary update plays the halo-exchange role.
            let started = Instant::now();
            std::mem::swap(&mut self.field, &mut self.scratch);
            let first = self.field[0];
            let last = self.field[n - 1];
            self.field[0] = 0.5 * (first + last);
            self.field[n - 1] = self.field[0];
            timings.exchange_secs += started.elapsed().as_secs_f64();
        }
    }

    /// Checksum of the field, for `--check` runs.
    pub fn checksum(&self) -> f64 {
        self.field.iter().sum()
    }
}
