#![allow(dead_code)]

use tile_bench::comm::{Communicator, RunSpan};

/// Scripted root-rank communicator: pretends to be rank 0 of a larger
/// run, with the other ranks' spans preset. The sum-reduction assumes
/// every rank contributes the same local value.
pub struct ScriptedComm {
    pub size: u32,
    pub remote_spans: Vec<RunSpan>,
}

impl ScriptedComm {
    pub fn new(size: u32, remote_spans: Vec<RunSpan>) -> ScriptedComm {
        assert_eq!(remote_spans.len() as u32, size - 1);
        ScriptedComm { size, remote_spans }
    }
}

impl Communicator for ScriptedComm {
    fn rank(&self) -> u32 {
        0
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn gather_spans(&self, span: RunSpan) -> Option<Vec<RunSpan>> {
        let mut spans = vec![span];
        spans.extend(self.remote_spans.iter().copied());
        Some(spans)
    }

    fn allreduce_sum(&self, value: u64) -> u64 {
        value * self.size as u64
    }

    fn barrier(&self) {}
}
