// ============================================================
// Layer 3 — SequencePair Domain Type
// ============================================================
// One aligned training example after tokenisation:
//
//   source: c1 c2 c3 <pad> <pad>            (padded to source_len)
//   target: <sos> d1 d2 <eos> <pad> <pad>   (padded to target_len)
//
// All pairs of one split share the same two pad lengths, which is
// what lets the batcher stack them without any dynamic padding.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::vocabulary::SpecialTokens;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePair {
    pub source: Vec<u32>,
    pub target: Vec<u32>,
}

impl SequencePair {
    /// Build a padded pair from raw symbol IDs.
    ///
    /// `target_len` must leave room for the start and end tokens.
    pub fn from_ids(
        source_ids: &[u32],
        target_ids: &[u32],
        source_len: usize,
        target_len: usize,
        tokens:     SpecialTokens,
    ) -> Result<Self> {
        ensure!(
            source_ids.len() <= source_len,
            "source sequence of {} symbols exceeds pad length {}",
            source_ids.len(),
            source_len
        );
        ensure!(
            target_ids.len() + 2 <= target_len,
            "target sequence of {} symbols (+2 markers) exceeds pad length {}",
            target_ids.len(),
            target_len
        );

        let mut source = source_ids.to_vec();
        source.resize(source_len, tokens.pad);

        let mut target = Vec::with_capacity(target_len);
        target.push(tokens.start);
        target.extend_from_slice(target_ids);
        target.push(tokens.end);
        target.resize(target_len, tokens.pad);

        Ok(Self { source, target })
    }

    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    pub fn target_len(&self) -> usize {
        self.target.len()
    }
}
