use anyhow::Result;
use burn::data::dataset::Dataset;

use crate::domain::{
    sequence_pair::SequencePair,
    traits::ParallelCorpusSource,
    vocabulary::Vocabulary,
};

/// A tokenised, padded split ready for the DataLoader.
///
/// Source pairs are padded to the longest source line, targets to
/// the longest target line plus the two start/end markers. The two
/// lengths are computed per split.
#[derive(Debug, Clone)]
pub struct ParallelTextDataset {
    pairs:      Vec<SequencePair>,
    source_len: usize,
    target_len: usize,
}

impl ParallelTextDataset {
    /// Tokenise every pair of `corpus`.
    ///
    /// With `extend = true` new symbols are added to the vocabularies
    /// in line-then-character order (training split). With
    /// `extend = false` they map to `<unk>` (validation split, which
    /// must reuse the training vocabularies).
    pub fn build(
        corpus:       &dyn ParallelCorpusSource,
        source_vocab: &mut Vocabulary,
        target_vocab: &mut Vocabulary,
        extend:       bool,
    ) -> Result<Self> {
        let lines = corpus.read_pairs()?;

        let source_len = lines.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0);
        let target_len = lines.iter().map(|(_, t)| t.chars().count()).max().unwrap_or(0) + 2;

        let src_tokens = source_vocab.specials();
        let tgt_tokens = target_vocab.specials();
        let mut unknown = 0usize;
        let mut pairs   = Vec::with_capacity(lines.len());

        for (source, target) in &lines {
            let source_ids = source_vocab.encode(source, extend);
            let target_ids = target_vocab.encode(target, extend);
            unknown += source_ids.iter().filter(|&&id| id == src_tokens.unknown).count();
            unknown += target_ids.iter().filter(|&&id| id == tgt_tokens.unknown).count();
            pairs.push(SequencePair::from_ids(
                &source_ids, &target_ids, source_len, target_len, tgt_tokens,
            )?);
        }

        if unknown > 0 {
            tracing::warn!("{}: {} symbols not in vocabulary, mapped to <unk>", corpus.describe(), unknown);
        }
        tracing::info!(
            "Loaded {} pairs from {} (source_len={}, target_len={})",
            pairs.len(), corpus.describe(), source_len, target_len,
        );

        Ok(Self { pairs, source_len, target_len })
    }

    pub fn source_len(&self) -> usize { self.source_len }

    pub fn target_len(&self) -> usize { self.target_len }

    pub fn pairs(&self) -> &[SequencePair] { &self.pairs }
}

impl Dataset<SequencePair> for ParallelTextDataset {
    fn get(&self, index: usize) -> Option<SequencePair> {
        self.pairs.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(s, t)| (s.to_string(), t.to_string())).collect()
    }

    #[test]
    fn test_each_side_gets_its_own_pad_length() {
        let mut src = Vocabulary::new();
        let mut tgt = Vocabulary::new();
        let data = corpus(&[("abc", "x"), ("a", "xyzw")]);
        let ds = ParallelTextDataset::build(&data, &mut src, &mut tgt, true).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.source_len(), 3);
        assert_eq!(ds.target_len(), 6);
        for pair in ds.pairs() {
            assert_eq!(pair.source_len(), 3);
            assert_eq!(pair.target_len(), 6);
        }
        assert_eq!(ds.get(1).unwrap().source, vec![4, 0, 0]);
    }

    #[test]
    fn test_validation_split_reuses_training_ids() {
        let mut src = Vocabulary::new();
        let mut tgt = Vocabulary::new();
        let train = corpus(&[("ab", "ba")]);
        ParallelTextDataset::build(&train, &mut src, &mut tgt, true).unwrap();

        let valid = corpus(&[("abq", "b")]);
        let ds = ParallelTextDataset::build(&valid, &mut src, &mut tgt, false).unwrap();

        assert_eq!(src.len(), 6);
        assert_eq!(ds.get(0).unwrap().source, vec![4, 5, 1]);
        // tgt vocab: b=4, a=5
        assert_eq!(ds.get(0).unwrap().target, vec![3, 4, 2]);
    }
}
