// ============================================================
// Layer 4 — Seq2Seq Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<SequencePair>
// into two Int tensors:
//
//   source: [batch_size, source_len]
//   target: [batch_size, target_len]   (<sos> ... <eos> <pad>...)
//
// Every pair of a split is already padded to the same lengths,
// so stacking is a flatten + reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::domain::sequence_pair::SequencePair;

#[derive(Debug, Clone)]
pub struct Seq2SeqBatch<B: Backend> {
    /// Source IDs — shape: [batch_size, source_len]
    pub source: Tensor<B, 2, Int>,

    /// Full target IDs — shape: [batch_size, target_len]
    pub target: Tensor<B, 2, Int>,
}

impl<B: Backend> Seq2SeqBatch<B> {
    /// Teacher-forcing pair: the decoder reads `target[:, :-1]` and
    /// is scored against `target[:, 1:]`, one position ahead.
    pub fn teacher_forcing_split(&self) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>) {
        let [batch_size, target_len] = self.target.dims();
        let input    = self.target.clone().slice([0..batch_size, 0..target_len - 1]);
        let expected = self.target.clone().slice([0..batch_size, 1..target_len]);
        (input, expected)
    }

    pub fn batch_size(&self) -> usize {
        self.source.dims()[0]
    }
}

impl<B: AutodiffBackend> Seq2SeqBatch<B> {
    /// Same batch on the inner backend, detached from autodiff.
    pub fn inner(&self) -> Seq2SeqBatch<B::InnerBackend> {
        Seq2SeqBatch {
            source: self.source.clone().inner(),
            target: self.target.clone().inner(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Seq2SeqBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> Seq2SeqBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SequencePair, Seq2SeqBatch<B>> for Seq2SeqBatcher<B> {
    fn batch(&self, items: Vec<SequencePair>) -> Seq2SeqBatch<B> {
        let batch_size = items.len();
        let source_len = items[0].source.len();
        let target_len = items[0].target.len();

        // Burn Int tensors are built from i32 here, like every other
        // ID tensor in the crate
        let source_flat: Vec<i32> = items
            .iter()
            .flat_map(|p| p.source.iter().map(|&x| x as i32))
            .collect();
        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|p| p.target.iter().map(|&x| x as i32))
            .collect();

        let source = Tensor::<B, 2, Int>::from_data(
            TensorData::new(source_flat, [batch_size, source_len]),
            &self.device,
        );
        let target = Tensor::<B, 2, Int>::from_data(
            TensorData::new(target_flat, [batch_size, target_len]),
            &self.device,
        );

        Seq2SeqBatch { source, target }
    }
}
