// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From two aligned text files to tensor batches:
//
//   train.x / train.y
//       │
//       ▼
//   ParallelTextFiles    → reads and aligns lines
//       │
//       ▼
//   ParallelTextDataset  → one symbol per char, <sos>/<eos>, padding
//       │
//       ▼
//   Seq2SeqBatcher       → stacks pairs into [batch, len] Int tensors
//       │
//       ▼
//   DataLoader           → shuffles (training only) and prefetches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the two line-aligned files of a split
pub mod loader;

/// Implements Burn's Dataset trait over tokenised pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
