// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here:
//
//   positional.rs — fixed sinusoidal position table
//   masking.rs    — padding masks and the causal decoder mask
//   model.rs      — embeddings → encoder → decoder → vocab logits
//   decoder.rs    — per-example greedy autoregressive decoding
//   accuracy.rs   — exact-match accuracy
//   grad_clip.rs  — global gradient norm clipping
//   trainer.rs    — accumulate-then-step training loop with
//                   periodic validation and early stop
//   inferencer.rs — text-to-text translation with a trained model
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod positional;

pub mod masking;

/// Encoder-decoder transformer
pub mod model;

/// Greedy decoding state machine and batch driver
pub mod decoder;

pub mod accuracy;

pub mod grad_clip;

/// Training loop with gradient accumulation and validation
pub mod trainer;

/// Translate text with a trained model
pub mod inferencer;
