// ============================================================
// Layer 5 — Attention Masks
// ============================================================
// Burn's transformer layers take two kinds of Bool masks, where
// `true` always means "do NOT attend here":
//
//   padding mask  [batch, seq]       true on <pad> positions
//   causal mask   [batch, seq, seq]  true where key j > query i
//
// Masks are never stored; they are derived from the IDs every
// time a forward pass needs them.

use burn::prelude::*;

/// true wherever `ids == pad_id`. ids: [batch, seq] → [batch, seq]
pub fn padding_mask<B: Backend>(ids: &Tensor<B, 2, Int>, pad_id: u32) -> Tensor<B, 2, Bool> {
    ids.clone().equal_elem(pad_id as i32)
}

/// Row-major `len × len` pattern, true where attention is blocked.
///
/// Query position i may see key position j only if j ≤ i.
pub fn causal_pattern(len: usize) -> Vec<bool> {
    (0..len)
        .flat_map(|i| (0..len).map(move |j| j > i))
        .collect()
}

/// Causal mask repeated for every example: [batch, len, len].
pub fn causal_mask<B: Backend>(batch_size: usize, len: usize, device: &B::Device) -> Tensor<B, 3, Bool> {
    let pattern: Vec<i32> = causal_pattern(len).into_iter().map(i32::from).collect();
    let blocked = pattern.repeat(batch_size);
    Tensor::<B, 3, Int>::from_data(TensorData::new(blocked, [batch_size, len, len]), device)
        .equal_elem(1)
}
