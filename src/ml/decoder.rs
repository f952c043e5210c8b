// ============================================================
// Layer 5 — Greedy Decoder
// ============================================================
// Autoregressive decoding, one example at a time:
//
//   tokens = [<sos>]
//   loop:
//     logits = decoder(tokens, memory of this example)
//     next   = argmax(logits at the last position)
//     tokens.push(next)
//     stop when next == <eos> or tokens.len() == max_len
//   pad tokens with <pad> up to max_len
//
// Each example stops at its own length, so examples are not
// batched across decode steps. The encoder still runs once for
// the whole batch; only the decoder loop is per example.

use burn::prelude::*;

use crate::domain::vocabulary::SpecialTokens;
use crate::ml::model::{EncoderMemory, Seq2SeqTransformer};

// ─── DecodeState ──────────────────────────────────────────────────────────────
/// The per-example state machine, independent of any tensor code.
#[derive(Debug, Clone)]
pub struct DecodeState {
    tokens:   Vec<u32>,
    max_len:  usize,
    end:      u32,
    pad:      u32,
    finished: bool,
}

impl DecodeState {
    /// Start a sequence holding only `<sos>`. `max_len` counts it.
    pub fn new(tokens: SpecialTokens, max_len: usize) -> Self {
        Self {
            tokens:   vec![tokens.start],
            max_len,
            end:      tokens.end,
            pad:      tokens.pad,
            finished: false,
        }
    }

    pub fn tokens(&self) -> &[u32] {
        &self.tokens
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Append the chosen token and update the terminal condition.
    ///
    /// The first push is always accepted, even when `max_len` is 1.
    pub fn push(&mut self, id: u32) {
        if self.finished {
            return;
        }
        self.tokens.push(id);
        self.finished = id == self.end || self.tokens.len() >= self.max_len;
    }

    /// The sequence fitted to exactly `max_len` positions, `<sos>`
    /// included, right-padded with `<pad>`.
    pub fn into_padded(self) -> Vec<u32> {
        let mut tokens = self.tokens;
        tokens.resize(self.max_len, self.pad);
        tokens
    }
}

// ─── GreedyDecoder ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy)]
pub struct GreedyDecoder {
    tokens: SpecialTokens,
}

impl GreedyDecoder {
    pub fn new(tokens: SpecialTokens) -> Self {
        Self { tokens }
    }

    /// Decode one example against its own slice of the encoder output.
    ///
    /// `memory` must hold a batch of one. The result has exactly
    /// `max_len` IDs and starts with `<sos>`.
    pub fn decode_example<B: Backend>(
        &self,
        model:   &Seq2SeqTransformer<B>,
        memory:  &EncoderMemory<B>,
        max_len: usize,
    ) -> Vec<u32> {
        let device = memory.memory.device();
        let mut state = DecodeState::new(self.tokens, max_len);

        while !state.is_finished() {
            let ys: Vec<i32> = state.tokens().iter().map(|&t| t as i32).collect();
            let len = ys.len();
            let ys = Tensor::<B, 2, Int>::from_data(TensorData::new(ys, [1, len]), &device);

            let logits = model.next_token_logits(ys, memory);
            let next: i64 = logits.argmax(1).into_scalar().elem();
            state.push(next as u32);
        }

        state.into_padded()
    }

    /// Decode a whole batch.
    ///
    /// source: [batch, src_len]. `target_input_len` is the length of the
    /// teacher-forcing input; every example is decoded up to
    /// `target_input_len + 1` positions and the leading `<sos>` is
    /// stripped, giving `[batch, target_input_len]`, aligned with the
    /// expected output.
    pub fn decode_batch<B: Backend>(
        &self,
        model:            &Seq2SeqTransformer<B>,
        source:           Tensor<B, 2, Int>,
        target_input_len: usize,
    ) -> Tensor<B, 2, Int> {
        let device  = source.device();
        let memory  = model.encode(source);
        let batch   = memory.batch_size();
        let max_len = target_input_len + 1;

        let mut results: Vec<i32> = Vec::with_capacity(batch * target_input_len);
        for i in 0..batch {
            let decoded = self.decode_example(model, &memory.example(i), max_len);
            results.extend(decoded[1..].iter().map(|&t| t as i32));
        }

        Tensor::<B, 2, Int>::from_data(TensorData::new(results, [batch, target_input_len]), &device)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::tests::tiny_config;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_state_pads_after_end_token() {
        let mut state = DecodeState::new(SpecialTokens::default(), 6);
        state.push(5);
        assert!(!state.is_finished());
        state.push(2);
        assert!(state.is_finished());
        // further pushes are ignored once finished
        state.push(7);
        assert_eq!(state.into_padded(), vec![3, 5, 2, 0, 0, 0]);
    }

    #[test]
    fn test_state_stops_at_max_len() {
        let mut state = DecodeState::new(SpecialTokens::default(), 3);
        state.push(5);
        state.push(6);
        assert!(state.is_finished());
        assert_eq!(state.into_padded(), vec![3, 5, 6]);
    }

    #[test]
    fn test_state_with_max_len_one_still_takes_a_step() {
        let mut state = DecodeState::new(SpecialTokens::default(), 1);
        assert!(!state.is_finished());
        state.push(5);
        assert!(state.is_finished());
        assert_eq!(state.tokens(), &[3, 5]);
        assert_eq!(state.into_padded(), vec![3]);
    }

    #[test]
    fn test_decode_batch_has_requested_shape_and_pads_after_end() {
        let device = Default::default();
        let model = tiny_config(8, 8).init::<B>(&device);
        let decoder = GreedyDecoder::new(SpecialTokens::default());
        let source = Tensor::<B, 2, Int>::from_data(
            TensorData::new(vec![4i32, 5, 6, 7, 0, 0, 5, 5, 5], [3, 3]),
            &device,
        );

        let predicted = decoder.decode_batch(&model, source, 5);
        assert_eq!(predicted.dims(), [3, 5]);

        let rows: Vec<i64> = predicted.into_data().iter::<i64>().collect();
        for row in rows.chunks(5) {
            if let Some(end) = row.iter().position(|&t| t == 2) {
                assert!(row[end + 1..].iter().all(|&t| t == 0), "row {row:?}");
            }
        }
    }
}
