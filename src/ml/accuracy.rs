// ============================================================
// Layer 5 — Exact-Match Accuracy
// ============================================================
// An example counts as correct only if EVERY position of the
// prediction equals the expected sequence, padding included:
//
//   expected  [5, 2, 0, 0]
//   predicted [5, 2, 0, 0]  → correct
//   predicted [5, 3, 0, 0]  → wrong
//
// Two ways of producing the prediction are supported:
//   greedy         — full autoregressive decode (what inference does)
//   teacher-forced — argmax of the training logits (cheap, optimistic)

use burn::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyMode {
    #[default]
    Greedy,
    TeacherForced,
}

/// Fraction of rows where `predicted` and `expected` agree everywhere.
///
/// Both tensors: [batch, len]
pub fn exact_match_accuracy<B: Backend>(expected: Tensor<B, 2, Int>, predicted: Tensor<B, 2, Int>) -> f64 {
    let [batch_size, _] = expected.dims();
    if batch_size == 0 {
        return 0.0;
    }
    // min over a row of 0/1 matches is 1 only if every position matched
    let correct: i64 = predicted
        .equal(expected)
        .int()
        .min_dim(1)
        .sum()
        .into_scalar()
        .elem();
    correct as f64 / batch_size as f64
}

/// Argmax over the vocabulary axis. logits: [batch, len, vocab] → [batch, len]
pub fn argmax_tokens<B: Backend>(logits: Tensor<B, 3>) -> Tensor<B, 2, Int> {
    let [batch_size, len, _] = logits.dims();
    logits.argmax(2).reshape([batch_size, len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn ids(values: Vec<i32>, rows: usize) -> Tensor<B, 2, Int> {
        let cols = values.len() / rows;
        Tensor::from_data(TensorData::new(values, [rows, cols]), &Default::default())
    }

    #[test]
    fn test_every_position_including_padding_must_match() {
        let expected  = ids(vec![5, 2, 0, 0, 5, 2, 0, 0], 2);
        let predicted = ids(vec![5, 2, 0, 0, 5, 3, 0, 0], 2);
        assert_eq!(exact_match_accuracy(expected, predicted), 0.5);
    }

    #[test]
    fn test_trailing_padding_mismatch_is_wrong() {
        let expected  = ids(vec![5, 2, 0, 0], 1);
        let predicted = ids(vec![5, 2, 0, 4], 1);
        assert_eq!(exact_match_accuracy(expected, predicted), 0.0);
    }

    #[test]
    fn test_argmax_tokens_picks_highest_logit() {
        let logits = Tensor::<B, 3>::from_data(
            TensorData::new(vec![0.1f32, 0.9, 0.0, 0.7, 0.2, 0.1], [1, 2, 3]),
            &Default::default(),
        );
        let tokens: Vec<i64> = argmax_tokens(logits).into_data().iter::<i64>().collect();
        assert_eq!(tokens, vec![1, 0]);
    }
}
