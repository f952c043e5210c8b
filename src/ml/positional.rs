// ============================================================
// Layer 5 — Sinusoidal Positional Encoding
// ============================================================
// Attention has no notion of order, so each embedded position
// gets a fixed, parameter-free signal added to it:
//
//   table[pos, 2k]   = sin(pos / 10000^(2k / d_model))
//   table[pos, 2k+1] = cos(pos / 10000^(2k / d_model))
//
// The table is computed once for `max_len` positions and stored
// as a constant tensor (never touched by the optimiser).
//
// Reference: Vaswani et al. (2017) §3.5

use burn::{
    nn::{Dropout, DropoutConfig},
    prelude::*,
};

const MAX_TIMESCALE: f64 = 10_000.0;

#[derive(Config, Debug)]
pub struct PositionalEncodingConfig {
    pub d_model: usize,
    #[config(default = 5000)]
    pub max_len: usize,
    /// 0.0 turns the dropout into a pass-through
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl PositionalEncodingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositionalEncoding<B> {
        let values = sinusoid_table(self.max_len, self.d_model);
        let table  = Tensor::<B, 2>::from_data(
            TensorData::new(values, [self.max_len, self.d_model]),
            device,
        );
        PositionalEncoding {
            table,
            dropout: DropoutConfig::new(self.dropout).init(),
            max_len: self.max_len,
        }
    }
}

#[derive(Module, Debug)]
pub struct PositionalEncoding<B: Backend> {
    table:   Tensor<B, 2>,
    dropout: Dropout,
    max_len: usize,
}

impl<B: Backend> PositionalEncoding<B> {
    /// x: [batch, seq_len, d_model] → same shape
    ///
    /// Panics if `seq_len >= max_len`: the table has to be rebuilt
    /// with a larger capacity, truncating silently would be wrong.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [_, seq_len, d_model] = x.dims();
        assert!(
            seq_len < self.max_len,
            "Too long sequence length {seq_len}: increase max_len ({}) of the positional encoding",
            self.max_len,
        );
        let pe = self.table.clone().slice([0..seq_len, 0..d_model]).unsqueeze::<3>();
        self.dropout.forward(x + pe)
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

/// Row-major `[max_len, d_model]` sinusoid values.
pub fn sinusoid_table(max_len: usize, d_model: usize) -> Vec<f32> {
    let mut values = vec![0.0f32; max_len * d_model];
    for pos in 0..max_len {
        let row = &mut values[pos * d_model..(pos + 1) * d_model];
        for i in (0..d_model).step_by(2) {
            let angle = pos as f64 / MAX_TIMESCALE.powf(i as f64 / d_model as f64);
            row[i] = angle.sin() as f32;
            if i + 1 < d_model {
                row[i + 1] = angle.cos() as f32;
            }
        }
    }
    values
}
