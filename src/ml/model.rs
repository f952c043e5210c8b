use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        LayerNorm, LayerNormConfig,
        transformer::{
            TransformerDecoder, TransformerDecoderConfig, TransformerDecoderInput,
            TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput,
        },
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::ml::{
    masking::{causal_mask, padding_mask},
    positional::{PositionalEncoding, PositionalEncodingConfig},
};

#[derive(Config, Debug)]
pub struct Seq2SeqTransformerConfig {
    pub source_vocab_size: usize,
    pub target_vocab_size: usize,
    #[config(default = 256)]
    pub d_model: usize,
    #[config(default = 0)]
    pub pad_id: usize,
    #[config(default = 3)]
    pub encoder_layers: usize,
    #[config(default = 2)]
    pub decoder_layers: usize,
    #[config(default = 1024)]
    pub d_ff: usize,
    #[config(default = 8)]
    pub num_heads: usize,
    /// Dropout inside every encoder/decoder layer
    #[config(default = 0.1)]
    pub dropout: f64,
    /// Dropout applied after adding the positional signal
    #[config(default = 0.0)]
    pub positional_dropout: f64,
    /// Capacity of the positional table; sequences must be shorter
    #[config(default = 5000)]
    pub max_positions: usize,
}

impl Seq2SeqTransformerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqTransformer<B> {
        let embedding_src = EmbeddingConfig::new(self.source_vocab_size, self.d_model).init(device);
        let embedding_tgt = EmbeddingConfig::new(self.target_vocab_size, self.d_model).init(device);
        let pos_encoder   = PositionalEncodingConfig::new(self.d_model)
            .with_max_len(self.max_positions)
            .with_dropout(self.positional_dropout)
            .init(device);
        let encoder = TransformerEncoderConfig::new(self.d_model, self.d_ff, self.num_heads, self.encoder_layers)
            .with_dropout(self.dropout)
            .init(device);
        let decoder = TransformerDecoderConfig::new(self.d_model, self.d_ff, self.num_heads, self.decoder_layers)
            .with_dropout(self.dropout)
            .init(device);
        let generator = LinearConfig::new(self.d_model, self.target_vocab_size).init(device);

        Seq2SeqTransformer {
            embedding_src, embedding_tgt, pos_encoder,
            encoder,
            encoder_norm: LayerNormConfig::new(self.d_model).init(device),
            decoder,
            decoder_norm: LayerNormConfig::new(self.d_model).init(device),
            generator,
            pad_id: self.pad_id,
        }
    }
}

/// Character-level encoder-decoder transformer.
///
/// All tensors are batch-major: IDs are `[batch, seq]`, hidden
/// states `[batch, seq, d_model]`, logits `[batch, seq, vocab]`.
///
/// Each stack ends in its own LayerNorm, so the memory and the
/// generator input are normalised per position.
#[derive(Module, Debug)]
pub struct Seq2SeqTransformer<B: Backend> {
    pub embedding_src: Embedding<B>,
    pub embedding_tgt: Embedding<B>,
    pub pos_encoder:   PositionalEncoding<B>,
    pub encoder:       TransformerEncoder<B>,
    pub encoder_norm:  LayerNorm<B>,
    pub decoder:       TransformerDecoder<B>,
    pub decoder_norm:  LayerNorm<B>,
    pub generator:     Linear<B>,
    pub pad_id:        usize,
}

/// Encoder output for a batch plus the padding mask it was built
/// with, which the decoder reuses as its memory mask.
#[derive(Debug, Clone)]
pub struct EncoderMemory<B: Backend> {
    pub memory:   Tensor<B, 3>,
    pub mask_pad: Tensor<B, 2, Bool>,
}

impl<B: Backend> EncoderMemory<B> {
    /// The memory of a single example as a batch of one.
    pub fn example(&self, index: usize) -> EncoderMemory<B> {
        let [_, seq_len, d_model] = self.memory.dims();
        EncoderMemory {
            memory:   self.memory.clone().slice([index..index + 1, 0..seq_len, 0..d_model]),
            mask_pad: self.mask_pad.clone().slice([index..index + 1, 0..seq_len]),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.memory.dims()[0]
    }
}

impl<B: Backend> Seq2SeqTransformer<B> {
    fn pad(&self) -> u32 {
        self.pad_id as u32
    }

    /// Look up embeddings with `<pad>` positions forced to zero.
    ///
    /// The pad row never reaches the output, so it also never
    /// receives a gradient and keeps its initial values.
    fn embed(embedding: &Embedding<B>, ids: Tensor<B, 2, Int>, mask_pad: &Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let x = embedding.forward(ids);
        let d_model = x.dims()[2];
        let mask = mask_pad.clone().unsqueeze_dim::<3>(2).repeat_dim(2, d_model);
        x.mask_fill(mask, 0.0)
    }

    /// source: [batch, src_len] → memory [batch, src_len, d_model]
    pub fn encode(&self, source: Tensor<B, 2, Int>) -> EncoderMemory<B> {
        let mask_pad = padding_mask(&source, self.pad());
        let x = self.pos_encoder.forward(Self::embed(&self.embedding_src, source, &mask_pad));
        let x = self.encoder.forward(TransformerEncoderInput::new(x).mask_pad(mask_pad.clone()));
        let memory = self.encoder_norm.forward(x);
        EncoderMemory { memory, mask_pad }
    }

    /// Run the decoder stack over `target_input` against `memory`.
    ///
    /// target_input: [batch, tgt_len] → logits [batch, tgt_len, target_vocab]
    pub fn decode(&self, target_input: Tensor<B, 2, Int>, memory: &EncoderMemory<B>) -> Tensor<B, 3> {
        let [batch_size, tgt_len] = target_input.dims();
        let device = target_input.device();

        let target_mask_pad  = padding_mask(&target_input, self.pad());
        let target_mask_attn = causal_mask::<B>(batch_size, tgt_len, &device);

        let y = self.pos_encoder.forward(Self::embed(&self.embedding_tgt, target_input, &target_mask_pad));
        let input = TransformerDecoderInput::new(y, memory.memory.clone())
            .target_mask_pad(target_mask_pad)
            .target_mask_attn(target_mask_attn)
            .memory_mask_pad(memory.mask_pad.clone());

        let y = self.decoder_norm.forward(self.decoder.forward(input));
        self.generator.forward(y)
    }

    /// Teacher-forced forward pass used for training and validation loss.
    pub fn forward(&self, source: Tensor<B, 2, Int>, target_input: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let memory = self.encode(source);
        self.decode(target_input, &memory)
    }

    /// Logits for the position after the last token of `tokens`.
    ///
    /// tokens: [1, len] → [1, target_vocab]
    pub fn next_token_logits(&self, tokens: Tensor<B, 2, Int>, memory: &EncoderMemory<B>) -> Tensor<B, 2> {
        let logits = self.decode(tokens, memory);
        let [batch_size, len, vocab] = logits.dims();
        logits
            .slice([0..batch_size, len - 1..len, 0..vocab])
            .reshape([batch_size, vocab])
    }

    /// Cross-entropy averaged over every target position, or over the
    /// non-pad positions only when `ignore_pad` is set.
    ///
    /// Returns the scalar loss and the `[batch, tgt_len, vocab]` logits.
    pub fn forward_loss(
        &self,
        source:          Tensor<B, 2, Int>,
        target_input:    Tensor<B, 2, Int>,
        target_expected: Tensor<B, 2, Int>,
        ignore_pad:      bool,
    ) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let logits = self.forward(source, target_input);
        let [batch_size, tgt_len, vocab] = logits.dims();

        let logits_flat = logits.clone().reshape([batch_size * tgt_len, vocab]);
        let targets     = target_expected.reshape([batch_size * tgt_len]);

        let loss = if ignore_pad {
            masked_cross_entropy(logits_flat, targets, self.pad_id)
        } else {
            CrossEntropyLossConfig::new()
                .init(&logits.device())
                .forward(logits_flat, targets)
        };
        (loss, logits)
    }
}

/// Mean negative log-likelihood over the positions whose target is
/// not `pad_id`. A batch made only of padding gives a loss of zero.
fn masked_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    pad_id:  usize,
) -> Tensor<B, 1> {
    let [n, _] = logits.dims();
    let picked = log_softmax(logits, 1)
        .gather(1, targets.clone().reshape([n, 1]))
        .reshape([n]);
    let keep = targets.not_equal_elem(pad_id as i64).float();
    let count = keep.clone().sum().clamp_min(1.0);
    (picked * keep).sum().neg() / count
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use burn::backend::NdArray;

    type B = NdArray;

    pub(crate) fn tiny_config(src_vocab: usize, tgt_vocab: usize) -> Seq2SeqTransformerConfig {
        Seq2SeqTransformerConfig::new(src_vocab, tgt_vocab)
            .with_d_model(16)
            .with_num_heads(2)
            .with_encoder_layers(1)
            .with_decoder_layers(1)
            .with_d_ff(32)
            .with_dropout(0.0)
            .with_max_positions(64)
    }

    fn ids(values: Vec<i32>, shape: [usize; 2]) -> Tensor<B, 2, Int> {
        Tensor::from_data(TensorData::new(values, shape), &Default::default())
    }

    #[test]
    fn test_forward_produces_logits_per_target_position() {
        let model = tiny_config(7, 9).init::<B>(&Default::default());
        let source = ids(vec![4, 5, 6, 4, 0, 0], [2, 3]);
        let target = ids(vec![3, 4, 5, 6, 3, 7, 2, 0], [2, 4]);
        let logits = model.forward(source, target);
        assert_eq!(logits.dims(), [2, 4, 9]);
    }

    #[test]
    fn test_memory_keeps_source_padding_mask() {
        let model = tiny_config(7, 9).init::<B>(&Default::default());
        let memory = model.encode(ids(vec![4, 5, 0, 6, 0, 0], [2, 3]));
        assert_eq!(memory.memory.dims(), [2, 3, 16]);
        let one = memory.example(1);
        assert_eq!(one.memory.dims(), [1, 3, 16]);
        let mask: Vec<bool> = one.mask_pad.into_data().iter::<bool>().collect();
        assert_eq!(mask, vec![false, true, true]);
    }

    #[test]
    fn test_next_token_logits_matches_last_decode_position() {
        let model = tiny_config(7, 9).init::<B>(&Default::default());
        let memory = model.encode(ids(vec![4, 5, 6], [1, 3]));
        let tokens = ids(vec![3, 4], [1, 2]);

        let full: Vec<f32> = model.decode(tokens.clone(), &memory)
            .slice([0..1, 1..2, 0..9])
            .into_data().iter::<f32>().collect();
        let last: Vec<f32> = model.next_token_logits(tokens, &memory)
            .into_data().iter::<f32>().collect();
        assert_eq!(full, last);
    }

    #[test]
    fn test_loss_is_finite_scalar() {
        let model = tiny_config(7, 9).init::<B>(&Default::default());
        let (loss, logits) = model.forward_loss(
            ids(vec![4, 5, 6], [1, 3]),
            ids(vec![3, 4, 5], [1, 3]),
            ids(vec![4, 5, 2], [1, 3]),
            false,
        );
        assert_eq!(logits.dims(), [1, 3, 9]);
        let value: f64 = loss.into_scalar().elem();
        assert!(value.is_finite() && value > 0.0);
    }

    #[test]
    fn test_ignored_padding_does_not_dilute_loss() {
        let model = tiny_config(7, 9).init::<B>(&Default::default());
        let source = || ids(vec![4, 5, 6], [1, 3]);

        // Two real targets followed by two pads
        let (padded, _) = model.forward_loss(
            source(), ids(vec![3, 4, 2, 0], [1, 4]), ids(vec![4, 2, 0, 0], [1, 4]), true,
        );
        // The same two positions without any padding at all
        let (unpadded, _) = model.forward_loss(
            source(), ids(vec![3, 4], [1, 2]), ids(vec![4, 2], [1, 2]), false,
        );

        let padded: f32 = padded.into_scalar().elem();
        let unpadded: f32 = unpadded.into_scalar().elem();
        assert_relative_eq!(padded, unpadded, epsilon = 1e-4);
    }

    #[test]
    fn test_memory_is_layer_normalised_per_position() {
        let model = tiny_config(7, 9).init::<B>(&Default::default());
        let memory = model.encode(ids(vec![4, 5, 6, 0], [1, 4])).memory;

        let means: Vec<f32> = memory.mean_dim(2).into_data().iter::<f32>().collect();
        assert_eq!(means.len(), 4);
        for m in means {
            assert_abs_diff_eq!(m, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_pad_embedding_row_is_not_used() {
        let model = tiny_config(7, 9).init::<B>(&Default::default());
        let ids = ids(vec![4, 0], [1, 2]);
        let mask = padding_mask(&ids, 0);
        let x = Seq2SeqTransformer::<B>::embed(&model.embedding_src, ids, &mask);

        let pad_row: Vec<f32> = x.slice([0..1, 1..2, 0..16]).into_data().iter::<f32>().collect();
        assert!(pad_row.iter().all(|v| *v == 0.0));
    }
}
