// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One epoch, batch by batch:
//
//   1. Teacher-forced forward pass + cross-entropy loss
//   2. Accuracy for monitoring (greedy decode or teacher-forced
//      argmax) on the inference copy of the model; no gradients
//   3. Backward pass, gradients added to the accumulator
//   4. Every k batches, and on the last batch of the epoch:
//      drain the accumulator → clip → Adam step
//   5. Every `log_interval` batches, and on the last batch:
//      validate on the held-out set, report, reset running sums
//   6. Validation accuracy above the threshold stops training
//
// Parameters only change in step 4, so within an accumulation
// window every forward pass sees the same weights.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsAccumulator, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::Seq2SeqBatch;
use crate::domain::{
    report::ValidationReport,
    traits::MetricsRecorder,
    vocabulary::SpecialTokens,
};
use crate::ml::{
    accuracy::{argmax_tokens, exact_match_accuracy, AccuracyMode},
    decoder::GreedyDecoder,
    grad_clip::clip_grad_norm,
    model::Seq2SeqTransformer,
};

#[derive(Debug, Clone)]
pub struct TrainerSettings {
    pub learning_rate:       f64,
    /// Batches per optimizer step (k)
    pub accumulation_steps:  usize,
    /// Limit on the global gradient norm at each optimizer step
    pub clip_norm:           f32,
    pub log_interval:        usize,
    pub early_stop_accuracy: f64,
    pub accuracy_mode:       AccuracyMode,
    pub ignore_pad_in_loss:  bool,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            learning_rate:       1e-4,
            accumulation_steps:  10,
            clip_norm:           0.1,
            log_interval:        640,
            early_stop_accuracy: 0.9,
            accuracy_mode:       AccuracyMode::Greedy,
            ignore_pad_in_loss:  false,
        }
    }
}

/// Adam without built-in clipping; the trainer clips the global norm.
pub fn adam_optimizer<B, M>() -> impl Optimizer<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    AdamConfig::new()
        .with_epsilon(1e-8)
        .init()
}

/// True when batch `batch_idx` (0-based) closes an accumulation window.
pub fn is_update_boundary(batch_idx: usize, accumulation_steps: usize, is_last: bool) -> bool {
    is_last || (batch_idx + 1) % accumulation_steps.max(1) == 0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub loss:     f64,
    pub accuracy: f64,
    /// Whether this batch triggered an optimizer step
    pub updated:  bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EpochOutcome {
    Completed,
    EarlyStopped(ValidationReport),
}

/// Running averages since the last validation pass.
#[derive(Debug, Default)]
struct RunningMetrics {
    loss_sum:     f64,
    accuracy_sum: f64,
    batches:      usize,
}

impl RunningMetrics {
    fn add(&mut self, step: &StepOutput) {
        self.loss_sum     += step.loss;
        self.accuracy_sum += step.accuracy;
        self.batches      += 1;
    }

    fn averages(&self) -> (f64, f64) {
        let n = self.batches.max(1) as f64;
        (self.loss_sum / n, self.accuracy_sum / n)
    }
}

// ─── Validation ───────────────────────────────────────────────────────────────
/// Loss and exact-match accuracy over a whole loader, no gradients.
///
/// Both are averaged per batch.
pub fn evaluate<B: Backend>(
    model:    &Seq2SeqTransformer<B>,
    loader:   &dyn DataLoader<Seq2SeqBatch<B>>,
    decoder:  &GreedyDecoder,
    settings: &TrainerSettings,
) -> Evaluation {
    let mut loss_sum     = 0.0f64;
    let mut accuracy_sum = 0.0f64;
    let mut batches      = 0usize;

    for batch in loader.iter() {
        let (input, expected) = batch.teacher_forcing_split();
        let target_input_len = input.dims()[1];
        let (loss, logits) = model.forward_loss(
            batch.source.clone(), input, expected.clone(), settings.ignore_pad_in_loss,
        );
        loss_sum += loss.into_scalar().elem::<f64>();

        let predicted = match settings.accuracy_mode {
            AccuracyMode::Greedy => decoder.decode_batch(model, batch.source, target_input_len),
            AccuracyMode::TeacherForced => argmax_tokens(logits),
        };
        accuracy_sum += exact_match_accuracy(expected, predicted);
        batches += 1;
    }

    if batches == 0 {
        return Evaluation { loss: f64::NAN, accuracy: 0.0 };
    }
    let loss     = loss_sum / batches as f64;
    let accuracy = accuracy_sum / batches as f64;
    println!("Validation | loss {:5.2} | accu {:8.2}%", loss, accuracy * 100.0);
    Evaluation { loss, accuracy }
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<B: AutodiffBackend, O> {
    model:       Seq2SeqTransformer<B>,
    optim:       O,
    accumulator: GradientsAccumulator<Seq2SeqTransformer<B>>,
    decoder:     GreedyDecoder,
    settings:    TrainerSettings,
}

impl<B, O> Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Seq2SeqTransformer<B>, B>,
{
    pub fn new(
        model:    Seq2SeqTransformer<B>,
        optim:    O,
        settings: TrainerSettings,
        tokens:   SpecialTokens,
    ) -> Self {
        Self {
            model,
            optim,
            accumulator: GradientsAccumulator::new(),
            decoder: GreedyDecoder::new(tokens),
            settings,
        }
    }

    pub fn model(&self) -> &Seq2SeqTransformer<B> {
        &self.model
    }

    pub fn into_model(self) -> Seq2SeqTransformer<B> {
        self.model
    }

    pub fn settings(&self) -> &TrainerSettings {
        &self.settings
    }

    /// Forward, monitor, backward; step the optimizer if `update`.
    pub fn train_step(&mut self, batch: &Seq2SeqBatch<B>, update: bool) -> StepOutput {
        let (input, expected) = batch.teacher_forcing_split();
        let target_input_len = input.dims()[1];

        let (loss, logits) = self.model.forward_loss(
            batch.source.clone(), input, expected.clone(), self.settings.ignore_pad_in_loss,
        );
        let loss_value: f64 = loss.clone().into_scalar().elem();

        // Monitoring only: nothing here reaches the gradients
        let accuracy = match self.settings.accuracy_mode {
            AccuracyMode::Greedy => {
                let inference = self.model.valid();
                let predicted = self.decoder.decode_batch(
                    &inference, batch.source.clone().inner(), target_input_len,
                );
                exact_match_accuracy(expected.inner(), predicted)
            }
            AccuracyMode::TeacherForced => {
                exact_match_accuracy(expected, argmax_tokens(logits.detach()))
            }
        };

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.accumulator.accumulate(&self.model, grads);

        if update {
            let (grads, _) = clip_grad_norm::<B, _>(&self.model, self.accumulator.grads(), self.settings.clip_norm);
            self.model = self.optim.step(self.settings.learning_rate, self.model.clone(), grads);
        }

        StepOutput { loss: loss_value, accuracy, updated: update }
    }

    /// Train over one pass of `train`, validating on `valid`.
    pub fn train_epoch(
        &mut self,
        epoch:    usize,
        train:    &dyn DataLoader<Seq2SeqBatch<B>>,
        valid:    &dyn DataLoader<Seq2SeqBatch<B::InnerBackend>>,
        recorder: &mut dyn MetricsRecorder,
    ) -> Result<EpochOutcome> {
        let mut running = RunningMetrics::default();
        let mut batches = train.iter().peekable();
        let mut batch_idx = 0usize;
        let log_interval = self.settings.log_interval.max(1);

        while let Some(batch) = batches.next() {
            let is_last = batches.peek().is_none();
            let update  = is_update_boundary(batch_idx, self.settings.accumulation_steps, is_last);

            let step = self.train_step(&batch, update);
            tracing::debug!(
                "epoch {} batch {} | loss={:.4} accu={:.4} step={}",
                epoch, batch_idx + 1, step.loss, step.accuracy, step.updated,
            );
            recorder.record_batch(step.loss, step.accuracy)?;
            running.add(&step);

            if (batch_idx + 1) % log_interval == 0 || is_last {
                let (train_loss, train_accuracy) = running.averages();
                println!(
                    "Training | epoch {:3} | batch {:5} | loss {:5.2} | accu {:8.2}%",
                    epoch, batch_idx + 1, train_loss, train_accuracy * 100.0,
                );

                let eval = evaluate(&self.model.valid(), valid, &self.decoder, &self.settings);
                let report = ValidationReport {
                    epoch,
                    batch: batch_idx + 1,
                    train_loss,
                    train_accuracy,
                    val_loss: eval.loss,
                    val_accuracy: eval.accuracy,
                };
                recorder.record_validation(&report)?;
                running = RunningMetrics::default();

                if report.reaches(self.settings.early_stop_accuracy) {
                    println!("Training Done | Validation Accuracy: {:.2}%", report.val_accuracy * 100.0);
                    return Ok(EpochOutcome::EarlyStopped(report));
                }
            }
            batch_idx += 1;
        }

        Ok(EpochOutcome::Completed)
    }
}
