// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load + tokenise the training split (builds vocab)
//   Step 3: Load + tokenise the validation split (reuses vocab)
//   Step 4: Check sequence lengths against positional capacity
//   Step 5: Save the run config (optional)
//   Step 6: Build model, optimiser, data loaders
//   Step 7: Epoch loop until done or early stop
//   Step 8: Print sample translations (optional)
//
// The use case is generic over the autodiff backend so the CLI
// decides which device runs the numbers.

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    batcher::Seq2SeqBatcher,
    dataset::ParallelTextDataset,
    loader::ParallelTextFiles,
};
use crate::domain::{traits::ParallelCorpusSource, vocabulary::Vocabulary};
use crate::infra::{
    metrics::{CsvMetricsLogger, MetricsHistory},
    run_config::save_run_config,
};
use crate::ml::{
    accuracy::AccuracyMode,
    inferencer::Translator,
    model::{Seq2SeqTransformer, Seq2SeqTransformerConfig},
    trainer::{adam_optimizer, EpochOutcome, Trainer, TrainerSettings},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so the
// resolved values can be written next to the metrics and replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:            PathBuf,
    pub train_name:          String,
    pub valid_name:          String,
    pub source_ext:          String,
    pub target_ext:          String,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub lr:                  f64,
    pub d_model:             usize,
    pub num_heads:           usize,
    pub encoder_layers:      usize,
    pub decoder_layers:      usize,
    pub d_ff:                usize,
    pub dropout:             f64,
    pub max_positions:       usize,
    pub accumulation_steps:  usize,
    pub clip_norm:           f32,
    pub log_interval:        usize,
    pub early_stop_accuracy: f64,
    pub accuracy_mode:       AccuracyMode,
    pub ignore_pad_in_loss:  bool,
    pub num_workers:         usize,
    pub seed:                u64,
    pub metrics_dir:         Option<PathBuf>,
    pub show_samples:        usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:            PathBuf::from("data"),
            train_name:          "train".to_string(),
            valid_name:          "valid".to_string(),
            source_ext:          ".x".to_string(),
            target_ext:          ".y".to_string(),
            batch_size:          64,
            epochs:              10,
            lr:                  1e-4,
            d_model:             256,
            num_heads:           8,
            encoder_layers:      3,
            decoder_layers:      2,
            d_ff:                1024,
            dropout:             0.1,
            max_positions:       5000,
            accumulation_steps:  10,
            clip_norm:           0.1,
            log_interval:        640,
            early_stop_accuracy: 0.9,
            accuracy_mode:       AccuracyMode::Greedy,
            ignore_pad_in_loss:  false,
            num_workers:         8,
            seed:                42,
            metrics_dir:         None,
            show_samples:        0,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would fail later in a less obvious place.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(self.accumulation_steps > 0, "accumulation_steps must be at least 1");
        ensure!(self.log_interval > 0, "log_interval must be at least 1");
        ensure!(self.num_heads > 0, "num_heads must be at least 1");
        ensure!(
            self.d_model % self.num_heads == 0,
            "d_model ({}) must be divisible by num_heads ({})",
            self.d_model,
            self.num_heads
        );
        ensure!((0.0..1.0).contains(&self.dropout), "dropout must be in [0, 1)");
        ensure!(self.clip_norm > 0.0, "clip_norm must be positive");
        Ok(())
    }

    pub fn trainer_settings(&self) -> TrainerSettings {
        TrainerSettings {
            learning_rate:       self.lr,
            accumulation_steps:  self.accumulation_steps,
            clip_norm:           self.clip_norm,
            log_interval:        self.log_interval,
            early_stop_accuracy: self.early_stop_accuracy,
            accuracy_mode:       self.accuracy_mode,
            ignore_pad_in_loss:  self.ignore_pad_in_loss,
        }
    }

    pub fn model_config(&self, source_vocab: usize, target_vocab: usize) -> Seq2SeqTransformerConfig {
        Seq2SeqTransformerConfig::new(source_vocab, target_vocab)
            .with_d_model(self.d_model)
            .with_num_heads(self.num_heads)
            .with_encoder_layers(self.encoder_layers)
            .with_decoder_layers(self.decoder_layers)
            .with_d_ff(self.d_ff)
            .with_dropout(self.dropout)
            .with_max_positions(self.max_positions)
    }
}

/// Sequences must be strictly shorter than the positional table.
pub fn check_positional_capacity(dataset: &ParallelTextDataset, max_positions: usize) -> Result<()> {
    let longest = dataset.source_len().max(dataset.target_len());
    ensure!(
        longest < max_positions,
        "Sequence length {} does not fit the positional encoding (max_positions = {}); \
         raise --max-positions or shorten the data",
        longest,
        max_positions
    );
    Ok(())
}

/// What a finished run hands back.
#[derive(Debug)]
pub struct TrainSummary {
    pub history:      MetricsHistory,
    pub epochs_run:   usize,
    pub early_stopped: bool,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Execute the full training pipeline on backend `B`.
    pub fn execute<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        B::seed(cfg.seed);

        // ── Step 2 + 3: Load both splits ──────────────────────────────────────
        // The validation split must see the training vocabularies
        // frozen, so unseen symbols become <unk> instead of new IDs.
        let train_files = ParallelTextFiles::for_split(&cfg.data_dir, &cfg.train_name, &cfg.source_ext, &cfg.target_ext);
        let valid_files = ParallelTextFiles::for_split(&cfg.data_dir, &cfg.valid_name, &cfg.source_ext, &cfg.target_ext);

        let mut source_vocab = Vocabulary::new();
        let mut target_vocab = Vocabulary::new();
        let train_set = ParallelTextDataset::build(&train_files, &mut source_vocab, &mut target_vocab, true)?;
        let valid_set = ParallelTextDataset::build(&valid_files, &mut source_vocab, &mut target_vocab, false)?;
        tracing::info!(
            "Vocabulary sizes: source={}, target={}",
            source_vocab.len(),
            target_vocab.len()
        );

        // ── Step 4: Positional capacity ───────────────────────────────────────
        check_positional_capacity(&train_set, cfg.max_positions)?;
        check_positional_capacity(&valid_set, cfg.max_positions)?;

        // ── Step 5: Run config ────────────────────────────────────────────────
        let csv_logger = match &cfg.metrics_dir {
            Some(dir) => {
                let path = save_run_config(dir, cfg)?;
                tracing::info!("Run config written to '{}'", path.display());
                Some(CsvMetricsLogger::new(dir)?)
            }
            None => None,
        };

        // ── Step 6: Model, optimiser, loaders ─────────────────────────────────
        let model: Seq2SeqTransformer<B> = cfg
            .model_config(source_vocab.len(), target_vocab.len())
            .init(&device);
        tracing::info!(
            "Model ready: {} encoder / {} decoder layers, d_model={}, {} parameters",
            cfg.encoder_layers, cfg.decoder_layers, cfg.d_model, model.num_params(),
        );

        let optim = adam_optimizer::<B, Seq2SeqTransformer<B>>();
        let mut trainer = Trainer::new(model, optim, cfg.trainer_settings(), target_vocab.specials());

        let train_loader = DataLoaderBuilder::new(Seq2SeqBatcher::<B>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed)
            .num_workers(cfg.num_workers)
            .build(train_set);
        let valid_loader = DataLoaderBuilder::new(Seq2SeqBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers)
            .build(valid_set.clone());

        // ── Step 7: Epoch loop ────────────────────────────────────────────────
        tracing::info!("Start training");
        let mut recorders = (MetricsHistory::default(), csv_logger);
        let mut epochs_run    = 0usize;
        let mut early_stopped = false;

        for epoch in 1..=cfg.epochs {
            epochs_run = epoch;
            let outcome = trainer.train_epoch(
                epoch,
                train_loader.as_ref(),
                valid_loader.as_ref(),
                &mut recorders,
            )?;
            if let EpochOutcome::EarlyStopped(report) = outcome {
                tracing::info!(
                    "Early stop in epoch {} at batch {}: validation accuracy {:.2}%",
                    report.epoch, report.batch, report.val_accuracy * 100.0,
                );
                early_stopped = true;
                break;
            }
        }

        // ── Step 8: Sample translations ───────────────────────────────────────
        if cfg.show_samples > 0 {
            let inference = trainer.model().valid();
            let translator = Translator::new(
                &inference,
                &source_vocab,
                &target_vocab,
                valid_set.target_len().saturating_sub(2),
                device,
            );
            for (source, expected) in valid_files.read_pairs()?.iter().take(cfg.show_samples) {
                let predicted = translator.translate(source);
                let mark = if &predicted == expected { "ok" } else { "--" };
                println!("[{mark}] {source} → {predicted} (expected {expected})");
            }
        }

        tracing::info!("Training complete after {} epoch(s)", epochs_run);
        let (history, _) = recorders;
        Ok(TrainSummary { history, epochs_run, early_stopped })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    type TB = Autodiff<NdArray>;

    fn tiny_run(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            data_dir: dir.to_path_buf(),
            batch_size: 2,
            epochs: 2,
            d_model: 16,
            num_heads: 2,
            encoder_layers: 1,
            decoder_layers: 1,
            d_ff: 32,
            dropout: 0.0,
            max_positions: 32,
            accumulation_steps: 2,
            log_interval: 2,
            early_stop_accuracy: 2.0,
            accuracy_mode: AccuracyMode::TeacherForced,
            num_workers: 1,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_rejects_heads_not_dividing_width() {
        let cfg = TrainConfig { d_model: 10, num_heads: 4, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_positional_capacity_is_checked_before_training() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train.x"), "abcdefgh\n").unwrap();
        fs::write(dir.path().join("train.y"), "hgfedcba\n").unwrap();
        fs::write(dir.path().join("valid.x"), "ab\n").unwrap();
        fs::write(dir.path().join("valid.y"), "ba\n").unwrap();

        let cfg = TrainConfig { max_positions: 10, ..tiny_run(dir.path()) };
        let err = TrainUseCase::new(cfg).execute::<TB>(Default::default()).unwrap_err();
        assert!(err.to_string().contains("positional encoding"));
    }

    #[test]
    fn test_full_run_records_history_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train.x"), "ab\nba\nabb\n").unwrap();
        fs::write(dir.path().join("train.y"), "ba\nab\nbba\n").unwrap();
        fs::write(dir.path().join("valid.x"), "ab\nbc\n").unwrap();
        fs::write(dir.path().join("valid.y"), "ba\ncb\n").unwrap();
        let metrics_dir = dir.path().join("metrics");

        let cfg = TrainConfig { metrics_dir: Some(metrics_dir.clone()), ..tiny_run(dir.path()) };
        let summary = TrainUseCase::new(cfg).execute::<TB>(Default::default()).unwrap();

        assert_eq!(summary.epochs_run, 2);
        assert!(!summary.early_stopped);
        // 3 examples / batch 2 → 2 batches per epoch
        assert_eq!(summary.history.losses.len(), 4);
        assert_eq!(summary.history.validations.len(), 2);

        assert!(metrics_dir.join("train_config.json").exists());
        let csv = fs::read_to_string(metrics_dir.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
