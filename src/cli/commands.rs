// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `rerun`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for bad values
//   - type conversion (string → usize, f64, enum)
//
// Defaults here mirror TrainConfig::default().

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::ml::accuracy::AccuracyMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the transformer on a directory of parallel text files
    Train(TrainArgs),

    /// Repeat a run from a saved train_config.json
    Rerun(RerunArgs),
}

/// Which burn backend runs the numbers.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    /// ndarray on the CPU
    Cpu,
    /// wgpu on the default GPU adapter
    Wgpu,
}

/// How training/validation accuracy is measured.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyArg {
    /// Autoregressive greedy decoding, one example at a time
    Greedy,
    /// Argmax of the teacher-forced logits
    TeacherForced,
}

impl From<AccuracyArg> for AccuracyMode {
    fn from(a: AccuracyArg) -> Self {
        match a {
            AccuracyArg::Greedy        => AccuracyMode::Greedy,
            AccuracyArg::TeacherForced => AccuracyMode::TeacherForced,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding <name><ext> files for each split
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value = "train")]
    pub train_name: String,

    #[arg(long, default_value = "valid")]
    pub valid_name: String,

    /// Extension of the source-side files, dot included
    #[arg(long, default_value = ".x")]
    pub source_ext: String,

    /// Extension of the target-side files, dot included
    #[arg(long, default_value = ".y")]
    pub target_ext: String,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Embedding width; must be divisible by --num-heads
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 3)]
    pub encoder_layers: usize,

    #[arg(long, default_value_t = 2)]
    pub decoder_layers: usize,

    /// Inner width of each feed-forward block
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Longest sequence the positional table can cover (exclusive)
    #[arg(long, default_value_t = 5000)]
    pub max_positions: usize,

    /// Batches whose gradients are summed before one optimizer step
    #[arg(long, default_value_t = 10)]
    pub accumulation_steps: usize,

    /// Gradient norm clipping threshold
    #[arg(long, default_value_t = 0.1)]
    pub clip_norm: f32,

    /// Validate every N batches (and after the last batch)
    #[arg(long, default_value_t = 640)]
    pub log_interval: usize,

    /// Stop once validation accuracy is strictly above this
    #[arg(long, default_value_t = 0.9)]
    pub early_stop_accuracy: f64,

    #[arg(long, value_enum, default_value_t = AccuracyArg::Greedy)]
    pub accuracy_mode: AccuracyArg,

    /// Exclude <pad> positions from the loss
    #[arg(long)]
    pub ignore_pad_in_loss: bool,

    /// Data loader worker threads
    #[arg(long, default_value_t = 8)]
    pub num_workers: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,

    /// Write train_config.json and metrics.csv here
    #[arg(long)]
    pub metrics_dir: Option<PathBuf>,

    /// Print this many validation translations after training
    #[arg(long, default_value_t = 0)]
    pub show_samples: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:            a.data_dir,
            train_name:          a.train_name,
            valid_name:          a.valid_name,
            source_ext:          a.source_ext,
            target_ext:          a.target_ext,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            lr:                  a.lr,
            d_model:             a.d_model,
            num_heads:           a.num_heads,
            encoder_layers:      a.encoder_layers,
            decoder_layers:      a.decoder_layers,
            d_ff:                a.d_ff,
            dropout:             a.dropout,
            max_positions:       a.max_positions,
            accumulation_steps:  a.accumulation_steps,
            clip_norm:           a.clip_norm,
            log_interval:        a.log_interval,
            early_stop_accuracy: a.early_stop_accuracy,
            accuracy_mode:       a.accuracy_mode.into(),
            ignore_pad_in_loss:  a.ignore_pad_in_loss,
            num_workers:         a.num_workers,
            seed:                a.seed,
            metrics_dir:         a.metrics_dir,
            show_samples:        a.show_samples,
        }
    }
}

/// All arguments for the `rerun` command
#[derive(Args, Debug)]
pub struct RerunArgs {
    /// Path to a train_config.json written by an earlier run
    #[arg(long)]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["char-seq2seq", "train"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.device, DeviceArg::Cpu);

        let parsed: TrainConfig = args.into();
        let defaults = TrainConfig::default();
        assert_eq!(parsed.batch_size, defaults.batch_size);
        assert_eq!(parsed.accumulation_steps, defaults.accumulation_steps);
        assert_eq!(parsed.log_interval, defaults.log_interval);
        assert_eq!(parsed.accuracy_mode, defaults.accuracy_mode);
        assert_eq!(parsed.data_dir, defaults.data_dir);
        assert_eq!(parsed.source_ext, defaults.source_ext);
    }

    #[test]
    fn test_train_flags_are_parsed() {
        let cli = Cli::try_parse_from([
            "char-seq2seq", "train",
            "--data-dir", "corpus",
            "--batch-size", "4",
            "--accuracy-mode", "teacher-forced",
            "--ignore-pad-in-loss",
            "--device", "wgpu",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.device, DeviceArg::Wgpu);

        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.data_dir, PathBuf::from("corpus"));
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.accuracy_mode, AccuracyMode::TeacherForced);
        assert!(cfg.ignore_pad_in_loss);
    }

    #[test]
    fn test_rerun_requires_config() {
        assert!(Cli::try_parse_from(["char-seq2seq", "rerun"]).is_err());
    }
}
