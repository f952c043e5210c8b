// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — trains the model on parallel .x/.y text files
//   2. `rerun` — repeats a run from its saved train_config.json
//
// The --device flag picks the burn backend here, so nothing
// below this layer names a concrete backend.

pub mod commands;

use anyhow::Result;
use burn::backend::{wgpu::WgpuDevice, Autodiff, NdArray, Wgpu};
use clap::Parser;
use commands::{Commands, DeviceArg, RerunArgs, TrainArgs};

use crate::application::train_use_case::{TrainConfig, TrainSummary, TrainUseCase};
use crate::infra::run_config::load_run_config;

#[derive(Parser, Debug)]
#[command(
    name = "char-seq2seq",
    version = "0.1.0",
    about = "Train a character-level encoder-decoder transformer on parallel text files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the training use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Rerun(args) => run_rerun(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let device = args.device;
    let config: TrainConfig = args.into();
    tracing::info!("Starting training on data in: {}", config.data_dir.display());
    train_on(device, config)
}

fn run_rerun(args: RerunArgs) -> Result<()> {
    let config = load_run_config(&args.config)?;
    tracing::info!("Re-running config from: {}", args.config.display());
    train_on(args.device, config)
}

fn train_on(device: DeviceArg, config: TrainConfig) -> Result<()> {
    let use_case = TrainUseCase::new(config);
    let summary = match device {
        DeviceArg::Cpu  => use_case.execute::<Autodiff<NdArray>>(Default::default())?,
        DeviceArg::Wgpu => use_case.execute::<Autodiff<Wgpu>>(WgpuDevice::default())?,
    };
    report(&summary);
    Ok(())
}

fn report(summary: &TrainSummary) {
    match summary.history.last_validation() {
        Some(last) => println!(
            "Finished after {} epoch(s){}. Last validation: loss {:.4}, accuracy {:.2}% (best {:.2}%)",
            summary.epochs_run,
            if summary.early_stopped { " (early stop)" } else { "" },
            last.val_loss,
            last.val_accuracy * 100.0,
            summary.history.best_val_accuracy().unwrap_or(0.0) * 100.0,
        ),
        None => println!("Finished after {} epoch(s) without validation.", summary.epochs_run),
    }
}
