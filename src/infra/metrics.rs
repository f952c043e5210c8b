// ============================================================
// Layer 6 — Metrics Recorders
// ============================================================
// Two MetricsRecorder implementations:
//
//   MetricsHistory   — keeps every batch loss/accuracy and every
//                      validation report in memory; handed back
//                      to the caller when training ends
//
//   CsvMetricsLogger — appends one row per validation pass to
//                      <dir>/metrics.csv for plotting later
//
// Example CSV output:
//   epoch,batch,train_loss,train_accuracy,val_loss,val_accuracy
//   1,640,2.314500,0.000000,2.101200,0.012000
//   1,1280,1.210100,0.184000,1.154300,0.172000

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::{report::ValidationReport, traits::MetricsRecorder};

/// In-memory progress history of one training run.
#[derive(Debug, Clone, Default)]
pub struct MetricsHistory {
    pub losses:      Vec<f64>,
    pub accuracies:  Vec<f64>,
    pub validations: Vec<ValidationReport>,
}

impl MetricsHistory {
    pub fn last_validation(&self) -> Option<&ValidationReport> {
        self.validations.last()
    }

    /// Highest validation accuracy seen so far.
    pub fn best_val_accuracy(&self) -> Option<f64> {
        self.validations
            .iter()
            .map(|r| r.val_accuracy)
            .fold(None, |best, acc| Some(best.map_or(acc, |b: f64| b.max(acc))))
    }
}

impl MetricsRecorder for MetricsHistory {
    fn record_batch(&mut self, loss: f64, accuracy: f64) -> Result<()> {
        self.losses.push(loss);
        self.accuracies.push(accuracy);
        Ok(())
    }

    fn record_validation(&mut self, report: &ValidationReport) -> Result<()> {
        self.validations.push(report.clone());
        Ok(())
    }
}

/// Appends validation reports to a CSV file.
pub struct CsvMetricsLogger {
    csv_path: PathBuf,
}

impl CsvMetricsLogger {
    /// Create the directory if needed and write the header row once.
    /// An existing file is appended to, not truncated.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,batch,train_loss,train_accuracy,val_loss,val_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl MetricsRecorder for CsvMetricsLogger {
    fn record_batch(&mut self, _loss: f64, _accuracy: f64) -> Result<()> {
        Ok(())
    }

    fn record_validation(&mut self, r: &ValidationReport) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6}",
            r.epoch, r.batch, r.train_loss, r.train_accuracy, r.val_loss, r.val_accuracy,
        )?;
        Ok(())
    }
}
