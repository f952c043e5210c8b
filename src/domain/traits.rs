// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams the rest of the system is written against:
//
//   ParallelCorpusSource → where aligned (source, target) lines
//                          come from (files on disk, or an
//                          in-memory list in tests)
//
//   MetricsRecorder      → where training progress goes
//                          (in-memory history, CSV file, both)
//
// The training loop never owns global progress lists; whoever
// calls it hands in a recorder and keeps the results.

use anyhow::Result;

use crate::domain::report::ValidationReport;

// ─── ParallelCorpusSource ────────────────────────────────────────────────────
/// Anything that can produce line-aligned source/target text.
pub trait ParallelCorpusSource {
    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;

    /// Read every aligned pair in a fixed order.
    /// Fails if the two sides do not have the same number of lines.
    fn read_pairs(&self) -> Result<Vec<(String, String)>>;
}

impl ParallelCorpusSource for Vec<(String, String)> {
    fn describe(&self) -> String {
        format!("{} in-memory pairs", self.len())
    }

    fn read_pairs(&self) -> Result<Vec<(String, String)>> {
        Ok(self.clone())
    }
}

// ─── MetricsRecorder ─────────────────────────────────────────────────────────
/// Receives training progress as it happens.
pub trait MetricsRecorder {
    /// Called once per training batch.
    fn record_batch(&mut self, loss: f64, accuracy: f64) -> Result<()>;

    /// Called after every validation pass.
    fn record_validation(&mut self, report: &ValidationReport) -> Result<()>;
}

impl<R: MetricsRecorder + ?Sized> MetricsRecorder for &mut R {
    fn record_batch(&mut self, loss: f64, accuracy: f64) -> Result<()> {
        (**self).record_batch(loss, accuracy)
    }

    fn record_validation(&mut self, report: &ValidationReport) -> Result<()> {
        (**self).record_validation(report)
    }
}

impl<R: MetricsRecorder> MetricsRecorder for Option<R> {
    fn record_batch(&mut self, loss: f64, accuracy: f64) -> Result<()> {
        match self {
            Some(r) => r.record_batch(loss, accuracy),
            None => Ok(()),
        }
    }

    fn record_validation(&mut self, report: &ValidationReport) -> Result<()> {
        match self {
            Some(r) => r.record_validation(report),
            None => Ok(()),
        }
    }
}

impl<A: MetricsRecorder, B: MetricsRecorder> MetricsRecorder for (A, B) {
    fn record_batch(&mut self, loss: f64, accuracy: f64) -> Result<()> {
        self.0.record_batch(loss, accuracy)?;
        self.1.record_batch(loss, accuracy)
    }

    fn record_validation(&mut self, report: &ValidationReport) -> Result<()> {
        self.0.record_validation(report)?;
        self.1.record_validation(report)
    }
}
