// ============================================================
// Layer 3 — Validation Report
// ============================================================
// A snapshot taken every time the training loop pauses to run
// the validation set: where we are in the epoch, the running
// training numbers since the previous snapshot, and the
// validation numbers just measured.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub epoch:          usize,
    /// 1-based index of the batch that triggered validation
    pub batch:          usize,
    pub train_loss:     f64,
    pub train_accuracy: f64,
    pub val_loss:       f64,
    pub val_accuracy:   f64,
}

impl ValidationReport {
    /// True once validation accuracy strictly exceeds `threshold`.
    pub fn reaches(&self, threshold: f64) -> bool {
        self.val_accuracy > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let mut report = ValidationReport {
            epoch: 1, batch: 10,
            train_loss: 1.0, train_accuracy: 0.5,
            val_loss: 1.0, val_accuracy: 0.9,
        };
        assert!(!report.reaches(0.9));
        report.val_accuracy = 0.91;
        assert!(report.reaches(0.9));
    }
}
