// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to a single layer:
//
//   metrics.rs    — MetricsRecorder implementations: an in-memory
//                   history returned to the caller, and a CSV
//                   logger for plotting learning curves.
//
//   run_config.rs — Writes the resolved TrainConfig as JSON next
//                   to the metrics so a run can be reproduced.

/// Training metrics history and CSV logger
pub mod metrics;

/// Run configuration dump
pub mod run_config;
