// Replay Report Types
// Structured JSON output, one entry per seed plus an aggregate

use serde::Serialize;
use std::collections::BTreeMap;

// ─── Statistics (per-metric aggregation across seeds) ───────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        Self {
            mean,
            std_dev: variance.sqrt(),
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub seed: u64,
    pub steps: u32,
    pub communications: usize,
    pub ok_commands: u32,
    /// Refused commands by error category.
    pub failures: BTreeMap<String, u32>,
    pub command_mix: [u32; 8],
    /// Clients per tier: normal, gold, platinum.
    pub tier_breakdown: [u32; 3],
    pub global_payments: i64,
    pub global_debts: i64,
    pub violations: Vec<String>,
    pub deterministic: bool,
    pub elapsed_ms: u128,
}

impl RunResult {
    pub fn passed(&self) -> bool {
        self.deterministic && self.violations.is_empty()
    }
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub summary: Summary,
    pub communications: Stats,
    pub acceptance_rate: Stats,
    pub runs: Vec<RunResult>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl ReplayReport {
    pub fn new(timestamp: String, runs: Vec<RunResult>) -> Self {
        let passed = runs.iter().filter(|r| r.passed()).count();
        let communications: Vec<f64> = runs.iter().map(|r| r.communications as f64).collect();
        let acceptance: Vec<f64> = runs
            .iter()
            .map(|r| r.ok_commands as f64 / r.steps.max(1) as f64)
            .collect();
        Self {
            timestamp,
            version: env!("CARGO_PKG_VERSION"),
            prng: "ChaCha8Rng",
            summary: Summary { total: runs.len(), passed, failed: runs.len() - passed },
            communications: Stats::from_samples(&communications),
            acceptance_rate: Stats::from_samples(&acceptance),
            runs,
        }
    }
}
