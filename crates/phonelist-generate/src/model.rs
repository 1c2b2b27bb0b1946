use std::num::NonZeroUsize;
use std::path::PathBuf;

use phonelist_core::{DialingPlan, Error as CoreError};
use serde::{Deserialize, Serialize};

use crate::worker::WorkerState;

/// Default number of candidates committed per durable write.
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Size of the worker pool, and number of ranges per fresh area code.
    pub workers: usize,
    /// Numbers formatted before each flush + progress update.
    pub batch_size: usize,
    /// Prefix every line with `+`.
    pub plus_prefix: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            batch_size: DEFAULT_BATCH_SIZE,
            plus_prefix: false,
        }
    }
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.workers == 0 {
            return Err(CoreError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(CoreError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Worker count used when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Everything the engine needs for one run, collected before it starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub country_code: String,
    pub area_codes: Vec<String>,
    pub plan: DialingPlan,
    pub output_path: PathBuf,
    pub progress_path: PathBuf,
    /// Continue from the progress store instead of starting over.
    pub resume: bool,
}

impl GenerationRequest {
    /// Progress store path conventionally paired with an output file.
    pub fn default_progress_path(output_path: &std::path::Path) -> PathBuf {
        let mut name = output_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".progress.json");
        output_path.with_file_name(name)
    }
}

/// Final state of one range after a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeReport {
    pub index: usize,
    pub start: u64,
    pub end: u64,
    /// Offset the worker started from in this run.
    pub resumed_from: u64,
    /// First offset not yet durably written.
    pub next: u64,
    pub state: WorkerState,
    pub numbers_written: u64,
}

/// Summary of one area code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaReport {
    pub area_code: String,
    pub ranges: Vec<RangeReport>,
    pub numbers_written: u64,
    pub complete: bool,
}

/// A range that failed without stopping the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerIssue {
    pub area_code: String,
    pub range: usize,
    pub message: String,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub country_code: String,
    pub workers: usize,
    pub batch_size: usize,
    pub resumed: bool,
    pub areas: Vec<AreaReport>,
    pub numbers_written: u64,
    pub bytes_written: u64,
    pub duration_ms: u64,
    pub throughput_numbers_per_sec: f64,
    pub failures: Vec<WorkerIssue>,
}

impl GenerationReport {
    pub fn new(run_id: String, country_code: String, options: &GenerateOptions) -> Self {
        Self {
            run_id,
            country_code,
            workers: options.workers,
            batch_size: options.batch_size,
            resumed: false,
            areas: Vec::new(),
            numbers_written: 0,
            bytes_written: 0,
            duration_ms: 0,
            throughput_numbers_per_sec: 0.0,
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, issue: WorkerIssue) {
        self.failures.push(issue);
    }

    /// True when every requested area code has all of its ranges finalized.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.areas.iter().all(|area| area.complete)
    }
}
