//! Persistence worker pool for phonelist.
//!
//! This crate drives the enumerator from `phonelist-core` to durable storage
//! with a fixed pool of worker threads, and keeps a progress store so an
//! interrupted run can resume where its last committed batch ended.

pub mod atomic;
pub mod checkpoint;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod worker;

pub use checkpoint::{AreaProgress, PROGRESS_VERSION, ProgressStore, RangeProgress};
pub use engine::{GenerationEngine, GenerationResult};
pub use errors::GenerationError;
pub use model::{
    AreaReport, GenerateOptions, GenerationReport, GenerationRequest, RangeReport, WorkerIssue,
};
pub use output::{OutputFile, SharedOutput};
pub use worker::{RangeTask, WorkerState};
