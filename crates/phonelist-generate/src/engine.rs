use std::collections::{BTreeMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use phonelist_core::{AreaCode, CountryCode, Error as CoreError, partition};
use tracing::{error, info, warn};

use crate::checkpoint::ProgressStore;
use crate::errors::GenerationError;
use crate::model::{
    AreaReport, GenerateOptions, GenerationReport, GenerationRequest, RangeReport, WorkerIssue,
};
use crate::output::SharedOutput;
use crate::worker::{RangeFailure, RangeOutcome, RangeTask, Worker, WorkerContext, WorkerState};

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub report: GenerationReport,
    /// Final progress store. Its file is removed once every range completes.
    pub progress: ProgressStore,
}

/// Entry point for writing every candidate of a set of area codes.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
    run_id: Option<String>,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            run_id: None,
        }
    }

    /// Tag the report with an externally assigned run id.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn run(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();

        // Configuration errors surface here, before any file is touched.
        self.options.validate()?;
        request.plan.validate()?;
        let country = CountryCode::parse(&request.country_code)?;
        let areas = parse_area_codes(&request.area_codes, request)?;

        let run_id = self
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut report =
            GenerationReport::new(run_id.clone(), country.to_string(), &self.options);

        let existing = if request.resume {
            ProgressStore::load(&request.progress_path)?
        } else {
            None
        };
        let (mut store, fresh) = match existing {
            Some(store) => {
                store.check_compatible(&country, &request.plan, self.options.plus_prefix)?;
                if store.output_path != request.output_path {
                    return Err(CoreError::InvalidConfig(format!(
                        "progress file {} belongs to {}, not {}; start fresh to overwrite it",
                        request.progress_path.display(),
                        store.output_path.display(),
                        request.output_path.display()
                    ))
                    .into());
                }
                report.resumed = true;
                (store, false)
            }
            None => {
                if request.resume {
                    info!(
                        path = %request.progress_path.display(),
                        "no progress file found, starting fresh"
                    );
                }
                let store = ProgressStore::new(
                    &country,
                    &request.plan,
                    self.options.plus_prefix,
                    &request.output_path,
                );
                (store, true)
            }
        };

        let layout = partition(request.plan.space_size(), self.options.workers)?;
        let mut tasks = Vec::new();
        for area in &areas {
            let progress = store.ensure_area(area, &layout);
            if progress.ranges.len() != self.options.workers {
                warn!(
                    area_code = %area,
                    ranges = progress.ranges.len(),
                    workers = self.options.workers,
                    "reusing persisted partition layout"
                );
            }
            for (index, range) in progress.ranges.iter().enumerate() {
                if !range.is_complete() {
                    tasks.push(RangeTask {
                        area: area.clone(),
                        index,
                        range: range.range(),
                        next: range.next,
                    });
                }
            }
        }

        let output = SharedOutput::open(
            &request.output_path,
            fresh,
            store,
            &request.progress_path,
        )?;

        info!(
            run_id = %run_id,
            country_code = %country,
            area_codes = areas.len(),
            workers = self.options.workers,
            batch_size = self.options.batch_size,
            pending_ranges = tasks.len(),
            resumed = report.resumed,
            "generation started"
        );

        let outcomes = self.run_pool(&country, request, &output, tasks)?;
        let numbers_written = output.numbers_written()?;
        let (store, bytes_written) = output.into_parts()?;

        let mut fatal = None;
        let mut by_range = BTreeMap::new();
        for outcome in outcomes {
            match outcome.failure {
                Some(RangeFailure::Fatal(ref err)) => {
                    error!(
                        worker = outcome.worker,
                        area_code = %outcome.area,
                        range = outcome.index,
                        error = %err,
                        "fatal output failure"
                    );
                }
                Some(RangeFailure::Worker(ref err)) => {
                    warn!(
                        worker = outcome.worker,
                        area_code = %outcome.area,
                        range = outcome.index,
                        error = %err,
                        "range failed"
                    );
                    report.record_failure(WorkerIssue {
                        area_code: outcome.area.to_string(),
                        range: outcome.index,
                        message: err.to_string(),
                    });
                }
                Some(RangeFailure::Stopped) | None => {}
            }
            by_range.insert(
                (outcome.area.to_string(), outcome.index),
                (outcome.resumed_from, outcome.state, outcome.numbers_written),
            );
            if let Some(RangeFailure::Fatal(err)) = outcome.failure {
                fatal.get_or_insert(err);
            }
        }

        report.areas = build_area_reports(&areas, &store, &by_range);
        report.numbers_written = numbers_written;
        report.bytes_written = bytes_written;
        let elapsed = start.elapsed();
        report.duration_ms = elapsed.as_millis() as u64;
        report.throughput_numbers_per_sec = if elapsed.as_secs_f64() > 0.0 {
            numbers_written as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        if let Some(err) = fatal {
            warn!(run_id = %run_id, error = %err, "generation aborted");
            return Err(err);
        }
        if !report.failures.is_empty() {
            warn!(
                run_id = %run_id,
                failed_ranges = report.failures.len(),
                "generation incomplete"
            );
            return Err(GenerationError::Incomplete(report));
        }

        if store.is_complete() {
            match std::fs::remove_file(&request.progress_path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            run_id = %run_id,
            numbers_written = report.numbers_written,
            bytes_written = report.bytes_written,
            duration_ms = report.duration_ms,
            "generation completed"
        );
        Ok(GenerationResult {
            report,
            progress: store,
        })
    }

    fn run_pool(
        &self,
        country: &CountryCode,
        request: &GenerationRequest,
        output: &SharedOutput,
        tasks: Vec<RangeTask>,
    ) -> Result<Vec<RangeOutcome>, GenerationError> {
        let pool_size = self.options.workers.min(tasks.len());
        let abort = AtomicBool::new(false);
        let ctx = WorkerContext {
            plan: request.plan,
            country,
            options: &self.options,
            output,
            abort: &abort,
        };

        let (task_tx, task_rx) = unbounded();
        for task in tasks {
            task_tx
                .send(task)
                .map_err(|_| GenerationError::Checkpoint("task queue closed".to_string()))?;
        }
        drop(task_tx);

        thread::scope(|scope| -> Result<Vec<RangeOutcome>, GenerationError> {
            let (result_tx, result_rx) = bounded(pool_size.max(1));
            for id in 0..pool_size {
                let tasks = task_rx.clone();
                let results = result_tx.clone();
                let ctx = &ctx;
                thread::Builder::new()
                    .name(format!("phonelist-worker-{id}"))
                    .spawn_scoped(scope, move || worker_loop(id, ctx, tasks, results))?;
            }
            drop(result_tx);

            let mut outcomes = Vec::new();
            for outcome in result_rx {
                if matches!(outcome.failure, Some(RangeFailure::Fatal(_))) {
                    abort.store(true, Ordering::Release);
                }
                outcomes.push(outcome);
            }
            Ok(outcomes)
        })
    }
}

fn worker_loop(
    id: usize,
    ctx: &WorkerContext<'_>,
    tasks: Receiver<RangeTask>,
    results: Sender<RangeOutcome>,
) {
    for task in tasks {
        if ctx.abort.load(Ordering::Acquire) {
            break;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| Worker::new(id, ctx).run(&task)))
            .unwrap_or_else(|panic| RangeOutcome {
                worker: id,
                area: task.area.clone(),
                index: task.index,
                resumed_from: task.resume_offset(),
                state: WorkerState::Aborted,
                numbers_written: 0,
                failure: Some(RangeFailure::Worker(GenerationError::Worker {
                    area_code: task.area.to_string(),
                    range: task.index,
                    message: panic_message(panic),
                })),
            });
        if results.send(outcome).is_err() {
            break;
        }
    }
}

fn parse_area_codes(
    raw: &[String],
    request: &GenerationRequest,
) -> Result<Vec<AreaCode>, CoreError> {
    if raw.is_empty() {
        return Err(CoreError::InvalidConfig(
            "at least one area code is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    let mut areas = Vec::with_capacity(raw.len());
    for value in raw {
        let area = AreaCode::parse(value, &request.plan)?;
        if seen.insert(area.clone()) {
            areas.push(area);
        } else {
            warn!(area_code = %area, "duplicate area code ignored");
        }
    }
    Ok(areas)
}

fn build_area_reports(
    areas: &[AreaCode],
    store: &ProgressStore,
    by_range: &BTreeMap<(String, usize), (u64, WorkerState, u64)>,
) -> Vec<AreaReport> {
    areas
        .iter()
        .filter_map(|area| {
            let progress = store.area(area.as_str())?;
            let ranges: Vec<RangeReport> = progress
                .ranges
                .iter()
                .enumerate()
                .map(|(index, range)| {
                    let key = (area.to_string(), index);
                    let (resumed_from, state, numbers_written) =
                        by_range.get(&key).copied().unwrap_or_else(|| {
                            let state = if range.is_complete() {
                                WorkerState::Completed
                            } else {
                                WorkerState::Idle
                            };
                            (range.resume_offset().min(range.end), state, 0)
                        });
                    RangeReport {
                        index,
                        start: range.start,
                        end: range.end,
                        resumed_from,
                        next: range.next,
                        state,
                        numbers_written,
                    }
                })
                .collect();
            Some(AreaReport {
                area_code: area.to_string(),
                numbers_written: ranges.iter().map(|range| range.numbers_written).sum(),
                complete: progress.is_complete(),
                ranges,
            })
        })
        .collect()
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("worker panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("worker panicked: {message}")
    } else {
        "worker panicked".to_string()
    }
}
