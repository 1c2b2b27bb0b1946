use std::sync::atomic::{AtomicBool, Ordering};

use phonelist_core::{AreaCode, CountryCode, DialingPlan, Enumerator, Range};
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::errors::GenerationError;
use crate::model::GenerateOptions;
use crate::output::SharedOutput;

/// Lifecycle of a worker over one range.
///
/// `Idle → Enumerating → (Flushing ⇄ Enumerating) → Completed`, with
/// `Aborted` reachable from `Enumerating` or `Flushing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Enumerating,
    Flushing,
    Completed,
    Aborted,
}

impl WorkerState {
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Idle, Enumerating)
                | (Enumerating, Flushing)
                | (Flushing, Enumerating)
                | (Enumerating, Completed)
                | (Enumerating, Aborted)
                | (Flushing, Aborted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerState::Completed | WorkerState::Aborted)
    }
}

/// One range of one area code, queued for a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTask {
    pub area: AreaCode,
    pub index: usize,
    pub range: Range,
    /// Persisted marker; the worker starts at `max(range.start, next)`.
    pub next: u64,
}

impl RangeTask {
    pub fn resume_offset(&self) -> u64 {
        self.range.start.max(self.next)
    }
}

/// Shared, read-only inputs every worker needs.
pub struct WorkerContext<'a> {
    pub plan: DialingPlan,
    pub country: &'a CountryCode,
    pub options: &'a GenerateOptions,
    pub output: &'a SharedOutput,
    pub abort: &'a AtomicBool,
}

/// How a range ended.
#[derive(Debug)]
pub enum RangeFailure {
    /// Destination or store failure; the whole run stops.
    Fatal(GenerationError),
    /// Only this range failed.
    Worker(GenerationError),
    /// Another worker hit a fatal error.
    Stopped,
}

/// Result of one range, sent back to the coordinator.
#[derive(Debug)]
pub struct RangeOutcome {
    pub worker: usize,
    pub area: AreaCode,
    pub index: usize,
    pub resumed_from: u64,
    pub state: WorkerState,
    pub numbers_written: u64,
    pub failure: Option<RangeFailure>,
}

pub(crate) struct Worker<'a> {
    id: usize,
    state: WorkerState,
    ctx: &'a WorkerContext<'a>,
}

impl<'a> Worker<'a> {
    pub(crate) fn new(id: usize, ctx: &'a WorkerContext<'a>) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            ctx,
        }
    }

    /// Enumerate `task` to the shared output, committing every
    /// `batch_size` numbers.
    pub(crate) fn run(mut self, task: &RangeTask) -> RangeOutcome {
        let resumed_from = task.resume_offset();
        let mut written = 0;
        let failure = match self.drive(task, &mut written) {
            Ok(()) => None,
            Err(failure) => {
                self.transition(WorkerState::Aborted);
                Some(failure)
            }
        };

        RangeOutcome {
            worker: self.id,
            area: task.area.clone(),
            index: task.index,
            resumed_from,
            state: self.state,
            numbers_written: written,
            failure,
        }
    }

    fn drive(&mut self, task: &RangeTask, written: &mut u64) -> Result<(), RangeFailure> {
        self.transition(WorkerState::Enumerating);
        let mut enumerator = Enumerator::range(
            &self.ctx.plan,
            self.ctx.country,
            &task.area,
            task.resume_offset(),
            task.range.end,
        )
        .map_err(|err| {
            RangeFailure::Worker(GenerationError::Worker {
                area_code: task.area.to_string(),
                range: task.index,
                message: err.to_string(),
            })
        })?
        .with_plus_prefix(self.ctx.options.plus_prefix);

        let batch_size = self.ctx.options.batch_size;
        let mut buf = Vec::with_capacity(batch_size * enumerator.line_len());
        loop {
            if self.ctx.abort.load(Ordering::Acquire) {
                return Err(RangeFailure::Stopped);
            }

            buf.clear();
            let count = enumerator.fill(&mut buf, batch_size);
            if count == 0 {
                break;
            }

            self.transition(WorkerState::Flushing);
            self.ctx
                .output
                .commit(
                    task.area.as_str(),
                    task.index,
                    &buf,
                    count as u64,
                    enumerator.position(),
                )
                .map_err(|err| {
                    self.ctx.abort.store(true, Ordering::Release);
                    RangeFailure::Fatal(err)
                })?;
            *written += count as u64;
            self.transition(WorkerState::Enumerating);
        }

        if task.next != task.range.end && enumerator.position() == task.next.max(task.range.start) {
            // Nothing left to write, but the marker still sits before `end`.
            self.transition(WorkerState::Flushing);
            self.ctx
                .output
                .commit(task.area.as_str(), task.index, &[], 0, task.range.end)
                .map_err(|err| {
                    self.ctx.abort.store(true, Ordering::Release);
                    RangeFailure::Fatal(err)
                })?;
            self.transition(WorkerState::Enumerating);
        }

        self.transition(WorkerState::Completed);
        info!(
            worker = self.id,
            area_code = %task.area,
            range = task.index,
            numbers_written = *written,
            "range completed"
        );
        Ok(())
    }

    fn transition(&mut self, next: WorkerState) {
        if !self.state.can_transition_to(next) {
            warn!(worker = self.id, from = ?self.state, to = ?next, "unexpected worker transition");
        }
        trace!(worker = self.id, from = ?self.state, to = ?next, "worker transition");
        self.state = next;
    }
}
