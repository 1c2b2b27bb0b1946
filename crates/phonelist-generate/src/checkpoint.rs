//! Persisted resume markers.
//!
//! The store records, for every area code, the partition layout used by the
//! run that created it and the first offset of each range that has not been
//! durably written yet, together with the output length those markers cover.
//! It is rewritten atomically after every committed batch, so a crash leaves
//! either the previous or the new markers on disk. Bytes past
//! `output_bytes` were never committed and are cut off on resume.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use phonelist_core::{AreaCode, CountryCode, DialingPlan, Error as CoreError, Range};
use serde::{Deserialize, Serialize};

use crate::atomic::write_json_atomic;
use crate::errors::GenerationError;

/// Format version of the progress file.
pub const PROGRESS_VERSION: u32 = 2;

/// Resume marker for one range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProgress {
    pub start: u64,
    pub end: u64,
    /// First offset not yet durably written. Equal to `end` once finalized.
    pub next: u64,
}

impl RangeProgress {
    pub fn fresh(range: Range) -> Self {
        Self {
            start: range.start,
            end: range.end,
            next: range.start,
        }
    }

    pub fn range(&self) -> Range {
        Range {
            start: self.start,
            end: self.end,
        }
    }

    /// Where a worker picks this range up: `max(start, next)`.
    pub fn resume_offset(&self) -> u64 {
        self.start.max(self.next)
    }

    /// Finalized ranges have `next == end`. A marker past the end is not
    /// treated as done; the worker that picks it up reports it.
    pub fn is_complete(&self) -> bool {
        self.next == self.end
    }

    pub fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.resume_offset())
    }
}

/// Partition layout and markers of one area code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaProgress {
    pub ranges: Vec<RangeProgress>,
}

impl AreaProgress {
    pub fn is_complete(&self) -> bool {
        self.ranges.iter().all(RangeProgress::is_complete)
    }

    pub fn remaining(&self) -> u64 {
        self.ranges.iter().map(RangeProgress::remaining).sum()
    }
}

/// On-disk progress of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStore {
    pub version: u32,
    pub country_code: String,
    pub area_code_digits: usize,
    pub subscriber_digits: usize,
    pub plus_prefix: bool,
    pub output_path: PathBuf,
    /// Length of the output file when the markers were last persisted.
    pub output_bytes: u64,
    pub areas: BTreeMap<String, AreaProgress>,
}

impl ProgressStore {
    pub fn new(
        country: &CountryCode,
        plan: &DialingPlan,
        plus_prefix: bool,
        output_path: &Path,
    ) -> Self {
        Self {
            version: PROGRESS_VERSION,
            country_code: country.to_string(),
            area_code_digits: plan.area_code_digits,
            subscriber_digits: plan.subscriber_digits,
            plus_prefix,
            output_path: output_path.to_path_buf(),
            output_bytes: 0,
            areas: BTreeMap::new(),
        }
    }

    /// Read the store at `path`. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, GenerationError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(GenerationError::Checkpoint(format!(
                    "cannot read {}: {err}",
                    path.display()
                )));
            }
        };
        let store: Self = serde_json::from_str(&contents).map_err(|err| {
            GenerationError::Checkpoint(format!("corrupt progress file {}: {err}", path.display()))
        })?;
        store.validate_layout()?;
        Ok(Some(store))
    }

    pub fn save(&self, path: &Path) -> Result<(), GenerationError> {
        write_json_atomic(path, self).map_err(GenerationError::from)
    }

    pub fn plan(&self) -> DialingPlan {
        DialingPlan {
            area_code_digits: self.area_code_digits,
            subscriber_digits: self.subscriber_digits,
        }
    }

    /// Reject a store written for a different country, plan or line format.
    pub fn check_compatible(
        &self,
        country: &CountryCode,
        plan: &DialingPlan,
        plus_prefix: bool,
    ) -> Result<(), CoreError> {
        if self.country_code != country.as_str() {
            return Err(CoreError::InvalidConfig(format!(
                "progress file belongs to country code {}, not {country}",
                self.country_code
            )));
        }
        if self.plan() != *plan {
            return Err(CoreError::InvalidConfig(format!(
                "progress file uses {}+{} digits, run uses {}+{}",
                self.area_code_digits,
                self.subscriber_digits,
                plan.area_code_digits,
                plan.subscriber_digits
            )));
        }
        if self.plus_prefix != plus_prefix {
            return Err(CoreError::InvalidConfig(
                "progress file was written with a different '+' prefix setting".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the area's layout, creating it from `ranges` when absent.
    pub fn ensure_area(&mut self, area: &AreaCode, ranges: &[Range]) -> &AreaProgress {
        self.areas
            .entry(area.to_string())
            .or_insert_with(|| AreaProgress {
                ranges: ranges.iter().copied().map(RangeProgress::fresh).collect(),
            })
    }

    pub fn area(&self, area: &str) -> Option<&AreaProgress> {
        self.areas.get(area)
    }

    /// Move the marker of one range forward to `next`.
    pub fn record(&mut self, area: &str, index: usize, next: u64) -> Result<(), GenerationError> {
        let range = self
            .areas
            .get_mut(area)
            .and_then(|progress| progress.ranges.get_mut(index))
            .ok_or_else(|| {
                GenerationError::Checkpoint(format!("unknown range {index} for area code {area}"))
            })?;
        if next < range.next || next > range.end {
            return Err(GenerationError::Checkpoint(format!(
                "marker for area code {area} range {index} cannot move from {} to {next}",
                range.next
            )));
        }
        range.next = next;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.areas.values().all(AreaProgress::is_complete)
    }

    pub fn remaining(&self) -> u64 {
        self.areas.values().map(AreaProgress::remaining).sum()
    }

    /// Check that each area's ranges tile the subscriber space.
    fn validate_layout(&self) -> Result<(), GenerationError> {
        if self.version != PROGRESS_VERSION {
            return Err(GenerationError::Checkpoint(format!(
                "unsupported progress file version {}",
                self.version
            )));
        }
        let plan = self.plan();
        plan.validate()
            .map_err(|err| GenerationError::Checkpoint(err.to_string()))?;
        let space = plan.space_size();

        for (area, progress) in &self.areas {
            let mut cursor = 0;
            for range in &progress.ranges {
                if range.start != cursor || range.end < range.start {
                    return Err(GenerationError::Checkpoint(format!(
                        "ranges for area code {area} are not contiguous at offset {cursor}"
                    )));
                }
                cursor = range.end;
            }
            if cursor != space {
                return Err(GenerationError::Checkpoint(format!(
                    "ranges for area code {area} end at {cursor}, expected {space}"
                )));
            }
        }
        Ok(())
    }
}
