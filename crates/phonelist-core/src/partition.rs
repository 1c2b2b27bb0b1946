use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Contiguous slice `[start, end)` of one area code's subscriber space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

impl Range {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `[0, space)` into `workers` contiguous, non-overlapping ranges.
///
/// Every range gets `space / workers` items and the last one also takes the
/// remainder, so the ranges always cover the whole space. With more workers
/// than items the leading ranges are empty.
pub fn partition(space: u64, workers: usize) -> Result<Vec<Range>> {
    if workers == 0 {
        return Err(Error::InvalidConfig(
            "worker count must be at least 1".to_string(),
        ));
    }

    let count = workers as u64;
    let size = space / count;
    let mut ranges = Vec::with_capacity(workers);
    for index in 0..count {
        let start = index * size;
        let end = if index + 1 == count {
            space
        } else {
            start + size
        };
        ranges.push(Range { start, end });
    }
    Ok(ranges)
}
