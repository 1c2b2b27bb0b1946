use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{AreaCode, CountryCode, DialingPlan};

/// One fully formed number: country code, area code and subscriber digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateNumber {
    prefix: Arc<str>,
    subscriber: u64,
    width: usize,
}

impl CandidateNumber {
    /// Offset of this number inside its area code's subscriber space.
    pub fn subscriber(&self) -> u64 {
        self.subscriber
    }

    /// Append the formatted number and a trailing newline to `buf`.
    pub fn write_line(&self, buf: &mut Vec<u8>) {
        write_formatted(buf, &self.prefix, self.subscriber, self.width);
    }
}

impl fmt::Display for CandidateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.prefix,
            self.subscriber,
            width = self.width
        )
    }
}

/// Lazy, restartable sequence of candidates for one area code.
///
/// Candidates come out in ascending subscriber order over `[start, end)`.
/// Building an enumerator at any offset costs the same as building it at
/// zero: nothing before the offset is produced.
#[derive(Debug, Clone)]
pub struct Enumerator {
    prefix: Arc<str>,
    width: usize,
    next: u64,
    end: u64,
}

impl Enumerator {
    /// Enumerate the whole subscriber space of `area`.
    pub fn new(plan: &DialingPlan, country: &CountryCode, area: &AreaCode) -> Result<Self> {
        Self::range(plan, country, area, 0, plan.space_size())
    }

    /// Enumerate from `offset` to the end of the space.
    pub fn starting_at(
        plan: &DialingPlan,
        country: &CountryCode,
        area: &AreaCode,
        offset: u64,
    ) -> Result<Self> {
        Self::range(plan, country, area, offset, plan.space_size())
    }

    /// Enumerate the sub-range `[start, end)` of the space.
    pub fn range(
        plan: &DialingPlan,
        country: &CountryCode,
        area: &AreaCode,
        start: u64,
        end: u64,
    ) -> Result<Self> {
        plan.validate()?;
        if area.as_str().len() != plan.area_code_digits {
            return Err(Error::InvalidConfig(format!(
                "area code {area} does not match the configured length {}",
                plan.area_code_digits
            )));
        }
        let space = plan.space_size();
        if start > end || end > space {
            return Err(Error::InvalidConfig(format!(
                "range {start}..{end} is outside the subscriber space 0..{space}"
            )));
        }

        Ok(Self {
            prefix: Arc::from(format!("{country}{area}")),
            width: plan.subscriber_digits,
            next: start,
            end,
        })
    }

    /// Prefix every formatted number with `+`.
    pub fn with_plus_prefix(mut self, enabled: bool) -> Self {
        let bare = self.prefix.trim_start_matches('+');
        self.prefix = if enabled {
            Arc::from(format!("+{bare}"))
        } else {
            Arc::from(bare)
        };
        self
    }

    /// Offset of the next candidate to be produced.
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Bytes of one formatted line, newline included.
    pub fn line_len(&self) -> usize {
        self.prefix.len() + self.width + 1
    }

    /// Write up to `max` formatted lines into `buf`, returning how many were
    /// written. Returns 0 once the range is exhausted.
    pub fn fill(&mut self, buf: &mut Vec<u8>, max: usize) -> usize {
        let count = (self.end - self.next).min(max as u64) as usize;
        buf.reserve(count * self.line_len());
        for subscriber in self.next..self.next + count as u64 {
            write_formatted(buf, &self.prefix, subscriber, self.width);
        }
        self.next += count as u64;
        count
    }
}

impl Iterator for Enumerator {
    type Item = CandidateNumber;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let subscriber = self.next;
        self.next += 1;
        Some(CandidateNumber {
            prefix: Arc::clone(&self.prefix),
            subscriber,
            width: self.width,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Enumerator {}

impl FusedIterator for Enumerator {}

fn write_formatted(buf: &mut Vec<u8>, prefix: &str, subscriber: u64, width: usize) {
    buf.extend_from_slice(prefix.as_bytes());
    let start = buf.len();
    buf.resize(start + width, b'0');
    let mut value = subscriber;
    for slot in buf[start..].iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
    buf.push(b'\n');
}
