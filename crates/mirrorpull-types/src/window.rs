//! Time range partitioning into windows and snapshot points.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::{Step, TimeFilter, WindowError};

/// A half-open time range `[start, end)` split into fixed-size steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRange {
    /// Start instant (inclusive).
    pub start: DateTime<Utc>,
    /// End instant (exclusive).
    pub end: DateTime<Utc>,
    /// Step size.
    pub step: Step,
}

impl WindowRange {
    /// Creates a new window range, validating that start < end.
    ///
    /// # Errors
    ///
    /// Returns an error if start >= end.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Step) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::InvalidRange { start, end });
        }
        Ok(Self { start, end, step })
    }

    /// Creates a window range from midnight of `start` to midnight of `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start >= end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate, step: Step) -> Result<Self, WindowError> {
        Self::new(midnight(start), midnight(end), step)
    }

    /// Returns an iterator over consecutive windows. The last window is
    /// clipped to the range end.
    pub fn windows(&self) -> WindowIterator {
        WindowIterator {
            current: self.start.timestamp(),
            end: self.end.timestamp(),
            step: self.step.seconds(),
        }
    }

    /// Returns an iterator over snapshot instants `start, start + step, ...`
    /// strictly before the range end.
    pub fn points(&self) -> PointIterator {
        PointIterator {
            current: self.start.timestamp(),
            end: self.end.timestamp(),
            step: self.step.seconds(),
        }
    }

    /// Returns the number of windows in the range.
    #[must_use]
    pub fn total_windows(&self) -> usize {
        steps_between(self.start.timestamp(), self.end.timestamp(), self.step.seconds())
    }
}

impl std::fmt::Display for WindowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {} every {}", self.start, self.end, self.step)
    }
}

/// One window `[start, end)` in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    /// Start (inclusive), unix seconds.
    pub start: i64,
    /// End (exclusive), unix seconds.
    pub end: i64,
}

impl TimeWindow {
    /// Returns the timestamp filters selecting exactly this window.
    #[must_use]
    pub const fn filters(&self) -> [TimeFilter; 2] {
        [TimeFilter::Gte(self.start), TimeFilter::Lt(self.end)]
    }

    /// Returns a label suitable for file names (`<start>-<end>`).
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Iterator over the windows of a [`WindowRange`].
#[derive(Debug, Clone)]
pub struct WindowIterator {
    current: i64,
    end: i64,
    step: i64,
}

impl Iterator for WindowIterator {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.end {
            return None;
        }
        let start = self.current;
        let end = start.saturating_add(self.step).min(self.end);
        self.current = end;
        Some(TimeWindow { start, end })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = steps_between(self.current, self.end, self.step);
        (n, Some(n))
    }
}

impl ExactSizeIterator for WindowIterator {}

/// Iterator over the snapshot instants of a [`WindowRange`].
#[derive(Debug, Clone)]
pub struct PointIterator {
    current: i64,
    end: i64,
    step: i64,
}

impl Iterator for PointIterator {
    type Item = i64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.end {
            return None;
        }
        let point = self.current;
        self.current = self.current.saturating_add(self.step);
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = steps_between(self.current, self.end, self.step);
        (n, Some(n))
    }
}

impl ExactSizeIterator for PointIterator {}

fn steps_between(start: i64, end: i64, step: i64) -> usize {
    if start >= end || step <= 0 {
        return 0;
    }
    let span = end - start;
    usize::try_from((span + step - 1) / step).unwrap_or(usize::MAX)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
