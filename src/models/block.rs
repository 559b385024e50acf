//! Time block model.
//!
//! Blocks partition the academic year into contiguous assignment periods
//! (typically 4 weeks). Immutable once created.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A scheduling time block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Unique block identifier.
    pub id: String,
    /// First day of the block.
    pub start: NaiveDate,
    /// Last day of the block (inclusive).
    pub end: NaiveDate,
    /// Academic period tag (e.g., "2025-2026").
    pub period: String,
}

impl Block {
    /// Creates a new block over an inclusive date range.
    pub fn new(id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            period: String::new(),
        }
    }

    /// Sets the academic period tag.
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    /// Whether this block intersects the given inclusive date range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && start <= self.end
    }

    /// Whether the block contains the given date.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the block.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_block_overlap() {
        let b = Block::new("B01", d(2025, 7, 1), d(2025, 7, 28));

        assert!(b.overlaps(d(2025, 7, 10), d(2025, 7, 15)));
        assert!(b.overlaps(d(2025, 6, 20), d(2025, 7, 1))); // Touches first day
        assert!(b.overlaps(d(2025, 7, 28), d(2025, 8, 5))); // Touches last day
        assert!(!b.overlaps(d(2025, 7, 29), d(2025, 8, 25)));
        assert!(!b.overlaps(d(2025, 6, 1), d(2025, 6, 30)));
    }

    #[test]
    fn test_block_contains_and_days() {
        let b = Block::new("B01", d(2025, 7, 1), d(2025, 7, 28)).with_period("2025-2026");
        assert!(b.contains(d(2025, 7, 1)));
        assert!(b.contains(d(2025, 7, 28)));
        assert!(!b.contains(d(2025, 6, 30)));
        assert_eq!(b.days(), 28);
        assert_eq!(b.period, "2025-2026");
    }
}
