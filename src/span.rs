//! Selectable time spans and the 12-hour query windows they expand into.
//!
//! The departures endpoint only answers for a bounded time range per call, so
//! a span of several days is covered by consecutive windows that start at the
//! origin airport's local time.

use chrono::{Duration, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a single query window in hours.
pub const WINDOW_HOURS: i64 = 12;

/// How far ahead the flight board looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Span {
    #[default]
    OneDay,
    ThreeDays,
    SevenDays,
}

impl Span {
    pub fn days(self) -> usize {
        match self {
            Span::OneDay => 1,
            Span::ThreeDays => 3,
            Span::SevenDays => 7,
        }
    }

    /// Number of 12-hour windows needed to cover the span.
    pub fn window_count(self) -> usize {
        self.days() * 2
    }

    /// The consecutive windows covering this span, starting at `anchor`.
    pub fn windows(self, anchor: NaiveDateTime) -> Vec<Window> {
        (0..self.window_count()).map(|i| Window::nth(anchor, i)).collect()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::OneDay => f.write_str("1 day"),
            Span::ThreeDays => f.write_str("3 days"),
            Span::SevenDays => f.write_str("7 days"),
        }
    }
}

/// A half-open `[start, end)` interval of airport local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub index: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    /// The `index`-th window after `anchor`.
    pub fn nth(anchor: NaiveDateTime, index: usize) -> Self {
        let offset = WINDOW_HOURS * index as i64;
        Self {
            index,
            start: anchor + Duration::hours(offset),
            end: anchor + Duration::hours(offset + WINDOW_HOURS),
        }
    }

    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time < self.end
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}, {})",
            self.index,
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}
