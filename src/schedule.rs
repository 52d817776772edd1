//! Grouping flights into day sections for display.

use crate::models::Flight;
use chrono::{Datelike, Month, NaiveDateTime};
use std::collections::BTreeMap;

/// Calendar day of a departure, year ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey {
    pub month: u32,
    pub day: u32,
}

impl DayKey {
    pub fn of(time: NaiveDateTime) -> Self {
        Self {
            month: time.month(),
            day: time.day(),
        }
    }

    /// e.g. "March 2".
    pub fn heading(&self) -> String {
        let month = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("?");
        format!("{} {}", month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DaySection {
    pub key: DayKey,
    pub flights: Vec<Flight>,
}

/// Buckets `flights` by departure day, earliest day first. Flights keep their
/// relative order inside a bucket.
pub fn group_by_day(flights: &[Flight]) -> Vec<DaySection> {
    let mut buckets: BTreeMap<DayKey, Vec<Flight>> = BTreeMap::new();
    for flight in flights {
        buckets
            .entry(DayKey::of(flight.departure_time))
            .or_default()
            .push(flight.clone());
    }

    buckets
        .into_iter()
        .map(|(key, flights)| DaySection { key, flights })
        .collect()
}
