//! Flight routes and schedules between airports, from the AeroDataBox API.
//!
//! [`api::ApiClient`] talks to the three endpoints the app needs.
//! [`aggregator::FlightWindowAggregator`] turns a multi-day span into
//! concurrent 12-hour departure queries and merges them.

pub mod aggregator;
pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod schedule;
pub mod span;

pub use error::{Error, Result};
