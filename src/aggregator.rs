//! Flight window aggregation.
//!
//! A span of several days is answered by one departures query per 12-hour
//! window. All windows run at once; their results are merged by a single
//! owner as they come in, and the first failure decides the outcome.

use crate::api::FlightSource;
use crate::error::{Error, Result};
use crate::events::{WindowEvent, WindowEvents};
use crate::models::{Flight, IcaoCode};
use crate::span::Span;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct FlightWindowAggregator<S> {
    source: Arc<S>,
}

impl<S> Clone for FlightWindowAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: FlightSource + 'static> FlightWindowAggregator<S> {
    pub fn new(source: S) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<S>) -> Self {
        Self { source }
    }

    /// All flights from `origin` to `destination` departing within `span` of
    /// `anchor`, the origin's local time.
    ///
    /// Flights come back in the order their windows completed. If any window
    /// fails, the first failure observed is returned and everything gathered
    /// so far is discarded. An empty list is a valid answer.
    pub async fn get_flights(
        &self,
        origin: &IcaoCode,
        destination: &IcaoCode,
        span: Span,
        anchor: NaiveDateTime,
    ) -> Result<Vec<Flight>> {
        let windows = span.windows(anchor);
        let expected = windows.len();
        let events = WindowEvents::new();

        for window in windows {
            let source = Arc::clone(&self.source);
            let origin = origin.clone();
            events.spawn(window, async move {
                source.fetch_flights(&origin, window).await
            });
        }

        let mut merge = Merge::new(destination.clone());
        events.drain(|event| merge.absorb(event)).await;
        let result = merge.finish(expected);

        match &result {
            Ok(flights) => info!(
                origin = %origin,
                destination = %destination,
                period = %span,
                windows = expected,
                count = flights.len(),
                "Aggregated flights"
            ),
            Err(e) => warn!(
                origin = %origin,
                destination = %destination,
                period = %span,
                error = %e,
                "Flight aggregation failed"
            ),
        }
        result
    }
}

/// Accumulated state of one aggregation call.
struct Merge {
    destination: IcaoCode,
    flights: Vec<Flight>,
    error: Option<Error>,
    received: usize,
}

impl Merge {
    fn new(destination: IcaoCode) -> Self {
        Self {
            destination,
            flights: Vec::new(),
            error: None,
            received: 0,
        }
    }

    fn absorb(&mut self, event: WindowEvent) {
        self.received += 1;
        match event {
            WindowEvent::Completed { window, flights } => {
                if self.error.is_some() {
                    debug!(window = %window, "Discarding window after earlier failure");
                    return;
                }
                let destination = &self.destination;
                let before = self.flights.len();
                self.flights
                    .extend(flights.into_iter().filter(|f| f.is_bound_for(destination)));
                debug!(
                    window = %window,
                    matched = self.flights.len() - before,
                    "Window completed"
                );
            }
            WindowEvent::Failed { window, error } => {
                warn!(window = %window, error = %error, "Window failed");
                // First error wins.
                if self.error.is_none() {
                    self.error = Some(error);
                }
            }
        }
    }

    fn finish(self, expected: usize) -> Result<Vec<Flight>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.received < expected {
            return Err(Error::Incomplete {
                expected,
                received: self.received,
            });
        }
        Ok(self.flights)
    }
}
