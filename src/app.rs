use crate::error::Result;
use crate::models::{Flight, IcaoCode, InvalidIcao, Route};
use crate::schedule::{group_by_day, DaySection};
use crate::span::Span;
use chrono::NaiveDateTime;
use tracing::{debug, warn};

pub const GENERIC_ERROR: &str = "An error occurred while processing your request";
pub const NO_ROUTES: &str = "No data for this ICAO code";
pub const NO_FLIGHTS: &str = "No data for this time period";
pub const LOCAL_TIME_ERROR: &str =
    "Error occurred attempting to get the local time. Please, try again later";

/// What a screen shows for its latest request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Outcome<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Empty(&'static str),
    Failed(&'static str),
}

// Route search: one origin code in, destinations out
#[derive(Debug, Default)]
pub struct RouteSearch {
    pub origin: Option<IcaoCode>,
    pub routes: Outcome<Vec<Route>>,
}

impl RouteSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates user input. Nothing changes when the code is rejected.
    pub fn submit(&mut self, input: &str) -> std::result::Result<IcaoCode, InvalidIcao> {
        let origin: IcaoCode = input.parse()?;
        self.origin = Some(origin.clone());
        self.routes = Outcome::Loading;
        Ok(origin)
    }

    pub fn apply(&mut self, result: Result<Vec<Route>>) {
        self.routes = match result {
            Ok(routes) if routes.is_empty() => Outcome::Empty(NO_ROUTES),
            Ok(mut routes) => {
                routes.sort_by(|a, b| {
                    a.destination_name
                        .cmp(&b.destination_name)
                        .then_with(|| a.destination_icao.cmp(&b.destination_icao))
                });
                Outcome::Ready(routes)
            }
            Err(e) => {
                warn!(error = %e, "Route search failed");
                Outcome::Failed(GENERIC_ERROR)
            }
        };
    }
}

/// Identifies one flight request so late answers to a superseded one can be
/// told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    pub span: Span,
    pub anchor: NaiveDateTime,
}

// Flight board: one route, a fixed local time anchor, a selectable span
#[derive(Debug)]
pub struct FlightBoard {
    pub origin: IcaoCode,
    pub destination: IcaoCode,
    pub span: Span,
    pub anchor: Option<NaiveDateTime>,
    pub sections: Outcome<Vec<DaySection>>,
    generation: u64,
}

impl FlightBoard {
    pub fn new(origin: IcaoCode, destination: IcaoCode, span: Span) -> Self {
        Self {
            origin,
            destination,
            span,
            anchor: None,
            sections: Outcome::Loading,
            generation: 0,
        }
    }

    /// Records the origin's local time. The anchor is kept for the rest of
    /// the visit; later calls don't move it.
    pub fn set_local_time(&mut self, result: Result<NaiveDateTime>) -> bool {
        if self.anchor.is_some() {
            return true;
        }
        match result {
            Ok(local) => {
                self.anchor = Some(local);
                true
            }
            Err(e) => {
                warn!(icao = %self.origin, error = %e, "No local time, flight board blocked");
                self.sections = Outcome::Failed(LOCAL_TIME_ERROR);
                false
            }
        }
    }

    /// Starts a request for `span`, superseding any request still running.
    /// Returns `None` while there is no local time to anchor windows on.
    pub fn request(&mut self, span: Span) -> Option<Ticket> {
        let Some(anchor) = self.anchor else {
            self.sections = Outcome::Failed(LOCAL_TIME_ERROR);
            return None;
        };

        self.span = span;
        self.generation += 1;
        self.sections = Outcome::Loading;
        Some(Ticket {
            generation: self.generation,
            span,
            anchor,
        })
    }

    /// Applies the answer for `ticket`. Answers to superseded tickets are
    /// dropped and `false` is returned.
    pub fn apply(&mut self, ticket: Ticket, result: Result<Vec<Flight>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                "Ignoring superseded flight request"
            );
            return false;
        }

        self.sections = match result {
            Ok(flights) if flights.is_empty() => Outcome::Empty(NO_FLIGHTS),
            Ok(flights) => Outcome::Ready(group_by_day(&flights)),
            Err(e) => {
                warn!(error = %e, "Flight request failed");
                Outcome::Failed(GENERIC_ERROR)
            }
        };
        true
    }
}
