//! Error types for the AeroDataBox client and the flight window aggregator.

use thiserror::Error;

/// Errors reported by [`ApiClient`](crate::api::ApiClient) and
/// [`FlightWindowAggregator`](crate::aggregator::FlightWindowAggregator).
///
/// Empty results are never errors: zero routes or zero flights come back as
/// `Ok` with an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Transport failure, timeout, or a non-success HTTP status.
    #[error("{0}")]
    Network(String),

    /// The server answered successfully but sent no body.
    #[error("No data returned")]
    MissingData,

    /// The body did not match the expected JSON shape. Field-level detail is
    /// logged where the failure happens.
    #[error("Data decoding problem occurred")]
    Decode,

    /// The HTTP client could not be built from the configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// A window task ended without reporting back to the aggregator.
    #[error("Only {received} of {expected} flight windows reported back")]
    Incomplete { expected: usize, received: usize },
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
