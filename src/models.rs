use chrono::{NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder used for text fields the API left out.
pub const MISSING: &str = "None";

/// Time format of scheduled times in route and flight payloads.
pub const PAYLOAD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Time format of the airport local time payload.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parses the first 16 characters of `raw` with `format`.
///
/// The API appends seconds and UTC offsets to its timestamps; those are
/// dropped and the remaining wall-clock time is taken as-is.
pub fn parse_truncated(raw: &str, format: &str) -> Option<NaiveDateTime> {
    let prefix = raw.get(..16)?;
    NaiveDateTime::parse_from_str(prefix, format).ok()
}

fn parse_field<E: de::Error>(raw: &str, format: &str) -> Result<NaiveDateTime, E> {
    parse_truncated(raw, format)
        .ok_or_else(|| E::custom(format!("invalid timestamp {:?}, expected {}", raw, format)))
}

fn payload_time<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_field(&raw, PAYLOAD_TIME_FORMAT))
        .transpose()
}

fn local_time<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_field(&raw, LOCAL_TIME_FORMAT)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid ICAO code, expected four letters")]
pub struct InvalidIcao(pub String);

/// A four letter airport identifier, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IcaoCode(String);

impl IcaoCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for IcaoCode {
    type Err = InvalidIcao;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 4 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(InvalidIcao(s.to_string()))
        }
    }
}

impl fmt::Display for IcaoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IcaoCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What to substitute when the API leaves out an optional field.
///
/// Missing text becomes [`MISSING`]; missing scheduled times become the moment
/// the response was fetched. The time substitution is an approximation, it
/// keeps the flight visible instead of dropping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallbacks {
    pub fetched_at: NaiveDateTime,
}

impl Fallbacks {
    pub fn at(fetched_at: NaiveDateTime) -> Self {
        Self { fetched_at }
    }

    pub fn now() -> Self {
        Self::at(Utc::now().naive_utc())
    }

    pub fn text(value: Option<String>) -> String {
        value.unwrap_or_else(|| MISSING.to_string())
    }

    pub fn time(&self, value: Option<NaiveDateTime>) -> NaiveDateTime {
        value.unwrap_or(self.fetched_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesResponse {
    pub routes: Vec<RouteRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub destination: DestinationRecord,
    pub average_daily_flights: f64,
    #[serde(default)]
    pub operators: Vec<OperatorRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRecord {
    pub icao: Option<String>,
    pub iata: Option<String>,
    pub name: String,
    pub municipality_name: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorRecord {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeparturesResponse {
    pub departures: Vec<FlightRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub departure: MovementRecord,
    pub arrival: MovementRecord,
    pub number: String,
    pub airline: Option<AirlineRecord>,
}

/// One end of a flight leg.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRecord {
    pub airport: Option<AirportRecord>,
    #[serde(default, deserialize_with = "payload_time")]
    pub scheduled_time_local: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirportRecord {
    pub icao: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirlineRecord {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTimeResponse {
    pub utc_time: String,
    #[serde(deserialize_with = "local_time")]
    pub local_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub origin_icao: String,
    pub destination_icao: String,
    pub destination_name: String,
    pub average_daily_flights: f64,
    pub operators: Vec<String>,
}

impl Route {
    pub fn from_record(origin: &IcaoCode, record: RouteRecord) -> Self {
        let destination = record.destination;
        let place = destination.municipality_name.unwrap_or(destination.name);
        let country = Fallbacks::text(destination.country_code);

        Self {
            origin_icao: origin.to_string(),
            destination_icao: Fallbacks::text(destination.icao),
            destination_name: format!("{}, {}", place, country),
            average_daily_flights: record.average_daily_flights,
            operators: record.operators.into_iter().map(|o| o.name).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flight {
    pub airline: String,
    pub number: String,
    pub origin_icao: String,
    pub destination_icao: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
}

impl Flight {
    pub fn from_record(origin: &IcaoCode, record: FlightRecord, fallbacks: &Fallbacks) -> Self {
        let destination = record.arrival.airport.and_then(|a| a.icao);

        Self {
            airline: Fallbacks::text(record.airline.map(|a| a.name)),
            number: record.number,
            origin_icao: origin.to_string(),
            destination_icao: Fallbacks::text(destination),
            departure_time: fallbacks.time(record.departure.scheduled_time_local),
            arrival_time: fallbacks.time(record.arrival.scheduled_time_local),
        }
    }

    /// True when the flight lands at `destination`. Flights whose arrival
    /// airport was unknown never match.
    pub fn is_bound_for(&self, destination: &IcaoCode) -> bool {
        self.destination_icao != MISSING && self.destination_icao == destination.as_str()
    }
}
