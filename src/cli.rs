use crate::span::Span;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Find where you can fly from an airport, and when", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "config.toml")]
    pub config: std::path::PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the destinations served from an airport.
    Routes {
        /// ICAO code of the origin airport, e.g. EGLL
        origin: String,
    },
    /// List upcoming flights on one route, grouped by day.
    Flights {
        origin: String,
        destination: String,

        /// Defaults to `search.default_span` from the config file
        #[arg(long, value_enum)]
        span: Option<Span>,
    },
}
