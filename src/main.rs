use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use tracing::info;
use where_to_fly::{
    aggregator::FlightWindowAggregator,
    api::ApiClient,
    app::{FlightBoard, Outcome, RouteSearch},
    cli::{Cli, Command},
    config::Config,
    logging,
    models::IcaoCode,
    span::Span,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = Config::load(&cli.config);
    let _log_guard = logging::initialize_logging(&config.logging.directory);
    info!(config = %cli.config.display(), "Starting");

    let client = ApiClient::new(&config.api)?;

    match cli.command {
        Command::Routes { origin } => show_routes(&client, &origin).await,
        Command::Flights {
            origin,
            destination,
            span,
        } => {
            let span = span.unwrap_or(config.search.default_span);
            show_flights(client, &origin, &destination, span).await
        }
    }
}

async fn show_routes(client: &ApiClient, input: &str) -> Result<()> {
    let mut search = RouteSearch::new();
    let origin = search.submit(input)?;
    search.apply(client.fetch_routes(&origin).await);

    match search.routes {
        Outcome::Ready(routes) => {
            println!("Routes from {}", origin);
            for route in routes {
                println!(
                    "  {:<36} {:<4}  ~ {} flights daily",
                    route.destination_name, route.destination_icao, route.average_daily_flights
                );
            }
            Ok(())
        }
        Outcome::Empty(message) => {
            println!("{}", message);
            Ok(())
        }
        Outcome::Failed(message) => Err(eyre!("{}", message)),
        Outcome::Idle | Outcome::Loading => Ok(()),
    }
}

async fn show_flights(client: ApiClient, origin: &str, destination: &str, span: Span) -> Result<()> {
    let origin: IcaoCode = origin.parse()?;
    let destination: IcaoCode = destination.parse()?;
    let mut board = FlightBoard::new(origin.clone(), destination.clone(), span);

    // Every window is anchored on this, nothing else can start without it
    if board.set_local_time(client.fetch_local_time(&origin).await) {
        if let Some(anchor) = board.anchor {
            println!("{} local time: {}", origin, anchor.format("%b %-d, %H:%M"));
        }
    }

    if let Some(ticket) = board.request(span) {
        let aggregator = FlightWindowAggregator::new(client);
        let result = aggregator
            .get_flights(&origin, &destination, ticket.span, ticket.anchor)
            .await;
        board.apply(ticket, result);
    }

    render_board(&board)
}

fn render_board(board: &FlightBoard) -> Result<()> {
    match &board.sections {
        Outcome::Ready(sections) => {
            println!("{} → {}, next {}", board.origin, board.destination, board.span);
            for section in sections {
                println!();
                println!("{}", section.key.heading());
                for flight in &section.flights {
                    println!(
                        "  {}  {:<24} {:<8} {} → {}  {}",
                        flight.departure_time.format("%H:%M"),
                        flight.airline,
                        flight.number,
                        flight.origin_icao,
                        flight.destination_icao,
                        flight.arrival_time.format("%H:%M"),
                    );
                }
            }
            Ok(())
        }
        Outcome::Empty(message) => {
            println!("{}", message);
            Ok(())
        }
        Outcome::Failed(message) => Err(eyre!("{}", message)),
        Outcome::Idle | Outcome::Loading => Ok(()),
    }
}
