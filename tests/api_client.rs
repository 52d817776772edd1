//! Runs the real client against an in-process HTTP stub.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use where_to_fly::aggregator::FlightWindowAggregator;
use where_to_fly::api::{ApiClient, FlightSource, DEPARTURE_FILTERS};
use where_to_fly::config::ApiConfig;
use where_to_fly::models::{IcaoCode, MISSING};
use where_to_fly::span::{Span, Window};
use where_to_fly::Error;

const ROUTES: &str = r#"{
    "routes": [
        {
            "destination": {
                "icao": "LFPG", "iata": "CDG", "name": "Paris Charles de Gaulle",
                "municipalityName": "Paris", "countryCode": "FR"
            },
            "averageDailyFlights": 21.5,
            "operators": [{"name": "Air France"}]
        },
        {
            "destination": {"icao": "EDDF", "name": "Frankfurt-am-Main", "countryCode": "DE"},
            "averageDailyFlights": 14.0,
            "operators": []
        }
    ]
}"#;

const DEPARTURES: &str = r#"{
    "departures": [
        {
            "departure": {"scheduledTimeLocal": "2024-03-01 09:10+00:00", "quality": ["Basic"]},
            "arrival": {
                "airport": {"icao": "EDDF", "iata": "FRA", "name": "Frankfurt-am-Main"},
                "scheduledTimeLocal": "2024-03-01 11:55+01:00",
                "quality": ["Basic"]
            },
            "number": "LH 901",
            "status": "Expected",
            "codeshareStatus": "IsOperator",
            "isCargo": false,
            "airline": {"name": "Lufthansa"}
        },
        {
            "departure": {"scheduledTimeLocal": "2024-03-01 10:00+00:00"},
            "arrival": {"airport": {"icao": "LFPG", "name": "Paris"}},
            "number": "AF 1081",
            "isCargo": false,
            "airline": {"name": "Air France"}
        },
        {
            "departure": {"scheduledTimeLocal": "2024-03-01 11:00+00:00"},
            "arrival": {"airport": {"name": "Somewhere"}},
            "number": "ZZ 9",
            "isCargo": false
        }
    ]
}"#;

const LOCAL_TIME: &str = r#"{"utcTime": "2024-03-01T07:00Z", "localTime": "2024-03-01T08:00+01:00"}"#;

struct Reply {
    status: u16,
    body: String,
    cache_control: Option<&'static str>,
}

impl Reply {
    fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            cache_control: None,
        }
    }

    fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            cache_control: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    headers: HashMap<String, String>,
}

type Responder = Arc<dyn Fn(&str) -> Reply + Send + Sync>;

struct Stub {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    async fn start(responder: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Self {
        let responder: Responder = Arc::new(responder);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let responder = Arc::clone(&responder);
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 4096];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&buf).to_string();
                    let mut lines = head.split("\r\n");
                    let path = lines
                        .next()
                        .and_then(|line| line.split(' ').nth(1))
                        .unwrap_or_default()
                        .to_string();
                    let headers = lines
                        .take_while(|line| !line.is_empty())
                        .filter_map(|line| line.split_once(':'))
                        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
                        .collect();
                    recorded.lock().unwrap().push(Recorded {
                        path: path.clone(),
                        headers,
                    });

                    let reply = responder(&path);
                    let cache = reply
                        .cache_control
                        .map(|v| format!("Cache-Control: {}\r\n", v))
                        .unwrap_or_default();
                    let response = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
                        reply.status,
                        reply.body.len(),
                        cache,
                        reply.body
                    );
                    socket.write_all(response.as_bytes()).await.ok();
                    socket.shutdown().await.ok();
                });
            }
        });

        Self { base_url, requests }
    }

    fn config(&self, cache_responses: bool) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            host: "aerodatabox.p.rapidapi.com".to_string(),
            key: "test-key".to_string(),
            timeout_seconds: 5,
            cache_responses,
        }
    }

    fn client(&self, cache_responses: bool) -> ApiClient {
        ApiClient::with_builder(&self.config(cache_responses), reqwest::Client::builder().no_proxy())
            .unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn code(s: &str) -> IcaoCode {
    s.parse().unwrap()
}

fn at(d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

#[tokio::test]
async fn test_fetch_routes_decodes_and_authenticates() {
    let stub = Stub::start(|_| Reply::ok(ROUTES)).await;
    let routes = stub.client(false).fetch_routes(&code("EGLL")).await.unwrap();

    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].origin_icao, "EGLL");
    assert_eq!(routes[0].destination_icao, "LFPG");
    assert_eq!(routes[0].destination_name, "Paris, FR");
    assert_eq!(routes[0].average_daily_flights, 21.5);
    assert_eq!(routes[0].operators, vec!["Air France"]);
    assert_eq!(routes[1].destination_name, "Frankfurt-am-Main, DE");

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/airports/icao/EGLL/stats/routes/daily");
    assert_eq!(requests[0].headers["x-rapidapi-host"], "aerodatabox.p.rapidapi.com");
    assert_eq!(requests[0].headers["x-rapidapi-key"], "test-key");
}

#[tokio::test]
async fn test_fetch_routes_is_idempotent() {
    let stub = Stub::start(|_| Reply::ok(ROUTES)).await;
    let client = stub.client(false);

    let first = client.fetch_routes(&code("EGLL")).await.unwrap();
    let second = client.fetch_routes(&code("EGLL")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn test_cacheable_responses_are_reused() {
    let stub = Stub::start(|_| Reply {
        cache_control: Some("public, max-age=600"),
        ..Reply::ok(ROUTES)
    })
    .await;
    let client = stub.client(true);

    let first = client.fetch_routes(&code("EGLL")).await.unwrap();
    let second = client.fetch_routes(&code("EGLL")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn test_empty_route_list_is_not_an_error() {
    let stub = Stub::start(|_| Reply::ok(r#"{"routes": []}"#)).await;
    assert!(stub.client(false).fetch_routes(&code("EGLL")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_local_time() {
    let stub = Stub::start(|_| Reply::ok(LOCAL_TIME)).await;
    let local = stub.client(false).fetch_local_time(&code("EGLL")).await.unwrap();

    assert_eq!(local, at(1, 8, 0));
    assert_eq!(stub.requests()[0].path, "/airports/icao/EGLL/time/local");
}

#[tokio::test]
async fn test_fetch_flights_for_a_window() {
    let stub = Stub::start(|_| Reply::ok(DEPARTURES)).await;
    let window = Window::nth(at(1, 8, 0), 0);
    let flights = stub
        .client(false)
        .fetch_flights(&code("EGLL"), window)
        .await
        .unwrap();

    assert_eq!(flights.len(), 3);
    assert_eq!(flights[0].airline, "Lufthansa");
    assert_eq!(flights[0].number, "LH 901");
    assert_eq!(flights[0].origin_icao, "EGLL");
    assert_eq!(flights[0].destination_icao, "EDDF");
    assert_eq!(flights[0].departure_time, at(1, 9, 10));
    assert_eq!(flights[0].arrival_time, at(1, 11, 55));
    assert_eq!(flights[2].airline, MISSING);
    assert_eq!(flights[2].destination_icao, MISSING);

    assert_eq!(
        stub.requests()[0].path,
        format!(
            "/flights/airports/icao/EGLL/2024-03-01T08:00/2024-03-01T20:00?{}",
            DEPARTURE_FILTERS
        )
    );
}

#[tokio::test]
async fn test_http_failure_is_a_network_error() {
    let stub = Stub::start(|_| Reply::status(500)).await;
    match stub.client(false).fetch_routes(&code("EGLL")).await {
        Err(Error::Network(message)) => assert!(message.contains("500"), "{}", message),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_body_is_missing_data() {
    let stub = Stub::start(|_| Reply::status(200)).await;
    assert_eq!(
        stub.client(false).fetch_local_time(&code("EGLL")).await,
        Err(Error::MissingData)
    );
}

#[tokio::test]
async fn test_one_bad_record_fails_the_window() {
    let body = DEPARTURES.replace("2024-03-01 10:00+00:00", "soon");
    let stub = Stub::start(move |_| Reply::ok(&body)).await;
    let window = Window::nth(at(1, 8, 0), 0);

    assert_eq!(
        stub.client(false).fetch_flights(&code("EGLL"), window).await,
        Err(Error::Decode)
    );
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = ApiConfig {
        base_url,
        ..ApiConfig::default()
    };
    let client = ApiClient::with_builder(&config, reqwest::Client::builder().no_proxy()).unwrap();
    assert!(matches!(
        client.fetch_routes(&code("EGLL")).await,
        Err(Error::Network(_))
    ));
}

#[tokio::test]
async fn test_aggregator_over_http() {
    let stub = Stub::start(|path| {
        if path.starts_with("/flights/") {
            Reply::ok(DEPARTURES)
        } else {
            Reply::status(404)
        }
    })
    .await;
    let aggregator = FlightWindowAggregator::new(stub.client(false));

    let flights = aggregator
        .get_flights(&code("EGLL"), &code("EDDF"), Span::ThreeDays, at(1, 8, 0))
        .await
        .unwrap();

    // Every window served the same page, one EDDF flight each.
    assert_eq!(flights.len(), 6);
    assert!(flights.iter().all(|f| f.destination_icao == "EDDF"));

    let paths: BTreeSet<String> = stub.requests().into_iter().map(|r| r.path).collect();
    let expected: BTreeSet<String> = Span::ThreeDays
        .windows(at(1, 8, 0))
        .iter()
        .map(|w| {
            format!(
                "/flights/airports/icao/EGLL/{}/{}?{}",
                w.start.format("%Y-%m-%dT%H:%M"),
                w.end.format("%Y-%m-%dT%H:%M"),
                DEPARTURE_FILTERS
            )
        })
        .collect();
    assert_eq!(paths, expected);
}

#[tokio::test]
async fn test_aggregator_fails_when_any_window_fails() {
    let stub = Stub::start(|path| {
        if path.contains("/2024-03-02T08:00/") {
            Reply::status(429)
        } else {
            Reply::ok(DEPARTURES)
        }
    })
    .await;
    let aggregator = FlightWindowAggregator::new(stub.client(false));

    let result = aggregator
        .get_flights(&code("EGLL"), &code("EDDF"), Span::SevenDays, at(1, 8, 0))
        .await;

    assert!(matches!(result, Err(Error::Network(ref m)) if m.contains("429")));
    assert_eq!(stub.requests().len(), 14);
}
