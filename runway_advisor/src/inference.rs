use std::time::Duration;

use indexmap::IndexSet;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    airport_id::AirportId,
    error::{ApplicationError, ApplicationResult},
    runway::{AirportRunwaySet, RunwayEnd},
    wind::heading_from_identifier,
};

/// Result of asking an airport data source for runways. Every failure is `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceOutcome {
    Found(AirportRunwaySet),
    NotFound,
}

pub trait RunwayProvider {
    fn fetch(&self, icao: &AirportId) -> impl Future<Output = InferenceOutcome> + Send;
}

/// Airport data provider reached over HTTP, airportdb.io response shape.
#[derive(Debug, Clone)]
pub struct HttpRunwayProvider {
    client: reqwest::Client,
    url_template: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderAirport {
    #[serde(default)]
    runways: Vec<ProviderRunway>,
}

#[derive(Debug, Deserialize)]
struct ProviderRunway {
    #[serde(default)]
    le_ident: Option<String>,
    #[serde(default)]
    he_ident: Option<String>,
    #[serde(default, rename = "le_heading_degT", alias = "le_heading")]
    le_heading: Option<LenientNumber>,
    #[serde(default, rename = "he_heading_degT", alias = "he_heading")]
    he_heading: Option<LenientNumber>,
    #[serde(default)]
    closed: Option<LenientFlag>,
}

/// Providers send numbers either as JSON numbers or as strings, sometimes empty.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LenientFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl LenientNumber {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => Some(*n),
            Self::Text(text) => text.trim().parse().ok(),
        };
        value.filter(|n: &f64| n.is_finite())
    }

    fn as_heading(&self) -> Option<u16> {
        self.value()
            .map(|degrees| degrees.round().rem_euclid(360.0) as u16 % 360)
    }
}

impl LenientFlag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(flag) => *flag,
            Self::Number(n) => *n != 0,
            Self::Text(text) => matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ),
        }
    }
}

impl HttpRunwayProvider {
    pub fn new(
        url_template: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> ApplicationResult<Self> {
        let client = reqwest::ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self {
            client,
            url_template: url_template.into(),
            token,
        })
    }

    fn url_for(&self, icao: &AirportId) -> ApplicationResult<Url> {
        let raw = self.url_template.replace("{icao}", icao.as_str());
        let mut url = Url::parse(&raw)
            .map_err(|e| ApplicationError::InvalidProviderUrl(format!("'{raw}': {e}")))?;
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("apiToken", token);
        }
        Ok(url)
    }

    async fn fetch_body(&self, icao: &AirportId) -> ApplicationResult<String> {
        // The url carries the api token, keep it out of error messages.
        let response = self
            .client
            .get(self.url_for(icao)?)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(reqwest::Error::without_url)?;
        Ok(response.text().await.map_err(reqwest::Error::without_url)?)
    }
}

impl RunwayProvider for HttpRunwayProvider {
    #[tracing::instrument(skip_all, fields(%icao))]
    async fn fetch(&self, icao: &AirportId) -> InferenceOutcome {
        match self.fetch_body(icao).await {
            Ok(body) => runway_set_from_body(icao, &body),
            Err(e) => {
                warn!("Airport data lookup failed: {}", e);
                InferenceOutcome::NotFound
            }
        }
    }
}

/// Materializes both thresholds of every reported runway.
pub(crate) fn runway_set_from_body(icao: &AirportId, body: &str) -> InferenceOutcome {
    let airport: ProviderAirport = match serde_json::from_str(body) {
        Ok(airport) => airport,
        Err(e) => {
            warn!(%icao, "Airport data response is not usable: {}", e);
            return InferenceOutcome::NotFound;
        }
    };

    let mut seen = IndexSet::new();
    let mut ends = Vec::with_capacity(airport.runways.len() * 2);
    for runway in airport.runways {
        let enabled = !runway.closed.as_ref().is_some_and(LenientFlag::is_set);
        let thresholds = [
            (runway.le_ident, runway.le_heading),
            (runway.he_ident, runway.he_heading),
        ];
        for (identifier, explicit_heading) in thresholds {
            let Some(identifier) = identifier
                .map(|i| i.trim().to_ascii_uppercase())
                .filter(|i| !i.is_empty())
            else {
                debug!(%icao, "Dropping runway end without identifier");
                continue;
            };
            let heading = explicit_heading
                .as_ref()
                .and_then(LenientNumber::as_heading)
                .or_else(|| heading_from_identifier(&identifier));
            let Some(heading) = heading else {
                warn!(%icao, identifier, "Runway end has no heading and an unparsable designator, excluded");
                continue;
            };
            if !seen.insert(identifier.clone()) {
                debug!(%icao, identifier, "Duplicate runway end ignored");
                continue;
            }
            ends.push(RunwayEnd::unranked(identifier, heading, enabled));
        }
    }

    if ends.is_empty() {
        debug!(%icao, "Airport data lists no usable runways");
        InferenceOutcome::NotFound
    } else {
        InferenceOutcome::Found(AirportRunwaySet {
            icao: icao.clone(),
            ends,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };
    use tracing_test::traced_test;

    use super::*;

    fn icao(raw: &str) -> AirportId {
        raw.parse().unwrap()
    }

    fn found(outcome: InferenceOutcome) -> AirportRunwaySet {
        match outcome {
            InferenceOutcome::Found(set) => set,
            InferenceOutcome::NotFound => panic!("expected runways"),
        }
    }

    #[test]
    fn test_each_runway_gives_two_ends() {
        let body = r#"{"icao_code": "WMKP", "runways": [
            {"le_ident": "04", "he_ident": "22", "le_heading_degT": "", "he_heading_degT": "", "closed": "0"}
        ]}"#;
        let set = found(runway_set_from_body(&icao("WMKP"), body));
        assert_eq!(set.icao, icao("WMKP"));
        assert_eq!(
            set.ends,
            [
                RunwayEnd::unranked("04", 40, true),
                RunwayEnd::unranked("22", 220, true)
            ]
        );
    }

    #[test]
    fn test_explicit_headings_take_precedence() {
        let body = r#"{"runways": [
            {"le_ident": "07L", "he_ident": "25R", "le_heading": 70, "he_heading": 250},
            {"le_ident": "07R", "he_ident": "25L", "le_heading_degT": "73.4", "he_heading_degT": "359.7"}
        ]}"#;
        let set = found(runway_set_from_body(&icao("ZZZZ"), body));
        let headings = set.ends.iter().map(|end| end.heading).collect::<Vec<_>>();
        assert_eq!(headings, [70, 250, 73, 0]);
        assert!(set.ends.iter().all(|end| !end.preferred_departure && !end.preferred_arrival));
    }

    #[test]
    fn test_closed_flag_variants_disable_both_ends() {
        let body = r#"{"runways": [
            {"le_ident": "01", "he_ident": "19", "closed": true},
            {"le_ident": "02", "he_ident": "20", "closed": 1},
            {"le_ident": "03", "he_ident": "21", "closed": "1"},
            {"le_ident": "04", "he_ident": "22", "closed": false},
            {"le_ident": "05", "he_ident": "23"}
        ]}"#;
        let set = found(runway_set_from_body(&icao("ZZZZ"), body));
        let enabled = set
            .enabled()
            .map(|end| end.identifier.as_str())
            .collect::<Vec<_>>();
        assert_eq!(enabled, ["04", "22", "05", "23"]);
    }

    #[test]
    #[traced_test]
    fn test_unusable_ends_are_dropped() {
        let body = r#"{"runways": [
            {"le_ident": "H1", "he_ident": null},
            {"le_ident": "", "he_ident": "27"},
            {"le_ident": "N", "he_ident": "S", "le_heading_degT": "5", "he_heading_degT": "185"}
        ]}"#;
        let set = found(runway_set_from_body(&icao("ZZZZ"), body));
        let identifiers = set
            .ends
            .iter()
            .map(|end| end.identifier.as_str())
            .collect::<Vec<_>>();
        assert_eq!(identifiers, ["27", "N", "S"]);
        assert!(logs_contain("unparsable designator"));
    }

    #[test]
    fn test_empty_and_malformed_bodies_are_not_found() {
        for body in [
            r#"{"runways": []}"#,
            r#"{"error": "Unknown airport"}"#,
            "not json",
            r#"{"runways": [{"le_ident": "XX", "he_ident": "YY"}]}"#,
        ] {
            assert_eq!(
                runway_set_from_body(&icao("ZZZZ"), body),
                InferenceOutcome::NotFound,
                "{body}"
            );
        }
    }

    #[test]
    fn test_url_carries_icao_and_token() {
        let provider = HttpRunwayProvider::new(
            "https://airportdb.io/api/v1/airport/{icao}",
            Some("secret".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            provider.url_for(&icao("wsss")).unwrap().as_str(),
            "https://airportdb.io/api/v1/airport/WSSS?apiToken=secret"
        );

        let without_token =
            HttpRunwayProvider::new("http://localhost/{icao}?full=1", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            without_token.url_for(&icao("WSSS")).unwrap().as_str(),
            "http://localhost/WSSS?full=1"
        );
    }

    #[test]
    fn test_token_is_percent_encoded() {
        let provider = HttpRunwayProvider::new(
            "https://airportdb.io/api/v1/airport/{icao}?full=1",
            Some("ab&c#d e".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        let url = provider.url_for(&icao("WSSS")).unwrap();
        assert_eq!(url.fragment(), None);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("full".to_string(), "1".to_string()),
                ("apiToken".to_string(), "ab&c#d e".to_string())
            ]
        );
        assert!(url.as_str().ends_with("?full=1&apiToken=ab%26c%23d+e"));
    }

    #[tokio::test]
    async fn test_unusable_url_template_is_not_found() {
        let provider = HttpRunwayProvider::new("not a url/{icao}", None, Duration::from_secs(1))
            .unwrap();
        assert!(matches!(
            provider.url_for(&icao("WSSS")),
            Err(ApplicationError::InvalidProviderUrl(_))
        ));
        assert_eq!(
            provider.fetch(&icao("WSSS")).await,
            InferenceOutcome::NotFound
        );
    }

    /// Serves one connection: reads the request, then writes `response` unless it is `None`,
    /// in which case the connection is held open without an answer.
    async fn serve_once(response: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            match response {
                Some(response) => {
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                }
                None => tokio::time::sleep(Duration::from_secs(30)).await,
            }
        });
        format!("http://{address}/airport/{{icao}}")
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_found() {
        let provider =
            HttpRunwayProvider::new("http://127.0.0.1:9/{icao}", None, Duration::from_millis(500))
                .unwrap();
        assert_eq!(
            provider.fetch(&icao("WSSS")).await,
            InferenceOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_silent_server_times_out_as_not_found() {
        let url = serve_once(None).await;
        let provider = HttpRunwayProvider::new(url, None, Duration::from_millis(200)).unwrap();
        let started = Instant::now();
        assert_eq!(
            provider.fetch(&icao("WSSS")).await,
            InferenceOutcome::NotFound
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_server_error_is_not_found() {
        let body = r#"{"runways": [{"le_ident": "04", "he_ident": "22"}]}"#;
        let url = serve_once(Some(http_response("500 Internal Server Error", body))).await;
        let provider = HttpRunwayProvider::new(url, None, Duration::from_secs(2)).unwrap();
        assert_eq!(
            provider.fetch(&icao("WMKP")).await,
            InferenceOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_successful_response_is_found() {
        let body = r#"{"icao_code": "WMKP", "runways": [
            {"le_ident": "04", "he_ident": "22", "le_heading_degT": "37.1", "he_heading_degT": "217.1", "closed": "0"}
        ]}"#;
        let url = serve_once(Some(http_response("200 OK", body))).await;
        let provider =
            HttpRunwayProvider::new(url, Some("t&k".to_string()), Duration::from_secs(2)).unwrap();
        let set = found(provider.fetch(&icao("WMKP")).await);
        assert_eq!(
            set.ends,
            [
                RunwayEnd::unranked("04", 37, true),
                RunwayEnd::unranked("22", 217, true)
            ]
        );
    }
}
