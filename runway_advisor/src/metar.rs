use std::{str::FromStr, time::Duration};

use jiff::Zoned;
use metar_decoder::{
    metar::Metar,
    optional_data::OptionalData,
    wind::{Wind, WindDirection},
};
use tracing::{error, warn};
use tracing_unwrap::ResultExt;

use crate::{
    airport_id::AirportId,
    error::{ApplicationError, ApplicationResult},
    wind::WindObservation,
};

/// Wind input for one airport.
#[derive(Debug, Clone)]
pub enum WindReading {
    /// Given on the command line.
    Given(WindObservation),
    Metar(Box<Metar>),
    /// No METAR could be had, treated as variable.
    Unknown,
}

impl WindReading {
    pub fn observation(&self) -> WindObservation {
        match self {
            Self::Given(wind) => *wind,
            Self::Metar(metar) => wind_from_metar(&metar.wind),
            Self::Unknown => WindObservation::variable(),
        }
    }

    pub fn metar(&self) -> Option<&Metar> {
        match self {
            Self::Metar(metar) => Some(metar.as_ref()),
            _ => None,
        }
    }
}

pub fn wind_from_metar(wind: &Wind) -> WindObservation {
    let speed_kts = wind.speed.mean_knots();
    let direction = match wind.dir {
        _ if wind.is_calm() => None,
        WindDirection::Heading(OptionalData::Data(degrees)) => Some((degrees % 360) as u16),
        WindDirection::Heading(OptionalData::Undefined) | WindDirection::Variable => None,
    };
    WindObservation {
        direction,
        speed_kts,
    }
}

/// Minutes since the observation, `None` when the stamp cannot be placed.
pub fn metar_age_minutes(metar: &Metar, now: &Zoned) -> Option<i64> {
    let observed = metar.timestamp.observed_at(now)?;
    Some((now.timestamp().as_second() - observed.timestamp().as_second()).div_euclid(60))
}

pub struct MetarClient {
    client: reqwest::Client,
    url_template: String,
    retries: u32,
}

impl MetarClient {
    pub fn new(
        url_template: impl Into<String>,
        timeout: Duration,
        retries: u32,
    ) -> ApplicationResult<Self> {
        Ok(Self {
            client: reqwest::ClientBuilder::new().timeout(timeout).build()?,
            url_template: url_template.into(),
            retries: retries.max(1),
        })
    }

    /// Latest decodable METAR for the airport.
    pub async fn fetch(&self, icao: &AirportId) -> ApplicationResult<Metar> {
        let url = self.url_template.replace("{icao}", icao.as_str());
        let page = self.get_metars_from_url(&url).await?;
        metar_from_page(icao, &page)
    }

    #[tracing::instrument(skip(self))]
    async fn get_metars_from_url(&self, url: &str) -> ApplicationResult<String> {
        let mut first_error = None;
        for attempt in 1..=self.retries {
            let text = match self
                .client
                .get(url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
            {
                Ok(resp) => resp.text().await,
                Err(e) => Err(e),
            };
            match text {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if attempt == self.retries {
                        error!("Failed to get {}: {}", url, e);
                    } else {
                        warn!("Failed to get {} (attempt {}): {}", url, attempt, e);
                    }
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.map_or_else(|| ApplicationError::NoMetar(url.to_string()), Into::into))
    }
}

fn metar_from_page(icao: &AirportId, page: &str) -> ApplicationResult<Metar> {
    page.lines()
        .map(str::trim)
        .filter(|line| {
            line.strip_prefix("METAR ")
                .unwrap_or(line)
                .starts_with(icao.as_str())
        })
        .map(Metar::from_str)
        .find_map(Result::ok_or_log)
        .ok_or_else(|| ApplicationError::NoMetar(icao.to_string()))
}
