pub(crate) mod airport_id;
pub(crate) mod catalog;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod inference;
pub(crate) mod metar;
pub(crate) mod report;
pub(crate) mod runway;
pub(crate) mod selector;
pub(crate) mod wind;

use std::{fs, sync::Arc};

use airport_id::AirportId;
use clap::Parser;
use crate::config::AdvisorConfig;
use error::ApplicationResult;
use futures::future::try_join_all;
use inference::{HttpRunwayProvider, RunwayProvider};
use jiff::Zoned;
use metar::{MetarClient, WindReading, metar_age_minutes};
use metar_decoder::metar::Metar;
use report::MetarFormat;
use selector::{RunwayRecommendation, RunwaySelector};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wind::WindObservation;

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// ICAO codes of the airports to select runways for
    #[arg(required = true)]
    airports: Vec<String>,
    #[arg(long, short, value_parser = parse_wind, conflicts_with = "metar")]
    /// Wind direction in degrees, or VRB, used instead of fetching METARs
    wind: Option<WindObservation>,
    #[arg(long)]
    /// Raw METAR used instead of fetching one for the airport it reports
    metar: Option<String>,
    #[arg(long, value_enum, default_value_t = MetarFormat::Decoded)]
    /// How the METAR is shown in the text report
    metar_format: MetarFormat,
    #[arg(long)]
    /// Print the recommendations as JSON
    json: bool,
    #[clap(long, short)]
    /// Resets the config file (but keeps the provider token and catalog path)
    clean_config: bool,
}

fn parse_wind(raw: &str) -> Result<WindObservation, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("VRB") {
        return Ok(WindObservation::variable());
    }
    raw.parse::<u16>()
        .ok()
        .filter(|degrees| *degrees <= 360)
        .map(WindObservation::from_direction)
        .ok_or_else(|| format!("'{raw}' is not a direction between 0 and 360 or VRB"))
}

#[derive(Debug, Serialize)]
struct AirportAdvice {
    icao: AirportId,
    wind: WindObservation,
    metar: Option<String>,
    #[serde(flatten)]
    recommendation: RunwayRecommendation,
    #[serde(skip)]
    reading: WindReading,
}

struct Advisor<P> {
    selector: RunwaySelector<P>,
    metar_client: MetarClient,
    max_metar_age_minutes: i64,
}

impl<P: RunwayProvider> Advisor<P> {
    async fn read_wind(
        &self,
        icao: &AirportId,
        given_wind: Option<WindObservation>,
        given_metar: Option<&Metar>,
    ) -> WindReading {
        if let Some(wind) = given_wind {
            return WindReading::Given(wind);
        }
        match given_metar {
            Some(metar) if metar.icao == icao.as_str() => {
                return WindReading::Metar(Box::new(metar.clone()));
            }
            Some(metar) => debug!(%icao, metar.icao, "Given METAR is for another airport"),
            None => {}
        }
        match self.metar_client.fetch(icao).await {
            Ok(metar) => {
                if let Some(age) = metar_age_minutes(&metar, &Zoned::now())
                    && age > self.max_metar_age_minutes
                {
                    warn!(%icao, age, metar = metar.raw, "METAR is old");
                }
                WindReading::Metar(Box::new(metar))
            }
            Err(e) => {
                warn!(%icao, "No METAR, treating wind as variable: {}", e);
                WindReading::Unknown
            }
        }
    }

    async fn advise(
        &self,
        icao: AirportId,
        given_wind: Option<WindObservation>,
        given_metar: Option<&Metar>,
    ) -> AirportAdvice {
        let reading = self.read_wind(&icao, given_wind, given_metar).await;
        let wind = reading.observation();
        let recommendation = self.selector.select(&icao, &wind).await;
        debug!(%icao, ?recommendation, "Runways selected");
        AirportAdvice {
            metar: reading.metar().map(|metar| metar.raw.clone()),
            icao,
            wind,
            recommendation,
            reading,
        }
    }
}

fn parse_airport_ids(raw: &[String]) -> ApplicationResult<Vec<AirportId>> {
    let mut ids = Vec::with_capacity(raw.len());
    let mut first_error = None;
    for airport in raw {
        match airport.parse::<AirportId>() {
            Ok(icao) if ids.contains(&icao) => debug!(%icao, "Airport listed twice"),
            Ok(icao) => ids.push(icao),
            Err(e) => {
                error!("{}", e);
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) if ids.is_empty() => Err(e),
        _ => Ok(ids),
    }
}

async fn run(cli: Cli) -> ApplicationResult<()> {
    let config = AdvisorConfig::load(cli.clean_config)?;
    debug!(config_file = ?config.config_file_path(), "Configuration loaded");
    let catalog = config.load_catalog()?;
    info!(airports = catalog.len(), "Runway catalog loaded");

    let provider = HttpRunwayProvider::new(
        config.runway_provider_url(),
        config.runway_provider_token(),
        config.request_timeout(),
    )?;
    let advisor = Arc::new(Advisor {
        selector: RunwaySelector::new(catalog, provider),
        metar_client: MetarClient::new(
            config.metar_url(),
            config.request_timeout(),
            config.metar_retries(),
        )?,
        max_metar_age_minutes: config.max_metar_age_minutes(),
    });
    let given_metar = cli.metar.as_deref().map(str::parse::<Metar>).transpose()?;
    let given_metar = Arc::new(given_metar);

    let tasks = parse_airport_ids(&cli.airports)?
        .into_iter()
        .map(|icao| {
            let advisor = advisor.clone();
            let given_metar = given_metar.clone();
            let given_wind = cli.wind;
            tokio::spawn(async move {
                advisor
                    .advise(icao, given_wind, (*given_metar).as_ref())
                    .await
            })
        });
    let advice = try_join_all(tasks).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&advice)?);
    } else {
        for airport in &advice {
            println!(
                "{}\n",
                report::render_recommendation(
                    &airport.icao,
                    &airport.reading,
                    &airport.recommendation,
                    cli.metar_format,
                )?
            );
        }
    }
    Ok(())
}

/// Console output plus a daily log file. The guard flushes the file on drop.
fn init_tracing() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let file_writer = crate::config::log_directory()
        .filter(|dir| fs::create_dir_all(dir).is_ok())
        .map(|dir| {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(
                dir,
                "runway_advisor.log",
            ))
        });
    let (file_layer, guard) = match file_writer {
        Some((writer, guard)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> ApplicationResult<()> {
    let cli = Cli::parse();
    let _guard = init_tracing();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
