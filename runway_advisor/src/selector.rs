use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::{
    airport_id::AirportId,
    catalog::RunwayCatalog,
    inference::{InferenceOutcome, RunwayProvider},
    runway::{AirportRunwaySet, RunwayEnd, RunwayUse},
    wind::{WindObservation, is_aligned},
};

/// Where the runway ends behind a recommendation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunwaySource {
    Catalog,
    Inferred,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunwayRecommendation {
    pub departure: Vec<String>,
    pub arrival: Vec<String>,
    pub source: RunwaySource,
}

impl RunwayRecommendation {
    pub fn no_data() -> Self {
        Self {
            departure: Vec::new(),
            arrival: Vec::new(),
            source: RunwaySource::NoData,
        }
    }

    /// Departure and arrival lists folded into one list, shared runways become `Both`.
    pub fn combined(&self) -> IndexMap<&str, RunwayUse> {
        let mut runways = IndexMap::new();
        let tagged = self
            .departure
            .iter()
            .map(|r| (r, RunwayUse::Departing))
            .chain(self.arrival.iter().map(|r| (r, RunwayUse::Arriving)));
        for (runway, usage) in tagged {
            runways
                .entry(runway.as_str())
                .and_modify(|existing: &mut RunwayUse| *existing = existing.merged_with(usage))
                .or_insert(usage);
        }
        runways
    }
}

/// Picks departure and arrival ends for one runway set.
///
/// Each list takes the first non-empty tier: preferred ends aligned with the
/// wind, then every aligned end, then every enabled end. Disabled ends are
/// never returned. Order follows the set.
pub fn recommend(
    set: &AirportRunwaySet,
    source: RunwaySource,
    wind: &WindObservation,
) -> RunwayRecommendation {
    let enabled = set.enabled().collect::<Vec<_>>();
    let aligned = enabled
        .iter()
        .copied()
        .filter(|end| is_aligned(end.heading, wind.direction))
        .collect::<Vec<_>>();

    RunwayRecommendation {
        departure: pick(&aligned, &enabled, RunwayUse::Departing),
        arrival: pick(&aligned, &enabled, RunwayUse::Arriving),
        source,
    }
}

fn pick(aligned: &[&RunwayEnd], enabled: &[&RunwayEnd], usage: RunwayUse) -> Vec<String> {
    let preferred = aligned
        .iter()
        .copied()
        .filter(|end| end.is_preferred_for(usage))
        .collect::<Vec<_>>();

    [preferred, aligned.to_vec(), enabled.to_vec()]
        .into_iter()
        .find(|tier| !tier.is_empty())
        .unwrap_or_default()
        .into_iter()
        .map(|end| end.identifier.clone())
        .collect()
}

/// Catalog first, then the airport data provider, then nothing.
#[derive(Debug)]
pub struct RunwaySelector<P> {
    catalog: RunwayCatalog,
    provider: P,
}

impl<P: RunwayProvider> RunwaySelector<P> {
    pub fn new(catalog: RunwayCatalog, provider: P) -> Self {
        Self { catalog, provider }
    }

    pub async fn select(&self, icao: &AirportId, wind: &WindObservation) -> RunwayRecommendation {
        if let Some(set) = self.catalog.lookup(icao)
            && !set.is_empty()
        {
            debug!(%icao, "Using curated runways");
            return recommend(set, RunwaySource::Catalog, wind);
        }

        match self.provider.fetch(icao).await {
            InferenceOutcome::Found(set) if !set.is_empty() => {
                debug!(%icao, ends = set.ends.len(), "Using inferred runways");
                recommend(&set, RunwaySource::Inferred, wind)
            }
            _ => {
                debug!(%icao, "No runway data");
                RunwayRecommendation::no_data()
            }
        }
    }
}
