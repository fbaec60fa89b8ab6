use serde::Serialize;

use crate::airport_id::AirportId;

/// One threshold of a runway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunwayEnd {
    pub identifier: String,
    pub heading: u16,
    pub enabled: bool,
    pub preferred_departure: bool,
    pub preferred_arrival: bool,
}

impl RunwayEnd {
    /// An end without curated hints, as materialized from provider data.
    pub fn unranked(identifier: impl Into<String>, heading: u16, enabled: bool) -> Self {
        Self {
            identifier: identifier.into(),
            heading: heading % 360,
            enabled,
            preferred_departure: false,
            preferred_arrival: false,
        }
    }

    pub fn is_preferred_for(&self, usage: RunwayUse) -> bool {
        match usage {
            RunwayUse::Departing => self.preferred_departure,
            RunwayUse::Arriving => self.preferred_arrival,
            RunwayUse::Both => self.preferred_departure && self.preferred_arrival,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportRunwaySet {
    pub icao: AirportId,
    pub ends: Vec<RunwayEnd>,
}

impl AirportRunwaySet {
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &RunwayEnd> {
        self.ends.iter().filter(|end| end.enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunwayUse {
    Departing,
    Arriving,
    Both,
}

impl RunwayUse {
    pub fn merged_with(self, other: Self) -> Self {
        match (self, other) {
            (Self::Both, _) | (_, Self::Both) => Self::Both,
            (Self::Arriving, Self::Departing) | (Self::Departing, Self::Arriving) => Self::Both,
            (existing, _) => existing,
        }
    }

    pub fn report_suffix(self) -> &'static str {
        match self {
            Self::Arriving => " Arr",
            Self::Departing => " Dep",
            Self::Both => "",
        }
    }
}
