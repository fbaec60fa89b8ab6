use std::{fs, path::Path};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use tracing::debug;

use crate::{
    airport_id::AirportId,
    error::{ApplicationError, ApplicationResult},
    runway::{AirportRunwaySet, RunwayEnd},
    wind::heading_from_identifier,
};

/// Curated runway ends, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RunwayCatalog {
    airports: IndexMap<AirportId, AirportRunwaySet>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogAirport {
    runways: Vec<CatalogRunway>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogRunway {
    identifier: String,
    heading: Option<u16>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    preferred_departure: bool,
    #[serde(default)]
    preferred_arrival: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl RunwayCatalog {
    pub fn bundled() -> ApplicationResult<Self> {
        Self::from_toml_str(include_str!("../catalog.toml"))
    }

    pub fn from_path(path: &Path) -> ApplicationResult<Self> {
        debug!(?path, "Loading runway catalog");
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn from_toml_str(raw: &str) -> ApplicationResult<Self> {
        let parsed: IndexMap<String, CatalogAirport> = toml::from_str(raw)?;
        let mut seen = IndexSet::new();
        let mut sets = Vec::with_capacity(parsed.len());
        for (raw_icao, airport) in parsed {
            let set = airport.into_runway_set(&raw_icao)?;
            if !seen.insert(set.icao.clone()) {
                return Err(ApplicationError::InvalidCatalog(format!(
                    "{raw_icao}: airport {} listed twice",
                    set.icao
                )));
            }
            sets.push(set);
        }
        Ok(Self::from_sets(sets))
    }

    pub fn from_sets(sets: impl IntoIterator<Item = AirportRunwaySet>) -> Self {
        Self {
            airports: sets
                .into_iter()
                .map(|set| (set.icao.clone(), set))
                .collect(),
        }
    }

    pub fn lookup(&self, icao: &AirportId) -> Option<&AirportRunwaySet> {
        self.airports.get(icao)
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }
}

impl CatalogAirport {
    fn into_runway_set(self, icao: &str) -> ApplicationResult<AirportRunwaySet> {
        let invalid = |reason: String| ApplicationError::InvalidCatalog(format!("{icao}: {reason}"));
        let icao: AirportId = icao.parse().map_err(|e: ApplicationError| invalid(e.to_string()))?;
        if self.runways.is_empty() {
            return Err(invalid("no runways listed".to_string()));
        }

        let mut seen = IndexSet::new();
        let mut ends = Vec::with_capacity(self.runways.len());
        for runway in self.runways {
            if !seen.insert(runway.identifier.clone()) {
                return Err(invalid(format!("runway {} listed twice", runway.identifier)));
            }
            let heading = match runway.heading {
                Some(heading) if heading <= 360 => heading % 360,
                Some(heading) => {
                    return Err(invalid(format!(
                        "runway {} has heading {heading} outside 0-360",
                        runway.identifier
                    )));
                }
                None => heading_from_identifier(&runway.identifier).ok_or_else(|| {
                    invalid(format!(
                        "runway '{}' has no heading and no two digit designator",
                        runway.identifier
                    ))
                })?,
            };
            ends.push(RunwayEnd {
                identifier: runway.identifier,
                heading,
                enabled: runway.enabled,
                preferred_departure: runway.preferred_departure,
                preferred_arrival: runway.preferred_arrival,
            });
        }
        Ok(AirportRunwaySet { icao, ends })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icao(raw: &str) -> AirportId {
        raw.parse().unwrap()
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = RunwayCatalog::bundled().unwrap();
        assert!(catalog.len() >= 5);

        let wsss = catalog.lookup(&icao("WSSS")).unwrap();
        assert_eq!(wsss.ends.len(), 6);
        let closed = wsss
            .ends
            .iter()
            .filter(|end| !end.enabled)
            .map(|end| end.identifier.as_str())
            .collect::<Vec<_>>();
        assert_eq!(closed, ["02R", "20L"]);
    }

    #[test]
    fn test_explicit_heading_wins_over_designator() {
        let catalog = RunwayCatalog::bundled().unwrap();
        let vhhh = catalog.lookup(&icao("VHHH")).unwrap();
        assert_eq!(vhhh.ends[0].identifier, "07L");
        assert_eq!(vhhh.ends[0].heading, 73);
    }

    #[test]
    fn test_lookup_unknown_airport() {
        let catalog = RunwayCatalog::bundled().unwrap();
        assert!(catalog.lookup(&icao("ZZZZ")).is_none());
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let catalog = RunwayCatalog::from_toml_str(
            r#"
            [ENZV]
            runways = [{ identifier = "18" }, { identifier = "36" }]
            "#,
        )
        .unwrap();
        let enzv = catalog.lookup(&icao("ENZV")).unwrap();
        assert!(enzv.ends.iter().all(|end| end.enabled));
        assert!(enzv.ends.iter().all(|end| !end.preferred_departure));
        assert_eq!(enzv.ends[1].heading, 0);
    }

    #[test]
    fn test_rejects_malformed_entries() {
        let cases = [
            r#"[WSS]
               runways = [{ identifier = "02" }]"#,
            r#"[WSSS]
               runways = []"#,
            r#"[WSSS]
               runways = [{ identifier = "02" }, { identifier = "02" }]"#,
            r#"[WSSS]
               runways = [{ identifier = "H1" }]"#,
            r#"[WSSS]
               runways = [{ identifier = "02", heading = 400 }]"#,
        ];
        for raw in cases {
            assert!(
                matches!(
                    RunwayCatalog::from_toml_str(raw),
                    Err(ApplicationError::InvalidCatalog(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_airport_listed_twice_in_different_case() {
        let raw = r#"
            [wsss]
            runways = [{ identifier = "02" }]

            [WSSS]
            runways = [{ identifier = "20" }]
            "#;
        let err = RunwayCatalog::from_toml_str(raw).unwrap_err();
        assert!(matches!(&err, ApplicationError::InvalidCatalog(reason) if reason.contains("WSSS listed twice")));
    }

    #[test]
    fn test_unknown_field_is_a_format_error() {
        let raw = r#"[WSSS]
                     runways = [{ identifier = "02", prefered_arrival = true }]"#;
        assert!(matches!(
            RunwayCatalog::from_toml_str(raw),
            Err(ApplicationError::CatalogFormatError(_))
        ));
    }

    #[test]
    fn test_malformed_designator_accepted_with_explicit_heading() {
        let catalog = RunwayCatalog::from_toml_str(
            r#"[WSSS]
               runways = [{ identifier = "H1", heading = 45 }]"#,
        )
        .unwrap();
        assert_eq!(catalog.lookup(&icao("WSSS")).unwrap().ends[0].heading, 45);
    }
}
