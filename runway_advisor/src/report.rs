use askama::Template;
use itertools::Itertools;
use metar_decoder::metar::Metar;

use crate::{
    airport_id::AirportId,
    error::ApplicationResult,
    metar::WindReading,
    selector::{RunwayRecommendation, RunwaySource},
};

#[derive(Template)]
#[template(path = "recommendation.txt")]
struct RecommendationTemplate<'a> {
    icao: &'a AirportId,
    source_label: &'static str,
    wind: String,
    decoded: Vec<String>,
    departure: String,
    arrival: String,
    combined: String,
    inferred: bool,
    metar: Option<&'a str>,
}

/// How the METAR behind a recommendation is shown in the text report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MetarFormat {
    /// Visibility, weather, clouds, temperature and QNH on their own lines
    #[default]
    Decoded,
    /// The METAR as reported
    Raw,
}

impl RunwaySource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Catalog => "curated runways",
            Self::Inferred => "inferred from airport data, low confidence",
            Self::NoData => "no runway data",
        }
    }
}

fn format_runway_list(runways: &[String]) -> String {
    if runways.is_empty() {
        "(no selection)".to_string()
    } else {
        runways.join(", ")
    }
}

fn format_combined(recommendation: &RunwayRecommendation) -> String {
    let combined = recommendation.combined();
    if combined.is_empty() {
        return "(no selection)".to_string();
    }
    combined
        .iter()
        .map(|(runway, usage)| format!("{runway}{}", usage.report_suffix()))
        .join(" + ")
}

fn decoded_lines(metar: &Metar) -> Vec<String> {
    let joined = |parts: Vec<String>| (!parts.is_empty()).then(|| parts.join(", "));
    [
        ("Visibility:", metar.visibility.as_ref().map(ToString::to_string)),
        ("Weather:", joined(metar.weather.iter().map(ToString::to_string).collect_vec())),
        ("Clouds:", joined(metar.clouds.iter().map(ToString::to_string).collect_vec())),
        ("Temp:", metar.temperature.map(|t| t.to_string())),
        (
            "QNH:",
            metar
                .pressure
                .and_then(|p| p.qnh_hectopascals())
                .map(|hpa| format!("{hpa} hPa")),
        ),
    ]
    .into_iter()
    .filter_map(|(label, text)| text.map(|text| format!("{label:<12}{text}")))
    .collect()
}

pub fn render_recommendation(
    icao: &AirportId,
    reading: &WindReading,
    recommendation: &RunwayRecommendation,
    metar_format: MetarFormat,
) -> ApplicationResult<String> {
    let metar = reading.metar();
    let wind = match reading {
        WindReading::Unknown => "unknown (no METAR), treated as variable".to_string(),
        _ => reading.observation().to_string(),
    };
    let (decoded, metar) = match (metar, metar_format) {
        (Some(metar), MetarFormat::Decoded) => (decoded_lines(metar), None),
        (metar, _) => (Vec::new(), metar.map(|metar| metar.raw.as_str())),
    };

    let template = RecommendationTemplate {
        icao,
        source_label: recommendation.source.label(),
        wind,
        decoded,
        departure: format_runway_list(&recommendation.departure),
        arrival: format_runway_list(&recommendation.arrival),
        combined: format_combined(recommendation),
        inferred: recommendation.source == RunwaySource::Inferred,
        metar,
    };
    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wind::WindObservation;

    fn icao(raw: &str) -> AirportId {
        raw.parse().unwrap()
    }

    fn recommendation(departure: &[&str], arrival: &[&str], source: RunwaySource) -> RunwayRecommendation {
        RunwayRecommendation {
            departure: departure.iter().map(|r| r.to_string()).collect(),
            arrival: arrival.iter().map(|r| r.to_string()).collect(),
            source,
        }
    }

    fn wsss_metar() -> WindReading {
        let metar = "WSSS 190830Z 20012KT 9999 -SHRA FEW018CB SCT300 31/24 Q1009 NOSIG"
            .parse()
            .unwrap();
        WindReading::Metar(Box::new(metar))
    }

    #[test]
    fn test_render_catalog_recommendation_with_decoded_metar() {
        let rendered = render_recommendation(
            &icao("WSSS"),
            &wsss_metar(),
            &recommendation(&["20C"], &["20R"], RunwaySource::Catalog),
            MetarFormat::Decoded,
        )
        .unwrap();
        assert_eq!(
            rendered,
            "WSSS | curated runways\n\
             Wind:       200° 12KT\n\
             Visibility: 10 km or more\n\
             Weather:    light rain showers\n\
             Clouds:     few 1800 ft CB, scattered 30000 ft\n\
             Temp:       31°C / dew point 24°C\n\
             QNH:        1009 hPa\n\
             Departure:  20C\n\
             Arrival:    20R\n\
             In use:     20C Dep + 20R Arr"
        );
    }

    #[test]
    fn test_render_catalog_recommendation_with_raw_metar() {
        let rendered = render_recommendation(
            &icao("WSSS"),
            &wsss_metar(),
            &recommendation(&["20C"], &["20R"], RunwaySource::Catalog),
            MetarFormat::Raw,
        )
        .unwrap();
        assert_eq!(
            rendered,
            "WSSS | curated runways\n\
             Wind:       200° 12KT\n\
             Departure:  20C\n\
             Arrival:    20R\n\
             In use:     20C Dep + 20R Arr\n\
             METAR:      WSSS 190830Z 20012KT 9999 -SHRA FEW018CB SCT300 31/24 Q1009 NOSIG"
        );
    }

    #[test]
    fn test_decoded_lines_skip_missing_groups() {
        let metar: Metar = "ENZV 011200Z 05030KT CAVOK 20/20 Q1013".parse().unwrap();
        assert_eq!(
            decoded_lines(&metar),
            [
                "Visibility: CAVOK",
                "Temp:       20°C / dew point 20°C",
                "QNH:        1013 hPa",
            ]
        );
    }

    #[test]
    fn test_render_inferred_recommendation_warns() {
        let rendered = render_recommendation(
            &icao("WMKP"),
            &WindReading::Given(WindObservation::from_direction(75)),
            &recommendation(&["07L"], &["07L"], RunwaySource::Inferred),
            MetarFormat::Decoded,
        )
        .unwrap();
        assert!(rendered.contains("inferred from airport data, low confidence"));
        assert!(rendered.contains("In use:     07L\n"));
        assert!(rendered.contains("confirm the selection"));
        assert!(!rendered.contains("METAR:"));
        assert!(!rendered.contains("Temp:"));
    }

    #[test]
    fn test_render_no_data() {
        let rendered = render_recommendation(
            &icao("ZZZZ"),
            &WindReading::Unknown,
            &RunwayRecommendation::no_data(),
            MetarFormat::Raw,
        )
        .unwrap();
        assert!(rendered.starts_with("ZZZZ | no runway data\n"));
        assert!(rendered.contains("Wind:       unknown (no METAR)"));
        assert!(rendered.contains("Departure:  (no selection)"));
        assert!(rendered.contains("In use:     (no selection)"));
        assert!(!rendered.contains("METAR:"));
    }
}
