use std::fmt;

use nom::{
    Parser,
    branch::alt,
    bytes::complete::{tag, take},
    character::complete::{alphanumeric1, u32},
    combinator::{all_consuming, map, map_parser, map_res, opt, value},
    multi::many0,
    sequence::{preceded, separated_pair, terminated},
};

use crate::optional_data::OptionalData;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Visibility {
    Cavok,
    Reported { value: VisibilityUnit, ndv: bool },
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum VisibilityUnit {
    Meters(OptionalData<u32, 4>),
    StatuteMiles(StatuteMilesVisibility),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct StatuteMilesVisibility {
    pub whole: Option<u32>,
    pub fraction: Option<(u32, u32)>,
    pub modifier: Option<DistanceModifier>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DistanceModifier {
    LessThan,
    GreaterThan,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Cloud {
    NoCloudDetected,
    NoSignificantCloud,
    SkyClear,
    /// Height in hundreds of feet.
    VerticalVisibility(OptionalData<u32, 3>),
    Layer(CloudLayer),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CloudLayer {
    pub coverage: OptionalData<CloudCoverage, 3>,
    /// Hundreds of feet above the aerodrome.
    pub height: OptionalData<u32, 3>,
    pub cloud_type: Option<OptionalData<String, 3>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CloudCoverage {
    Few,
    Scattered,
    Broken,
    Overcast,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PresentWeather {
    pub intensity: Option<WeatherIntensity>,
    pub descriptor: Option<Qualifier>,
    pub phenomena: Vec<WeatherPhenomenon>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WeatherIntensity {
    Light,    // -
    Heavy,    // +
    Vicinity, // VC
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Qualifier {
    Shallow,      // MI
    Patches,      // BC
    Partial,      // PR
    LowDrifting,  // DR
    Blowing,      // BL
    Showers,      // SH
    Thunderstorm, // TS
    Freezing,     // FZ
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WeatherPhenomenon {
    Drizzle,
    Rain,
    Snow,
    SnowGrains,
    IcePellets,
    Hail,
    SmallHail,
    UnknownPrecipitation,
    Mist,
    Fog,
    Smoke,
    VolcanicAsh,
    Dust,
    Sand,
    Haze,
    DustWhirls,
    Squalls,
    FunnelCloud,
    Sandstorm,
    Duststorm,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cavok => write!(f, "CAVOK"),
            Self::Reported { value, ndv } => {
                write!(f, "{value}")?;
                if *ndv {
                    write!(f, " (no directional variation)")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for VisibilityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meters(OptionalData::Data(9999)) => write!(f, "10 km or more"),
            Self::Meters(OptionalData::Data(meters)) => write!(f, "{meters} m"),
            Self::Meters(OptionalData::Undefined) => write!(f, "not reported"),
            Self::StatuteMiles(miles) => write!(f, "{miles}"),
        }
    }
}

impl fmt::Display for StatuteMilesVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            Some(DistanceModifier::LessThan) => write!(f, "less than ")?,
            Some(DistanceModifier::GreaterThan) => write!(f, "more than ")?,
            None => {}
        }
        match (self.whole, self.fraction) {
            (Some(whole), Some((num, den))) => write!(f, "{whole} {num}/{den} SM"),
            (Some(whole), None) => write!(f, "{whole} SM"),
            (None, Some((num, den))) => write!(f, "{num}/{den} SM"),
            (None, None) => write!(f, "? SM"),
        }
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCloudDetected => write!(f, "no cloud detected"),
            Self::NoSignificantCloud => write!(f, "no significant cloud"),
            Self::SkyClear => write!(f, "sky clear"),
            Self::VerticalVisibility(OptionalData::Data(height)) => {
                write!(f, "vertical visibility {} ft", height * 100)
            }
            Self::VerticalVisibility(OptionalData::Undefined) => {
                write!(f, "vertical visibility not reported")
            }
            Self::Layer(layer) => write!(f, "{layer}"),
        }
    }
}

impl fmt::Display for CloudLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.coverage {
            OptionalData::Data(coverage) => write!(f, "{}", coverage.description())?,
            OptionalData::Undefined => write!(f, "cloud")?,
        }
        match self.height {
            OptionalData::Data(height) => write!(f, " {} ft", height * 100)?,
            OptionalData::Undefined => write!(f, " at unknown height")?,
        }
        if let Some(OptionalData::Data(cloud_type)) = &self.cloud_type {
            write!(f, " {cloud_type}")?;
        }
        Ok(())
    }
}

impl CloudCoverage {
    fn description(self) -> &'static str {
        match self {
            Self::Few => "few",
            Self::Scattered => "scattered",
            Self::Broken => "broken",
            Self::Overcast => "overcast",
        }
    }
}

impl Qualifier {
    fn description(self) -> &'static str {
        match self {
            Self::Shallow => "shallow",
            Self::Patches => "patches of",
            Self::Partial => "partial",
            Self::LowDrifting => "low drifting",
            Self::Blowing => "blowing",
            Self::Showers => "showers",
            Self::Thunderstorm => "thunderstorm",
            Self::Freezing => "freezing",
        }
    }
}

impl WeatherPhenomenon {
    fn description(self) -> &'static str {
        match self {
            Self::Drizzle => "drizzle",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::SnowGrains => "snow grains",
            Self::IcePellets => "ice pellets",
            Self::Hail => "hail",
            Self::SmallHail => "small hail",
            Self::UnknownPrecipitation => "unknown precipitation",
            Self::Mist => "mist",
            Self::Fog => "fog",
            Self::Smoke => "smoke",
            Self::VolcanicAsh => "volcanic ash",
            Self::Dust => "dust",
            Self::Sand => "sand",
            Self::Haze => "haze",
            Self::DustWhirls => "dust whirls",
            Self::Squalls => "squalls",
            Self::FunnelCloud => "funnel cloud",
            Self::Sandstorm => "sandstorm",
            Self::Duststorm => "duststorm",
        }
    }
}

impl fmt::Display for PresentWeather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phenomena = self
            .phenomena
            .iter()
            .map(|p| p.description())
            .collect::<Vec<_>>()
            .join(" and ");
        let described = match self.descriptor {
            None => phenomena,
            Some(descriptor) if phenomena.is_empty() => descriptor.description().to_string(),
            Some(Qualifier::Thunderstorm) => format!("thunderstorm with {phenomena}"),
            Some(Qualifier::Showers) => format!("{phenomena} showers"),
            Some(descriptor) => format!("{} {phenomena}", descriptor.description()),
        };
        match self.intensity {
            Some(WeatherIntensity::Light) => write!(f, "light {described}"),
            Some(WeatherIntensity::Heavy) => write!(f, "heavy {described}"),
            Some(WeatherIntensity::Vicinity) => write!(f, "{described} in the vicinity"),
            None => write!(f, "{described}"),
        }
    }
}

/// One visibility group. Statute miles with a whole part and a fraction are
/// expected joined by a single space, as in `1 1/2SM`.
pub(crate) fn nom_visibility(input: &str) -> nom::IResult<&str, Visibility> {
    alt((
        value(Visibility::Cavok, tag("CAVOK")),
        (
            alt((
                map(nom_statute_miles_visibility, VisibilityUnit::StatuteMiles),
                map(
                    OptionalData::optional_field(map_parser(take(4usize), all_consuming(u32))),
                    VisibilityUnit::Meters,
                ),
            )),
            opt(tag("NDV")).map(|ndv| ndv.is_some()),
        )
            .map(|(value, ndv)| Visibility::Reported { value, ndv }),
    ))
    .parse(input)
}

fn nom_fraction(input: &str) -> nom::IResult<&str, (u32, u32)> {
    separated_pair(u32, tag("/"), u32).parse(input)
}

fn nom_statute_miles_visibility(input: &str) -> nom::IResult<&str, StatuteMilesVisibility> {
    let fraction_only = map(
        (
            opt(nom_distance_modifier),
            terminated(nom_fraction, tag("SM")),
        ),
        |(modifier, fraction)| StatuteMilesVisibility {
            whole: None,
            fraction: Some(fraction),
            modifier,
        },
    );

    let whole = map(
        terminated(
            (
                opt(nom_distance_modifier),
                u32,
                opt(preceded(tag(" "), nom_fraction)),
            ),
            tag("SM"),
        ),
        |(modifier, whole, fraction)| StatuteMilesVisibility {
            whole: Some(whole),
            fraction,
            modifier,
        },
    );

    alt((fraction_only, whole)).parse(input)
}

fn nom_distance_modifier(input: &str) -> nom::IResult<&str, DistanceModifier> {
    alt((
        value(DistanceModifier::LessThan, tag("M")),
        value(DistanceModifier::GreaterThan, tag("P")),
    ))
    .parse(input)
}

fn nom_cloud_coverage(input: &str) -> nom::IResult<&str, OptionalData<CloudCoverage, 3>> {
    OptionalData::optional_field(alt((
        value(CloudCoverage::Few, tag("FEW")),
        value(CloudCoverage::Scattered, tag("SCT")),
        value(CloudCoverage::Broken, tag("BKN")),
        value(CloudCoverage::Overcast, tag("OVC")),
    )))
    .parse(input)
}

fn nom_cloud_height(input: &str) -> nom::IResult<&str, OptionalData<u32, 3>> {
    OptionalData::optional_field(map_parser(take(3usize), all_consuming(u32))).parse(input)
}

fn nom_cloud_type(input: &str) -> nom::IResult<&str, OptionalData<String, 3>> {
    OptionalData::optional_field(map(alphanumeric1, |s: &str| s.to_string())).parse(input)
}

pub(crate) fn nom_cloud(input: &str) -> nom::IResult<&str, Cloud> {
    alt((
        value(Cloud::NoCloudDetected, tag("NCD")),
        value(Cloud::NoSignificantCloud, tag("NSC")),
        value(Cloud::SkyClear, alt((tag("SKC"), tag("CLR")))),
        map(preceded(tag("VV"), nom_cloud_height), Cloud::VerticalVisibility),
        map(nom_cloud_layer, Cloud::Layer),
    ))
    .parse(input)
}

fn nom_cloud_layer(input: &str) -> nom::IResult<&str, CloudLayer> {
    let (input, coverage) = nom_cloud_coverage.parse(input)?;
    let (input, height) = nom_cloud_height.parse(input)?;
    let (input, cloud_type) = opt(nom_cloud_type).parse(input)?;
    Ok((
        input,
        CloudLayer {
            coverage,
            height,
            cloud_type,
        },
    ))
}

pub(crate) fn nom_present_weather(input: &str) -> nom::IResult<&str, PresentWeather> {
    map_res(
        (
            opt(alt((
                value(WeatherIntensity::Light, tag("-")),
                value(WeatherIntensity::Heavy, tag("+")),
                value(WeatherIntensity::Vicinity, tag("VC")),
            ))),
            opt(alt((
                value(Qualifier::Shallow, tag("MI")),
                value(Qualifier::Patches, tag("BC")),
                value(Qualifier::Partial, tag("PR")),
                value(Qualifier::LowDrifting, tag("DR")),
                value(Qualifier::Blowing, tag("BL")),
                value(Qualifier::Showers, tag("SH")),
                value(Qualifier::Thunderstorm, tag("TS")),
                value(Qualifier::Freezing, tag("FZ")),
            ))),
            many0(alt((
                value(WeatherPhenomenon::Drizzle, tag("DZ")),
                value(WeatherPhenomenon::Rain, tag("RA")),
                value(WeatherPhenomenon::Snow, tag("SN")),
                value(WeatherPhenomenon::SnowGrains, tag("SG")),
                value(WeatherPhenomenon::IcePellets, tag("PL")),
                value(WeatherPhenomenon::Hail, tag("GR")),
                value(WeatherPhenomenon::SmallHail, tag("GS")),
                value(WeatherPhenomenon::UnknownPrecipitation, tag("UP")),
                value(WeatherPhenomenon::Mist, tag("BR")),
                value(WeatherPhenomenon::Fog, tag("FG")),
                value(WeatherPhenomenon::Smoke, tag("FU")),
                value(WeatherPhenomenon::VolcanicAsh, tag("VA")),
                value(WeatherPhenomenon::Dust, tag("DU")),
                value(WeatherPhenomenon::Sand, tag("SA")),
                value(WeatherPhenomenon::Haze, tag("HZ")),
                value(WeatherPhenomenon::DustWhirls, tag("PO")),
                value(WeatherPhenomenon::Squalls, tag("SQ")),
                value(WeatherPhenomenon::FunnelCloud, tag("FC")),
                value(WeatherPhenomenon::Sandstorm, tag("SS")),
                value(WeatherPhenomenon::Duststorm, tag("DS")),
            ))),
        ),
        |(intensity, descriptor, phenomena)| {
            if descriptor.is_none() && phenomena.is_empty() {
                Err("At least one of descriptor, or phenomena must be present")
            } else {
                Ok(PresentWeather {
                    intensity,
                    descriptor,
                    phenomena,
                })
            }
        },
    )
    .parse(input)
}
