use std::str::FromStr;

use nom::{
    Finish, IResult, Parser,
    bytes::complete::{tag, take},
    character::complete::char,
    combinator::{all_consuming, opt},
    sequence::preceded,
};
use tracing::trace;

use crate::{
    obscuration::{
        Cloud, PresentWeather, Visibility, nom_cloud, nom_present_weather, nom_visibility,
    },
    pressure::{Pressure, nom_pressure},
    temperature::{TemperatureInfo, nom_temperature_info},
    timestamp::{Timestamp, nom_metar_timestamp},
    wind::{Wind, nom_wind},
};

#[derive(Debug, Clone)]
pub struct Metar {
    pub raw: String,
    pub icao: String,
    pub timestamp: Timestamp,
    pub auto: bool,
    pub wind: Wind,
    pub visibility: Option<Visibility>,
    pub weather: Vec<PresentWeather>,
    pub clouds: Vec<Cloud>,
    /// Groups before the temperature that are not decoded, such as RVR.
    pub other_groups: Vec<String>,
    pub temperature: Option<TemperatureInfo>,
    pub pressure: Option<Pressure>,
    /// Trend and other groups after the pressure group.
    pub supplementary: Vec<String>,
    pub remarks: Option<String>,
}

impl FromStr for Metar {
    type Err = nom::error::Error<String>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, metar) = nom_parse_metar(s.trim())
            .finish()
            .map_err(|e| nom::error::Error::new(e.input.to_string(), e.code))?;
        Ok(metar)
    }
}

fn nom_header(input: &str) -> IResult<&str, (&str, Timestamp, bool, Wind)> {
    (
        preceded(opt(tag("METAR ")), take(4usize)),
        preceded(char(' '), nom_metar_timestamp),
        opt(tag(" AUTO")),
        preceded(char(' '), nom_wind),
    )
        .map(|(icao, timestamp, auto, wind)| (icao, timestamp, auto.is_some(), wind))
        .parse(input)
}

pub fn nom_parse_metar(input: &str) -> IResult<&str, Metar> {
    let (body, (icao, timestamp, auto, wind)) = nom_header(input)?;
    let (body, remarks) = match body.split_once(" RMK ") {
        Some((body, remarks)) => (body, Some(remarks.trim().to_string())),
        None => (body, None),
    };

    let mut visibility = None;
    let mut weather = Vec::new();
    let mut clouds = Vec::new();
    let mut other_groups = Vec::new();
    let mut supplementary = Vec::new();
    let mut temperature = None;
    let mut pressure = None;

    let mut groups = body.split_whitespace().peekable();
    while let Some(group) = groups.next() {
        if temperature.is_none() {
            if let Ok((_, info)) = all_consuming(nom_temperature_info).parse(group) {
                temperature = Some(info);
                continue;
            }
            if visibility.is_none() && clouds.is_empty() {
                // `1 1/2SM` arrives as two groups.
                if let Some(&next) = groups.peek()
                    && group.len() <= 2
                    && group.bytes().all(|b| b.is_ascii_digit())
                    && next.contains('/')
                    && next.ends_with("SM")
                {
                    let joined = format!("{group} {next}");
                    if let Ok((_, v)) = all_consuming(nom_visibility).parse(joined.as_str()) {
                        visibility = Some(v);
                        groups.next();
                        continue;
                    }
                }
                if let Ok((_, v)) = all_consuming(nom_visibility).parse(group) {
                    visibility = Some(v);
                    continue;
                }
            }
            if let Ok((_, w)) = all_consuming(nom_present_weather).parse(group) {
                weather.push(w);
            } else if let Ok((_, cloud)) = all_consuming(nom_cloud).parse(group) {
                clouds.push(cloud);
            } else {
                trace!(icao, group, "Group before temperature kept undecoded");
                other_groups.push(group.to_string());
            }
        } else if pressure.is_none()
            && let Ok((_, p)) = all_consuming(nom_pressure).parse(group)
        {
            pressure = Some(p);
        } else {
            trace!(icao, group, "Group after temperature kept unparsed");
            supplementary.push(group.to_string());
        }
    }

    Ok((
        "",
        Metar {
            raw: input.to_string(),
            icao: icao.to_string(),
            timestamp,
            auto,
            wind,
            visibility,
            weather,
            clouds,
            other_groups,
            temperature,
            pressure,
            supplementary,
            remarks,
        },
    ))
}
