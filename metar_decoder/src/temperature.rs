use std::fmt;

use nom::{
    IResult, Parser,
    character::complete::{char, i32},
    combinator::opt,
    sequence::separated_pair,
};

use crate::optional_data::OptionalData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureInfo {
    pub temp: OptionalData<i32, 2>,
    pub dew_point: OptionalData<i32, 2>,
}

pub(crate) fn nom_temperature_info(input: &str) -> IResult<&str, TemperatureInfo> {
    separated_pair(
        OptionalData::optional_field(nom_maybe_negative_temp),
        char('/'),
        OptionalData::optional_field(nom_maybe_negative_temp),
    )
    .map(|(temp, dew_point)| TemperatureInfo { temp, dew_point })
    .parse(input)
}

pub(crate) fn nom_maybe_negative_temp(input: &str) -> IResult<&str, i32> {
    (opt(char('M')), i32)
        .map(|(sign, temp)| if sign.is_some() { -temp } else { temp })
        .parse(input)
}

impl fmt::Display for TemperatureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let celsius = |value: &OptionalData<i32, 2>| match value {
            OptionalData::Data(v) => format!("{v}°C"),
            OptionalData::Undefined => "N/A".to_string(),
        };
        write!(
            f,
            "{} / dew point {}",
            celsius(&self.temp),
            celsius(&self.dew_point)
        )
    }
}
