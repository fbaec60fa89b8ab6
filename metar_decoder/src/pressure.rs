use nom::{
    IResult, Parser,
    bytes::complete::take,
    character::complete::{self, u32},
    combinator::{all_consuming, map_parser, opt, value},
};

use crate::optional_data::OptionalData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pressure {
    pub qnh: Option<PressureSingle>,
    pub altimeter: Option<PressureSingle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressureSingle {
    pub value: OptionalData<u32, 4>,
    pub unit: PressureUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    Hectopascals,
    /// Hundredths of an inch, `A2992`.
    InchesOfMercury,
}

impl PressureUnit {
    const fn pressure_letter(&self) -> char {
        match self {
            PressureUnit::Hectopascals => 'Q',
            PressureUnit::InchesOfMercury => 'A',
        }
    }
}

impl PressureSingle {
    pub fn hectopascals(&self) -> Option<u32> {
        let value = self.value.to_option()?;
        Some(match self.unit {
            PressureUnit::Hectopascals => value,
            PressureUnit::InchesOfMercury => (f64::from(value) * 0.338_639).round() as u32,
        })
    }
}

impl Pressure {
    /// QNH in hPa, converted from the altimeter setting when no Q group is reported.
    pub fn qnh_hectopascals(&self) -> Option<u32> {
        self.qnh
            .and_then(|q| q.hectopascals())
            .or_else(|| self.altimeter.and_then(|a| a.hectopascals()))
    }
}

pub(crate) fn nom_pressure(input: &str) -> IResult<&str, Pressure> {
    let hectopascals = move |i| nom_pressure_single(i, PressureUnit::Hectopascals);
    let inches_of_mercury = move |i| nom_pressure_single(i, PressureUnit::InchesOfMercury);
    (opt(hectopascals), opt(inches_of_mercury))
        .map_res(|(qnh, altimeter)| {
            if qnh.is_some() || altimeter.is_some() {
                Ok(Pressure { qnh, altimeter })
            } else {
                Err("At least one of QNH or Altimeter must be present")
            }
        })
        .parse(input)
}

fn nom_pressure_single(input: &str, pressure_unit: PressureUnit) -> IResult<&str, PressureSingle> {
    (
        value(
            pressure_unit,
            complete::char(pressure_unit.pressure_letter()),
        ),
        OptionalData::optional_field(map_parser(take(4usize), all_consuming(u32))),
    )
        .map(|(unit, value)| PressureSingle { value, unit })
        .parse(input)
}
