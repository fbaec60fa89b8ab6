use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take, take_while_m_n},
    character::complete::{char, u32},
    combinator::{all_consuming, map_parser, opt, value},
    sequence::{preceded, separated_pair},
};

use crate::optional_data::OptionalData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wind {
    pub dir: WindDirection,
    pub speed: WindVelocity,
    /// Extremes of a `dddVddd` group.
    pub varying: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindDirection {
    Heading(OptionalData<u32, 3>),
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindVelocity {
    pub velocity: OptionalData<u32, 2>,
    pub gust: Option<u32>,
    pub unit: VelocityUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityUnit {
    Knots,
    MetersPerSecond,
    KilometersPerHour,
}

impl VelocityUnit {
    pub fn to_knots(self, value: u32) -> u32 {
        let knots = match self {
            Self::Knots => return value,
            Self::MetersPerSecond => f64::from(value) * 1.943_844,
            Self::KilometersPerHour => f64::from(value) / 1.852,
        };
        knots.round() as u32
    }
}

impl WindVelocity {
    pub fn mean_knots(&self) -> Option<u32> {
        self.velocity.to_option().map(|v| self.unit.to_knots(v))
    }
}

impl Wind {
    /// `00000KT`
    pub fn is_calm(&self) -> bool {
        self.dir == WindDirection::Heading(OptionalData::Data(0))
            && self.speed.velocity == OptionalData::Data(0)
            && self.speed.gust.is_none()
    }
}

fn three_digits(input: &str) -> IResult<&str, u32> {
    map_parser(take(3usize), all_consuming(u32)).parse(input)
}

fn speed_digits(input: &str) -> IResult<&str, u32> {
    map_parser(take_while_m_n(2, 3, |c: char| c.is_ascii_digit()), u32).parse(input)
}

fn nom_wind_direction(input: &str) -> IResult<&str, WindDirection> {
    alt((
        value(WindDirection::Variable, tag("VRB")),
        OptionalData::optional_field(three_digits).map(WindDirection::Heading),
    ))
    .parse(input)
}

fn nom_velocity_unit(input: &str) -> IResult<&str, VelocityUnit> {
    alt((
        value(VelocityUnit::Knots, tag("KT")),
        value(VelocityUnit::MetersPerSecond, tag("MPS")),
        value(VelocityUnit::KilometersPerHour, tag("KMH")),
    ))
    .parse(input)
}

pub(crate) fn nom_wind(input: &str) -> IResult<&str, Wind> {
    (
        nom_wind_direction,
        OptionalData::optional_field(speed_digits),
        opt(preceded(char('G'), speed_digits)),
        nom_velocity_unit,
        opt(preceded(
            char(' '),
            separated_pair(three_digits, char('V'), three_digits),
        )),
    )
        .map(|(dir, velocity, gust, unit, varying)| Wind {
            dir,
            speed: WindVelocity {
                velocity,
                gust,
                unit,
            },
            varying,
        })
        .parse(input)
}
