use jiff::{ToSpan, Zoned, civil::Date, tz::TimeZone};
use nom::{
    IResult, Parser,
    bytes::complete::take,
    character::complete::{self, char},
    combinator::{all_consuming, map_parser},
};

/// Observation time as reported in the METAR: day of month and UTC time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl Timestamp {
    /// Resolves the day-of-month stamp against `now`. A day later than today
    /// belongs to the previous month.
    pub fn observed_at(&self, now: &Zoned) -> Option<Zoned> {
        let today = now.with_time_zone(TimeZone::UTC).date();
        let mut month = today.first_of_month();
        if i8::try_from(self.day).ok()? > today.day() {
            month = month.checked_sub(1.month()).ok()?;
        }
        Date::new(month.year(), month.month(), self.day as i8)
            .ok()?
            .at(self.hour as i8, self.minute as i8, 0, 0)
            .to_zoned(TimeZone::UTC)
            .ok()
    }
}

fn two_digits(input: &str) -> IResult<&str, u8> {
    map_parser(take(2usize), all_consuming(complete::u8)).parse(input)
}

pub(crate) fn nom_metar_timestamp(input: &str) -> IResult<&str, Timestamp> {
    (two_digits, two_digits, two_digits, char('Z'))
        .map_res(|(day, hour, minute, _)| {
            if (1..=31).contains(&day) && hour < 24 && minute < 60 {
                Ok(Timestamp { day, hour, minute })
            } else {
                Err("Timestamp out of range")
            }
        })
        .parse(input)
}
