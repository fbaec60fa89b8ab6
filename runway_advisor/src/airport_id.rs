use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::error::ApplicationError;

/// ICAO airport code, upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AirportId(String);

impl AirportId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AirportId {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static ICAO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{4}$").unwrap());

        let normalized = s.trim().to_ascii_uppercase();
        if ICAO.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(ApplicationError::InvalidAirportId(s.to_string()))
        }
    }
}

impl fmt::Display for AirportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
