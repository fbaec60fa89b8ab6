use std::fmt;

use serde::Serialize;

/// Wind used for runway alignment. `direction: None` is variable or calm wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WindObservation {
    pub direction: Option<u16>,
    pub speed_kts: Option<u32>,
}

impl WindObservation {
    pub fn from_direction(degrees: u16) -> Self {
        Self {
            direction: Some(degrees % 360),
            speed_kts: None,
        }
    }

    pub fn variable() -> Self {
        Self::default()
    }
}

impl fmt::Display for WindObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.direction, self.speed_kts) {
            (Some(dir), Some(speed)) => write!(f, "{dir:03}° {speed}KT"),
            (Some(dir), None) => write!(f, "{dir:03}°"),
            (None, Some(0)) => f.write_str("calm"),
            (None, Some(speed)) => write!(f, "VRB {speed}KT"),
            (None, None) => f.write_str("VRB"),
        }
    }
}

/// Heading of a runway end from its designator, `"02L"` → 20. `"36"` wraps to 0.
pub fn heading_from_identifier(identifier: &str) -> Option<u16> {
    let digits = identifier.get(..2)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: u16 = digits.parse().ok()?;
    Some((number * 10) % 360)
}

pub fn angular_difference(a: u16, b: u16) -> u16 {
    let diff = (i32::from(a) - i32::from(b)).unsigned_abs() % 360;
    diff.min(360 - diff) as u16
}

pub fn is_aligned(heading: u16, wind: Option<u16>) -> bool {
    match wind {
        Some(wind) => angular_difference(heading, wind) <= 90,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_from_identifier() {
        assert_eq!(heading_from_identifier("02L"), Some(20));
        assert_eq!(heading_from_identifier("20C"), Some(200));
        assert_eq!(heading_from_identifier("15"), Some(150));
        assert_eq!(heading_from_identifier("36"), Some(0));
    }

    #[test]
    fn test_malformed_identifier_has_no_heading() {
        for identifier in ["", "7", "H1", "L07", "0L", "ÅÅ"] {
            assert_eq!(heading_from_identifier(identifier), None, "{identifier}");
        }
    }

    #[test]
    fn test_angular_difference() {
        assert_eq!(angular_difference(10, 350), 20);
        assert_eq!(angular_difference(0, 180), 180);
        assert_eq!(angular_difference(270, 90), 180);
        assert_eq!(angular_difference(90, 270), 180);
        assert_eq!(angular_difference(0, 0), 0);
        assert_eq!(angular_difference(70, 75), 5);
        assert_eq!(angular_difference(250, 75), 175);
    }

    #[test]
    fn test_angular_difference_is_symmetric_and_bounded() {
        for a in 0..360 {
            for b in 0..360 {
                let diff = angular_difference(a, b);
                assert_eq!(diff, angular_difference(b, a));
                assert!(diff <= 180, "{a} {b} gave {diff}");
            }
        }
    }

    #[test]
    fn test_variable_wind_is_aligned_with_everything() {
        assert!((0..360).all(|heading| is_aligned(heading, None)));
    }

    #[test]
    fn test_alignment_boundary_is_inclusive() {
        assert!(is_aligned(0, Some(90)));
        assert!(!is_aligned(0, Some(91)));
        assert!(!is_aligned(0, Some(180)));
        assert!(!is_aligned(0, Some(269)));
        // 270 is 90 degrees from 0 the other way round, same as 90.
        assert!(is_aligned(0, Some(270)));
    }

    #[test]
    fn test_wind_display() {
        assert_eq!(WindObservation::from_direction(20).to_string(), "020°");
        assert_eq!(
            WindObservation {
                direction: Some(200),
                speed_kts: Some(12)
            }
            .to_string(),
            "200° 12KT"
        );
        assert_eq!(WindObservation::variable().to_string(), "VRB");
        assert_eq!(
            WindObservation {
                direction: None,
                speed_kts: Some(0)
            }
            .to_string(),
            "calm"
        );
    }
}
