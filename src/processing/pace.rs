use crate::processing::types::FitProcessError;

/// Distance a pace is expressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    #[default]
    Kilometer,
    Mile,
}

impl DistanceUnit {
    pub fn meters(self) -> f64 {
        match self {
            DistanceUnit::Kilometer => 1000.0,
            DistanceUnit::Mile => 1609.34,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::Kilometer => "km",
            DistanceUnit::Mile => "mi",
        }
    }

    /// Parse the unit selector submitted by the upload form.
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value.trim() {
            "km" | "kilometer" => Some(DistanceUnit::Kilometer),
            "mi" | "mile" => Some(DistanceUnit::Mile),
            _ => None,
        }
    }
}

/// Convert a `M:SS` or `MM:SS` pace per `unit_meters` into meters per second.
///
/// `00:00` yields a speed of zero, which per-lap speeds use for laps spent
/// standing still.
pub fn pace_to_speed(pace: &str, unit_meters: f64) -> Result<f64, FitProcessError> {
    let invalid = || FitProcessError::InvalidFormat(format!("expected MM:SS, got {pace:?}"));

    let (minutes, seconds) = pace.trim().split_once(':').ok_or_else(invalid)?;
    let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    if !(1..=2).contains(&minutes.len())
        || seconds.len() != 2
        || !all_digits(minutes)
        || !all_digits(seconds)
    {
        return Err(invalid());
    }

    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    let seconds: u32 = seconds.parse().map_err(|_| invalid())?;
    if seconds > 59 {
        return Err(invalid());
    }

    let total_seconds = minutes * 60 + seconds;
    if total_seconds == 0 {
        return Ok(0.0);
    }
    Ok(unit_meters / f64::from(total_seconds))
}

/// Inverse of [`pace_to_speed`], rounded to whole seconds. Pace is undefined
/// for zero, negative or non-finite speeds.
pub fn speed_to_pace(speed: f64, unit_meters: f64) -> Option<String> {
    if !speed.is_finite() || speed <= 0.0 {
        return None;
    }
    let total_seconds = (unit_meters / speed).round();
    if !total_seconds.is_finite() {
        return None;
    }
    let total_seconds = total_seconds as u64;
    Some(format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60))
}

/// Split a list of paces separated by commas, semicolons or whitespace.
pub fn parse_pace_list(input: &str, unit_meters: f64) -> Result<Vec<f64>, FitProcessError> {
    input
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| pace_to_speed(part, unit_meters))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_minute_kilometer_is_3_33_meters_per_second() {
        let speed = pace_to_speed("5:00", 1000.0).expect("valid pace");
        assert!((speed - 1000.0 / 300.0).abs() < 1e-12);
        assert_eq!(pace_to_speed("05:00", 1000.0), Ok(speed));
    }

    #[test]
    fn malformed_paces_are_rejected() {
        for pace in ["", "5", "5:6", "5:60", "123:00", "a:bc", "5:-1", "5:00:00"] {
            assert!(
                matches!(pace_to_speed(pace, 1000.0), Err(FitProcessError::InvalidFormat(_))),
                "{pace:?} should be rejected"
            );
        }
    }

    #[test]
    fn zero_pace_means_standing_still() {
        assert_eq!(pace_to_speed("00:00", 1000.0), Ok(0.0));
    }

    #[test]
    fn pace_is_undefined_without_motion() {
        assert_eq!(speed_to_pace(0.0, 1000.0), None);
        assert_eq!(speed_to_pace(-1.0, 1000.0), None);
        assert_eq!(speed_to_pace(f64::NAN, 1000.0), None);
    }

    #[test]
    fn paces_round_trip_within_a_second() {
        for unit in [DistanceUnit::Kilometer, DistanceUnit::Mile] {
            for minutes in 3..=12u32 {
                for seconds in (0..60u32).step_by(7) {
                    let pace = format!("{minutes:02}:{seconds:02}");
                    let speed = pace_to_speed(&pace, unit.meters()).expect("valid pace");
                    let back = speed_to_pace(speed, unit.meters()).expect("positive speed");
                    assert_eq!(back, pace);
                }
            }
        }
    }

    #[test]
    fn pace_lists_accept_common_separators() {
        let speeds = parse_pace_list("6:00, 4:45;00:00\n5:00", 1000.0).expect("valid list");
        assert_eq!(speeds.len(), 4);
        assert_eq!(speeds[2], 0.0);
        assert!(parse_pace_list("6:00, nope", 1000.0).is_err());
    }

    #[test]
    fn units_parse_from_form_values() {
        assert_eq!(
            DistanceUnit::from_form_value("km"),
            Some(DistanceUnit::Kilometer)
        );
        assert_eq!(DistanceUnit::from_form_value("mile"), Some(DistanceUnit::Mile));
        assert_eq!(DistanceUnit::from_form_value("furlong"), None);
    }
}
