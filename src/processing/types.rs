use std::fmt;

use crate::processing::activity::{LapSummary, SessionSummary, SpeedAssignment};

/// Simplified representation of a FIT field for display in the UI.
#[derive(Debug, Clone)]
pub struct DisplayField {
    pub name: String,
    pub value: String,
}

/// Human-readable wrapper around a parsed FIT data record.
#[derive(Debug, Clone)]
pub struct DisplayRecord {
    pub message_type: String,
    pub fields: Vec<DisplayField>,
}

/// Processed FIT output returned to the web handler.
#[derive(Debug, Clone)]
pub struct ProcessedFit {
    /// Fields of the rewritten file, decoded again for rendering.
    pub records: Vec<DisplayRecord>,
    /// Re-encoded FIT payload with the new pace applied.
    pub processed_bytes: Vec<u8>,
    /// Laps written to the output, in order.
    pub laps: Vec<LapSummary>,
    pub session: SessionSummary,
    /// Summary metrics extracted from the rewritten activity.
    pub summary: WorkoutSummary,
}

/// Default threshold for synthesized laps, in meters.
pub const DEFAULT_AUTO_LAP_DISTANCE: f64 = 1000.0;

/// Caller-supplied target pace and lap handling.
///
/// Exactly one of `speed` and `speeds` must be set. See [`ProcessingOptions::plan`]
/// for the accepted combinations.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions {
    /// Uniform target speed in meters per second.
    pub speed: Option<f64>,
    /// One target speed per input lap, in meters per second.
    pub speeds: Option<Vec<f64>>,
    /// Replace the input laps with laps closed every `auto_lap_distance` meters.
    pub autolap: bool,
    /// Copy the input laps unchanged.
    pub keep_laps: bool,
    pub auto_lap_distance: f64,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            speed: None,
            speeds: None,
            autolap: false,
            keep_laps: false,
            auto_lap_distance: DEFAULT_AUTO_LAP_DISTANCE,
        }
    }
}

impl ProcessingOptions {
    pub fn uniform(speed: f64) -> Self {
        Self {
            speed: Some(speed),
            ..Default::default()
        }
    }

    pub fn per_lap(speeds: Vec<f64>) -> Self {
        Self {
            speeds: Some(speeds),
            ..Default::default()
        }
    }

    /// Validate the option combination and resolve it into a plan.
    pub fn plan(&self) -> Result<TransformPlan, FitProcessError> {
        let assignment = match (self.speed, &self.speeds) {
            (Some(_), Some(_)) => {
                return Err(FitProcessError::InvalidConfiguration(
                    "supply either a speed or per-lap speeds, not both".into(),
                ));
            }
            (None, None) => {
                return Err(FitProcessError::InvalidConfiguration(
                    "supply either a speed or per-lap speeds".into(),
                ));
            }
            (Some(speed), None) => {
                if !speed.is_finite() || speed <= 0.0 {
                    return Err(FitProcessError::InvalidConfiguration(format!(
                        "speed must be a positive number, got {speed}"
                    )));
                }
                SpeedAssignment::Uniform(speed)
            }
            (None, Some(speeds)) => {
                if speeds.is_empty() {
                    return Err(FitProcessError::InvalidConfiguration(
                        "per-lap speeds must not be empty".into(),
                    ));
                }
                if let Some(bad) = speeds.iter().find(|speed| !speed.is_finite() || **speed < 0.0) {
                    return Err(FitProcessError::InvalidConfiguration(format!(
                        "per-lap speeds must be zero or positive, got {bad}"
                    )));
                }
                SpeedAssignment::PerLap(speeds.clone())
            }
        };

        let laps = match &assignment {
            SpeedAssignment::PerLap(_) if self.keep_laps => {
                return Err(FitProcessError::InvalidConfiguration(
                    "keep_laps cannot be combined with per-lap speeds".into(),
                ));
            }
            SpeedAssignment::PerLap(_) if self.autolap => {
                return Err(FitProcessError::InvalidConfiguration(
                    "autolap requires a single speed".into(),
                ));
            }
            SpeedAssignment::PerLap(_) => LapMode::PerLapOverride,
            SpeedAssignment::Uniform(_) if self.autolap && self.keep_laps => {
                return Err(FitProcessError::InvalidConfiguration(
                    "autolap cannot be combined with keep_laps".into(),
                ));
            }
            SpeedAssignment::Uniform(_) if self.autolap => {
                if !self.auto_lap_distance.is_finite() || self.auto_lap_distance <= 0.0 {
                    return Err(FitProcessError::InvalidConfiguration(format!(
                        "auto lap distance must be positive, got {}",
                        self.auto_lap_distance
                    )));
                }
                LapMode::AutoLap {
                    distance: self.auto_lap_distance,
                }
            }
            SpeedAssignment::Uniform(_) if self.keep_laps => LapMode::Keep,
            SpeedAssignment::Uniform(_) => LapMode::Omit,
        };

        Ok(TransformPlan { assignment, laps })
    }
}

/// How laps are produced for the output file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LapMode {
    /// No lap messages are written.
    Omit,
    /// Input laps are copied unchanged.
    Keep,
    /// Input laps get the speed and distance of their assigned per-lap speed.
    PerLapOverride,
    /// New laps are closed every `distance` meters of resampled distance.
    AutoLap { distance: f64 },
}

/// Validated form of [`ProcessingOptions`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPlan {
    pub assignment: SpeedAssignment,
    pub laps: LapMode,
}

/// Derived overview metrics from the rewritten activity.
#[derive(Debug, Clone, Default)]
pub struct WorkoutSummary {
    pub duration_seconds: Option<f64>,
    pub workout_type: Option<String>,
    pub distance_meters: Option<f64>,
    pub lap_count: usize,
    pub speed_min: Option<f64>,
    pub speed_mean: Option<f64>,
    pub speed_max: Option<f64>,
    pub heart_rate_min: Option<f64>,
    pub heart_rate_mean: Option<f64>,
    pub heart_rate_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitProcessError {
    ParseError(String),
    InvalidHeader(String),
    InvalidConfiguration(String),
    LengthMismatch { expected: usize, actual: usize },
    MissingRequiredMessage(&'static str),
    DegenerateActivity(String),
    InvalidFormat(String),
    Unsupported(String),
}

impl fmt::Display for FitProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitProcessError::ParseError(msg) => write!(f, "Failed to decode FIT file: {msg}"),
            FitProcessError::InvalidHeader(msg) => write!(f, "Invalid FIT file: {msg}"),
            FitProcessError::InvalidConfiguration(msg) => write!(f, "Invalid options: {msg}"),
            FitProcessError::LengthMismatch { expected, actual } => write!(
                f,
                "Got {actual} per-lap speeds but the activity has {expected} laps"
            ),
            FitProcessError::MissingRequiredMessage(kind) => {
                write!(f, "FIT file has no {kind} message")
            }
            FitProcessError::DegenerateActivity(msg) => write!(f, "Cannot rewrite activity: {msg}"),
            FitProcessError::InvalidFormat(msg) => write!(f, "Invalid pace: {msg}"),
            FitProcessError::Unsupported(msg) => {
                write!(f, "Valid FIT file, but it uses {msg}, which cannot be rewritten")
            }
        }
    }
}

impl std::error::Error for FitProcessError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid_configuration(result: Result<TransformPlan, FitProcessError>) -> bool {
        matches!(result, Err(FitProcessError::InvalidConfiguration(_)))
    }

    #[test]
    fn speed_and_speeds_are_mutually_exclusive() {
        let both = ProcessingOptions {
            speed: Some(3.0),
            speeds: Some(vec![3.0]),
            ..Default::default()
        };
        assert!(is_invalid_configuration(both.plan()));
        assert!(is_invalid_configuration(ProcessingOptions::default().plan()));
    }

    #[test]
    fn keep_laps_rejects_per_lap_speeds() {
        let options = ProcessingOptions {
            keep_laps: true,
            ..ProcessingOptions::per_lap(vec![3.0, 4.0])
        };
        assert!(is_invalid_configuration(options.plan()));
    }

    #[test]
    fn autolap_requires_a_uniform_speed() {
        let per_lap = ProcessingOptions {
            autolap: true,
            ..ProcessingOptions::per_lap(vec![3.0])
        };
        assert!(is_invalid_configuration(per_lap.plan()));

        let with_keep = ProcessingOptions {
            autolap: true,
            keep_laps: true,
            ..ProcessingOptions::uniform(3.0)
        };
        assert!(is_invalid_configuration(with_keep.plan()));
    }

    #[test]
    fn non_positive_uniform_speed_is_rejected() {
        assert!(is_invalid_configuration(ProcessingOptions::uniform(0.0).plan()));
        assert!(is_invalid_configuration(
            ProcessingOptions::uniform(f64::NAN).plan()
        ));
    }

    #[test]
    fn zero_per_lap_speed_marks_a_stationary_lap() {
        let plan = ProcessingOptions::per_lap(vec![3.0, 0.0])
            .plan()
            .expect("zero is a valid per-lap speed");
        assert_eq!(plan.laps, LapMode::PerLapOverride);
    }

    #[test]
    fn lap_mode_follows_flags() {
        let plan = ProcessingOptions::uniform(4.0).plan().expect("valid");
        assert_eq!(plan.laps, LapMode::Omit);

        let keep = ProcessingOptions {
            keep_laps: true,
            ..ProcessingOptions::uniform(4.0)
        };
        assert_eq!(keep.plan().expect("valid").laps, LapMode::Keep);

        let auto = ProcessingOptions {
            autolap: true,
            ..ProcessingOptions::uniform(4.0)
        };
        assert_eq!(
            auto.plan().expect("valid").laps,
            LapMode::AutoLap { distance: 1000.0 }
        );
    }
}
