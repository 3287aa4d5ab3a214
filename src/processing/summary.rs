use crate::processing::activity::{LapSummary, Sample, SessionSummary};
use crate::processing::display::first_field_value;
use crate::processing::types::{DisplayRecord, WorkoutSummary};

/// Overview metrics of a rewritten activity.
///
/// Distance and mean speed come from the rewritten session so the overview
/// agrees with what the download contains. Heart rate statistics ignore
/// samples without a reading.
pub fn derive_workout_summary(
    samples: &[Sample],
    laps: &[LapSummary],
    session: &SessionSummary,
    records: &[DisplayRecord],
) -> WorkoutSummary {
    let timestamps: Vec<f64> = samples
        .iter()
        .map(|sample| f64::from(sample.timestamp.0))
        .collect();

    let positive_speeds: Vec<f64> = samples
        .iter()
        .map(|sample| sample.speed)
        .filter(|speed| *speed > 0.0)
        .collect();

    let heart_rates: Vec<f64> = samples
        .iter()
        .filter_map(|sample| sample.heart_rate)
        .map(f64::from)
        .collect();

    let heart_rate_mean = if heart_rates.is_empty() {
        None
    } else {
        Some(heart_rates.iter().sum::<f64>() / heart_rates.len() as f64)
    };

    WorkoutSummary {
        duration_seconds: derive_duration(&timestamps).or(Some(session.total_elapsed_time)),
        workout_type: first_field_value(records, "sport").map(str::to_string),
        distance_meters: Some(session.total_distance),
        lap_count: laps.len(),
        speed_min: positive_speeds.iter().copied().reduce(f64::min),
        speed_mean: Some(session.avg_speed).filter(|speed| *speed > 0.0),
        speed_max: positive_speeds.iter().copied().reduce(f64::max),
        heart_rate_min: heart_rates.iter().copied().reduce(f64::min),
        heart_rate_mean,
        heart_rate_max: heart_rates.iter().copied().reduce(f64::max),
    }
}

fn derive_duration(timestamps: &[f64]) -> Option<f64> {
    if timestamps.is_empty() {
        return None;
    }
    let (min_ts, max_ts) = timestamps
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |acc, &ts| {
            (acc.0.min(ts), acc.1.max(ts))
        });
    Some(max_ts - min_ts)
}
