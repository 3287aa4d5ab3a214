use crate::processing::activity::{Decoded, Sample, SessionSummary};
use crate::processing::laps::ReconciledLap;
use crate::processing::profile::{self, session};
use crate::processing::raw::{BaseType, RawMessage};
use crate::processing::types::FitProcessError;

/// Recompute the session totals for the rewritten samples and laps.
///
/// Timer time is never changed, so the average speed is the new distance over
/// the recorded timer time. The maximum speed is the largest lap maximum.
pub fn aggregate_session(
    input: &Decoded<SessionSummary>,
    samples: &[Sample],
    laps: &[ReconciledLap],
) -> Result<(SessionSummary, RawMessage), FitProcessError> {
    let total_timer_time = input.value.total_timer_time;
    if total_timer_time.is_nan() || total_timer_time <= 0.0 {
        return Err(FitProcessError::DegenerateActivity(format!(
            "session timer time is {total_timer_time} s"
        )));
    }

    let total_distance = samples.last().map_or(0.0, |sample| sample.distance);
    let avg_speed = total_distance / total_timer_time;
    let max_speed = laps
        .iter()
        .map(|lap| lap.summary.max_speed)
        .fold(0.0, f64::max);

    let summary = SessionSummary {
        total_distance,
        avg_speed,
        max_speed,
        ..input.value.clone()
    };

    let mut message = input.message.clone();
    message.set_scaled(
        session::TOTAL_DISTANCE,
        BaseType::UInt32,
        total_distance,
        profile::DISTANCE_SCALE,
    );
    message.set_scaled(session::AVG_SPEED, BaseType::UInt16, avg_speed, profile::SPEED_SCALE);
    message.set_scaled(session::MAX_SPEED, BaseType::UInt16, max_speed, profile::SPEED_SCALE);
    message.set_scaled(
        session::ENHANCED_AVG_SPEED,
        BaseType::UInt32,
        avg_speed,
        profile::SPEED_SCALE,
    );
    message.set_scaled(
        session::ENHANCED_MAX_SPEED,
        BaseType::UInt32,
        max_speed,
        profile::SPEED_SCALE,
    );

    tracing::debug!(total_distance, avg_speed, max_speed, "aggregated session");
    Ok((summary, message))
}
