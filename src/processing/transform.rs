use crate::processing::activity::{DecodedActivity, LapSummary, Sample, SessionSummary, SpeedAssignment};
use crate::processing::assemble::assemble_messages;
use crate::processing::laps::reconcile_laps;
use crate::processing::raw::RawMessage;
use crate::processing::resample::resample_records;
use crate::processing::session::aggregate_session;
use crate::processing::types::{FitProcessError, LapMode, ProcessingOptions};

/// Result of rewriting an activity: the messages to encode plus typed views
/// of what was written.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub messages: Vec<RawMessage>,
    pub samples: Vec<Sample>,
    pub laps: Vec<LapSummary>,
    pub session: SessionSummary,
}

/// Rewrite the pace of a decoded activity.
///
/// All input validation happens before any output is built; on error nothing
/// is returned but the error.
pub fn transform(
    activity: &DecodedActivity,
    options: &ProcessingOptions,
) -> Result<Transformed, FitProcessError> {
    let plan = options.plan()?;

    if activity.file_ids.is_empty() {
        return Err(FitProcessError::MissingRequiredMessage("file_id"));
    }
    let session = activity
        .sessions
        .first()
        .ok_or(FitProcessError::MissingRequiredMessage("session"))?;
    if activity.sessions.len() > 1 {
        tracing::warn!(
            sessions = activity.sessions.len(),
            "only the first session is rewritten"
        );
    }

    if let SpeedAssignment::PerLap(speeds) = &plan.assignment {
        if speeds.len() != activity.laps.len() {
            return Err(FitProcessError::LengthMismatch {
                expected: activity.laps.len(),
                actual: speeds.len(),
            });
        }
    }

    let windows = match plan.assignment {
        SpeedAssignment::PerLap(_) => activity.lap_windows(),
        SpeedAssignment::Uniform(_) => Vec::new(),
    };
    let samples = resample_records(&activity.samples(), &plan.assignment, &windows);
    tracing::debug!(samples = samples.len(), "resampled records");

    let laps = reconcile_laps(plan.laps, &plan.assignment, &activity.laps, &samples)?;
    let (session_summary, session_message) = aggregate_session(session, &samples, &laps)?;
    let messages = assemble_messages(activity, &samples, &laps, session_message)?;

    if matches!(plan.laps, LapMode::Omit) && !activity.laps.is_empty() {
        tracing::debug!(dropped = activity.laps.len(), "input laps omitted");
    }

    Ok(Transformed {
        messages,
        samples,
        laps: laps.into_iter().map(|lap| lap.summary).collect(),
        session: session_summary,
    })
}
