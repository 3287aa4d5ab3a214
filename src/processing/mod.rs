pub mod activity;
pub mod assemble;
pub mod decode;
pub mod display;
pub mod encode;
pub mod laps;
pub mod pace;
pub mod parse;
pub mod profile;
pub mod raw;
pub mod resample;
pub mod session;
pub mod summary;
pub mod transform;
pub mod types;

use decode::decode_activity;
use display::to_display_records;
use encode::encode_fit;
use fitparser::from_bytes;
use parse::parse_fit;
use summary::derive_workout_summary;
use transform::transform;

pub use activity::{LapSummary, SessionSummary};
pub use pace::{DistanceUnit, pace_to_speed, parse_pace_list, speed_to_pace};
pub use types::{
    DisplayField, DisplayRecord, FitProcessError, ProcessedFit, ProcessingOptions, WorkoutSummary,
};

/// Laps and session of an uploaded file, before anything is rewritten.
#[derive(Debug, Clone)]
pub struct InspectedFit {
    pub laps: Vec<LapSummary>,
    pub session: Option<SessionSummary>,
    pub record_count: usize,
}

/// Rewrite the pace of a FIT activity.
///
/// The function performs five stages:
/// 1. [`parse::parse_fit`] validates FIT framing and CRCs and splits the data
///    section into raw messages.
/// 2. [`decode::decode_activity`] extracts typed records, laps and the session.
/// 3. [`transform::transform`] resamples the records and rebuilds laps and
///    session for the requested speed.
/// 4. [`encode::encode_fit`] writes the messages back behind the input header.
/// 5. The output is decoded again with [`from_bytes`], which both proves it is
///    readable and feeds [`display::to_display_records`] and
///    [`summary::derive_workout_summary`].
pub fn process_fit_bytes(
    bytes: &[u8],
    options: &ProcessingOptions,
) -> Result<ProcessedFit, FitProcessError> {
    let parsed = parse_fit(bytes)?;
    let activity = decode_activity(parsed.messages)?;
    let transformed = transform(&activity, options)?;

    let processed_bytes = encode_fit(&parsed.header, &transformed.messages)?;
    let redecoded = from_bytes(&processed_bytes)
        .map_err(|err| FitProcessError::ParseError(format!("rewritten file: {err}")))?;

    let records = to_display_records(&redecoded);
    let summary = derive_workout_summary(
        &transformed.samples,
        &transformed.laps,
        &transformed.session,
        &records,
    );

    tracing::info!(
        input_bytes = bytes.len(),
        output_bytes = processed_bytes.len(),
        laps = transformed.laps.len(),
        distance = transformed.session.total_distance,
        "rewrote activity"
    );

    Ok(ProcessedFit {
        records,
        processed_bytes,
        laps: transformed.laps,
        session: transformed.session,
        summary,
    })
}

/// Decode a FIT activity just far enough to list its laps.
pub fn inspect_fit_bytes(bytes: &[u8]) -> Result<InspectedFit, FitProcessError> {
    let parsed = parse_fit(bytes)?;
    let activity = decode_activity(parsed.messages)?;

    Ok(InspectedFit {
        laps: activity.laps.iter().map(|lap| lap.value.clone()).collect(),
        session: activity.sessions.first().map(|session| session.value.clone()),
        record_count: activity.records.len(),
    })
}
