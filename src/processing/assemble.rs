use crate::processing::activity::{DecodedActivity, Sample};
use crate::processing::laps::ReconciledLap;
use crate::processing::profile::{self, record};
use crate::processing::raw::{BaseType, RawMessage};
use crate::processing::types::FitProcessError;

/// Order the output messages the way FIT activity files must be laid out:
/// file id first, then developer data ids, field descriptions, device info,
/// records, events, laps, the session and finally the activity.
///
/// `samples` must be the resampled counterpart of `activity.records`, index
/// for index.
pub fn assemble_messages(
    activity: &DecodedActivity,
    samples: &[Sample],
    laps: &[ReconciledLap],
    session: RawMessage,
) -> Result<Vec<RawMessage>, FitProcessError> {
    let file_id = activity
        .file_ids
        .first()
        .ok_or(FitProcessError::MissingRequiredMessage("file_id"))?;

    if samples.len() != activity.records.len() {
        return Err(FitProcessError::InvalidConfiguration(format!(
            "{} resampled records for {} input records",
            samples.len(),
            activity.records.len()
        )));
    }

    let capacity = 2
        + activity.developer_data_ids.len()
        + activity.field_descriptions.len()
        + activity.device_infos.len()
        + samples.len()
        + activity.events.len()
        + laps.len()
        + activity.activities.len();
    let mut messages = Vec::with_capacity(capacity);

    messages.push(file_id.clone());
    messages.extend(activity.developer_data_ids.iter().cloned());
    messages.extend(activity.field_descriptions.iter().cloned());
    messages.extend(activity.device_infos.iter().cloned());
    messages.extend(
        activity
            .records
            .iter()
            .zip(samples)
            .map(|(input, sample)| rewrite_record(&input.message, sample)),
    );
    messages.extend(activity.events.iter().cloned());
    messages.extend(laps.iter().map(|lap| lap.message.clone()));
    messages.push(session);
    messages.extend(activity.activities.iter().cloned());

    Ok(messages)
}

/// Copy a record message with the resampled distance and speed written in.
pub fn rewrite_record(message: &RawMessage, sample: &Sample) -> RawMessage {
    let mut message = message.clone();
    message.set_scaled(
        record::DISTANCE,
        BaseType::UInt32,
        sample.distance,
        profile::DISTANCE_SCALE,
    );
    message.set_scaled(record::SPEED, BaseType::UInt16, sample.speed, profile::SPEED_SCALE);
    message.set_scaled(
        record::ENHANCED_SPEED,
        BaseType::UInt32,
        sample.speed,
        profile::SPEED_SCALE,
    );
    message
}
