use crate::processing::activity::{
    Decoded, DecodedActivity, LapSummary, LapTrigger, Sample, SessionSummary, Timestamp,
};
use crate::processing::profile::{self, lap, mesg, record, session};
use crate::processing::raw::RawMessage;
use crate::processing::types::FitProcessError;

/// Group data messages by kind and decode the ones the rewrite works on.
pub fn decode_activity(messages: Vec<RawMessage>) -> Result<DecodedActivity, FitProcessError> {
    let mut activity = DecodedActivity::default();

    for message in messages {
        match message.global_mesg_num() {
            mesg::FILE_ID => activity.file_ids.push(message),
            mesg::DEVELOPER_DATA_ID => activity.developer_data_ids.push(message),
            mesg::FIELD_DESCRIPTION => activity.field_descriptions.push(message),
            mesg::DEVICE_INFO => activity.device_infos.push(message),
            mesg::EVENT => activity.events.push(message),
            mesg::ACTIVITY => activity.activities.push(message),
            mesg::RECORD => {
                let value = decode_sample(&message, activity.records.len())?;
                activity.records.push(Decoded { value, message });
            }
            mesg::LAP => {
                let value = decode_lap(&message, activity.laps.len())?;
                activity.laps.push(Decoded { value, message });
            }
            mesg::SESSION => {
                let value = decode_session(&message);
                activity.sessions.push(Decoded { value, message });
            }
            _ => activity.dropped += 1,
        }
    }

    tracing::debug!(
        records = activity.records.len(),
        laps = activity.laps.len(),
        sessions = activity.sessions.len(),
        dropped = activity.dropped,
        "decoded activity messages"
    );

    Ok(activity)
}

pub fn decode_sample(message: &RawMessage, index: usize) -> Result<Sample, FitProcessError> {
    let timestamp = message
        .read_u32(record::TIMESTAMP)
        .map(Timestamp)
        .ok_or_else(|| FitProcessError::ParseError(format!("record {index} has no timestamp")))?;

    let speed = message
        .read_scaled(record::ENHANCED_SPEED, profile::SPEED_SCALE)
        .or_else(|| message.read_scaled(record::SPEED, profile::SPEED_SCALE))
        .unwrap_or(0.0);

    Ok(Sample {
        timestamp,
        distance: message
            .read_scaled(record::DISTANCE, profile::DISTANCE_SCALE)
            .unwrap_or(0.0),
        speed,
        heart_rate: message.read_u8(record::HEART_RATE),
        cadence: message.read_u8(record::CADENCE),
    })
}

pub fn decode_lap(message: &RawMessage, index: usize) -> Result<LapSummary, FitProcessError> {
    let start_time = message
        .read_u32(lap::START_TIME)
        .map(Timestamp)
        .ok_or_else(|| FitProcessError::ParseError(format!("lap {index} has no start_time")))?;
    let total_elapsed_time = message
        .read_scaled(lap::TOTAL_ELAPSED_TIME, profile::TIME_SCALE)
        .unwrap_or(0.0);
    let total_timer_time = message
        .read_scaled(lap::TOTAL_TIMER_TIME, profile::TIME_SCALE)
        .unwrap_or(total_elapsed_time);
    let end_time = message.read_u32(lap::TIMESTAMP).map(Timestamp).unwrap_or_else(|| {
        Timestamp(start_time.0.saturating_add(total_elapsed_time.round() as u32))
    });

    let speed = |enhanced: u8, plain: u8| {
        message
            .read_scaled(enhanced, profile::SPEED_SCALE)
            .or_else(|| message.read_scaled(plain, profile::SPEED_SCALE))
            .unwrap_or(0.0)
    };
    let avg_speed = speed(lap::ENHANCED_AVG_SPEED, lap::AVG_SPEED);
    let max_speed = speed(lap::ENHANCED_MAX_SPEED, lap::MAX_SPEED);

    Ok(LapSummary {
        start_time,
        end_time,
        total_elapsed_time,
        total_timer_time,
        total_distance: message
            .read_scaled(lap::TOTAL_DISTANCE, profile::DISTANCE_SCALE)
            .unwrap_or(0.0),
        avg_speed,
        max_speed,
        enhanced_avg_speed: avg_speed,
        enhanced_max_speed: max_speed,
        min_heart_rate: message.read_u8(lap::MIN_HEART_RATE),
        avg_heart_rate: message.read_number(lap::AVG_HEART_RATE),
        max_heart_rate: message.read_u8(lap::MAX_HEART_RATE),
        min_cadence: None,
        avg_cadence: message.read_number(lap::AVG_CADENCE),
        max_cadence: message.read_u8(lap::MAX_CADENCE),
        trigger: message.read_u8(lap::LAP_TRIGGER).map(LapTrigger::from_raw),
    })
}

pub fn decode_session(message: &RawMessage) -> SessionSummary {
    let speed = |enhanced: u8, plain: u8| {
        message
            .read_scaled(enhanced, profile::SPEED_SCALE)
            .or_else(|| message.read_scaled(plain, profile::SPEED_SCALE))
            .unwrap_or(0.0)
    };

    SessionSummary {
        start_time: message.read_u32(session::START_TIME).map(Timestamp),
        total_elapsed_time: message
            .read_scaled(session::TOTAL_ELAPSED_TIME, profile::TIME_SCALE)
            .unwrap_or(0.0),
        total_timer_time: message
            .read_scaled(session::TOTAL_TIMER_TIME, profile::TIME_SCALE)
            .unwrap_or(0.0),
        total_distance: message
            .read_scaled(session::TOTAL_DISTANCE, profile::DISTANCE_SCALE)
            .unwrap_or(0.0),
        avg_speed: speed(session::ENHANCED_AVG_SPEED, session::AVG_SPEED),
        max_speed: speed(session::ENHANCED_MAX_SPEED, session::MAX_SPEED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::raw::{BaseType, MessageBuilder};

    #[test]
    fn records_prefer_enhanced_speed() {
        let message = MessageBuilder::new(mesg::RECORD)
            .unsigned(record::TIMESTAMP, BaseType::UInt32, 1000)
            .scaled(record::DISTANCE, BaseType::UInt32, 12.34, 100.0)
            .scaled(record::SPEED, BaseType::UInt16, 2.0, 1000.0)
            .scaled(record::ENHANCED_SPEED, BaseType::UInt32, 2.5, 1000.0)
            .unsigned(record::HEART_RATE, BaseType::UInt8, 142)
            .optional(record::CADENCE, BaseType::UInt8, None)
            .build();

        let sample = decode_sample(&message, 0).expect("record has a timestamp");
        assert_eq!(sample.timestamp, Timestamp(1000));
        assert!((sample.distance - 12.34).abs() < 1e-9);
        assert_eq!(sample.speed, 2.5);
        assert_eq!(sample.heart_rate, Some(142));
        assert_eq!(sample.cadence, None);
    }

    #[test]
    fn records_without_timestamp_are_rejected() {
        let message = MessageBuilder::new(mesg::RECORD)
            .scaled(record::DISTANCE, BaseType::UInt32, 1.0, 100.0)
            .build();
        assert!(matches!(
            decode_sample(&message, 3),
            Err(FitProcessError::ParseError(_))
        ));
    }

    #[test]
    fn lap_end_falls_back_to_elapsed_time() {
        let message = MessageBuilder::new(mesg::LAP)
            .unsigned(lap::START_TIME, BaseType::UInt32, 500)
            .scaled(lap::TOTAL_ELAPSED_TIME, BaseType::UInt32, 300.0, 1000.0)
            .scaled(lap::MAX_SPEED, BaseType::UInt16, 4.2, 1000.0)
            .unsigned(lap::LAP_TRIGGER, BaseType::Enum, 2)
            .build();

        let summary = decode_lap(&message, 0).expect("lap has a start time");
        assert_eq!(summary.end_time, Timestamp(800));
        assert_eq!(summary.total_timer_time, 300.0);
        assert!((summary.max_speed - 4.2).abs() < 1e-9);
        assert_eq!(summary.trigger, Some(LapTrigger::Distance));
    }

    #[test]
    fn unknown_messages_are_counted_and_dropped() {
        let messages = vec![
            MessageBuilder::new(mesg::FILE_ID).unsigned(0, BaseType::Enum, 4).build(),
            MessageBuilder::new(78).unsigned(0, BaseType::UInt8, 1).build(),
        ];
        let activity = decode_activity(messages).expect("decodable");
        assert_eq!(activity.file_ids.len(), 1);
        assert_eq!(activity.dropped, 1);
    }
}
