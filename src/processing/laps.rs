use crate::processing::activity::{
    Decoded, LapSummary, LapTrigger, Sample, SpeedAssignment, Timestamp,
};
use crate::processing::profile::{self, lap, mesg};
use crate::processing::raw::{BaseType, MessageBuilder, RawMessage};
use crate::processing::types::{FitProcessError, LapMode};

/// A lap ready for the output file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledLap {
    pub summary: LapSummary,
    pub message: RawMessage,
}

/// Produce the output laps for `mode`.
///
/// `samples` must already be resampled; auto laps are cut from their
/// distances.
pub fn reconcile_laps(
    mode: LapMode,
    assignment: &SpeedAssignment,
    laps: &[Decoded<LapSummary>],
    samples: &[Sample],
) -> Result<Vec<ReconciledLap>, FitProcessError> {
    let reconciled = match mode {
        LapMode::Omit => Vec::new(),
        LapMode::Keep => laps
            .iter()
            .map(|lap| ReconciledLap {
                summary: lap.value.clone(),
                message: lap.message.clone(),
            })
            .collect(),
        LapMode::PerLapOverride => {
            let SpeedAssignment::PerLap(speeds) = assignment else {
                return Err(FitProcessError::InvalidConfiguration(
                    "per-lap override needs per-lap speeds".into(),
                ));
            };
            override_lap_speeds(laps, speeds)?
        }
        LapMode::AutoLap { distance } => synthesize_auto_laps(samples, distance)
            .into_iter()
            .enumerate()
            .map(|(index, summary)| ReconciledLap {
                message: lap_message(&summary, index),
                summary,
            })
            .collect(),
    };

    tracing::debug!(?mode, laps = reconciled.len(), "reconciled laps");
    Ok(reconciled)
}

/// Give every input lap its assigned speed; distance follows from the lap's
/// unchanged timer time.
pub fn override_lap_speeds(
    laps: &[Decoded<LapSummary>],
    speeds: &[f64],
) -> Result<Vec<ReconciledLap>, FitProcessError> {
    if speeds.len() != laps.len() {
        return Err(FitProcessError::LengthMismatch {
            expected: laps.len(),
            actual: speeds.len(),
        });
    }

    Ok(laps
        .iter()
        .zip(speeds)
        .map(|(lap, &speed)| {
            let total_distance = speed * lap.value.total_timer_time;
            let summary = LapSummary {
                total_distance,
                avg_speed: speed,
                max_speed: speed,
                enhanced_avg_speed: speed,
                enhanced_max_speed: speed,
                ..lap.value.clone()
            };

            let mut message = lap.message.clone();
            message.set_scaled(lap::AVG_SPEED, BaseType::UInt16, speed, profile::SPEED_SCALE);
            message.set_scaled(lap::MAX_SPEED, BaseType::UInt16, speed, profile::SPEED_SCALE);
            message.set_scaled(
                lap::ENHANCED_AVG_SPEED,
                BaseType::UInt32,
                speed,
                profile::SPEED_SCALE,
            );
            message.set_scaled(
                lap::ENHANCED_MAX_SPEED,
                BaseType::UInt32,
                speed,
                profile::SPEED_SCALE,
            );
            message.set_scaled(
                lap::TOTAL_DISTANCE,
                BaseType::UInt32,
                total_distance,
                profile::DISTANCE_SCALE,
            );

            ReconciledLap { summary, message }
        })
        .collect())
}

/// Running min/avg/max of an integer signal. Zero readings count as missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SignalStats {
    sum: u64,
    count: u32,
    min: Option<u8>,
    max: Option<u8>,
}

impl SignalStats {
    fn observe(&mut self, value: Option<u8>) {
        let Some(value) = value.filter(|value| *value > 0) else {
            return;
        };
        self.sum += u64::from(value);
        self.count += 1;
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
    }

    fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / f64::from(self.count))
    }
}

/// State of the lap being built during auto-lap synthesis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LapAccumulator {
    start_time: Timestamp,
    start_distance: f64,
    max_speed: f64,
    heart_rate: SignalStats,
    cadence: SignalStats,
}

impl LapAccumulator {
    fn starting_at(start_time: Timestamp, start_distance: f64) -> Self {
        Self {
            start_time,
            start_distance,
            max_speed: 0.0,
            heart_rate: SignalStats::default(),
            cadence: SignalStats::default(),
        }
    }

    fn observe(&mut self, sample: &Sample) {
        self.max_speed = self.max_speed.max(sample.speed);
        self.heart_rate.observe(sample.heart_rate);
        self.cadence.observe(sample.cadence);
    }

    fn covered(&self, sample: &Sample) -> f64 {
        round_centimeters(sample.distance - self.start_distance)
    }

    fn close(&self, end: &Sample) -> LapSummary {
        let total_distance = end.distance - self.start_distance;
        let total_time = end.timestamp.seconds_since(self.start_time);
        let avg_speed = if total_time > 0.0 {
            total_distance / total_time
        } else {
            0.0
        };

        LapSummary {
            start_time: self.start_time,
            end_time: end.timestamp,
            total_elapsed_time: total_time,
            total_timer_time: total_time,
            total_distance,
            avg_speed,
            max_speed: self.max_speed,
            enhanced_avg_speed: avg_speed,
            enhanced_max_speed: self.max_speed,
            min_heart_rate: self.heart_rate.min,
            avg_heart_rate: self.heart_rate.average(),
            max_heart_rate: self.heart_rate.max,
            min_cadence: self.cadence.min,
            avg_cadence: self.cadence.average(),
            max_cadence: self.cadence.max,
            trigger: Some(LapTrigger::Distance),
        }
    }
}

fn round_centimeters(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

/// Cut laps every `lap_distance` meters of the (resampled) samples.
///
/// The sample that completes a lap ends it and starts the next one, so lap
/// time ranges meet without gaps. Whatever remains after the last full lap
/// becomes a final, shorter lap. The first lap counts from distance zero.
pub fn synthesize_auto_laps(samples: &[Sample], lap_distance: f64) -> Vec<LapSummary> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Vec::new();
    };

    let mut laps = Vec::new();
    let mut current = LapAccumulator::starting_at(first.timestamp, 0.0);
    let mut open = false;

    for sample in samples {
        current.observe(sample);
        if current.covered(sample) >= lap_distance {
            laps.push(current.close(sample));
            current = LapAccumulator::starting_at(sample.timestamp, sample.distance);
            open = false;
        } else {
            open = true;
        }
    }

    // A lap closed by the final sample is not followed by an empty tail lap:
    // every sample belongs to exactly one lap.
    if open {
        laps.push(current.close(last));
    }

    laps
}

/// Lap message for a synthesized lap. Statistics without data are written as
/// the FIT invalid value.
pub fn lap_message(summary: &LapSummary, message_index: usize) -> RawMessage {
    let round = |value: Option<f64>| value.map(|value| value.round().max(0.0) as u64);

    MessageBuilder::new(mesg::LAP)
        .unsigned(lap::TIMESTAMP, BaseType::UInt32, u64::from(summary.end_time.0))
        .unsigned(lap::MESSAGE_INDEX, BaseType::UInt16, message_index as u64)
        .unsigned(lap::EVENT, BaseType::Enum, profile::EVENT_LAP)
        .unsigned(lap::EVENT_TYPE, BaseType::Enum, profile::EVENT_TYPE_STOP)
        .unsigned(lap::START_TIME, BaseType::UInt32, u64::from(summary.start_time.0))
        .scaled(
            lap::TOTAL_ELAPSED_TIME,
            BaseType::UInt32,
            summary.total_elapsed_time,
            profile::TIME_SCALE,
        )
        .scaled(
            lap::TOTAL_TIMER_TIME,
            BaseType::UInt32,
            summary.total_timer_time,
            profile::TIME_SCALE,
        )
        .scaled(
            lap::TOTAL_DISTANCE,
            BaseType::UInt32,
            summary.total_distance,
            profile::DISTANCE_SCALE,
        )
        .scaled(lap::AVG_SPEED, BaseType::UInt16, summary.avg_speed, profile::SPEED_SCALE)
        .scaled(lap::MAX_SPEED, BaseType::UInt16, summary.max_speed, profile::SPEED_SCALE)
        .optional(lap::AVG_HEART_RATE, BaseType::UInt8, round(summary.avg_heart_rate))
        .optional(
            lap::MAX_HEART_RATE,
            BaseType::UInt8,
            summary.max_heart_rate.map(u64::from),
        )
        .optional(lap::AVG_CADENCE, BaseType::UInt8, round(summary.avg_cadence))
        .optional(lap::MAX_CADENCE, BaseType::UInt8, summary.max_cadence.map(u64::from))
        .optional(
            lap::LAP_TRIGGER,
            BaseType::Enum,
            summary.trigger.map(|trigger| u64::from(trigger.as_raw())),
        )
        .optional(
            lap::MIN_HEART_RATE,
            BaseType::UInt8,
            summary.min_heart_rate.map(u64::from),
        )
        .scaled(
            lap::ENHANCED_AVG_SPEED,
            BaseType::UInt32,
            summary.enhanced_avg_speed,
            profile::SPEED_SCALE,
        )
        .scaled(
            lap::ENHANCED_MAX_SPEED,
            BaseType::UInt32,
            summary.enhanced_max_speed,
            profile::SPEED_SCALE,
        )
        .build()
}
