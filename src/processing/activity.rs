use crate::processing::raw::RawMessage;

/// Seconds since the FIT epoch (1989-12-31T00:00:00Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Signed number of seconds between `earlier` and `self`.
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        f64::from(self.0) - f64::from(earlier.0)
    }
}

/// One point in time of the recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Timestamp,
    /// Cumulative distance in meters.
    pub distance: f64,
    /// Instantaneous speed in meters per second.
    pub speed: f64,
    pub heart_rate: Option<u8>,
    pub cadence: Option<u8>,
}

/// Time range of an input lap, used to route per-lap speeds to samples. A
/// window ends where the next one starts; the last one ends with the activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapTrigger {
    Manual,
    Time,
    Distance,
    SessionEnd,
    Other(u8),
}

impl LapTrigger {
    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => LapTrigger::Manual,
            1 => LapTrigger::Time,
            2 => LapTrigger::Distance,
            7 => LapTrigger::SessionEnd,
            other => LapTrigger::Other(other),
        }
    }

    pub fn as_raw(self) -> u8 {
        match self {
            LapTrigger::Manual => 0,
            LapTrigger::Time => 1,
            LapTrigger::Distance => 2,
            LapTrigger::SessionEnd => 7,
            LapTrigger::Other(other) => other,
        }
    }
}

/// Summary statistics of one lap, as written to the output file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LapSummary {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub total_elapsed_time: f64,
    pub total_timer_time: f64,
    pub total_distance: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    pub enhanced_avg_speed: f64,
    pub enhanced_max_speed: f64,
    pub min_heart_rate: Option<u8>,
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<u8>,
    pub min_cadence: Option<u8>,
    pub avg_cadence: Option<f64>,
    pub max_cadence: Option<u8>,
    pub trigger: Option<LapTrigger>,
}

/// Whole-activity totals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSummary {
    pub start_time: Option<Timestamp>,
    pub total_elapsed_time: f64,
    pub total_timer_time: f64,
    pub total_distance: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
}

/// Target speed for the rewritten activity, in meters per second.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeedAssignment {
    Uniform(f64),
    /// One speed per input lap, in lap order.
    PerLap(Vec<f64>),
}

/// A typed view of a message together with the message it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub message: RawMessage,
}

/// The messages of an activity file grouped by kind, in file order.
#[derive(Debug, Clone, Default)]
pub struct DecodedActivity {
    pub file_ids: Vec<RawMessage>,
    pub developer_data_ids: Vec<RawMessage>,
    pub field_descriptions: Vec<RawMessage>,
    pub device_infos: Vec<RawMessage>,
    pub records: Vec<Decoded<Sample>>,
    pub events: Vec<RawMessage>,
    pub laps: Vec<Decoded<LapSummary>>,
    pub sessions: Vec<Decoded<SessionSummary>>,
    pub activities: Vec<RawMessage>,
    /// Messages of any other kind; they are not carried into the output.
    pub dropped: usize,
}

impl DecodedActivity {
    pub fn samples(&self) -> Vec<Sample> {
        self.records.iter().map(|record| record.value).collect()
    }

    /// Timestamp of the last sample, falling back to the session or last lap end.
    pub fn end_time(&self) -> Option<Timestamp> {
        self.records
            .last()
            .map(|record| record.value.timestamp)
            .or_else(|| self.laps.last().map(|lap| lap.value.end_time))
    }

    /// Lap windows in lap order; each ends where the next one starts and the
    /// last one at the activity end.
    pub fn lap_windows(&self) -> Vec<LapWindow> {
        let activity_end = self.end_time();

        self.laps
            .iter()
            .enumerate()
            .map(|(idx, lap)| {
                let end = self
                    .laps
                    .get(idx + 1)
                    .map(|next| next.value.start_time)
                    .or(activity_end)
                    .unwrap_or(lap.value.end_time)
                    .max(lap.value.start_time);
                LapWindow {
                    start: lap.value.start_time,
                    end,
                }
            })
            .collect()
    }
}
