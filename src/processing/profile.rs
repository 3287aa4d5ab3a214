//! Message and field numbers from the FIT global profile that the rewrite
//! reads or writes. Everything else travels through as raw bytes.

pub mod mesg {
    pub const FILE_ID: u16 = 0;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
    pub const DEVICE_INFO: u16 = 23;
    pub const ACTIVITY: u16 = 34;
    pub const FIELD_DESCRIPTION: u16 = 206;
    pub const DEVELOPER_DATA_ID: u16 = 207;
}

pub mod record {
    pub const HEART_RATE: u8 = 3;
    pub const CADENCE: u8 = 4;
    pub const DISTANCE: u8 = 5;
    pub const SPEED: u8 = 6;
    pub const ENHANCED_SPEED: u8 = 73;
    pub const TIMESTAMP: u8 = 253;
}

pub mod lap {
    pub const EVENT: u8 = 0;
    pub const EVENT_TYPE: u8 = 1;
    pub const START_TIME: u8 = 2;
    pub const TOTAL_ELAPSED_TIME: u8 = 7;
    pub const TOTAL_TIMER_TIME: u8 = 8;
    pub const TOTAL_DISTANCE: u8 = 9;
    pub const AVG_SPEED: u8 = 13;
    pub const MAX_SPEED: u8 = 14;
    pub const AVG_HEART_RATE: u8 = 15;
    pub const MAX_HEART_RATE: u8 = 16;
    pub const AVG_CADENCE: u8 = 17;
    pub const MAX_CADENCE: u8 = 18;
    pub const LAP_TRIGGER: u8 = 24;
    pub const MIN_HEART_RATE: u8 = 63;
    pub const ENHANCED_AVG_SPEED: u8 = 110;
    pub const ENHANCED_MAX_SPEED: u8 = 111;
    pub const TIMESTAMP: u8 = 253;
    pub const MESSAGE_INDEX: u8 = 254;
}

pub mod session {
    pub const START_TIME: u8 = 2;
    pub const TOTAL_ELAPSED_TIME: u8 = 7;
    pub const TOTAL_TIMER_TIME: u8 = 8;
    pub const TOTAL_DISTANCE: u8 = 9;
    pub const AVG_SPEED: u8 = 14;
    pub const MAX_SPEED: u8 = 15;
    pub const ENHANCED_AVG_SPEED: u8 = 124;
    pub const ENHANCED_MAX_SPEED: u8 = 125;
}

/// `event` value for lap messages.
pub const EVENT_LAP: u64 = 9;
/// `event_type` value closing a lap.
pub const EVENT_TYPE_STOP: u64 = 1;

/// Distances are stored in centimeters.
pub const DISTANCE_SCALE: f64 = 100.0;
/// Speeds are stored in millimeters per second.
pub const SPEED_SCALE: f64 = 1000.0;
/// Durations are stored in milliseconds.
pub const TIME_SCALE: f64 = 1000.0;
