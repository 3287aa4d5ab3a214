#![allow(dead_code)]

use fitpacer::processing::encode::encode_fit;
use fitpacer::processing::parse::FitHeader;
use fitpacer::processing::profile::{lap, mesg, record, session};
use fitpacer::processing::raw::{BaseType, MessageBuilder, RawMessage};

pub const START: u32 = 1_000_000_000;

/// Activity with one record per second from `START` to `START + seconds`,
/// running at 2 m/s, with one lap per `(offset, timer seconds)` entry.
pub struct ActivityFixture {
    pub seconds: u32,
    pub laps: Vec<(u32, f64)>,
    pub with_file_id: bool,
    pub with_session: bool,
}

impl ActivityFixture {
    pub fn new(seconds: u32) -> Self {
        Self {
            seconds,
            laps: vec![(0, f64::from(seconds))],
            with_file_id: true,
            with_session: true,
        }
    }

    pub fn laps(mut self, laps: &[(u32, f64)]) -> Self {
        self.laps = laps.to_vec();
        self
    }

    pub fn without_file_id(mut self) -> Self {
        self.with_file_id = false;
        self
    }

    pub fn without_session(mut self) -> Self {
        self.with_session = false;
        self
    }

    /// Messages in the order a device writes them, with a few kinds the
    /// rewrite does not touch mixed in.
    pub fn messages(&self) -> Vec<RawMessage> {
        let mut messages = Vec::new();

        if self.with_file_id {
            messages.push(
                MessageBuilder::new(mesg::FILE_ID)
                    .unsigned(0, BaseType::Enum, 4)
                    .unsigned(1, BaseType::UInt16, 1)
                    .unsigned(4, BaseType::UInt32, u64::from(START))
                    .build(),
            );
        }
        messages.push(
            MessageBuilder::new(mesg::DEVICE_INFO)
                .unsigned(253, BaseType::UInt32, u64::from(START))
                .unsigned(2, BaseType::UInt16, 1)
                .build(),
        );
        messages.push(
            MessageBuilder::new(mesg::EVENT)
                .unsigned(253, BaseType::UInt32, u64::from(START))
                .unsigned(0, BaseType::Enum, 0)
                .unsigned(1, BaseType::Enum, 0)
                .build(),
        );
        // Sport message; not part of the rewritten output.
        messages.push(MessageBuilder::new(12).unsigned(0, BaseType::Enum, 1).build());

        for t in 0..=self.seconds {
            messages.push(
                MessageBuilder::new(mesg::RECORD)
                    .unsigned(record::TIMESTAMP, BaseType::UInt32, u64::from(START + t))
                    .scaled(record::DISTANCE, BaseType::UInt32, f64::from(t) * 2.0, 100.0)
                    .scaled(record::SPEED, BaseType::UInt16, 2.0, 1000.0)
                    .unsigned(record::HEART_RATE, BaseType::UInt8, 140 + u64::from(t % 10))
                    .unsigned(record::CADENCE, BaseType::UInt8, 85)
                    .build(),
            );
        }

        for (idx, (offset, timer)) in self.laps.iter().enumerate() {
            messages.push(
                MessageBuilder::new(mesg::LAP)
                    .unsigned(
                        lap::TIMESTAMP,
                        BaseType::UInt32,
                        u64::from(START + offset) + *timer as u64,
                    )
                    .unsigned(lap::MESSAGE_INDEX, BaseType::UInt16, idx as u64)
                    .unsigned(lap::START_TIME, BaseType::UInt32, u64::from(START + offset))
                    .scaled(lap::TOTAL_ELAPSED_TIME, BaseType::UInt32, *timer, 1000.0)
                    .scaled(lap::TOTAL_TIMER_TIME, BaseType::UInt32, *timer, 1000.0)
                    .scaled(lap::TOTAL_DISTANCE, BaseType::UInt32, timer * 2.0, 100.0)
                    .scaled(lap::AVG_SPEED, BaseType::UInt16, 2.0, 1000.0)
                    .unsigned(lap::LAP_TRIGGER, BaseType::Enum, 0)
                    .build(),
            );
        }

        if self.with_session {
            messages.push(
                MessageBuilder::new(mesg::SESSION)
                    .unsigned(253, BaseType::UInt32, u64::from(START + self.seconds))
                    .unsigned(session::START_TIME, BaseType::UInt32, u64::from(START))
                    .unsigned(5, BaseType::Enum, 1)
                    .scaled(
                        session::TOTAL_ELAPSED_TIME,
                        BaseType::UInt32,
                        f64::from(self.seconds),
                        1000.0,
                    )
                    .scaled(
                        session::TOTAL_TIMER_TIME,
                        BaseType::UInt32,
                        f64::from(self.seconds),
                        1000.0,
                    )
                    .scaled(
                        session::TOTAL_DISTANCE,
                        BaseType::UInt32,
                        f64::from(self.seconds) * 2.0,
                        100.0,
                    )
                    .build(),
            );
        }

        messages.push(
            MessageBuilder::new(mesg::ACTIVITY)
                .unsigned(253, BaseType::UInt32, u64::from(START + self.seconds))
                .unsigned(1, BaseType::UInt16, 1)
                .build(),
        );

        messages
    }

    pub fn bytes(&self) -> Vec<u8> {
        encode_fit(&FitHeader::default(), &self.messages()).expect("fixture encodes")
    }
}
