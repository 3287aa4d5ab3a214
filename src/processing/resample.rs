use crate::processing::activity::{LapWindow, Sample, SpeedAssignment, Timestamp};

/// Forward-only pointer into the lap windows. Samples arrive in time order,
/// so the lap a sample belongs to never precedes the previous sample's lap.
struct LapCursor<'a> {
    windows: &'a [LapWindow],
    index: usize,
}

impl<'a> LapCursor<'a> {
    fn new(windows: &'a [LapWindow]) -> Self {
        Self { windows, index: 0 }
    }

    /// Index of the window holding `timestamp`. Samples past the end of the
    /// last window stay in it.
    fn advance_to(&mut self, timestamp: Timestamp) -> usize {
        while self.index + 1 < self.windows.len() && timestamp >= self.windows[self.index].end {
            self.index += 1;
        }
        self.index
    }
}

/// Rewrite distance and speed of every sample for the assigned speed.
///
/// Distance is integrated from the first sample's original distance: each
/// sample adds the time since the previous sample times its own speed. The
/// first sample keeps its distance since there is no interval before it.
/// Per-lap speeds are looked up through `windows`, which must hold one window
/// per speed.
pub fn resample_records(
    samples: &[Sample],
    assignment: &SpeedAssignment,
    windows: &[LapWindow],
) -> Vec<Sample> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };

    let mut cursor = LapCursor::new(windows);
    let mut previous = first.timestamp;
    let mut cumulative = first.distance;

    samples
        .iter()
        .map(|sample| {
            let speed = match assignment {
                SpeedAssignment::Uniform(speed) => *speed,
                SpeedAssignment::PerLap(speeds) => {
                    let lap = cursor.advance_to(sample.timestamp);
                    speeds.get(lap).copied().unwrap_or(0.0)
                }
            };

            let elapsed = sample.timestamp.seconds_since(previous).max(0.0);
            cumulative += elapsed * speed;
            previous = sample.timestamp;

            Sample {
                distance: cumulative,
                speed,
                ..*sample
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(timestamps: impl IntoIterator<Item = u32>) -> Vec<Sample> {
        timestamps
            .into_iter()
            .map(|ts| Sample {
                timestamp: Timestamp(ts),
                distance: 0.0,
                speed: 1.0,
                heart_rate: Some(150),
                cadence: Some(85),
            })
            .collect()
    }

    fn window(start: u32, end: u32) -> LapWindow {
        LapWindow {
            start: Timestamp(start),
            end: Timestamp(end),
        }
    }

    #[test]
    fn uniform_speed_integrates_distance() {
        let speed = 1000.0 / 300.0;
        let resampled = resample_records(&samples(0..10), &SpeedAssignment::Uniform(speed), &[]);

        for (k, sample) in resampled.iter().enumerate() {
            assert!((sample.distance - speed * k as f64).abs() < 1e-9);
            assert_eq!(sample.speed, speed);
            assert_eq!(sample.heart_rate, Some(150));
            assert_eq!(sample.cadence, Some(85));
        }
    }

    #[test]
    fn first_sample_keeps_its_original_distance() {
        let mut input = samples([100, 101, 103]);
        input[0].distance = 42.0;

        let resampled = resample_records(&input, &SpeedAssignment::Uniform(2.0), &[]);
        assert_eq!(resampled[0].distance, 42.0);
        assert_eq!(resampled[0].speed, 2.0);
        assert_eq!(resampled[1].distance, 44.0);
        assert_eq!(resampled[2].distance, 48.0);
    }

    #[test]
    fn per_lap_speeds_switch_at_lap_start() {
        let windows = [window(0, 300), window(300, 600)];
        let resampled = resample_records(
            &samples(0..=600),
            &SpeedAssignment::PerLap(vec![3.0, 4.0]),
            &windows,
        );

        assert!(resampled[..300].iter().all(|sample| sample.speed == 3.0));
        assert!(resampled[300..].iter().all(|sample| sample.speed == 4.0));
        assert!((resampled[299].distance - 897.0).abs() < 1e-9);
        // The interval ending at t=300 already runs at the second lap's speed.
        assert!((resampled[600].distance - 2101.0).abs() < 1e-9);
    }

    #[test]
    fn cursor_skips_laps_without_samples() {
        let windows = [window(0, 10), window(10, 11), window(11, 40)];
        let resampled = resample_records(
            &samples([0, 5, 20, 30]),
            &SpeedAssignment::PerLap(vec![1.0, 9.0, 2.0]),
            &windows,
        );
        let speeds: Vec<f64> = resampled.iter().map(|sample| sample.speed).collect();
        assert_eq!(speeds, vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn samples_after_the_last_window_keep_its_speed() {
        let windows = [window(0, 10), window(10, 20)];
        let resampled = resample_records(
            &samples([0, 12, 25, 40]),
            &SpeedAssignment::PerLap(vec![1.0, 3.0]),
            &windows,
        );
        let speeds: Vec<f64> = resampled.iter().map(|sample| sample.speed).collect();
        assert_eq!(speeds, vec![1.0, 3.0, 3.0, 3.0]);
        assert_eq!(resampled[3].distance, 120.0);
    }

    #[test]
    fn distance_never_decreases() {
        let timestamps = [0, 1, 1, 4, 9, 9, 10, 25];
        let resampled = resample_records(
            &samples(timestamps),
            &SpeedAssignment::PerLap(vec![2.5, 0.0, 6.0]),
            &[window(0, 4), window(4, 10), window(10, 25)],
        );
        assert!(
            resampled
                .windows(2)
                .all(|pair| pair[1].distance >= pair[0].distance)
        );
    }

    #[test]
    fn empty_input_is_a_no_op() {
        assert!(resample_records(&[], &SpeedAssignment::Uniform(3.0), &[]).is_empty());
    }
}
