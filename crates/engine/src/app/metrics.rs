use std::time::{Duration, Instant};

/// Loop cadence over one reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CadenceReport {
    pub(crate) fps: f32,
    pub(crate) turns_per_second: f32,
    /// Zero when no turn fired in the window.
    pub(crate) frames_per_turn: f32,
    pub(crate) frame_time_ms: f32,
}

#[derive(Debug)]
pub(crate) struct CadenceWindow {
    opened_at: Instant,
    length: Duration,
    frames: u32,
    turns: u64,
    busy: Duration,
}

impl CadenceWindow {
    pub(crate) fn open(length: Duration, now: Instant) -> Self {
        Self {
            opened_at: now,
            length,
            frames: 0,
            turns: 0,
            busy: Duration::ZERO,
        }
    }

    /// Counts one frame that took `busy` and fired `turns_fired` turns.
    pub(crate) fn record_frame(&mut self, busy: Duration, turns_fired: u64) {
        self.frames = self.frames.saturating_add(1);
        self.turns = self.turns.saturating_add(turns_fired);
        self.busy = self.busy.saturating_add(busy);
    }

    pub(crate) fn close_if_due(&mut self, now: Instant) -> Option<CadenceReport> {
        let elapsed = now.saturating_duration_since(self.opened_at);
        if elapsed < self.length {
            return None;
        }

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frames = self.frames as f32;
        let report = CadenceReport {
            fps: frames / seconds,
            turns_per_second: self.turns as f32 / seconds,
            frames_per_turn: if self.turns == 0 {
                0.0
            } else {
                frames / self.turns as f32
            },
            frame_time_ms: if self.frames == 0 {
                0.0
            } else {
                self.busy.as_secs_f32() * 1000.0 / frames
            },
        };

        *self = Self::open(self.length, now);
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_relates_frames_to_turns() {
        let start = Instant::now();
        let mut window = CadenceWindow::open(Duration::from_secs(2), start);
        for turns_fired in [0, 1, 0, 1, 0, 1] {
            window.record_frame(Duration::from_millis(4), turns_fired);
        }

        let report = window
            .close_if_due(start + Duration::from_secs(2))
            .expect("window is due");

        assert!((report.fps - 3.0).abs() < 1e-4);
        assert!((report.turns_per_second - 1.5).abs() < 1e-4);
        assert!((report.frames_per_turn - 2.0).abs() < 1e-4);
        assert!((report.frame_time_ms - 4.0).abs() < 1e-3);
    }

    #[test]
    fn window_stays_open_until_its_length_passes() {
        let start = Instant::now();
        let mut window = CadenceWindow::open(Duration::from_secs(1), start);
        window.record_frame(Duration::from_millis(16), 1);

        assert!(window
            .close_if_due(start + Duration::from_millis(999))
            .is_none());
        assert!(window.close_if_due(start + Duration::from_secs(1)).is_some());
    }

    #[test]
    fn closing_starts_a_fresh_window() {
        let start = Instant::now();
        let mut window = CadenceWindow::open(Duration::from_secs(1), start);
        window.record_frame(Duration::from_millis(5), 2);
        let later = start + Duration::from_secs(1);
        window.close_if_due(later).expect("first window");

        let idle = window
            .close_if_due(later + Duration::from_secs(1))
            .expect("second window");
        assert_eq!(idle, CadenceReport::default());
    }
}
