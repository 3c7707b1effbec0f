//! In-memory session statistics.
//!
//! Counts frames, detections, actions and hold outcomes, and keeps a
//! rolling window of frame intervals for an fps estimate.

use std::collections::BTreeMap;

use crate::gesture::GestureKind;
use crate::landmarks::KeypointFrame;
use crate::machine::Action;

/// Default number of frame intervals kept for the fps estimate.
pub const INTERVAL_WINDOW: usize = 30;

#[derive(Debug)]
pub struct SessionStats {
    /// Frames processed, including empty ones.
    pub frames: u64,
    pub hand_frames: u64,
    pub pose_frames: u64,
    /// Accepted detections per gesture.
    pub gesture_counts: BTreeMap<GestureKind, u64>,
    /// Emitted actions, keyed by action name.
    pub action_counts: BTreeMap<&'static str, u64>,
    pub holds_confirmed: u64,
    pub holds_interrupted: u64,
    /// Detections dropped by the cooldown gate.
    pub cooldown_blocks: u64,
    /// Recent frame-to-frame intervals (seconds).
    pub intervals: Vec<f64>,
    pub window_size: usize,
    first_frame_s: Option<f64>,
    last_frame_s: Option<f64>,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new(INTERVAL_WINDOW)
    }
}

impl SessionStats {
    pub fn new(window_size: usize) -> Self {
        Self {
            frames: 0,
            hand_frames: 0,
            pose_frames: 0,
            gesture_counts: BTreeMap::new(),
            action_counts: BTreeMap::new(),
            holds_confirmed: 0,
            holds_interrupted: 0,
            cooldown_blocks: 0,
            intervals: Vec::with_capacity(window_size),
            window_size,
            first_frame_s: None,
            last_frame_s: None,
        }
    }

    pub fn record_frame(&mut self, frame: Option<&KeypointFrame>, now_s: f64) {
        self.frames += 1;
        match frame {
            Some(KeypointFrame::Hand(_)) => self.hand_frames += 1,
            Some(KeypointFrame::Pose(_)) => self.pose_frames += 1,
            None => {}
        }
        if let Some(last) = self.last_frame_s {
            let dt = now_s - last;
            if dt > 0.0 {
                self.intervals.push(dt);
                if self.intervals.len() > self.window_size {
                    self.intervals.remove(0);
                }
            }
        }
        self.first_frame_s.get_or_insert(now_s);
        self.last_frame_s = Some(now_s);
    }

    pub fn record_gesture(&mut self, kind: GestureKind) {
        *self.gesture_counts.entry(kind).or_insert(0) += 1;
    }

    pub fn record_action(&mut self, action: Action) {
        *self.action_counts.entry(action.as_str()).or_insert(0) += 1;
    }

    /// Frames per second over the interval window.
    pub fn fps(&self) -> f64 {
        if self.intervals.is_empty() {
            return 0.0;
        }
        let mean = self.intervals.iter().sum::<f64>() / self.intervals.len() as f64;
        if mean > 0.0 {
            1.0 / mean
        } else {
            0.0
        }
    }

    /// Seconds between the first and latest frame.
    pub fn duration_s(&self) -> f64 {
        match (self.first_frame_s, self.last_frame_s) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    pub fn status_sexp(&self) -> String {
        let gestures = if self.gesture_counts.is_empty() {
            "nil".to_string()
        } else {
            let entries: Vec<String> = self
                .gesture_counts
                .iter()
                .map(|(k, n)| format!("(:{} . {})", k.as_str(), n))
                .collect();
            format!("({})", entries.join(" "))
        };
        let actions = if self.action_counts.is_empty() {
            "nil".to_string()
        } else {
            let entries: Vec<String> = self
                .action_counts
                .iter()
                .map(|(a, n)| format!("(:{} . {})", a, n))
                .collect();
            format!("({})", entries.join(" "))
        };
        format!(
            "(:frames {} :hand-frames {} :pose-frames {} :fps {:.1} :duration-s {:.1} :holds-confirmed {} :holds-interrupted {} :cooldown-blocks {} :gestures {} :actions {})",
            self.frames,
            self.hand_frames,
            self.pose_frames,
            self.fps(),
            self.duration_s(),
            self.holds_confirmed,
            self.holds_interrupted,
            self.cooldown_blocks,
            gestures,
            actions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{HandFrame, PoseFrame};

    #[test]
    fn test_frame_counts() {
        let mut stats = SessionStats::default();
        let hand = KeypointFrame::Hand(HandFrame::new(Vec::new()));
        let pose = KeypointFrame::Pose(PoseFrame::new());
        stats.record_frame(Some(&hand), 0.0);
        stats.record_frame(Some(&pose), 0.1);
        stats.record_frame(None, 0.2);
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.hand_frames, 1);
        assert_eq!(stats.pose_frames, 1);
    }

    #[test]
    fn test_fps_from_intervals() {
        let mut stats = SessionStats::default();
        for i in 0..11 {
            stats.record_frame(None, i as f64 * 0.05);
        }
        assert!((stats.fps() - 20.0).abs() < 1e-6, "fps {}", stats.fps());
        assert!((stats.duration_s() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_interval_window_is_bounded() {
        let mut stats = SessionStats::new(5);
        for i in 0..20 {
            stats.record_frame(None, i as f64);
        }
        assert_eq!(stats.intervals.len(), 5);
    }

    #[test]
    fn test_no_frames_zero_fps() {
        let stats = SessionStats::default();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.duration_s(), 0.0);
    }

    #[test]
    fn test_counters_and_sexp() {
        let mut stats = SessionStats::default();
        stats.record_gesture(GestureKind::Fist);
        stats.record_gesture(GestureKind::Fist);
        stats.record_action(Action::Select);
        let sexp = stats.status_sexp();
        assert!(sexp.contains(":gestures ((:fist . 2))"), "got {}", sexp);
        assert!(sexp.contains(":actions ((:select . 1))"));
    }
}
