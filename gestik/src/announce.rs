//! The user-facing "what did you just do" readout.
//!
//! Every accepted gesture overwrites the announcement with its label and
//! the action it meant in the current context.  After a run of frames
//! with nothing detected the announcement decays back to neutral.

use tracing::debug;

use crate::gesture::GestureKind;

/// Label shown when no gesture is current.
pub const NEUTRAL_LABEL: &str = "none";
/// Context action shown when no gesture is current.
pub const NEUTRAL_ACTION: &str = "nada";

// ── Announcement ───────────────────────────────────────────

/// Current gesture label and its context-dependent meaning.  Display only.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureAnnouncement {
    pub label: String,
    pub context_action: String,
}

impl Default for GestureAnnouncement {
    fn default() -> Self {
        Self::neutral()
    }
}

impl GestureAnnouncement {
    pub fn neutral() -> Self {
        Self {
            label: NEUTRAL_LABEL.to_string(),
            context_action: NEUTRAL_ACTION.to_string(),
        }
    }

    pub fn set(&mut self, kind: GestureKind, context_action: impl Into<String>) {
        self.label = kind.as_str().to_string();
        self.context_action = context_action.into();
    }

    pub fn clear(&mut self) {
        *self = Self::neutral();
    }

    pub fn is_neutral(&self) -> bool {
        self.label == NEUTRAL_LABEL && self.context_action == NEUTRAL_ACTION
    }

    pub fn status_sexp(&self) -> String {
        format!(
            "(:label \"{}\" :context \"{}\")",
            self.label, self.context_action
        )
    }
}

// ── Idle decay ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct IdleConfig {
    /// Consecutive frames without a detection before the readout resets.
    pub threshold_frames: u32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self { threshold_frames: 5 }
    }
}

impl IdleConfig {
    pub fn config_sexp(&self) -> String {
        format!("(:threshold-frames {})", self.threshold_frames)
    }
}

/// Counts consecutive frames with no detected gesture.
#[derive(Debug, Clone, Default)]
pub struct IdleDecay {
    pub config: IdleConfig,
    idle_frames: u32,
}

impl IdleDecay {
    pub fn new(config: IdleConfig) -> Self {
        Self {
            config,
            idle_frames: 0,
        }
    }

    /// Record a frame with no detection.  Returns true when the
    /// announcement was reset to neutral on this frame.
    pub fn no_detection_tick(&mut self, announcement: &mut GestureAnnouncement) -> bool {
        self.idle_frames += 1;
        if self.idle_frames < self.config.threshold_frames {
            return false;
        }
        self.idle_frames = 0;
        if announcement.is_neutral() {
            return false;
        }
        debug!("Announcement decayed after {} idle frames", self.config.threshold_frames);
        announcement.clear();
        true
    }

    pub fn detected(&mut self) {
        self.idle_frames = 0;
    }

    pub fn idle_frames(&self) -> u32 {
        self.idle_frames
    }
}
