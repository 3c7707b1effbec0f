//! Hold-to-confirm for timed gestures.
//!
//! A timed gesture must be held continuously for a configured wall-clock
//! duration before it fires.  Short dropouts from the upstream classifier
//! are absorbed by a flicker tolerance window: progress is kept while the
//! gap since the gesture was last seen stays within the tolerance, and is
//! discarded once the gap exceeds it.  Confirmation fires once and then
//! latches until the gesture is released.

use tracing::debug;

use crate::gesture::GestureKind;

// ── Hold phase ─────────────────────────────────────────────

/// State machine for one timed gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum HoldPhase {
    /// Not accumulating.
    Idle,
    /// Gesture present; holding began at `since_s`.
    Holding { since_s: f64, last_seen_s: f64 },
    /// Gesture briefly missing; progress kept while within tolerance.
    Tolerating { since_s: f64, last_seen_s: f64 },
    /// Fired; waits for the gesture to be released before re-arming.
    Confirmed,
}

impl HoldPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Holding { .. } => "holding",
            Self::Tolerating { .. } => "tolerating",
            Self::Confirmed => "confirmed",
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Timing for one hold confirmer.
#[derive(Debug, Clone)]
pub struct HoldConfig {
    /// Seconds the gesture must be held.
    pub duration_s: f64,
    /// Longest dropout (seconds since last seen) that keeps progress.
    pub tolerance_s: f64,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            duration_s: 1.2,
            tolerance_s: 0.2,
        }
    }
}

impl HoldConfig {
    /// Rock sign held to quit.
    pub fn quit() -> Self {
        Self {
            duration_s: 2.0,
            ..Self::default()
        }
    }

    /// Peace sign held to toggle between menu and game.
    pub fn toggle() -> Self {
        Self::default()
    }

    /// Palms held together to leave the pose-controlled game.
    pub fn pose_menu() -> Self {
        Self {
            duration_s: 3.0,
            ..Self::default()
        }
    }

    pub fn config_sexp(&self) -> String {
        format!(
            "(:duration-s {:.2} :tolerance-s {:.2})",
            self.duration_s, self.tolerance_s
        )
    }
}

// ── Events ─────────────────────────────────────────────────

/// Events emitted by a hold confirmer.
#[derive(Debug, Clone, PartialEq)]
pub enum HoldEvent {
    /// Holding just began.
    Started,
    /// Still holding.
    Progress { elapsed_s: f64, remaining_s: f64 },
    /// Gesture missing but within the flicker tolerance.
    Tolerating { remaining_s: f64 },
    /// Held for the full duration.  Emitted once per hold.
    Confirmed { held_s: f64 },
    /// Dropout exceeded the tolerance; progress discarded.
    Interrupted { held_s: f64 },
}

// ── Confirmer ──────────────────────────────────────────────

/// Hold-to-confirm tracker for a single timed gesture.
#[derive(Debug, Clone)]
pub struct HoldConfirmer {
    pub gesture: GestureKind,
    pub config: HoldConfig,
    phase: HoldPhase,
}

impl HoldConfirmer {
    pub fn new(gesture: GestureKind, config: HoldConfig) -> Self {
        Self {
            gesture,
            config,
            phase: HoldPhase::Idle,
        }
    }

    pub fn phase(&self) -> &HoldPhase {
        &self.phase
    }

    /// Whether progress is currently being accumulated.
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            HoldPhase::Holding { .. } | HoldPhase::Tolerating { .. }
        )
    }

    /// Timestamp at which the current hold began, if accumulating.
    pub fn held_since(&self) -> Option<f64> {
        match self.phase {
            HoldPhase::Holding { since_s, .. } | HoldPhase::Tolerating { since_s, .. } => {
                Some(since_s)
            }
            _ => None,
        }
    }

    /// Feed one frame's raw predicate result.
    pub fn update(&mut self, present: bool, now_s: f64) -> Option<HoldEvent> {
        match (self.phase.clone(), present) {
            (HoldPhase::Idle, false) => None,
            (HoldPhase::Idle, true) => {
                debug!("Hold started: {} at {:.3}s", self.gesture.as_str(), now_s);
                self.phase = HoldPhase::Holding {
                    since_s: now_s,
                    last_seen_s: now_s,
                };
                if self.config.duration_s <= 0.0 {
                    return Some(self.confirm(0.0));
                }
                Some(HoldEvent::Started)
            }
            (
                HoldPhase::Holding { since_s, .. } | HoldPhase::Tolerating { since_s, .. },
                true,
            ) => {
                let elapsed_s = now_s - since_s;
                if elapsed_s >= self.config.duration_s {
                    return Some(self.confirm(elapsed_s));
                }
                self.phase = HoldPhase::Holding {
                    since_s,
                    last_seen_s: now_s,
                };
                Some(HoldEvent::Progress {
                    elapsed_s,
                    remaining_s: self.config.duration_s - elapsed_s,
                })
            }
            (
                HoldPhase::Holding {
                    since_s,
                    last_seen_s,
                }
                | HoldPhase::Tolerating {
                    since_s,
                    last_seen_s,
                },
                false,
            ) => {
                let gap_s = now_s - last_seen_s;
                if gap_s <= self.config.tolerance_s {
                    self.phase = HoldPhase::Tolerating {
                        since_s,
                        last_seen_s,
                    };
                    let remaining_s = (self.config.duration_s - (now_s - since_s)).max(0.0);
                    return Some(HoldEvent::Tolerating { remaining_s });
                }
                let held_s = last_seen_s - since_s;
                debug!(
                    "Hold interrupted: {} after {:.2}s (gap {:.2}s)",
                    self.gesture.as_str(),
                    held_s,
                    gap_s
                );
                self.phase = HoldPhase::Idle;
                Some(HoldEvent::Interrupted { held_s })
            }
            (HoldPhase::Confirmed, true) => None,
            (HoldPhase::Confirmed, false) => {
                self.phase = HoldPhase::Idle;
                None
            }
        }
    }

    fn confirm(&mut self, held_s: f64) -> HoldEvent {
        debug!("Hold confirmed: {} after {:.2}s", self.gesture.as_str(), held_s);
        self.phase = HoldPhase::Confirmed;
        HoldEvent::Confirmed { held_s }
    }

    /// Discard any progress.
    pub fn reset(&mut self) {
        self.phase = HoldPhase::Idle;
    }

    pub fn status_sexp(&self, now_s: f64) -> String {
        let elapsed = self.held_since().map(|since| now_s - since).unwrap_or(0.0);
        format!(
            "(:gesture :{} :phase :{} :elapsed-s {:.2} :duration-s {:.2})",
            self.gesture.as_str(),
            self.phase.as_str(),
            elapsed,
            self.config.duration_s,
        )
    }
}
