//! Repeat suppression for instantaneous gestures and the actions they drive.
//!
//! `CooldownGate` counts processed frames so gesture repeat suppression
//! stays tied to the camera frame rate.  `ActionCooldown` bounds how often
//! a game action may fire in wall-clock time, independent of how often the
//! gesture behind it is detected.

use std::collections::BTreeMap;
use tracing::debug;

use crate::gesture::GestureKind;

// ── Config ─────────────────────────────────────────────────

/// Configuration for per-gesture frame cooldowns.
#[derive(Debug, Clone)]
pub struct CooldownConfig {
    /// Frames a gesture stays suppressed after it fires.
    pub window_frames: u32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self { window_frames: 10 }
    }
}

impl CooldownConfig {
    pub fn config_sexp(&self) -> String {
        format!("(:window-frames {})", self.window_frames)
    }
}

// ── Gesture gate ───────────────────────────────────────────

/// Per-gesture frame-count suppression.
#[derive(Debug, Clone, Default)]
pub struct CooldownGate {
    pub config: CooldownConfig,
    /// Remaining suppressed frames per gesture.  Absent means zero.
    counters: BTreeMap<GestureKind, u32>,
}

impl CooldownGate {
    pub fn new(config: CooldownConfig) -> Self {
        Self {
            config,
            counters: BTreeMap::new(),
        }
    }

    /// Advance one frame: decrement every active counter, floor at zero.
    pub fn tick(&mut self) {
        for remaining in self.counters.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.counters.retain(|_, remaining| *remaining > 0);
    }

    /// Whether `kind` fired recently enough to be ignored.
    pub fn is_suppressed(&self, kind: GestureKind) -> bool {
        self.remaining(kind) > 0
    }

    /// Start the suppression window for `kind`.
    pub fn trigger(&mut self, kind: GestureKind) {
        let window = self.config.window_frames;
        if window == 0 {
            return;
        }
        self.counters.insert(kind, window);
        debug!("Cooldown started: {} for {} frames", kind.as_str(), window);
    }

    /// Frames left before `kind` may fire again.
    pub fn remaining(&self, kind: GestureKind) -> u32 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }

    /// Generate s-expression listing active cooldowns.
    pub fn status_sexp(&self) -> String {
        if self.counters.is_empty() {
            return "nil".to_string();
        }
        let entries: Vec<String> = self
            .counters
            .iter()
            .map(|(kind, remaining)| format!("(:gesture :{} :frames {})", kind.as_str(), remaining))
            .collect();
        format!("({})", entries.join(" "))
    }
}

// ── Action cooldown ────────────────────────────────────────

/// Minimum wall-clock interval between repeated firings of one action.
#[derive(Debug, Clone)]
pub struct ActionCooldown {
    /// Minimum seconds between firings.
    pub interval_s: f64,
    /// Timestamp of the last firing, if any.
    last_fired_s: Option<f64>,
}

impl ActionCooldown {
    pub fn new(interval_s: f64) -> Self {
        Self {
            interval_s,
            last_fired_s: None,
        }
    }

    /// Whether the action may fire at `now_s`.
    pub fn is_ready(&self, now_s: f64) -> bool {
        match self.last_fired_s {
            Some(last) => now_s - last >= self.interval_s,
            None => true,
        }
    }

    /// Fire if ready.  Returns true when the action fired.
    pub fn try_fire(&mut self, now_s: f64) -> bool {
        if !self.is_ready(now_s) {
            return false;
        }
        self.last_fired_s = Some(now_s);
        true
    }

    pub fn reset(&mut self) {
        self.last_fired_s = None;
    }
}
