//! Virtual key bookkeeping.
//!
//! Games are driven by synthetic key presses.  `KeyTracker` sits between
//! the action layer and the embedder's `KeyInjector` and remembers which
//! keys are down, so that any transition can release everything and no
//! key is ever left stuck.  Taps are a press plus a release deferred to
//! an expiry timestamp, checked by `poll` at the start of each frame.

use std::collections::BTreeSet;
use tracing::{debug, warn};

// ── Keys ───────────────────────────────────────────────────

/// Keys the games listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VirtualKey {
    Space,
    Up,
    Down,
    Left,
    Right,
    Z,
    X,
}

impl VirtualKey {
    pub const ALL: [VirtualKey; 7] = [
        Self::Space,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Z,
        Self::X,
    ];

    /// String representation for event output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Z => "z",
            Self::X => "x",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

// ── Injector ───────────────────────────────────────────────

/// Side-effecting key sink supplied by the embedder (uinput, X11 test
/// extension, an event stream...).
pub trait KeyInjector {
    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()>;
    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()>;
}

impl<T: KeyInjector + ?Sized> KeyInjector for Box<T> {
    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        (**self).press(key)
    }

    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        (**self).release(key)
    }
}

// ── Tracker ────────────────────────────────────────────────

/// A release scheduled by `tap`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DeferredRelease {
    key: VirtualKey,
    due_s: f64,
}

/// Tracks held keys in front of a `KeyInjector`.
///
/// Injector failures are logged and swallowed.  A failed press leaves the
/// key up; a failed release still marks the key up so it is not retried
/// on every subsequent flush.
pub struct KeyTracker<I: KeyInjector> {
    injector: I,
    held: BTreeSet<VirtualKey>,
    deferred: Vec<DeferredRelease>,
    /// Injector calls that returned an error.
    pub failures: u64,
}

impl<I: KeyInjector> KeyTracker<I> {
    pub fn new(injector: I) -> Self {
        Self {
            injector,
            held: BTreeSet::new(),
            deferred: Vec::new(),
            failures: 0,
        }
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    pub fn injector_mut(&mut self) -> &mut I {
        &mut self.injector
    }

    pub fn is_held(&self, key: VirtualKey) -> bool {
        self.held.contains(&key)
    }

    pub fn held_keys(&self) -> Vec<VirtualKey> {
        self.held.iter().copied().collect()
    }

    /// Number of taps waiting for their release.
    pub fn pending_releases(&self) -> usize {
        self.deferred.len()
    }

    /// Press `key`.  No-op if already held.  Returns true if a press was sent.
    pub fn press(&mut self, key: VirtualKey) -> bool {
        if self.held.contains(&key) {
            return false;
        }
        match self.injector.press(key) {
            Ok(()) => {
                debug!("Key down: {}", key.as_str());
                self.held.insert(key);
                true
            }
            Err(e) => {
                self.failures += 1;
                warn!("Key press failed for {}: {:#}", key.as_str(), e);
                false
            }
        }
    }

    /// Release `key`.  No-op if not held.  Returns true if a release was sent.
    pub fn release(&mut self, key: VirtualKey) -> bool {
        self.deferred.retain(|d| d.key != key);
        if !self.held.remove(&key) {
            return false;
        }
        match self.injector.release(key) {
            Ok(()) => {
                debug!("Key up: {}", key.as_str());
                true
            }
            Err(e) => {
                self.failures += 1;
                warn!("Key release failed for {}: {:#}", key.as_str(), e);
                false
            }
        }
    }

    /// Press `key` and schedule its release `hold_s` seconds after `now_s`.
    /// Tapping a key that is already held only moves its release.
    pub fn tap(&mut self, key: VirtualKey, hold_s: f64, now_s: f64) {
        self.press(key);
        if !self.held.contains(&key) {
            return;
        }
        let due_s = now_s + hold_s;
        match self.deferred.iter_mut().find(|d| d.key == key) {
            Some(existing) => existing.due_s = due_s,
            None => self.deferred.push(DeferredRelease { key, due_s }),
        }
    }

    /// Run every deferred release due at or before `now_s`.
    pub fn poll(&mut self, now_s: f64) {
        let due: Vec<VirtualKey> = self
            .deferred
            .iter()
            .filter(|d| d.due_s <= now_s)
            .map(|d| d.key)
            .collect();
        for key in due {
            self.release(key);
        }
    }

    /// Release every held key, flushing pending deferred releases first.
    /// Returns the keys that were released.
    pub fn release_all(&mut self) -> Vec<VirtualKey> {
        self.deferred.clear();
        let held: Vec<VirtualKey> = self.held.iter().copied().collect();
        for key in &held {
            self.release(*key);
        }
        if !held.is_empty() {
            debug!("Released {} held keys", held.len());
        }
        held
    }

    /// Generate s-expression for held keys.
    pub fn status_sexp(&self) -> String {
        let held = if self.held.is_empty() {
            "nil".to_string()
        } else {
            let keys: Vec<String> = self.held.iter().map(|k| format!(":{}", k.as_str())).collect();
            format!("({})", keys.join(" "))
        };
        format!(
            "(:held {} :pending-releases {} :failures {})",
            held,
            self.deferred.len(),
            self.failures
        )
    }
}

// ── Test support ───────────────────────────────────────────

/// Injector that records every call, optionally failing.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingInjector {
    /// `(key, pressed)` in call order.
    pub calls: Vec<(VirtualKey, bool)>,
    pub fail_press: bool,
    pub fail_release: bool,
}

#[cfg(test)]
impl RecordingInjector {
    pub fn presses(&self) -> Vec<VirtualKey> {
        self.calls.iter().filter(|c| c.1).map(|c| c.0).collect()
    }

    pub fn releases(&self) -> Vec<VirtualKey> {
        self.calls.iter().filter(|c| !c.1).map(|c| c.0).collect()
    }
}

#[cfg(test)]
impl KeyInjector for RecordingInjector {
    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        if self.fail_press {
            anyhow::bail!("press rejected");
        }
        self.calls.push((key, true));
        Ok(())
    }

    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        if self.fail_release {
            anyhow::bail!("release rejected");
        }
        self.calls.push((key, false));
        Ok(())
    }
}
