//! gestik - hand and body gesture control for keyboard-driven games.
//!
//! Turns per-frame hand/pose keypoints into debounced, hold-confirmed
//! gestures, runs them through a menu/game state machine, and drives
//! virtual key presses through an embedder-supplied `KeyInjector`.

pub mod announce;
pub mod cooldown;
pub mod gesture;
pub mod hold;
pub mod ipc;
pub mod keys;
pub mod landmarks;
pub mod machine;
pub mod session;
pub mod stats;

pub use gesture::{classify, GestureClassifier, GestureKind, GestureThresholds};
pub use keys::{KeyInjector, KeyTracker, VirtualKey};
pub use landmarks::{HandFrame, KeypointFrame, Landmark, PoseFrame};
pub use machine::{Action, AppState};
pub use session::{FrameOutcome, Session, SessionConfig};
