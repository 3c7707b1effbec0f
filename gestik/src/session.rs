//! One gesture-control session: the single owned context for a frame loop.
//!
//! `Session` owns the classifier, the cooldown gate, the hold confirmers,
//! the announcement with its idle decay, the state machine and the key
//! tracker.  The embedder drives it with `process_frame` once per camera
//! frame, passing a monotonic timestamp.

use tracing::{debug, info};

use crate::announce::{GestureAnnouncement, IdleConfig, IdleDecay};
use crate::cooldown::{CooldownConfig, CooldownGate};
use crate::gesture::{GestureClassifier, GestureKind, GestureThresholds};
use crate::hold::{HoldConfig, HoldConfirmer, HoldEvent};
use crate::keys::{KeyInjector, KeyTracker, VirtualKey};
use crate::landmarks::KeypointFrame;
use crate::machine::{
    Action, ActionStateMachine, AppState, GestureEvent, MachineConfig, PoseSnapshot,
};
use crate::stats::SessionStats;

// ── Config ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub thresholds: GestureThresholds,
    pub cooldown: CooldownConfig,
    pub idle: IdleConfig,
    pub machine: MachineConfig,
    /// Rock sign → quit.
    pub quit_hold: HoldConfig,
    /// Peace sign → menu/game toggle.
    pub toggle_hold: HoldConfig,
    /// Palms touching → leave the pose game.
    pub pose_menu_hold: HoldConfig,
    /// Seconds a tapped key stays down.
    pub tap_hold_s: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            thresholds: GestureThresholds::default(),
            cooldown: CooldownConfig::default(),
            idle: IdleConfig::default(),
            machine: MachineConfig::default(),
            quit_hold: HoldConfig::quit(),
            toggle_hold: HoldConfig::toggle(),
            pose_menu_hold: HoldConfig::pose_menu(),
            tap_hold_s: 0.25,
        }
    }
}

impl SessionConfig {
    pub fn config_sexp(&self) -> String {
        format!(
            "(:thresholds {} :cooldown {} :idle {} :machine {} :quit-hold {} :toggle-hold {} :pose-menu-hold {} :tap-hold-s {:.2})",
            self.thresholds.config_sexp(),
            self.cooldown.config_sexp(),
            self.idle.config_sexp(),
            self.machine.config_sexp(),
            self.quit_hold.config_sexp(),
            self.toggle_hold.config_sexp(),
            self.pose_menu_hold.config_sexp(),
            self.tap_hold_s,
        )
    }
}

// ── Frame outcome ──────────────────────────────────────────

/// What one frame did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    /// Actions emitted, in order, each with the state it was emitted from.
    pub emitted: Vec<(AppState, Action)>,
    /// New announcement, if it changed this frame.
    pub announcement: Option<GestureAnnouncement>,
    /// New state, if the state changed this frame.
    pub transition: Option<AppState>,
}

impl FrameOutcome {
    pub fn actions(&self) -> Vec<Action> {
        self.emitted.iter().map(|(_, action)| *action).collect()
    }
}

/// Key side effect bound to an action.
#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyEffect {
    Tap(VirtualKey),
    Press(VirtualKey),
    Release(VirtualKey),
}

/// Key binding for `action` when emitted from `state`.
fn key_effect(state: AppState, action: Action) -> Option<KeyEffect> {
    use KeyEffect::*;
    match (state, action) {
        (AppState::DinoGame, Action::Jump) => Some(Tap(VirtualKey::Space)),
        (AppState::PoseControlledGame, Action::Jump) => Some(Tap(VirtualKey::X)),
        (_, Action::Attack) => Some(Tap(VirtualKey::Z)),
        (_, Action::MoveUp) => Some(Tap(VirtualKey::Up)),
        (_, Action::MoveDown) => Some(Tap(VirtualKey::Down)),
        (_, Action::MoveLeft) => Some(Tap(VirtualKey::Left)),
        (_, Action::MoveRight) => Some(Tap(VirtualKey::Right)),
        (_, Action::PressLeft) => Some(Press(VirtualKey::Left)),
        (_, Action::PressRight) => Some(Press(VirtualKey::Right)),
        (_, Action::ReleaseLeft) => Some(Release(VirtualKey::Left)),
        (_, Action::ReleaseRight) => Some(Release(VirtualKey::Right)),
        _ => None,
    }
}

/// Pose gestures in announcement priority order.
const POSE_ANNOUNCE: [GestureKind; 4] = [
    GestureKind::LeanLeft,
    GestureKind::LeanRight,
    GestureKind::ArmRaised,
    GestureKind::HandsNearKnees,
];

// ── Session ────────────────────────────────────────────────

pub struct Session<I: KeyInjector> {
    pub config: SessionConfig,
    classifier: GestureClassifier,
    cooldown: CooldownGate,
    holds: Vec<HoldConfirmer>,
    idle: IdleDecay,
    announcement: GestureAnnouncement,
    machine: ActionStateMachine,
    keys: KeyTracker<I>,
    pub stats: SessionStats,
}

impl<I: KeyInjector> Session<I> {
    pub fn new(config: SessionConfig, injector: I) -> Self {
        let holds = vec![
            HoldConfirmer::new(GestureKind::RockSign, config.quit_hold.clone()),
            HoldConfirmer::new(GestureKind::PeaceSign, config.toggle_hold.clone()),
            HoldConfirmer::new(GestureKind::PalmsTouching, config.pose_menu_hold.clone()),
        ];
        info!(
            "Session started: {} games, cooldown {} frames",
            config.machine.games.len(),
            config.cooldown.window_frames
        );
        Self {
            classifier: GestureClassifier::new(config.thresholds.clone()),
            cooldown: CooldownGate::new(config.cooldown.clone()),
            holds,
            idle: IdleDecay::new(config.idle.clone()),
            announcement: GestureAnnouncement::neutral(),
            machine: ActionStateMachine::new(config.machine.clone()),
            keys: KeyTracker::new(injector),
            stats: SessionStats::default(),
            config,
        }
    }

    pub fn state(&self) -> AppState {
        self.machine.state()
    }

    pub fn is_closed(&self) -> bool {
        self.machine.state() == AppState::Closed
    }

    pub fn announcement(&self) -> &GestureAnnouncement {
        &self.announcement
    }

    pub fn machine(&self) -> &ActionStateMachine {
        &self.machine
    }

    pub fn keys(&self) -> &KeyTracker<I> {
        &self.keys
    }

    pub fn injector(&self) -> &I {
        self.keys.injector()
    }

    pub fn injector_mut(&mut self) -> &mut I {
        self.keys.injector_mut()
    }

    /// Process one frame.  `frame` is `None` when the model found nothing.
    pub fn process_frame(&mut self, frame: Option<&KeypointFrame>, now_s: f64) -> FrameOutcome {
        self.stats.record_frame(frame, now_s);
        self.keys.poll(now_s);
        self.cooldown.tick();

        let mut outcome = FrameOutcome::default();
        if self.is_closed() {
            return outcome;
        }
        let before = self.announcement.clone();
        let state = self.machine.state();
        let mut events = Vec::new();

        let (hold_present, mut detected) = self.update_holds(frame, state, now_s, &mut events);

        match frame {
            // A hold in progress owns the hand.
            Some(f) if f.as_hand().is_some() => {
                if !hold_present {
                    detected |= self.detect_instant(f, state, &mut events);
                }
            }
            Some(f) if state == AppState::PoseControlledGame => {
                detected |= self.detect_pose(f, &mut events);
            }
            // Subject lost: release any lean and re-arm the edges.
            None if state == AppState::PoseControlledGame => {
                events.push(GestureEvent::Pose(PoseSnapshot::default()));
            }
            _ => {}
        }

        if detected {
            self.idle.detected();
        } else {
            self.idle.no_detection_tick(&mut self.announcement);
        }

        for event in events {
            let origin = self.machine.state();
            let actions = self.machine.handle(event, now_s);
            for action in actions {
                self.stats.record_action(action);
                self.apply(origin, action, now_s);
                outcome.emitted.push((origin, action));
            }
            let current = self.machine.state();
            if current != origin {
                self.keys.release_all();
                self.reset_tracking(current);
                outcome.transition = Some(current);
            }
        }

        if self.announcement != before {
            outcome.announcement = Some(self.announcement.clone());
        }
        outcome
    }

    /// Advance the hold confirmers that apply in `state`.  Returns whether
    /// any hold gesture is present this frame, and whether anything counts
    /// as a detection for idle decay.
    fn update_holds(
        &mut self,
        frame: Option<&KeypointFrame>,
        state: AppState,
        now_s: f64,
        events: &mut Vec<GestureEvent>,
    ) -> (bool, bool) {
        let mut any_present = false;
        let mut detected = false;
        for hold in &mut self.holds {
            let kind = hold.gesture;
            if !state.hold_gestures().contains(&kind) {
                hold.reset();
                continue;
            }
            // Frames of the other modality say nothing about this gesture.
            if let Some(f) = frame {
                if kind.is_pose() != f.as_pose().is_some() {
                    continue;
                }
            }
            let present = frame.map_or(false, |f| self.classifier.classify(f, kind));
            any_present |= present;
            match hold.update(present, now_s) {
                Some(HoldEvent::Started) => {
                    detected = true;
                    let remaining = hold.config.duration_s;
                    self.announcement.set(kind, holding_label(remaining));
                }
                Some(HoldEvent::Progress { remaining_s, .. }) => {
                    detected = true;
                    self.announcement.set(kind, holding_label(remaining_s));
                }
                Some(HoldEvent::Tolerating { .. }) => detected = true,
                Some(HoldEvent::Confirmed { held_s }) => {
                    detected = true;
                    info!("Hold confirmed: {} ({:.2}s)", kind.as_str(), held_s);
                    self.stats.holds_confirmed += 1;
                    self.stats.record_gesture(kind);
                    self.announcement.set(kind, self.machine.context_action(kind));
                    events.push(GestureEvent::HoldConfirmed(kind));
                }
                Some(HoldEvent::Interrupted { .. }) => self.stats.holds_interrupted += 1,
                None => detected |= present,
            }
        }
        (any_present, detected)
    }

    /// Accept the highest-priority instantaneous gesture for `state`.
    fn detect_instant(
        &mut self,
        frame: &KeypointFrame,
        state: AppState,
        events: &mut Vec<GestureEvent>,
    ) -> bool {
        let Some(kind) = state
            .accepted_gestures()
            .iter()
            .copied()
            .find(|k| self.classifier.classify(frame, *k))
        else {
            return false;
        };
        if self.cooldown.is_suppressed(kind) {
            self.stats.cooldown_blocks += 1;
            return true;
        }
        debug!("Gesture: {} in {}", kind.as_str(), state.as_str());
        self.cooldown.trigger(kind);
        self.stats.record_gesture(kind);
        self.announcement.set(kind, self.machine.context_action(kind));
        events.push(GestureEvent::Detected(kind));
        true
    }

    /// Snapshot level-triggered pose gestures for the pose game.
    fn detect_pose(&mut self, frame: &KeypointFrame, events: &mut Vec<GestureEvent>) -> bool {
        let is = |kind| self.classifier.classify(frame, kind);
        let snapshot = PoseSnapshot {
            lean_left: is(GestureKind::LeanLeft),
            lean_right: is(GestureKind::LeanRight),
            arm_raised: is(GestureKind::ArmRaised),
            hands_near_knees: is(GestureKind::HandsNearKnees),
        };
        events.push(GestureEvent::Pose(snapshot));

        let Some(kind) = POSE_ANNOUNCE.iter().copied().find(|k| is(*k)) else {
            return false;
        };
        if self.announcement.label != kind.as_str() {
            self.stats.record_gesture(kind);
            self.announcement.set(kind, self.machine.context_action(kind));
        }
        true
    }

    fn apply(&mut self, origin: AppState, action: Action, now_s: f64) {
        match key_effect(origin, action) {
            Some(KeyEffect::Tap(key)) => self.keys.tap(key, self.config.tap_hold_s, now_s),
            Some(KeyEffect::Press(key)) => {
                self.keys.press(key);
            }
            Some(KeyEffect::Release(key)) => {
                self.keys.release(key);
            }
            None => {}
        }
    }

    /// Drop per-mode progress after a state change.
    fn reset_tracking(&mut self, state: AppState) {
        self.cooldown.reset();
        for hold in &mut self.holds {
            if !state.hold_gestures().contains(&hold.gesture) {
                hold.reset();
            }
        }
        if state == AppState::Closed {
            info!("Session closed");
        }
    }

    /// Release every held key.  Call when the frame source ends.
    pub fn shutdown(&mut self) -> Vec<VirtualKey> {
        let released = self.keys.release_all();
        info!(
            "Session stopped in {} after {} frames",
            self.machine.state().as_str(),
            self.stats.frames
        );
        released
    }

    pub fn status_sexp(&self, now_s: f64) -> String {
        let holds: Vec<String> = self.holds.iter().map(|h| h.status_sexp(now_s)).collect();
        format!(
            "(:machine {} :announcement {} :keys {} :cooldowns {} :holds ({}) :stats {})",
            self.machine.status_sexp(),
            self.announcement.status_sexp(),
            self.keys.status_sexp(),
            self.cooldown.status_sexp(),
            holds.join(" "),
            self.stats.status_sexp(),
        )
    }
}

fn holding_label(remaining_s: f64) -> String {
    format!("manteniendo... {:.1}s", remaining_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::FingerPose::{Extended as E, Folded as F};
    use crate::gesture::{hand_frame, make_pose};
    use crate::keys::RecordingInjector;
    use crate::landmarks::PoseLandmark;

    fn session() -> Session<RecordingInjector> {
        Session::new(SessionConfig::default(), RecordingInjector::default())
    }

    fn fist() -> KeypointFrame {
        hand_frame([F, F, F, F])
    }

    fn open_hand() -> KeypointFrame {
        hand_frame([E, E, E, E])
    }

    fn rock() -> KeypointFrame {
        hand_frame([E, F, F, E])
    }

    fn peace() -> KeypointFrame {
        hand_frame([E, E, F, F])
    }

    fn standing() -> KeypointFrame {
        KeypointFrame::Pose(make_pose())
    }

    fn leaning_left() -> KeypointFrame {
        KeypointFrame::Pose(
            make_pose()
                .with(PoseLandmark::LeftShoulder, 0.36, 0.35)
                .with(PoseLandmark::RightShoulder, 0.55, 0.35),
        )
    }

    /// Palms together while still leaning left.
    fn palms_leaning_left() -> KeypointFrame {
        KeypointFrame::Pose(
            make_pose()
                .with(PoseLandmark::LeftShoulder, 0.36, 0.35)
                .with(PoseLandmark::RightShoulder, 0.55, 0.35)
                .with(PoseLandmark::LeftWrist, 0.50, 0.60)
                .with(PoseLandmark::RightWrist, 0.52, 0.60),
        )
    }

    /// Feed `frame` at `fps` from `start_s` for `duration_s`, inclusive.
    fn hold_for(
        s: &mut Session<RecordingInjector>,
        frame: &KeypointFrame,
        start_s: f64,
        duration_s: f64,
        fps: f64,
    ) -> Vec<Action> {
        let steps = (duration_s * fps).round() as usize;
        let mut actions = Vec::new();
        for i in 0..=steps {
            let t = start_s + i as f64 / fps;
            actions.extend(s.process_frame(Some(frame), t).actions());
        }
        actions
    }

    /// Point up once (wrapping to the last entry), then select.
    fn enter_pose_game(s: &mut Session<RecordingInjector>) {
        s.process_frame(Some(&hand_frame([E, F, F, F])), 0.0);
        assert_eq!(s.machine().selected_game(), Some(AppState::PoseControlledGame));
        s.process_frame(Some(&open_hand()), 0.1);
        assert_eq!(s.state(), AppState::PoseControlledGame);
    }

    #[test]
    fn test_fist_fist_open_hand_scenario() {
        let mut s = session();
        let first = s.process_frame(Some(&fist()), 0.0);
        assert!(first.actions().is_empty());
        assert_eq!(s.announcement().label, "fist");
        assert_eq!(s.announcement().context_action, "detectado");

        let second = s.process_frame(Some(&fist()), 0.1);
        assert!(second.actions().is_empty());
        assert_eq!(s.announcement().label, "fist");

        let third = s.process_frame(Some(&open_hand()), 0.2);
        assert_eq!(third.actions(), vec![Action::Select]);
        assert_eq!(third.transition, Some(AppState::DinoGame));
        assert_eq!(s.state(), AppState::DinoGame);
    }

    #[test]
    fn test_cooldown_suppresses_repeat() {
        let mut s = session();
        s.process_frame(Some(&fist()), 0.0);
        s.machine.handle(GestureEvent::Detected(GestureKind::OpenHand), 0.0);
        assert_eq!(s.state(), AppState::DinoGame);
        let mut jumps = 0;
        for i in 0..10 {
            let out = s.process_frame(Some(&open_hand()), 1.0 + i as f64);
            jumps += out.actions().iter().filter(|a| **a == Action::Jump).count();
        }
        // One detection, then nine frames inside the 10-frame window.
        assert_eq!(jumps, 1);
    }

    #[test]
    fn test_rock_hold_quits_once_and_releases_keys() {
        let mut s = session();
        enter_pose_game(&mut s);
        let out = s.process_frame(Some(&leaning_left()), 1.0);
        assert_eq!(out.actions(), vec![Action::PressLeft]);
        assert!(s.keys().is_held(VirtualKey::Left));

        let actions = hold_for(&mut s, &rock(), 1.1, 2.4, 5.0);
        let quits = actions.iter().filter(|a| **a == Action::Quit).count();
        assert_eq!(quits, 1, "actions {:?}", actions);
        assert_eq!(s.state(), AppState::Closed);
        assert!(s.keys().held_keys().is_empty());
        assert_eq!(s.injector().releases(), vec![VirtualKey::Left]);
    }

    #[test]
    fn test_rock_hold_from_menu() {
        let mut s = session();
        let actions = hold_for(&mut s, &rock(), 0.0, 2.0, 5.0);
        assert_eq!(actions, vec![Action::Quit]);
        assert!(s.is_closed());
        // Closed is terminal.
        assert!(s.process_frame(Some(&open_hand()), 3.0).actions().is_empty());
    }

    #[test]
    fn test_rock_released_early_does_not_quit() {
        let mut s = session();
        let actions = hold_for(&mut s, &rock(), 0.0, 1.8, 5.0);
        assert!(actions.is_empty());
        s.process_frame(None, 2.1);
        let actions = hold_for(&mut s, &rock(), 2.2, 1.0, 5.0);
        assert!(actions.is_empty());
        assert_eq!(s.state(), AppState::MainMenu);
    }

    #[test]
    fn test_hold_progress_announcement() {
        let mut s = session();
        s.process_frame(Some(&peace()), 0.0);
        assert_eq!(s.announcement().context_action, "manteniendo... 1.2s");
        s.process_frame(Some(&peace()), 0.4);
        assert_eq!(s.announcement().label, "peace-sign");
        assert_eq!(s.announcement().context_action, "manteniendo... 0.8s");
    }

    #[test]
    fn test_peace_toggle_one_transition_per_hold() {
        let mut s = session();
        let actions = hold_for(&mut s, &peace(), 0.0, 4.0, 10.0);
        assert_eq!(actions, vec![Action::Select]);
        assert_eq!(s.state(), AppState::DinoGame);

        s.process_frame(None, 4.5);
        let actions = hold_for(&mut s, &peace(), 5.0, 1.2, 10.0);
        assert_eq!(actions, vec![Action::EnterMenu]);
        assert_eq!(s.state(), AppState::MainMenu);
    }

    #[test]
    fn test_dino_jump_taps_space() {
        let mut s = session();
        hold_for(&mut s, &peace(), 0.0, 1.2, 10.0);
        assert_eq!(s.state(), AppState::DinoGame);
        s.process_frame(None, 1.5);

        let out = s.process_frame(Some(&open_hand()), 2.0);
        assert_eq!(out.actions(), vec![Action::Jump]);
        assert!(s.keys().is_held(VirtualKey::Space));
        s.process_frame(None, 2.3);
        assert!(!s.keys().is_held(VirtualKey::Space));
        assert_eq!(s.injector().calls, vec![
            (VirtualKey::Space, true),
            (VirtualKey::Space, false),
        ]);
    }

    #[test]
    fn test_leaving_pose_game_releases_keys() {
        let mut s = session();
        enter_pose_game(&mut s);
        s.process_frame(Some(&leaning_left()), 1.0);
        assert!(s.keys().is_held(VirtualKey::Left));

        let mut actions = Vec::new();
        for i in 0..=31 {
            actions.extend(s.process_frame(Some(&palms_leaning_left()), 1.1 + i as f64 * 0.1).actions());
        }
        assert_eq!(actions, vec![Action::ReleaseLeft, Action::EnterMenu]);
        assert_eq!(s.state(), AppState::MainMenu);
        assert!(s.keys().held_keys().is_empty());
    }

    #[test]
    fn test_subject_lost_releases_lean() {
        let mut s = session();
        enter_pose_game(&mut s);
        s.process_frame(Some(&leaning_left()), 1.0);
        assert!(s.keys().is_held(VirtualKey::Left));

        let out = s.process_frame(None, 1.1);
        assert_eq!(out.actions(), vec![Action::ReleaseLeft]);
        for i in 2..20 {
            let out = s.process_frame(None, 1.0 + i as f64 * 0.1);
            assert!(out.actions().is_empty(), "frame {} {:?}", i, out);
        }
        assert!(s.keys().held_keys().is_empty());
        assert_eq!(s.state(), AppState::PoseControlledGame);

        // Leaning again on reappearance presses the key again.
        let out = s.process_frame(Some(&leaning_left()), 3.0);
        assert_eq!(out.actions(), vec![Action::PressLeft]);
    }

    #[test]
    fn test_actions_tagged_with_origin_state() {
        let mut s = session();
        enter_pose_game(&mut s);
        s.process_frame(Some(&leaning_left()), 1.0);
        let mut emitted = Vec::new();
        for i in 0..=31 {
            emitted.extend(s.process_frame(Some(&palms_leaning_left()), 1.1 + i as f64 * 0.1).emitted);
        }
        assert_eq!(
            emitted,
            vec![
                (AppState::PoseControlledGame, Action::ReleaseLeft),
                (AppState::PoseControlledGame, Action::EnterMenu),
            ]
        );
    }

    #[test]
    fn test_pose_lean_switch_order() {
        let mut s = session();
        enter_pose_game(&mut s);
        s.process_frame(Some(&leaning_left()), 1.0);
        let right = KeypointFrame::Pose(
            make_pose()
                .with(PoseLandmark::LeftShoulder, 0.60, 0.35)
                .with(PoseLandmark::RightShoulder, 0.40, 0.35),
        );
        let out = s.process_frame(Some(&right), 1.1);
        assert_eq!(out.actions(), vec![Action::ReleaseLeft, Action::PressRight]);
        assert_eq!(
            s.injector().calls,
            vec![
                (VirtualKey::Left, true),
                (VirtualKey::Left, false),
                (VirtualKey::Right, true),
            ]
        );
        let out = s.process_frame(Some(&standing()), 1.2);
        assert_eq!(out.actions(), vec![Action::ReleaseRight]);
    }

    #[test]
    fn test_idle_decay_resets_announcement() {
        let mut s = session();
        s.process_frame(Some(&fist()), 0.0);
        for i in 1..5 {
            s.process_frame(None, i as f64 * 0.1);
        }
        assert_eq!(s.announcement().label, "fist");
        let out = s.process_frame(None, 0.5);
        assert!(s.announcement().is_neutral());
        assert_eq!(out.announcement, Some(GestureAnnouncement::neutral()));
    }

    #[test]
    fn test_shutdown_releases_keys() {
        let mut s = session();
        enter_pose_game(&mut s);
        s.process_frame(Some(&leaning_left()), 1.0);
        assert_eq!(s.shutdown(), vec![VirtualKey::Left]);
        assert!(s.keys().held_keys().is_empty());
    }

    #[test]
    fn test_status_sexp() {
        let mut s = session();
        s.process_frame(Some(&fist()), 0.0);
        let sexp = s.status_sexp(0.0);
        assert!(sexp.contains(":state :main-menu"));
        assert!(sexp.contains("(:label \"fist\" :context \"detectado\")"));
        assert!(sexp.contains(":gesture :rock-sign :phase :idle"));
        assert!(SessionConfig::default().config_sexp().contains(":cooldown (:window-frames 10)"));
    }
}
