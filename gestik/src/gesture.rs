//! Gesture classification from single keypoint frames.
//!
//! Each gesture is a pure geometric predicate over one `KeypointFrame`:
//! fingertip offsets against the finger's PIP/MCP joints for hand
//! gestures, shoulder/wrist/knee relations for pose gestures.  Predicates
//! never fail: missing or implausible landmarks classify as "not present".

use crate::landmarks::{Finger, HandFrame, HandLandmark, KeypointFrame, Landmark, PoseFrame, PoseLandmark};

// ── Gesture kinds ──────────────────────────────────────────

/// Recognized instantaneous gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GestureKind {
    /// At least three fingers extended, at most one folded.
    OpenHand,
    /// All four fingers folded below their knuckles.
    Fist,
    /// Index extended upward, others relaxed.
    PointUp,
    /// Index pointing below the wrist, others relaxed.
    PointDown,
    /// Pinky extended upward, others relaxed.
    PinkyUp,
    /// Thumb pushed out to the left, fingers folded.
    ThumbLeft,
    /// Thumb pushed out to the right, fingers folded.
    ThumbRight,
    /// Index and pinky extended, middle and ring folded.
    RockSign,
    /// Index and middle extended, ring and pinky folded.
    PeaceSign,
    /// Shoulders offset toward the left.
    LeanLeft,
    /// Shoulders offset toward the right.
    LeanRight,
    /// A wrist above the nose.
    ArmRaised,
    /// Both wrists level with the knees.
    HandsNearKnees,
    /// Both wrists together at body height.
    PalmsTouching,
}

impl GestureKind {
    pub const ALL: [GestureKind; 14] = [
        Self::OpenHand,
        Self::Fist,
        Self::PointUp,
        Self::PointDown,
        Self::PinkyUp,
        Self::ThumbLeft,
        Self::ThumbRight,
        Self::RockSign,
        Self::PeaceSign,
        Self::LeanLeft,
        Self::LeanRight,
        Self::ArmRaised,
        Self::HandsNearKnees,
        Self::PalmsTouching,
    ];

    /// String representation for event output and announcements.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenHand => "open-hand",
            Self::Fist => "fist",
            Self::PointUp => "point-up",
            Self::PointDown => "point-down",
            Self::PinkyUp => "pinky-up",
            Self::ThumbLeft => "thumb-left",
            Self::ThumbRight => "thumb-right",
            Self::RockSign => "rock-sign",
            Self::PeaceSign => "peace-sign",
            Self::LeanLeft => "lean-left",
            Self::LeanRight => "lean-right",
            Self::ArmRaised => "arm-raised",
            Self::HandsNearKnees => "hands-near-knees",
            Self::PalmsTouching => "palms-touching",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Whether this gesture is derived from a body pose frame.
    pub fn is_pose(&self) -> bool {
        matches!(
            self,
            Self::LeanLeft
                | Self::LeanRight
                | Self::ArmRaised
                | Self::HandsNearKnees
                | Self::PalmsTouching
        )
    }
}

// ── Thresholds ─────────────────────────────────────────────

/// Classification margins in normalized image units.
///
/// The defaults were tuned by hand against a webcam at arm's length;
/// they are empirical, not derived.
#[derive(Debug, Clone)]
pub struct GestureThresholds {
    /// Tip-vs-PIP margin for "extended"/"folded" (open hand, peace, rock).
    pub extend_margin: f32,
    /// Tip-vs-MCP margin an open-hand finger must also clear.
    pub open_mcp_margin: f32,
    /// Tip below MCP by this much counts as "clearly folded" for open hand.
    pub open_fold_margin: f32,
    /// Tip at or below MCP plus this margin counts as folded in a fist.
    pub fist_fold_margin: f32,
    /// Stricter tip-above-PIP margin that disqualifies a fist.
    pub fist_extend_margin: f32,
    /// Margin for pointing, pinky and thumb gestures.  The other fingers
    /// must stay within half of it to count as relaxed.
    pub point_margin: f32,
    /// Horizontal shoulder offset for a lean.
    pub lean_threshold: f32,
    /// Maximum vertical wrist-to-knee distance.
    pub knee_proximity: f32,
    /// Maximum per-axis wrist-to-wrist distance for touching palms.
    pub palms_proximity: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            extend_margin: 0.02,
            open_mcp_margin: 0.04,
            open_fold_margin: 0.01,
            fist_fold_margin: 0.02,
            fist_extend_margin: 0.03,
            point_margin: 0.025,
            lean_threshold: 0.16,
            knee_proximity: 0.1,
            palms_proximity: 0.08,
        }
    }
}

impl GestureThresholds {
    pub fn config_sexp(&self) -> String {
        format!(
            "(:extend-margin {:.3} :open-mcp-margin {:.3} :open-fold-margin {:.3} :fist-fold-margin {:.3} :fist-extend-margin {:.3} :point-margin {:.3} :lean-threshold {:.3} :knee-proximity {:.3} :palms-proximity {:.3})",
            self.extend_margin,
            self.open_mcp_margin,
            self.open_fold_margin,
            self.fist_fold_margin,
            self.fist_extend_margin,
            self.point_margin,
            self.lean_threshold,
            self.knee_proximity,
            self.palms_proximity,
        )
    }
}

// ── Classifier ─────────────────────────────────────────────

/// Stateless gesture classifier.
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    pub config: GestureThresholds,
}

impl GestureClassifier {
    pub fn new(config: GestureThresholds) -> Self {
        Self { config }
    }

    /// Whether `kind` is present in `frame`.  Hand gestures are never
    /// present in pose frames and vice versa.
    pub fn classify(&self, frame: &KeypointFrame, kind: GestureKind) -> bool {
        let t = &self.config;
        let present = match frame {
            KeypointFrame::Hand(hand) => match kind {
                GestureKind::OpenHand => open_hand(hand, t),
                GestureKind::Fist => fist(hand, t),
                GestureKind::PointUp => point_up(hand, t),
                GestureKind::PointDown => point_down(hand, t),
                GestureKind::PinkyUp => pinky_up(hand, t),
                GestureKind::ThumbLeft => thumb_sideways(hand, t, Side::Left),
                GestureKind::ThumbRight => thumb_sideways(hand, t, Side::Right),
                GestureKind::RockSign => rock_sign(hand, t),
                GestureKind::PeaceSign => peace_sign(hand, t),
                _ => None,
            },
            KeypointFrame::Pose(pose) => match kind {
                GestureKind::LeanLeft => lean(pose, t, Side::Left),
                GestureKind::LeanRight => lean(pose, t, Side::Right),
                GestureKind::ArmRaised => arm_raised(pose),
                GestureKind::HandsNearKnees => hands_near_knees(pose, t),
                GestureKind::PalmsTouching => palms_touching(pose, t),
                _ => None,
            },
        };
        present.unwrap_or(false)
    }

    /// All gestures present in `frame`, in `GestureKind::ALL` order.
    pub fn present(&self, frame: &KeypointFrame) -> Vec<GestureKind> {
        GestureKind::ALL
            .iter()
            .copied()
            .filter(|k| self.classify(frame, *k))
            .collect()
    }
}

/// Classify with the default thresholds.
pub fn classify(frame: &KeypointFrame, kind: GestureKind) -> bool {
    GestureClassifier::default().classify(frame, kind)
}

// ── Hand predicates ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// The three joints of a finger used by the fold/extension tests.
#[derive(Debug, Clone, Copy)]
struct FingerPoints {
    mcp: Landmark,
    pip: Landmark,
    tip: Landmark,
}

impl FingerPoints {
    fn of(hand: &HandFrame, finger: Finger) -> Option<Self> {
        Some(Self {
            mcp: hand.point(finger.mcp())?,
            pip: hand.point(finger.pip())?,
            tip: hand.point(finger.tip())?,
        })
    }

    fn tip_above_pip(&self, margin: f32) -> bool {
        self.tip.y < self.pip.y - margin
    }

    fn tip_below_pip(&self, margin: f32) -> bool {
        self.tip.y > self.pip.y + margin
    }

    fn tip_above_mcp(&self, margin: f32) -> bool {
        self.tip.y < self.mcp.y - margin
    }

    /// Not raised past the PIP by more than `margin`.
    fn relaxed(&self, margin: f32) -> bool {
        self.tip.y > self.pip.y - margin
    }
}

/// Index, middle, ring, pinky; `None` if any joint is missing.
fn fingers(hand: &HandFrame) -> Option<[FingerPoints; 4]> {
    Some([
        FingerPoints::of(hand, Finger::Index)?,
        FingerPoints::of(hand, Finger::Middle)?,
        FingerPoints::of(hand, Finger::Ring)?,
        FingerPoints::of(hand, Finger::Pinky)?,
    ])
}

fn open_hand(hand: &HandFrame, t: &GestureThresholds) -> Option<bool> {
    let fingers = fingers(hand)?;
    let extended = fingers
        .iter()
        .filter(|f| f.tip_above_pip(t.extend_margin) && f.tip_above_mcp(t.open_mcp_margin))
        .count();
    let folded = fingers
        .iter()
        .filter(|f| f.tip.y > f.mcp.y + t.open_fold_margin)
        .count();
    Some(extended >= 3 && folded <= 1)
}

fn fist(hand: &HandFrame, t: &GestureThresholds) -> Option<bool> {
    let fingers = fingers(hand)?;
    let all_folded = fingers
        .iter()
        .all(|f| f.tip.y >= f.mcp.y + t.fist_fold_margin);
    let any_extended = fingers
        .iter()
        .any(|f| f.tip_above_pip(t.fist_extend_margin));
    Some(all_folded && !any_extended)
}

fn peace_sign(hand: &HandFrame, t: &GestureThresholds) -> Option<bool> {
    let [index, middle, ring, pinky] = fingers(hand)?;
    let m = t.extend_margin;
    Some(
        index.tip_above_pip(m)
            && middle.tip_above_pip(m)
            && ring.tip_below_pip(m)
            && pinky.tip_below_pip(m),
    )
}

fn rock_sign(hand: &HandFrame, t: &GestureThresholds) -> Option<bool> {
    let [index, middle, ring, pinky] = fingers(hand)?;
    let m = t.extend_margin;
    Some(
        index.tip_above_pip(m)
            && pinky.tip_above_pip(m)
            && middle.tip_below_pip(m)
            && ring.tip_below_pip(m),
    )
}

fn point_up(hand: &HandFrame, t: &GestureThresholds) -> Option<bool> {
    let [index, middle, ring, pinky] = fingers(hand)?;
    let half = t.point_margin / 2.0;
    Some(
        index.tip_above_pip(t.point_margin)
            && middle.relaxed(half)
            && ring.relaxed(half)
            && pinky.relaxed(half),
    )
}

fn point_down(hand: &HandFrame, t: &GestureThresholds) -> Option<bool> {
    let wrist = hand.point(HandLandmark::Wrist)?;
    let [index, middle, ring, pinky] = fingers(hand)?;
    let half = t.point_margin / 2.0;
    let index_down =
        index.tip.y > wrist.y + t.point_margin && index.tip_below_pip(t.point_margin);
    Some(index_down && middle.relaxed(half) && ring.relaxed(half) && pinky.relaxed(half))
}

fn pinky_up(hand: &HandFrame, t: &GestureThresholds) -> Option<bool> {
    let [index, middle, ring, pinky] = fingers(hand)?;
    let half = t.point_margin / 2.0;
    Some(
        pinky.tip_above_pip(t.point_margin)
            && index.relaxed(half)
            && middle.relaxed(half)
            && ring.relaxed(half),
    )
}

fn thumb_sideways(hand: &HandFrame, t: &GestureThresholds, side: Side) -> Option<bool> {
    let tip = hand.point(HandLandmark::ThumbTip)?;
    let ip = hand.point(HandLandmark::ThumbIp)?;
    let mcp = hand.point(HandLandmark::ThumbMcp)?;
    let m = t.point_margin;
    let displaced = match side {
        Side::Left => tip.x < ip.x - m && tip.x < mcp.x - m,
        Side::Right => tip.x > ip.x + m && tip.x > mcp.x + m,
    };
    let others_folded = fingers(hand)?.iter().all(|f| f.tip.y > f.mcp.y);
    Some(displaced && others_folded)
}

// ── Pose predicates ────────────────────────────────────────

fn lean(pose: &PoseFrame, t: &GestureThresholds, side: Side) -> Option<bool> {
    let left = pose.point(PoseLandmark::LeftShoulder)?;
    let right = pose.point(PoseLandmark::RightShoulder)?;
    let offset = match side {
        Side::Left => right.x - left.x,
        Side::Right => left.x - right.x,
    };
    Some(offset > t.lean_threshold)
}

fn arm_raised(pose: &PoseFrame) -> Option<bool> {
    let nose = pose.point(PoseLandmark::Nose)?;
    let mut wrists = [PoseLandmark::LeftWrist, PoseLandmark::RightWrist]
        .into_iter()
        .filter_map(|w| pose.point(w))
        .peekable();
    wrists.peek()?;
    Some(wrists.any(|w| w.y < nose.y))
}

fn hands_near_knees(pose: &PoseFrame, t: &GestureThresholds) -> Option<bool> {
    let lw = pose.point(PoseLandmark::LeftWrist)?;
    let rw = pose.point(PoseLandmark::RightWrist)?;
    let lk = pose.point(PoseLandmark::LeftKnee)?;
    let rk = pose.point(PoseLandmark::RightKnee)?;
    Some((lw.y - lk.y).abs() < t.knee_proximity && (rw.y - rk.y).abs() < t.knee_proximity)
}

/// Wrists together, somewhere between the nose and the knees.  When the
/// knees are out of frame the lower bound is the image bottom.
fn palms_touching(pose: &PoseFrame, t: &GestureThresholds) -> Option<bool> {
    let lw = pose.point(PoseLandmark::LeftWrist)?;
    let rw = pose.point(PoseLandmark::RightWrist)?;
    let nose = pose.point(PoseLandmark::Nose)?;
    let knees: Vec<f32> = [PoseLandmark::LeftKnee, PoseLandmark::RightKnee]
        .into_iter()
        .filter_map(|k| pose.point(k))
        .map(|k| k.y)
        .collect();
    let floor = if knees.is_empty() {
        1.0
    } else {
        knees.iter().sum::<f32>() / knees.len() as f32
    };

    let together =
        (lw.x - rw.x).abs() < t.palms_proximity && (lw.y - rw.y).abs() < t.palms_proximity;
    let mid_y = (lw.y + rw.y) / 2.0;
    Some(together && mid_y > nose.y && mid_y < floor)
}

// ── Test helpers ───────────────────────────────────────────

/// Per-finger pose used to build synthetic hands in tests.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FingerPose {
    Extended,
    Folded,
    PointingDown,
}

/// Thumb placement used to build synthetic hands in tests.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ThumbPose {
    Tucked,
    Left,
    Right,
}

/// Build an upright hand, wrist at the bottom, with the given finger poses
/// in index/middle/ring/pinky order.
#[cfg(test)]
pub(crate) fn make_hand(fingers: [FingerPose; 4], thumb: ThumbPose) -> HandFrame {
    use crate::landmarks::HAND_LANDMARK_COUNT;

    let mut points = vec![Landmark::default(); HAND_LANDMARK_COUNT];
    points[HandLandmark::Wrist.index()] = Landmark::new(0.5, 0.8);

    let (cmc, mcp, ip, tip) = match thumb {
        ThumbPose::Tucked => ((0.45, 0.75), (0.40, 0.70), (0.37, 0.67), (0.35, 0.64)),
        ThumbPose::Left => ((0.45, 0.75), (0.40, 0.70), (0.33, 0.70), (0.25, 0.70)),
        ThumbPose::Right => ((0.45, 0.75), (0.40, 0.70), (0.47, 0.70), (0.55, 0.70)),
    };
    points[HandLandmark::ThumbCmc.index()] = Landmark::new(cmc.0, cmc.1);
    points[HandLandmark::ThumbMcp.index()] = Landmark::new(mcp.0, mcp.1);
    points[HandLandmark::ThumbIp.index()] = Landmark::new(ip.0, ip.1);
    points[HandLandmark::ThumbTip.index()] = Landmark::new(tip.0, tip.1);

    for (i, (finger, pose)) in Finger::ALL.iter().zip(fingers).enumerate() {
        let x = 0.45 + 0.05 * i as f32;
        // (pip, dip, tip) heights; MCP sits at 0.6 for every finger.
        let (pip, dip, tip) = match pose {
            FingerPose::Extended => (0.50, 0.45, 0.40),
            FingerPose::Folded => (0.55, 0.62, 0.65),
            FingerPose::PointingDown => (0.70, 0.80, 0.90),
        };
        let mcp_idx = finger.mcp().index();
        points[mcp_idx] = Landmark::new(x, 0.6);
        points[mcp_idx + 1] = Landmark::new(x, pip);
        points[mcp_idx + 2] = Landmark::new(x, dip);
        points[mcp_idx + 3] = Landmark::new(x, tip);
    }
    HandFrame::new(points)
}

#[cfg(test)]
pub(crate) fn hand_frame(fingers: [FingerPose; 4]) -> KeypointFrame {
    KeypointFrame::Hand(make_hand(fingers, ThumbPose::Tucked))
}

/// A standing subject: shoulders level, arms down, hands apart.
#[cfg(test)]
pub(crate) fn make_pose() -> PoseFrame {
    PoseFrame::new()
        .with(PoseLandmark::Nose, 0.50, 0.20)
        .with(PoseLandmark::LeftShoulder, 0.45, 0.35)
        .with(PoseLandmark::RightShoulder, 0.55, 0.35)
        .with(PoseLandmark::LeftElbow, 0.42, 0.50)
        .with(PoseLandmark::RightElbow, 0.58, 0.50)
        .with(PoseLandmark::LeftWrist, 0.40, 0.62)
        .with(PoseLandmark::RightWrist, 0.60, 0.62)
        .with(PoseLandmark::LeftKnee, 0.45, 0.85)
        .with(PoseLandmark::RightKnee, 0.55, 0.85)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::FingerPose::{Extended as E, Folded as F, PointingDown as D};

    fn detected(frame: &KeypointFrame) -> Vec<GestureKind> {
        GestureClassifier::default().present(frame)
    }

    #[test]
    fn test_no_finger_extended_is_fist_not_open() {
        let frame = hand_frame([F, F, F, F]);
        assert!(classify(&frame, GestureKind::Fist));
        assert!(!classify(&frame, GestureKind::OpenHand));
    }

    #[test]
    fn test_open_hand() {
        let frame = hand_frame([E, E, E, E]);
        assert_eq!(detected(&frame), vec![GestureKind::OpenHand]);
    }

    #[test]
    fn test_open_hand_tolerates_one_folded_finger() {
        let frame = hand_frame([E, E, E, F]);
        assert!(classify(&frame, GestureKind::OpenHand));
        let frame = hand_frame([E, E, F, F]);
        assert!(!classify(&frame, GestureKind::OpenHand));
    }

    #[test]
    fn test_open_hand_requires_both_margins() {
        // Tips clear the PIP but stay level with the MCP.
        let mut hand = make_hand([E, E, E, E], ThumbPose::Tucked);
        for finger in Finger::ALL {
            hand.points[finger.pip().index()].y = 0.63;
            hand.points[finger.tip().index()].y = 0.58;
        }
        assert!(!classify(&KeypointFrame::Hand(hand), GestureKind::OpenHand));
    }

    #[test]
    fn test_fist_rejects_extended_finger() {
        let mut hand = make_hand([F, F, F, F], ThumbPose::Tucked);
        // Index tip far above its PIP but MCP moved up so the fold test passes.
        hand.points[HandLandmark::IndexMcp.index()].y = 0.10;
        hand.points[HandLandmark::IndexPip.index()].y = 0.55;
        hand.points[HandLandmark::IndexTip.index()].y = 0.45;
        assert!(!classify(&KeypointFrame::Hand(hand), GestureKind::Fist));
    }

    #[test]
    fn test_peace_sign() {
        let frame = hand_frame([E, E, F, F]);
        assert_eq!(detected(&frame), vec![GestureKind::PeaceSign]);
    }

    #[test]
    fn test_rock_sign() {
        let frame = hand_frame([E, F, F, E]);
        assert_eq!(detected(&frame), vec![GestureKind::RockSign]);
    }

    #[test]
    fn test_point_up() {
        let frame = hand_frame([E, F, F, F]);
        assert_eq!(detected(&frame), vec![GestureKind::PointUp]);
    }

    #[test]
    fn test_point_down() {
        let frame = hand_frame([D, F, F, F]);
        assert!(classify(&frame, GestureKind::PointDown));
        assert!(!classify(&frame, GestureKind::PointUp));
    }

    #[test]
    fn test_pinky_up() {
        let frame = hand_frame([F, F, F, E]);
        assert_eq!(detected(&frame), vec![GestureKind::PinkyUp]);
    }

    #[test]
    fn test_thumb_left_and_right() {
        let left = KeypointFrame::Hand(make_hand([F, F, F, F], ThumbPose::Left));
        assert!(classify(&left, GestureKind::ThumbLeft));
        assert!(!classify(&left, GestureKind::ThumbRight));

        let right = KeypointFrame::Hand(make_hand([F, F, F, F], ThumbPose::Right));
        assert!(classify(&right, GestureKind::ThumbRight));
        assert!(!classify(&right, GestureKind::ThumbLeft));
    }

    #[test]
    fn test_thumb_requires_folded_fingers() {
        let frame = KeypointFrame::Hand(make_hand([E, E, E, E], ThumbPose::Right));
        assert!(!classify(&frame, GestureKind::ThumbRight));
    }

    #[test]
    fn test_missing_landmarks_classify_false() {
        let empty = KeypointFrame::Hand(HandFrame::default());
        assert!(detected(&empty).is_empty());

        let mut hand = make_hand([F, F, F, F], ThumbPose::Tucked);
        hand.points.truncate(19);
        assert!(!classify(&KeypointFrame::Hand(hand), GestureKind::Fist));
    }

    #[test]
    fn test_nan_landmark_classifies_false() {
        let mut hand = make_hand([E, E, E, E], ThumbPose::Tucked);
        hand.points[HandLandmark::RingTip.index()] = Landmark::new(0.5, f32::NAN);
        assert!(!classify(&KeypointFrame::Hand(hand), GestureKind::OpenHand));
    }

    #[test]
    fn test_hand_gesture_never_in_pose_frame() {
        let frame = KeypointFrame::Pose(make_pose());
        assert!(!classify(&frame, GestureKind::Fist));
        let hand = hand_frame([F, F, F, F]);
        assert!(!classify(&hand, GestureKind::LeanLeft));
    }

    #[test]
    fn test_standing_pose_has_no_gesture() {
        let frame = KeypointFrame::Pose(make_pose());
        assert!(detected(&frame).is_empty());
    }

    #[test]
    fn test_lean_left_and_right() {
        let pose = make_pose()
            .with(PoseLandmark::LeftShoulder, 0.35, 0.35)
            .with(PoseLandmark::RightShoulder, 0.55, 0.35);
        let frame = KeypointFrame::Pose(pose);
        assert!(classify(&frame, GestureKind::LeanLeft));
        assert!(!classify(&frame, GestureKind::LeanRight));

        let pose = make_pose()
            .with(PoseLandmark::LeftShoulder, 0.62, 0.35)
            .with(PoseLandmark::RightShoulder, 0.42, 0.35);
        let frame = KeypointFrame::Pose(pose);
        assert!(classify(&frame, GestureKind::LeanRight));
        assert!(!classify(&frame, GestureKind::LeanLeft));
    }

    #[test]
    fn test_arm_raised() {
        let frame = KeypointFrame::Pose(make_pose().with(PoseLandmark::RightWrist, 0.65, 0.10));
        assert!(classify(&frame, GestureKind::ArmRaised));
    }

    #[test]
    fn test_arm_raised_needs_a_wrist() {
        let pose = PoseFrame::new().with(PoseLandmark::Nose, 0.5, 0.2);
        assert!(!classify(&KeypointFrame::Pose(pose), GestureKind::ArmRaised));
    }

    #[test]
    fn test_hands_near_knees() {
        let pose = make_pose()
            .with(PoseLandmark::LeftWrist, 0.40, 0.80)
            .with(PoseLandmark::RightWrist, 0.60, 0.88);
        assert!(classify(&KeypointFrame::Pose(pose), GestureKind::HandsNearKnees));
    }

    #[test]
    fn test_palms_touching() {
        let pose = make_pose()
            .with(PoseLandmark::LeftWrist, 0.49, 0.45)
            .with(PoseLandmark::RightWrist, 0.52, 0.46);
        assert!(classify(&KeypointFrame::Pose(pose), GestureKind::PalmsTouching));
    }

    #[test]
    fn test_palms_touching_above_head_rejected() {
        let pose = make_pose()
            .with(PoseLandmark::LeftWrist, 0.49, 0.05)
            .with(PoseLandmark::RightWrist, 0.52, 0.06);
        assert!(!classify(&KeypointFrame::Pose(pose), GestureKind::PalmsTouching));
    }

    #[test]
    fn test_gesture_kind_roundtrip() {
        for kind in GestureKind::ALL {
            assert_eq!(GestureKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(GestureKind::from_str("pinch"), None);
        assert!(GestureKind::LeanLeft.is_pose());
        assert!(!GestureKind::RockSign.is_pose());
    }

    #[test]
    fn test_config_sexp() {
        let sexp = GestureThresholds::default().config_sexp();
        assert!(sexp.contains(":extend-margin 0.020"));
        assert!(sexp.contains(":point-margin 0.025"));
        assert!(sexp.contains(":lean-threshold 0.160"));
    }
}
