//! Keypoint frame data: normalized hand and body pose landmarks.
//!
//! Models the 21-point hand topology (wrist plus MCP/PIP/DIP/tip per
//! finger) and the subset of the body pose skeleton used by the
//! pose-controlled game.  Coordinates are normalized to 0..1 with the
//! origin at the top-left and y increasing downward.  Frames come from
//! an upstream landmark model and are consumed once per camera frame.

// ── Hand landmarks ─────────────────────────────────────────

/// The 21 hand landmarks, in upstream model index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// The four non-thumb fingers, used by fold/extension tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All non-thumb fingers, index first.
    pub const ALL: [Finger; 4] = [Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    pub fn mcp(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexMcp,
            Self::Middle => HandLandmark::MiddleMcp,
            Self::Ring => HandLandmark::RingMcp,
            Self::Pinky => HandLandmark::PinkyMcp,
        }
    }

    pub fn pip(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexPip,
            Self::Middle => HandLandmark::MiddlePip,
            Self::Ring => HandLandmark::RingPip,
            Self::Pinky => HandLandmark::PinkyPip,
        }
    }

    pub fn tip(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexTip,
            Self::Middle => HandLandmark::MiddleTip,
            Self::Ring => HandLandmark::RingTip,
            Self::Pinky => HandLandmark::PinkyTip,
        }
    }
}

// ── Landmark point ─────────────────────────────────────────

/// Lower bound of the accepted coordinate range.  Upstream models report
/// points slightly outside the image when a finger leaves the frame.
pub const COORD_MIN: f32 = -0.5;
/// Upper bound of the accepted coordinate range.
pub const COORD_MAX: f32 = 1.5;

/// A single normalized keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// Horizontal position (0.0 = left edge, 1.0 = right edge).
    pub x: f32,
    /// Vertical position (0.0 = top edge, 1.0 = bottom edge).
    pub y: f32,
    /// Relative depth; unused by the 2D predicates.
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Whether the point is finite and inside the accepted range.
    pub fn is_plausible(&self) -> bool {
        let in_range = |v: f32| v.is_finite() && (COORD_MIN..=COORD_MAX).contains(&v);
        in_range(self.x) && in_range(self.y) && self.z.is_finite()
    }
}

// ── Hand frame ─────────────────────────────────────────────

/// One frame of hand landmarks, indexed by `HandLandmark`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandFrame {
    pub points: Vec<Landmark>,
}

impl HandFrame {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Look up a landmark.  Missing or implausible points yield `None`.
    pub fn point(&self, landmark: HandLandmark) -> Option<Landmark> {
        self.points
            .get(landmark.index())
            .copied()
            .filter(Landmark::is_plausible)
    }

    /// Whether all 21 landmarks are present.
    pub fn is_complete(&self) -> bool {
        self.points.len() == HAND_LANDMARK_COUNT
    }
}

// ── Pose landmarks ─────────────────────────────────────────

/// Body pose landmarks consumed by the pose predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftKnee,
    RightKnee,
}

/// Number of pose landmarks tracked.
pub const POSE_LANDMARK_COUNT: usize = 9;

impl PoseLandmark {
    pub const ALL: [PoseLandmark; POSE_LANDMARK_COUNT] = [
        Self::Nose,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftKnee,
        Self::RightKnee,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Index of this landmark in the upstream 33-point pose model.
    pub fn model_index(&self) -> usize {
        match self {
            Self::Nose => 0,
            Self::LeftShoulder => 11,
            Self::RightShoulder => 12,
            Self::LeftElbow => 13,
            Self::RightElbow => 14,
            Self::LeftWrist => 15,
            Self::RightWrist => 16,
            Self::LeftKnee => 25,
            Self::RightKnee => 26,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftShoulder => "left-shoulder",
            Self::RightShoulder => "right-shoulder",
            Self::LeftElbow => "left-elbow",
            Self::RightElbow => "right-elbow",
            Self::LeftWrist => "left-wrist",
            Self::RightWrist => "right-wrist",
            Self::LeftKnee => "left-knee",
            Self::RightKnee => "right-knee",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|lm| lm.as_str() == s)
    }
}

/// One frame of body pose landmarks.  Any landmark may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseFrame {
    points: [Option<Landmark>; POSE_LANDMARK_COUNT],
}

impl PoseFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the full 33-point upstream pose output.
    pub fn from_model_output(points: &[Landmark]) -> Self {
        let mut frame = Self::new();
        for lm in PoseLandmark::ALL {
            if let Some(p) = points.get(lm.model_index()) {
                frame.set(lm, *p);
            }
        }
        frame
    }

    pub fn set(&mut self, landmark: PoseLandmark, point: Landmark) {
        self.points[landmark.index()] = Some(point);
    }

    /// Builder-style setter.
    pub fn with(mut self, landmark: PoseLandmark, x: f32, y: f32) -> Self {
        self.set(landmark, Landmark::new(x, y));
        self
    }

    /// Look up a landmark.  Missing or implausible points yield `None`.
    pub fn point(&self, landmark: PoseLandmark) -> Option<Landmark> {
        self.points[landmark.index()].filter(Landmark::is_plausible)
    }
}

// ── Frame ──────────────────────────────────────────────────

/// An immutable per-frame snapshot: either a hand or a body pose.
#[derive(Debug, Clone, PartialEq)]
pub enum KeypointFrame {
    Hand(HandFrame),
    Pose(PoseFrame),
}

impl KeypointFrame {
    pub fn as_hand(&self) -> Option<&HandFrame> {
        match self {
            Self::Hand(h) => Some(h),
            Self::Pose(_) => None,
        }
    }

    pub fn as_pose(&self) -> Option<&PoseFrame> {
        match self {
            Self::Pose(p) => Some(p),
            Self::Hand(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hand(_) => "hand",
            Self::Pose(_) => "pose",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_landmark_indices() {
        assert_eq!(HandLandmark::Wrist.index(), 0);
        assert_eq!(HandLandmark::ThumbTip.index(), 4);
        assert_eq!(HandLandmark::IndexTip.index(), 8);
        assert_eq!(HandLandmark::MiddlePip.index(), 10);
        assert_eq!(HandLandmark::PinkyTip.index(), HAND_LANDMARK_COUNT - 1);
    }

    #[test]
    fn test_finger_joint_hierarchy() {
        for finger in Finger::ALL {
            assert_eq!(finger.pip().index(), finger.mcp().index() + 1);
            assert_eq!(finger.tip().index(), finger.mcp().index() + 3);
        }
    }

    #[test]
    fn test_missing_hand_point_is_none() {
        let frame = HandFrame::new(vec![Landmark::new(0.5, 0.5); 5]);
        assert!(frame.point(HandLandmark::ThumbTip).is_some());
        assert!(frame.point(HandLandmark::IndexMcp).is_none());
        assert!(!frame.is_complete());
    }

    #[test]
    fn test_implausible_point_filtered() {
        let mut points = vec![Landmark::new(0.5, 0.5); HAND_LANDMARK_COUNT];
        points[HandLandmark::IndexTip.index()] = Landmark::new(f32::NAN, 0.2);
        points[HandLandmark::MiddleTip.index()] = Landmark::new(0.5, 3.0);
        let frame = HandFrame::new(points);
        assert!(frame.point(HandLandmark::IndexTip).is_none());
        assert!(frame.point(HandLandmark::MiddleTip).is_none());
        assert!(frame.point(HandLandmark::RingTip).is_some());
    }

    #[test]
    fn test_pose_frame_builder() {
        let pose = PoseFrame::new()
            .with(PoseLandmark::Nose, 0.5, 0.2)
            .with(PoseLandmark::LeftWrist, 0.4, 0.6);
        assert_eq!(pose.point(PoseLandmark::Nose), Some(Landmark::new(0.5, 0.2)));
        assert!(pose.point(PoseLandmark::RightWrist).is_none());
    }

    #[test]
    fn test_pose_from_model_output() {
        let mut points = vec![Landmark::default(); 33];
        points[0] = Landmark::new(0.5, 0.1);
        points[26] = Landmark::new(0.6, 0.9);
        let pose = PoseFrame::from_model_output(&points);
        assert_eq!(pose.point(PoseLandmark::Nose), Some(Landmark::new(0.5, 0.1)));
        assert_eq!(pose.point(PoseLandmark::RightKnee), Some(Landmark::new(0.6, 0.9)));
    }

    #[test]
    fn test_pose_landmark_roundtrip() {
        for lm in PoseLandmark::ALL {
            assert_eq!(PoseLandmark::from_str(lm.as_str()), Some(lm));
        }
        assert_eq!(PoseLandmark::from_str("left-hip"), None);
    }

    #[test]
    fn test_frame_accessors() {
        let hand = KeypointFrame::Hand(HandFrame::default());
        assert!(hand.as_hand().is_some());
        assert!(hand.as_pose().is_none());
        assert_eq!(hand.as_str(), "hand");
        let pose = KeypointFrame::Pose(PoseFrame::new());
        assert_eq!(pose.as_str(), "pose");
    }
}
