//! Frame-stream message parsing and event formatting.
//!
//! Input is one s-expression plist per line:
//!
//! ```text
//! (:type :hand :t 1.25 :points ((0.5 0.8) (0.45 0.75 0.0) ...))
//! (:type :pose :t 1.25 :nose (0.5 0.2) :left-shoulder (0.45 0.35) ...)
//! (:type :none :t 1.30)
//! (:type :status)
//! ```
//!
//! Output events follow the `(:type :event :event :NAME ...)` shape.

use anyhow::{anyhow, bail, Context};
use lexpr::Value;

use crate::announce::GestureAnnouncement;
use crate::keys::VirtualKey;
use crate::landmarks::{HandFrame, KeypointFrame, Landmark, PoseFrame, PoseLandmark};
use crate::machine::{Action, AppState};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum InputMessage {
    /// One camera frame.  `frame` is `None` when nothing was detected;
    /// `timestamp_s` is `None` when the producer sent no `:t`.
    Frame {
        frame: Option<KeypointFrame>,
        timestamp_s: Option<f64>,
    },
    /// Request for a status report.
    Status,
}

/// Parse one input line.
pub fn parse_message(raw: &str) -> anyhow::Result<InputMessage> {
    let value = lexpr::from_str(raw).context("malformed s-expression")?;
    let timestamp_s = match get_value(&value, "t") {
        Some(t) => Some(number(t).context(":t")?),
        None => None,
    };

    let frame = match get_keyword(&value, "type").as_deref() {
        Some("hand") => Some(KeypointFrame::Hand(parse_hand(&value)?)),
        Some("pose") => Some(KeypointFrame::Pose(parse_pose(&value)?)),
        Some("none") => None,
        Some("status") => return Ok(InputMessage::Status),
        Some(other) => bail!("unknown message type: {}", other),
        None => bail!("missing :type"),
    };
    Ok(InputMessage::Frame { frame, timestamp_s })
}

fn parse_hand(value: &Value) -> anyhow::Result<HandFrame> {
    let points = get_value(value, "points").ok_or_else(|| anyhow!("hand frame without :points"))?;
    let points = list_items(points)
        .into_iter()
        .enumerate()
        .map(|(i, p)| point(p).with_context(|| format!("hand point {}", i)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(HandFrame::new(points))
}

/// Absent pose landmarks stay `None`; present ones must be well-formed.
fn parse_pose(value: &Value) -> anyhow::Result<PoseFrame> {
    let mut pose = PoseFrame::new();
    for landmark in PoseLandmark::ALL {
        if let Some(v) = get_value(value, landmark.as_str()) {
            let p = point(v).with_context(|| format!(":{}", landmark.as_str()))?;
            pose.set(landmark, p);
        }
    }
    Ok(pose)
}

/// `(x y)` or `(x y z)`.
fn point(value: &Value) -> anyhow::Result<Landmark> {
    let coords = list_items(value)
        .into_iter()
        .map(number)
        .collect::<anyhow::Result<Vec<f64>>>()?;
    match coords.as_slice() {
        [x, y] => Ok(Landmark::new(*x as f32, *y as f32)),
        [x, y, z] => Ok(Landmark::with_depth(*x as f32, *y as f32, *z as f32)),
        _ => bail!("expected (x y) or (x y z), got {} values", coords.len()),
    }
}

fn number(value: &Value) -> anyhow::Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| anyhow!("number out of range: {}", n)),
        other => bail!("expected a number, got {}", other),
    }
}

// ── Events ─────────────────────────────────────────────────

pub fn action_event(action: Action, state: AppState) -> String {
    format_event(
        "action",
        &[
            ("action", &format!(":{}", action.as_str())),
            ("state", &format!(":{}", state.as_str())),
        ],
    )
}

pub fn key_event(key: VirtualKey, pressed: bool) -> String {
    format_event(
        "key",
        &[
            ("key", &format!(":{}", key.as_str())),
            ("pressed", if pressed { "t" } else { "nil" }),
        ],
    )
}

pub fn gesture_event(announcement: &GestureAnnouncement) -> String {
    format_event(
        "gesture",
        &[
            ("label", &quote(&announcement.label)),
            ("context", &quote(&announcement.context_action)),
        ],
    )
}

pub fn state_event(state: AppState) -> String {
    format_event("state", &[("state", &format!(":{}", state.as_str()))])
}

pub fn error_event(reason: &str) -> String {
    format_event("error", &[("reason", &quote(reason))])
}

pub fn status_response(status: &str) -> String {
    format!("(:type :response :status {})", status)
}

// ── Helpers ────────────────────────────────────────────────

fn quote(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Escape a string for s-expression output.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Find the value following `:key` in a plist.
/// Handles both `Value::Keyword("key")` and `Value::Symbol(":key")` forms.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a keyword or string value from a plist, without the leading colon.
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    match get_value(value, key)? {
        Value::Keyword(v) => Some(v.to_string()),
        Value::Symbol(v) => {
            let s = v.to_string();
            Some(s.strip_prefix(':').unwrap_or(&s).to_string())
        }
        Value::String(v) => Some(v.to_string()),
        other => Some(other.to_string()),
    }
}

/// Elements of a proper list.
fn list_items(value: &Value) -> Vec<&Value> {
    let mut items = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        items.push(pair.car());
        current = pair.cdr();
    }
    items
}

/// Format an event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

/// Render a hand frame as an input line.
#[cfg(test)]
pub(crate) fn hand_line(t: f64, hand: &HandFrame) -> String {
    let points: Vec<String> = hand
        .points
        .iter()
        .map(|p| format!("({} {})", p.x, p.y))
        .collect();
    format!("(:type :hand :t {} :points ({}))", t, points.join(" "))
}
