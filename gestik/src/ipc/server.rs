//! Line-oriented frame server: reads frames, drives a session, writes events.

use std::io::{BufRead, Write};
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info, warn};

use super::dispatch::{self, InputMessage};
use crate::keys::{KeyInjector, VirtualKey};
use crate::session::{FrameOutcome, Session, SessionConfig};

// ── Injector ───────────────────────────────────────────────

/// Key injector that queues key events for the output stream.
#[derive(Debug, Default)]
pub struct EventInjector {
    pending: Vec<(VirtualKey, bool)>,
}

impl EventInjector {
    pub fn drain(&mut self) -> Vec<(VirtualKey, bool)> {
        std::mem::take(&mut self.pending)
    }
}

impl KeyInjector for EventInjector {
    fn press(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        self.pending.push((key, true));
        Ok(())
    }

    fn release(&mut self, key: VirtualKey) -> anyhow::Result<()> {
        self.pending.push((key, false));
        Ok(())
    }
}

// ── Server ─────────────────────────────────────────────────

pub struct FrameServer<W: Write> {
    session: Session<EventInjector>,
    out: W,
    /// Clock for frames that arrive without `:t`.
    started: Instant,
    /// Timestamp of the last processed frame, in the producer's clock.
    last_frame_s: Option<f64>,
    /// Log every emitted event.
    pub trace_events: bool,
    /// Lines that failed to parse.
    pub errors: u64,
}

impl<W: Write> FrameServer<W> {
    pub fn new(config: SessionConfig, out: W, trace_events: bool) -> Self {
        Self {
            session: Session::new(config, EventInjector::default()),
            out,
            started: Instant::now(),
            last_frame_s: None,
            trace_events,
            errors: 0,
        }
    }

    pub fn session(&self) -> &Session<EventInjector> {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Process lines until input ends or the session closes.  Held keys
    /// are released before returning.
    pub fn run<R: BufRead>(&mut self, input: R) -> anyhow::Result<()> {
        info!("Frame server started");
        for line in input.lines() {
            let line = line.context("reading frame stream")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.handle_line(line)?;
            if self.session.is_closed() {
                info!("Session closed, stopping frame server");
                break;
            }
        }
        self.session.shutdown();
        self.flush_keys()?;
        info!("Session stats: {}", self.session.stats.status_sexp());
        Ok(())
    }

    /// Handle one input line.  Parse failures become error events; only
    /// output failures are returned.
    pub fn handle_line(&mut self, raw: &str) -> anyhow::Result<()> {
        match dispatch::parse_message(raw) {
            Ok(InputMessage::Frame { frame, timestamp_s }) => {
                let now_s =
                    timestamp_s.unwrap_or_else(|| self.started.elapsed().as_secs_f64());
                self.last_frame_s = Some(now_s);
                let outcome = self.session.process_frame(frame.as_ref(), now_s);
                self.emit_outcome(&outcome)?;
            }
            Ok(InputMessage::Status) => {
                // Hold timings are relative to frame timestamps.
                let now_s = self
                    .last_frame_s
                    .unwrap_or_else(|| self.started.elapsed().as_secs_f64());
                let status = dispatch::status_response(&self.session.status_sexp(now_s));
                self.emit(&status)?;
            }
            Err(e) => {
                self.errors += 1;
                warn!("Malformed frame: {:#}", e);
                self.emit(&dispatch::error_event(&format!("{:#}", e)))?;
            }
        }
        self.out.flush().context("flushing event stream")
    }

    fn emit_outcome(&mut self, outcome: &FrameOutcome) -> anyhow::Result<()> {
        if let Some(announcement) = &outcome.announcement {
            self.emit(&dispatch::gesture_event(announcement))?;
        }
        for (state, action) in &outcome.emitted {
            self.emit(&dispatch::action_event(*action, *state))?;
        }
        if let Some(next) = outcome.transition {
            self.emit(&dispatch::state_event(next))?;
        }
        self.flush_keys()
    }

    fn flush_keys(&mut self) -> anyhow::Result<()> {
        for (key, pressed) in self.session.injector_mut().drain() {
            self.emit(&dispatch::key_event(key, pressed))?;
        }
        Ok(())
    }

    fn emit(&mut self, line: &str) -> anyhow::Result<()> {
        if self.trace_events {
            info!("event: {}", line);
        } else {
            debug!("event: {}", line);
        }
        writeln!(self.out, "{}", line).context("writing event")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::FingerPose::{Extended as E, Folded as F};
    use crate::gesture::{make_hand, ThumbPose};
    use crate::ipc::dispatch::hand_line;
    use crate::machine::AppState;

    fn server() -> FrameServer<Vec<u8>> {
        FrameServer::new(SessionConfig::default(), Vec::new(), false)
    }

    fn output(server: FrameServer<Vec<u8>>) -> String {
        String::from_utf8(server.into_output()).unwrap()
    }

    #[test]
    fn test_select_emits_action_and_state() {
        let mut s = server();
        let open = make_hand([E, E, E, E], ThumbPose::Tucked);
        s.handle_line(&hand_line(0.0, &open)).unwrap();
        assert_eq!(s.session().state(), AppState::DinoGame);
        let out = output(s);
        assert!(out.contains("(:type :event :event :gesture :label \"open-hand\" :context \"seleccionar\")"));
        assert!(out.contains("(:type :event :event :action :action :select :state :main-menu)"));
        assert!(out.contains("(:type :event :event :state :state :dino-game)"));
    }

    #[test]
    fn test_rock_stream_stops_at_close() {
        let rock = make_hand([E, F, F, E], ThumbPose::Tucked);
        let mut input = String::new();
        for i in 0..20 {
            input.push_str(&hand_line(i as f64 * 0.2, &rock));
            input.push('\n');
        }
        let mut s = server();
        s.run(input.as_bytes()).unwrap();
        assert!(s.session().is_closed());
        // Confirmed at 2.0s on the 11th frame; the rest is never read.
        assert_eq!(s.session().stats.frames, 11);
        let out = output(s);
        assert_eq!(out.matches(":action :quit :state :main-menu").count(), 1);
        assert!(out.contains(":state :closed"));
    }

    #[test]
    fn test_malformed_line_reports_and_continues() {
        let mut s = server();
        let input = "(:type :hand\n\n(:type :none :t 0.5)\n";
        s.run(input.as_bytes()).unwrap();
        assert_eq!(s.errors, 1);
        assert_eq!(s.session().stats.frames, 1);
        let out = output(s);
        assert!(out.contains(":event :error :reason \"malformed s-expression"));
    }

    #[test]
    fn test_key_events_and_release_at_eof() {
        let mut s = server();
        let open = make_hand([E, E, E, E], ThumbPose::Tucked);
        let fist = make_hand([F, F, F, F], ThumbPose::Tucked);
        // Select the dino game, let the announcement settle, then jump.
        let input = format!(
            "{}\n{}\n{}\n",
            hand_line(0.0, &open),
            hand_line(0.1, &fist),
            hand_line(0.5, &open),
        );
        s.run(input.as_bytes()).unwrap();
        let out = output(s);
        assert!(out.contains(":action :jump :state :dino-game"));
        assert!(out.contains("(:type :event :event :key :key :space :pressed t)"));
        // Space is still held at EOF and released by shutdown.
        assert!(out.contains("(:type :event :event :key :key :space :pressed nil)"));
    }

    #[test]
    fn test_status_request() {
        let mut s = server();
        s.handle_line("(:type :status)").unwrap();
        let out = output(s);
        assert!(out.starts_with("(:type :response :status (:machine (:state :main-menu"));
    }

    #[test]
    fn test_status_uses_frame_clock() {
        let mut s = server();
        let rock = make_hand([E, F, F, E], ThumbPose::Tucked);
        s.handle_line(&hand_line(1000.0, &rock)).unwrap();
        s.handle_line(&hand_line(1001.0, &rock)).unwrap();
        s.handle_line("(:type :status)").unwrap();
        let out = output(s);
        assert!(
            out.contains(":gesture :rock-sign :phase :holding :elapsed-s 1.00"),
            "status {}",
            out
        );
    }

    #[test]
    fn test_event_injector_drain() {
        let mut inj = EventInjector::default();
        inj.press(VirtualKey::Z).unwrap();
        inj.release(VirtualKey::Z).unwrap();
        assert_eq!(inj.drain(), vec![(VirtualKey::Z, true), (VirtualKey::Z, false)]);
        assert!(inj.drain().is_empty());
    }
}
