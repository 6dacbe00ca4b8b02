//! Session tracking and timestamp rebasing.
//!
//! A session is the span of a log during which samples are considered part of one
//! continuous, validly timed recording. Clock driven sessions go live once both the
//! device clock and the navigation solution are valid, and stop on a clock reset, a
//! clock rewind, or a forward clock jump. Samples of gated channels are discarded
//! while the session is not live.
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::channel::Metadata;
use crate::config::{DecodeConfig, RebaseMode};
use crate::timecode::{stamp, UtcFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Live,
    Stopped,
}

/// Reason a live session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discontinuity {
    /// Clock went from valid to invalid.
    Reset,
    /// Clock went backwards.
    Back,
    /// Clock advanced by more than the jump threshold.
    Jump,
}

impl Discontinuity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Back => "back",
            Self::Jump => "jump",
        }
    }
}

/// A device timestamp paired with the UTC time it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClockFix {
    device_ts: u32,
    time: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SessionTracker {
    mode: RebaseMode,
    jump_threshold: u32,
    /// False for families without a clock; such sessions are live from the start and
    /// emit device timestamps in absolute mode.
    anchored: bool,
    state: SessionState,
    clock_valid: bool,
    solution_valid: bool,
    last_clock_ts: Option<u32>,
    last_valid_clock: Option<ClockFix>,
    reference: Option<ClockFix>,
    origin: Option<u32>,
    discontinuity: Option<Discontinuity>,
}

impl SessionTracker {
    /// Tracker for a clock driven family.
    #[must_use]
    pub fn new(config: &DecodeConfig) -> Self {
        SessionTracker {
            mode: config.rebase,
            jump_threshold: config.jump_threshold,
            anchored: true,
            state: SessionState::NotStarted,
            clock_valid: false,
            solution_valid: false,
            last_clock_ts: None,
            last_valid_clock: None,
            reference: None,
            origin: None,
            discontinuity: None,
        }
    }

    /// Tracker for a family with no clock or solution messages. The session is live
    /// from the first sample.
    #[must_use]
    pub fn free_running(config: &DecodeConfig) -> Self {
        SessionTracker {
            anchored: false,
            state: SessionState::Live,
            ..Self::new(config)
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state == SessionState::Live
    }

    /// First discontinuity seen, if any.
    #[must_use]
    pub fn discontinuity(&self) -> Option<Discontinuity> {
        self.discontinuity
    }

    /// True if a sample of a channel with the given gating should be kept.
    #[must_use]
    pub fn accepts(&self, gated: bool) -> bool {
        !gated || self.is_live()
    }

    /// Record a device timestamp seen in the stream. The first one is the zero point
    /// for relative timestamps.
    pub fn observe(&mut self, device_ts: u32) {
        self.origin.get_or_insert(device_ts);
    }

    /// Feed a clock message.
    pub fn on_clock(
        &mut self,
        device_ts: u32,
        valid: bool,
        fields: &UtcFields,
        meta: &mut Metadata,
    ) {
        self.observe(device_ts);
        let time = fields.datetime();

        if self.is_live() {
            let reason = if !valid {
                Some(Discontinuity::Reset)
            } else {
                match self.last_clock_ts {
                    Some(last) if device_ts < last => Some(Discontinuity::Back),
                    Some(last) if device_ts - last > self.jump_threshold => {
                        Some(Discontinuity::Jump)
                    }
                    _ => None,
                }
            };
            if let Some(reason) = reason {
                let at = time.or(self.last_valid_clock.map(|c| c.time));
                self.stop(reason, device_ts, at, meta);
            }
        }

        self.last_clock_ts = Some(device_ts);
        self.clock_valid = valid && time.is_some();
        if let (true, Some(time)) = (self.clock_valid, time) {
            self.last_valid_clock = Some(ClockFix { device_ts, time });
        }
        if !self.is_live() {
            self.try_start(meta);
        }
    }

    /// Feed a navigation solution message.
    pub fn on_solution(&mut self, device_ts: u32, valid: bool, meta: &mut Metadata) {
        self.observe(device_ts);
        self.solution_valid = valid;
        if !self.is_live() {
            self.try_start(meta);
        }
    }

    fn try_start(&mut self, meta: &mut Metadata) {
        if !(self.anchored && self.clock_valid && self.solution_valid) {
            return;
        }
        let Some(fix) = self.last_valid_clock else {
            return;
        };
        debug!(
            device_ts = fix.device_ts,
            time = %fix.time,
            from = ?self.state,
            "session live"
        );
        self.state = SessionState::Live;
        self.reference = Some(fix);
        meta.set_if_absent("start", stamp(&fix.time));
    }

    fn stop(
        &mut self,
        reason: Discontinuity,
        device_ts: u32,
        at: Option<DateTime<Utc>>,
        meta: &mut Metadata,
    ) {
        info!(device_ts, reason = reason.as_str(), "session stopped");
        self.state = SessionState::Stopped;
        self.solution_valid = false;
        self.discontinuity.get_or_insert(reason);
        meta.set_if_absent("session", reason.as_str());
        if let Some(at) = at {
            meta.set_if_absent("stop", stamp(&at));
        }
    }

    /// Convert a device timestamp to an output timestamp in microseconds, or `None` if
    /// no conversion is possible yet.
    #[must_use]
    pub fn rebase(&self, device_ts: u32) -> Option<i64> {
        match self.mode {
            RebaseMode::Relative => {
                let origin = self.origin.unwrap_or(device_ts);
                Some(i64::from(device_ts) - i64::from(origin))
            }
            RebaseMode::Absolute => match self.reference {
                Some(fix) => Some(
                    fix.time.timestamp_micros() + i64::from(device_ts)
                        - i64::from(fix.device_ts),
                ),
                None if !self.anchored => Some(i64::from(device_ts)),
                None => None,
            },
        }
    }

    /// Write the end of decode session summary. `frames` is the number of frames
    /// accepted during the decode.
    pub fn finish(&self, frames: usize, meta: &mut Metadata) {
        if frames == 0 {
            meta.set_if_absent("session", "error");
        }
        meta.set_if_absent("session", "full");
        if let Some(fix) = self.last_valid_clock {
            meta.set_if_absent("stop", stamp(&fix.time));
        }
    }
}
