//! Pure playback scheduling: cursor advancement, loop policy, loop-bound
//! resolution and frame timing.  No I/O and no shared state, so every rule
//! here is testable without a decode thread.

use serde::{Deserialize, Serialize};

// ── Enums ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlaybackState {
    None     = 0,
    Playing  = 1,
    Paused   = 2,
    Stopped  = 3,
}

impl PlaybackState {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Paused,
            3 => PlaybackState::Stopped,
            _ => PlaybackState::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LoopMode {
    /// Play once, then stop.
    None       = 0,
    /// Jump back to the opposite bound.
    Loop       = 1,
    /// Bounce back and forth between the bounds.
    Palindrome = 2,
}

impl LoopMode {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LoopMode::None,
            2 => LoopMode::Palindrome,
            _ => LoopMode::Loop,
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "once"  => Some(LoopMode::None),
            "loop" | "normal" => Some(LoopMode::Loop),
            "palindrome"     => Some(LoopMode::Palindrome),
            _                => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Forward = 0,
    Reverse = 1,
}

impl Direction {
    pub fn from_u8(v: u8) -> Self {
        if v == 1 { Direction::Reverse } else { Direction::Forward }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

// ── Cursor advancement ──────────────────────────────────────────────────────

/// Result of moving the cursor by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Frame to decode next (or the reset cursor when `finished`).
    pub frame:     i64,
    pub direction: Direction,
    /// A loop bound was crossed.
    pub looped:    bool,
    /// `LoopMode::None` ran off the end; the stream must stop without
    /// decoding.
    pub finished:  bool,
}

/// Move `cursor` one frame in `direction` and apply the loop policy when it
/// leaves `[loop_in, loop_out]`.
pub fn advance(cursor: i64, direction: Direction, loop_in: i64, loop_out: i64, mode: LoopMode) -> Step {
    let (next, overflow) = match direction {
        Direction::Forward => (cursor + 1, cursor + 1 > loop_out),
        Direction::Reverse => (cursor - 1, cursor - 1 < loop_in),
    };
    if !overflow {
        return Step { frame: next, direction, looped: false, finished: false };
    }
    match mode {
        LoopMode::None => Step { frame: loop_in, direction, looped: true, finished: true },
        LoopMode::Loop => {
            let frame = match direction {
                Direction::Forward => loop_in,
                Direction::Reverse => loop_out,
            };
            Step { frame, direction, looped: true, finished: false }
        }
        LoopMode::Palindrome => {
            let frame = match direction {
                Direction::Forward => loop_out,
                Direction::Reverse => loop_in,
            };
            Step { frame, direction: direction.flipped(), looped: true, finished: false }
        }
    }
}

// ── Loop bounds ─────────────────────────────────────────────────────────────

/// Distance a conflicting bound is pushed away: `fraction` of the frame
/// range, at least one frame.
pub fn loop_margin(frame_count: u64, fraction: f64) -> i64 {
    let range = frame_count.saturating_sub(1) as f64;
    ((range * fraction).floor() as i64).max(1)
}

/// New `(loop_in, loop_out)` after requesting `loop_in = requested`.
/// `requested` must already be inside `[0, frame_count)`.
pub fn resolve_loop_in(requested: i64, loop_out: i64, frame_count: u64, fraction: f64) -> (i64, i64) {
    let last = frame_count as i64 - 1;
    if last <= 0 {
        return (0, 0);
    }
    if requested < loop_out {
        return (requested, loop_out);
    }
    let margin = loop_margin(frame_count, fraction);
    let out = requested + margin;
    if out > last {
        ((last - margin).max(0), last)
    } else {
        (requested, out)
    }
}

/// New `(loop_in, loop_out)` after requesting `loop_out = requested`.
pub fn resolve_loop_out(requested: i64, loop_in: i64, frame_count: u64, fraction: f64) -> (i64, i64) {
    let last = frame_count as i64 - 1;
    if last <= 0 {
        return (0, 0);
    }
    if requested > loop_in {
        return (loop_in, requested);
    }
    let margin = loop_margin(frame_count, fraction);
    let lin = requested - margin;
    if lin < 0 {
        (0, margin.min(last))
    } else {
        (lin, requested)
    }
}

// ── Seeking ─────────────────────────────────────────────────────────────────

fn nearly_equal(x: f64, y: f64) -> bool {
    (x - y).abs() <= 1e-5 * x.abs().max(y.abs()).max(1.0)
}

/// Map a normalized position onto a frame index of a `frame_count` file.
/// The caller has already checked `0.0 <= pos <= 1.0`.
pub fn position_to_frame(pos: f64, frame_count: u64) -> i64 {
    let last = frame_count.saturating_sub(1) as i64;
    if nearly_equal(pos, 0.0) {
        0
    } else if nearly_equal(pos, 1.0) {
        last
    } else {
        ((last as f64) * pos).floor() as i64
    }
}

pub fn clamp_frame(frame: i64, loop_in: i64, loop_out: i64) -> i64 {
    frame.max(loop_in).min(loop_out)
}

// ── Timing ──────────────────────────────────────────────────────────────────

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nominal frame duration for `fps` (> 0).
pub fn frame_duration_ns(fps: u32) -> u64 {
    NANOS_PER_SEC / fps as u64
}

/// Nominal duration scaled by `1 / |speed|`.
pub fn effective_duration_ns(nominal_ns: u64, speed: f64) -> u64 {
    (nominal_ns as f64 / speed.abs()) as u64
}
