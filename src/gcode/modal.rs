//! Modal state in both directions: [`ModalState`] is what the parser carries
//! from line to line, [`EmitTracker`] is what the serializer has already put
//! in effect so redundant feed/spindle words can be omitted.

use super::instruction::MotionMode;

/// Sticky parse state threaded through the parse loop.
///
/// Motion mode, distance mode, feed and spindle persist across lines. The
/// subroutine words (`M`, `P`, `O`, `L`) are line-local and cleared by
/// [`ModalState::reset_line_words`] before every line.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    pub motion: MotionMode,
    /// `G90` when true, `G91` when false.
    pub absolute: bool,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    /// A `G2`/`G3` has appeared somewhere in the program.
    pub contains_arc: bool,
    /// A `G91` has appeared somewhere in the program.
    pub contains_relative: bool,

    // ── Line-local ────────────────────────────────────────────────────────────
    /// Subroutine-relevant M word: 98, 99, 2 or 30.
    pub m_word: Option<u32>,
    pub p_word: Option<u32>,
    pub o_word: Option<u32>,
    pub l_word: Option<u32>,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            motion: MotionMode::None,
            absolute: true,
            feed_rate: 0.0,
            spindle_speed: 0.0,
            contains_arc: false,
            contains_relative: false,
            m_word: None,
            p_word: None,
            o_word: None,
            l_word: None,
        }
    }
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the line-local subroutine words.
    pub fn reset_line_words(&mut self) {
        self.m_word = None;
        self.p_word = None;
        self.o_word = None;
        self.l_word = None;
    }

    /// Returns to power-on state (G90, no motion, zero feed/spindle).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Tolerance for floating-point modal comparisons (feed rate, spindle speed).
/// Suppresses redundant words when values differ only by floating-point rounding error.
const NUMERIC_TOLERANCE: f64 = 1e-6;

/// Updates `slot` with `value` if it differs by more than `NUMERIC_TOLERANCE`; returns `true` when the caller should emit.
fn update_float_modal(slot: &mut Option<f64>, value: f64) -> bool {
    if let Some(last) = *slot {
        if (last - value).abs() < NUMERIC_TOLERANCE {
            return false;
        }
    }
    *slot = Some(value);
    true
}

/// Feed and spindle values the emitted program has put in effect so far.
///
/// `should_emit_*` returns `true` (and updates state) when the new value
/// differs from the cached one, or `false` when the word can be omitted.
/// Lines copied verbatim report their values through [`EmitTracker::observe`].
#[derive(Debug, Default)]
pub struct EmitTracker {
    feed: Option<f64>,
    spindle: Option<f64>,
}

impl EmitTracker {
    /// A tracker for a program start, where the controller runs at zero feed
    /// and spindle speed until told otherwise.
    pub fn at_program_start() -> Self {
        Self {
            feed: Some(0.0),
            spindle: Some(0.0),
        }
    }

    /// Returns `true` and caches `feed` if it differs from the feed rate in effect.
    pub fn should_emit_feed(&mut self, feed: f64) -> bool {
        update_float_modal(&mut self.feed, feed)
    }

    /// Returns `true` and caches `speed` if it differs from the spindle speed in effect.
    pub fn should_emit_spindle(&mut self, speed: f64) -> bool {
        update_float_modal(&mut self.spindle, speed)
    }

    /// Records values put in effect by a line that was not regenerated.
    pub fn observe(&mut self, feed: f64, speed: f64) {
        self.feed = Some(feed);
        self.spindle = Some(speed);
    }
}
