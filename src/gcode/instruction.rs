//! The parsed form of one program line.

use serde::Serialize;

use super::arcs::ArcGeometry;
use crate::models::Point3;

/// Sticky motion command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionMode {
    /// No motion command seen yet.
    #[default]
    None,
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
}

impl MotionMode {
    /// Maps G0..G3 to a motion mode.
    pub fn from_g(code: u32) -> Option<Self> {
        match code {
            0 => Some(MotionMode::Rapid),
            1 => Some(MotionMode::Linear),
            2 => Some(MotionMode::ArcCw),
            3 => Some(MotionMode::ArcCcw),
            _ => None,
        }
    }

    /// The G number that selects this mode.
    pub fn g_code(self) -> Option<u32> {
        match self {
            MotionMode::None => None,
            MotionMode::Rapid => Some(0),
            MotionMode::Linear => Some(1),
            MotionMode::ArcCw => Some(2),
            MotionMode::ArcCcw => Some(3),
        }
    }

    pub fn is_arc(self) -> bool {
        matches!(self, MotionMode::ArcCw | MotionMode::ArcCcw)
    }

    /// Tool engaged (pen down): any feed move.
    pub fn is_engaged(self) -> bool {
        matches!(
            self,
            MotionMode::Linear | MotionMode::ArcCw | MotionMode::ArcCcw
        )
    }

    /// Opposite winding for arcs; other modes are unchanged.
    pub fn mirrored(self) -> Self {
        match self {
            MotionMode::ArcCw => MotionMode::ArcCcw,
            MotionMode::ArcCcw => MotionMode::ArcCw,
            other => other,
        }
    }
}

/// Positional axis words, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
    A,
    B,
    C,
    U,
    V,
    W,
}

impl Axis {
    pub const ALL: [Axis; 9] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::A,
        Axis::B,
        Axis::C,
        Axis::U,
        Axis::V,
        Axis::W,
    ];

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::A => 'A',
            Axis::B => 'B',
            Axis::C => 'C',
            Axis::U => 'U',
            Axis::V => 'V',
            Axis::W => 'W',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Axis::ALL.into_iter().find(|a| a.letter() == letter)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// The axis values written on a line. `None` means "not present", which is
/// different from zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisWords([Option<f64>; 9]);

impl AxisWords {
    pub fn get(&self, axis: Axis) -> Option<f64> {
        self.0[axis.slot()]
    }

    pub fn set(&mut self, axis: Axis, value: Option<f64>) {
        self.0[axis.slot()] = value;
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(Option::is_some)
    }

    /// Present words in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        Axis::ALL
            .into_iter()
            .filter_map(|axis| self.get(axis).map(|v| (axis, v)))
    }
}

/// An `M98` call: body id and repeat count (at least 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubroutineCall {
    pub id: u32,
    pub repeat: u32,
}

/// Words of a line that are not represented as dedicated fields. They are
/// kept so a regenerated line still carries them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExtraWords {
    /// `N` word, emitted first.
    pub line_label: Option<String>,
    /// Non-motion G words (`G90`, `G53`, `G17`, ...), in source order.
    pub g_words: Vec<String>,
    /// Everything else (`M3`, `T1`, `P100`, ...), in source order.
    pub other: Vec<String>,
    /// Comment text including its delimiters, e.g. `(roughing)` or `; note`.
    pub comment: Option<String>,
}

/// One parsed program line, plus everything position resolution derives
/// from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    /// Zero-based line number in the source text.
    pub line_number: usize,
    /// The line exactly as read.
    pub text: String,
    pub motion: MotionMode,
    pub axes: AxisWords,
    pub i: Option<f64>,
    pub j: Option<f64>,
    /// Feed rate in effect on this line.
    pub feed_rate: f64,
    /// Spindle speed in effect on this line.
    pub spindle_speed: f64,
    pub absolute: bool,
    /// `G53`: axis words are machine coordinates.
    pub machine_frame: bool,
    /// Copy of a subroutine body line inlined at a call site.
    pub subroutine_body: bool,
    /// Inside a hide-marker section.
    pub hidden: bool,
    /// Carries the setup footer marker.
    pub footer: bool,
    /// Follows an `M2`/`M30` line.
    pub after_program_end: bool,
    pub call: Option<SubroutineCall>,
    /// `O` word defining a subroutine label.
    pub label: Option<u32>,
    /// `M99`.
    pub returns: bool,
    /// `M2` or `M30`.
    pub program_end: bool,
    pub words: ExtraWords,

    // ── Filled in by position resolution ─────────────────────────────────────
    /// Resolved position before this line executes.
    pub origin: Point3,
    /// Resolved position after this line executes.
    pub resolved: Point3,
    pub arc: Option<ArcGeometry>,
    /// 1-based pen-down contour this line belongs to.
    pub figure: Option<u32>,

    /// Set by transforms; a modified line is regenerated instead of copied.
    pub modified: bool,
}

impl Instruction {
    /// An instruction with no words, carrying `text` through unchanged.
    pub fn inert(line_number: usize, text: impl Into<String>) -> Self {
        Self {
            line_number,
            text: text.into(),
            motion: MotionMode::None,
            axes: AxisWords::default(),
            i: None,
            j: None,
            feed_rate: 0.0,
            spindle_speed: 0.0,
            absolute: true,
            machine_frame: false,
            subroutine_body: false,
            hidden: false,
            footer: false,
            after_program_end: false,
            call: None,
            label: None,
            returns: false,
            program_end: false,
            words: ExtraWords::default(),
            origin: Point3::default(),
            resolved: Point3::default(),
            arc: None,
            figure: None,
            modified: false,
        }
    }

    /// Any axis word or arc offset is present.
    pub fn has_coordinates(&self) -> bool {
        self.axes.any() || self.i.is_some() || self.j.is_some()
    }

    pub fn has_xy(&self) -> bool {
        self.axes.get(Axis::X).is_some() || self.axes.get(Axis::Y).is_some()
    }

    /// Transforms leave machine-frame, hidden and footer lines alone.
    pub fn is_transformable(&self) -> bool {
        !(self.machine_frame || self.hidden || self.footer)
    }

    /// Contributes to bounds, the coordinate index, figures and path output.
    pub fn is_drawable(&self) -> bool {
        !(self.machine_frame || self.hidden || self.after_program_end)
    }

    pub fn x(&self) -> Option<f64> {
        self.axes.get(Axis::X)
    }

    pub fn y(&self) -> Option<f64> {
        self.axes.get(Axis::Y)
    }

    pub fn z(&self) -> Option<f64> {
        self.axes.get(Axis::Z)
    }
}
