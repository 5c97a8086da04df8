//! Geometric rewrites of a parsed program.
//!
//! A transform edits the words of top-level lines in place and marks what it
//! changed, then the program is resolved again and serialized. Machine-frame,
//! hidden and setup footer lines are never touched. Subroutine definitions
//! are transformed once at their definition; inlined copies follow them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::arcs;
use super::bounds::BoundingBox;
use super::config::EngineConfig;
use super::instruction::{Axis, Instruction, MotionMode};
use super::modal::ModalState;
use super::parser::parse_line;
use super::program::{Program, Step};
use super::serializer::{serialize, serialize_lines, SerializeOptions};
use crate::models::{HeightMap, MachineSnapshot, Point2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorAxis {
    X,
    Y,
}

/// One of the nine reference points of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleLeft,
        Anchor::Center,
        Anchor::MiddleRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::MiddleLeft => "middle-left",
            Anchor::Center => "center",
            Anchor::MiddleRight => "middle-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }

    /// The anchor's position on `bounds`.
    pub fn point(self, bounds: &BoundingBox) -> Point2 {
        let (min, max) = (bounds.min(), bounds.max());
        let mid = bounds.center();
        let x = match self {
            Anchor::TopLeft | Anchor::MiddleLeft | Anchor::BottomLeft => min.x,
            Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => mid.x,
            Anchor::TopRight | Anchor::MiddleRight | Anchor::BottomRight => max.x,
        };
        let y = match self {
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => max.y,
            Anchor::MiddleLeft | Anchor::Center | Anchor::MiddleRight => mid.y,
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => min.y,
        };
        Point2::new(x, y)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Anchor::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| format!("unknown anchor '{s}'"))
    }
}

/// A requested rewrite. Transforms are mutually exclusive; each call applies one.
#[derive(Clone, Copy)]
pub enum Transform<'a> {
    Mirror(MirrorAxis),
    /// Rotate by `angle_deg` (counter-clockwise) about `pivot`, then scale.
    RotateScale {
        angle_deg: f64,
        scale: f64,
        pivot: Point2,
    },
    ScaleAxes {
        x_percent: f64,
        y_percent: f64,
    },
    /// Shift the program by `anchor + extra`, so `anchor` lands on `-extra`.
    Offset {
        anchor: Anchor,
        extra: Point2,
    },
    DropZ,
    HeightCorrect(&'a dyn HeightMap),
}

impl Transform<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Mirror(_) => "mirror",
            Transform::RotateScale { .. } => "rotate_scale",
            Transform::ScaleAxes { .. } => "scale_axes",
            Transform::Offset { .. } => "offset",
            Transform::DropZ => "drop_z",
            Transform::HeightCorrect(_) => "height_correct",
        }
    }
}

/// Applies `transform` to `program` and returns the regenerated text. An
/// empty program yields empty text.
pub fn apply(
    program: &mut Program,
    transform: &Transform<'_>,
    config: &EngineConfig,
    machine: &MachineSnapshot,
) -> String {
    if program.is_empty() {
        return String::new();
    }

    let changed = match *transform {
        Transform::Mirror(axis) => mirror(program, axis),
        Transform::RotateScale {
            angle_deg,
            scale,
            pivot,
        } => rotate_scale(program, angle_deg, scale, pivot),
        Transform::ScaleAxes {
            x_percent,
            y_percent,
        } => scale_axes(program, x_percent / 100.0, y_percent / 100.0),
        Transform::Offset { anchor, extra } => offset(program, anchor, extra, config),
        Transform::DropZ => drop_z(program),
        Transform::HeightCorrect(map) => return height_correct(program, map, config, machine),
    };

    program.resolve(machine);
    tracing::info!(transform = transform.name(), changed, "transform applied");
    serialize(program, &config.format)
}

/// Transformable top-level lines.
fn editable(program: &mut Program) -> impl Iterator<Item = &mut Instruction> {
    program
        .lines_mut()
        .iter_mut()
        .filter(|l| l.is_transformable())
}

// ── Mirror ───────────────────────────────────────────────────────────────────

/// Reflects absolute values about the box centre, negates relative values and
/// arc offsets of the mirrored axis, and swaps arc winding.
fn mirror(program: &mut Program, axis: MirrorAxis) -> usize {
    let bounds = *program.bounds();
    let (axis_word, sum) = match axis {
        MirrorAxis::X => (Axis::X, bounds.min().x + bounds.max().x),
        MirrorAxis::Y => (Axis::Y, bounds.min().y + bounds.max().y),
    };

    let mut changed = 0;
    for line in editable(program) {
        let mut touched = false;
        if let Some(v) = line.axes.get(axis_word) {
            let v = if line.absolute { sum - v } else { -v };
            line.axes.set(axis_word, Some(v));
            touched = true;
        }
        let offset = match axis {
            MirrorAxis::X => &mut line.i,
            MirrorAxis::Y => &mut line.j,
        };
        if let Some(v) = offset {
            *v = -*v;
            touched = true;
        }
        if line.motion.is_arc() && line.has_coordinates() {
            line.motion = line.motion.mirrored();
            touched = true;
        }
        if touched {
            line.modified = true;
            changed += 1;
        }
    }
    changed
}

// ── Rotate and scale ─────────────────────────────────────────────────────────

/// Resolved XY of the inlined copies of each body definition line, keyed by
/// the definition's line index.
fn copy_positions(program: &Program) -> HashMap<usize, Vec<Point2>> {
    let mut copies: HashMap<usize, Vec<Point2>> = HashMap::new();
    for step in program.steps() {
        if let Step::Body {
            definition,
            instruction,
        } = step
        {
            copies.entry(*definition).or_default().push(instruction.resolved.xy());
        }
    }
    copies
}

/// Where an absolute body line missing X or Y executes, and whether its
/// missing word may be written. Copies called from different places only get
/// their own words rewritten.
fn body_position(line: &Instruction, copies: &[Point2]) -> (Point2, bool) {
    let Some(&first) = copies.first() else {
        return (line.resolved.xy(), true);
    };
    if copies.iter().all(|c| c.distance(first) < 1e-9) {
        return (first, true);
    }
    tracing::warn!(
        line = line.line_number,
        "subroutine line runs from different positions; missing axis left out"
    );
    (first, false)
}

fn rotate_scale(program: &mut Program, angle_deg: f64, scale: f64, pivot: Point2) -> usize {
    let copies = copy_positions(program);
    let mut changed = 0;
    for (n, line) in program.lines_mut().iter_mut().enumerate() {
        if !line.is_transformable() {
            continue;
        }
        let mut touched = false;
        if line.has_xy() {
            let partial = line.x().is_none() || line.y().is_none();
            let (p, fill) = if line.absolute {
                let (at, fill) = match copies.get(&n) {
                    Some(at) if partial => body_position(line, at),
                    _ => (line.resolved.xy(), true),
                };
                ((at - pivot).rotated(angle_deg).scaled(scale) + pivot, fill)
            } else {
                let delta = Point2::new(line.x().unwrap_or(0.0), line.y().unwrap_or(0.0));
                (delta.rotated(angle_deg).scaled(scale), true)
            };
            if fill || line.x().is_some() {
                line.axes.set(Axis::X, Some(p.x));
            }
            if fill || line.y().is_some() {
                line.axes.set(Axis::Y, Some(p.y));
            }
            touched = true;
        }
        if line.i.is_some() || line.j.is_some() {
            let ij = Point2::new(line.i.unwrap_or(0.0), line.j.unwrap_or(0.0))
                .rotated(angle_deg)
                .scaled(scale);
            line.i = Some(ij.x);
            line.j = Some(ij.y);
            touched = true;
        }
        if touched {
            line.modified = true;
            changed += 1;
        }
    }
    changed
}

// ── Independent axis scale ───────────────────────────────────────────────────

fn scale_axes(program: &mut Program, fx: f64, fy: f64) -> usize {
    let mut changed = 0;
    for line in editable(program) {
        let mut touched = false;
        for (axis, factor) in [(Axis::X, fx), (Axis::Y, fy)] {
            if let Some(v) = line.axes.get(axis) {
                line.axes.set(axis, Some(v * factor));
                touched = true;
            }
        }
        for (offset, factor) in [(&mut line.i, fx), (&mut line.j, fy)] {
            if let Some(v) = offset {
                *v *= factor;
                touched = true;
            }
        }
        if touched {
            line.modified = true;
            changed += 1;
        }
    }
    changed
}

// ── Offset ───────────────────────────────────────────────────────────────────

/// Where the zero rapid carrying a relative program's offset goes, if one is
/// needed: `(index, needs_g91)`.
fn offset_move_slot(lines: &[Instruction]) -> Option<(usize, bool)> {
    let candidates = |i: &usize| {
        let l = &lines[*i];
        l.is_transformable() && !l.after_program_end
    };

    let retract = (0..lines.len()).filter(candidates).find(|i| {
        let l = &lines[*i];
        !l.absolute && l.motion == MotionMode::Rapid && l.z().is_some()
    });

    let Some(retract) = retract else {
        return (0..lines.len())
            .filter(candidates)
            .find(|i| !lines[*i].absolute && lines[*i].has_coordinates())
            .map(|i| (i, true));
    };

    for l in &lines[retract + 1..] {
        if l.motion == MotionMode::Rapid && l.x().is_some() && l.y().is_some() {
            return None;
        }
        if l.motion.is_engaged() {
            break;
        }
    }
    Some((retract + 1, false))
}

fn offset(program: &mut Program, anchor: Anchor, extra: Point2, config: &EngineConfig) -> usize {
    let delta = anchor.point(program.bounds()) + extra;
    let mut changed = 0;

    if program.contains_relative() {
        if let Some((at, needs_g91)) = offset_move_slot(program.lines()) {
            let text = if needs_g91 {
                format!("G91 G0 X0 Y0 {}", config.markers.offset_move_comment)
            } else {
                format!("G0 X0 Y0 {}", config.markers.offset_move_comment)
            };
            let before = &program.lines()[at.saturating_sub(1).min(program.lines().len() - 1)];
            let mut modal = ModalState {
                absolute: false,
                feed_rate: before.feed_rate,
                spindle_speed: before.spindle_speed,
                ..ModalState::new()
            };
            let mut inserted = parse_line(at, &text, &mut modal);
            inserted.modified = true;
            program.insert_line(at, inserted);
            if needs_g91 {
                // the following line may rely on the motion mode the insert replaced
                if let Some(next) = program.lines_mut().get_mut(at + 1) {
                    next.modified = true;
                }
            }
            tracing::debug!(line = at, "offset move inserted");
        }
    }

    let (mut pending_x, mut pending_y) = (true, true);
    for line in editable(program) {
        let mut touched = false;
        if line.absolute {
            if let Some(x) = line.x() {
                line.axes.set(Axis::X, Some(x - delta.x));
                pending_x &= line.after_program_end;
                touched = true;
            }
            if let Some(y) = line.y() {
                line.axes.set(Axis::Y, Some(y - delta.y));
                pending_y &= line.after_program_end;
                touched = true;
            }
        } else if !line.after_program_end
            && line.motion == MotionMode::Rapid
            && line.has_xy()
            && (pending_x || pending_y)
        {
            if pending_x {
                line.axes.set(Axis::X, Some(line.x().unwrap_or(0.0) - delta.x));
                pending_x = false;
            }
            if pending_y {
                line.axes.set(Axis::Y, Some(line.y().unwrap_or(0.0) - delta.y));
                pending_y = false;
            }
            touched = true;
        }
        if touched {
            line.modified = true;
            changed += 1;
        }
    }
    changed
}

// ── Drop Z ───────────────────────────────────────────────────────────────────

fn drop_z(program: &mut Program) -> usize {
    let mut changed = 0;
    for line in editable(program) {
        if line.z().is_some() {
            line.axes.set(Axis::Z, None);
            line.modified = true;
            changed += 1;
        }
    }
    changed
}

// ── Height map ───────────────────────────────────────────────────────────────

/// Flattens subroutines, subdivides moves to the map's cell size and writes a
/// corrected Z on every move that cuts or whose correction is non-zero.
fn height_correct(
    program: &Program,
    map: &dyn HeightMap,
    config: &EngineConfig,
    machine: &MachineSnapshot,
) -> String {
    let step = map.cell_size();
    let lines = arcs::linearize(&program.flattened(), step, Some(step), config.format.decimal_places);
    let mut flat = Program::from_instructions(lines, machine);

    // Targets sit on the output grid so relative Z words add up without drift.
    let scale = 10f64.powi(config.format.decimal_places as i32);
    // Z the machine actually reaches after each line, corrections included.
    let mut actual_z = machine.work_position.z;
    let mut changed = 0;
    for line in flat.lines_mut() {
        let moves = line.has_xy() || line.z().is_some();
        if line.is_transformable() && moves {
            let correction = map.interpolate_height(line.resolved.x, line.resolved.y);
            if line.motion.is_engaged() || correction != 0.0 {
                let target = ((line.resolved.z + correction) * scale).round() / scale;
                let z = if line.absolute { target } else { target - actual_z };
                line.axes.set(Axis::Z, Some(z));
                line.modified = true;
                actual_z = target;
                changed += 1;
                continue;
            }
        }
        actual_z = match line.z() {
            Some(_) if line.absolute => line.resolved.z,
            Some(dz) => actual_z + dz,
            None => actual_z,
        };
    }

    tracing::info!(transform = "height_correct", changed, lines = flat.lines().len(), "transform applied");
    serialize_lines(flat.lines(), &config.format, SerializeOptions::default())
}
