//! Arc geometry in the XY plane: center/radius/sweep from I/J notation and
//! flattening of arcs (and long lines) into short linear instructions.
//!
//! Angles are in degrees, measured counter-clockwise from +X. A clockwise
//! arc has a negative sweep.

use std::f64::consts::PI;

use serde::Serialize;

use super::instruction::{Axis, AxisWords, ExtraWords, Instruction, MotionMode};
use crate::models::{Point2, Point3};

/// Radius used in place of a true zero radius.
pub const MIN_RADIUS: f64 = 1e-7;

/// Upper bound on the segments produced for one move.
pub const MAX_SEGMENTS: usize = 100_000;

/// Sweeps below this many degrees are read as a full circle.
const FULL_CIRCLE_TOLERANCE: f64 = 1e-9;

/// Computes the sweep angle (in degrees) traversed by an arc from `start` to
/// `end` around `center`, in the specified direction.
///
/// Returns a value in the range `(0°, 360°]`. A result of `360°` indicates a
/// full circle (start and end coincide angularly around the center).
pub fn arc_sweep_degrees(start: Point2, center: Point2, end: Point2, clockwise: bool) -> f64 {
    let angle_start = (start.y - center.y).atan2(start.x - center.x);
    let angle_end = (end.y - center.y).atan2(end.x - center.x);

    let diff = if clockwise {
        angle_start - angle_end
    } else {
        angle_end - angle_start
    };

    let sweep_deg = diff.to_degrees().rem_euclid(360.0);

    if sweep_deg < FULL_CIRCLE_TOLERANCE {
        360.0
    } else {
        sweep_deg
    }
}

/// Resolved geometry of one arc move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArcGeometry {
    pub center: Point2,
    pub radius: f64,
    /// Angle from the center to the start point.
    pub start_angle: f64,
    /// Signed sweep in `(-360°, 0)` for clockwise, `(0, 360°]` for counter-clockwise.
    pub sweep: f64,
}

impl ArcGeometry {
    /// Builds the arc from `start` to `end` whose center sits at `start + (i, j)`.
    pub fn from_offsets(start: Point2, end: Point2, i: f64, j: f64, clockwise: bool) -> Self {
        let center = start + Point2::new(i, j);
        let radius = i.hypot(j);
        let radius = if radius > 0.0 { radius } else { MIN_RADIUS };
        let start_angle = (start.y - center.y).atan2(start.x - center.x).to_degrees();
        let magnitude = arc_sweep_degrees(start, center, end, clockwise);
        Self {
            center,
            radius,
            start_angle,
            sweep: if clockwise { -magnitude } else { magnitude },
        }
    }

    pub fn is_clockwise(&self) -> bool {
        self.sweep < 0.0
    }

    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep
    }

    /// Point on the circle at `angle_deg`.
    pub fn point_at(&self, angle_deg: f64) -> Point2 {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Point2::new(
            self.center.x + self.radius * cos,
            self.center.y + self.radius * sin,
        )
    }

    /// Whether the swept range passes through `angle_deg` (endpoints included).
    pub fn contains_angle(&self, angle_deg: f64) -> bool {
        let offset = if self.sweep >= 0.0 {
            (angle_deg - self.start_angle).rem_euclid(360.0)
        } else {
            (self.start_angle - angle_deg).rem_euclid(360.0)
        };
        offset <= self.sweep.abs() + 1e-9
    }

    /// Number of equal angular steps so that no chord exceeds `max_step`.
    pub fn segment_count(&self, max_step: f64) -> usize {
        if !(max_step > 0.0) {
            return 1;
        }
        let max_angle = if max_step >= 2.0 * self.radius {
            PI
        } else {
            2.0 * (max_step / (2.0 * self.radius)).asin()
        };
        let n = (self.sweep.abs().to_radians() / max_angle).ceil();
        if !n.is_finite() || n < 1.0 {
            return 1;
        }
        if n > MAX_SEGMENTS as f64 {
            tracing::warn!(
                radius = self.radius,
                max_step,
                "arc needs more than {MAX_SEGMENTS} segments; capping"
            );
            return MAX_SEGMENTS;
        }
        n as usize
    }
}

/// Turns a list of absolute target points into linear instructions derived
/// from `source`. The last point must be `source.resolved`.
///
/// Relative moves are written as differences of targets rounded to `places`
/// decimals, so the written increments add up to the commanded delta.
fn segments_from_points(source: &Instruction, points: &[Point3], places: u32) -> Vec<Instruction> {
    let write_z = source.z().is_some() || source.resolved.z != source.origin.z;
    let last = points.len().saturating_sub(1);
    let scale = 10f64.powi(places as i32);
    let origin = source.origin;
    let ticks = |p: Point3| {
        let d = p - origin;
        Point3::new((d.x * scale).round(), (d.y * scale).round(), (d.z * scale).round())
    };
    let mut prev = origin;
    let mut prev_ticks = Point3::default();

    points
        .iter()
        .enumerate()
        .map(|(k, &target)| {
            let (p, (x, y, z)) = if source.absolute {
                (target, (target.x, target.y, target.z))
            } else {
                let t = ticks(target);
                let step = t - prev_ticks;
                prev_ticks = t;
                let p = if k == last {
                    target
                } else {
                    origin + Point3::new(t.x / scale, t.y / scale, t.z / scale)
                };
                (p, (step.x / scale, step.y / scale, step.z / scale))
            };

            let mut axes = AxisWords::default();
            axes.set(Axis::X, Some(x));
            axes.set(Axis::Y, Some(y));
            if write_z {
                axes.set(Axis::Z, Some(z));
            }
            if k == last {
                for axis in [Axis::A, Axis::B, Axis::C, Axis::U, Axis::V, Axis::W] {
                    axes.set(axis, source.axes.get(axis));
                }
            }

            let mut seg = source.clone();
            seg.motion = MotionMode::Linear;
            seg.axes = axes;
            seg.i = None;
            seg.j = None;
            seg.arc = None;
            if k > 0 {
                seg.words = ExtraWords::default();
            }
            seg.origin = prev;
            seg.resolved = p;
            seg.modified = true;
            prev = p;
            seg
        })
        .collect()
}

/// Replaces a resolved arc instruction with linear moves whose chords are at
/// most `max_step` long. Z is interpolated for helical moves. The final move
/// lands exactly on the commanded end point once written with `places`
/// decimals. Non-arcs are returned unchanged.
pub fn flatten_arc(source: &Instruction, max_step: f64, places: u32) -> Vec<Instruction> {
    let Some(arc) = source.arc else {
        return vec![source.clone()];
    };

    let n = arc.segment_count(max_step);
    let (z0, z1) = (source.origin.z, source.resolved.z);
    let points: Vec<Point3> = (1..=n)
        .map(|k| {
            if k == n {
                return source.resolved;
            }
            let t = k as f64 / n as f64;
            let p = arc.point_at(arc.start_angle + arc.sweep * t);
            Point3::new(p.x, p.y, z0 + (z1 - z0) * t)
        })
        .collect();

    segments_from_points(source, &points, places)
}

/// Splits a resolved linear feed move into pieces no longer than `max_step`.
/// Other instructions are returned unchanged.
pub fn split_line(source: &Instruction, max_step: f64, places: u32) -> Vec<Instruction> {
    let length = source.origin.xy().distance(source.resolved.xy());
    if source.motion != MotionMode::Linear || !(max_step > 0.0) || length <= max_step {
        return vec![source.clone()];
    }

    let n = ((length / max_step).ceil() as usize).clamp(1, MAX_SEGMENTS);
    let (a, b) = (source.origin, source.resolved);
    let points: Vec<Point3> = (1..=n)
        .map(|k| {
            if k == n {
                return b;
            }
            let t = k as f64 / n as f64;
            Point3::new(
                a.x + (b.x - a.x) * t,
                a.y + (b.y - a.y) * t,
                a.z + (b.z - a.z) * t,
            )
        })
        .collect();

    segments_from_points(source, &points, places)
}

/// Flattens every transformable arc with `arc_step`, and when `line_step` is
/// given also splits long linear moves. The input must be resolved.
pub fn linearize(
    lines: &[Instruction],
    arc_step: f64,
    line_step: Option<f64>,
    places: u32,
) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(lines.len());
    for instr in lines {
        if !instr.is_transformable() {
            out.push(instr.clone());
        } else if instr.arc.is_some() {
            out.extend(flatten_arc(instr, arc_step, places));
        } else if let Some(step) = line_step {
            out.extend(split_line(instr, step, places));
        } else {
            out.push(instr.clone());
        }
    }
    out
}
