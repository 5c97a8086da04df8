//! Machine overlays drawn next to the program path, and viewer extents.
//!
//! Everything here is expressed in work coordinates: machine-frame inputs are
//! shifted by the snapshot's work offset before they reach the sink.

use super::types::{PathLayer, PathSink};
use crate::gcode::BoundingBox;
use crate::models::{GridHeightMap, HeightMap, MachineSnapshot, Point2, Unit};

/// Radius of a tool-table slot circle.
const TOOL_RADIUS: f64 = 4.0;
/// Growth applied to program bounds before rounding viewer extents.
const EXTENT_MARGIN: f64 = 1.01;

// ── Machine limits ───────────────────────────────────────────────────────────

/// Travel rectangle plus an outer frame extended by twice the X travel on
/// every side. Nothing is drawn when the snapshot has no limits.
pub fn machine_limits(machine: &MachineSnapshot, sink: &mut dyn PathSink) {
    let Some(limits) = &machine.limits else {
        return;
    };
    let corner = Point2::new(
        limits.home_x - machine.work_offset.x,
        limits.home_y - machine.work_offset.y,
    );
    let size = Point2::new(limits.range_x, limits.range_y);
    rectangle(sink, corner, size);

    let extend = 2.0 * limits.range_x;
    rectangle(
        sink,
        Point2::new(corner.x - extend, corner.y - extend),
        Point2::new(size.x + 2.0 * extend, size.y + 2.0 * extend),
    );
}

fn rectangle(sink: &mut dyn PathSink, corner: Point2, size: Point2) {
    sink.start_contour(PathLayer::MachineLimit);
    sink.move_to(corner);
    sink.line_to(Point2::new(corner.x + size.x, corner.y));
    sink.line_to(Point2::new(corner.x + size.x, corner.y + size.y));
    sink.line_to(Point2::new(corner.x, corner.y + size.y));
    sink.line_to(corner);
}

// ── Tool table ───────────────────────────────────────────────────────────────

/// One labelled circle per usable tool slot. Slots with a negative id or a
/// label shorter than two characters are placeholders and are skipped.
pub fn tool_table(machine: &MachineSnapshot, sink: &mut dyn PathSink) {
    for tool in &machine.tools {
        if tool.id < 0 || tool.label.chars().count() <= 1 {
            continue;
        }
        let center = Point2::new(
            tool.x - machine.work_offset.x,
            tool.y - machine.work_offset.y,
        );
        sink.start_contour(PathLayer::ToolTable);
        sink.move_to(Point2::new(center.x + TOOL_RADIUS, center.y));
        sink.arc_to(center, TOOL_RADIUS, 0.0, 360.0);
        sink.label(
            Point2::new(center.x - 3.0 * TOOL_RADIUS, center.y - TOOL_RADIUS),
            &format!("{}) {}", tool.id, tool.label),
        );
    }
}

// ── Height map ───────────────────────────────────────────────────────────────

/// Grid lines through every probe point of `map`.
pub fn height_map_grid(map: &GridHeightMap, sink: &mut dyn PathSink) {
    let (min, max) = (map.min(), map.max());
    let pitch = map.pitch();
    let (size_x, size_y) = map.size();

    for ix in 0..size_x {
        let x = min.x + pitch.x * ix as f64;
        sink.start_contour(PathLayer::HeightMap);
        sink.move_to(Point2::new(x, min.y));
        sink.line_to(Point2::new(x, max.y));
    }
    for iy in 0..size_y {
        let y = min.y + pitch.y * iy as f64;
        sink.start_contour(PathLayer::HeightMap);
        sink.move_to(Point2::new(min.x, y));
        sink.line_to(Point2::new(max.x, y));
    }
}

// ── Extents ──────────────────────────────────────────────────────────────────

/// Viewer extents around `bounds`: grown by 1 %, rounded outwards to the
/// unit's grid, and always including a little space left of and below zero.
pub fn drawing_extents(bounds: &BoundingBox, unit: Unit) -> (Point2, Point2) {
    let step = unit.extent_rounding();
    let round_down = |v: f64| {
        let r = (v * EXTENT_MARGIN / step).floor() * step;
        if r >= 0.0 {
            -step
        } else {
            r
        }
    };
    let round_up = |v: f64| (v * EXTENT_MARGIN / step).ceil() * step;

    let (min, max) = (bounds.min(), bounds.max());
    (
        Point2::new(round_down(min.x), round_down(min.y)),
        Point2::new(round_up(max.x), round_up(max.y)),
    )
}
