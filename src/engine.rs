//! `GcodeEngine`: the stateful operations surface over one loaded program.
//!
//! Every transform returns the regenerated text and then re-parses it, so the
//! next call always starts from a freshly resolved [`Program`].

use crate::gcode::serializer::{serialize, serialize_lines, SerializeOptions};
use crate::gcode::transform::{self, Transform};
use crate::gcode::{
    Anchor, BoundingBox, CoordinateEntry, CoordinateIndex, EngineConfig, HitSource, MirrorAxis,
    NearestHit, Program,
};
use crate::models::{GridHeightMap, HeightMap, MachineSnapshot, Point2};
use crate::toolpath::{self, PathSink};

pub struct GcodeEngine {
    config: EngineConfig,
    machine: MachineSnapshot,
    program: Program,
    /// Background copy of an earlier index, in machine coordinates.
    landmark: Option<CoordinateIndex>,
    selected_figure: Option<u32>,
}

impl GcodeEngine {
    pub fn new(config: EngineConfig, machine: MachineSnapshot) -> Self {
        Self {
            config,
            machine,
            program: Program::default(),
            landmark: None,
            selected_figure: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn machine(&self) -> &MachineSnapshot {
        &self.machine
    }

    /// Replaces the machine snapshot and re-resolves the loaded program
    /// against it.
    pub fn set_machine(&mut self, machine: MachineSnapshot) {
        self.machine = machine;
        self.program.resolve(&self.machine);
    }

    // ── Loading ──────────────────────────────────────────────────────────────

    /// Parses `text`, replacing the loaded program.
    pub fn parse(&mut self, text: &str) -> &Program {
        self.program = Program::parse(text, &self.config, &self.machine);
        self.selected_figure = None;
        &self.program
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The loaded program serialized without changes.
    pub fn text(&self) -> String {
        serialize(&self.program, &self.config.format)
    }

    // ── Transforms ───────────────────────────────────────────────────────────

    fn run(&mut self, transform: Transform<'_>) -> String {
        let text = transform::apply(&mut self.program, &transform, &self.config, &self.machine);
        self.parse(&text);
        text
    }

    pub fn mirror(&mut self, axis: MirrorAxis) -> String {
        self.run(Transform::Mirror(axis))
    }

    pub fn rotate_scale(&mut self, angle_deg: f64, scale: f64, pivot: Point2) -> String {
        self.run(Transform::RotateScale {
            angle_deg,
            scale,
            pivot,
        })
    }

    pub fn scale_axes(&mut self, x_percent: f64, y_percent: f64) -> String {
        self.run(Transform::ScaleAxes {
            x_percent,
            y_percent,
        })
    }

    /// Shifts the program by `anchor + (extra_x, extra_y)`: `anchor` of its
    /// bounding box lands on (`-extra_x`, `-extra_y`). Pass negated values to
    /// place the anchor on a target point.
    pub fn offset(&mut self, anchor: Anchor, extra_x: f64, extra_y: f64) -> String {
        self.run(Transform::Offset {
            anchor,
            extra: Point2::new(extra_x, extra_y),
        })
    }

    /// Replaces every transformable arc, and every longer feed move, by
    /// linear moves no longer than `[arcs].max_step`.
    pub fn linearize_arcs(&mut self) -> String {
        if self.program.is_empty() {
            return String::new();
        }
        let options = SerializeOptions {
            linearize_step: Some(self.config.arcs.max_step),
        };
        let text = serialize_lines(self.program.lines(), &self.config.format, options);
        tracing::info!(max_step = self.config.arcs.max_step, "arcs linearized");
        self.parse(&text);
        text
    }

    pub fn drop_z_axis(&mut self) -> String {
        self.run(Transform::DropZ)
    }

    pub fn apply_height_map(&mut self, map: &dyn HeightMap) -> String {
        self.run(Transform::HeightCorrect(map))
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn bounds(&self) -> &BoundingBox {
        self.program.bounds()
    }

    /// Closest indexed position to `point`, searching the program and the
    /// landmark. Ties go to the program. A program hit selects its figure.
    pub fn find_nearest_coordinate(&mut self, point: Point2) -> Option<NearestHit> {
        let own = self.program.index().nearest(point, HitSource::Program);
        let offset = self.machine.work_offset;
        let background = self.landmark.as_ref().and_then(|landmark| {
            landmark
                .translated(Point2::new(-offset.x, -offset.y))
                .nearest(point, HitSource::Landmark)
        });

        let hit = match (own, background) {
            (Some(a), Some(b)) if b.distance < a.distance => Some(b),
            (a, b) => a.or(b),
        };
        self.selected_figure = hit
            .filter(|h| h.source == HitSource::Program)
            .and_then(|h| h.figure);
        tracing::debug!(?hit, "nearest coordinate");
        hit
    }

    pub fn figure_line_range(&self, figure: u32) -> Option<(usize, usize)> {
        self.program.index().figure_line_range(figure)
    }

    /// Position marker for `line_number`.
    pub fn locate_line(&self, line_number: usize) -> Option<CoordinateEntry> {
        self.program.index().locate_line(line_number).copied()
    }

    pub fn selected_figure(&self) -> Option<u32> {
        self.selected_figure
    }

    // ── Landmark ─────────────────────────────────────────────────────────────

    /// Keeps the current index as a background copy, stored in machine
    /// coordinates so it stays put when the work offset changes.
    pub fn set_landmark(&mut self) {
        let offset = self.machine.work_offset.xy();
        self.landmark = Some(self.program.index().translated(offset));
    }

    pub fn clear_landmark(&mut self) {
        self.landmark = None;
    }

    pub fn has_landmark(&self) -> bool {
        self.landmark.is_some()
    }

    // ── Drawing ──────────────────────────────────────────────────────────────

    pub fn trace(&self, sink: &mut dyn PathSink) {
        toolpath::trace_program(&self.program, self.machine.unit, sink);
    }

    pub fn trace_figure(&self, figure: u32, sink: &mut dyn PathSink) {
        toolpath::trace_figure(&self.program, self.machine.unit, figure, sink);
    }

    /// Overlays first, then the program path.
    pub fn render(&self, height_map: Option<&GridHeightMap>, sink: &mut dyn PathSink) {
        toolpath::machine_limits(&self.machine, sink);
        toolpath::tool_table(&self.machine, sink);
        if let Some(map) = height_map {
            toolpath::height_map_grid(map, sink);
        }
        self.trace(sink);
    }

    pub fn drawing_extents(&self) -> (Point2, Point2) {
        toolpath::drawing_extents(self.program.bounds(), self.machine.unit)
    }
}
