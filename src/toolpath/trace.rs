//! Path generation from a resolved program.

use super::types::{MarkerKind, PathLayer, PathSink};
use crate::gcode::{MotionMode, Program};
use crate::models::Unit;

/// Emits pen-up and pen-down contours for every drawable instruction, in
/// execution order.
pub fn trace_program(program: &Program, unit: Unit, sink: &mut dyn PathSink) {
    trace(program, unit, None, sink);
}

/// Emits only the instructions belonging to `figure`.
pub fn trace_figure(program: &Program, unit: Unit, figure: u32, sink: &mut dyn PathSink) {
    trace(program, unit, Some(figure), sink);
}

fn trace(program: &Program, unit: Unit, only: Option<u32>, sink: &mut dyn PathSink) {
    let marker_size = unit.marker_size();
    let mut layer: Option<PathLayer> = None;
    let mut in_body = false;
    // consecutive Z-only moves, used to spot drill plunges
    let mut z_only = 0u32;

    for instr in program.executed() {
        let entering_body = instr.subroutine_body && !in_body;
        in_body = instr.subroutine_body;

        if !instr.is_drawable() || instr.motion == MotionMode::None {
            continue;
        }
        if only.is_some() && instr.figure != only {
            layer = None;
            continue;
        }

        if entering_body {
            sink.marker(instr.resolved.xy(), MarkerKind::SubroutineEntry, marker_size);
        }

        let wanted = if instr.motion.is_engaged() {
            PathLayer::PenDown
        } else {
            PathLayer::PenUp
        };
        let layer_changed = layer != Some(wanted);
        if layer_changed {
            sink.start_contour(wanted);
            sink.move_to(instr.origin.xy());
            layer = Some(wanted);
        }

        let (from, to) = (instr.origin, instr.resolved);
        if let Some(arc) = &instr.arc {
            sink.arc_to(arc.center, arc.radius, arc.start_angle, arc.sweep);
            z_only = 0;
        } else if from.xy() != to.xy() {
            sink.line_to(to.xy());
            z_only = 0;
        }
        if from.z != to.z {
            z_only += 1;
        }

        if z_only > 1 && layer_changed && wanted == PathLayer::PenUp {
            sink.marker(to.xy(), MarkerKind::Drill, marker_size);
            z_only = 0;
        }
    }
}
