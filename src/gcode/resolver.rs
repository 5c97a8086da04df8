//! Position resolution: turns the absolute/relative/machine-frame words of
//! each executed line into absolute work coordinates, and builds the bounding
//! box, figure numbers and coordinate index on the way.

use super::arcs::ArcGeometry;
use super::bounds::BoundingBox;
use super::index::{CoordinateEntry, CoordinateIndex};
use super::instruction::{Axis, Instruction, MotionMode};
use crate::models::{MachineSnapshot, Point3};

/// Walks executed instructions in order. Each one is resolved against the
/// position left by the one before it.
pub struct PositionResolver<'a> {
    machine: &'a MachineSnapshot,
    position: Point3,
    pen_down: bool,
    /// The first engaged XY move of a figure also adds its start point.
    start_pending: bool,
    figure: u32,
    bounds: BoundingBox,
    index: CoordinateIndex,
}

impl<'a> PositionResolver<'a> {
    pub fn new(machine: &'a MachineSnapshot) -> Self {
        Self {
            machine,
            position: machine.work_position,
            pen_down: false,
            start_pending: false,
            figure: 0,
            bounds: BoundingBox::new(),
            index: CoordinateIndex::new(),
        }
    }

    fn resolve_axis(&self, instr: &Instruction, axis: Axis, previous: f64, offset: f64) -> f64 {
        match instr.axes.get(axis) {
            Some(v) if instr.absolute && instr.machine_frame => v - offset,
            Some(v) if instr.absolute => v,
            Some(v) => previous + v,
            None => previous,
        }
    }

    /// Fills `origin`, `resolved`, `arc` and `figure` of `instr`.
    pub fn resolve(&mut self, instr: &mut Instruction) {
        let prev = self.position;
        let wco = self.machine.work_offset;
        let resolved = Point3::new(
            self.resolve_axis(instr, Axis::X, prev.x, wco.x),
            self.resolve_axis(instr, Axis::Y, prev.y, wco.y),
            self.resolve_axis(instr, Axis::Z, prev.z, wco.z),
        );

        instr.origin = prev;
        instr.resolved = resolved;
        instr.arc = (instr.motion.is_arc() && (instr.i.is_some() || instr.j.is_some())).then(|| {
            ArcGeometry::from_offsets(
                prev.xy(),
                resolved.xy(),
                instr.i.unwrap_or(0.0),
                instr.j.unwrap_or(0.0),
                instr.motion == MotionMode::ArcCw,
            )
        });
        instr.figure = None;
        self.position = resolved;

        if instr.is_drawable() {
            self.track(instr);
        }
    }

    fn track(&mut self, instr: &mut Instruction) {
        let engaged = instr.motion.is_engaged();
        if engaged && !self.pen_down {
            self.figure += 1;
            self.start_pending = true;
        }
        self.pen_down = engaged;
        if engaged {
            instr.figure = Some(self.figure);
        }

        if engaged && instr.has_xy() {
            if self.start_pending {
                self.bounds.include_xy(instr.origin.xy());
                self.start_pending = false;
            }
            self.bounds.include_xy(instr.resolved.xy());
            if let Some(arc) = &instr.arc {
                self.bounds.include_arc(arc);
            }
        }
        if instr.z().is_some() {
            self.bounds.include_z(instr.resolved.z);
        }

        if instr.has_coordinates() {
            self.index.push(CoordinateEntry {
                line_number: instr.line_number,
                figure: instr.figure,
                position: instr.resolved.xy(),
                arc_center: false,
            });
            if let Some(arc) = &instr.arc {
                self.index.push(CoordinateEntry {
                    line_number: instr.line_number,
                    figure: instr.figure,
                    position: arc.center,
                    arc_center: true,
                });
            }
        }
    }

    /// Number of figures started so far.
    pub fn figure_count(&self) -> u32 {
        self.figure
    }

    pub fn finish(self) -> (BoundingBox, CoordinateIndex) {
        (self.bounds, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::modal::ModalState;
    use crate::gcode::parser::parse_line;
    use crate::models::Point2;
    use approx::assert_abs_diff_eq;

    fn resolve_all(lines: &[&str], machine: &MachineSnapshot) -> (Vec<Instruction>, BoundingBox, CoordinateIndex) {
        let mut modal = ModalState::new();
        let mut resolver = PositionResolver::new(machine);
        let instrs: Vec<Instruction> = lines
            .iter()
            .enumerate()
            .map(|(n, l)| {
                let mut instr = parse_line(n, l, &mut modal);
                resolver.resolve(&mut instr);
                instr
            })
            .collect();
        let (bounds, index) = resolver.finish();
        (instrs, bounds, index)
    }

    const SQUARE: [&str; 5] = [
        "G90",
        "G0 X0 Y0",
        "G1 X10 Y0 F500",
        "G2 X10 Y10 I0 J5",
        "G1 X0 Y10",
    ];

    // -------------------------------------------------------------------------
    // Positions
    // -------------------------------------------------------------------------

    #[test]
    fn absolute_program_resolves_each_point() {
        let (instrs, _, _) = resolve_all(&SQUARE, &MachineSnapshot::default());
        let pts: Vec<Point2> = instrs.iter().map(|i| i.resolved.xy()).collect();
        assert_eq!(
            pts[1..],
            [
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0)
            ]
        );
        assert_eq!(instrs[3].origin.xy(), Point2::new(10.0, 0.0));
    }

    #[test]
    fn relative_moves_accumulate_and_missing_axes_carry() {
        let (instrs, _, _) = resolve_all(&["G91", "G1 X5", "Y3", "X-2 Z1"], &MachineSnapshot::default());
        assert_eq!(instrs[3].resolved, Point3::new(3.0, 3.0, 1.0));
        assert_eq!(instrs[2].resolved, Point3::new(5.0, 3.0, 0.0));
    }

    #[test]
    fn resolution_starts_at_work_position() {
        let machine = MachineSnapshot {
            work_position: Point3::new(1.0, 2.0, 3.0),
            ..MachineSnapshot::default()
        };
        let (instrs, _, _) = resolve_all(&["G91 G0 X1"], &machine);
        assert_eq!(instrs[0].origin, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(instrs[0].resolved, Point3::new(2.0, 2.0, 3.0));
    }

    #[test]
    fn machine_frame_subtracts_work_offset_and_is_not_drawn() {
        let machine = MachineSnapshot {
            work_offset: Point3::new(100.0, 50.0, -10.0),
            ..MachineSnapshot::default()
        };
        let (instrs, bounds, index) = resolve_all(&["G53 G0 Z-5", "G53 G1 X100 Y50"], &machine);
        assert_eq!(instrs[0].resolved.z, 5.0);
        assert_eq!(instrs[1].resolved.xy(), Point2::new(0.0, 0.0));
        assert!(bounds.is_empty());
        assert!(index.is_empty());
        assert_eq!(instrs[1].figure, None);
    }

    // -------------------------------------------------------------------------
    // Arcs and bounds
    // -------------------------------------------------------------------------

    #[test]
    fn arc_geometry_from_previous_point() {
        let (instrs, bounds, _) = resolve_all(&SQUARE, &MachineSnapshot::default());
        let arc = instrs[3].arc.expect("arc");
        assert_eq!(arc.center, Point2::new(10.0, 5.0));
        assert_abs_diff_eq!(arc.start_angle, -90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(arc.sweep, -180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.min_x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.max_x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.max_y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn arc_without_offsets_has_no_geometry() {
        let (instrs, _, _) = resolve_all(&["G2 X1 Y1"], &MachineSnapshot::default());
        assert!(instrs[0].arc.is_none());
    }

    #[test]
    fn rapids_do_not_grow_xy_bounds() {
        let (_, bounds, _) = resolve_all(&["G0 X50 Y50", "G0 X60 Z5"], &MachineSnapshot::default());
        assert!(bounds.is_empty());
        assert_eq!(bounds.z_range(), Some((5.0, 5.0)));
    }

    #[test]
    fn engaged_move_adds_its_start_point() {
        let (_, bounds, _) = resolve_all(&["G0 X-5 Y-5", "G1 Z-1", "G1 X5 Y5"], &MachineSnapshot::default());
        assert_eq!(bounds.min(), Point2::new(-5.0, -5.0));
        assert_eq!(bounds.max(), Point2::new(5.0, 5.0));
    }

    // -------------------------------------------------------------------------
    // Figures and index
    // -------------------------------------------------------------------------

    #[test]
    fn figures_start_at_each_pen_down() {
        let (instrs, _, _) = resolve_all(
            &["G0 X0", "G1 X1", "G1 X2", "G0 X5", "G1 X6"],
            &MachineSnapshot::default(),
        );
        let figures: Vec<Option<u32>> = instrs.iter().map(|i| i.figure).collect();
        assert_eq!(figures, vec![None, Some(1), Some(1), None, Some(2)]);
    }

    #[test]
    fn index_has_entry_per_coordinate_line_plus_arc_centres() {
        let (_, _, index) = resolve_all(&SQUARE, &MachineSnapshot::default());
        assert_eq!(index.len(), 5);
        let centre = index.entries().iter().find(|e| e.arc_center).expect("centre");
        assert_eq!(centre.line_number, 3);
        assert_eq!(centre.position, Point2::new(10.0, 5.0));
    }
}
