//! Read-only subcommands. Each returns a serializable value the binary
//! prints as pretty JSON.

use serde::Serialize;

use crate::engine::GcodeEngine;
use crate::error::AppError;
use crate::gcode::{BoundingBox, CoordinateEntry, NearestHit};
use crate::models::{GridHeightMap, Point2};
use crate::toolpath::ContourRecorder;

/// Summary printed by `info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramInfo {
    pub lines: usize,
    /// Lines in execution order, subroutine bodies inlined.
    pub executed: usize,
    pub figures: u32,
    pub contains_arcs: bool,
    pub contains_relative: bool,
    /// `None` when nothing is drawn.
    pub bounds: Option<BoundingBox>,
    pub extents: Extents,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extents {
    pub min: Point2,
    pub max: Point2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FigureRange {
    pub figure: u32,
    pub first_line: usize,
    pub last_line: usize,
}

// ── info ──────────────────────────────────────────────────────────────────────

pub fn info(engine: &GcodeEngine) -> ProgramInfo {
    let program = engine.program();
    let bounds = program.bounds();
    let (min, max) = engine.drawing_extents();
    ProgramInfo {
        lines: program.lines().len(),
        executed: program.steps().len(),
        figures: program.figure_count(),
        contains_arcs: program.contains_arcs(),
        contains_relative: program.contains_relative(),
        bounds: (!bounds.is_empty()).then_some(*bounds),
        extents: Extents { min, max },
    }
}

// ── nearest / figure / locate ─────────────────────────────────────────────────

/// Nearest indexed coordinate to `point`. When `landmark_text` is given it is
/// parsed first and kept as the landmark, then `program_text` is loaded.
pub fn nearest(
    engine: &mut GcodeEngine,
    program_text: &str,
    landmark_text: Option<&str>,
    point: Point2,
) -> Result<NearestHit, AppError> {
    if let Some(landmark) = landmark_text {
        engine.parse(landmark);
        engine.set_landmark();
    }
    engine.parse(program_text);
    engine
        .find_nearest_coordinate(point)
        .ok_or_else(|| AppError::NotFound("program has no coordinates".to_string()))
}

pub fn figure(engine: &GcodeEngine, figure: u32) -> Result<FigureRange, AppError> {
    let (first_line, last_line) = engine
        .figure_line_range(figure)
        .ok_or_else(|| AppError::NotFound(format!("figure {figure} not found")))?;
    Ok(FigureRange {
        figure,
        first_line,
        last_line,
    })
}

pub fn locate(engine: &GcodeEngine, line: usize) -> Result<CoordinateEntry, AppError> {
    engine
        .locate_line(line)
        .ok_or_else(|| AppError::NotFound(format!("line {line} has no position")))
}

// ── trace ─────────────────────────────────────────────────────────────────────

/// Records the drawable output. A figure limits it to that figure's path;
/// otherwise overlays and the whole program are recorded.
pub fn trace(
    engine: &GcodeEngine,
    figure: Option<u32>,
    height_map: Option<&GridHeightMap>,
) -> Result<ContourRecorder, AppError> {
    let mut recorder = ContourRecorder::new();
    match figure {
        Some(n) if n == 0 || n > engine.program().figure_count() => {
            return Err(AppError::NotFound(format!("figure {n} not found")));
        }
        Some(n) => engine.trace_figure(n, &mut recorder),
        None => engine.render(height_map, &mut recorder),
    }
    Ok(recorder)
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::{EngineConfig, HitSource};
    use crate::models::MachineSnapshot;
    use crate::toolpath::PathLayer;

    const TWO_FIGURES: &str = "G0 X0 Y0\nG1 X10 Y0\nG1 X10 Y10\nG0 X20 Y0\nG1 X30 Y0\n";

    fn loaded(text: &str) -> GcodeEngine {
        let mut e = GcodeEngine::new(EngineConfig::default(), MachineSnapshot::default());
        e.parse(text);
        e
    }

    #[test]
    fn info_summarizes_the_program() {
        let info = info(&loaded(TWO_FIGURES));
        assert_eq!(info.lines, 5);
        assert_eq!(info.executed, 5);
        assert_eq!(info.figures, 2);
        assert!(!info.contains_arcs);
        let bounds = info.bounds.expect("bounds");
        assert_eq!(bounds.max_x, 30.0);
    }

    #[test]
    fn info_of_empty_program_has_no_bounds() {
        let info = info(&loaded(""));
        assert!(info.bounds.is_none());
        let json = to_json(&info).expect("json");
        assert!(json.contains("\"bounds\": null"));
    }

    #[test]
    fn nearest_uses_the_landmark_when_closer() {
        let mut e = GcodeEngine::new(EngineConfig::default(), MachineSnapshot::default());
        let hit = nearest(&mut e, "G0 X50 Y50\n", Some("G0 X1 Y1\n"), Point2::new(0.0, 0.0))
            .expect("hit");
        assert_eq!(hit.source, HitSource::Landmark);
        assert_eq!(hit.line_number, 0);
    }

    #[test]
    fn nearest_on_empty_program_is_not_found() {
        let mut e = GcodeEngine::new(EngineConfig::default(), MachineSnapshot::default());
        let err = nearest(&mut e, "(nothing)\n", None, Point2::new(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn figure_and_locate_report_not_found() {
        let e = loaded(TWO_FIGURES);
        assert_eq!(
            figure(&e, 2).expect("figure 2"),
            FigureRange {
                figure: 2,
                first_line: 4,
                last_line: 4
            }
        );
        assert!(matches!(figure(&e, 3), Err(AppError::NotFound(_))));
        assert!(matches!(locate(&e, 40), Err(AppError::NotFound(_))));
    }

    #[test]
    fn trace_of_one_figure_has_only_pen_down() {
        let e = loaded(TWO_FIGURES);
        let rec = trace(&e, Some(1), None).expect("trace");
        assert!(rec.contours.iter().all(|c| c.layer == PathLayer::PenDown));
        assert!(trace(&e, Some(9), None).is_err());
    }
}
