//! Drawable-path types.
//!
//! The engine never owns drawing state. It describes contours to a
//! caller-supplied [`PathSink`]; [`ContourRecorder`] is the sink used by the
//! CLI and the tests, which keeps everything it is told in memory.

use serde::Serialize;

use crate::models::Point2;

/// Which drawing a contour belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathLayer {
    /// Rapid moves.
    PenUp,
    /// Feed moves (G1/G2/G3).
    PenDown,
    MachineLimit,
    ToolTable,
    HeightMap,
}

/// Point markers placed alongside the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// A Z-only plunge and retract at one XY position.
    Drill,
    /// First move of an inlined subroutine body.
    SubroutineEntry,
}

/// Contour-building capability implemented by renderers.
pub trait PathSink {
    /// Begins a new, unconnected contour on `layer`.
    fn start_contour(&mut self, layer: PathLayer);
    fn move_to(&mut self, to: Point2);
    fn line_to(&mut self, to: Point2);
    /// Circular arc around `center`, angles in degrees, `sweep` negative for clockwise.
    fn arc_to(&mut self, center: Point2, radius: f64, start_angle: f64, sweep: f64);

    fn marker(&mut self, _at: Point2, _kind: MarkerKind, _size: f64) {}

    fn label(&mut self, _at: Point2, _text: &str) {}
}

/// One recorded drawing command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathSegment {
    MoveTo {
        to: Point2,
    },
    LineTo {
        to: Point2,
    },
    ArcTo {
        center: Point2,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    pub layer: PathLayer,
    pub segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub at: Point2,
    pub kind: MarkerKind,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub at: Point2,
    pub text: String,
}

/// A [`PathSink`] that records everything it receives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContourRecorder {
    pub contours: Vec<Contour>,
    pub markers: Vec<Marker>,
    pub labels: Vec<Label>,
}

impl ContourRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contours drawn on `layer`, in order.
    pub fn on_layer(&self, layer: PathLayer) -> impl Iterator<Item = &Contour> + '_ {
        self.contours.iter().filter(move |c| c.layer == layer)
    }

    fn push(&mut self, segment: PathSegment) {
        if self.contours.is_empty() {
            self.start_contour(PathLayer::PenUp);
        }
        if let Some(contour) = self.contours.last_mut() {
            contour.segments.push(segment);
        }
    }
}

impl PathSink for ContourRecorder {
    fn start_contour(&mut self, layer: PathLayer) {
        self.contours.push(Contour {
            layer,
            segments: Vec::new(),
        });
    }

    fn move_to(&mut self, to: Point2) {
        self.push(PathSegment::MoveTo { to });
    }

    fn line_to(&mut self, to: Point2) {
        self.push(PathSegment::LineTo { to });
    }

    fn arc_to(&mut self, center: Point2, radius: f64, start_angle: f64, sweep: f64) {
        self.push(PathSegment::ArcTo {
            center,
            radius,
            start_angle,
            sweep,
        });
    }

    fn marker(&mut self, at: Point2, kind: MarkerKind, size: f64) {
        self.markers.push(Marker { at, kind, size });
    }

    fn label(&mut self, at: Point2, text: &str) {
        self.labels.push(Label {
            at,
            text: text.to_string(),
        });
    }
}
