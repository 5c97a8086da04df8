//! Drawable output: program contours, machine overlays and viewer extents,
//! all emitted through the [`PathSink`] trait.

pub mod overlay;
pub mod trace;
pub mod types;

pub use overlay::{drawing_extents, height_map_grid, machine_limits, tool_table};
pub use trace::{trace_figure, trace_program};
pub use types::{Contour, ContourRecorder, Label, Marker, MarkerKind, PathLayer, PathSegment, PathSink};
