//! G-code program engine: parsing with sticky modal state, subroutine
//! expansion, position resolution, geometric transforms and serialization.
//!
//! Nothing in this module fails on program content. Malformed words are
//! dropped, unknown subroutines expand to nothing and degenerate arcs are
//! clamped, so [`EngineError`] only covers configuration and height-map input.

pub mod arcs;
pub mod block;
pub mod bounds;
pub mod config;
pub mod formatter;
pub mod index;
pub mod instruction;
pub mod modal;
pub mod parser;
pub mod program;
pub mod resolver;
pub mod serializer;
pub mod subroutine;
pub mod transform;

pub use bounds::BoundingBox;
pub use config::EngineConfig;
pub use index::{CoordinateEntry, CoordinateIndex, HitSource, NearestHit};
pub use instruction::{Axis, Instruction, MotionMode};
pub use program::Program;
pub use transform::{Anchor, MirrorAxis, Transform};

/// Internal error type for engine inputs.
/// The CLI maps these to `AppError` at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),
    #[error("height map error: {0}")]
    HeightMap(String),
}
