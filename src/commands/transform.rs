//! Subcommands that rewrite the program and print the new text.

use crate::engine::GcodeEngine;
use crate::error::AppError;
use crate::gcode::{Anchor, MirrorAxis};
use crate::models::{GridHeightMap, Point2};

/// One rewrite requested on the command line.
#[derive(Debug, Clone)]
pub enum TransformRequest {
    /// No change; the program is serialized as parsed.
    Render,
    Mirror(MirrorAxis),
    Rotate {
        angle_deg: f64,
        scale: f64,
        pivot: Point2,
    },
    Scale {
        x_percent: f64,
        y_percent: f64,
    },
    Offset {
        anchor: Anchor,
        x: f64,
        y: f64,
    },
    Linearize,
    DropZ,
    HeightMap(GridHeightMap),
}

fn positive(name: &str, value: f64) -> Result<f64, AppError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(AppError::InvalidArgument(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

fn finite(name: &str, value: f64) -> Result<f64, AppError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AppError::InvalidArgument(format!("{name} must be finite")))
    }
}

/// Parses `program_text` into `engine`, applies `request` and returns the
/// resulting program text.
pub fn run_transform(
    engine: &mut GcodeEngine,
    program_text: &str,
    request: &TransformRequest,
) -> Result<String, AppError> {
    engine.parse(program_text);

    let text = match request {
        TransformRequest::Render => engine.text(),
        TransformRequest::Mirror(axis) => engine.mirror(*axis),
        TransformRequest::Rotate {
            angle_deg,
            scale,
            pivot,
        } => {
            let angle = finite("angle", *angle_deg)?;
            let scale = positive("scale", *scale)?;
            engine.rotate_scale(angle, scale, *pivot)
        }
        TransformRequest::Scale {
            x_percent,
            y_percent,
        } => {
            let x = positive("x percent", *x_percent)?;
            let y = positive("y percent", *y_percent)?;
            engine.scale_axes(x, y)
        }
        TransformRequest::Offset { anchor, x, y } => {
            engine.offset(*anchor, finite("x", *x)?, finite("y", *y)?)
        }
        TransformRequest::Linearize => engine.linearize_arcs(),
        TransformRequest::DropZ => engine.drop_z_axis(),
        TransformRequest::HeightMap(map) => engine.apply_height_map(map),
    };
    Ok(text)
}
