//! Surface height maps used for Z correction.
//!
//! The engine only ever reads a map through the [`HeightMap`] trait; probing
//! and map construction happen elsewhere. [`GridHeightMap`] is the regular
//! grid the CLI loads from JSON.

use serde::{Deserialize, Serialize};

use super::Point2;
use crate::gcode::EngineError;

/// Read-only surface model queried during Z correction.
pub trait HeightMap {
    /// Z correction at work position (`x`, `y`).
    fn interpolate_height(&self, x: f64, y: f64) -> f64;
    /// Lower-left corner of the mapped area.
    fn min(&self) -> Point2;
    /// Upper-right corner of the mapped area.
    fn max(&self) -> Point2;
    /// Grid spacing. Moves are subdivided to this length before correction.
    fn cell_size(&self) -> f64;
}

/// On-disk JSON shape of a grid map, validated into [`GridHeightMap`].
#[derive(Debug, Deserialize)]
struct GridHeightMapFile {
    min: Point2,
    max: Point2,
    size_x: usize,
    size_y: usize,
    heights: Vec<f64>,
}

/// Regular grid of probed heights, stored row-major (`heights[iy * size_x + ix]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridHeightMapFile")]
pub struct GridHeightMap {
    min: Point2,
    max: Point2,
    size_x: usize,
    size_y: usize,
    heights: Vec<f64>,
}

impl TryFrom<GridHeightMapFile> for GridHeightMap {
    type Error = EngineError;

    fn try_from(file: GridHeightMapFile) -> Result<Self, Self::Error> {
        GridHeightMap::new(file.min, file.max, file.size_x, file.size_y, file.heights)
    }
}

impl GridHeightMap {
    pub fn new(
        min: Point2,
        max: Point2,
        size_x: usize,
        size_y: usize,
        heights: Vec<f64>,
    ) -> Result<Self, EngineError> {
        if size_x < 2 || size_y < 2 {
            return Err(EngineError::HeightMap(format!(
                "grid must be at least 2x2, got {size_x}x{size_y}"
            )));
        }
        let Some(count) = size_x.checked_mul(size_y) else {
            return Err(EngineError::HeightMap(format!(
                "grid of {size_x}x{size_y} points is too large"
            )));
        };
        if heights.len() != count {
            return Err(EngineError::HeightMap(format!(
                "expected {count} heights for a {size_x}x{size_y} grid, got {}",
                heights.len()
            )));
        }
        if max.x <= min.x || max.y <= min.y {
            return Err(EngineError::HeightMap(
                "max corner must lie above and right of min corner".to_string(),
            ));
        }
        if heights.iter().any(|h| !h.is_finite()) {
            return Err(EngineError::HeightMap("heights must be finite".to_string()));
        }
        Ok(Self {
            min,
            max,
            size_x,
            size_y,
            heights,
        })
    }

    /// Parse and validate a grid from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::HeightMap(e.to_string()))
    }

    /// Number of grid points along X and Y.
    pub fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    /// Distance between neighbouring grid points along X and Y.
    pub fn pitch(&self) -> Point2 {
        Point2::new(
            (self.max.x - self.min.x) / (self.size_x - 1) as f64,
            (self.max.y - self.min.y) / (self.size_y - 1) as f64,
        )
    }

    /// Probed height at grid point (`ix`, `iy`), if it exists.
    pub fn height(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.size_x || iy >= self.size_y {
            return None;
        }
        self.heights.get(iy * self.size_x + ix).copied()
    }

    /// Height at a grid point known to be in range.
    fn at(&self, ix: usize, iy: usize) -> f64 {
        self.heights[iy * self.size_x + ix]
    }

    /// Splits a coordinate into a cell index and the fraction inside that cell,
    /// clamped to the grid.
    fn locate(value: f64, origin: f64, pitch: f64, size: usize) -> (usize, f64) {
        let f = ((value - origin) / pitch).clamp(0.0, (size - 1) as f64);
        let cell = (f.floor() as usize).min(size - 2);
        (cell, f - cell as f64)
    }
}

impl HeightMap for GridHeightMap {
    fn interpolate_height(&self, x: f64, y: f64) -> f64 {
        let pitch = self.pitch();
        let (ix, tx) = Self::locate(x, self.min.x, pitch.x, self.size_x);
        let (iy, ty) = Self::locate(y, self.min.y, pitch.y, self.size_y);

        let h00 = self.at(ix, iy);
        let h10 = self.at(ix + 1, iy);
        let h01 = self.at(ix, iy + 1);
        let h11 = self.at(ix + 1, iy + 1);

        let bottom = h00 + (h10 - h00) * tx;
        let top = h01 + (h11 - h01) * tx;
        bottom + (top - bottom) * ty
    }

    fn min(&self) -> Point2 {
        self.min
    }

    fn max(&self) -> Point2 {
        self.max
    }

    fn cell_size(&self) -> f64 {
        let pitch = self.pitch();
        pitch.x.min(pitch.y)
    }
}
