//! Read-only machine inputs supplied per call: where the tool is, how the
//! work coordinate system is offset from machine zero, the travel limits and
//! the tool-change table.
//!
//! The engine never mutates a [`MachineSnapshot`]; callers replace it
//! wholesale when the controller reports a new position or offset.

use serde::{Deserialize, Serialize};

use super::Point3;

/// Measurement unit the program and the machine settings are expressed in.
///
/// Serialized as a snake_case string (`"millimeter"` or `"inch"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Millimeter,
    Inch,
}

impl Unit {
    /// Grid that viewer extents are rounded out to.
    pub fn extent_rounding(self) -> f64 {
        match self {
            Unit::Millimeter => 5.0,
            Unit::Inch => 0.25,
        }
    }

    /// Nominal size of a position marker (1 mm expressed in this unit).
    pub fn marker_size(self) -> f64 {
        match self {
            Unit::Millimeter => 1.0,
            Unit::Inch => 1.0 / 25.4,
        }
    }
}

/// Machine travel rectangle in machine coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelLimits {
    /// Machine X coordinate of the home position.
    pub home_x: f64,
    /// Machine Y coordinate of the home position.
    pub home_y: f64,
    /// Signed travel along X from home.
    pub range_x: f64,
    /// Signed travel along Y from home.
    pub range_y: f64,
}

/// One slot of the tool-change table, in machine coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSlot {
    pub x: f64,
    pub y: f64,
    pub id: i32,
    #[serde(default)]
    pub label: String,
}

/// Everything the engine needs to know about the machine at call time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSnapshot {
    pub unit: Unit,
    /// Current tool position in work coordinates; the start point of resolution.
    pub work_position: Point3,
    /// Work-coordinate offset: machine position = work position + offset.
    pub work_offset: Point3,
    pub limits: Option<TravelLimits>,
    pub tools: Vec<ToolSlot>,
}

impl MachineSnapshot {
    /// Parse a snapshot from TOML. All keys are optional.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Converts a machine-frame position into work coordinates.
    pub fn to_work(&self, machine: Point3) -> Point3 {
        machine - self.work_offset
    }

    /// Converts a work-frame position into machine coordinates.
    pub fn to_machine(&self, work: Point3) -> Point3 {
        work + self.work_offset
    }
}
