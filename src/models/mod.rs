pub mod height_map;
pub mod machine;
pub mod point;

pub use height_map::{GridHeightMap, HeightMap};
pub use machine::{MachineSnapshot, ToolSlot, TravelLimits, Unit};
pub use point::{Point2, Point3};
