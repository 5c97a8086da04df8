//! Running axis-aligned extents of a program.

use serde::Serialize;

use super::arcs::ArcGeometry;
use crate::models::Point2;

/// Min/max per axis. Starts empty; an empty axis reports zero extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }
}

impl BoundingBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// No XY point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include_xy(&mut self, p: Point2) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn include_z(&mut self, z: f64) {
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Adds both arc endpoints and every quadrant point (0°, 90°, 180°, 270°)
    /// the sweep passes through.
    pub fn include_arc(&mut self, arc: &ArcGeometry) {
        self.include_xy(arc.point_at(arc.start_angle));
        self.include_xy(arc.point_at(arc.end_angle()));
        for quadrant in [0.0, 90.0, 180.0, 270.0] {
            if arc.contains_angle(quadrant) {
                self.include_xy(arc.point_at(quadrant));
            }
        }
    }

    /// Lower-left XY corner, or the origin when empty.
    pub fn min(&self) -> Point2 {
        if self.is_empty() {
            Point2::default()
        } else {
            Point2::new(self.min_x, self.min_y)
        }
    }

    /// Upper-right XY corner, or the origin when empty.
    pub fn max(&self) -> Point2 {
        if self.is_empty() {
            Point2::default()
        } else {
            Point2::new(self.max_x, self.max_y)
        }
    }

    /// Width and height.
    pub fn dimensions(&self) -> Point2 {
        self.max() - self.min()
    }

    pub fn center(&self) -> Point2 {
        let (min, max) = (self.min(), self.max());
        Point2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0)
    }

    /// Z range, or `None` when no line carried Z.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        (self.min_z <= self.max_z).then_some((self.min_z, self.max_z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn empty_box_reports_origin() {
        let b = BoundingBox::new();
        assert!(b.is_empty());
        assert_eq!(b.min(), Point2::default());
        assert_eq!(b.dimensions(), Point2::default());
        assert_eq!(b.z_range(), None);
    }

    #[test]
    fn points_grow_the_box() {
        let mut b = BoundingBox::new();
        b.include_xy(p(1.0, -2.0));
        b.include_xy(p(-3.0, 4.0));
        b.include_z(-1.0);
        assert_eq!(b.min(), p(-3.0, -2.0));
        assert_eq!(b.max(), p(1.0, 4.0));
        assert_eq!(b.center(), p(-1.0, 1.0));
        assert_eq!(b.z_range(), Some((-1.0, -1.0)));
    }

    #[test]
    fn arc_bulge_past_its_endpoints_is_included() {
        // G2 from (10,0) to (10,10) around (10,5) bulges left to x=5
        let arc = ArcGeometry::from_offsets(p(10.0, 0.0), p(10.0, 10.0), 0.0, 5.0, true);
        let mut b = BoundingBox::new();
        b.include_arc(&arc);
        assert_abs_diff_eq!(b.min_x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.max_x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.min_y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.max_y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn opposite_winding_bulges_the_other_way() {
        let arc = ArcGeometry::from_offsets(p(10.0, 0.0), p(10.0, 10.0), 0.0, 5.0, false);
        let mut b = BoundingBox::new();
        b.include_arc(&arc);
        assert_abs_diff_eq!(b.max_x, 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.min_x, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn full_circle_covers_all_quadrants() {
        let arc = ArcGeometry::from_offsets(p(2.0, 0.0), p(2.0, 0.0), -2.0, 0.0, false);
        let mut b = BoundingBox::new();
        b.include_arc(&arc);
        assert_abs_diff_eq!(b.min_x, -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.max_y, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.min_y, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn small_arc_away_from_quadrants_uses_endpoints_only() {
        // 30° -> 60° on a unit circle
        let start = p(30f64.to_radians().cos(), 30f64.to_radians().sin());
        let end = p(60f64.to_radians().cos(), 60f64.to_radians().sin());
        let arc = ArcGeometry::from_offsets(start, end, -start.x, -start.y, false);
        let mut b = BoundingBox::new();
        b.include_arc(&arc);
        assert_abs_diff_eq!(b.max_x, start.x, epsilon = 1e-9);
        assert_abs_diff_eq!(b.max_y, end.y, epsilon = 1e-9);
    }
}
