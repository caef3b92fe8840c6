use serde::{Deserialize, Serialize};

/// A point or displacement in scene space. The Y axis grows downward,
/// so larger Y means closer to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn distance_to(&self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Component-wise linear interpolation, `t` in [0, 1].
    pub fn lerp(&self, target: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// Axis-aligned rectangle with `position` at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            position: Vec2::new(x, y),
            width,
            height,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.position.x
            && point.x <= self.position.x + self.width
            && point.y >= self.position.y
            && point.y <= self.position.y + self.height
    }

    /// Midpoint of the bottom edge. Characters stand here when they
    /// walk up to something occupying this rectangle.
    pub fn bottom_center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.width * 0.5,
            self.position.y + self.height,
        )
    }
}

/// Closed polygon in scene space. Vertices are stored in order; the
/// closing edge from last back to first is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Polygon { vertices }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Even-odd ray-cast containment test. A polygon with fewer than
    /// three vertices cannot bound any area, so it contains everything;
    /// callers that want "no polygon means unbounded" get that for free.
    pub fn contains(&self, point: Vec2) -> bool {
        if self.vertices.len() < 3 {
            return true;
        }
        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > point.y) != (b.y > point.y) {
                let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Tightest axis-aligned rectangle around the vertices, or `None`
    /// for an empty polygon.
    pub fn bounding_box(&self) -> Option<Rect> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        Some(Rect {
            position: min,
            width: max.x - min.x,
            height: max.y - min.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ])
    }

    #[test]
    fn polygon_contains_interior_point() {
        assert!(unit_square().contains(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn polygon_rejects_exterior_point() {
        assert!(!unit_square().contains(Vec2::new(15.0, 5.0)));
        assert!(!unit_square().contains(Vec2::new(5.0, -1.0)));
    }

    #[test]
    fn polygon_handles_concave_shapes() {
        // L-shape: the notch at the top right is outside.
        let l_shape = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(10.0, 5.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ]);
        assert!(l_shape.contains(Vec2::new(2.0, 2.0)));
        assert!(l_shape.contains(Vec2::new(8.0, 8.0)));
        assert!(!l_shape.contains(Vec2::new(8.0, 2.0)));
    }

    #[test]
    fn degenerate_polygon_contains_everything() {
        let empty = Polygon::new(Vec::new());
        let segment = Polygon::new(vec![Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0)]);
        assert!(empty.contains(Vec2::new(123.0, -456.0)));
        assert!(segment.contains(Vec2::new(123.0, -456.0)));
    }

    #[test]
    fn bounding_box_spans_all_vertices() {
        let bbox = unit_square()
            .bounding_box()
            .expect("square has a bounding box");
        assert_eq!(bbox.position, Vec2::new(0.0, 0.0));
        assert_eq!(bbox.width, 10.0);
        assert_eq!(bbox.height, 10.0);
        assert!(Polygon::new(Vec::new()).bounding_box().is_none());
    }

    #[test]
    fn rect_contains_is_inclusive_of_edges() {
        let rect = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert!(rect.contains(Vec2::new(2.0, 3.0)));
        assert!(rect.contains(Vec2::new(6.0, 8.0)));
        assert!(!rect.contains(Vec2::new(6.1, 8.0)));
        assert_eq!(rect.bottom_center(), Vec2::new(4.0, 8.0));
    }

    #[test]
    fn lerp_interpolates_both_axes() {
        let mid = Vec2::new(0.0, 10.0).lerp(Vec2::new(10.0, 30.0), 0.5);
        assert_eq!(mid, Vec2::new(5.0, 20.0));
    }
}
