use tracing::debug;

use crate::geometry::{Polygon, Rect, Vec2};

/// Clickable region for an interactive object. Polygon shapes allow
/// non-rectangular props like angled signage.
#[derive(Debug, Clone, PartialEq)]
pub enum HitShape {
    Rect(Rect),
    Polygon(Polygon),
}

impl HitShape {
    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            HitShape::Rect(rect) => rect.contains(point),
            HitShape::Polygon(polygon) => polygon.contains(point),
        }
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            HitShape::Rect(rect) => Some(*rect),
            HitShape::Polygon(polygon) => polygon.bounding_box(),
        }
    }
}

/// One interactive thing in the current stage, as the pointer sees it.
#[derive(Debug, Clone)]
pub struct RegisteredObject {
    pub id: String,
    pub name: String,
    pub verb: String,
    pub shape: HitShape,
}

/// Pointer-facing index of interactive regions. Registration order is
/// kept so the most recently registered object wins overlapping hits,
/// mirroring the painter's order of things placed later on top.
#[derive(Debug, Default)]
pub struct ObjectIndex {
    objects: Vec<RegisteredObject>,
    hovered: Option<String>,
}

impl ObjectIndex {
    pub fn new() -> Self {
        ObjectIndex::default()
    }

    /// Register an object. A duplicate id replaces the earlier entry
    /// and takes its place at the top of the hit order.
    pub fn register(&mut self, object: RegisteredObject) {
        if let Some(index) = self.objects.iter().position(|o| o.id == object.id) {
            debug!(id = %object.id, "object_reregistered");
            self.objects.remove(index);
        }
        self.objects.push(object);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id == id) else {
            return false;
        };
        self.objects.remove(index);
        if self.hovered.as_deref() == Some(id) {
            self.hovered = None;
        }
        true
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Topmost object containing `point`, or `None` over bare ground.
    pub fn hit_test(&self, point: Vec2) -> Option<&RegisteredObject> {
        self.objects.iter().rev().find(|o| o.shape.contains(point))
    }

    /// Recompute the hover state for the pointer at `point`. At most
    /// one object is hovered at a time; moving off it clears the state.
    /// Returns the currently hovered id.
    pub fn update_hover(&mut self, point: Vec2) -> Option<&str> {
        self.hovered = self.hit_test(point).map(|o| o.id.clone());
        self.hovered.as_deref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredObject> {
        self.objects.iter()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.hovered = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_object(id: &str, x: f32, y: f32, w: f32, h: f32) -> RegisteredObject {
        RegisteredObject {
            id: id.to_string(),
            name: id.to_string(),
            verb: "look".to_string(),
            shape: HitShape::Rect(Rect::new(x, y, w, h)),
        }
    }

    #[test]
    fn hit_test_prefers_most_recently_registered() {
        let mut index = ObjectIndex::new();
        index.register(rect_object("below", 0.0, 0.0, 100.0, 100.0));
        index.register(rect_object("above", 40.0, 40.0, 100.0, 100.0));
        let hit = index
            .hit_test(Vec2::new(60.0, 60.0))
            .expect("overlap is covered by both");
        assert_eq!(hit.id, "above");
        let hit = index
            .hit_test(Vec2::new(10.0, 10.0))
            .expect("corner only in the lower object");
        assert_eq!(hit.id, "below");
    }

    #[test]
    fn hit_test_misses_bare_ground() {
        let mut index = ObjectIndex::new();
        index.register(rect_object("door", 0.0, 0.0, 10.0, 10.0));
        assert!(index.hit_test(Vec2::new(50.0, 50.0)).is_none());
    }

    #[test]
    fn polygon_shapes_hit_test_by_containment() {
        let mut index = ObjectIndex::new();
        index.register(RegisteredObject {
            id: "sign".to_string(),
            name: "Neon Sign".to_string(),
            verb: "look".to_string(),
            shape: HitShape::Polygon(Polygon::new(vec![
                Vec2::new(0.0, 10.0),
                Vec2::new(10.0, 0.0),
                Vec2::new(20.0, 10.0),
            ])),
        });
        assert!(index.hit_test(Vec2::new(10.0, 8.0)).is_some());
        assert!(index.hit_test(Vec2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn hover_is_exclusive_and_clears_off_object() {
        let mut index = ObjectIndex::new();
        index.register(rect_object("a", 0.0, 0.0, 10.0, 10.0));
        index.register(rect_object("b", 20.0, 0.0, 10.0, 10.0));
        assert_eq!(index.update_hover(Vec2::new(5.0, 5.0)), Some("a"));
        assert_eq!(index.update_hover(Vec2::new(25.0, 5.0)), Some("b"));
        assert_eq!(index.hovered(), Some("b"));
        assert_eq!(index.update_hover(Vec2::new(100.0, 100.0)), None);
        assert_eq!(index.hovered(), None);
    }

    #[test]
    fn removing_the_hovered_object_clears_hover() {
        let mut index = ObjectIndex::new();
        index.register(rect_object("key", 0.0, 0.0, 10.0, 10.0));
        index.update_hover(Vec2::new(5.0, 5.0));
        assert!(index.remove("key"));
        assert_eq!(index.hovered(), None);
        assert!(!index.remove("key"));
    }

    #[test]
    fn duplicate_id_replaces_and_moves_to_top() {
        let mut index = ObjectIndex::new();
        index.register(rect_object("door", 0.0, 0.0, 10.0, 10.0));
        index.register(rect_object("rug", 0.0, 0.0, 10.0, 10.0));
        index.register(rect_object("door", 0.0, 0.0, 10.0, 10.0));
        assert_eq!(index.len(), 2);
        let hit = index
            .hit_test(Vec2::new(5.0, 5.0))
            .expect("point inside both");
        assert_eq!(hit.id, "door");
    }
}
