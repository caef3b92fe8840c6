//! Data definitions for stages and their contents. These are the
//! deserialized, validated-by-the-caller shapes; runtime state built
//! from them lives with the game, not here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};
use crate::objects::{HitShape, RegisteredObject};

/// Linear perspective model for a stage: sprites scale between
/// `scale_min` at `y_min` (far) and `scale_max` at `y_max` (near), and
/// vertical walking speed is damped by `y_damping`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveDef {
    pub y_min: f32,
    pub y_max: f32,
    pub scale_min: f32,
    pub scale_max: f32,
    #[serde(default = "default_damping")]
    pub y_damping: f32,
}

fn default_damping() -> f32 {
    1.0
}

impl PerspectiveDef {
    /// Sprite scale at scene-space `y`, clamped to the defined band.
    pub fn scale_for_y(&self, y: f32) -> f32 {
        if self.y_max <= self.y_min {
            return self.scale_max;
        }
        let t = ((y - self.y_min) / (self.y_max - self.y_min)).clamp(0.0, 1.0);
        self.scale_min + (self.scale_max - self.scale_min) * t
    }
}

/// An interactive prop placed in a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub id: String,
    pub name: String,
    /// Default pointer verb, e.g. "look", "take", "open".
    #[serde(default = "default_verb")]
    pub verb: String,
    pub hit_rect: Rect,
    /// Optional precise outline. When present it takes precedence over
    /// `hit_rect` for hit-testing.
    #[serde(default)]
    pub hit_polygon: Option<Vec<Vec2>>,
    /// Asset drawn for this object, if it has a visual at all.
    #[serde(default)]
    pub asset: Option<String>,
}

fn default_verb() -> String {
    "look".to_string()
}

impl ObjectDef {
    pub fn hit_shape(&self) -> HitShape {
        match &self.hit_polygon {
            Some(vertices) if vertices.len() >= 3 => {
                HitShape::Polygon(crate::geometry::Polygon::new(vertices.clone()))
            }
            _ => HitShape::Rect(self.hit_rect),
        }
    }

    pub fn to_registered(&self) -> RegisteredObject {
        RegisteredObject {
            id: self.id.clone(),
            name: self.name.clone(),
            verb: self.verb.clone(),
            shape: self.hit_shape(),
        }
    }
}

/// A character placed in a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDef {
    pub id: String,
    pub name: String,
    pub asset: String,
    pub spawn: Vec2,
    /// Where the player stands to talk to this character. Defaults to
    /// the spawn point.
    #[serde(default)]
    pub interaction_point: Option<Vec2>,
    /// Region this character may wander. `None` pins it in place
    /// within the stage walk area.
    #[serde(default)]
    pub walk_area: Option<Vec<Vec2>>,
}

/// A visual layered over the stage that can be shown and hidden, like
/// an opened door or a lit window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDef {
    pub id: String,
    pub asset: String,
    pub position: Vec2,
    pub proxy_y: f32,
    #[serde(default)]
    pub initially_visible: bool,
}

/// A walkable stage with its props, characters, and overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    pub id: String,
    pub background: String,
    /// Walkable region. Empty means the whole stage is walkable.
    #[serde(default)]
    pub walk_area: Vec<Vec2>,
    /// Where the player appears when no transition target says
    /// otherwise.
    pub spawn: Vec2,
    #[serde(default)]
    pub perspective: Option<PerspectiveDef>,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    #[serde(default)]
    pub npcs: Vec<NpcDef>,
    #[serde(default)]
    pub overlays: Vec<OverlayDef>,
    /// Hand-authored standing points, keyed by object id. Objects not
    /// listed here derive one from their hit shape.
    #[serde(default)]
    pub interaction_points: HashMap<String, Vec2>,
}

impl StageDef {
    pub fn object(&self, id: &str) -> Option<&ObjectDef> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn npc(&self, id: &str) -> Option<&NpcDef> {
        self.npcs.iter().find(|n| n.id == id)
    }

    pub fn damping(&self) -> f32 {
        self.perspective.as_ref().map_or(1.0, |p| p.y_damping)
    }
}

/// A doorway between stages, triggered by interacting with an object
/// in the source stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from_stage: String,
    /// Object id in the source stage that triggers this transition.
    pub trigger_object: String,
    pub to_stage: String,
    /// Where the player lands. `None` falls back to the destination
    /// stage's spawn point.
    #[serde(default)]
    pub target: Option<Vec2>,
    /// Overlay in the source stage that must be visible for the
    /// transition to fire, e.g. a door that has to be open first.
    #[serde(default)]
    pub requires_overlay: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_for_y_interpolates_and_clamps() {
        let perspective = PerspectiveDef {
            y_min: 100.0,
            y_max: 300.0,
            scale_min: 0.5,
            scale_max: 1.0,
            y_damping: 0.8,
        };
        assert_eq!(perspective.scale_for_y(100.0), 0.5);
        assert_eq!(perspective.scale_for_y(200.0), 0.75);
        assert_eq!(perspective.scale_for_y(300.0), 1.0);
        assert_eq!(perspective.scale_for_y(-50.0), 0.5);
        assert_eq!(perspective.scale_for_y(900.0), 1.0);
    }

    #[test]
    fn degenerate_perspective_band_uses_near_scale() {
        let perspective = PerspectiveDef {
            y_min: 200.0,
            y_max: 200.0,
            scale_min: 0.5,
            scale_max: 0.9,
            y_damping: 1.0,
        };
        assert_eq!(perspective.scale_for_y(200.0), 0.9);
    }

    #[test]
    fn object_hit_shape_prefers_a_usable_polygon() {
        let mut def = ObjectDef {
            id: "sign".to_string(),
            name: "Sign".to_string(),
            verb: "look".to_string(),
            hit_rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            hit_polygon: Some(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(20.0, 0.0),
                Vec2::new(10.0, 20.0),
            ]),
            asset: None,
        };
        assert!(matches!(def.hit_shape(), HitShape::Polygon(_)));
        // A degenerate outline falls back to the rectangle.
        def.hit_polygon = Some(vec![Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0)]);
        assert!(matches!(def.hit_shape(), HitShape::Rect(_)));
    }

    #[test]
    fn stage_def_deserializes_with_defaults() {
        let json = r#"{
            "id": "alley",
            "background": "bg/alley",
            "spawn": { "x": 40.0, "y": 300.0 },
            "objects": [
                {
                    "id": "crate",
                    "name": "Crate",
                    "hit_rect": { "position": { "x": 10.0, "y": 200.0 }, "width": 30.0, "height": 30.0 }
                }
            ]
        }"#;
        let stage: StageDef = serde_json::from_str(json).expect("stage parses");
        assert_eq!(stage.id, "alley");
        assert!(stage.walk_area.is_empty());
        assert!(stage.perspective.is_none());
        assert_eq!(stage.damping(), 1.0);
        let object = stage.object("crate").expect("crate is defined");
        assert_eq!(object.verb, "look");
        assert!(object.hit_polygon.is_none());
    }

    #[test]
    fn transition_def_deserializes_optional_fields() {
        let json = r#"{
            "from_stage": "street",
            "trigger_object": "door",
            "to_stage": "bar",
            "target": { "x": 863.0, "y": 628.0 },
            "requires_overlay": "door-open"
        }"#;
        let transition: TransitionDef = serde_json::from_str(json).expect("transition parses");
        assert_eq!(transition.target, Some(Vec2::new(863.0, 628.0)));
        assert_eq!(transition.requires_overlay.as_deref(), Some("door-open"));
    }
}
