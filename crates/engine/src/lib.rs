//! Scene-simulation toolkit for point-and-click adventures: geometry
//! and walkability, point-to-point character movement, Y-sorted draw
//! order, and pointer-facing object indexing. Everything here is
//! renderer-agnostic; drawing is somebody else's job.

pub mod assets;
pub mod defs;
pub mod depth;
pub mod geometry;
pub mod movement;
pub mod objects;

pub use assets::{AssetError, AssetHandle, AssetLibrary};
pub use defs::{NpcDef, ObjectDef, OverlayDef, PerspectiveDef, StageDef, TransitionDef};
pub use depth::{
    DepthCategory, DepthEntry, DepthSorter, Visual, VisualId, VisualStore, DEPTH_DIRTY_THRESHOLD,
};
pub use geometry::{Polygon, Rect, Vec2};
pub use movement::{
    clamp_damping, Facing, MoveState, Mover, MoverTick, ARRIVAL_EPSILON_UNITS, DAMPING_FLOOR,
};
pub use objects::{HitShape, ObjectIndex, RegisteredObject};
