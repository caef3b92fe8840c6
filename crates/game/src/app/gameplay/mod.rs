use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use scenekit::{
    AssetLibrary, DepthCategory, DepthSorter, HitShape, Mover, NpcDef, ObjectDef, ObjectIndex,
    OverlayDef, PerspectiveDef, Polygon, Rect, RegisteredObject, StageDef, TransitionDef, Vec2,
    Visual, VisualId, VisualStore,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const PLAYER_BASE_SPEED_UNITS: f32 = 180.0;
const NPC_BASE_SPEED_UNITS: f32 = 140.0;
const SPEECH_LINE_SECONDS: f32 = 3.0;
const NPC_HIT_WIDTH: f32 = 60.0;
const NPC_HIT_HEIGHT: f32 = 120.0;
const PLAYER_DEPTH_ID: &str = "player";
pub(crate) const PLAYER_ASSET_KEY: &str = "chars/player";

include!("types.rs");
include!("catalog.rs");
include!("dialogue.rs");
include!("director.rs");
include!("scene_state.rs");
include!("util.rs");
