fn polygon_from_vertices(vertices: &[Vec2]) -> Option<Polygon> {
    if vertices.len() < 3 {
        return None;
    }
    Some(Polygon::new(vertices.to_vec()))
}

fn npc_hit_rect(position: Vec2) -> Rect {
    Rect::new(
        position.x - NPC_HIT_WIDTH * 0.5,
        position.y - NPC_HIT_HEIGHT,
        NPC_HIT_WIDTH,
        NPC_HIT_HEIGHT,
    )
}

fn depth_id_for_object(object_id: &str) -> String {
    format!("object:{object_id}")
}

fn depth_id_for_npc(npc_id: &str) -> String {
    format!("npc:{npc_id}")
}

fn depth_id_for_overlay(overlay_id: &str) -> String {
    format!("overlay:{overlay_id}")
}

/// Where the player should stand to use `object`: the stage's
/// hand-authored point if one exists, otherwise the bottom center of
/// the hit shape.
fn standing_point_for(stage: &StageDef, object: &RegisteredObject) -> Option<Vec2> {
    if let Some(point) = stage.interaction_points.get(&object.id) {
        return Some(*point);
    }
    object.shape.bounding_box().map(|b| b.bottom_center())
}

/// Fallback line for objects with no scripted behavior.
fn canned_response(verb: &str, name: &str) -> String {
    match verb {
        "look" => format!("It's {name}."),
        "open" => format!("{name} won't budge."),
        "use" => format!("{name} doesn't do anything."),
        _ => "Nothing happens.".to_string(),
    }
}

/// Fallback line for characters with nothing to say right now.
fn idle_chatter(name: &str) -> String {
    format!("{name} has nothing to say.")
}
