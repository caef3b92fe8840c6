//! Headless scripted session: loads the first stage of a catalog and
//! pokes everything in it, logging what the scene reports. Useful for
//! smoke-testing a catalog without a frontend.

use scenekit::{AssetLibrary, Vec2};
use tracing::info;

use crate::app::gameplay::{AdventureCatalog, AdventureScene, SceneEvent, PLAYER_ASSET_KEY};

const TICK_SECONDS: f32 = 1.0 / 60.0;
const MAX_SETTLE_TICKS: u32 = 3_600;

pub(crate) fn run_demo_session(catalog: AdventureCatalog) -> Result<(), String> {
    let assets = AssetLibrary::from_keys(
        catalog
            .asset_keys()
            .into_iter()
            .chain([PLAYER_ASSET_KEY.to_string()]),
    );
    let stage_id = catalog
        .stage_ids()
        .first()
        .cloned()
        .ok_or_else(|| "catalog has no stages".to_string())?;
    let mut scene = AdventureScene::new(catalog, assets);
    if !scene.start_in(&stage_id) {
        return Err(format!("could not load stage '{stage_id}'"));
    }
    settle(&mut scene)?;

    // Open every overlay first so gated doorways are passable.
    for overlay_id in scene.runtime().overlay_ids() {
        scene.toggle_overlay(&overlay_id);
    }
    settle(&mut scene)?;

    let object_ids: Vec<String> = scene
        .runtime()
        .objects()
        .iter()
        .map(|o| o.id.clone())
        .collect();
    for object_id in object_ids {
        // A doorway click may have moved us to another stage already.
        let Some(point) = hit_center(&scene, &object_id, false) else {
            continue;
        };
        let hovered = scene.update_hover(point);
        info!(object = %object_id, hovered = ?hovered, "demo_click_object");
        scene.handle_click(point);
        settle(&mut scene)?;
    }

    let npc_ids: Vec<String> = scene
        .runtime()
        .npc_index()
        .iter()
        .map(|n| n.id.clone())
        .collect();
    for npc_id in npc_ids {
        let Some(point) = hit_center(&scene, &npc_id, true) else {
            continue;
        };
        info!(npc = %npc_id, "demo_click_npc");
        scene.handle_click(point);
        settle(&mut scene)?;
        // Always take the first offered reply until the talk is over.
        while scene.is_dialogue_active() {
            let responses = scene.available_responses();
            match responses.first() {
                Some(response) => {
                    info!(response = %response.id, "demo_pick_response");
                    scene.choose_response(&response.id);
                }
                None => scene.end_dialogue(),
            }
            settle(&mut scene)?;
        }
    }

    info!(
        stage = scene.current_stage().unwrap_or("<none>"),
        inventory = scene.inventory().len(),
        "demo_session_complete"
    );
    Ok(())
}

fn hit_center(scene: &AdventureScene, id: &str, npc: bool) -> Option<Vec2> {
    let index = if npc {
        scene.runtime().npc_index()
    } else {
        scene.runtime().objects()
    };
    let bbox = index.get(id)?.shape.bounding_box()?;
    Some(Vec2::new(
        bbox.position.x + bbox.width * 0.5,
        bbox.position.y + bbox.height * 0.5,
    ))
}

/// Tick until the player is idle and a tick passes without events.
fn settle(scene: &mut AdventureScene) -> Result<(), String> {
    for _ in 0..MAX_SETTLE_TICKS {
        let events = scene.tick(TICK_SECONDS);
        for event in &events {
            log_event(event);
        }
        if !scene.player().is_moving() && events.is_empty() {
            return Ok(());
        }
    }
    Err("demo session stalled waiting for the scene to settle".to_string())
}

fn log_event(event: &SceneEvent) {
    match event {
        SceneEvent::MoveRejected { target } => {
            info!(x = target.x, y = target.y, "move_rejected");
        }
        SceneEvent::ArrivedAt { position } => {
            info!(x = position.x, y = position.y, "arrived");
        }
        SceneEvent::ObjectResponse { object_id, line } => {
            info!(object = %object_id, line = %line, "object_response");
        }
        SceneEvent::NpcChatter { npc_id, line } => {
            info!(npc = %npc_id, line = %line, "npc_chatter");
        }
        SceneEvent::DialogueStarted {
            participant_id,
            line,
        } => {
            info!(participant = %participant_id, line = %line, "dialogue_started");
        }
        SceneEvent::DialogueLine {
            participant_id,
            line,
        } => {
            info!(participant = %participant_id, line = %line, "dialogue_line");
        }
        SceneEvent::DialogueEnded { participant_id } => {
            info!(participant = %participant_id, "dialogue_ended");
        }
        SceneEvent::TransitionCompleted { stage_id, position } => {
            info!(stage = %stage_id, x = position.x, y = position.y, "transitioned");
        }
        SceneEvent::TransitionBlocked { trigger_object_id } => {
            info!(trigger = %trigger_object_id, "transition_blocked");
        }
        SceneEvent::TransitionFailed { stage_id } => {
            info!(stage = %stage_id, "transition_failed");
        }
        SceneEvent::ItemTaken {
            stage_id,
            object_id,
        } => {
            info!(stage = %stage_id, object = %object_id, "item_taken");
        }
        SceneEvent::OverlayToggled {
            overlay_id,
            visible,
        } => {
            info!(overlay = %overlay_id, visible = visible, "overlay_toggled");
        }
    }
}
