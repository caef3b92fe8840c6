/// Outcome of a transition request, reported regardless of success so
/// the caller always learns where things landed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub success: bool,
    pub stage: Option<String>,
    pub character_position: Option<Vec2>,
}

impl TransitionResult {
    fn failure() -> Self {
        TransitionResult {
            success: false,
            stage: None,
            character_position: None,
        }
    }
}

/// Gate check for an interaction that might be a doorway.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionGate {
    /// No transition is keyed to this trigger; treat the interaction
    /// as a plain object use.
    NotFound,
    /// A transition exists but its overlay requirement is not met.
    Blocked,
    Ready(TransitionDef),
}

/// Owns which stage is live and what has permanently left the world.
/// Removed objects are tracked per stage and never come back, so a
/// picked-up key stays gone across any number of reloads.
#[derive(Debug)]
pub struct StageDirector {
    catalog: AdventureCatalog,
    removed_by_stage: HashMap<String, HashSet<String>>,
    current_stage: Option<String>,
}

impl StageDirector {
    pub fn new(catalog: AdventureCatalog) -> Self {
        StageDirector {
            catalog,
            removed_by_stage: HashMap::new(),
            current_stage: None,
        }
    }

    pub fn catalog(&self) -> &AdventureCatalog {
        &self.catalog
    }

    pub fn current_stage(&self) -> Option<&str> {
        self.current_stage.as_deref()
    }

    pub fn current_stage_def(&self) -> Option<&StageDef> {
        self.catalog.stage(self.current_stage.as_deref()?)
    }

    pub fn mark_removed(&mut self, stage_id: &str, object_id: &str) {
        info!(stage = stage_id, object = object_id, "object_marked_removed");
        self.removed_by_stage
            .entry(stage_id.to_string())
            .or_default()
            .insert(object_id.to_string());
    }

    pub fn is_removed(&self, stage_id: &str, object_id: &str) -> bool {
        self.removed_by_stage
            .get(stage_id)
            .is_some_and(|set| set.contains(object_id))
    }

    pub fn find_transition(&self, trigger_object: &str) -> Option<&TransitionDef> {
        self.catalog
            .transition(self.current_stage.as_deref()?, trigger_object)
    }

    /// Check whether using `trigger_object` in the current stage should
    /// change stages, without performing the change.
    pub fn check_gate(&self, trigger_object: &str, overlays: &HashMap<String, OverlayState>) -> TransitionGate {
        let Some(transition) = self.find_transition(trigger_object) else {
            return TransitionGate::NotFound;
        };
        if let Some(required) = &transition.requires_overlay {
            let visible = overlays.get(required).is_some_and(|o| o.visible);
            if !visible {
                debug!(
                    trigger = trigger_object,
                    overlay = %required,
                    "transition_gate_blocked"
                );
                return TransitionGate::Blocked;
            }
        }
        TransitionGate::Ready(transition.clone())
    }

    /// Tear down whatever stage is live and bring up `stage_id`.
    /// Teardown happens first, so a failed load leaves no stage live
    /// rather than a half-stale one.
    pub fn load_stage(&mut self, stage_id: &str, runtime: &mut StageRuntime) -> bool {
        runtime.teardown();
        self.current_stage = None;
        let Some(stage) = self.catalog.stage(stage_id) else {
            warn!(stage = stage_id, "load_stage_unknown_id");
            return false;
        };
        if !runtime.instantiate(stage, &self.removed_by_stage) {
            warn!(stage = stage_id, "load_stage_instantiation_failed");
            return false;
        }
        self.current_stage = Some(stage_id.to_string());
        info!(
            stage = stage_id,
            objects = runtime.objects.len(),
            npcs = runtime.npcs.len(),
            overlays = runtime.overlays.len(),
            "stage_loaded"
        );
        true
    }

    /// Swap to `to_stage` and place the player at `target`, or at the
    /// destination's spawn point when no target is given.
    pub fn transition_to(
        &mut self,
        to_stage: &str,
        target: Option<Vec2>,
        runtime: &mut StageRuntime,
        player: &mut Mover,
    ) -> TransitionResult {
        if !self.load_stage(to_stage, runtime) {
            return TransitionResult::failure();
        }
        // load_stage just validated the id.
        let Some(stage) = self.catalog.stage(to_stage) else {
            return TransitionResult::failure();
        };
        let position = target.unwrap_or(stage.spawn);
        player.set_position(position);
        player.set_walk_area(polygon_from_vertices(&stage.walk_area));
        player.set_damping(stage.damping());
        runtime.place_player(position);
        runtime.depth.force_resort(&runtime.visuals);
        info!(
            stage = to_stage,
            x = position.x,
            y = position.y,
            "transition_completed"
        );
        TransitionResult {
            success: true,
            stage: Some(to_stage.to_string()),
            character_position: Some(position),
        }
    }
}
