/// A placed character in the live stage.
#[derive(Debug)]
pub struct NpcRuntime {
    pub name: String,
    pub mover: Mover,
    pub interaction_point: Option<Vec2>,
    visual: Option<VisualId>,
}

/// A stage overlay in the live stage. `visible` is what the gate check
/// and any renderer consult; the depth entry exists either way.
#[derive(Debug)]
pub struct OverlayState {
    pub visible: bool,
    visual: Option<VisualId>,
}

/// Everything instantiated for the stage currently on screen. Torn
/// down wholesale on every stage change; durable state lives on the
/// director and the session.
#[derive(Debug)]
pub struct StageRuntime {
    assets: AssetLibrary,
    visuals: VisualStore,
    depth: DepthSorter,
    objects: ObjectIndex,
    npc_index: ObjectIndex,
    npcs: HashMap<String, NpcRuntime>,
    overlays: HashMap<String, OverlayState>,
    background: Option<VisualId>,
    player_visual: Option<VisualId>,
}

impl StageRuntime {
    pub fn new(assets: AssetLibrary) -> Self {
        StageRuntime {
            assets,
            visuals: VisualStore::new(),
            depth: DepthSorter::new(),
            objects: ObjectIndex::new(),
            npc_index: ObjectIndex::new(),
            npcs: HashMap::new(),
            overlays: HashMap::new(),
            background: None,
            player_visual: None,
        }
    }

    pub fn depth(&self) -> &DepthSorter {
        &self.depth
    }

    pub fn objects(&self) -> &ObjectIndex {
        &self.objects
    }

    pub fn npc_index(&self) -> &ObjectIndex {
        &self.npc_index
    }

    pub fn overlay_visible(&self, overlay_id: &str) -> Option<bool> {
        self.overlays.get(overlay_id).map(|o| o.visible)
    }

    pub fn overlay_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.overlays.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn teardown(&mut self) {
        self.depth.clear(&mut self.visuals);
        if let Some(background) = self.background.take() {
            self.visuals.remove(background);
        }
        self.visuals.clear();
        self.objects.clear();
        self.npc_index.clear();
        self.npcs.clear();
        self.overlays.clear();
        self.player_visual = None;
    }

    fn instantiate(
        &mut self,
        stage: &StageDef,
        removed_by_stage: &HashMap<String, HashSet<String>>,
    ) -> bool {
        if let Err(error) = self.assets.require(&stage.background) {
            warn!(error = %error, "stage_background_unresolved");
            return false;
        }
        self.background = Some(self.visuals.insert(Visual {
            asset: stage.background.clone(),
            position: Vec2::ZERO,
        }));
        let removed = removed_by_stage.get(&stage.id);
        let stage_walk = polygon_from_vertices(&stage.walk_area);
        for object in &stage.objects {
            if removed.is_some_and(|set| set.contains(&object.id)) {
                debug!(object = %object.id, "object_skipped_removed");
                continue;
            }
            self.objects.register(object.to_registered());
            let Some(asset) = &object.asset else {
                continue;
            };
            if !self.assets.contains(asset) {
                warn!(object = %object.id, asset = %asset, "object_asset_unresolved");
                continue;
            }
            let position = object.hit_rect.position;
            let visual = self.visuals.insert(Visual {
                asset: asset.clone(),
                position,
            });
            let proxy_y = object
                .hit_shape()
                .bounding_box()
                .map_or(position.y, |b| b.position.y + b.height);
            self.depth.register(
                &depth_id_for_object(&object.id),
                proxy_y,
                DepthCategory::Object,
                visual,
            );
        }
        for npc in &stage.npcs {
            let mut mover = Mover::new(npc.spawn, NPC_BASE_SPEED_UNITS);
            mover.set_walk_area(
                npc.walk_area
                    .as_deref()
                    .and_then(polygon_from_vertices)
                    .or_else(|| stage_walk.clone()),
            );
            mover.set_damping(stage.damping());
            let visual = if self.assets.contains(&npc.asset) {
                let visual = self.visuals.insert(Visual {
                    asset: npc.asset.clone(),
                    position: npc.spawn,
                });
                self.depth.register(
                    &depth_id_for_npc(&npc.id),
                    npc.spawn.y,
                    DepthCategory::Npc,
                    visual,
                );
                Some(visual)
            } else {
                warn!(npc = %npc.id, asset = %npc.asset, "npc_asset_unresolved");
                None
            };
            self.npc_index.register(RegisteredObject {
                id: npc.id.clone(),
                name: npc.name.clone(),
                verb: "talk".to_string(),
                shape: HitShape::Rect(npc_hit_rect(npc.spawn)),
            });
            self.npcs.insert(
                npc.id.clone(),
                NpcRuntime {
                    name: npc.name.clone(),
                    mover,
                    interaction_point: npc.interaction_point,
                    visual,
                },
            );
        }
        for overlay in &stage.overlays {
            let visual = if self.assets.contains(&overlay.asset) {
                let visual = self.visuals.insert(Visual {
                    asset: overlay.asset.clone(),
                    position: overlay.position,
                });
                self.depth.register(
                    &depth_id_for_overlay(&overlay.id),
                    overlay.proxy_y,
                    DepthCategory::Overlay,
                    visual,
                );
                Some(visual)
            } else {
                warn!(overlay = %overlay.id, asset = %overlay.asset, "overlay_asset_unresolved");
                None
            };
            self.overlays.insert(
                overlay.id.clone(),
                OverlayState {
                    visible: overlay.initially_visible,
                    visual,
                },
            );
        }
        true
    }

    fn place_player(&mut self, position: Vec2) {
        if let Some(visual) = self.player_visual {
            if let Some(stored) = self.visuals.get_mut(visual) {
                stored.position = position;
                self.depth.update_position(PLAYER_DEPTH_ID, position.y);
                return;
            }
        }
        if !self.assets.contains(PLAYER_ASSET_KEY) {
            warn!(asset = PLAYER_ASSET_KEY, "player_asset_unresolved");
            return;
        }
        let visual = self.visuals.insert(Visual {
            asset: PLAYER_ASSET_KEY.to_string(),
            position,
        });
        self.depth
            .register(PLAYER_DEPTH_ID, position.y, DepthCategory::Character, visual);
        self.player_visual = Some(visual);
    }

    fn move_npc_bookkeeping(&mut self, npc_id: &str) {
        let Some(npc) = self.npcs.get(npc_id) else {
            return;
        };
        let position = npc.mover.position();
        if let Some(visual) = npc.visual {
            if let Some(stored) = self.visuals.get_mut(visual) {
                stored.position = position;
            }
        }
        self.depth
            .update_position(&depth_id_for_npc(npc_id), position.y);
        let name = npc.name.clone();
        self.npc_index.register(RegisteredObject {
            id: npc_id.to_string(),
            name,
            verb: "talk".to_string(),
            shape: HitShape::Rect(npc_hit_rect(position)),
        });
    }
}

/// One running adventure: the live stage plus everything that survives
/// stage changes. All mutation funnels through `handle_click`,
/// `choose_response`, and `tick`; a frontend only ever reads.
#[derive(Debug)]
pub struct AdventureScene {
    director: StageDirector,
    runtime: StageRuntime,
    player: Mover,
    session: SessionContext,
    inventory: HashSet<String>,
    dialogue: DialogueEngine,
    pending_action: Option<PendingAction>,
    queued_transition: Option<QueuedTransition>,
    speech: Option<SpeechLine>,
    events: SceneEventQueue,
}

impl AdventureScene {
    pub fn new(catalog: AdventureCatalog, assets: AssetLibrary) -> Self {
        let dialogue = DialogueEngine::new(catalog.dialogue_trees().clone());
        AdventureScene {
            director: StageDirector::new(catalog),
            runtime: StageRuntime::new(assets),
            player: Mover::new(Vec2::ZERO, PLAYER_BASE_SPEED_UNITS),
            session: SessionContext::new(),
            inventory: HashSet::new(),
            dialogue,
            pending_action: None,
            queued_transition: None,
            speech: None,
            events: SceneEventQueue::default(),
        }
    }

    /// Load the opening stage. Emits the same completion event a
    /// doorway transition would.
    pub fn start_in(&mut self, stage_id: &str) -> bool {
        let result =
            self.director
                .transition_to(stage_id, None, &mut self.runtime, &mut self.player);
        match (&result.stage, result.character_position) {
            (Some(stage), Some(position)) if result.success => {
                self.events.emit(SceneEvent::TransitionCompleted {
                    stage_id: stage.clone(),
                    position,
                });
                true
            }
            _ => {
                self.events.emit(SceneEvent::TransitionFailed {
                    stage_id: stage_id.to_string(),
                });
                false
            }
        }
    }

    pub fn current_stage(&self) -> Option<&str> {
        self.director.current_stage()
    }

    pub fn player(&self) -> &Mover {
        &self.player
    }

    pub fn inventory(&self) -> &HashSet<String> {
        &self.inventory
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn runtime(&self) -> &StageRuntime {
        &self.runtime
    }

    pub fn director(&self) -> &StageDirector {
        &self.director
    }

    pub fn dialogue_phase(&self) -> DialoguePhase {
        self.dialogue.phase()
    }

    pub fn is_dialogue_active(&self) -> bool {
        self.dialogue.is_active()
    }

    /// Line currently shown above a character, as (speaker, text).
    pub fn speech_line(&self) -> Option<(&str, &str)> {
        self.speech
            .as_ref()
            .map(|s| (s.participant_id.as_str(), s.text.as_str()))
    }

    /// Route a pointer click. Characters win over objects when both
    /// are under the pointer; bare ground is a plain walk. Clicks are
    /// ignored while a conversation is running.
    pub fn handle_click(&mut self, point: Vec2) {
        if self.dialogue.is_active() {
            debug!("click_ignored_during_dialogue");
            return;
        }
        if let Some(npc) = self.runtime.npc_index.hit_test(point) {
            let npc_id = npc.id.clone();
            let destination = self
                .runtime
                .npcs
                .get(&npc_id)
                .map(|n| n.interaction_point.unwrap_or(n.mover.position()))
                .unwrap_or(point);
            if self.player.move_to(destination) {
                self.set_pending(PendingAction::TalkTo { npc_id });
            } else {
                self.events
                    .emit(SceneEvent::MoveRejected { target: destination });
            }
            return;
        }
        if let Some(object) = self.runtime.objects.hit_test(point) {
            let object_id = object.id.clone();
            let destination = self.standing_point(&object_id).unwrap_or(point);
            if self.player.move_to(destination) {
                self.set_pending(PendingAction::UseObject { object_id });
            } else {
                self.events
                    .emit(SceneEvent::MoveRejected { target: destination });
            }
            return;
        }
        if self.player.move_to(point) {
            // A plain walk forgets whatever interaction was queued.
            self.pending_action = None;
        } else {
            self.events.emit(SceneEvent::MoveRejected { target: point });
        }
    }

    /// Recompute hover for the pointer at `point`. Characters take
    /// priority over objects, matching click routing.
    pub fn update_hover(&mut self, point: Vec2) -> Option<String> {
        if self.runtime.npc_index.hit_test(point).is_some() {
            self.runtime.objects.clear_hover();
            return self.runtime.npc_index.update_hover(point).map(str::to_string);
        }
        self.runtime.npc_index.clear_hover();
        self.runtime.objects.update_hover(point).map(str::to_string)
    }

    pub fn toggle_overlay(&mut self, overlay_id: &str) -> bool {
        let Some(overlay) = self.runtime.overlays.get_mut(overlay_id) else {
            warn!(overlay = overlay_id, "toggle_overlay_unknown_id");
            return false;
        };
        overlay.visible = !overlay.visible;
        debug!(
            overlay = overlay_id,
            visible = overlay.visible,
            has_visual = overlay.visual.is_some(),
            "overlay_toggled"
        );
        self.events.emit(SceneEvent::OverlayToggled {
            overlay_id: overlay_id.to_string(),
            visible: overlay.visible,
        });
        true
    }

    /// Queue a stage change for the end of the current tick. Refused
    /// while another change is already queued.
    pub fn request_transition(&mut self, to_stage: &str, target: Option<Vec2>) -> bool {
        if self.queued_transition.is_some() {
            warn!(stage = to_stage, "transition_already_in_flight");
            return false;
        }
        self.queued_transition = Some(QueuedTransition {
            to_stage: to_stage.to_string(),
            target,
        });
        true
    }

    /// Walk a placed character toward `target`. Characters share the
    /// tween rules the player uses, including walk-area rejection.
    pub fn send_npc_to(&mut self, npc_id: &str, target: Vec2) -> bool {
        let Some(npc) = self.runtime.npcs.get_mut(npc_id) else {
            warn!(npc = npc_id, "send_npc_unknown_id");
            return false;
        };
        npc.mover.move_to(target)
    }

    /// Permanently remove an object from the world and put it in the
    /// player's inventory.
    pub fn take_object(&mut self, object_id: &str) -> bool {
        let Some(stage_id) = self.director.current_stage().map(str::to_string) else {
            return false;
        };
        if self.runtime.objects.get(object_id).is_none() {
            warn!(object = object_id, "take_object_not_present");
            return false;
        }
        self.director.mark_removed(&stage_id, object_id);
        self.runtime.objects.remove(object_id);
        self.runtime
            .depth
            .unregister(&depth_id_for_object(object_id), &mut self.runtime.visuals);
        self.inventory.insert(object_id.to_string());
        self.events.emit(SceneEvent::ItemTaken {
            stage_id,
            object_id: object_id.to_string(),
        });
        true
    }

    /// Responses the player may pick right now.
    pub fn available_responses(&self) -> Vec<DialogueResponse> {
        if self.dialogue.phase() != DialoguePhase::AwaitingResponse {
            return Vec::new();
        }
        self.dialogue
            .current_node()
            .map(|node| {
                node.responses
                    .iter()
                    .filter(|r| conditions_hold(&r.conditions, &self.session, &self.inventory))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pick a dialogue response. Returns `false` when the pick was
    /// rejected and the conversation is unchanged.
    pub fn choose_response(&mut self, response_id: &str) -> bool {
        let Some(participant) = self.dialogue.participant_id().map(str::to_string) else {
            return false;
        };
        match self
            .dialogue
            .choose(response_id, &mut self.session, &mut self.inventory)
        {
            Some(node) => {
                self.events.emit(SceneEvent::DialogueLine {
                    participant_id: participant.clone(),
                    line: node.text.clone(),
                });
                self.say(&participant, node.text);
                self.finish_presentation(&participant);
                true
            }
            None if !self.dialogue.is_active() => {
                self.events
                    .emit(SceneEvent::DialogueEnded { participant_id: participant });
                true
            }
            None => false,
        }
    }

    pub fn end_dialogue(&mut self) {
        if let Some(participant) = self.dialogue.participant_id().map(str::to_string) {
            self.dialogue.end();
            self.events
                .emit(SceneEvent::DialogueEnded { participant_id: participant });
        }
    }

    /// Advance the simulation one tick and hand back everything that
    /// happened. Queued stage changes apply at the end of the tick, so
    /// nothing later in the same tick touches torn-down state.
    pub fn tick(&mut self, dt_seconds: f32) -> Vec<SceneEvent> {
        let player_tick = self.player.tick(dt_seconds);
        if player_tick.moved {
            let position = self.player.position();
            self.runtime.place_player(position);
        }
        if player_tick.arrived {
            self.events.emit(SceneEvent::ArrivedAt {
                position: self.player.position(),
            });
        }
        if !self.player.is_moving() && self.queued_transition.is_none() {
            if let Some(action) = self.pending_action.take() {
                self.fire_pending(action);
            }
        }
        let mut npc_ids: Vec<String> = self.runtime.npcs.keys().cloned().collect();
        npc_ids.sort();
        for npc_id in npc_ids {
            let moved = self
                .runtime
                .npcs
                .get_mut(&npc_id)
                .map(|npc| npc.mover.tick(dt_seconds).moved)
                .unwrap_or(false);
            if moved {
                self.runtime.move_npc_bookkeeping(&npc_id);
            }
        }
        if let Some(speech) = self.speech.as_mut() {
            speech.remaining_seconds -= dt_seconds;
            if speech.remaining_seconds <= 0.0 {
                self.speech = None;
            }
        }
        if let Some(queued) = self.queued_transition.take() {
            let result = self.director.transition_to(
                &queued.to_stage,
                queued.target,
                &mut self.runtime,
                &mut self.player,
            );
            match (&result.stage, result.character_position) {
                (Some(stage), Some(position)) if result.success => {
                    self.pending_action = None;
                    self.speech = None;
                    self.events.emit(SceneEvent::TransitionCompleted {
                        stage_id: stage.clone(),
                        position,
                    });
                }
                _ => {
                    self.events.emit(SceneEvent::TransitionFailed {
                        stage_id: queued.to_stage,
                    });
                }
            }
        }
        self.runtime.depth.resort_if_dirty(&self.runtime.visuals);
        self.events.drain()
    }

    fn set_pending(&mut self, action: PendingAction) {
        if let Some(previous) = &self.pending_action {
            if *previous != action {
                debug!("pending_action_replaced");
            }
        }
        self.pending_action = Some(action);
    }

    fn standing_point(&self, object_id: &str) -> Option<Vec2> {
        let stage = self.director.current_stage_def()?;
        standing_point_for(stage, self.runtime.objects.get(object_id)?)
    }

    fn say(&mut self, participant_id: &str, text: String) {
        // A new line supersedes whatever is still showing.
        self.speech = Some(SpeechLine {
            participant_id: participant_id.to_string(),
            text,
            remaining_seconds: SPEECH_LINE_SECONDS,
        });
    }

    fn finish_presentation(&mut self, participant: &str) {
        let responses = self.dialogue.present(&self.session, &self.inventory);
        if responses.is_empty() {
            self.events.emit(SceneEvent::DialogueEnded {
                participant_id: participant.to_string(),
            });
        }
    }

    fn fire_pending(&mut self, action: PendingAction) {
        match action {
            PendingAction::UseObject { object_id } => {
                match self.director.check_gate(&object_id, &self.runtime.overlays) {
                    TransitionGate::Ready(transition) => {
                        self.request_transition(&transition.to_stage, transition.target);
                    }
                    TransitionGate::Blocked => {
                        self.events.emit(SceneEvent::TransitionBlocked {
                            trigger_object_id: object_id,
                        });
                    }
                    TransitionGate::NotFound => {
                        let Some((verb, name)) = self
                            .runtime
                            .objects
                            .get(&object_id)
                            .map(|o| (o.verb.clone(), o.name.clone()))
                        else {
                            return;
                        };
                        if verb == "take" {
                            self.take_object(&object_id);
                        } else {
                            let line = canned_response(&verb, &name);
                            self.events.emit(SceneEvent::ObjectResponse {
                                object_id,
                                line,
                            });
                        }
                    }
                }
            }
            PendingAction::TalkTo { npc_id } => self.start_dialogue_with(&npc_id),
        }
    }

    fn start_dialogue_with(&mut self, npc_id: &str) {
        match self.dialogue.start(npc_id, &self.session, &self.inventory) {
            Some(node) => {
                self.events.emit(SceneEvent::DialogueStarted {
                    participant_id: npc_id.to_string(),
                    line: node.text.clone(),
                });
                self.say(npc_id, node.text);
                self.finish_presentation(npc_id);
            }
            None => {
                let name = self
                    .runtime
                    .npcs
                    .get(npc_id)
                    .map(|n| n.name.clone())
                    .unwrap_or_else(|| npc_id.to_string());
                let line = idle_chatter(&name);
                self.events.emit(SceneEvent::NpcChatter {
                    npc_id: npc_id.to_string(),
                    line: line.clone(),
                });
                self.say(npc_id, line);
            }
        }
    }
}
