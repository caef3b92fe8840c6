/// Where a conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialoguePhase {
    /// No conversation running.
    Inactive,
    /// A node was entered; its line has not been presented yet.
    AwaitingDisplay,
    /// The line is on screen and the player is picking a response.
    AwaitingResponse,
}

/// Runs one conversation at a time over the catalog's dialogue trees.
/// The engine owns phase bookkeeping and effect application; showing
/// lines and collecting picks is the scene's job.
#[derive(Debug)]
pub struct DialogueEngine {
    trees: HashMap<String, DialogueTree>,
    phase: DialoguePhase,
    participant_id: Option<String>,
    node_id: Option<String>,
}

impl DialogueEngine {
    pub fn new(trees: HashMap<String, DialogueTree>) -> Self {
        DialogueEngine {
            trees,
            phase: DialoguePhase::Inactive,
            participant_id: None,
            node_id: None,
        }
    }

    pub fn phase(&self) -> DialoguePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != DialoguePhase::Inactive
    }

    pub fn participant_id(&self) -> Option<&str> {
        self.participant_id.as_deref()
    }

    pub fn current_node(&self) -> Option<&DialogueNode> {
        let participant = self.participant_id.as_deref()?;
        let node_id = self.node_id.as_deref()?;
        self.trees.get(participant)?.node(node_id)
    }

    /// Begin a conversation with `participant_id`. Returns the start
    /// node to display, or `None` when the participant has no tree or
    /// its start node's conditions do not hold; the caller falls back
    /// to canned chatter. A conversation already running is ended
    /// first.
    pub fn start(
        &mut self,
        participant_id: &str,
        session: &SessionContext,
        inventory: &HashSet<String>,
    ) -> Option<DialogueNode> {
        if self.is_active() {
            debug!(participant = participant_id, "dialogue_start_supersedes_active");
            self.end();
        }
        let tree = self.trees.get(participant_id)?;
        let start = tree.node(&tree.start_node)?;
        if !conditions_hold(&start.conditions, session, inventory) {
            debug!(
                participant = participant_id,
                node = %start.id,
                "dialogue_start_conditions_unmet"
            );
            return None;
        }
        let node = start.clone();
        self.participant_id = Some(participant_id.to_string());
        self.node_id = Some(node.id.clone());
        self.phase = DialoguePhase::AwaitingDisplay;
        info!(participant = participant_id, node = %node.id, "dialogue_started");
        Some(node)
    }

    /// Mark the current node's line as displayed and compute which
    /// responses the player may pick. An empty result ends the
    /// conversation on the spot, so dead-end nodes need no explicit
    /// close; the caller checks [`DialogueEngine::is_active`] after
    /// calling this.
    pub fn present(
        &mut self,
        session: &SessionContext,
        inventory: &HashSet<String>,
    ) -> Vec<DialogueResponse> {
        if self.phase != DialoguePhase::AwaitingDisplay {
            return Vec::new();
        }
        let available: Vec<DialogueResponse> = self
            .current_node()
            .map(|node| {
                node.responses
                    .iter()
                    .filter(|r| conditions_hold(&r.conditions, session, inventory))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if available.is_empty() {
            debug!("dialogue_node_has_no_available_responses");
            self.end();
        } else {
            self.phase = DialoguePhase::AwaitingResponse;
        }
        available
    }

    /// Apply the picked response: effects run in a fixed order (flag,
    /// then item removal, then item grant), then the conversation moves
    /// to the response's next node or ends. The next node is only
    /// entered when its own conditions hold, so effects from this pick
    /// can open or close it. Returns the node to display next, `None`
    /// when the conversation is over or the pick was rejected. A
    /// rejected pick (wrong phase, unknown id, conditions no longer
    /// holding) changes nothing.
    pub fn choose(
        &mut self,
        response_id: &str,
        session: &mut SessionContext,
        inventory: &mut HashSet<String>,
    ) -> Option<DialogueNode> {
        if self.phase != DialoguePhase::AwaitingResponse {
            warn!(response = response_id, "dialogue_choose_outside_response_phase");
            return None;
        }
        let Some(response) = self
            .current_node()
            .and_then(|node| node.responses.iter().find(|r| r.id == response_id))
            .cloned()
        else {
            warn!(response = response_id, "dialogue_choose_unknown_response");
            return None;
        };
        if !conditions_hold(&response.conditions, session, inventory) {
            warn!(response = response_id, "dialogue_choose_conditions_unmet");
            return None;
        }
        if let Some(effect) = &response.set_flag {
            session.set_flag(effect.key.clone(), effect.value.clone());
        }
        if let Some(item) = &response.remove_item {
            if !inventory.remove(item) {
                debug!(item = %item, "dialogue_remove_item_not_held");
            }
        }
        if let Some(item) = &response.add_item {
            inventory.insert(item.clone());
        }
        let next = response.next_node.as_deref().and_then(|next_id| {
            self.participant_id
                .as_deref()
                .and_then(|p| self.trees.get(p))
                .and_then(|tree| tree.node(next_id))
                .cloned()
        });
        match next {
            Some(node) if conditions_hold(&node.conditions, session, inventory) => {
                self.node_id = Some(node.id.clone());
                self.phase = DialoguePhase::AwaitingDisplay;
                Some(node)
            }
            Some(node) => {
                debug!(node = %node.id, "dialogue_next_node_conditions_unmet");
                self.end();
                None
            }
            None => {
                self.end();
                None
            }
        }
    }

    /// End the conversation unconditionally. Safe to call when nothing
    /// is running.
    pub fn end(&mut self) {
        if let Some(participant) = &self.participant_id {
            info!(participant = %participant, "dialogue_ended");
        }
        self.phase = DialoguePhase::Inactive;
        self.participant_id = None;
        self.node_id = None;
    }
}
