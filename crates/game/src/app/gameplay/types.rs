/// Value a session flag can hold. Untagged so catalog JSON can write
/// `true`, `3`, or `"met"` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Gate on dialogue nodes and responses. All conditions on an element
/// must hold for it to be available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    AlwaysTrue,
    /// Holds when the flag is set to exactly `value`. An unset flag
    /// only matches an expected `false`.
    FlagEquals { key: String, value: FlagValue },
    HasItem { item: String },
}

impl Condition {
    pub fn evaluate(&self, session: &SessionContext, inventory: &HashSet<String>) -> bool {
        match self {
            Condition::AlwaysTrue => true,
            Condition::FlagEquals { key, value } => match session.flag(key) {
                Some(current) => current == value,
                None => *value == FlagValue::Bool(false),
            },
            Condition::HasItem { item } => inventory.contains(item),
        }
    }
}

pub fn conditions_hold(
    conditions: &[Condition],
    session: &SessionContext,
    inventory: &HashSet<String>,
) -> bool {
    conditions.iter().all(|c| c.evaluate(session, inventory))
}

/// Session-scoped flag storage. Flags persist across stage transitions
/// but not across sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    flags: HashMap<String, FlagValue>,
}

impl SessionContext {
    pub fn new() -> Self {
        SessionContext::default()
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: FlagValue) {
        let key = key.into();
        debug!(key = %key, "session_flag_set");
        self.flags.insert(key, value);
    }

    pub fn flag(&self, key: &str) -> Option<&FlagValue> {
        self.flags.get(key)
    }

    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }
}

/// Side effect applied when a dialogue response is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetFlagEffect {
    pub key: String,
    pub value: FlagValue,
}

/// One selectable reply on a dialogue node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueResponse {
    pub id: String,
    pub text: String,
    /// Node shown after choosing this. `None` ends the conversation.
    #[serde(default)]
    pub next_node: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub set_flag: Option<SetFlagEffect>,
    #[serde(default)]
    pub remove_item: Option<String>,
    #[serde(default)]
    pub add_item: Option<String>,
}

/// One spoken line plus its replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub responses: Vec<DialogueResponse>,
}

/// A character's full conversation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTree {
    pub participant_id: String,
    pub start_node: String,
    pub nodes: Vec<DialogueNode>,
}

impl DialogueTree {
    pub fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Deferred interaction: walk first, act on arrival. One slot only;
/// issuing a new interaction while walking replaces whatever was
/// pending.
#[derive(Debug, Clone, PartialEq)]
enum PendingAction {
    UseObject { object_id: String },
    TalkTo { npc_id: String },
}

/// Stage change waiting for the safe point at the end of the tick.
#[derive(Debug, Clone)]
struct QueuedTransition {
    to_stage: String,
    target: Option<Vec2>,
}

/// A line currently shown above a character's head.
#[derive(Debug, Clone)]
struct SpeechLine {
    participant_id: String,
    text: String,
    remaining_seconds: f32,
}

/// Everything observable that happened during a tick. Drained once per
/// tick by whoever drives the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    MoveRejected { target: Vec2 },
    ArrivedAt { position: Vec2 },
    ObjectResponse { object_id: String, line: String },
    NpcChatter { npc_id: String, line: String },
    DialogueStarted { participant_id: String, line: String },
    DialogueLine { participant_id: String, line: String },
    DialogueEnded { participant_id: String },
    TransitionCompleted { stage_id: String, position: Vec2 },
    TransitionBlocked { trigger_object_id: String },
    TransitionFailed { stage_id: String },
    ItemTaken { stage_id: String, object_id: String },
    OverlayToggled { overlay_id: String, visible: bool },
}

#[derive(Debug, Default)]
pub struct SceneEventQueue {
    events: Vec<SceneEvent>,
}

impl SceneEventQueue {
    fn emit(&mut self, event: SceneEvent) {
        self.events.push(event);
    }

    fn drain(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.events.len()
    }
}
