type CatalogResult<T> = Result<T, String>;

/// Everything a session needs to run: stages, the doorways between
/// them, and the conversation graphs. Built once at startup from JSON
/// or in code, then treated as read-only.
#[derive(Debug, Clone)]
pub struct AdventureCatalog {
    stages: HashMap<String, StageDef>,
    /// Keyed by (source stage id, trigger object id).
    transitions: HashMap<(String, String), TransitionDef>,
    dialogue_trees: HashMap<String, DialogueTree>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    stages: Vec<StageDef>,
    #[serde(default)]
    transitions: Vec<TransitionDef>,
    #[serde(default)]
    dialogue_trees: Vec<DialogueTree>,
}

impl AdventureCatalog {
    pub fn from_parts(
        stages: Vec<StageDef>,
        transitions: Vec<TransitionDef>,
        dialogue_trees: Vec<DialogueTree>,
    ) -> CatalogResult<Self> {
        let raw = RawCatalog {
            stages,
            transitions,
            dialogue_trees,
        };
        Self::validate(&raw)?;
        let stage_count = raw.stages.len();
        let catalog = AdventureCatalog {
            stages: raw.stages.into_iter().map(|s| (s.id.clone(), s)).collect(),
            transitions: raw
                .transitions
                .into_iter()
                .map(|t| ((t.from_stage.clone(), t.trigger_object.clone()), t))
                .collect(),
            dialogue_trees: raw
                .dialogue_trees
                .into_iter()
                .map(|t| (t.participant_id.clone(), t))
                .collect(),
        };
        info!(
            stages = stage_count,
            transitions = catalog.transitions.len(),
            dialogue_trees = catalog.dialogue_trees.len(),
            "catalog_ready"
        );
        Ok(catalog)
    }

    pub fn stage(&self, id: &str) -> Option<&StageDef> {
        self.stages.get(id)
    }

    pub fn stage_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.stages.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn transition(&self, from_stage: &str, trigger_object: &str) -> Option<&TransitionDef> {
        self.transitions
            .get(&(from_stage.to_string(), trigger_object.to_string()))
    }

    pub fn dialogue_tree(&self, participant_id: &str) -> Option<&DialogueTree> {
        self.dialogue_trees.get(participant_id)
    }

    pub fn dialogue_trees(&self) -> &HashMap<String, DialogueTree> {
        &self.dialogue_trees
    }

    /// Every asset key the catalog references, for preloading.
    pub fn asset_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for stage in self.stages.values() {
            keys.push(stage.background.clone());
            for object in &stage.objects {
                if let Some(asset) = &object.asset {
                    keys.push(asset.clone());
                }
            }
            for npc in &stage.npcs {
                keys.push(npc.asset.clone());
            }
            for overlay in &stage.overlays {
                keys.push(overlay.asset.clone());
            }
        }
        keys.sort();
        keys.dedup();
        keys
    }

    fn validation_err(path: &str, message: impl Into<String>) -> String {
        format!("validation failed at {path}: {}", message.into())
    }

    fn validate(raw: &RawCatalog) -> CatalogResult<()> {
        let mut stage_ids = HashSet::new();
        for (i, stage) in raw.stages.iter().enumerate() {
            let stage_path = format!("stages[{i}]");
            if !stage_ids.insert(stage.id.as_str()) {
                return Err(Self::validation_err(
                    &stage_path,
                    format!("duplicate stage id '{}'", stage.id),
                ));
            }
            Self::validate_stage(stage, &stage_path)?;
        }
        let mut transition_keys = HashSet::new();
        for (i, transition) in raw.transitions.iter().enumerate() {
            let path = format!("transitions[{i}]");
            if !transition_keys.insert((
                transition.from_stage.as_str(),
                transition.trigger_object.as_str(),
            )) {
                return Err(Self::validation_err(
                    &path,
                    format!(
                        "duplicate transition for trigger '{}' in stage '{}'",
                        transition.trigger_object, transition.from_stage
                    ),
                ));
            }
            Self::validate_transition(raw, transition, &path)?;
        }
        let mut participants = HashSet::new();
        for (i, tree) in raw.dialogue_trees.iter().enumerate() {
            let path = format!("dialogue_trees[{i}]");
            if !participants.insert(tree.participant_id.as_str()) {
                return Err(Self::validation_err(
                    &path,
                    format!("duplicate dialogue tree for '{}'", tree.participant_id),
                ));
            }
            Self::validate_tree(tree, &path)?;
        }
        Ok(())
    }

    fn validate_stage(stage: &StageDef, stage_path: &str) -> CatalogResult<()> {
        if stage.id.is_empty() {
            return Err(Self::validation_err(
                &format!("{stage_path}.id"),
                "stage id must not be empty",
            ));
        }
        if !stage.walk_area.is_empty() && stage.walk_area.len() < 3 {
            return Err(Self::validation_err(
                &format!("{stage_path}.walk_area"),
                format!(
                    "walk area needs at least 3 vertices or none, got {}",
                    stage.walk_area.len()
                ),
            ));
        }
        let mut content_ids = HashSet::new();
        for (i, object) in stage.objects.iter().enumerate() {
            let path = format!("{stage_path}.objects[{i}]");
            if !content_ids.insert(object.id.as_str()) {
                return Err(Self::validation_err(
                    &path,
                    format!("duplicate id '{}' within stage", object.id),
                ));
            }
            if let Some(polygon) = &object.hit_polygon {
                if polygon.len() < 3 {
                    return Err(Self::validation_err(
                        &format!("{path}.hit_polygon"),
                        format!("hit polygon needs at least 3 vertices, got {}", polygon.len()),
                    ));
                }
            }
        }
        for (i, npc) in stage.npcs.iter().enumerate() {
            let path = format!("{stage_path}.npcs[{i}]");
            if !content_ids.insert(npc.id.as_str()) {
                return Err(Self::validation_err(
                    &path,
                    format!("duplicate id '{}' within stage", npc.id),
                ));
            }
            if let Some(area) = &npc.walk_area {
                if area.len() < 3 {
                    return Err(Self::validation_err(
                        &format!("{path}.walk_area"),
                        format!("walk area needs at least 3 vertices, got {}", area.len()),
                    ));
                }
            }
        }
        for (i, overlay) in stage.overlays.iter().enumerate() {
            let path = format!("{stage_path}.overlays[{i}]");
            if !content_ids.insert(overlay.id.as_str()) {
                return Err(Self::validation_err(
                    &path,
                    format!("duplicate id '{}' within stage", overlay.id),
                ));
            }
        }
        for object_id in stage.interaction_points.keys() {
            if stage.object(object_id).is_none() {
                return Err(Self::validation_err(
                    &format!("{stage_path}.interaction_points"),
                    format!("no object '{object_id}' to stand at"),
                ));
            }
        }
        Ok(())
    }

    fn validate_transition(
        raw: &RawCatalog,
        transition: &TransitionDef,
        path: &str,
    ) -> CatalogResult<()> {
        let Some(from) = raw.stages.iter().find(|s| s.id == transition.from_stage) else {
            return Err(Self::validation_err(
                &format!("{path}.from_stage"),
                format!("unknown stage '{}'", transition.from_stage),
            ));
        };
        if !raw.stages.iter().any(|s| s.id == transition.to_stage) {
            return Err(Self::validation_err(
                &format!("{path}.to_stage"),
                format!("unknown stage '{}'", transition.to_stage),
            ));
        }
        if from.object(&transition.trigger_object).is_none() {
            return Err(Self::validation_err(
                &format!("{path}.trigger_object"),
                format!(
                    "stage '{}' has no object '{}'",
                    transition.from_stage, transition.trigger_object
                ),
            ));
        }
        if let Some(overlay_id) = &transition.requires_overlay {
            if !from.overlays.iter().any(|o| &o.id == overlay_id) {
                return Err(Self::validation_err(
                    &format!("{path}.requires_overlay"),
                    format!(
                        "stage '{}' has no overlay '{overlay_id}'",
                        transition.from_stage
                    ),
                ));
            }
        }
        Ok(())
    }

    fn validate_tree(tree: &DialogueTree, path: &str) -> CatalogResult<()> {
        if tree.node(&tree.start_node).is_none() {
            return Err(Self::validation_err(
                &format!("{path}.start_node"),
                format!("tree has no node '{}'", tree.start_node),
            ));
        }
        let mut node_ids = HashSet::new();
        for (i, node) in tree.nodes.iter().enumerate() {
            let node_path = format!("{path}.nodes[{i}]");
            if !node_ids.insert(node.id.as_str()) {
                return Err(Self::validation_err(
                    &node_path,
                    format!("duplicate node id '{}'", node.id),
                ));
            }
            for (j, response) in node.responses.iter().enumerate() {
                if let Some(next) = &response.next_node {
                    if tree.node(next).is_none() {
                        return Err(Self::validation_err(
                            &format!("{node_path}.responses[{j}].next_node"),
                            format!("tree has no node '{next}'"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

pub fn load_catalog_json(raw: &str) -> CatalogResult<AdventureCatalog> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let parsed: RawCatalog = match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(parsed) => parsed,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                return Err(format!("parse catalog json: {source}"));
            }
            return Err(format!("parse catalog json at {path}: {source}"));
        }
    };
    AdventureCatalog::from_parts(parsed.stages, parsed.transitions, parsed.dialogue_trees)
}

pub fn load_catalog_file(path: &Path) -> CatalogResult<AdventureCatalog> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read catalog file {}: {error}", path.display()))?;
    load_catalog_json(&raw)
}

/// Small built-in world used by the demo binary and the tests: a street
/// with a gated doorway into a bar, a key to pick up, and two
/// characters to talk to.
pub fn demo_catalog() -> AdventureCatalog {
    let street = StageDef {
        id: "cyberpunk-street".to_string(),
        background: "bg/cyberpunk-street".to_string(),
        walk_area: vec![
            Vec2::new(40.0, 520.0),
            Vec2::new(980.0, 520.0),
            Vec2::new(980.0, 700.0),
            Vec2::new(40.0, 700.0),
        ],
        spawn: Vec2::new(120.0, 640.0),
        perspective: Some(PerspectiveDef {
            y_min: 520.0,
            y_max: 700.0,
            scale_min: 0.6,
            scale_max: 1.0,
            y_damping: 0.85,
        }),
        objects: vec![
            ObjectDef {
                id: "building-entrance".to_string(),
                name: "Building Entrance".to_string(),
                verb: "open".to_string(),
                hit_rect: Rect::new(780.0, 430.0, 120.0, 180.0),
                hit_polygon: None,
                asset: Some("props/entrance".to_string()),
            },
            ObjectDef {
                id: "golden-key".to_string(),
                name: "Golden Key".to_string(),
                verb: "take".to_string(),
                hit_rect: Rect::new(300.0, 600.0, 24.0, 16.0),
                hit_polygon: None,
                asset: Some("props/golden-key".to_string()),
            },
            ObjectDef {
                id: "neon-sign".to_string(),
                name: "Neon Sign".to_string(),
                verb: "look".to_string(),
                hit_rect: Rect::new(500.0, 290.0, 130.0, 100.0),
                hit_polygon: Some(vec![
                    Vec2::new(510.0, 380.0),
                    Vec2::new(620.0, 380.0),
                    Vec2::new(600.0, 300.0),
                    Vec2::new(530.0, 300.0),
                ]),
                asset: Some("props/neon-sign".to_string()),
            },
        ],
        npcs: vec![NpcDef {
            id: "bartender".to_string(),
            name: "Bartender".to_string(),
            asset: "chars/bartender".to_string(),
            spawn: Vec2::new(640.0, 600.0),
            interaction_point: Some(Vec2::new(600.0, 604.0)),
            walk_area: None,
        }],
        overlays: vec![OverlayDef {
            id: "entrance-door-open".to_string(),
            asset: "fx/door-open".to_string(),
            position: Vec2::new(790.0, 440.0),
            proxy_y: 608.0,
            initially_visible: false,
        }],
        interaction_points: HashMap::from([
            ("building-entrance".to_string(), Vec2::new(840.0, 614.0)),
            ("golden-key".to_string(), Vec2::new(312.0, 622.0)),
            ("neon-sign".to_string(), Vec2::new(565.0, 560.0)),
        ]),
    };

    let indoor = StageDef {
        id: "test-indoor".to_string(),
        background: "bg/test-indoor".to_string(),
        walk_area: vec![
            Vec2::new(100.0, 380.0),
            Vec2::new(900.0, 380.0),
            Vec2::new(900.0, 660.0),
            Vec2::new(100.0, 660.0),
        ],
        spawn: Vec2::new(480.0, 420.0),
        perspective: None,
        objects: vec![ObjectDef {
            id: "exit-door".to_string(),
            name: "Exit".to_string(),
            verb: "open".to_string(),
            hit_rect: Rect::new(120.0, 300.0, 90.0, 160.0),
            hit_polygon: None,
            asset: None,
        }],
        npcs: vec![NpcDef {
            id: "jake".to_string(),
            name: "Jake".to_string(),
            asset: "chars/jake".to_string(),
            spawn: Vec2::new(300.0, 520.0),
            interaction_point: Some(Vec2::new(340.0, 540.0)),
            walk_area: None,
        }],
        overlays: Vec::new(),
        interaction_points: HashMap::from([(
            "exit-door".to_string(),
            Vec2::new(165.0, 470.0),
        )]),
    };

    let transitions = vec![
        TransitionDef {
            from_stage: "cyberpunk-street".to_string(),
            trigger_object: "building-entrance".to_string(),
            to_stage: "test-indoor".to_string(),
            target: Some(Vec2::new(863.0, 628.0)),
            requires_overlay: Some("entrance-door-open".to_string()),
        },
        TransitionDef {
            from_stage: "test-indoor".to_string(),
            trigger_object: "exit-door".to_string(),
            to_stage: "cyberpunk-street".to_string(),
            target: None,
            requires_overlay: None,
        },
    ];

    let bartender_tree = DialogueTree {
        participant_id: "bartender".to_string(),
        start_node: "bartender_greet".to_string(),
        nodes: vec![
            DialogueNode {
                id: "bartender_greet".to_string(),
                text: "What'll it be?".to_string(),
                conditions: Vec::new(),
                responses: vec![
                    DialogueResponse {
                        id: "ask_rumors".to_string(),
                        text: "Heard any rumors?".to_string(),
                        next_node: Some("bartender_rumors".to_string()),
                        conditions: Vec::new(),
                        set_flag: Some(SetFlagEffect {
                            key: "met_bartender".to_string(),
                            value: FlagValue::Bool(true),
                        }),
                        remove_item: None,
                        add_item: None,
                    },
                    DialogueResponse {
                        id: "trade_chip".to_string(),
                        text: "Trade you this credit chip.".to_string(),
                        next_node: Some("bartender_trade".to_string()),
                        conditions: vec![Condition::HasItem {
                            item: "credit-chip".to_string(),
                        }],
                        set_flag: None,
                        remove_item: Some("credit-chip".to_string()),
                        add_item: Some("bar-token".to_string()),
                    },
                    DialogueResponse {
                        id: "leave".to_string(),
                        text: "Never mind.".to_string(),
                        next_node: None,
                        conditions: Vec::new(),
                        set_flag: None,
                        remove_item: None,
                        add_item: None,
                    },
                ],
            },
            DialogueNode {
                id: "bartender_rumors".to_string(),
                text: "Word is the building next door lost its key.".to_string(),
                conditions: Vec::new(),
                responses: vec![DialogueResponse {
                    id: "thanks".to_string(),
                    text: "Good to know.".to_string(),
                    next_node: None,
                    conditions: Vec::new(),
                    set_flag: None,
                    remove_item: None,
                    add_item: None,
                }],
            },
            DialogueNode {
                id: "bartender_trade".to_string(),
                text: "Pleasure doing business.".to_string(),
                conditions: Vec::new(),
                responses: Vec::new(),
            },
        ],
    };

    let jake_tree = DialogueTree {
        participant_id: "jake".to_string(),
        start_node: "jake_greet".to_string(),
        nodes: vec![
            DialogueNode {
                id: "jake_greet".to_string(),
                text: "You shouldn't be in here.".to_string(),
                conditions: Vec::new(),
                responses: vec![DialogueResponse {
                    id: "bye".to_string(),
                    text: "I was just leaving.".to_string(),
                    next_node: Some("jake_leave_response".to_string()),
                    conditions: Vec::new(),
                    set_flag: None,
                    remove_item: None,
                    add_item: None,
                }],
            },
            DialogueNode {
                id: "jake_leave_response".to_string(),
                text: "See that you do.".to_string(),
                conditions: Vec::new(),
                responses: Vec::new(),
            },
        ],
    };

    AdventureCatalog::from_parts(
        vec![street, indoor],
        transitions,
        vec![bartender_tree, jake_tree],
    )
    .unwrap_or_else(|error| panic!("demo catalog must validate: {error}"))
}
