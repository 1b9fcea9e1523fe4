pub(crate) struct GameplayScene {
    scenario: ScenarioConfig,
    seed: u64,
    rng: ChaCha8Rng,
    components: ComponentStores,
    intents: IntentStore,
    machines: BTreeMap<EntityId, StateMachine>,
    turn_systems: TurnSystemsHost,
    events: TurnEventBus,
    turns_resolved: u64,
}

impl GameplayScene {
    pub(crate) fn new(scenario: ScenarioConfig, seed: u64) -> Self {
        Self {
            scenario,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            components: ComponentStores::default(),
            intents: IntentStore::default(),
            machines: BTreeMap::new(),
            turn_systems: TurnSystemsHost::default(),
            events: TurnEventBus::default(),
            turns_resolved: 0,
        }
    }

    /// Player hitpoints and melee damage for the HUD; `None` once every
    /// player is gone.
    pub(crate) fn hud_stats(&self) -> Option<HudStats> {
        self.components.players.iter().find_map(|player_id| {
            Some(HudStats {
                hitpoints: self.components.hitpoints.get(player_id).copied()?,
                melee_damage: self.components.melee_damage.get(player_id).copied()?,
            })
        })
    }

    fn reset_runtime(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.components.clear();
        self.intents.clear();
        self.machines.clear();
        self.turn_systems = TurnSystemsHost::default();
        self.events.clear();
        self.turns_resolved = 0;
    }

    fn spawn_scenario(&mut self, world: &mut SceneWorld) -> Result<(), ScenarioError> {
        self.scenario.validate()?;
        let scenario = self.scenario.clone();
        for (index, actor) in scenario.actors.iter().enumerate() {
            self.spawn_actor(world, index, actor)?;
        }
        for pickup in &scenario.pickups {
            self.spawn_pickup(world, pickup);
        }
        Ok(())
    }

    fn spawn_actor(
        &mut self,
        world: &mut SceneWorld,
        index: usize,
        spawn: &ActorSpawn,
    ) -> Result<EntityId, ScenarioError> {
        let field = |name: &str| format!("actors[{index}].{name}");
        let color = parse_color(&field("color"), &spawn.color)?;
        let machine = build_behavior(spawn.behavior).map_err(|source| ScenarioError::Behavior {
            path: field("behavior"),
            source,
        })?;

        let position = GridPos::new(spawn.x, spawn.y);
        let id = world.spawn(
            position,
            RenderableDesc {
                color,
                debug_name: spawn.role.debug_name(),
            },
        );
        let components = &mut self.components;
        components.staged_positions.insert(id, position);
        components.hitpoints.insert(id, spawn.hitpoints);
        components.teams.insert(id, Team(spawn.team));
        components.melee_damage.insert(id, spawn.melee_damage);
        components
            .action_budgets
            .insert(id, ActionBudget::new(spawn.num_actions));
        match spawn.role {
            ActorRole::Player => {
                components.players.insert(id);
            }
            ActorRole::Monster | ActorRole::Companion => {
                components.patrol_anchors.insert(id, position);
            }
        }
        if let Some(threshold) = spawn.reproduction_threshold {
            components
                .reproduction
                .insert(id, ReproductionThreshold::armed(threshold));
        }
        if let Some(amount) = spawn.heal_on_contact {
            components.heal_on_contact.insert(id, amount);
        }
        self.intents.register(id, Intent::None);
        if let Some(machine) = machine {
            self.machines.insert(id, machine);
        }
        Ok(id)
    }

    fn spawn_pickup(&mut self, world: &mut SceneWorld, pickup: &PickupSpawn) -> EntityId {
        let id = world.spawn(
            GridPos::new(pickup.x, pickup.y),
            RenderableDesc {
                color: pickup.color(),
                debug_name: pickup.debug_name(),
            },
        );
        let store = match pickup.kind {
            PickupKind::Heal => &mut self.components.heal_pickups,
            PickupKind::Powerup => &mut self.components.powerup_pickups,
        };
        store.insert(id, pickup.amount);
        id
    }

    /// Each pressed direction overwrites the player's intent; later keys in
    /// `PLAYER_INPUT_ORDER` win.
    fn fold_player_input(&mut self, input: &InputSnapshot) {
        for player_id in &self.components.players {
            for action in PLAYER_INPUT_ORDER {
                if !input.was_pressed(action) {
                    continue;
                }
                if let Some(intent) = Intent::from_input_action(action) {
                    self.intents.set(*player_id, intent);
                }
            }
        }
    }

    fn tick_state_machines(&mut self, fixed_dt_seconds: f32, world: &SceneWorld) {
        let mut context = AiContext {
            view: WorldView::new(world, &self.components),
            intents: &mut self.intents,
            rng: &mut self.rng,
        };
        for (actor_id, machine) in &mut self.machines {
            machine.act(fixed_dt_seconds, *actor_id, &mut context);
        }
    }

    fn run_turn(&mut self, fixed_dt_seconds: f32, world: &mut SceneWorld) {
        let players_before = self.components.players.clone();

        self.tick_state_machines(fixed_dt_seconds, world);
        self.turn_systems.resolve_turn(
            world,
            &mut self.components,
            &mut self.intents,
            &mut self.machines,
            &mut self.events,
        );
        self.turns_resolved = self.turns_resolved.saturating_add(1);

        for event in self.events.last_turn_events() {
            debug!(turn = self.turns_resolved, event = ?event, "turn_event");
        }
        let counts = self.events.last_turn_counts();
        info!(
            turn = self.turns_resolved,
            events = counts.total,
            moved = counts.moved,
            blocked = counts.blocked,
            damaged = counts.damaged,
            died = counts.died,
            picked_up = counts.picked_up,
            healed = counts.healed,
            reproduced = counts.reproduced,
            entity_count = world.entity_count(),
            "turn_resolved"
        );
        for player_id in players_before.difference(&self.components.players) {
            info!(player = player_id.0, turn = self.turns_resolved, "player_died");
        }
    }
}

impl Scene for GameplayScene {
    fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneLoadError> {
        self.reset_runtime();
        self.spawn_scenario(world).map_err(|error| SceneLoadError {
            scene: SCENE_NAME,
            message: error.to_string(),
        })?;
        world.apply_pending();
        info!(
            seed = self.seed,
            actors = self.scenario.actors.len(),
            pickups = self.scenario.pickups.len(),
            machines = self.machines.len(),
            "scenario_spawned"
        );
        Ok(())
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }

        self.fold_player_input(input);
        if should_resolve_turn(&mut self.components, &self.intents) {
            self.run_turn(fixed_dt_seconds, world);
        }
        SceneCommand::None
    }

    fn render(&mut self, world: &SceneWorld) {
        let hud = match self.hud_stats() {
            Some(stats) => stats.to_string(),
            None => "no player".to_string(),
        };
        debug!(
            hud = %hud,
            renderables = world.renderables().count(),
            turn = self.turns_resolved,
            "frame_rendered"
        );
        for (actor_id, machine) in &self.machines {
            trace!(
                actor = actor_id.0,
                state = machine.current_state_name().unwrap_or("none"),
                "actor_state"
            );
        }
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        info!(turns = self.turns_resolved, "scene_unloaded");
        self.components.clear();
        self.intents.clear();
        self.machines.clear();
        self.events.clear();
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let hud = match self.hud_stats() {
            Some(stats) => stats.to_string(),
            None => "player dead".to_string(),
        };
        Some(format!("turn {} | {hud}", self.turns_resolved))
    }

    fn debug_turn_count(&self) -> Option<u64> {
        Some(self.turns_resolved)
    }
}
