#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) enum Intent {
    #[default]
    None,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
}

impl Intent {
    pub(crate) const MOVES: [Intent; 4] = [
        Intent::MoveLeft,
        Intent::MoveRight,
        Intent::MoveUp,
        Intent::MoveDown,
    ];

    pub(crate) fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Single axis-dominant step from `from` toward `to`. Equal spans pick
    /// the vertical axis, and a zero delta yields `MoveDown`.
    pub(crate) fn toward(from: GridPos, to: GridPos) -> Self {
        let dx = i64::from(to.x) - i64::from(from.x);
        let dy = i64::from(to.y) - i64::from(from.y);
        if dx.abs() > dy.abs() {
            if dx > 0 {
                Self::MoveRight
            } else {
                Self::MoveLeft
            }
        } else if dy < 0 {
            Self::MoveUp
        } else {
            Self::MoveDown
        }
    }

    pub(crate) fn inverse(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::MoveLeft => Self::MoveRight,
            Self::MoveRight => Self::MoveLeft,
            Self::MoveUp => Self::MoveDown,
            Self::MoveDown => Self::MoveUp,
        }
    }

    pub(crate) fn apply(self, position: GridPos) -> GridPos {
        match self {
            Self::None => position,
            Self::MoveLeft => position.offset(-1, 0),
            Self::MoveRight => position.offset(1, 0),
            Self::MoveUp => position.offset(0, -1),
            Self::MoveDown => position.offset(0, 1),
        }
    }

    fn from_input_action(action: InputAction) -> Option<Self> {
        match action {
            InputAction::MoveLeft => Some(Self::MoveLeft),
            InputAction::MoveRight => Some(Self::MoveRight),
            InputAction::MoveUp => Some(Self::MoveUp),
            InputAction::MoveDown => Some(Self::MoveDown),
            InputAction::Quit => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Team(pub(crate) u32);

/// Player-only input cadence: `num_actions` scheduler calls per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ActionBudget {
    num_actions: u32,
    cur_actions: u32,
}

impl ActionBudget {
    pub(crate) fn new(num_actions: u32) -> Self {
        Self {
            num_actions: num_actions.max(1),
            cur_actions: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn num_actions(self) -> u32 {
        self.num_actions
    }

    #[cfg(test)]
    pub(crate) fn cur_actions(self) -> u32 {
        self.cur_actions
    }

    /// Returns true exactly when the counter wraps back to zero.
    pub(crate) fn advance(&mut self) -> bool {
        self.cur_actions = (self.cur_actions + 1) % self.num_actions;
        self.cur_actions == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ReproductionThreshold {
    pub(crate) threshold: f32,
    pub(crate) armed: bool,
}

impl ReproductionThreshold {
    pub(crate) fn armed(threshold: f32) -> Self {
        Self {
            threshold,
            armed: true,
        }
    }

    fn should_fire(self, hitpoints: f32) -> bool {
        self.armed && hitpoints < self.threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PickupKind {
    Heal,
    Powerup,
}

/// Per-attribute stores. Every map is keyed by entity id, so iteration is
/// creation order.
#[derive(Debug, Default)]
pub(crate) struct ComponentStores {
    pub(crate) staged_positions: BTreeMap<EntityId, GridPos>,
    pub(crate) hitpoints: BTreeMap<EntityId, f32>,
    pub(crate) teams: BTreeMap<EntityId, Team>,
    pub(crate) melee_damage: BTreeMap<EntityId, f32>,
    pub(crate) action_budgets: BTreeMap<EntityId, ActionBudget>,
    pub(crate) reproduction: BTreeMap<EntityId, ReproductionThreshold>,
    pub(crate) patrol_anchors: BTreeMap<EntityId, GridPos>,
    pub(crate) heal_on_contact: BTreeMap<EntityId, f32>,
    pub(crate) heal_pickups: BTreeMap<EntityId, f32>,
    pub(crate) powerup_pickups: BTreeMap<EntityId, f32>,
    pub(crate) players: BTreeSet<EntityId>,
    pub(crate) pending_removal: BTreeSet<EntityId>,
}

impl ComponentStores {
    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true the first time `id` is marked.
    fn mark_for_removal(&mut self, id: EntityId) -> bool {
        self.pending_removal.insert(id)
    }

    fn remove_entity(&mut self, id: EntityId) {
        self.staged_positions.remove(&id);
        self.hitpoints.remove(&id);
        self.teams.remove(&id);
        self.melee_damage.remove(&id);
        self.action_budgets.remove(&id);
        self.reproduction.remove(&id);
        self.patrol_anchors.remove(&id);
        self.heal_on_contact.remove(&id);
        self.heal_pickups.remove(&id);
        self.powerup_pickups.remove(&id);
        self.players.remove(&id);
        self.pending_removal.remove(&id);
    }

    #[cfg(test)]
    fn holds_any(&self, id: EntityId) -> bool {
        self.staged_positions.contains_key(&id)
            || self.hitpoints.contains_key(&id)
            || self.teams.contains_key(&id)
            || self.melee_damage.contains_key(&id)
            || self.action_budgets.contains_key(&id)
            || self.reproduction.contains_key(&id)
            || self.patrol_anchors.contains_key(&id)
            || self.heal_on_contact.contains_key(&id)
            || self.heal_pickups.contains_key(&id)
            || self.powerup_pickups.contains_key(&id)
            || self.players.contains(&id)
            || self.pending_removal.contains(&id)
    }
}

/// Pending intents, one slot per actor. Entities without a slot (pickups)
/// silently ignore writes.
#[derive(Debug, Default)]
pub(crate) struct IntentStore {
    intents: BTreeMap<EntityId, Intent>,
}

impl IntentStore {
    pub(crate) fn register(&mut self, id: EntityId, intent: Intent) {
        self.intents.insert(id, intent);
    }

    pub(crate) fn get(&self, id: EntityId) -> Intent {
        self.intents.get(&id).copied().unwrap_or_default()
    }

    pub(crate) fn set(&mut self, id: EntityId, intent: Intent) -> bool {
        match self.intents.get_mut(&id) {
            Some(slot) => {
                *slot = intent;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: EntityId) {
        self.intents.remove(&id);
    }

    fn reset_all(&mut self) {
        for intent in self.intents.values_mut() {
            *intent = Intent::None;
        }
    }

    fn clear(&mut self) {
        self.intents.clear();
    }

    fn pending_movers(&self) -> Vec<EntityId> {
        self.intents
            .iter()
            .filter(|(_, intent)| !intent.is_none())
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Read-only window over the grid and the component stores, handed to
/// predicates and behavior states.
#[derive(Clone, Copy)]
pub(crate) struct WorldView<'a> {
    world: &'a SceneWorld,
    components: &'a ComponentStores,
}

impl<'a> WorldView<'a> {
    pub(crate) fn new(world: &'a SceneWorld, components: &'a ComponentStores) -> Self {
        Self { world, components }
    }

    pub(crate) fn position(&self, id: EntityId) -> Option<GridPos> {
        self.world.position_of(id)
    }

    pub(crate) fn team(&self, id: EntityId) -> Option<Team> {
        self.components.teams.get(&id).copied()
    }

    pub(crate) fn hitpoints(&self, id: EntityId) -> Option<f32> {
        self.components.hitpoints.get(&id).copied()
    }

    pub(crate) fn patrol_anchor(&self, id: EntityId) -> Option<GridPos> {
        self.components.patrol_anchors.get(&id).copied()
    }

    fn team_members(&self) -> impl Iterator<Item = (EntityId, GridPos, Team)> + 'a {
        let world = self.world;
        self.components
            .teams
            .iter()
            .filter_map(move |(id, team)| world.position_of(*id).map(|pos| (*id, pos, *team)))
    }

    /// Closest actor on another team; the first one in creation order wins
    /// a distance tie.
    pub(crate) fn nearest_enemy(&self, actor: EntityId) -> Option<(EntityId, GridPos)> {
        let position = self.position(actor)?;
        let team = self.team(actor)?;
        let mut best: Option<(f32, EntityId, GridPos)> = None;
        for (id, enemy_pos, enemy_team) in self.team_members() {
            if enemy_team == team {
                continue;
            }
            let distance = position.distance(enemy_pos);
            match best {
                Some((closest, _, _)) if closest <= distance => {}
                _ => best = Some((distance, id, enemy_pos)),
            }
        }
        best.map(|(_, id, pos)| (id, pos))
    }

    pub(crate) fn any_enemy_within(&self, actor: EntityId, range: f32) -> bool {
        let (Some(position), Some(team)) = (self.position(actor), self.team(actor)) else {
            return false;
        };
        self.team_members()
            .any(|(_, enemy_pos, enemy_team)| enemy_team != team && position.distance(enemy_pos) <= range)
    }

    pub(crate) fn nearest_player(&self, actor: EntityId) -> Option<(EntityId, GridPos)> {
        let position = self.position(actor)?;
        let mut best: Option<(f32, EntityId, GridPos)> = None;
        for player_id in &self.components.players {
            if *player_id == actor {
                continue;
            }
            let Some(player_pos) = self.position(*player_id) else {
                continue;
            };
            let distance = position.distance(player_pos);
            match best {
                Some((closest, _, _)) if closest <= distance => {}
                _ => best = Some((distance, *player_id, player_pos)),
            }
        }
        best.map(|(_, id, pos)| (id, pos))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HudStats {
    pub(crate) hitpoints: f32,
    pub(crate) melee_damage: f32,
}

impl fmt::Display for HudStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hp: {} power: {}",
            self.hitpoints as i32, self.melee_damage as i32
        )
    }
}
