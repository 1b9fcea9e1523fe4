#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnSystemId {
    CollisionDetection,
    Commit,
    Pickups,
    DeathSweep,
    Reproduction,
}

impl TurnSystemId {
    #[cfg(test)]
    fn name(self) -> &'static str {
        match self {
            Self::CollisionDetection => "CollisionDetection",
            Self::Commit => "Commit",
            Self::Pickups => "Pickups",
            Self::DeathSweep => "DeathSweep",
            Self::Reproduction => "Reproduction",
        }
    }
}

const TURN_SYSTEM_ORDER: [TurnSystemId; 5] = [
    TurnSystemId::CollisionDetection,
    TurnSystemId::Commit,
    TurnSystemId::Pickups,
    TurnSystemId::DeathSweep,
    TurnSystemId::Reproduction,
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum TurnEvent {
    Moved {
        actor_id: EntityId,
        to: GridPos,
    },
    Blocked {
        actor_id: EntityId,
        occupant_id: EntityId,
    },
    Damaged {
        attacker_id: EntityId,
        target_id: EntityId,
        amount: f32,
        remaining: f32,
    },
    Died {
        entity_id: EntityId,
    },
    PickedUp {
        player_id: EntityId,
        pickup_id: EntityId,
        kind: PickupKind,
        amount: f32,
    },
    Healed {
        healer_id: EntityId,
        target_id: EntityId,
        amount: f32,
    },
    Reproduced {
        parent_id: EntityId,
        clone_id: EntityId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnEventKind {
    Moved,
    Blocked,
    Damaged,
    Died,
    PickedUp,
    Healed,
    Reproduced,
}

impl TurnEvent {
    fn kind(self) -> TurnEventKind {
        match self {
            Self::Moved { .. } => TurnEventKind::Moved,
            Self::Blocked { .. } => TurnEventKind::Blocked,
            Self::Damaged { .. } => TurnEventKind::Damaged,
            Self::Died { .. } => TurnEventKind::Died,
            Self::PickedUp { .. } => TurnEventKind::PickedUp,
            Self::Healed { .. } => TurnEventKind::Healed,
            Self::Reproduced { .. } => TurnEventKind::Reproduced,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TurnEventCounts {
    total: u32,
    moved: u32,
    blocked: u32,
    damaged: u32,
    died: u32,
    picked_up: u32,
    healed: u32,
    reproduced: u32,
}

impl TurnEventCounts {
    fn record(&mut self, kind: TurnEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            TurnEventKind::Moved => &mut self.moved,
            TurnEventKind::Blocked => &mut self.blocked,
            TurnEventKind::Damaged => &mut self.damaged,
            TurnEventKind::Died => &mut self.died,
            TurnEventKind::PickedUp => &mut self.picked_up,
            TurnEventKind::Healed => &mut self.healed,
            TurnEventKind::Reproduced => &mut self.reproduced,
        };
        *slot = slot.saturating_add(1);
    }
}

#[derive(Debug, Default)]
struct TurnEventBus {
    current_turn_events: Vec<TurnEvent>,
    last_turn_events: Vec<TurnEvent>,
    last_turn_counts: TurnEventCounts,
}

impl TurnEventBus {
    fn emit(&mut self, event: TurnEvent) {
        self.current_turn_events.push(event);
    }

    fn finish_turn_rollover(&mut self) {
        let mut counts = TurnEventCounts::default();
        for event in &self.current_turn_events {
            counts.record(event.kind());
        }
        self.last_turn_counts = counts;
        self.last_turn_events = std::mem::take(&mut self.current_turn_events);
    }

    fn last_turn_counts(&self) -> TurnEventCounts {
        self.last_turn_counts
    }

    fn last_turn_events(&self) -> &[TurnEvent] {
        &self.last_turn_events
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

struct TurnSystemContext<'a> {
    world: &'a mut SceneWorld,
    components: &'a mut ComponentStores,
    intents: &'a mut IntentStore,
    machines: &'a mut BTreeMap<EntityId, StateMachine>,
    events: &'a mut TurnEventBus,
}

#[derive(Default)]
struct TurnSystemsHost {
    last_turn_order: Vec<TurnSystemId>,
}

impl TurnSystemsHost {
    /// Commits every pending intent into world state. Runs the five steps in
    /// `TURN_SYSTEM_ORDER` and rolls the event bus over once at the end.
    fn resolve_turn(
        &mut self,
        world: &mut SceneWorld,
        components: &mut ComponentStores,
        intents: &mut IntentStore,
        machines: &mut BTreeMap<EntityId, StateMachine>,
        events: &mut TurnEventBus,
    ) {
        self.last_turn_order.clear();
        let mut context = TurnSystemContext {
            world,
            components,
            intents,
            machines,
            events,
        };
        for system_id in TURN_SYSTEM_ORDER {
            self.last_turn_order.push(system_id);
            self.run_system(system_id, &mut context);
        }
        context.events.finish_turn_rollover();
    }

    fn run_system(&self, system_id: TurnSystemId, context: &mut TurnSystemContext<'_>) {
        match system_id {
            TurnSystemId::CollisionDetection => self.run_collision_detection_system(context),
            TurnSystemId::Commit => self.run_commit_system(context),
            TurnSystemId::Pickups => self.run_pickup_system(context),
            TurnSystemId::DeathSweep => self.run_death_sweep_system(context),
            TurnSystemId::Reproduction => self.run_reproduction_system(context),
        }
    }

    fn run_collision_detection_system(&self, context: &mut TurnSystemContext<'_>) {
        for actor_id in context.intents.pending_movers() {
            let intent = context.intents.get(actor_id);
            let Some(team) = context.components.teams.get(&actor_id).copied() else {
                continue;
            };
            if !context.components.staged_positions.contains_key(&actor_id) {
                continue;
            }
            let Some(position) = context.world.position_of(actor_id) else {
                continue;
            };
            let damage = context
                .components
                .melee_damage
                .get(&actor_id)
                .copied()
                .unwrap_or(0.0);
            let candidate = intent.apply(position);

            let occupants = context
                .components
                .staged_positions
                .iter()
                .filter(|(id, staged)| **id != actor_id && **staged == candidate)
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();

            let mut blocked_by = None;
            for occupant_id in occupants {
                let Some(occupant_team) = context.components.teams.get(&occupant_id).copied()
                else {
                    continue;
                };
                let Some(hitpoints) = context.components.hitpoints.get_mut(&occupant_id) else {
                    continue;
                };
                blocked_by.get_or_insert(occupant_id);
                if occupant_team == team {
                    continue;
                }

                *hitpoints -= damage;
                let remaining = *hitpoints;
                context.events.emit(TurnEvent::Damaged {
                    attacker_id: actor_id,
                    target_id: occupant_id,
                    amount: damage,
                    remaining,
                });
                if remaining <= 0.0 && context.components.mark_for_removal(occupant_id) {
                    context.events.emit(TurnEvent::Died {
                        entity_id: occupant_id,
                    });
                }
            }

            match blocked_by {
                Some(occupant_id) => {
                    context.intents.set(actor_id, Intent::None);
                    context.events.emit(TurnEvent::Blocked {
                        actor_id,
                        occupant_id,
                    });
                }
                None => {
                    context
                        .components
                        .staged_positions
                        .insert(actor_id, candidate);
                    context.events.emit(TurnEvent::Moved {
                        actor_id,
                        to: candidate,
                    });
                }
            }
        }
    }

    fn run_commit_system(&self, context: &mut TurnSystemContext<'_>) {
        for (id, staged) in &context.components.staged_positions {
            if let Some(entity) = context.world.find_entity_mut(*id) {
                entity.position = *staged;
            }
        }
        context.intents.reset_all();
    }

    fn run_pickup_system(&self, context: &mut TurnSystemContext<'_>) {
        let players = context.components.players.iter().copied().collect::<Vec<_>>();
        for player_id in players {
            if !context.components.hitpoints.contains_key(&player_id)
                || !context.components.melee_damage.contains_key(&player_id)
            {
                continue;
            }
            let Some(position) = context.world.position_of(player_id) else {
                continue;
            };

            for (kind, pickup_id, amount) in self.pickups_at(context, position) {
                let stat = match kind {
                    PickupKind::Heal => context.components.hitpoints.get_mut(&player_id),
                    PickupKind::Powerup => context.components.melee_damage.get_mut(&player_id),
                };
                if let Some(stat) = stat {
                    *stat += amount;
                }
                context.components.mark_for_removal(pickup_id);
                context.events.emit(TurnEvent::PickedUp {
                    player_id,
                    pickup_id,
                    kind,
                    amount,
                });
            }

            let player_team = context.components.teams.get(&player_id).copied();
            let healers = context
                .components
                .heal_on_contact
                .iter()
                .filter(|(healer_id, _)| {
                    **healer_id != player_id
                        && !context.components.pending_removal.contains(healer_id)
                        && player_team.is_some()
                        && context.components.teams.get(healer_id).copied() == player_team
                })
                .filter(|(healer_id, _)| {
                    context
                        .world
                        .position_of(**healer_id)
                        .is_some_and(|healer_pos| {
                            healer_pos.manhattan_distance(position) <= HEALER_CONTACT_RANGE
                        })
                })
                .map(|(healer_id, amount)| (*healer_id, *amount))
                .collect::<Vec<_>>();
            for (healer_id, amount) in healers {
                if let Some(hitpoints) = context.components.hitpoints.get_mut(&player_id) {
                    *hitpoints += amount;
                }
                context.events.emit(TurnEvent::Healed {
                    healer_id,
                    target_id: player_id,
                    amount,
                });
            }
        }
    }

    /// Unconsumed pickups lying on `position`, heals before power-ups.
    fn pickups_at(
        &self,
        context: &TurnSystemContext<'_>,
        position: GridPos,
    ) -> Vec<(PickupKind, EntityId, f32)> {
        let heals = context
            .components
            .heal_pickups
            .iter()
            .map(|(id, amount)| (PickupKind::Heal, *id, *amount));
        let powerups = context
            .components
            .powerup_pickups
            .iter()
            .map(|(id, amount)| (PickupKind::Powerup, *id, *amount));
        heals
            .chain(powerups)
            .filter(|(_, id, _)| !context.components.pending_removal.contains(id))
            .filter(|(_, id, _)| context.world.position_of(*id) == Some(position))
            .collect()
    }

    fn run_death_sweep_system(&self, context: &mut TurnSystemContext<'_>) {
        let doomed = std::mem::take(&mut context.components.pending_removal);
        for entity_id in doomed {
            context.world.despawn(entity_id);
            context.components.remove_entity(entity_id);
            context.intents.remove(entity_id);
            context.machines.remove(&entity_id);
            debug!(entity = entity_id.0, "entity_removed");
        }
        context.world.apply_pending();
    }

    fn run_reproduction_system(&self, context: &mut TurnSystemContext<'_>) {
        let parents = context
            .components
            .reproduction
            .iter()
            .filter(|(id, threshold)| {
                context
                    .components
                    .hitpoints
                    .get(id)
                    .is_some_and(|hitpoints| threshold.should_fire(*hitpoints))
            })
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        if parents.is_empty() {
            return;
        }

        for parent_id in parents {
            if let Some(threshold) = context.components.reproduction.get_mut(&parent_id) {
                threshold.armed = false;
            }
            let Some(parent) = context.world.find_entity(parent_id) else {
                continue;
            };
            let position = parent.position.offset(CLONE_OFFSET.0, CLONE_OFFSET.1);
            let renderable = parent.renderable.clone();
            let clone_id = context.world.spawn(position, renderable);
            clone_actor_components(
                context.components,
                context.intents,
                parent_id,
                clone_id,
                position,
            );
            if context.machines.contains_key(&parent_id) {
                context
                    .machines
                    .insert(clone_id, StateMachine::single(MoveTowardNearestEnemy));
            }
            context.events.emit(TurnEvent::Reproduced {
                parent_id,
                clone_id,
            });
            info!(
                parent = parent_id.0,
                clone = clone_id.0,
                x = position.x,
                y = position.y,
                "actor_reproduced"
            );
        }
        context.world.apply_pending();
    }
}

/// Copies the attributes a clone inherits. Threshold, patrol anchor and the
/// player marker stay with the parent.
fn clone_actor_components(
    components: &mut ComponentStores,
    intents: &mut IntentStore,
    parent_id: EntityId,
    clone_id: EntityId,
    position: GridPos,
) {
    components.staged_positions.insert(clone_id, position);
    if let Some(hitpoints) = components.hitpoints.get(&parent_id).copied() {
        components.hitpoints.insert(clone_id, hitpoints);
    }
    if let Some(team) = components.teams.get(&parent_id).copied() {
        components.teams.insert(clone_id, team);
    }
    if let Some(budget) = components.action_budgets.get(&parent_id).copied() {
        components.action_budgets.insert(clone_id, budget);
    }
    if let Some(damage) = components.melee_damage.get(&parent_id).copied() {
        components.melee_damage.insert(clone_id, damage);
    }
    intents.register(clone_id, intents.get(parent_id));
}
