use std::fmt;

use engine::{EntityId, GridPos};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::app::gameplay::{Intent, IntentStore, WorldView};

/// What a behavior state may touch while acting: the world read-only, the
/// intent store for its own actor, and the simulation RNG.
pub(crate) struct AiContext<'a> {
    pub(crate) view: WorldView<'a>,
    pub(crate) intents: &'a mut IntentStore,
    pub(crate) rng: &'a mut ChaCha8Rng,
}

pub(crate) trait BehaviorState: fmt::Debug {
    fn name(&self) -> &'static str;

    fn enter(&self, actor: EntityId) {
        trace!(actor = actor.0, state = self.name(), "state_enter");
    }

    fn exit(&self, actor: EntityId) {
        trace!(actor = actor.0, state = self.name(), "state_exit");
    }

    /// Writes at most one intent for `actor`.
    fn act(&self, dt_seconds: f32, actor: EntityId, ctx: &mut AiContext<'_>);
}

fn with_nearest_enemy(
    actor: EntityId,
    ctx: &mut AiContext<'_>,
    choose: impl FnOnce(GridPos, GridPos) -> Intent,
) {
    let Some(position) = ctx.view.position(actor) else {
        return;
    };
    let Some((_, enemy)) = ctx.view.nearest_enemy(actor) else {
        return;
    };
    ctx.intents.set(actor, choose(position, enemy));
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MoveTowardNearestEnemy;

impl BehaviorState for MoveTowardNearestEnemy {
    fn name(&self) -> &'static str {
        "move_toward_nearest_enemy"
    }

    fn act(&self, _dt_seconds: f32, actor: EntityId, ctx: &mut AiContext<'_>) {
        with_nearest_enemy(actor, ctx, Intent::toward);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FleeFromNearestEnemy;

impl BehaviorState for FleeFromNearestEnemy {
    fn name(&self) -> &'static str {
        "flee_from_nearest_enemy"
    }

    fn act(&self, _dt_seconds: f32, actor: EntityId, ctx: &mut AiContext<'_>) {
        with_nearest_enemy(actor, ctx, |from, to| Intent::toward(from, to).inverse());
    }
}

/// Random walk around the actor's patrol anchor; once further than `radius`
/// it heads straight back.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Patrol {
    pub(crate) radius: f32,
}

impl Patrol {
    pub(crate) fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl BehaviorState for Patrol {
    fn name(&self) -> &'static str {
        "patrol"
    }

    fn act(&self, _dt_seconds: f32, actor: EntityId, ctx: &mut AiContext<'_>) {
        let Some(position) = ctx.view.position(actor) else {
            return;
        };
        let anchor = ctx.view.patrol_anchor(actor).unwrap_or(position);
        let intent = if position.distance(anchor) > self.radius {
            Intent::toward(position, anchor)
        } else {
            Intent::MOVES[ctx.rng.gen_range(0..Intent::MOVES.len())]
        };
        ctx.intents.set(actor, intent);
    }
}

/// Melee strike: step into an orthogonally adjacent enemy, otherwise hold.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AttackEnemy;

impl BehaviorState for AttackEnemy {
    fn name(&self) -> &'static str {
        "attack_enemy"
    }

    fn act(&self, _dt_seconds: f32, actor: EntityId, ctx: &mut AiContext<'_>) {
        with_nearest_enemy(actor, ctx, |from, to| {
            if from.manhattan_distance(to) == 1 {
                Intent::toward(from, to)
            } else {
                Intent::None
            }
        });
    }
}

/// Keeps the nearest enemy inside `[min_range, max_range]`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ArrowAttack {
    pub(crate) min_range: f32,
    pub(crate) max_range: f32,
}

impl ArrowAttack {
    pub(crate) fn new(min_range: f32, max_range: f32) -> Self {
        Self {
            min_range,
            max_range,
        }
    }
}

impl BehaviorState for ArrowAttack {
    fn name(&self) -> &'static str {
        "arrow_attack"
    }

    fn act(&self, _dt_seconds: f32, actor: EntityId, ctx: &mut AiContext<'_>) {
        let (min_range, max_range) = (self.min_range, self.max_range);
        with_nearest_enemy(actor, ctx, |from, to| {
            let distance = from.distance(to);
            if distance < min_range {
                Intent::toward(from, to).inverse()
            } else if distance > max_range {
                Intent::toward(from, to)
            } else {
                Intent::None
            }
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FollowAndHealPlayer;

impl BehaviorState for FollowAndHealPlayer {
    fn name(&self) -> &'static str {
        "follow_and_heal_player"
    }

    fn act(&self, _dt_seconds: f32, actor: EntityId, ctx: &mut AiContext<'_>) {
        let Some(position) = ctx.view.position(actor) else {
            return;
        };
        let Some((_, player)) = ctx.view.nearest_player(actor) else {
            return;
        };
        let intent = if position.manhattan_distance(player) > 1 {
            Intent::toward(position, player)
        } else {
            Intent::None
        };
        ctx.intents.set(actor, intent);
    }
}

/// Does nothing. Useful as a pure container for child states.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Idle;

impl BehaviorState for Idle {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn act(&self, _dt_seconds: f32, _actor: EntityId, _ctx: &mut AiContext<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ai::test_support::Arena;

    #[test]
    fn move_toward_picks_the_dominant_axis() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 1, 100.0);
        arena.spawn(-3, 1, 0, 100.0);

        MoveTowardNearestEnemy.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveLeft);
    }

    #[test]
    fn equal_spans_step_vertically() {
        assert_eq!(
            Intent::toward(GridPos::new(0, 0), GridPos::new(2, -2)),
            Intent::MoveUp
        );
        assert_eq!(
            Intent::toward(GridPos::new(0, 0), GridPos::new(-2, 2)),
            Intent::MoveDown
        );
    }

    #[test]
    fn nearest_enemy_tie_goes_to_the_older_actor() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 1, 100.0);
        arena.spawn(0, 2, 0, 100.0);
        arena.spawn(2, 0, 0, 100.0);

        MoveTowardNearestEnemy.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveDown);
    }

    #[test]
    fn no_enemy_leaves_intent_untouched() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 1, 100.0);
        arena.spawn(1, 0, 1, 100.0);
        arena.intents.set(actor, Intent::MoveUp);

        MoveTowardNearestEnemy.act(0.0, actor, &mut arena.context());
        FleeFromNearestEnemy.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveUp);
    }

    #[test]
    fn flee_inverts_the_toward_step() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 1, 100.0);
        arena.spawn(0, -2, 0, 100.0);

        FleeFromNearestEnemy.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveDown);
    }

    #[test]
    fn patrol_walks_back_to_its_anchor() {
        let mut arena = Arena::new();
        let actor = arena.spawn(7, 0, 1, 100.0);
        arena
            .components
            .patrol_anchors
            .insert(actor, GridPos::new(0, 0));

        Patrol::new(3.0).act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveLeft);
    }

    #[test]
    fn patrol_inside_radius_moves_randomly_but_reproducibly() {
        let run = |seed: u64| {
            let mut arena = Arena::with_seed(seed);
            let actor = arena.spawn(0, 0, 1, 100.0);
            arena
                .components
                .patrol_anchors
                .insert(actor, GridPos::new(0, 0));
            (0..16)
                .map(|_| {
                    Patrol::new(3.0).act(0.0, actor, &mut arena.context());
                    arena.intent(actor)
                })
                .collect::<Vec<_>>()
        };

        let first = run(7);
        assert_eq!(first, run(7));
        assert!(first.iter().all(|intent| !intent.is_none()));
    }

    #[test]
    fn attack_strikes_only_when_adjacent() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 1, 100.0);
        let enemy = arena.spawn(0, 3, 0, 100.0);

        AttackEnemy.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::None);

        arena.move_to(enemy, 1, 0);
        AttackEnemy.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveRight);
    }

    #[test]
    fn arrow_attack_kites_within_band() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 1, 100.0);
        let enemy = arena.spawn(1, 0, 0, 100.0);
        let archer = ArrowAttack::new(2.0, 4.0);

        archer.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveLeft);

        arena.move_to(enemy, 3, 0);
        archer.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::None);

        arena.move_to(enemy, 6, 0);
        archer.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveRight);
    }

    #[test]
    fn healer_follows_until_adjacent() {
        let mut arena = Arena::new();
        let healer = arena.spawn(0, 0, 0, 100.0);
        let player = arena.spawn(0, 3, 0, 100.0);
        arena.components.players.insert(player);

        FollowAndHealPlayer.act(0.0, healer, &mut arena.context());
        assert_eq!(arena.intent(healer), Intent::MoveDown);

        arena.move_to(player, 0, 1);
        FollowAndHealPlayer.act(0.0, healer, &mut arena.context());
        assert_eq!(arena.intent(healer), Intent::None);
    }

    #[test]
    fn idle_never_writes() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 1, 100.0);
        arena.spawn(1, 0, 0, 100.0);
        arena.intents.set(actor, Intent::MoveLeft);

        Idle.act(0.0, actor, &mut arena.context());
        assert_eq!(arena.intent(actor), Intent::MoveLeft);
    }
}
