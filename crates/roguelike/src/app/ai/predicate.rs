use engine::EntityId;

use crate::app::gameplay::WorldView;

/// Transition guard. Composite variants own their operands.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    EnemyWithinRange(f32),
    HitpointsBelow(f32),
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    AlwaysFalse,
}

impl Predicate {
    pub(crate) fn enemy_within_range(range: f32) -> Self {
        Self::EnemyWithinRange(range)
    }

    pub(crate) fn hitpoints_below(threshold: f32) -> Self {
        Self::HitpointsBelow(threshold)
    }

    /// Stands in for a reachability check; there is no pathfinding, so it
    /// never holds.
    pub(crate) fn enemy_reachable() -> Self {
        Self::AlwaysFalse
    }

    pub(crate) fn and(self, rhs: Predicate) -> Self {
        Self::And(Box::new(self), Box::new(rhs))
    }

    pub(crate) fn evaluate(&self, actor: EntityId, view: &WorldView<'_>) -> bool {
        match self {
            Self::EnemyWithinRange(range) => view.any_enemy_within(actor, *range),
            Self::HitpointsBelow(threshold) => view
                .hitpoints(actor)
                .is_some_and(|hitpoints| hitpoints < *threshold),
            Self::Not(inner) => !inner.evaluate(actor, view),
            Self::And(lhs, rhs) => lhs.evaluate(actor, view) && rhs.evaluate(actor, view),
            Self::AlwaysFalse => false,
        }
    }
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ai::test_support::Arena;

    #[test]
    fn enemy_within_range_is_inclusive_and_ignores_teammates() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 0, 100.0);
        arena.spawn(1, 0, 0, 100.0);
        arena.spawn(3, 4, 1, 100.0);

        let view = arena.view();
        assert!(Predicate::enemy_within_range(5.0).evaluate(actor, &view));
        assert!(!Predicate::enemy_within_range(4.9).evaluate(actor, &view));
    }

    #[test]
    fn hitpoints_below_is_strict_and_false_without_hitpoints() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 0, 60.0);
        let view = arena.view();

        assert!(!Predicate::hitpoints_below(60.0).evaluate(actor, &view));
        assert!(Predicate::hitpoints_below(60.5).evaluate(actor, &view));
        assert!(!Predicate::hitpoints_below(1000.0).evaluate(EntityId(999), &view));
    }

    #[test]
    fn evaluation_is_repeatable_on_an_unchanged_world() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 0, 50.0);
        arena.spawn(2, 0, 1, 100.0);
        let predicate = Predicate::hitpoints_below(60.0).and(Predicate::enemy_within_range(3.0));

        let view = arena.view();
        let first = predicate.evaluate(actor, &view);
        for _ in 0..5 {
            assert_eq!(predicate.evaluate(actor, &view), first);
        }
        assert!(first);
    }

    #[test]
    fn double_negation_matches_the_inner_predicate() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 0, 100.0);
        arena.spawn(0, 6, 1, 100.0);
        let view = arena.view();

        for range in [1.0, 5.9, 6.0, 10.0] {
            let plain = Predicate::enemy_within_range(range);
            let doubled = !!Predicate::enemy_within_range(range);
            assert_eq!(plain.evaluate(actor, &view), doubled.evaluate(actor, &view));
        }
    }

    #[test]
    fn conjunction_and_placeholder() {
        let mut arena = Arena::new();
        let actor = arena.spawn(0, 0, 0, 100.0);
        arena.spawn(1, 0, 1, 100.0);
        let view = arena.view();

        let near = Predicate::enemy_within_range(1.0);
        assert!(!near.clone().and(Predicate::hitpoints_below(50.0)).evaluate(actor, &view));
        assert!(near.and(!Predicate::hitpoints_below(50.0)).evaluate(actor, &view));
        assert!(!Predicate::enemy_reachable().evaluate(actor, &view));
    }
}
