//! Monster behavior: guard predicates, intent-producing states, and the
//! hierarchical machine that switches between them.

mod machine;
mod predicate;
mod state;

pub(crate) use machine::{MachineError, StateMachine};
pub(crate) use predicate::Predicate;
pub(crate) use state::{
    AiContext, ArrowAttack, AttackEnemy, FleeFromNearestEnemy, FollowAndHealPlayer, Idle,
    MoveTowardNearestEnemy, Patrol,
};
