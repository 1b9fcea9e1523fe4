use engine::EntityId;
use thiserror::Error;
use tracing::debug;

use super::predicate::Predicate;
use super::state::{AiContext, BehaviorState};
use crate::app::gameplay::WorldView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StateId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum MachineError {
    #[error("parent state {parent} does not exist (machine has {state_count} states)")]
    UnknownParent { parent: usize, state_count: usize },
    #[error("transition source state {from} does not exist (machine has {state_count} states)")]
    UnknownSource { from: usize, state_count: usize },
    #[error("transition target state {to} does not exist (machine has {state_count} states)")]
    UnknownTarget { to: usize, state_count: usize },
}

#[derive(Debug)]
struct Transition {
    predicate: Predicate,
    target: StateId,
}

#[derive(Debug)]
struct StateNode {
    state: Box<dyn BehaviorState>,
    parent: Option<StateId>,
    children: Vec<StateId>,
    transitions: Vec<Transition>,
}

/// Hierarchical state machine over an index arena of states.
///
/// Transitions declared on a parent apply to every descendant. A state's own
/// transitions are checked before its ancestors', each list in declaration
/// order. Entering a state that has children descends through first children
/// until a leaf is reached.
#[derive(Debug, Default)]
pub(crate) struct StateMachine {
    current: usize,
    nodes: Vec<StateNode>,
}

impl StateMachine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn single(state: impl BehaviorState + 'static) -> Self {
        let mut machine = Self::new();
        machine.add_state(state);
        machine
    }

    pub(crate) fn add_state(&mut self, state: impl BehaviorState + 'static) -> StateId {
        self.push_node(Box::new(state), None)
    }

    pub(crate) fn add_child_state(
        &mut self,
        state: impl BehaviorState + 'static,
        parent: StateId,
    ) -> Result<StateId, MachineError> {
        if parent.0 >= self.nodes.len() {
            return Err(MachineError::UnknownParent {
                parent: parent.0,
                state_count: self.nodes.len(),
            });
        }
        let id = self.push_node(Box::new(state), Some(parent));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub(crate) fn add_transition(
        &mut self,
        predicate: Predicate,
        from: StateId,
        to: StateId,
    ) -> Result<(), MachineError> {
        let state_count = self.nodes.len();
        if to.0 >= state_count {
            return Err(MachineError::UnknownTarget { to: to.0, state_count });
        }
        let Some(node) = self.nodes.get_mut(from.0) else {
            return Err(MachineError::UnknownSource {
                from: from.0,
                state_count,
            });
        };
        node.transitions.push(Transition {
            predicate,
            target: to,
        });
        Ok(())
    }

    pub(crate) fn state_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn current_state(&self) -> Option<StateId> {
        (!self.nodes.is_empty()).then_some(StateId(self.current))
    }

    pub(crate) fn current_state_name(&self) -> Option<&'static str> {
        self.nodes.get(self.current).map(|node| node.state.name())
    }

    pub(crate) fn act(&mut self, dt_seconds: f32, actor: EntityId, ctx: &mut AiContext<'_>) {
        if self.nodes.is_empty() {
            return;
        }

        if let Some((matched, target)) = self.find_transition(actor, &ctx.view) {
            // Only the level that owned the transition is exited.
            self.nodes[matched.0].state.exit(actor);
            let leaf = self.entry_leaf(target);
            debug!(
                actor = actor.0,
                from = self.nodes[self.current].state.name(),
                matched = self.nodes[matched.0].state.name(),
                to = self.nodes[leaf.0].state.name(),
                "hsm_transition"
            );
            self.current = leaf.0;
            self.nodes[leaf.0].state.enter(actor);
        }

        self.nodes[self.current].state.act(dt_seconds, actor, ctx);
    }

    fn push_node(&mut self, state: Box<dyn BehaviorState>, parent: Option<StateId>) -> StateId {
        let id = StateId(self.nodes.len());
        self.nodes.push(StateNode {
            state,
            parent,
            children: Vec::new(),
            transitions: Vec::new(),
        });
        id
    }

    /// First true transition walking from the current state up through its
    /// ancestors. Returns the level it was declared on and its target.
    fn find_transition(&self, actor: EntityId, view: &WorldView<'_>) -> Option<(StateId, StateId)> {
        let mut level = Some(StateId(self.current));
        while let Some(id) = level {
            let node = &self.nodes[id.0];
            if let Some(transition) = node
                .transitions
                .iter()
                .find(|transition| transition.predicate.evaluate(actor, view))
            {
                return Some((id, transition.target));
            }
            level = node.parent;
        }
        None
    }

    /// Children are always appended after their parent, so each step moves
    /// to a strictly larger index and the walk terminates.
    fn entry_leaf(&self, from: StateId) -> StateId {
        let mut id = from;
        while let Some(first_child) = self.nodes[id.0].children.first() {
            id = *first_child;
        }
        id
    }
}
