#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Quit,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub action: InputAction,
    pub state: KeyState,
}

impl InputEvent {
    pub fn pressed(action: InputAction) -> Self {
        Self {
            action,
            state: KeyState::Pressed,
        }
    }

    pub fn released(action: InputAction) -> Self {
        Self {
            action,
            state: KeyState::Released,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    fn clear(&mut self) {
        self.down = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Quit => 4,
        }
    }
}

/// Folds raw key events into held state plus pressed edges.
///
/// An edge is latched on the first `Pressed` after a release and survives
/// until the next [`InputCollector::snapshot_for_frame`], so a key tapped and
/// released inside one frame is still observed exactly once.
#[derive(Debug, Default)]
pub struct InputCollector {
    held: ActionStates,
    pressed_edges: ActionStates,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event.state {
            KeyState::Pressed => {
                if !self.held.is_down(event.action) {
                    self.pressed_edges.set(event.action, true);
                }
                self.held.set(event.action, true);
            }
            KeyState::Released => self.held.set(event.action, false),
        }
    }

    pub fn snapshot_for_frame(&mut self) -> super::InputSnapshot {
        let snapshot = super::InputSnapshot::new(self.held, self.pressed_edges);
        self.pressed_edges.clear();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_latches_single_edge_until_snapshot() {
        let mut collector = InputCollector::new();
        collector.handle_event(InputEvent::pressed(InputAction::MoveLeft));
        collector.handle_event(InputEvent::released(InputAction::MoveLeft));

        let first = collector.snapshot_for_frame();
        assert!(first.was_pressed(InputAction::MoveLeft));
        assert!(!first.is_down(InputAction::MoveLeft));

        let second = collector.snapshot_for_frame();
        assert!(!second.was_pressed(InputAction::MoveLeft));
    }

    #[test]
    fn held_key_does_not_repeat_edges() {
        let mut collector = InputCollector::new();
        collector.handle_event(InputEvent::pressed(InputAction::MoveUp));
        assert!(collector.snapshot_for_frame().was_pressed(InputAction::MoveUp));

        collector.handle_event(InputEvent::pressed(InputAction::MoveUp));
        let repeat = collector.snapshot_for_frame();
        assert!(repeat.is_down(InputAction::MoveUp));
        assert!(!repeat.was_pressed(InputAction::MoveUp));

        collector.handle_event(InputEvent::released(InputAction::MoveUp));
        collector.handle_event(InputEvent::pressed(InputAction::MoveUp));
        assert!(collector.snapshot_for_frame().was_pressed(InputAction::MoveUp));
    }

    #[test]
    fn quit_edge_is_reported() {
        let mut collector = InputCollector::new();
        collector.handle_event(InputEvent::pressed(InputAction::Quit));
        assert!(collector.snapshot_for_frame().quit_requested());
    }
}
