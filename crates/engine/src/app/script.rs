use std::collections::VecDeque;

use thiserror::Error;

use super::input::{InputAction, InputEvent};

/// Per-frame supplier of raw key events. `None` means the source is
/// exhausted and the loop should stop.
pub trait InputSource {
    fn next_frame(&mut self) -> Option<Vec<InputEvent>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputScriptError {
    #[error("unknown input token '{token}' at offset {offset} (expected one of L R U D . Q)")]
    UnknownToken { token: char, offset: usize },
}

/// Replays a tap script, one token per frame:
/// `L`/`R`/`U`/`D` tap a direction, `.` is an idle frame, `Q` requests quit.
/// Whitespace is ignored and tokens are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<Option<InputAction>>,
}

impl ScriptedInput {
    pub fn parse(script: &str) -> Result<Self, InputScriptError> {
        let mut frames = VecDeque::new();
        for (offset, token) in script.char_indices() {
            if token.is_whitespace() {
                continue;
            }
            let frame = match token.to_ascii_uppercase() {
                'L' => Some(InputAction::MoveLeft),
                'R' => Some(InputAction::MoveRight),
                'U' => Some(InputAction::MoveUp),
                'D' => Some(InputAction::MoveDown),
                'Q' => Some(InputAction::Quit),
                '.' => None,
                _ => return Err(InputScriptError::UnknownToken { token, offset }),
            };
            frames.push_back(frame);
        }
        Ok(Self { frames })
    }

    pub fn remaining_frames(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_frame(&mut self) -> Option<Vec<InputEvent>> {
        let frame = self.frames.pop_front()?;
        Some(match frame {
            Some(action) => vec![InputEvent::pressed(action), InputEvent::released(action)],
            None => Vec::new(),
        })
    }
}
