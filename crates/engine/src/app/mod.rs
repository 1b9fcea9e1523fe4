mod input;
mod loop_runner;
mod metrics;
mod scene;
mod script;

pub use input::{InputAction, InputCollector, InputEvent, KeyState};
pub use loop_runner::{run_app, AppError, LoopConfig, RunSummary};
pub use scene::{
    Color, Entity, EntityId, EntityIdAllocator, GridPos, InputSnapshot, RenderableDesc, Scene,
    SceneCommand, SceneLoadError, SceneWorld,
};
pub use script::{InputScriptError, InputSource, ScriptedInput};
