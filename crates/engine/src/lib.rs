//! Grid entity store, scene contract, input edge collection and a headless
//! frame loop. Gameplay lives in the crates built on top of this one.

pub mod app;

pub use app::{
    run_app, AppError, Color, Entity, EntityId, EntityIdAllocator, GridPos, InputAction,
    InputCollector, InputEvent, InputScriptError, InputSnapshot, InputSource, KeyState, LoopConfig,
    RenderableDesc, RunSummary, Scene, SceneCommand, SceneLoadError, SceneWorld, ScriptedInput,
};
