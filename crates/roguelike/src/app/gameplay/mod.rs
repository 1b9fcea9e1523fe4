use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use engine::{
    Color, EntityId, GridPos, InputAction, InputSnapshot, RenderableDesc, Scene, SceneCommand,
    SceneLoadError, SceneWorld,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::ai::{
    AiContext, ArrowAttack, AttackEnemy, FleeFromNearestEnemy, FollowAndHealPlayer, Idle,
    MachineError, MoveTowardNearestEnemy, Patrol, Predicate, StateMachine,
};

const SCENE_NAME: &str = "roguelike";
const DEFAULT_NUM_ACTIONS: u32 = 1;
const CLONE_OFFSET: (i32, i32) = (1, 1);
const HEALER_CONTACT_RANGE: u32 = 1;
const MAX_SPAWN_COORDINATE: i32 = 1 << 20;
const PLAYER_INPUT_ORDER: [InputAction; 4] = [
    InputAction::MoveLeft,
    InputAction::MoveRight,
    InputAction::MoveUp,
    InputAction::MoveDown,
];

const PATROL_RADIUS: f32 = 3.0;
const ENGAGE_RANGE: f32 = 3.0;
const CHASE_GIVE_UP_RANGE: f32 = 5.0;
const FLEE_HITPOINTS: f32 = 60.0;
const FLEE_SAFE_RANGE: f32 = 7.0;
const GUARDIAN_STRIKE_RANGE: f32 = 1.0;
const GUARDIAN_LEASH_RANGE: f32 = 6.0;
const GUARDIAN_FLEE_HITPOINTS: f32 = 40.0;
const ARCHER_PATROL_RADIUS: f32 = 2.0;
const ARCHER_MIN_RANGE: f32 = 2.0;
const ARCHER_MAX_RANGE: f32 = 4.0;
const ARCHER_ENGAGE_RANGE: f32 = 5.0;
const ARCHER_DISENGAGE_RANGE: f32 = 7.0;

include!("types.rs");
include!("scheduler.rs");
include!("systems.rs");
include!("scenario.rs");
include!("behaviors.rs");
include!("scene_impl.rs");
