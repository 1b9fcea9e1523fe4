#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ActorRole {
    Player,
    Monster,
    Companion,
}

impl ActorRole {
    fn debug_name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Monster => "monster",
            Self::Companion => "companion",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum BehaviorPreset {
    #[default]
    None,
    Idle,
    PatrolAttackFlee,
    PatrolFlee,
    Attack,
    Guardian,
    Archer,
    Healer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ActorSpawn {
    pub(crate) role: ActorRole,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) hitpoints: f32,
    pub(crate) team: u32,
    pub(crate) melee_damage: f32,
    #[serde(default = "default_num_actions")]
    pub(crate) num_actions: u32,
    pub(crate) color: String,
    #[serde(default)]
    pub(crate) behavior: BehaviorPreset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) reproduction_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) heal_on_contact: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PickupSpawn {
    pub(crate) kind: PickupKind,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) amount: f32,
}

impl PickupSpawn {
    fn color(&self) -> Color {
        match self.kind {
            PickupKind::Heal => Color::from_rgba_u32(0x44ff44ff),
            PickupKind::Powerup => Color::from_rgba_u32(0xffff00ff),
        }
    }

    fn debug_name(&self) -> &'static str {
        match self.kind {
            PickupKind::Heal => "heal_pickup",
            PickupKind::Powerup => "powerup_pickup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioConfig {
    pub(crate) actors: Vec<ActorSpawn>,
    #[serde(default)]
    pub(crate) pickups: Vec<PickupSpawn>,
}

fn default_num_actions() -> u32 {
    DEFAULT_NUM_ACTIONS
}

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read scenario '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario json at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid scenario at {path}: {message}")]
    Invalid { path: String, message: String },
    #[error("failed to build behavior at {path}: {source}")]
    Behavior {
        path: String,
        #[source]
        source: MachineError,
    },
}

impl ScenarioConfig {
    pub(crate) fn load_from_path(path: &Path) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse_json(&raw)?;
        info!(
            path = %path.display(),
            actors = config.actors.len(),
            pickups = config.pickups.len(),
            "scenario_loaded"
        );
        Ok(config)
    }

    pub(crate) fn parse_json(raw: &str) -> Result<Self, ScenarioError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = match serde_path_to_error::deserialize::<_, Self>(&mut deserializer) {
            Ok(config) => config,
            Err(error) => {
                let path = json_path_or_root(error.path().to_string());
                let source = error.into_inner();
                return Err(ScenarioError::Parse {
                    path,
                    message: source.to_string(),
                });
            }
        };
        deserializer.end().map_err(|source| ScenarioError::Parse {
            path: "$".to_string(),
            message: source.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ScenarioError> {
        for (index, actor) in self.actors.iter().enumerate() {
            let field = |name: &str| format!("actors[{index}].{name}");
            require_in_bounds(&field("x"), actor.x)?;
            require_in_bounds(&field("y"), actor.y)?;
            require_finite(&field("hitpoints"), actor.hitpoints)?;
            require_non_negative(&field("melee_damage"), actor.melee_damage)?;
            if actor.num_actions == 0 {
                return Err(invalid(field("num_actions"), "must be at least 1"));
            }
            parse_color(&field("color"), &actor.color)?;
            if actor.role == ActorRole::Player && actor.behavior != BehaviorPreset::None {
                return Err(invalid(
                    field("behavior"),
                    "players are driven by input and cannot carry a behavior",
                ));
            }
            if let Some(threshold) = actor.reproduction_threshold {
                require_finite(&field("reproduction_threshold"), threshold)?;
            }
            if let Some(amount) = actor.heal_on_contact {
                require_non_negative(&field("heal_on_contact"), amount)?;
            }
            build_behavior(actor.behavior).map_err(|source| ScenarioError::Behavior {
                path: field("behavior"),
                source,
            })?;
        }

        for (index, pickup) in self.pickups.iter().enumerate() {
            require_in_bounds(&format!("pickups[{index}].x"), pickup.x)?;
            require_in_bounds(&format!("pickups[{index}].y"), pickup.y)?;
            require_finite(&format!("pickups[{index}].amount"), pickup.amount)?;
        }

        if !self.actors.iter().any(|actor| actor.role == ActorRole::Player) {
            warn!("scenario_without_player");
        }
        Ok(())
    }

    /// The stock arena: four monsters around the player as in the classic
    /// layout, plus a guardian, an archer and a healer companion.
    pub(crate) fn arena() -> Self {
        let monster = |x: i32, y: i32, color: &str, behavior: BehaviorPreset| ActorSpawn {
            role: ActorRole::Monster,
            x,
            y,
            hitpoints: 100.0,
            team: 1,
            melee_damage: 20.0,
            num_actions: 1,
            color: color.to_string(),
            behavior,
            reproduction_threshold: None,
            heal_on_contact: None,
        };
        let pickup = |kind: PickupKind, x: i32, y: i32, amount: f32| PickupSpawn {
            kind,
            x,
            y,
            amount,
        };

        let mut breeder = monster(-5, 5, "#880000ff", BehaviorPreset::Attack);
        breeder.reproduction_threshold = Some(60.0);

        Self {
            actors: vec![
                monster(5, 5, "#ee00eeff", BehaviorPreset::PatrolAttackFlee),
                monster(10, -5, "#ee00eeff", BehaviorPreset::PatrolAttackFlee),
                monster(-5, -5, "#111111ff", BehaviorPreset::PatrolFlee),
                breeder,
                monster(8, 0, "#3366ffff", BehaviorPreset::Guardian),
                monster(-8, 0, "#ff8800ff", BehaviorPreset::Archer),
                ActorSpawn {
                    role: ActorRole::Player,
                    x: 0,
                    y: 0,
                    hitpoints: 100.0,
                    team: 0,
                    melee_damage: 50.0,
                    num_actions: 2,
                    color: "#eeeeeeff".to_string(),
                    behavior: BehaviorPreset::None,
                    reproduction_threshold: None,
                    heal_on_contact: None,
                },
                ActorSpawn {
                    role: ActorRole::Companion,
                    x: 0,
                    y: 2,
                    hitpoints: 60.0,
                    team: 0,
                    melee_damage: 5.0,
                    num_actions: 1,
                    color: "#88ffccff".to_string(),
                    behavior: BehaviorPreset::Healer,
                    reproduction_threshold: None,
                    heal_on_contact: Some(5.0),
                },
            ],
            pickups: vec![
                pickup(PickupKind::Powerup, 7, 7, 10.0),
                pickup(PickupKind::Powerup, 10, -6, 10.0),
                pickup(PickupKind::Powerup, 10, -4, 10.0),
                pickup(PickupKind::Heal, -5, -5, 50.0),
                pickup(PickupKind::Heal, -5, 5, 50.0),
            ],
        }
    }
}

fn invalid(path: String, message: &str) -> ScenarioError {
    ScenarioError::Invalid {
        path,
        message: message.to_string(),
    }
}

fn require_finite(path: &str, value: f32) -> Result<(), ScenarioError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(path.to_string(), "must be a finite number"))
    }
}

fn require_in_bounds(path: &str, coordinate: i32) -> Result<(), ScenarioError> {
    if coordinate.unsigned_abs() <= MAX_SPAWN_COORDINATE.unsigned_abs() {
        Ok(())
    } else {
        Err(ScenarioError::Invalid {
            path: path.to_string(),
            message: format!("must be within -{MAX_SPAWN_COORDINATE}..={MAX_SPAWN_COORDINATE}"),
        })
    }
}

fn require_non_negative(path: &str, value: f32) -> Result<(), ScenarioError> {
    require_finite(path, value)?;
    if value < 0.0 {
        return Err(invalid(path.to_string(), "must not be negative"));
    }
    Ok(())
}

fn json_path_or_root(path: String) -> String {
    if path.is_empty() || path == "." {
        "$".to_string()
    } else {
        path
    }
}

/// Accepts `#rrggbbaa`, or `#rrggbb` with an opaque alpha.
fn parse_color(path: &str, raw: &str) -> Result<Color, ScenarioError> {
    let bad_color = || invalid(path.to_string(), "expected a color like #rrggbbaa");
    let hex = raw.strip_prefix('#').ok_or_else(bad_color)?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(bad_color());
    }
    let value = match hex.len() {
        8 => u32::from_str_radix(hex, 16).map_err(|_| bad_color())?,
        6 => (u32::from_str_radix(hex, 16).map_err(|_| bad_color())? << 8) | 0xff,
        _ => return Err(bad_color()),
    };
    Ok(Color::from_rgba_u32(value))
}
