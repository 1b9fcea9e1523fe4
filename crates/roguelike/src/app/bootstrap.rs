use std::env::{self, VarError};
use std::io::{self, Read};
use std::path::PathBuf;

use engine::{InputScriptError, LoopConfig, Scene, ScriptedInput};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{GameplayScene, ScenarioConfig, ScenarioError};

const SCENARIO_ENV_VAR: &str = "ROGUE_SCENARIO";
const SEED_ENV_VAR: &str = "ROGUE_SEED";
const INPUT_ENV_VAR: &str = "ROGUE_INPUT";
const MAX_FRAMES_ENV_VAR: &str = "ROGUE_MAX_FRAMES";
const DEFAULT_SEED: u64 = 24301;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) input: ScriptedInput,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error("{var}='{value}' is invalid: expected {expected}")]
    InvalidEnvVar {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("{var} is not valid unicode")]
    NonUnicodeEnvVar { var: &'static str },
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("invalid input script: {0}")]
    InputScript(#[from] InputScriptError),
    #[error("failed to read input script from stdin: {0}")]
    ReadStdin(#[source] io::Error),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Roguelike Startup ===");

    let seed = parse_seed(read_env_var(SEED_ENV_VAR)?)?;
    let max_frames = parse_max_frames(read_env_var(MAX_FRAMES_ENV_VAR)?)?;
    let scenario = match read_env_var(SCENARIO_ENV_VAR)? {
        Some(path) => ScenarioConfig::load_from_path(&PathBuf::from(path))?,
        None => {
            let arena = ScenarioConfig::arena();
            arena.validate()?;
            info!(actors = arena.actors.len(), "using_builtin_arena");
            arena
        }
    };
    let script = match read_env_var(INPUT_ENV_VAR)? {
        Some(script) => script,
        None => read_stdin_script()?,
    };
    let input = ScriptedInput::parse(&script)?;
    info!(
        seed,
        max_frames = ?max_frames,
        input_frames = input.remaining_frames(),
        "bootstrap_config"
    );

    Ok(AppWiring {
        config: LoopConfig {
            max_frames,
            ..LoopConfig::default()
        },
        scene: Box::new(GameplayScene::new(scenario, seed)),
        input,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn read_env_var(var: &'static str) -> Result<Option<String>, BootstrapError> {
    match env::var(var) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(BootstrapError::NonUnicodeEnvVar { var }),
    }
}

fn read_stdin_script() -> Result<String, BootstrapError> {
    let mut script = String::new();
    io::stdin()
        .read_to_string(&mut script)
        .map_err(BootstrapError::ReadStdin)?;
    Ok(script)
}

fn parse_seed(raw: Option<String>) -> Result<u64, BootstrapError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SEED);
    };
    raw.trim()
        .parse::<u64>()
        .map_err(|_| BootstrapError::InvalidEnvVar {
            var: SEED_ENV_VAR,
            value: raw.clone(),
            expected: "an unsigned 64-bit integer",
        })
}

fn parse_max_frames(raw: Option<String>) -> Result<Option<u64>, BootstrapError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(frames) if frames > 0 => Ok(Some(frames)),
        _ => Err(BootstrapError::InvalidEnvVar {
            var: MAX_FRAMES_ENV_VAR,
            value: raw,
            expected: "a positive frame count",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_defaults_and_parses() {
        assert_eq!(parse_seed(None).expect("default"), DEFAULT_SEED);
        assert_eq!(parse_seed(Some(" 42 ".to_string())).expect("parsed"), 42);
    }

    #[test]
    fn bad_seed_names_the_variable() {
        let error = parse_seed(Some("-3".to_string())).expect_err("negative seed");
        assert_eq!(
            error.to_string(),
            "ROGUE_SEED='-3' is invalid: expected an unsigned 64-bit integer"
        );
    }

    #[test]
    fn max_frames_must_be_positive() {
        assert_eq!(parse_max_frames(None).expect("unset"), None);
        assert_eq!(
            parse_max_frames(Some("120".to_string())).expect("parsed"),
            Some(120)
        );
        assert!(matches!(
            parse_max_frames(Some("0".to_string())),
            Err(BootstrapError::InvalidEnvVar {
                var: MAX_FRAMES_ENV_VAR,
                ..
            })
        ));
        assert!(parse_max_frames(Some("soon".to_string())).is_err());
    }

    #[test]
    fn script_errors_convert() {
        let error: BootstrapError = ScriptedInput::parse("LX")
            .map(|_| ())
            .expect_err("bad token")
            .into();
        assert!(error.to_string().contains("unknown input token 'X'"));
    }
}
