use std::process::ExitCode;

use engine::run_app;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        scene,
        mut input,
    } = app;

    match run_app(config, scene, &mut input) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                turns = summary.turns,
                entity_count = summary.entity_count,
                quit_requested = summary.quit_requested,
                "run_complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
