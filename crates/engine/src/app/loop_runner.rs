use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use super::input::InputCollector;
use super::metrics::CadenceWindow;
use super::{InputSource, Scene, SceneCommand, SceneLoadError, SceneWorld};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_fps: u32,
    pub max_frames: Option<u64>,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frames: None,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    SceneLoad(#[from] SceneLoadError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub turns: u64,
    pub entity_count: usize,
    pub quit_requested: bool,
}

/// Drives `scene` one frame per input frame until the source runs dry, the
/// scene asks to quit, or `max_frames` is reached.
pub fn run_app(
    config: LoopConfig,
    mut scene: Box<dyn Scene>,
    input: &mut dyn InputSource,
) -> Result<RunSummary, AppError> {
    let mut world = SceneWorld::default();
    scene.load(&mut world)?;
    world.apply_pending();
    info!(entity_count = world.entity_count(), "scene_loaded");

    let fixed_dt_seconds = fixed_dt_seconds(config.target_fps);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    info!(
        target_fps = config.target_fps.max(1),
        max_frames = ?config.max_frames,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut collector = InputCollector::new();
    let mut cadence = CadenceWindow::open(metrics_log_interval, Instant::now());
    let mut summary = RunSummary::default();
    let mut last_turn_count = scene.debug_turn_count().unwrap_or(0);

    while config.max_frames.map_or(true, |max| summary.frames < max) {
        let Some(events) = input.next_frame() else {
            info!(reason = "input_exhausted", "shutdown_requested");
            break;
        };
        let frame_start = Instant::now();
        for event in events {
            collector.handle_event(event);
        }
        let snapshot = collector.snapshot_for_frame();

        let command = scene.update(fixed_dt_seconds, &snapshot, &mut world);
        world.apply_pending();
        scene.render(&world);
        summary.frames += 1;

        let turn_count = scene.debug_turn_count().unwrap_or(0);
        let now = Instant::now();
        cadence.record_frame(
            now.saturating_duration_since(frame_start),
            turn_count.saturating_sub(last_turn_count),
        );
        last_turn_count = turn_count;
        if let Some(report) = cadence.close_if_due(now) {
            info!(
                fps = report.fps,
                turns_per_second = report.turns_per_second,
                frames_per_turn = report.frames_per_turn,
                frame_time_ms = report.frame_time_ms,
                entity_count = world.entity_count(),
                "loop_metrics"
            );
        }

        if command == SceneCommand::Quit {
            info!(reason = "quit_key", "shutdown_requested");
            summary.quit_requested = true;
            break;
        }
    }

    summary.turns = last_turn_count;
    summary.entity_count = world.entity_count();
    if let Some(title) = scene.debug_title(&world) {
        info!(title = %title, "final_state");
    }
    scene.unload(&mut world);
    world.clear();
    info!(frames = summary.frames, turns = summary.turns, "shutdown");
    Ok(summary)
}

fn fixed_dt_seconds(target_fps: u32) -> f32 {
    1.0 / target_fps.max(1) as f32
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::{
        Color, GridPos, InputAction, InputSnapshot, RenderableDesc, ScriptedInput,
    };

    #[derive(Debug, Default)]
    struct SceneLog {
        updates: u32,
        renders: u32,
        unloads: u32,
        presses: Vec<InputAction>,
        dt_seen: f32,
    }

    struct RecordingScene {
        log: Rc<RefCell<SceneLog>>,
        fail_load: bool,
    }

    impl Scene for RecordingScene {
        fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneLoadError> {
            if self.fail_load {
                return Err(SceneLoadError {
                    scene: "recorder",
                    message: "broken".to_string(),
                });
            }
            world.spawn(
                GridPos::default(),
                RenderableDesc {
                    color: Color::WHITE,
                    debug_name: "recorder",
                },
            );
            Ok(())
        }

        fn update(
            &mut self,
            fixed_dt_seconds: f32,
            input: &InputSnapshot,
            _world: &mut SceneWorld,
        ) -> SceneCommand {
            let mut log = self.log.borrow_mut();
            log.updates += 1;
            log.dt_seen = fixed_dt_seconds;
            for action in [InputAction::MoveLeft, InputAction::MoveRight] {
                if input.was_pressed(action) {
                    log.presses.push(action);
                }
            }
            if input.quit_requested() {
                SceneCommand::Quit
            } else {
                SceneCommand::None
            }
        }

        fn render(&mut self, _world: &SceneWorld) {
            self.log.borrow_mut().renders += 1;
        }

        fn unload(&mut self, _world: &mut SceneWorld) {
            self.log.borrow_mut().unloads += 1;
        }

        fn debug_turn_count(&self) -> Option<u64> {
            Some(u64::from(self.log.borrow().updates / 2))
        }
    }

    fn recording_scene(fail_load: bool) -> (Box<dyn Scene>, Rc<RefCell<SceneLog>>) {
        let log = Rc::new(RefCell::new(SceneLog::default()));
        let scene = RecordingScene {
            log: Rc::clone(&log),
            fail_load,
        };
        (Box::new(scene), log)
    }

    #[test]
    fn runs_one_frame_per_script_token_until_exhausted() {
        let (scene, log) = recording_scene(false);
        let mut input = ScriptedInput::parse("L.R.").expect("script");

        let summary = run_app(LoopConfig::default(), scene, &mut input).expect("run");

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.turns, 2);
        assert_eq!(summary.entity_count, 1);
        assert!(!summary.quit_requested);
        let log = log.borrow();
        assert_eq!(log.updates, 4);
        assert_eq!(log.renders, 4);
        assert_eq!(log.unloads, 1);
        assert_eq!(
            log.presses,
            vec![InputAction::MoveLeft, InputAction::MoveRight]
        );
        assert!((log.dt_seen - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn quit_token_stops_the_loop() {
        let (scene, log) = recording_scene(false);
        let mut input = ScriptedInput::parse("LQRRR").expect("script");

        let summary = run_app(LoopConfig::default(), scene, &mut input).expect("run");

        assert!(summary.quit_requested);
        assert_eq!(summary.frames, 2);
        assert_eq!(log.borrow().updates, 2);
        assert_eq!(input.remaining_frames(), 3);
    }

    #[test]
    fn max_frames_caps_the_run() {
        let (scene, _log) = recording_scene(false);
        let mut input = ScriptedInput::parse("..........").expect("script");
        let config = LoopConfig {
            max_frames: Some(3),
            ..LoopConfig::default()
        };

        let summary = run_app(config, scene, &mut input).expect("run");
        assert_eq!(summary.frames, 3);
    }

    #[test]
    fn scene_load_failure_is_reported() {
        let (scene, log) = recording_scene(true);
        let mut input = ScriptedInput::parse("L").expect("script");

        let error = run_app(LoopConfig::default(), scene, &mut input).expect_err("load fails");
        assert!(matches!(error, AppError::SceneLoad(_)));
        assert!(error.to_string().contains("broken"));
        assert_eq!(log.borrow().updates, 0);
    }

    #[test]
    fn fixed_dt_guards_zero_fps() {
        assert_eq!(fixed_dt_seconds(0), 1.0);
        assert!((fixed_dt_seconds(50) - 0.02).abs() < 1e-6);
    }

    #[test]
    fn zero_interval_falls_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), Duration::from_secs(1)),
            Duration::from_millis(5)
        );
    }
}
