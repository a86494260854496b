mod behaviors;
mod config;
mod driver;
mod loader;

use std::process::ExitCode;

use runtime::{BehaviorInstance, KindId, SceneError, SceneWorld};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use behaviors::{CounterState, DriftState, TrailState, COUNTER, DRIFT, NOOP, SANDBOX_TABLE, TRAIL};
use config::{ConfigError, DriverConfig};
use driver::DriverReport;
use loader::SharedDirLoader;

#[derive(Debug, Error)]
enum SandboxError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("config names unknown behavior kind {name:?}")]
    UnknownKindName { name: String },
}

fn main() -> ExitCode {
    init_tracing();
    info!("=== Behavior Sandbox Startup ===");

    match run() {
        Ok(report) => {
            info!(
                frames = report.frames_run,
                iterations = report.iterations,
                dropped_backlog_ms = report.dropped_backlog_ms,
                "sandbox_finished"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = %error, "fatal");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<DriverReport, SandboxError> {
    let config = config::load_from_env()?;
    let loader = SharedDirLoader::new(config.asset_dir.clone());
    let mut world = SceneWorld::new(&SANDBOX_TABLE, Box::new(loader.clone()));
    world.open()?;

    for path in &config.preload {
        let handle = world.load_resource(path)?;
        info!(
            path = %path.display(),
            bytes = loader.byte_len(handle).unwrap_or(0),
            "resource_ready"
        );
    }
    if !config.preload.is_empty() {
        info!(resident_bytes = loader.resident_bytes(), "preload_complete");
    }

    let instances = populate_scene(&mut world, &config)?;
    info!(live_instances = world.live_instance_count(), "scene_populated");

    let report = driver::run(&config, &mut world)?;
    log_scene_results(&mut world, &instances)?;

    world.close()?;
    let stats = world.arena_stats();
    info!(
        slabs_released = stats.released_slab_total,
        resources_released = stats.released_resource_total,
        "scene_reclaimed"
    );
    Ok(report)
}

fn populate_scene(
    world: &mut SceneWorld,
    config: &DriverConfig,
) -> Result<Vec<(KindId, BehaviorInstance)>, SandboxError> {
    let mut instances = Vec::new();
    for entry in &config.spawn {
        let kind = SANDBOX_TABLE.kind_id_by_name(&entry.kind).ok_or_else(|| {
            SandboxError::UnknownKindName {
                name: entry.kind.clone(),
            }
        })?;
        for _ in 0..entry.count {
            let entity = world.spawn_entity();
            let instance = world.attach(entity, kind)?;
            instances.push((kind, instance));
        }
    }
    Ok(instances)
}

fn log_scene_results(
    world: &mut SceneWorld,
    instances: &[(KindId, BehaviorInstance)],
) -> Result<(), SceneError> {
    let mut idle_count = 0usize;
    for (kind, instance) in instances {
        match *kind {
            COUNTER => {
                let ticks = world.state_mut::<CounterState>(*instance)?.ticks;
                info!(ticks, "counter_result");
            }
            DRIFT => {
                let state = *world.state_mut::<DriftState>(*instance)?;
                info!(
                    x = state.x,
                    y = state.y,
                    presented_frames = state.presented_frames,
                    "drift_result"
                );
            }
            TRAIL => {
                // Retire trails before close so their destroy hook is
                // observable while the arena is still open.
                world.detach(*instance)?;
                let state = *world.state_mut::<TrailState>(*instance)?;
                info!(
                    frames_alive = state.frames_alive,
                    retired = state.retired,
                    "trail_retired"
                );
            }
            NOOP => idle_count += 1,
            _ => {}
        }
    }
    if idle_count > 0 {
        info!(idle_count, "noop_instances_idle");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
