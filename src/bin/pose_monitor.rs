//! Terminal client for a robot-link server.
//!
//! Binds to the pose and paused streams, prints a status line once per
//! second and, when `PAUSE_TOGGLE_SECS` is set, flips the paused flag on
//! that cadence. Runs until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use robot_link::client::{
    MessageCallback, StreamBinding, StreamFactory, paused_stream, pose_stream,
};
use robot_link::config::StreamConfig;
use robot_link::domain::{PausedChannel, PausedState, Pose, PoseChannel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = StreamConfig::from_env();
    let toggle_every = std::env::var("PAUSE_TOGGLE_SECS")
        .ok()
        .map(|secs| secs.parse::<u64>())
        .transpose()
        .context("PAUSE_TOGGLE_SECS must be a whole number of seconds")?
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    tracing::info!(base_url = %config.base_url, "starting pose monitor");

    let latest_pose: Arc<Mutex<Option<Pose>>> = Arc::new(Mutex::new(None));
    let latest_paused: Arc<Mutex<Option<bool>>> = Arc::new(Mutex::new(None));

    let pose_config = config.clone();
    let pose_factory: StreamFactory<PoseChannel> = Arc::new(move || pose_stream(&pose_config));
    let pose_sink = Arc::clone(&latest_pose);
    let on_pose: MessageCallback<Pose> = Arc::new(move |pose: &Pose| {
        *pose_sink.lock() = Some(*pose);
    });
    let pose = StreamBinding::mount(pose_factory, Some(on_pose));

    let paused_config = config.clone();
    let paused_factory: StreamFactory<PausedChannel> =
        Arc::new(move || paused_stream(&paused_config));
    let paused_sink = Arc::clone(&latest_paused);
    let on_paused: MessageCallback<PausedState> = Arc::new(move |state: &PausedState| {
        *paused_sink.lock() = Some(state.paused);
    });
    let paused = StreamBinding::mount(paused_factory, Some(on_paused));

    let mut report = tokio::time::interval(Duration::from_secs(1));
    let mut toggle = toggle_every.map(tokio::time::interval);
    let mut pose_status = pose.status();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = pose_status.changed() => {
                if changed.is_err() {
                    break;
                }
                let online = *pose_status.borrow_and_update();
                tracing::info!(online, "pose connection status changed");
            }
            _ = report.tick() => {
                let last = *latest_pose.lock();
                match (pose.connected(), last) {
                    (true, Some(p)) => tracing::info!(
                        x = %format!("{:.2}", p.x),
                        y = %format!("{:.2}", p.y),
                        angle = %format!("{:.2}", p.angle),
                        paused = ?*latest_paused.lock(),
                        "robot pose"
                    ),
                    _ => tracing::info!("connection offline"),
                }
            }
            _ = async { toggle.as_mut()?.tick().await; Some(()) }, if toggle.is_some() => {
                if paused.connected() {
                    let next = !latest_paused.lock().unwrap_or(false);
                    paused
                        .stream()
                        .send(&PausedState::new(next))
                        .context("sending paused flag")?;
                    tracing::info!(paused = next, "toggled paused flag");
                }
            }
        }
    }

    tracing::info!("shutting down");
    pose.unmount();
    paused.unmount();
    Ok(())
}
