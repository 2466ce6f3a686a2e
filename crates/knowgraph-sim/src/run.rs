use anyhow::{Context, Result};
use knowgraph_core::{EngineState, GraphSession, Stage, Viewport};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Host refresh interval the frame clock emulates.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

#[derive(Debug, Clone, Serialize)]
pub struct NodePosition {
    pub id: String,
    pub group: &'static str,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub ticks: u64,
    pub state: EngineState,
    pub max_velocity: f32,
    pub nodes: usize,
    pub links: usize,
    pub visible_nodes: usize,
    pub visible_links: usize,
    pub frame_stats: knowgraph_core::pipeline::FrameStats,
    pub physics_avg_ms: f64,
    pub physics_max_ms: f64,
    pub physics_overruns: u64,
    pub positions: Vec<NodePosition>,
}

/// Drives one frame: physics callback then projection.
fn frame(session: &mut GraphSession, now: Instant, viewport: Viewport, t0: Instant) {
    session.physics_frame(now);
    let time = now.saturating_duration_since(t0).as_secs_f32();
    session.render_frame(now, viewport, time);
}

/// True once the engine has nothing left to schedule (stabilized or empty)
/// or `max_ticks` ticks ran.
fn done(session: &GraphSession, start_ticks: u64, max_ticks: u64) -> bool {
    session.engine().request().is_none()
        || session.engine().ticks().saturating_sub(start_ticks) >= max_ticks
}

/// Synthetic timestamp of host frame `n`.
fn frame_time(t0: Instant, n: u64) -> Instant {
    t0 + FRAME_INTERVAL.mul_f64(n as f64)
}

/// Advances a synthetic clock one host frame at a time until the layout
/// settles or `max_ticks` simulation ticks have run.
pub fn run_virtual(session: &mut GraphSession, viewport: Viewport, max_ticks: u64) -> u64 {
    let t0 = Instant::now();
    let start_ticks = session.engine().ticks();
    let mut frames = 0u64;
    while !done(session, start_ticks, max_ticks) {
        let now = frame_time(t0, frames);
        frame(session, now, viewport, t0);
        frames += 1;
    }
    frames
}

/// Same as `run_virtual` against the wall clock. Stops early on ctrl-c.
pub async fn run_realtime(session: &mut GraphSession, viewport: Viewport, max_ticks: u64) -> u64 {
    let t0 = Instant::now();
    let start_ticks = session.engine().ticks();
    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut frames = 0u64;

    while !done(session, start_ticks, max_ticks) {
        tokio::select! {
            _ = interval.tick() => {
                frame(session, Instant::now(), viewport, t0);
                frames += 1;
                if frames % 60 == 0 {
                    tracing::debug!(
                        frames,
                        ticks = session.engine().ticks(),
                        max_velocity = session.engine().max_velocity(),
                        fps = session.perf().fps(),
                        "frame clock"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }
    frames
}

pub fn summarize(session: &mut GraphSession, viewport: Viewport, frames: u64) -> RunSummary {
    session.fit_camera(viewport, false);
    let (visible_nodes, visible_links, frame_stats) = {
        let frame = session.render_frame(Instant::now(), viewport, 0.0);
        (frame.nodes.len(), frame.links.len(), frame.stats)
    };

    let engine = session.engine();
    let positions = engine
        .nodes()
        .iter()
        .filter_map(|n| {
            let p = n.position?;
            Some(NodePosition {
                id: n.id.to_string(),
                group: n.group.as_str(),
                x: p.x,
                y: p.y,
                z: p.z,
            })
        })
        .collect();

    let perf = session.perf();
    RunSummary {
        frames,
        ticks: engine.ticks(),
        state: engine.state(),
        max_velocity: engine.max_velocity(),
        nodes: engine.nodes().len(),
        links: engine.links().len(),
        visible_nodes,
        visible_links,
        frame_stats,
        physics_avg_ms: perf.average(Stage::Physics).as_secs_f64() * 1000.0,
        physics_max_ms: perf.max(Stage::Physics).as_secs_f64() * 1000.0,
        physics_overruns: perf.overruns(Stage::Physics),
        positions,
    }
}

pub fn write_summary(summary: &RunSummary, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serialize run summary")?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("write summary {}", path.display()))?;
            tracing::info!(path = %path.display(), "summary written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
