mod config;
mod run;

use anyhow::{Context, Result};
use config::{parse_args, ClockMode};
use knowgraph_core::{Camera, GraphData, GraphSession, SessionConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn load_dataset(path: Option<&std::path::Path>) -> Result<GraphData> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read dataset {}", path.display()))?;
            GraphData::from_json(&text)
        }
        None => GraphData::demo(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = parse_args()?;
    let data = load_dataset(config.dataset.as_deref())?;

    tracing::info!(
        dataset = ?config.dataset,
        nodes = data.nodes.len(),
        links = data.links.len(),
        groups = ?config.groups,
        clock = ?config.clock,
        "dataset loaded"
    );

    let mut session = GraphSession::new(
        data,
        Camera::DEFAULT,
        SessionConfig {
            seed: config.seed,
            ..SessionConfig::default()
        },
    );
    session.initialize(config.filter());

    let frames = match config.clock {
        ClockMode::Virtual => run::run_virtual(&mut session, config.viewport, config.max_ticks),
        ClockMode::Realtime => {
            run::run_realtime(&mut session, config.viewport, config.max_ticks).await
        }
    };

    let summary = run::summarize(&mut session, config.viewport, frames);
    tracing::info!(
        frames,
        ticks = summary.ticks,
        state = ?summary.state,
        physics_avg_ms = summary.physics_avg_ms,
        "layout finished"
    );
    session.teardown();

    run::write_summary(&summary, config.out.as_deref())
}
