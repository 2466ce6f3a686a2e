use anyhow::Context;
use directories::ProjectDirs;
use knowgraph_core::camera::ZoomRange;
use knowgraph_core::perf::{DEFAULT_BUDGET, DEFAULT_WINDOW};
use knowgraph_core::{
    Camera, Group, LayoutParams, PerfMonitor, PipelineParams, SessionConfig, VisibilityFilter,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// JSON dataset to load; the bundled demo graph when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    pub visible_groups: Vec<Group>,
    pub show_links: bool,
    pub show_labels: bool,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,
    pub perf_budget_ms: f32,
    pub perf_window: usize,
    pub default_camera: Camera,
    pub layout: LayoutParams,
    pub pipeline: PipelineParams,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let zoom = ZoomRange::default();
        Self {
            dataset: None,
            visible_groups: Group::ALL.to_vec(),
            show_links: true,
            show_labels: true,
            zoom_min: zoom.min,
            zoom_max: zoom.max,
            zoom_step: 2.0,
            perf_budget_ms: DEFAULT_BUDGET.as_secs_f32() * 1000.0,
            perf_window: DEFAULT_WINDOW,
            default_camera: Camera::DEFAULT,
            layout: LayoutParams::default(),
            pipeline: PipelineParams::default(),
        }
    }
}

impl ViewerConfig {
    pub fn filter(&self) -> VisibilityFilter {
        VisibilityFilter::only(self.visible_groups.iter().copied())
    }

    pub fn zoom_range(&self) -> ZoomRange {
        ZoomRange {
            min: self.zoom_min.min(self.zoom_max),
            max: self.zoom_max.max(self.zoom_min),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        let budget = Duration::try_from_secs_f32(self.perf_budget_ms.max(0.1) / 1000.0)
            .unwrap_or(DEFAULT_BUDGET);
        SessionConfig {
            layout: self.layout.clone(),
            pipeline: self.pipeline.clone(),
            default_camera: self.default_camera,
            zoom_range: self.zoom_range(),
            perf: PerfMonitor::new(budget, self.perf_window),
            seed: None,
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "knowgraph")?;
    Some(proj.config_dir().join("viewer.toml"))
}

pub fn load_or_default() -> ViewerConfig {
    let Some(path) = config_file_path() else {
        return ViewerConfig::default();
    };
    load_or_default_from_path(&path)
}

fn load_or_default_from_path(path: &Path) -> ViewerConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return ViewerConfig::default();
    };
    toml::from_str(&contents).unwrap_or_else(|err| {
        bevy::log::warn!(path = %path.display(), error = %err, "ignoring malformed viewer config");
        ViewerConfig::default()
    })
}

pub fn save(cfg: &ViewerConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

fn save_to_path(cfg: &ViewerConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize viewer config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write viewer config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn viewer_config_roundtrip_save_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        let mut cfg = ViewerConfig::default();
        cfg.dataset = Some(PathBuf::from("/data/graph.json"));
        cfg.visible_groups = vec![Group::Core, Group::Crm];
        cfg.layout.damping = 0.9;

        save_to_path(&cfg, &path).expect("save config");
        let loaded = load_or_default_from_path(&path);

        assert_eq!(cfg, loaded);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        fs::write(
            &path,
            r#"
visible_groups = ["erp", "finance"]

[layout]
repulsion = 2500.0
"#,
        )
        .expect("write config");

        let cfg = load_or_default_from_path(&path);
        assert_eq!(cfg.filter(), VisibilityFilter::only([Group::Erp, Group::Finance]));
        assert_eq!(cfg.layout.repulsion, 2500.0);
        assert_eq!(cfg.layout.damping, LayoutParams::default().damping);
        assert!(cfg.show_links);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        fs::write(&path, "visible_groups = [\"marketing\"]").expect("write config");
        assert_eq!(load_or_default_from_path(&path), ViewerConfig::default());
        assert_eq!(
            load_or_default_from_path(&dir.path().join("missing.toml")),
            ViewerConfig::default()
        );
    }

    #[test]
    fn infinite_values_do_not_break_the_session() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        fs::write(
            &path,
            r#"
perf_budget_ms = inf

[layout]
spawn_jitter = inf
"#,
        )
        .expect("write config");

        let cfg = load_or_default_from_path(&path);
        assert!(cfg.perf_budget_ms.is_infinite());
        assert!(cfg.layout.spawn_jitter.is_infinite());

        let session_cfg = cfg.session_config();
        assert_eq!(session_cfg.perf.budget(), DEFAULT_BUDGET);

        let data = knowgraph_core::GraphData::demo().expect("demo dataset");
        let mut session = knowgraph_core::GraphSession::new(data, Camera::DEFAULT, session_cfg);
        session.initialize(cfg.filter());
        assert!(session
            .engine()
            .nodes()
            .iter()
            .all(|n| n.position.is_some_and(|p| p.is_finite())));
    }

    #[test]
    fn inverted_zoom_range_is_normalized() {
        let cfg = ViewerConfig {
            zoom_min: 900.0,
            zoom_max: -200.0,
            ..ViewerConfig::default()
        };
        let range = cfg.zoom_range();
        assert_eq!((range.min, range.max), (-200.0, 900.0));
    }
}
