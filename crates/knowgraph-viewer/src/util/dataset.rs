use anyhow::Context;
use knowgraph_core::GraphData;
use std::fs;
use std::path::Path;

pub fn read_dataset(path: &Path) -> anyhow::Result<GraphData> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    GraphData::from_json(&text).with_context(|| format!("invalid dataset {}", path.display()))
}

/// The configured dataset, or the bundled demo graph when none is set or it
/// cannot be loaded.
pub fn load_or_demo(path: Option<&Path>) -> GraphData {
    if let Some(path) = path {
        match read_dataset(path) {
            Ok(data) => return data,
            Err(err) => {
                bevy::log::warn!(error = %format!("{err:#}"), "falling back to demo graph");
            }
        }
    }
    GraphData::demo().unwrap_or_else(|err| {
        bevy::log::error!(error = %format!("{err:#}"), "bundled demo graph is invalid");
        GraphData::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_dataset_from_disk() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("graph.json");
        fs::write(
            &path,
            r#"{"nodes":[{"id":"a","group":"ai","label":"A"}],"links":[]}"#,
        )
        .expect("write dataset");

        let data = load_or_demo(Some(&path));
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].label, "A");
    }

    #[test]
    fn bad_or_missing_dataset_falls_back_to_demo() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("graph.json");
        fs::write(&path, "[]").expect("write dataset");

        let err = read_dataset(&path).expect_err("not a dataset");
        assert!(format!("{err:#}").contains("invalid dataset"));

        let demo = GraphData::demo().expect("demo dataset");
        assert_eq!(load_or_demo(Some(&path)), demo);
        assert_eq!(load_or_demo(Some(&dir.path().join("missing.json"))), demo);
        assert_eq!(load_or_demo(None), demo);
    }
}
