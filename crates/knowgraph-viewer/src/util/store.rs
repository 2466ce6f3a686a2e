use anyhow::Context;
use directories::ProjectDirs;
use knowgraph_core::persist::KvStore;
use std::fs;
use std::path::PathBuf;

/// Key-value store backed by one file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store under the platform data directory, if one can be resolved.
    pub fn open_default() -> Option<Self> {
        let proj = ProjectDirs::from("", "", "knowgraph")?;
        Some(Self::new(proj.data_dir().join("state")))
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.dir.join(format!("{key}.json")))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)?).ok()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let Some(path) = self.path_for(key) else {
            anyhow::bail!("invalid store key: {key:?}");
        };
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create store directory {}", self.dir.display()))?;
        // write-then-rename so readers never see a torn value
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowgraph_core::persist::{load_camera, save_camera};
    use knowgraph_core::Camera;
    use tempfile::tempdir;

    #[test]
    fn camera_survives_reopen() {
        let dir = tempdir().expect("tempdir");
        let cam = Camera {
            x: 12.5,
            y: -40.0,
            z: 350.0,
            fov: 800.0,
        };
        save_camera(&FileKvStore::new(dir.path().join("state")), &cam).expect("save camera");

        let reopened = FileKvStore::new(dir.path().join("state"));
        assert_eq!(load_camera(&reopened, Camera::DEFAULT), cam);
    }

    #[test]
    fn missing_or_corrupt_values_fall_back() {
        let dir = tempdir().expect("tempdir");
        let store = FileKvStore::new(dir.path());
        assert_eq!(store.get("camera"), None);
        assert_eq!(load_camera(&store, Camera::DEFAULT), Camera::DEFAULT);

        store.set("camera", "{not json").expect("set raw value");
        assert_eq!(load_camera(&store, Camera::DEFAULT), Camera::DEFAULT);
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let dir = tempdir().expect("tempdir");
        let store = FileKvStore::new(dir.path());
        assert!(store.set("../camera", "{}").is_err());
        assert!(store.set("", "{}").is_err());
        assert_eq!(store.get("../camera"), None);
    }
}
