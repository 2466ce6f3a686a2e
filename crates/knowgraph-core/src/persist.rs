use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Context;

use crate::Camera;

pub const CAMERA_KEY: &str = "camera";

/// A simple persistent key-value slot.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    slots: RefCell<HashMap<String, String>>,
    writes: RefCell<usize>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        *self.writes.borrow()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

/// Missing, malformed or non-finite state falls back to `fallback`.
pub fn load_camera(store: &dyn KvStore, fallback: Camera) -> Camera {
    let Some(raw) = store.get(CAMERA_KEY) else {
        return fallback;
    };
    match serde_json::from_str::<Camera>(&raw) {
        Ok(cam) if cam.is_finite() && cam.fov > 0.0 => cam,
        Ok(cam) => {
            tracing::debug!(?cam, "stored camera is degenerate, using default");
            fallback
        }
        Err(err) => {
            tracing::debug!(%err, "stored camera is malformed, using default");
            fallback
        }
    }
}

pub fn save_camera(store: &dyn KvStore, camera: &Camera) -> anyhow::Result<()> {
    let data = serde_json::to_string(camera).context("failed to serialize camera")?;
    store
        .set(CAMERA_KEY, &data)
        .with_context(|| format!("failed to write {CAMERA_KEY} slot"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_roundtrip_through_store() {
        let store = MemoryKvStore::new();
        let cam = Camera {
            x: 12.5,
            y: -4.0,
            z: 300.0,
            fov: 650.0,
        };
        save_camera(&store, &cam).expect("save camera");
        assert_eq!(load_camera(&store, Camera::DEFAULT), cam);
    }

    #[test]
    fn missing_or_malformed_camera_falls_back() {
        let store = MemoryKvStore::new();
        assert_eq!(load_camera(&store, Camera::DEFAULT), Camera::DEFAULT);

        store.set(CAMERA_KEY, "{\"x\": 1}").expect("set");
        assert_eq!(load_camera(&store, Camera::DEFAULT), Camera::DEFAULT);

        store.set(CAMERA_KEY, "not json").expect("set");
        assert_eq!(load_camera(&store, Camera::DEFAULT), Camera::DEFAULT);

        store
            .set(CAMERA_KEY, r#"{"x":0,"y":0,"z":0,"fov":0}"#)
            .expect("set");
        assert_eq!(load_camera(&store, Camera::DEFAULT), Camera::DEFAULT);
    }
}
