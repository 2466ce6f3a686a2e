use bevy::prelude::Resource;

use crate::util::store::FileKvStore;

/// Where the camera is persisted. None when no data directory resolves.
#[derive(Resource)]
pub struct CameraStore(pub Option<FileKvStore>);
