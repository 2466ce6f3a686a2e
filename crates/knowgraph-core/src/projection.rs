use glam::{Vec2, Vec3};

use crate::Camera;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub screen: Vec2,
    pub scale: f32,
}

impl Projected {
    /// False for points at or behind the camera plane, and for the NaN/inf
    /// output of a degenerate camera.
    pub fn is_visible(&self) -> bool {
        self.scale > 0.0 && self.scale.is_finite() && self.screen.is_finite()
    }
}

/// Perspective-divides `point` through `camera` onto a `width` x `height`
/// surface with the origin at its center.
pub fn project(point: Vec3, camera: &Camera, width: f32, height: f32) -> Projected {
    let scale = camera.fov / (camera.fov + point.z + camera.z);
    Projected {
        screen: Vec2::new(
            (point.x + camera.x) * scale + width / 2.0,
            (point.y + camera.y) * scale + height / 2.0,
        ),
        scale,
    }
}

/// Inverse of `project` for a point at world depth `z`. None when that depth
/// is on or behind the camera plane.
pub fn unproject(screen: Vec2, z: f32, camera: &Camera, width: f32, height: f32) -> Option<Vec3> {
    let scale = camera.fov / (camera.fov + z + camera.z);
    if !(scale > 0.0 && scale.is_finite()) {
        return None;
    }
    Some(Vec3::new(
        (screen.x - width / 2.0) / scale - camera.x,
        (screen.y - height / 2.0) / scale - camera.y,
        z,
    ))
}

/// World-space camera offset that moves content at depth 0 by `delta` pixels.
pub fn screen_delta_to_pan(delta: Vec2, camera: &Camera) -> Vec2 {
    let scale = camera.fov / (camera.fov + camera.z);
    if scale > 0.0 && scale.is_finite() {
        delta / scale
    } else {
        Vec2::ZERO
    }
}
