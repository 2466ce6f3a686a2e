pub mod camera;
pub mod spatial;

pub use camera::{flush_camera_on_exit, persist_camera, pointer_input, setup_scene};
pub use spatial::{draw_scene, group_color, project_scene};
