pub mod input;
pub mod layout;
pub mod state;

pub use input::PointerSample;
pub use layout::physics_tick;
pub use state::{Drag, GraphState};
