/// Scene module - game objects, transforms, geometry sharing, drawing

// Module declarations
pub mod transform;
pub mod game_object;
pub mod scene;
pub mod render_system;

// Re-export everything
pub use transform::*;
pub use game_object::*;
pub use scene::*;
pub use render_system::*;
