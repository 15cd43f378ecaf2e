/// Graphics module - backend-agnostic GPU types and traits
///
/// The engine core records frames and manages the swapchain lifecycle
/// purely through these traits; concrete backends (Vulkan) implement them
/// in a separate crate, and test doubles implement them in-process.

// Module declarations
pub mod device;
pub mod command_list;
pub mod pipeline;
pub mod swapchain;
pub mod shader;

#[cfg(test)]
pub mod mock_graphics;

// Re-export everything
pub use device::*;
pub use command_list::*;
pub use pipeline::*;
pub use swapchain::*;
pub use shader::*;
