/*!
# Pulsar Engine - Vulkan Renderer Backend

Vulkan implementation of the Pulsar engine's graphics traits.

This crate implements `GraphicsDevice`, `SwapImageChain`, `SwapChainFactory`,
`CommandList`, `Pipeline` and `GeometryBuffer` using the Ash library for
Vulkan bindings and gpu-allocator for memory management.

Typical wiring:

```no_run
use pulsar_engine_renderer_vulkan::VulkanContext;
use pulsar_engine::pulsar::graphics::RendererConfig;
# fn wire(window: &winit::window::Window) -> pulsar_engine::pulsar::Result<()> {
let context = VulkanContext::new(window, &RendererConfig::default())?;
let factory = context.swap_chain_factory();
# Ok(())
# }
```

The context and the factory share the device internally; the factory (and
every chain it builds) stays valid for the context's whole lifetime.
*/

// Vulkan implementation modules
mod vulkan_command_list;
mod vulkan_context;
mod vulkan_geometry;
mod vulkan_pipeline;
mod vulkan_swapchain;

pub mod vulkan_convert;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub use vulkan_command_list::VulkanCommandList;
pub use vulkan_context::VulkanContext;
pub use vulkan_geometry::VulkanGeometryBuffer;
pub use vulkan_pipeline::VulkanPipeline;
pub use vulkan_swapchain::{VulkanSwapChain, VulkanSwapChainFactory};
