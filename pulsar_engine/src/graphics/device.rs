/// GraphicsDevice trait - factory for GPU resources

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics::{CommandList, Pipeline, PipelineDesc, SwapImageChain};

/// Renderer configuration
///
/// Consumed by the backend when it creates its instance and device.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Pulsar Application".to_string(),
            app_version: (1, 0, 0),
        }
    }
}

/// Graphics device - creates command lists, geometry and pipelines
///
/// One device exists per application. The frame orchestrator holds it
/// behind `Arc<Mutex<dyn GraphicsDevice>>` so the application can keep
/// using it for resource creation between frames.
pub trait GraphicsDevice: Send + Sync {
    /// Block until the GPU has finished all submitted work
    ///
    /// Called before swapchain recreation and before teardown.
    fn wait_idle(&self) -> Result<()>;

    /// Allocate primary command lists
    ///
    /// The orchestrator allocates one per swap image and re-allocates only
    /// when recreation changes the image count.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of command lists to allocate
    fn allocate_command_lists(&mut self, count: usize) -> Result<Vec<Box<dyn CommandList>>>;

    /// Create an immutable GPU vertex buffer
    ///
    /// # Arguments
    ///
    /// * `vertex_data` - Raw interleaved vertex bytes
    /// * `vertex_count` - Number of vertices in the data (at least 3)
    fn create_geometry(
        &mut self,
        vertex_data: &[u8],
        vertex_count: u32,
    ) -> Result<Arc<dyn GeometryBuffer>>;

    /// Create a graphics pipeline compatible with the given chain
    ///
    /// # Arguments
    ///
    /// * `chain` - Chain whose render pass the pipeline targets
    /// * `desc` - Pipeline description
    fn create_pipeline(
        &mut self,
        chain: &dyn SwapImageChain,
        desc: &PipelineDesc,
    ) -> Result<Arc<dyn Pipeline>>;
}

/// Immutable GPU-resident vertex buffer
///
/// Shared between objects via `Arc`; destroyed when the last reference
/// drops.
pub trait GeometryBuffer: Send + Sync {
    /// Number of vertices in the buffer
    fn vertex_count(&self) -> u32;

    /// Downcast support for backends that need the concrete type
    fn as_any(&self) -> &dyn Any;
}
