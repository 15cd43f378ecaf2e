/// Swap image chain traits - presentation surface image management
///
/// A swap image chain owns the presentable images, their views, the depth
/// buffer, the render pass and framebuffers, and the per-slot GPU/CPU
/// synchronization primitives. Chains are immutable once built: a window
/// resize produces a wholly new chain through the factory, never a mutated
/// one.

use std::any::Any;
use crate::error::Result;
use crate::graphics::CommandList;
use crate::window::Extent2d;

/// Background clear color recorded by begin_render_pass (RGBA)
pub const CLEAR_COLOR: [f32; 4] = [0.01, 0.01, 0.01, 1.0];

/// Depth buffer clear value recorded by begin_render_pass
pub const CLEAR_DEPTH: f32 = 1.0;

/// Texture format of a chain attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Bgra8Srgb,
    Rgba8Srgb,
    D32Float,
    D32FloatS8,
    D24UnormS8,
}

/// Color and depth formats of a chain's attachments
///
/// Two chains with equal SurfaceFormats have compatible render passes:
/// pipelines built against one remain valid against the other. Recreation
/// compares the old and new chain's formats to decide whether dependent
/// pipelines must be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFormats {
    pub color: TextureFormat,
    pub depth: TextureFormat,
}

/// Outcome of acquiring the next presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// Image acquired; render normally
    Ready(u32),
    /// Image acquired but the chain no longer matches the surface exactly;
    /// render this frame, then recreate
    Suboptimal(u32),
    /// No image could be acquired; the chain must be recreated before the
    /// next frame
    OutOfDate,
}

/// Outcome of presenting a rendered image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Ready,
    Suboptimal,
    OutOfDate,
}

/// Swap image chain
///
/// Fatal backend failures surface as `Err`; the OutOfDate/Suboptimal
/// conditions are ordinary values because they are part of the normal
/// resize flow.
pub trait SwapImageChain: Send + Sync {
    /// Acquire the next presentable image
    ///
    /// Blocks until the frame slot's in-flight fence signals, so at most
    /// one recorded command list per slot is ever pending on the GPU.
    fn acquire_next_image(&mut self) -> Result<AcquireResult>;

    /// Submit a recorded command list for the given image and present it
    ///
    /// Waits on the image-available semaphore, signals the render-finished
    /// semaphore, re-arms the slot fence, presents, then advances to the
    /// next frame slot.
    ///
    /// # Arguments
    ///
    /// * `command_list` - Fully recorded command list for this frame
    /// * `image_index` - Index returned by acquire_next_image
    fn submit(
        &mut self,
        command_list: &mut dyn CommandList,
        image_index: u32,
    ) -> Result<PresentResult>;

    /// Record the render pass entry for the given image into a command list
    ///
    /// Clears color to CLEAR_COLOR and depth to CLEAR_DEPTH, and sets a
    /// full-extent viewport and scissor.
    ///
    /// # Arguments
    ///
    /// * `command_list` - Command list currently recording
    /// * `image_index` - Index returned by acquire_next_image
    fn begin_render_pass(
        &self,
        command_list: &mut dyn CommandList,
        image_index: u32,
    ) -> Result<()>;

    /// Number of images in the chain (always >= 2)
    fn image_count(&self) -> usize;

    /// Extent the chain was built for
    fn extent(&self) -> Extent2d;

    /// Attachment formats (render pass compatibility key)
    fn surface_formats(&self) -> SurfaceFormats;

    /// Downcast support for backends that need the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Factory building swap image chains
///
/// Owns whatever backend state chain construction needs (device handles,
/// the surface). The previous chain, when given, may be consulted as a
/// creation hint (Vulkan's old-swapchain) and is destroyed on return.
pub trait SwapChainFactory: Send + Sync {
    /// Build a chain for the given extent
    ///
    /// # Arguments
    ///
    /// * `extent` - Requested framebuffer extent (never degenerate)
    /// * `previous` - Chain being replaced, if any
    fn build(
        &mut self,
        extent: Extent2d,
        previous: Option<Box<dyn SwapImageChain>>,
    ) -> Result<Box<dyn SwapImageChain>>;
}
