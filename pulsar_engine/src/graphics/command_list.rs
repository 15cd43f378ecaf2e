/// CommandList trait - for recording rendering commands

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics::{GeometryBuffer, Pipeline};

/// Command list for recording rendering commands
///
/// One command list exists per swap image slot. Recording happens between
/// begin() and end(); the recorded list is then handed to
/// SwapImageChain::submit() for execution and presentation.
///
/// Render pass entry is NOT on this trait: the swap image chain owns the
/// render pass and framebuffers, so SwapImageChain::begin_render_pass()
/// records the pass entry into a command list passed to it.
pub trait CommandList: Send + Sync {
    /// Begin recording commands
    ///
    /// Implicitly resets any previously recorded contents.
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Set the viewport
    ///
    /// # Arguments
    ///
    /// * `viewport` - Viewport dimensions and depth range
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the scissor rectangle
    ///
    /// # Arguments
    ///
    /// * `scissor` - Scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2d) -> Result<()>;

    /// Bind a graphics pipeline
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline to bind
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()>;

    /// Push constants through the given pipeline's layout
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline whose push-constant range receives the data
    /// * `data` - Data to push (at most 128 bytes)
    fn push_constants(&mut self, pipeline: &Arc<dyn Pipeline>, data: &[u8]) -> Result<()>;

    /// Bind a vertex buffer at binding 0
    ///
    /// # Arguments
    ///
    /// * `buffer` - Geometry buffer to bind
    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn GeometryBuffer>) -> Result<()>;

    /// Draw vertices
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Number of vertices to draw
    /// * `first_vertex` - Index of first vertex
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Downcast support for backends that need the concrete type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 2D rectangle
#[derive(Debug, Clone, Copy)]
pub struct Rect2d {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}
