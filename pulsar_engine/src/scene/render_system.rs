/// Render system - records draw commands for a scene
///
/// Owns the graphics pipeline and the per-object push constant traffic.
/// The pipeline is built once against the orchestrator's chain and rebuilt
/// only when the orchestrator reports changed surface formats.

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use std::f32::consts::TAU;

use crate::engine_err;
use crate::error::{Error, Result};
use crate::graphics::{
    CommandList, GraphicsDevice, Pipeline, PipelineDesc, SwapImageChain,
};
use crate::scene::scene::{GeometryKey, Scene};

const SOURCE: &str = "pulsar::RenderSystem";

/// Per-object push constant block
///
/// Matches the shader-side layout: a std430 mat4 followed by a vec3 that
/// the shader rules align to 16 bytes, hence the explicit trailing pad.
/// 80 bytes total, well under the 128-byte push constant floor.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PushConstantData {
    /// Object-to-world matrix, column major
    pub transform: [[f32; 4]; 4],
    /// Object color (linear RGB)
    pub color: [f32; 3],
    pub _pad: f32,
}

/// Scene draw delegate
pub struct RenderSystem {
    pipeline: Arc<dyn Pipeline>,
    desc: PipelineDesc,
}

impl RenderSystem {
    /// Build the render system's pipeline against the given chain
    ///
    /// # Arguments
    ///
    /// * `device` - Device creating the pipeline
    /// * `chain` - Chain whose render pass the pipeline targets
    /// * `vertex_shader` - Compiled SPIR-V bytes for the vertex stage
    /// * `fragment_shader` - Compiled SPIR-V bytes for the fragment stage
    pub fn new(
        device: &mut dyn GraphicsDevice,
        chain: &dyn SwapImageChain,
        vertex_shader: Vec<u8>,
        fragment_shader: Vec<u8>,
    ) -> Result<Self> {
        let mut desc = PipelineDesc::default_desc(vertex_shader, fragment_shader);
        desc.push_constant_size = std::mem::size_of::<PushConstantData>() as u32;

        let pipeline = device.create_pipeline(chain, &desc)?;
        Ok(Self { pipeline, desc })
    }

    /// Rebuild the pipeline after the chain's surface formats changed
    ///
    /// # Arguments
    ///
    /// * `device` - Device creating the pipeline
    /// * `chain` - The recreated chain
    pub fn rebuild_pipeline(
        &mut self,
        device: &mut dyn GraphicsDevice,
        chain: &dyn SwapImageChain,
    ) -> Result<()> {
        self.pipeline = device.create_pipeline(chain, &self.desc)?;
        Ok(())
    }

    /// Advance the idle animation and record draw commands for every object
    ///
    /// Each object's yaw and pitch advance by `0.001 * ordinal` radians
    /// (1-based spawn order, wrapped to [0, 2π)), so objects spin at rates
    /// proportional to their position in the scene. The pipeline is bound
    /// once; the shared geometry is re-bound only when it changes between
    /// consecutive objects.
    ///
    /// # Arguments
    ///
    /// * `command_list` - Command list recording the current frame
    /// * `scene` - Scene to animate and draw
    pub fn render(&self, command_list: &mut dyn CommandList, scene: &mut Scene) -> Result<()> {
        for (ordinal, object) in scene.objects_mut().iter_mut().enumerate() {
            let step = 0.001 * (ordinal + 1) as f32;
            let rotation = &mut object.transform.rotation;
            rotation.y = (rotation.y + step).rem_euclid(TAU);
            rotation.x = (rotation.x + step).rem_euclid(TAU);
        }

        command_list.bind_pipeline(&self.pipeline)?;

        let mut bound_geometry: Option<GeometryKey> = None;
        for index in 0..scene.object_count() {
            let object = &scene.objects()[index];
            let push = PushConstantData {
                transform: object.transform.matrix().to_cols_array_2d(),
                color: object.color.to_array(),
                _pad: 0.0,
            };
            command_list.push_constants(&self.pipeline, bytemuck::bytes_of(&push))?;

            let key = object.geometry;
            let vertex_count = {
                let buffer = scene.geometry(key).ok_or_else(|| {
                    engine_err!(
                        SOURCE,
                        Error::InvalidResource,
                        "game object {} references dead geometry",
                        object.id()
                    )
                })?;
                if bound_geometry != Some(key) {
                    command_list.bind_vertex_buffer(buffer)?;
                    bound_geometry = Some(key);
                }
                buffer.vertex_count()
            };

            command_list.draw(vertex_count, 0)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "render_system_tests.rs"]
mod tests;
