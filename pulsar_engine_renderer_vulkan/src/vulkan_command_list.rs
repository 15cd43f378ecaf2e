/// VulkanCommandList - Vulkan implementation of the CommandList trait

use ash::vk;
use pulsar_engine::engine_err;
use pulsar_engine::pulsar::graphics::{
    CommandList, GeometryBuffer, Pipeline, Rect2d, Viewport,
};
use pulsar_engine::pulsar::{Error, Result};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::VulkanShared;
use crate::vulkan_geometry::VulkanGeometryBuffer;
use crate::vulkan_pipeline::VulkanPipeline;

const SOURCE: &str = "pulsar::vulkan";

/// Vulkan primary command buffer wrapper
///
/// One exists per frame slot. The buffer is freed back to the context's
/// pool on drop.
pub struct VulkanCommandList {
    shared: Arc<VulkanShared>,
    command_buffer: vk::CommandBuffer,
}

impl VulkanCommandList {
    pub(crate) fn new(shared: Arc<VulkanShared>, command_buffer: vk::CommandBuffer) -> Self {
        Self {
            shared,
            command_buffer,
        }
    }

    /// Raw command buffer handle for submission and render pass recording
    pub(crate) fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn pipeline_of(pipeline: &Arc<dyn Pipeline>) -> Result<&VulkanPipeline> {
        pipeline
            .as_any()
            .downcast_ref::<VulkanPipeline>()
            .ok_or_else(|| {
                engine_err!(SOURCE, Error::Backend, "Pipeline is not a Vulkan pipeline")
            })
    }
}

impl CommandList for VulkanCommandList {
    fn begin(&mut self) -> Result<()> {
        unsafe {
            self.shared
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::Backend,
                        "Failed to reset command buffer: {:?}",
                        e
                    )
                })?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.shared
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::Backend,
                        "Failed to begin command buffer: {:?}",
                        e
                    )
                })
        }
    }

    fn end(&mut self) -> Result<()> {
        unsafe {
            self.shared
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::Backend,
                        "Failed to end command buffer: {:?}",
                        e
                    )
                })
        }
    }

    fn end_render_pass(&mut self) -> Result<()> {
        unsafe {
            self.shared.device.cmd_end_render_pass(self.command_buffer);
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        unsafe {
            let vk_viewport = vk::Viewport::default()
                .x(viewport.x)
                .y(viewport.y)
                .width(viewport.width)
                .height(viewport.height)
                .min_depth(viewport.min_depth)
                .max_depth(viewport.max_depth);
            self.shared
                .device
                .cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2d) -> Result<()> {
        unsafe {
            let vk_scissor = vk::Rect2D {
                offset: vk::Offset2D {
                    x: scissor.x,
                    y: scissor.y,
                },
                extent: vk::Extent2D {
                    width: scissor.width,
                    height: scissor.height,
                },
            };
            self.shared
                .device
                .cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        let vulkan_pipeline = Self::pipeline_of(pipeline)?;
        unsafe {
            self.shared.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vulkan_pipeline.pipeline(),
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, pipeline: &Arc<dyn Pipeline>, data: &[u8]) -> Result<()> {
        let vulkan_pipeline = Self::pipeline_of(pipeline)?;
        if data.len() as u32 > vulkan_pipeline.push_constant_size() {
            return Err(engine_err!(
                SOURCE,
                Error::Backend,
                "Push constant data ({} bytes) exceeds the pipeline's range ({} bytes)",
                data.len(),
                vulkan_pipeline.push_constant_size()
            ));
        }
        unsafe {
            self.shared.device.cmd_push_constants(
                self.command_buffer,
                vulkan_pipeline.layout(),
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn GeometryBuffer>) -> Result<()> {
        let geometry = buffer
            .as_any()
            .downcast_ref::<VulkanGeometryBuffer>()
            .ok_or_else(|| {
                engine_err!(SOURCE, Error::Backend, "Buffer is not a Vulkan buffer")
            })?;
        unsafe {
            self.shared.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                0,
                &[geometry.buffer()],
                &[0],
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        unsafe {
            self.shared
                .device
                .cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for VulkanCommandList {
    fn drop(&mut self) {
        unsafe {
            if let Ok(pool) = self.shared.command_pool.lock() {
                self.shared
                    .device
                    .free_command_buffers(*pool, &[self.command_buffer]);
            }
        }
    }
}
