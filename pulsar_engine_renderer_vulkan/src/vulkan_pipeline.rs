/// VulkanPipeline - graphics pipeline creation from a PipelineDesc
///
/// Shader modules are built from the SPIR-V bytes in the description and
/// destroyed again once the pipeline exists. Viewport and scissor are
/// dynamic so a pipeline survives ordinary window resizes; it is rebuilt
/// only when the chain's attachment formats change.

use ash::vk;
use pulsar_engine::engine_err;
use pulsar_engine::pulsar::graphics::{Pipeline, PipelineDesc};
use pulsar_engine::pulsar::{Error, Result};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::VulkanShared;
use crate::vulkan_convert::{
    compare_op_to_vk, cull_mode_to_vk, topology_to_vk, vertex_format_to_vk,
};

const SOURCE: &str = "pulsar::vulkan";

/// Compiled Vulkan graphics pipeline with its layout
pub struct VulkanPipeline {
    shared: Arc<VulkanShared>,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
    push_constant_size: u32,
}

impl VulkanPipeline {
    pub(crate) fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub(crate) fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Pipeline for VulkanPipeline {
    fn push_constant_size(&self) -> u32 {
        self.push_constant_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            self.shared.device.destroy_pipeline(self.pipeline, None);
            self.shared.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Build a shader module from SPIR-V bytes
///
/// The bytes may come from an arbitrary Vec with no alignment guarantee,
/// so they are re-packed into u32 words instead of reinterpreted in place.
fn create_shader_module(shared: &VulkanShared, code: &[u8]) -> Result<vk::ShaderModule> {
    if code.is_empty() || code.len() % 4 != 0 {
        return Err(engine_err!(
            SOURCE,
            Error::PipelineCreation,
            "Shader code size {} is not a positive multiple of 4",
            code.len()
        ));
    }

    let words: Vec<u32> = code
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    let create_info = vk::ShaderModuleCreateInfo::default().code(&words);

    unsafe {
        shared
            .device
            .create_shader_module(&create_info, None)
            .map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::PipelineCreation,
                    "Failed to create shader module: {:?}",
                    e
                )
            })
    }
}

/// Create a graphics pipeline targeting the given render pass
pub(crate) fn create_graphics_pipeline(
    shared: Arc<VulkanShared>,
    render_pass: vk::RenderPass,
    desc: &PipelineDesc,
) -> Result<VulkanPipeline> {
    unsafe {
        let vertex_module = create_shader_module(&shared, &desc.vertex_shader)?;
        let fragment_module = match create_shader_module(&shared, &desc.fragment_shader) {
            Ok(module) => module,
            Err(e) => {
                shared.device.destroy_shader_module(vertex_module, None);
                return Err(e);
            }
        };

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(c"main"),
        ];

        // Vertex input: single interleaved binding
        let vertex_bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: desc.vertex_layout.stride,
            input_rate: vk::VertexInputRate::VERTEX,
        }];

        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: 0,
                format: vertex_format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        // Viewport state (dynamic)
        let viewports = [vk::Viewport::default()];
        let scissors = [vk::Rect2D::default()];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(desc.cull_mode))
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth_test)
            .depth_write_enable(desc.depth_write)
            .depth_compare_op(compare_op_to_vk(desc.depth_compare))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false);

        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment));

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // Pipeline layout with the push constant range, if any
        let push_ranges = [vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(desc.push_constant_size)];

        let layout_create_info = if desc.push_constant_size > 0 {
            vk::PipelineLayoutCreateInfo::default().push_constant_ranges(&push_ranges)
        } else {
            vk::PipelineLayoutCreateInfo::default()
        };

        let layout = shared
            .device
            .create_pipeline_layout(&layout_create_info, None)
            .map_err(|e| {
                shared.device.destroy_shader_module(vertex_module, None);
                shared.device.destroy_shader_module(fragment_module, None);
                engine_err!(
                    SOURCE,
                    Error::PipelineCreation,
                    "Failed to create pipeline layout: {:?}",
                    e
                )
            })?;

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = shared
            .device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
            .map_err(|e| {
                shared.device.destroy_pipeline_layout(layout, None);
                shared.device.destroy_shader_module(vertex_module, None);
                shared.device.destroy_shader_module(fragment_module, None);
                engine_err!(
                    SOURCE,
                    Error::PipelineCreation,
                    "Failed to create graphics pipeline: {:?}",
                    e.1
                )
            })?;

        let pipeline = pipelines[0];

        // Modules are compiled into the pipeline and no longer needed
        shared.device.destroy_shader_module(vertex_module, None);
        shared.device.destroy_shader_module(fragment_module, None);

        Ok(VulkanPipeline {
            shared,
            pipeline,
            layout,
            push_constant_size: desc.push_constant_size,
        })
    }
}
