/// Conversions between engine enums and Vulkan enums

use ash::vk;
use pulsar_engine::pulsar::graphics::{
    CompareOp, CullMode, PrimitiveTopology, TextureFormat, VertexFormat,
};

/// Convert an engine texture format to a Vulkan format
pub fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::Bgra8Srgb => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::D32Float => vk::Format::D32_SFLOAT,
        TextureFormat::D32FloatS8 => vk::Format::D32_SFLOAT_S8_UINT,
        TextureFormat::D24UnormS8 => vk::Format::D24_UNORM_S8_UINT,
    }
}

/// Convert a Vulkan format to an engine texture format
///
/// Falls back to Bgra8Srgb for formats outside the chain attachment set.
pub fn vk_format_to_texture_format(format: vk::Format) -> TextureFormat {
    match format {
        vk::Format::B8G8R8A8_SRGB => TextureFormat::Bgra8Srgb,
        vk::Format::R8G8B8A8_SRGB => TextureFormat::Rgba8Srgb,
        vk::Format::D32_SFLOAT => TextureFormat::D32Float,
        vk::Format::D32_SFLOAT_S8_UINT => TextureFormat::D32FloatS8,
        vk::Format::D24_UNORM_S8_UINT => TextureFormat::D24UnormS8,
        _ => TextureFormat::Bgra8Srgb,
    }
}

/// Convert a primitive topology to the Vulkan topology
pub fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
    }
}

/// Convert a cull mode to Vulkan cull mode flags
pub fn cull_mode_to_vk(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

/// Convert a depth comparison operator to the Vulkan compare op
pub fn compare_op_to_vk(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::Never => vk::CompareOp::NEVER,
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::Equal => vk::CompareOp::EQUAL,
        CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

/// Convert a vertex attribute format to the Vulkan format
pub fn vertex_format_to_vk(format: VertexFormat) -> vk::Format {
    match format {
        VertexFormat::Float32x2 => vk::Format::R32G32_SFLOAT,
        VertexFormat::Float32x3 => vk::Format::R32G32B32_SFLOAT,
        VertexFormat::Float32x4 => vk::Format::R32G32B32A32_SFLOAT,
    }
}

#[cfg(test)]
#[path = "vulkan_convert_tests.rs"]
mod tests;
