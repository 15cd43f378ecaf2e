/// Pipeline trait and description - graphics pipeline state
///
/// A pipeline is built once against a swap image chain's render pass and
/// rebuilt only when recreation reports changed surface formats. The
/// description bakes the fixed-function state; viewport and scissor stay
/// dynamic so pipelines survive ordinary window resizes.

use std::any::Any;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Maximum push-constant payload every backend is required to support
pub const MAX_PUSH_CONSTANT_SIZE: u32 = 128;

/// Opaque compiled graphics pipeline
pub trait Pipeline: Send + Sync {
    /// Push-constant range size in bytes (0 when the pipeline has none)
    fn push_constant_size(&self) -> u32;

    /// Downcast support for backends that need the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Primitive assembly topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Depth comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Always,
}

/// Per-vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    /// Size of one attribute of this format in bytes
    pub fn size(&self) -> u32 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// One vertex attribute (location + format + byte offset within the vertex)
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u32,
}

/// Vertex buffer layout for binding 0
#[derive(Debug, Clone)]
pub struct VertexLayout {
    /// Byte distance between consecutive vertices
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

/// Standard vertex: interleaved position + color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    /// Create a vertex from position and color vectors
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }

    /// Layout of this vertex type at binding 0
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Vertex>() as u32,
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    format: VertexFormat::Float32x3,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    format: VertexFormat::Float32x3,
                    offset: 12,
                },
            ],
        }
    }
}

/// Graphics pipeline description
///
/// `default_desc()` gives the forward-rendering defaults: triangle list,
/// no culling, single-sample, blending off, depth test+write with Less,
/// dynamic viewport and scissor.
#[derive(Clone)]
pub struct PipelineDesc {
    /// Compiled SPIR-V for the vertex stage
    pub vertex_shader: Vec<u8>,
    /// Compiled SPIR-V for the fragment stage
    pub fragment_shader: Vec<u8>,
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareOp,
    /// Push-constant range size in bytes, visible to both stages
    pub push_constant_size: u32,
    pub vertex_layout: VertexLayout,
}

impl PipelineDesc {
    /// Forward-rendering defaults for the given shader pair
    ///
    /// # Arguments
    ///
    /// * `vertex_shader` - Compiled SPIR-V bytes for the vertex stage
    /// * `fragment_shader` - Compiled SPIR-V bytes for the fragment stage
    pub fn default_desc(vertex_shader: Vec<u8>, fragment_shader: Vec<u8>) -> Self {
        Self {
            vertex_shader,
            fragment_shader,
            topology: PrimitiveTopology::TriangleList,
            cull_mode: CullMode::None,
            depth_test: true,
            depth_write: true,
            depth_compare: CompareOp::Less,
            push_constant_size: 0,
            vertex_layout: Vertex::layout(),
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
