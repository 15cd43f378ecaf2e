/// VulkanGeometryBuffer - GPU-resident vertex buffer

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use pulsar_engine::engine_err;
use pulsar_engine::pulsar::graphics::GeometryBuffer;
use pulsar_engine::pulsar::{Error, Result};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::VulkanShared;

const SOURCE: &str = "pulsar::vulkan";

/// Immutable vertex buffer, uploaded once at creation
///
/// Allocated CpuToGpu and written through the persistent mapping, which is
/// plenty for the small interleaved vertex streams the engine feeds it.
pub struct VulkanGeometryBuffer {
    shared: Arc<VulkanShared>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    vertex_count: u32,
}

impl VulkanGeometryBuffer {
    pub(crate) fn new(
        shared: Arc<VulkanShared>,
        vertex_data: &[u8],
        vertex_count: u32,
    ) -> Result<Self> {
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(vertex_data.len() as u64)
                .usage(vk::BufferUsageFlags::VERTEX_BUFFER)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = shared
                .device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::Backend,
                        "Failed to create vertex buffer: {:?}",
                        e
                    )
                })?;

            let requirements = shared.device.get_buffer_memory_requirements(buffer);

            let mut allocation = shared
                .allocator
                .lock()
                .map_err(|_| engine_err!(SOURCE, Error::Backend, "Allocator lock poisoned"))?
                .allocate(&AllocationCreateDesc {
                    name: "vertex buffer",
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| Error::OutOfMemory)?;

            shared
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::Backend,
                        "Failed to bind vertex buffer memory: {:?}",
                        e
                    )
                })?;

            let mapped = allocation.mapped_slice_mut().ok_or_else(|| {
                engine_err!(
                    SOURCE,
                    Error::Backend,
                    "Vertex buffer allocation is not host visible"
                )
            })?;
            mapped[..vertex_data.len()].copy_from_slice(vertex_data);

            Ok(Self {
                shared,
                buffer,
                allocation: Some(allocation),
                vertex_count,
            })
        }
    }

    /// Raw buffer handle for binding
    pub(crate) fn buffer(&self) -> vk::Buffer {
        self.buffer
    }
}

impl GeometryBuffer for VulkanGeometryBuffer {
    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanGeometryBuffer {
    fn drop(&mut self) {
        unsafe {
            self.shared.device.destroy_buffer(self.buffer, None);
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.shared.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
        }
    }
}
