/// VulkanSwapChain - Vulkan implementation of the SwapImageChain trait
///
/// A chain owns the swapchain, its color image views, one depth image per
/// swap image, the render pass, the framebuffers and the per-slot sync
/// primitives. Chains are immutable: resize goes through the factory, which
/// builds a replacement chain (passing the old handle as the creation hint)
/// and destroys the previous one.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use pulsar_engine::pulsar::graphics::{
    AcquireResult, CommandList, PresentResult, Rect2d, SurfaceFormats, SwapChainFactory,
    SwapImageChain, Viewport, CLEAR_COLOR, CLEAR_DEPTH,
};
use pulsar_engine::pulsar::{Error, Extent2d, Result};
use pulsar_engine::{engine_err, engine_info};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::VulkanShared;
use crate::vulkan_convert::vk_format_to_texture_format;

const SOURCE: &str = "pulsar::vulkan";

/// Depth attachment backing one swap image
struct DepthImage {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

/// Vulkan swap image chain
pub struct VulkanSwapChain {
    shared: Arc<VulkanShared>,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,

    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    depth_images: Vec<DepthImage>,

    formats: SurfaceFormats,
    extent: vk::Extent2D,

    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,

    /// One semaphore per frame slot, signaled when the acquired image is
    /// ready to be rendered to
    image_available_semaphores: Vec<vk::Semaphore>,
    /// One semaphore per swap image, signaled when rendering finished
    render_finished_semaphores: Vec<vk::Semaphore>,
    /// One fence per frame slot, created signaled so the first wait passes
    in_flight_fences: Vec<vk::Fence>,
    /// Fence of the submission currently using each image (null when idle)
    images_in_flight: Vec<vk::Fence>,

    current_slot: usize,
}

impl VulkanSwapChain {
    /// Render pass handle for pipeline creation
    pub(crate) fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl SwapImageChain for VulkanSwapChain {
    fn acquire_next_image(&mut self) -> Result<AcquireResult> {
        unsafe {
            // Block until this slot's previous submission retired, so at
            // most image_count command lists are ever in flight
            self.shared
                .device
                .wait_for_fences(&[self.in_flight_fences[self.current_slot]], true, u64::MAX)
                .map_err(|e| {
                    engine_err!(SOURCE, Error::Backend, "Failed to wait for fence: {:?}", e)
                })?;

            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.image_available_semaphores[self.current_slot],
                vk::Fence::null(),
            ) {
                Ok((image_index, false)) => Ok(AcquireResult::Ready(image_index)),
                Ok((image_index, true)) => Ok(AcquireResult::Suboptimal(image_index)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::OutOfDate),
                Err(e) => Err(engine_err!(
                    SOURCE,
                    Error::Backend,
                    "Failed to acquire next swapchain image: {:?}",
                    e
                )),
            }
        }
    }

    fn submit(
        &mut self,
        command_list: &mut dyn CommandList,
        image_index: u32,
    ) -> Result<PresentResult> {
        let command_buffer = downcast_command_buffer(command_list)?;
        let image_idx = image_index as usize;

        unsafe {
            // If an earlier slot's submission still holds this image, wait
            // for it before re-targeting the image
            let image_fence = self.images_in_flight[image_idx];
            if image_fence != vk::Fence::null() {
                self.shared
                    .device
                    .wait_for_fences(&[image_fence], true, u64::MAX)
                    .map_err(|e| {
                        engine_err!(
                            SOURCE,
                            Error::Backend,
                            "Failed to wait for image fence: {:?}",
                            e
                        )
                    })?;
            }
            self.images_in_flight[image_idx] = self.in_flight_fences[self.current_slot];

            // Re-arm the slot fence for this submission
            self.shared
                .device
                .reset_fences(&[self.in_flight_fences[self.current_slot]])
                .map_err(|e| {
                    engine_err!(SOURCE, Error::Backend, "Failed to reset fence: {:?}", e)
                })?;

            let wait_semaphores = [self.image_available_semaphores[self.current_slot]];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let signal_semaphores = [self.render_finished_semaphores[image_idx]];
            let command_buffers = [command_buffer];

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            self.shared
                .device
                .queue_submit(
                    self.shared.graphics_queue,
                    &[submit_info],
                    self.in_flight_fences[self.current_slot],
                )
                .map_err(|e| {
                    engine_err!(SOURCE, Error::Backend, "Failed to submit queue: {:?}", e)
                })?;

            // Present
            let swapchains = [self.swapchain];
            let image_indices = [image_index];

            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&signal_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);

            let result = match self
                .swapchain_loader
                .queue_present(self.shared.present_queue, &present_info)
            {
                Ok(false) => PresentResult::Ready,
                Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => PresentResult::Suboptimal,
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => PresentResult::OutOfDate,
                Err(e) => {
                    return Err(engine_err!(
                        SOURCE,
                        Error::Backend,
                        "Failed to present swapchain image: {:?}",
                        e
                    ))
                }
            };

            self.current_slot = (self.current_slot + 1) % self.in_flight_fences.len();
            Ok(result)
        }
    }

    fn begin_render_pass(
        &self,
        command_list: &mut dyn CommandList,
        image_index: u32,
    ) -> Result<()> {
        let command_buffer = downcast_command_buffer(command_list)?;

        unsafe {
            let clear_values = [
                vk::ClearValue {
                    color: vk::ClearColorValue {
                        float32: CLEAR_COLOR,
                    },
                },
                vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: CLEAR_DEPTH,
                        stencil: 0,
                    },
                },
            ];

            let render_pass_info = vk::RenderPassBeginInfo::default()
                .render_pass(self.render_pass)
                .framebuffer(self.framebuffers[image_index as usize])
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: self.extent,
                })
                .clear_values(&clear_values);

            self.shared.device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }

        command_list.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            width: self.extent.width as f32,
            height: self.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        })?;
        command_list.set_scissor(Rect2d {
            x: 0,
            y: 0,
            width: self.extent.width,
            height: self.extent.height,
        })?;

        Ok(())
    }

    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn extent(&self) -> Extent2d {
        Extent2d::new(self.extent.width, self.extent.height)
    }

    fn surface_formats(&self) -> SurfaceFormats {
        self.formats
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanSwapChain {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.shared.device.device_wait_idle().ok();

            for &semaphore in &self.image_available_semaphores {
                self.shared.device.destroy_semaphore(semaphore, None);
            }
            for &semaphore in &self.render_finished_semaphores {
                self.shared.device.destroy_semaphore(semaphore, None);
            }
            for &fence in &self.in_flight_fences {
                self.shared.device.destroy_fence(fence, None);
            }

            for &framebuffer in &self.framebuffers {
                self.shared.device.destroy_framebuffer(framebuffer, None);
            }

            self.shared.device.destroy_render_pass(self.render_pass, None);

            for depth in &mut self.depth_images {
                self.shared.device.destroy_image_view(depth.view, None);
                self.shared.device.destroy_image(depth.image, None);
                if let Some(allocation) = depth.allocation.take() {
                    if let Ok(mut allocator) = self.shared.allocator.lock() {
                        allocator.free(allocation).ok();
                    }
                }
            }

            for &image_view in &self.image_views {
                self.shared.device.destroy_image_view(image_view, None);
            }

            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Extract the Vulkan command buffer from a trait-object command list
fn downcast_command_buffer(command_list: &mut dyn CommandList) -> Result<vk::CommandBuffer> {
    command_list
        .as_any_mut()
        .downcast_mut::<VulkanCommandList>()
        .map(|list| list.command_buffer())
        .ok_or_else(|| {
            engine_err!(
                SOURCE,
                Error::Backend,
                "Command list is not a Vulkan command list"
            )
        })
}

/// Factory building Vulkan swap chains against the context's surface
pub struct VulkanSwapChainFactory {
    shared: Arc<VulkanShared>,
}

impl VulkanSwapChainFactory {
    pub(crate) fn new(shared: Arc<VulkanShared>) -> Self {
        Self { shared }
    }

    /// Pick the first depth format the device supports for optimal-tiling
    /// depth attachments
    fn find_depth_format(&self) -> Result<vk::Format> {
        let candidates = [
            vk::Format::D32_SFLOAT,
            vk::Format::D32_SFLOAT_S8_UINT,
            vk::Format::D24_UNORM_S8_UINT,
        ];

        for format in candidates {
            let props = unsafe {
                self.shared
                    .instance
                    .get_physical_device_format_properties(self.shared.physical_device, format)
            };
            if props
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
            {
                return Ok(format);
            }
        }

        Err(engine_err!(
            SOURCE,
            Error::SwapchainCreation,
            "No supported depth attachment format found"
        ))
    }
}

impl SwapChainFactory for VulkanSwapChainFactory {
    fn build(
        &mut self,
        extent: Extent2d,
        previous: Option<Box<dyn SwapImageChain>>,
    ) -> Result<Box<dyn SwapImageChain>> {
        assert!(
            !extent.is_degenerate(),
            "swap chain extent must be non-degenerate"
        );

        unsafe {
            let device = &self.shared.device;

            // Query surface capabilities
            let surface_capabilities = self
                .shared
                .surface_loader
                .get_physical_device_surface_capabilities(
                    self.shared.physical_device,
                    self.shared.surface,
                )
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::SwapchainCreation,
                        "Failed to get surface capabilities: {:?}",
                        e
                    )
                })?;

            // Choose surface format
            let surface_formats = self
                .shared
                .surface_loader
                .get_physical_device_surface_formats(
                    self.shared.physical_device,
                    self.shared.surface,
                )
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::SwapchainCreation,
                        "Failed to get surface formats: {:?}",
                        e
                    )
                })?;

            let surface_format = surface_formats
                .iter()
                .find(|f| {
                    f.format == vk::Format::B8G8R8A8_SRGB
                        || f.format == vk::Format::R8G8B8A8_SRGB
                })
                .unwrap_or(&surface_formats[0]);

            // Choose extent
            let vk_extent = if surface_capabilities.current_extent.width != u32::MAX {
                surface_capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: extent.width.clamp(
                        surface_capabilities.min_image_extent.width,
                        surface_capabilities.max_image_extent.width,
                    ),
                    height: extent.height.clamp(
                        surface_capabilities.min_image_extent.height,
                        surface_capabilities.max_image_extent.height,
                    ),
                }
            };

            let image_count = surface_capabilities.min_image_count + 1;
            let image_count = if surface_capabilities.max_image_count > 0 {
                image_count.min(surface_capabilities.max_image_count)
            } else {
                image_count
            };

            // The previous chain's handle lets the driver recycle resources
            let old_swapchain = previous
                .as_ref()
                .and_then(|chain| chain.as_any().downcast_ref::<VulkanSwapChain>())
                .map(|chain| chain.swapchain)
                .unwrap_or(vk::SwapchainKHR::null());

            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.shared.surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(vk_extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(surface_capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain_loader =
                ash::khr::swapchain::Device::new(&self.shared.instance, device);
            let swapchain = swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::SwapchainCreation,
                        "Failed to create swapchain: {:?}",
                        e
                    )
                })?;

            // The retired chain can be destroyed now that the new swapchain
            // exists
            drop(previous);

            // Get swapchain images
            let images = swapchain_loader.get_swapchain_images(swapchain).map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::SwapchainCreation,
                    "Failed to get swapchain images: {:?}",
                    e
                )
            })?;

            // Create color image views
            let image_views: Vec<vk::ImageView> = images
                .iter()
                .map(|&image| {
                    let create_info = vk::ImageViewCreateInfo::default()
                        .image(image)
                        .view_type(vk::ImageViewType::TYPE_2D)
                        .format(surface_format.format)
                        .components(vk::ComponentMapping {
                            r: vk::ComponentSwizzle::IDENTITY,
                            g: vk::ComponentSwizzle::IDENTITY,
                            b: vk::ComponentSwizzle::IDENTITY,
                            a: vk::ComponentSwizzle::IDENTITY,
                        })
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: vk::ImageAspectFlags::COLOR,
                            base_mip_level: 0,
                            level_count: 1,
                            base_array_layer: 0,
                            layer_count: 1,
                        });
                    device.create_image_view(&create_info, None)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::SwapchainCreation,
                        "Failed to create image views: {:?}",
                        e
                    )
                })?;

            // Depth attachments, one per swap image
            let depth_format = self.find_depth_format()?;
            let mut depth_images = Vec::with_capacity(images.len());
            for _ in 0..images.len() {
                depth_images.push(create_depth_image(
                    &self.shared,
                    depth_format,
                    vk_extent,
                )?);
            }

            // Render pass: clear color + depth, present the color attachment
            let attachments = [
                vk::AttachmentDescription::default()
                    .format(surface_format.format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
                vk::AttachmentDescription::default()
                    .format(depth_format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
            ];

            let color_attachment_refs = [vk::AttachmentReference {
                attachment: 0,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            }];
            let depth_attachment_ref = vk::AttachmentReference {
                attachment: 1,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            };

            let subpasses = [vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&color_attachment_refs)
                .depth_stencil_attachment(&depth_attachment_ref)];

            let dependencies = [vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                )];

            let render_pass_info = vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(&subpasses)
                .dependencies(&dependencies);

            let render_pass = device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::SwapchainCreation,
                        "Failed to create render pass: {:?}",
                        e
                    )
                })?;

            // Framebuffers
            let framebuffers: Vec<vk::Framebuffer> = image_views
                .iter()
                .zip(depth_images.iter())
                .map(|(&color_view, depth)| {
                    let attachments = [color_view, depth.view];
                    let framebuffer_info = vk::FramebufferCreateInfo::default()
                        .render_pass(render_pass)
                        .attachments(&attachments)
                        .width(vk_extent.width)
                        .height(vk_extent.height)
                        .layers(1);
                    device.create_framebuffer(&framebuffer_info, None)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::SwapchainCreation,
                        "Failed to create framebuffers: {:?}",
                        e
                    )
                })?;

            // Per-slot synchronization, sized to the image count
            let slot_count = images.len();
            let semaphore_info = vk::SemaphoreCreateInfo::default();
            let fence_info =
                vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

            let mut image_available_semaphores = Vec::with_capacity(slot_count);
            let mut render_finished_semaphores = Vec::with_capacity(slot_count);
            let mut in_flight_fences = Vec::with_capacity(slot_count);
            for _ in 0..slot_count {
                image_available_semaphores.push(
                    device.create_semaphore(&semaphore_info, None).map_err(|e| {
                        engine_err!(
                            SOURCE,
                            Error::SwapchainCreation,
                            "Failed to create semaphore: {:?}",
                            e
                        )
                    })?,
                );
                render_finished_semaphores.push(
                    device.create_semaphore(&semaphore_info, None).map_err(|e| {
                        engine_err!(
                            SOURCE,
                            Error::SwapchainCreation,
                            "Failed to create semaphore: {:?}",
                            e
                        )
                    })?,
                );
                in_flight_fences.push(device.create_fence(&fence_info, None).map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::SwapchainCreation,
                        "Failed to create fence: {:?}",
                        e
                    )
                })?);
            }

            let formats = SurfaceFormats {
                color: vk_format_to_texture_format(surface_format.format),
                depth: vk_format_to_texture_format(depth_format),
            };

            engine_info!(
                SOURCE,
                "Swap chain created: {} images, {}x{}",
                slot_count,
                vk_extent.width,
                vk_extent.height
            );

            Ok(Box::new(VulkanSwapChain {
                shared: self.shared.clone(),
                swapchain_loader,
                swapchain,
                images,
                image_views,
                depth_images,
                formats,
                extent: vk_extent,
                render_pass,
                framebuffers,
                image_available_semaphores,
                render_finished_semaphores,
                in_flight_fences,
                images_in_flight: vec![vk::Fence::null(); slot_count],
                current_slot: 0,
            }))
        }
    }
}

/// Create one GPU-only depth image with its view
fn create_depth_image(
    shared: &Arc<VulkanShared>,
    format: vk::Format,
    extent: vk::Extent2D,
) -> Result<DepthImage> {
    unsafe {
        let image_create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = shared
            .device
            .create_image(&image_create_info, None)
            .map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::SwapchainCreation,
                    "Failed to create depth image: {:?}",
                    e
                )
            })?;

        let requirements = shared.device.get_image_memory_requirements(image);

        let allocation = shared
            .allocator
            .lock()
            .map_err(|_| engine_err!(SOURCE, Error::Backend, "Allocator lock poisoned"))?
            .allocate(&AllocationCreateDesc {
                name: "depth image",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_e| Error::OutOfMemory)?;

        shared
            .device
            .bind_image_memory(image, allocation.memory(), allocation.offset())
            .map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::SwapchainCreation,
                    "Failed to bind depth image memory: {:?}",
                    e
                )
            })?;

        let view_create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = shared
            .device
            .create_image_view(&view_create_info, None)
            .map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::SwapchainCreation,
                    "Failed to create depth image view: {:?}",
                    e
                )
            })?;

        Ok(DepthImage {
            image,
            view,
            allocation: Some(allocation),
        })
    }
}
