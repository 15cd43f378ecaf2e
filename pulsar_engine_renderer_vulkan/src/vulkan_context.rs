/// VulkanContext - Vulkan implementation of the GraphicsDevice trait
///
/// Owns the instance, surface, logical device, queues, command pool and the
/// GPU memory allocator. All other Vulkan objects (chains, pipelines,
/// buffers, command lists) hold an `Arc<VulkanShared>` so the device is
/// guaranteed to outlive every resource created from it.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use pulsar_engine::pulsar::graphics::{
    CommandList, GeometryBuffer, GraphicsDevice, Pipeline, PipelineDesc, RendererConfig,
    SwapImageChain,
};
use pulsar_engine::pulsar::{Error, Result};
use pulsar_engine::{engine_err, engine_info};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use winit::window::Window;

use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_geometry::VulkanGeometryBuffer;
use crate::vulkan_pipeline::{create_graphics_pipeline, VulkanPipeline};
use crate::vulkan_swapchain::VulkanSwapChain;

const SOURCE: &str = "pulsar::vulkan";

/// Shared GPU state for all Vulkan resources
///
/// Destruction order matters: the allocator must be dropped before the
/// device, the device before the surface and instance. Everything is
/// funneled through this struct's Drop so no resource can get it wrong.
pub(crate) struct VulkanShared {
    #[allow(dead_code)]
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub surface_loader: ash::khr::surface::Instance,
    pub surface: vk::SurfaceKHR,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    #[allow(dead_code)]
    pub graphics_family: u32,
    pub present_family: u32,
    /// GPU memory allocator, dropped explicitly before the device
    pub allocator: ManuallyDrop<Mutex<Allocator>>,
    /// Pool for the per-slot primary command buffers
    pub command_pool: Mutex<vk::CommandPool>,
    #[cfg(feature = "vulkan-validation")]
    pub debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    #[cfg(feature = "vulkan-validation")]
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl Drop for VulkanShared {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.device.device_wait_idle().ok();

            if let Ok(pool) = self.command_pool.lock() {
                self.device.destroy_command_pool(*pool, None);
            }

            // Drop allocator explicitly before destroying the device so all
            // GPU memory is freed while the device is still valid
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);

            self.surface_loader.destroy_surface(self.surface, None);

            #[cfg(feature = "vulkan-validation")]
            if let (Some(loader), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger)
            {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Vulkan graphics device
pub struct VulkanContext {
    shared: Arc<VulkanShared>,
}

impl VulkanContext {
    /// Create the Vulkan instance, surface, device and allocator
    ///
    /// # Arguments
    ///
    /// * `window` - Window to create the presentation surface for
    /// * `config` - Renderer configuration
    pub fn new(window: &Window, config: &RendererConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "Failed to load Vulkan library: {:?}",
                    e
                )
            })?;

            // Application info
            let app_name = CString::new(config.app_name.as_str()).map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "Invalid application name: {:?}",
                    e
                )
            })?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Pulsar")
                .engine_version(vk::make_api_version(0, 1, 0, 0))
                .api_version(vk::API_VERSION_1_3);

            // Required extensions from the windowing system
            let display_handle = window.display_handle().map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "Failed to get display handle: {:?}",
                    e
                )
            })?;
            let window_handle = window.window_handle().map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "Failed to get window handle: {:?}",
                    e
                )
            })?;

            #[allow(unused_mut)]
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        engine_err!(
                            SOURCE,
                            Error::InitializationFailed,
                            "Failed to enumerate required extensions: {:?}",
                            e
                        )
                    })?
                    .to_vec();

            #[cfg(feature = "vulkan-validation")]
            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            // Validation layers
            let layer_names: Vec<*const i8> = {
                #[cfg(feature = "vulkan-validation")]
                {
                    if config.enable_validation {
                        vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
                    } else {
                        Vec::new()
                    }
                }
                #[cfg(not(feature = "vulkan-validation"))]
                {
                    Vec::new()
                }
            };

            let instance_create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_extension_names(&extension_names)
                .enabled_layer_names(&layer_names);

            let instance = entry
                .create_instance(&instance_create_info, None)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::InitializationFailed,
                        "Failed to create Vulkan instance: {:?}",
                        e
                    )
                })?;

            // Debug messenger
            #[cfg(feature = "vulkan-validation")]
            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let (loader, messenger) =
                    crate::vulkan_debug::create_debug_messenger(&entry, &instance)?;
                (Some(loader), Some(messenger))
            } else {
                (None, None)
            };

            // Surface
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "Failed to create surface: {:?}",
                    e
                )
            })?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Physical device and queue families
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "Failed to enumerate physical devices: {:?}",
                    e
                )
            })?;
            if physical_devices.is_empty() {
                return Err(engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "No Vulkan-capable GPU found"
                ));
            }
            let physical_device = physical_devices[0];

            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);

            let graphics_family = queue_families
                .iter()
                .position(|props| props.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .ok_or_else(|| {
                    engine_err!(
                        SOURCE,
                        Error::InitializationFailed,
                        "No graphics queue family found"
                    )
                })? as u32;

            let mut present_family = None;
            for index in 0..queue_families.len() as u32 {
                let supported = surface_loader
                    .get_physical_device_surface_support(physical_device, index, surface)
                    .map_err(|e| {
                        engine_err!(
                            SOURCE,
                            Error::InitializationFailed,
                            "Failed to query surface support: {:?}",
                            e
                        )
                    })?;
                if supported {
                    present_family = Some(index);
                    break;
                }
            }
            let present_family = present_family.ok_or_else(|| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "No present queue family found"
                )
            })?;

            // Logical device
            let queue_priorities = [1.0f32];
            let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&queue_priorities)];
            if present_family != graphics_family {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extensions = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extensions)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::InitializationFailed,
                        "Failed to create logical device: {:?}",
                        e
                    )
                })?;

            let graphics_queue = device.get_device_queue(graphics_family, 0);
            let present_queue = device.get_device_queue(present_family, 0);

            // Allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "Failed to create GPU allocator: {:?}",
                    e
                )
            })?;

            // Command pool for the per-slot primary command buffers
            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
                .queue_family_index(graphics_family);

            let command_pool = device
                .create_command_pool(&pool_create_info, None)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::InitializationFailed,
                        "Failed to create command pool: {:?}",
                        e
                    )
                })?;

            engine_info!(
                SOURCE,
                "Vulkan context created (graphics family {}, present family {})",
                graphics_family,
                present_family
            );

            Ok(Self {
                shared: Arc::new(VulkanShared {
                    entry,
                    instance,
                    surface_loader,
                    surface,
                    physical_device,
                    device,
                    graphics_queue,
                    present_queue,
                    graphics_family,
                    present_family,
                    allocator: ManuallyDrop::new(Mutex::new(allocator)),
                    command_pool: Mutex::new(command_pool),
                    #[cfg(feature = "vulkan-validation")]
                    debug_utils_loader,
                    #[cfg(feature = "vulkan-validation")]
                    debug_messenger,
                }),
            })
        }
    }

    /// Create a swap chain factory sharing this context's device
    pub fn swap_chain_factory(&self) -> crate::vulkan_swapchain::VulkanSwapChainFactory {
        crate::vulkan_swapchain::VulkanSwapChainFactory::new(self.shared.clone())
    }
}

impl GraphicsDevice for VulkanContext {
    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.shared.device.device_wait_idle().map_err(|e| {
                engine_err!(SOURCE, Error::Backend, "Failed to wait idle: {:?}", e)
            })
        }
    }

    fn allocate_command_lists(&mut self, count: usize) -> Result<Vec<Box<dyn CommandList>>> {
        unsafe {
            let pool = *self.shared.command_pool.lock().map_err(|_| {
                engine_err!(SOURCE, Error::Backend, "Command pool lock poisoned")
            })?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(count as u32);

            let buffers = self
                .shared
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        Error::Backend,
                        "Failed to allocate command buffers: {:?}",
                        e
                    )
                })?;

            Ok(buffers
                .into_iter()
                .map(|buffer| {
                    Box::new(VulkanCommandList::new(self.shared.clone(), buffer))
                        as Box<dyn CommandList>
                })
                .collect())
        }
    }

    fn create_geometry(
        &mut self,
        vertex_data: &[u8],
        vertex_count: u32,
    ) -> Result<Arc<dyn GeometryBuffer>> {
        let buffer = VulkanGeometryBuffer::new(self.shared.clone(), vertex_data, vertex_count)?;
        Ok(Arc::new(buffer))
    }

    fn create_pipeline(
        &mut self,
        chain: &dyn SwapImageChain,
        desc: &PipelineDesc,
    ) -> Result<Arc<dyn Pipeline>> {
        let vulkan_chain = chain
            .as_any()
            .downcast_ref::<VulkanSwapChain>()
            .ok_or_else(|| {
                engine_err!(
                    SOURCE,
                    Error::PipelineCreation,
                    "Swap image chain is not a Vulkan chain"
                )
            })?;

        let pipeline: VulkanPipeline =
            create_graphics_pipeline(self.shared.clone(), vulkan_chain.render_pass(), desc)?;
        Ok(Arc::new(pipeline))
    }
}
