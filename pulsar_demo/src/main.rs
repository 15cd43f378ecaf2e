/*!
# Pulsar Demo

Spinning triangles demo for the Pulsar engine on the Vulkan backend.

Forty triangles share a single vertex buffer; each gets its own scale,
initial rotation and pastel color, then spins at a rate proportional to
its spawn order. Resize the window freely: the swapchain recreation path
absorbs it without dropping the demo.

The compiled shaders are expected next to the working directory:
`shaders/simple_shader.vert.spv` and `shaders/simple_shader.frag.spv`
(compile the GLSL sources in `shaders/` with glslc).
*/

mod window_adapter;

use pulsar_engine::glam::Vec3;
use pulsar_engine::pulsar::graphics::{
    load_compiled_shader, GraphicsDevice, RendererConfig, Vertex,
};
use pulsar_engine::pulsar::scene::{RenderSystem, Scene, Transform};
use pulsar_engine::pulsar::{FrameOrchestrator, Result, WindowAdapter};
use pulsar_engine::{engine_error, engine_info};
use pulsar_engine_renderer_vulkan::VulkanContext;
use std::f32::consts::PI;
use std::path::Path;
use std::sync::{Arc, Mutex};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use window_adapter::WinitWindowAdapter;

const SOURCE: &str = "pulsar::demo";

/// Everything that needs the window to exist
struct DemoState {
    window: Arc<Window>,
    adapter: Arc<Mutex<WinitWindowAdapter>>,
    device: Arc<Mutex<VulkanContext>>,
    orchestrator: FrameOrchestrator,
    render_system: RenderSystem,
    scene: Scene,
}

impl DemoState {
    fn new(event_loop: &ActiveEventLoop) -> Result<Self> {
        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("Pulsar Demo")
                        .with_inner_size(winit::dpi::LogicalSize::new(800, 600)),
                )
                .map_err(|e| {
                    pulsar_engine::engine_err!(
                        SOURCE,
                        pulsar_engine::pulsar::Error::InitializationFailed,
                        "Failed to create window: {:?}",
                        e
                    )
                })?,
        );

        let adapter = Arc::new(Mutex::new(WinitWindowAdapter::new(window.clone())));

        let context = VulkanContext::new(&window, &RendererConfig {
            app_name: "Pulsar Demo".to_string(),
            ..RendererConfig::default()
        })?;
        let factory = Box::new(context.swap_chain_factory());
        let device = Arc::new(Mutex::new(context));

        let orchestrator = FrameOrchestrator::new(
            adapter.clone() as Arc<Mutex<dyn WindowAdapter>>,
            device.clone() as Arc<Mutex<dyn GraphicsDevice>>,
            factory,
        )?;

        let vertex_shader = load_compiled_shader(Path::new("shaders/simple_shader.vert.spv"))?;
        let fragment_shader = load_compiled_shader(Path::new("shaders/simple_shader.frag.spv"))?;

        let (render_system, scene) = {
            let mut guard = device
                .lock()
                .map_err(|_| pulsar_engine::pulsar::Error::Backend("device lock poisoned".into()))?;
            let render_system = RenderSystem::new(
                &mut *guard,
                orchestrator.chain(),
                vertex_shader,
                fragment_shader,
            )?;
            let scene = build_scene(&mut *guard)?;
            (render_system, scene)
        };

        engine_info!(SOURCE, "Demo ready: {} objects", scene.object_count());

        Ok(Self {
            window,
            adapter,
            device,
            orchestrator,
            render_system,
            scene,
        })
    }

    /// Drive one frame through the four-call protocol
    fn draw(&mut self) -> Result<()> {
        if let Some(token) = self.orchestrator.begin_frame()? {
            self.orchestrator.begin_render_pass(&token)?;
            {
                let command_list = self.orchestrator.current_command_list();
                self.render_system.render(command_list, &mut self.scene)?;
            }
            self.orchestrator.end_render_pass(&token)?;
            self.orchestrator.end_frame(token)?;
        }

        // Recreation may have changed the attachment formats; the pipeline
        // targets the render pass, so rebuild it against the new chain
        if self.orchestrator.take_surface_formats_changed() {
            let mut guard = self
                .device
                .lock()
                .map_err(|_| pulsar_engine::pulsar::Error::Backend("device lock poisoned".into()))?;
            self.render_system
                .rebuild_pipeline(&mut *guard, self.orchestrator.chain())?;
        }

        Ok(())
    }
}

/// One shared triangle, forty objects
///
/// Mirrors the classic spinning-triangles scene: pastel palette raised to
/// the 2.2 power (approximate linearization), scale 0.5 + 0.025 per index,
/// initial roll of 0.025π per index.
fn build_scene(device: &mut dyn GraphicsDevice) -> Result<Scene> {
    let vertices = vec![
        Vertex::new(Vec3::new(0.0, -0.5, 0.0), Vec3::new(1.0, 0.0, 0.0)),
        Vertex::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        Vertex::new(Vec3::new(-0.5, 0.5, 0.0), Vec3::new(0.0, 0.0, 1.0)),
    ];

    let mut scene = Scene::new();
    let triangle = scene.upload_geometry(device, &vertices)?;

    // https://www.color-hex.com/color-palette/5361
    let palette = [
        Vec3::new(1.0, 0.7, 0.73),
        Vec3::new(1.0, 0.87, 0.73),
        Vec3::new(1.0, 1.0, 0.73),
        Vec3::new(0.73, 1.0, 0.8),
        Vec3::new(0.73, 0.88, 1.0),
    ];

    for i in 0..40 {
        let color = palette[i % palette.len()].powf(2.2);
        let scale = 0.5 + 0.025 * i as f32;
        let transform = Transform {
            scale: Vec3::new(scale, scale, 1.0),
            rotation: Vec3::new(0.0, 0.0, i as f32 * PI * 0.025),
            ..Transform::default()
        };
        scene.spawn(triangle, color, transform)?;
    }

    Ok(scene)
}

#[derive(Default)]
struct DemoApp {
    state: Option<DemoState>,
    close_requested: bool,
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            match DemoState::new(event_loop) {
                Ok(state) => self.state = Some(state),
                Err(e) => {
                    engine_error!(SOURCE, "Failed to initialize: {}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if window_id != state.window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(_new_size) => {
                if let Ok(mut adapter) = state.adapter.lock() {
                    adapter.notify_resized();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = state.draw() {
                    engine_error!(SOURCE, "Frame failed: {}", e);
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested {
            event_loop.exit();
            return;
        }
        if let Some(state) = self.state.as_ref() {
            state.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Let the GPU drain before any teardown runs
        if let Some(state) = self.state.take() {
            if let Ok(guard) = state.device.lock() {
                guard.wait_idle().ok();
            }
        }
    }
}

fn main() {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!(SOURCE, "Failed to create event loop: {:?}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!(SOURCE, "Event loop error: {:?}", e);
        std::process::exit(1);
    }
}
