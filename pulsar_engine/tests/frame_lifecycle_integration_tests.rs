//! Integration tests for the frame lifecycle with a real Vulkan device
//!
//! These tests drive the FrameOrchestrator against the actual Vulkan
//! backend on a hidden window. Tests requiring GPU are marked with
//! #[ignore].
//!
//! Run with: cargo test --test frame_lifecycle_integration_tests -- --ignored


use gpu_test_utils::{get_test_context, get_test_factory, get_test_device, StaticWindowAdapter};
use pulsar_engine::pulsar::graphics::{
    GeometryBuffer, GraphicsDevice, SwapChainFactory, TextureFormat,
};
use pulsar_engine::pulsar::{Extent2d, FrameOrchestrator, WindowAdapter};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// Context and chain creation
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_context_creation() {
    let context = get_test_context();
    let guard = context.lock().unwrap();
    guard.wait_idle().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_chain_build() {
    let mut factory = get_test_factory();
    let chain = factory.build(Extent2d::new(800, 600), None).unwrap();

    assert!(chain.image_count() >= 2);
    assert!(!chain.extent().is_degenerate());

    let formats = chain.surface_formats();
    assert!(matches!(
        formats.color,
        TextureFormat::Bgra8Srgb | TextureFormat::Rgba8Srgb
    ));
    assert!(matches!(
        formats.depth,
        TextureFormat::D32Float | TextureFormat::D32FloatS8 | TextureFormat::D24UnormS8
    ));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_chain_rebuild_with_previous() {
    let mut factory = get_test_factory();
    let first = factory.build(Extent2d::new(800, 600), None).unwrap();
    let formats = first.surface_formats();

    // Rebuilding through the old-swapchain hint must preserve the formats
    let second = factory.build(Extent2d::new(800, 600), Some(first)).unwrap();
    assert_eq!(second.surface_formats(), formats);
    assert!(second.image_count() >= 2);
}

// ============================================================================
// Frame orchestration
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_empty_frame_cycle() {
    let window: Arc<Mutex<dyn WindowAdapter>> =
        Arc::new(Mutex::new(StaticWindowAdapter::new(800, 600)));
    let device = get_test_device();
    let factory = Box::new(get_test_factory());

    let mut orchestrator = FrameOrchestrator::new(window, device.clone(), factory).unwrap();

    // A few empty frames: clear only, nothing drawn
    for _ in 0..3 {
        if let Some(token) = orchestrator.begin_frame().unwrap() {
            orchestrator.begin_render_pass(&token).unwrap();
            orchestrator.end_render_pass(&token).unwrap();
            orchestrator.end_frame(token).unwrap();
        }
    }

    drop(orchestrator);
    device.lock().unwrap().wait_idle().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_more_frames_than_images() {
    let window: Arc<Mutex<dyn WindowAdapter>> =
        Arc::new(Mutex::new(StaticWindowAdapter::new(800, 600)));
    let device = get_test_device();
    let factory = Box::new(get_test_factory());

    let mut orchestrator = FrameOrchestrator::new(window, device.clone(), factory).unwrap();
    let image_count = orchestrator.chain().image_count();

    // Cycle well past the slot ring length; fences must keep this bounded
    for _ in 0..(image_count * 4) {
        if let Some(token) = orchestrator.begin_frame().unwrap() {
            orchestrator.begin_render_pass(&token).unwrap();
            orchestrator.end_render_pass(&token).unwrap();
            orchestrator.end_frame(token).unwrap();
        }
    }

    drop(orchestrator);
    device.lock().unwrap().wait_idle().unwrap();
}

// ============================================================================
// Geometry upload
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_geometry_upload() {
    use pulsar_engine::glam::Vec3;
    use pulsar_engine::pulsar::graphics::Vertex;
    use pulsar_engine::pulsar::scene::{Scene, Transform};

    let context = get_test_context();
    let mut guard = context.lock().unwrap();

    let vertices = vec![
        Vertex::new(Vec3::new(0.0, -0.5, 0.0), Vec3::X),
        Vertex::new(Vec3::new(0.5, 0.5, 0.0), Vec3::Y),
        Vertex::new(Vec3::new(-0.5, 0.5, 0.0), Vec3::Z),
    ];

    let mut scene = Scene::new();
    let key = scene.upload_geometry(&mut *guard, &vertices).unwrap();
    assert_eq!(scene.geometry(key).unwrap().vertex_count(), 3);

    let a = scene.spawn(key, Vec3::ONE, Transform::default()).unwrap();
    let b = scene.spawn(key, Vec3::ONE, Transform::default()).unwrap();
    assert_eq!(scene.geometry_ref_count(key), Some(2));

    scene.remove(a);
    scene.remove(b);
    assert!(scene.geometry(key).is_none());
}
