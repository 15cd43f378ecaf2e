use super::*;
use crate::graphics::mock_graphics::{new_shared_log, MockChainFactory, MockDevice, SharedLog};
use crate::graphics::{SwapChainFactory, Vertex};
use crate::scene::{Scene, Transform};
use crate::window::Extent2d;
use glam::Vec3;

struct Rig {
    log: SharedLog,
    device: MockDevice,
    chain: Box<dyn SwapImageChain>,
    system: RenderSystem,
    scene: Scene,
}

fn rig() -> Rig {
    let log = new_shared_log();
    let mut device = MockDevice::new(log.clone());
    let mut factory = MockChainFactory::new(2, log.clone());
    let chain = factory.build(Extent2d::new(640, 480), None).unwrap();
    let system =
        RenderSystem::new(&mut device, chain.as_ref(), vec![0; 4], vec![0; 4]).unwrap();
    Rig {
        log,
        device,
        chain,
        system,
        scene: Scene::new(),
    }
}

fn triangle() -> Vec<Vertex> {
    vec![
        Vertex::new(Vec3::new(0.0, -0.5, 0.0), Vec3::X),
        Vertex::new(Vec3::new(0.5, 0.5, 0.0), Vec3::Y),
        Vertex::new(Vec3::new(-0.5, 0.5, 0.0), Vec3::Z),
    ]
}

// ============================================================================
// Push constant layout
// ============================================================================

#[test]
fn test_push_constant_block_is_80_bytes() {
    assert_eq!(std::mem::size_of::<PushConstantData>(), 80);
}

#[test]
fn test_push_constant_byte_layout() {
    let push = PushConstantData {
        transform: glam::Mat4::IDENTITY.to_cols_array_2d(),
        color: [1.0, 0.5, 0.25],
        _pad: 0.0,
    };
    let bytes = bytemuck::bytes_of(&push);
    assert_eq!(bytes.len(), 80);

    // Matrix occupies bytes 0..64, column major: identity has 1.0 at the
    // start of each 20-byte stride (columns are 16 bytes, diagonal walks
    // one float per column)
    let one = 1.0f32.to_le_bytes();
    assert_eq!(&bytes[0..4], &one);
    assert_eq!(&bytes[20..24], &one);
    assert_eq!(&bytes[40..44], &one);
    assert_eq!(&bytes[60..64], &one);

    // Color occupies bytes 64..76
    assert_eq!(&bytes[64..68], &1.0f32.to_le_bytes());
    assert_eq!(&bytes[68..72], &0.5f32.to_le_bytes());
    assert_eq!(&bytes[72..76], &0.25f32.to_le_bytes());

    // Trailing pad occupies bytes 76..80
    assert_eq!(&bytes[76..80], &[0u8; 4]);
}

// ============================================================================
// Pipeline lifecycle
// ============================================================================

#[test]
fn test_new_builds_pipeline_with_push_range() {
    let rig = rig();
    assert_eq!(rig.system.pipeline.push_constant_size(), 80);
    let pipelines = rig
        .log
        .lock()
        .unwrap()
        .commands
        .iter()
        .filter(|c| c.contains("create_pipeline"))
        .count();
    assert_eq!(pipelines, 1);
}

#[test]
fn test_rebuild_pipeline_creates_a_new_one() {
    let mut rig = rig();
    rig.system
        .rebuild_pipeline(&mut rig.device, rig.chain.as_ref())
        .unwrap();
    let pipelines = rig
        .log
        .lock()
        .unwrap()
        .commands
        .iter()
        .filter(|c| c.contains("create_pipeline"))
        .count();
    assert_eq!(pipelines, 2);
}

// ============================================================================
// Animation
// ============================================================================

#[test]
fn test_rotation_steps_scale_with_spawn_order() {
    let mut rig = rig();
    let key = rig.scene.upload_geometry(&mut rig.device, &triangle()).unwrap();
    for _ in 0..3 {
        rig.scene.spawn(key, Vec3::ONE, Transform::default()).unwrap();
    }

    let mut lists = rig.device.allocate_command_lists(1).unwrap();
    rig.system.render(lists[0].as_mut(), &mut rig.scene).unwrap();

    let rotations: Vec<f32> = rig
        .scene
        .objects()
        .iter()
        .map(|o| o.transform.rotation.y)
        .collect();
    assert!((rotations[0] - 0.001).abs() < 1e-6);
    assert!((rotations[1] - 0.002).abs() < 1e-6);
    assert!((rotations[2] - 0.003).abs() < 1e-6);

    // Pitch advances in step with yaw
    for object in rig.scene.objects() {
        assert_eq!(object.transform.rotation.x, object.transform.rotation.y);
    }
}

#[test]
fn test_rotation_wraps_at_two_pi() {
    let mut rig = rig();
    let key = rig.scene.upload_geometry(&mut rig.device, &triangle()).unwrap();
    let id = rig
        .scene
        .spawn(key, Vec3::ONE, Transform::default())
        .unwrap();
    rig.scene.objects_mut()[0].transform.rotation.y = TAU - 0.0005;
    assert_eq!(rig.scene.objects()[0].id(), id);

    let mut lists = rig.device.allocate_command_lists(1).unwrap();
    rig.system.render(lists[0].as_mut(), &mut rig.scene).unwrap();

    let yaw = rig.scene.objects()[0].transform.rotation.y;
    assert!(yaw >= 0.0 && yaw < TAU);
    assert!((yaw - 0.0005).abs() < 1e-4);
}

// ============================================================================
// Draw recording
// ============================================================================

#[test]
fn test_render_binds_shared_geometry_once() {
    let mut rig = rig();
    let key = rig.scene.upload_geometry(&mut rig.device, &triangle()).unwrap();
    for _ in 0..3 {
        rig.scene.spawn(key, Vec3::ONE, Transform::default()).unwrap();
    }

    let mut lists = rig.device.allocate_command_lists(1).unwrap();
    rig.system.render(lists[0].as_mut(), &mut rig.scene).unwrap();

    let log = rig.log.lock().unwrap();
    let binds = log
        .commands
        .iter()
        .filter(|c| c.contains("bind_vertex_buffer"))
        .count();
    let draws = log
        .commands
        .iter()
        .filter(|c| c.contains("draw 3 from 0"))
        .count();
    let pipeline_binds = log
        .commands
        .iter()
        .filter(|c| c.contains("bind_pipeline"))
        .count();

    assert_eq!(binds, 1);
    assert_eq!(draws, 3);
    assert_eq!(pipeline_binds, 1);
    // One push constant block per object, 80 bytes each
    assert_eq!(log.push_data.len(), 3);
    assert!(log.push_data.iter().all(|d| d.len() == 80));
}

#[test]
fn test_push_constants_carry_object_color() {
    let mut rig = rig();
    let key = rig.scene.upload_geometry(&mut rig.device, &triangle()).unwrap();
    rig.scene
        .spawn(key, Vec3::new(0.9, 0.6, 0.3), Transform::default())
        .unwrap();

    let mut lists = rig.device.allocate_command_lists(1).unwrap();
    rig.system.render(lists[0].as_mut(), &mut rig.scene).unwrap();

    let log = rig.log.lock().unwrap();
    let push: PushConstantData = bytemuck::pod_read_unaligned(&log.push_data[0]);
    assert_eq!(push.color, [0.9, 0.6, 0.3]);
}

#[test]
fn test_empty_scene_renders_nothing_but_pipeline_bind() {
    let mut rig = rig();
    let mut lists = rig.device.allocate_command_lists(1).unwrap();
    rig.system.render(lists[0].as_mut(), &mut rig.scene).unwrap();

    let log = rig.log.lock().unwrap();
    assert!(log.commands.iter().any(|c| c.contains("bind_pipeline")));
    assert!(!log.commands.iter().any(|c| c.contains("draw")));
    assert!(log.push_data.is_empty());
}
