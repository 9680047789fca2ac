use approx::assert_relative_eq;
use probe_view::{
    camera::OrbitControls,
    data_structures::{
        material::{Shading, Side},
        texture::ColorSpace,
    },
    render::Renderer,
    viewer::{PLANE_NAME, SPHERE_NAME},
};
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
};

use crate::common::test_utils::{test_cube, test_texture, viewer};

mod common;

fn wheel(lines: f32) -> WindowEvent {
    WindowEvent::MouseWheel {
        device_id: device(),
        delta: MouseScrollDelta::LineDelta(0.0, lines),
        phase: TouchPhase::Moved,
    }
}

fn device() -> DeviceId {
    // SAFETY: the id is only compared, never handed to the platform.
    unsafe { DeviceId::dummy() }
}

fn button(state: ElementState, button: MouseButton) -> WindowEvent {
    WindowEvent::MouseInput {
        device_id: device(),
        state,
        button,
    }
}

fn cursor(x: f64, y: f64) -> WindowEvent {
    WindowEvent::CursorMoved {
        device_id: device(),
        position: PhysicalPosition::new(x, y),
    }
}

#[test]
fn nothing_is_drawn_before_start() {
    let viewer = viewer(800, 600);
    assert_eq!(viewer.renderer().redraws(), 0);
}

#[test]
fn startup_builds_the_static_scene() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    assert_eq!(viewer.renderer().redraws(), 1);

    let scene = viewer.scene();
    assert_eq!(scene.len(), 1);
    assert!(scene.background.is_none());
    assert_eq!(scene.light_probe.intensity, 1.0);
    assert_eq!(scene.light_probe.sh.coefficients, [[0.0; 3]; 9]);
    assert_eq!(scene.directional_light.intensity, 0.2);
    assert_eq!(scene.directional_light.position, cgmath::Vector3::new(10.0, 10.0, 10.0));
    assert_eq!(viewer.sphere(), None);

    let plane = scene.mesh(viewer.plane()).unwrap();
    assert_eq!(plane.name, PLANE_NAME);
    assert_eq!(plane.material.side(), Side::Double);
    // uv (0, 1) of the top left corner is flipped to (0, 0)
    assert_eq!(plane.geometry.uvs[0], [0.0, 0.0]);
    assert_eq!(plane.geometry.uvs[2], [0.0, 1.0]);
    match &plane.material.shading {
        Shading::Basic(m) => assert!(m.map.is_none()),
        other => panic!("unexpected plane material {other:?}"),
    }

    let camera = viewer.camera();
    assert_eq!(camera.position, cgmath::Point3::new(0.0, 0.0, 1.0));
    assert_eq!(camera.fovy, cgmath::Deg(60.0));
    assert_relative_eq!(camera.aspect, 800.0 / 600.0);
}

#[test]
fn every_trigger_redraws_exactly_once() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    assert_eq!(viewer.renderer().redraws(), 1);

    viewer.resize(1024, 768);
    assert_eq!(viewer.renderer().redraws(), 2);

    assert!(viewer.handle_window_event(&wheel(1.0)));
    assert_eq!(viewer.renderer().redraws(), 3);

    viewer.on_cube_texture_loaded(Ok(test_cube()));
    assert_eq!(viewer.renderer().redraws(), 4);

    viewer.on_texture_loaded(Ok(test_texture()));
    assert_eq!(viewer.renderer().redraws(), 5);
}

#[test]
fn failed_loads_do_not_redraw() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    let before = viewer.scene().clone();

    viewer.on_cube_texture_loaded(Err(anyhow::anyhow!("404 cube/px.png")));
    viewer.on_texture_loaded(Err(anyhow::anyhow!("404 painting1.dds")));

    assert_eq!(viewer.renderer().redraws(), 1);
    assert_eq!(viewer.scene(), &before);
    assert_eq!(viewer.sphere(), None);
}

#[test]
fn pointer_input_without_movement_does_not_redraw() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    assert!(!viewer.handle_window_event(&WindowEvent::Focused(true)));
    assert!(!viewer.handle_window_event(&wheel(0.0)));
    assert_eq!(viewer.renderer().redraws(), 1);
}

#[test]
fn cube_map_success_creates_the_sphere() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    viewer.on_cube_texture_loaded(Ok(test_cube()));

    let sphere_id = viewer.sphere().expect("sphere after a successful load");
    let scene = viewer.scene();
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.find(SPHERE_NAME), Some(sphere_id));

    let background = scene.background.as_ref().unwrap();
    assert_eq!(background.color_space, ColorSpace::Srgb);
    assert_ne!(scene.light_probe.sh.coefficients, [[0.0; 3]; 9]);
    assert_eq!(scene.light_probe.intensity, 1.0);

    let sphere = scene.mesh(sphere_id).unwrap();
    assert_eq!(sphere.position, cgmath::Vector3::new(0.8, 0.0, 0.0));
    match &sphere.material.shading {
        Shading::Standard(m) => {
            assert_eq!(m.color, [1.0; 3]);
            assert_eq!(m.metalness, 0.0);
            assert_eq!(m.roughness, 0.0);
            assert_eq!(m.env_map_intensity, 1.0);
            assert_eq!(m.env_map.as_ref().map(|e| e.id()), Some(background.id()));
        }
        other => panic!("unexpected sphere material {other:?}"),
    }

    // the redraw saw the finished scene
    assert_eq!(&viewer.renderer().last_frame().scene, viewer.scene());
}

#[test]
fn a_second_cube_map_updates_the_existing_sphere() {
    let mut viewer = viewer(800, 600);
    viewer.on_cube_texture_loaded(Ok(test_cube()));
    let sphere_id = viewer.sphere().unwrap();
    let version = viewer.scene().mesh(sphere_id).unwrap().material.version();

    let second = test_cube();
    let second_id = second.id();
    viewer.on_cube_texture_loaded(Ok(second));

    assert_eq!(viewer.sphere(), Some(sphere_id));
    assert_eq!(viewer.scene().len(), 2);
    let sphere = viewer.scene().mesh(sphere_id).unwrap();
    assert_eq!(sphere.material.version(), version + 1);
    match &sphere.material.shading {
        Shading::Standard(m) => assert_eq!(m.env_map.as_ref().map(|e| e.id()), Some(second_id)),
        other => panic!("unexpected sphere material {other:?}"),
    }
    assert_eq!(viewer.scene().background.as_ref().map(|b| b.id()), Some(second_id));
}

#[test]
fn texture_success_maps_the_plane() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    let texture = test_texture();
    let texture_id = texture.id();
    viewer.on_texture_loaded(Ok(texture));

    let plane = viewer.scene().mesh(viewer.plane()).unwrap();
    assert_eq!(plane.material.version(), 1);
    match &plane.material.shading {
        Shading::Basic(m) => {
            let map = m.map.as_ref().expect("plane map");
            assert_eq!(map.id(), texture_id);
            assert_eq!(map.color_space, ColorSpace::Srgb);
        }
        other => panic!("unexpected plane material {other:?}"),
    }
    assert_eq!(viewer.sphere(), None);
}

#[test]
fn load_order_does_not_change_the_final_scene() {
    let cube = test_cube();
    let texture = test_texture();

    let mut cube_first = viewer(800, 600);
    cube_first.start();
    cube_first.on_cube_texture_loaded(Ok(cube.clone()));
    cube_first.on_texture_loaded(Ok(texture.clone()));

    let mut texture_first = viewer(800, 600);
    texture_first.start();
    texture_first.on_texture_loaded(Ok(texture));
    texture_first.on_cube_texture_loaded(Ok(cube));

    assert_eq!(cube_first.scene(), texture_first.scene());
    assert_eq!(cube_first.renderer().redraws(), texture_first.renderer().redraws());
}

#[test]
fn repeated_redraws_render_the_same_frame() {
    let mut viewer = viewer(800, 600);
    viewer.on_cube_texture_loaded(Ok(test_cube()));
    viewer.on_texture_loaded(Ok(test_texture()));
    for _ in 0..3 {
        viewer.redraw();
    }

    let frames = &viewer.renderer().frames[2..];
    assert_eq!(frames.len(), 3);
    for frame in frames {
        assert_eq!(frame.scene, frames[0].scene);
        assert_eq!(frame.camera, frames[0].camera);
        assert_eq!(frame.size, frames[0].size);
    }
}

#[test]
fn resize_updates_aspect_and_output_size() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    assert_relative_eq!(viewer.camera().aspect, 800.0 / 600.0);

    viewer.resize(400, 300);

    assert_relative_eq!(viewer.camera().aspect, 400.0 / 300.0);
    assert_eq!(viewer.renderer().size(), (400, 300));
    let frame = viewer.renderer().last_frame();
    assert_eq!(frame.size, (400, 300));
    assert_eq!(frame.camera.projection_matrix(), viewer.camera().projection_matrix());
}

#[test]
fn zero_sized_viewports_are_ignored() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    viewer.resize(0, 300);
    viewer.resize(400, 0);
    assert_eq!(viewer.renderer().redraws(), 1);
    assert_eq!(viewer.renderer().size(), (800, 600));
    assert_relative_eq!(viewer.camera().aspect, 800.0 / 600.0);
}

#[test]
fn render_errors_are_survived() {
    let mut viewer = viewer(800, 600);
    viewer.renderer_mut().fail_next = true;
    viewer.start();
    assert_eq!(viewer.renderer().redraws(), 0);
    viewer.redraw();
    assert_eq!(viewer.renderer().redraws(), 1);
}

#[test]
fn sizing_before_start_draws_a_single_frame() {
    let mut viewer = viewer(800, 600);
    assert!(viewer.set_viewport(400, 300));
    assert_eq!(viewer.renderer().redraws(), 0);
    assert!(!viewer.set_viewport(0, 300));

    viewer.start();
    assert_eq!(viewer.renderer().redraws(), 1);
    assert_relative_eq!(viewer.camera().aspect, 400.0 / 300.0);
    assert_eq!(viewer.renderer().last_frame().size, (400, 300));
}

#[test]
fn left_drag_rotates_once_per_move() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    let start = viewer.camera().position;
    let target = viewer.camera().target;

    assert!(!viewer.handle_window_event(&button(ElementState::Pressed, MouseButton::Left)));
    // the first position only anchors the drag
    assert!(!viewer.handle_window_event(&cursor(400.0, 300.0)));
    assert_eq!(viewer.renderer().redraws(), 1);

    assert!(viewer.handle_window_event(&cursor(440.0, 300.0)));
    assert_eq!(viewer.renderer().redraws(), 2);
    assert!(viewer.handle_window_event(&cursor(440.0, 330.0)));
    assert_eq!(viewer.renderer().redraws(), 3);

    assert_ne!(viewer.camera().position, start);
    assert_eq!(viewer.camera().target, target);
    assert_relative_eq!(
        OrbitControls::target_distance(viewer.camera()),
        1.0,
        epsilon = 1e-5
    );
    assert_eq!(viewer.renderer().last_frame().camera, *viewer.camera());

    assert!(!viewer.handle_window_event(&button(ElementState::Released, MouseButton::Left)));
    assert!(!viewer.handle_window_event(&cursor(500.0, 350.0)));
    assert_eq!(viewer.renderer().redraws(), 3);
}

#[test]
fn right_drag_pans_camera_and_target() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    let start = viewer.camera().position;
    let target = viewer.camera().target;

    viewer.handle_window_event(&cursor(400.0, 300.0));
    assert!(!viewer.handle_window_event(&button(ElementState::Pressed, MouseButton::Right)));
    assert!(viewer.handle_window_event(&cursor(420.0, 310.0)));
    assert_eq!(viewer.renderer().redraws(), 2);

    assert_ne!(viewer.camera().target, target);
    let moved = viewer.camera().position - start;
    let shifted = viewer.camera().target - target;
    assert_relative_eq!(moved.x, shifted.x, epsilon = 1e-6);
    assert_relative_eq!(moved.y, shifted.y, epsilon = 1e-6);
    assert_relative_eq!(moved.z, shifted.z, epsilon = 1e-6);
}

#[test]
fn leaving_the_window_ends_the_drag() {
    let mut viewer = viewer(800, 600);
    viewer.start();
    viewer.handle_window_event(&button(ElementState::Pressed, MouseButton::Left));
    viewer.handle_window_event(&cursor(400.0, 300.0));
    assert!(viewer.handle_window_event(&cursor(410.0, 300.0)));
    assert_eq!(viewer.renderer().redraws(), 2);

    assert!(!viewer.handle_window_event(&WindowEvent::CursorLeft { device_id: device() }));
    assert!(!viewer.handle_window_event(&cursor(300.0, 200.0)));
    assert!(!viewer.handle_window_event(&cursor(350.0, 250.0)));
    assert_eq!(viewer.renderer().redraws(), 2);
}
