//! Perspective camera, its GPU uniform and orbit controls.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A camera looking from `position` at `target`.
///
/// The projection is cached; after changing `fovy`, `aspect`, `znear` or
/// `zfar` call [`update_projection_matrix`](Self::update_projection_matrix).
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fovy: cgmath::Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fovy: cgmath::Deg<f32>, aspect: f32, znear: f32, zfar: f32) -> Self {
        let mut camera = Self {
            position: Point3::new(0.0, 0.0, 0.0),
            target: Point3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            fovy,
            aspect,
            znear,
            zfar,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }
}

// We need this for Rust to store our data correctly for the shaders
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            inv_view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &PerspectiveCamera) {
        let view_proj = camera.view_proj();
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = view_proj.into();
        self.inv_view_proj = view_proj.invert().unwrap_or(Matrix4::identity()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragState {
    None,
    Rotate,
    Pan,
}

/// Orbits a camera around its target.
///
/// Left drag rotates, right drag pans and the wheel dollies. Every handler
/// returns `true` when the camera moved, which is the signal to redraw.
#[derive(Debug)]
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    drag: DragState,
    cursor: Option<PhysicalPosition<f64>>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            drag: DragState::None,
            cursor: None,
        }
    }
}

impl OrbitControls {
    // keeps the camera off the poles so look_at never degenerates
    const POLAR_EPSILON: f32 = 1e-6;

    pub fn new() -> Self {
        Self::default()
    }

    /// Rotates by a pointer movement of `(dx, dy)` pixels in a viewport
    /// `viewport_height` pixels high. A full-height drag turns by 2π.
    pub fn rotate(&mut self, camera: &mut PerspectiveCamera, dx: f32, dy: f32, viewport_height: u32) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        let height = viewport_height.max(1) as f32;
        let theta_delta = 2.0 * PI * dx / height * self.rotate_speed;
        let phi_delta = 2.0 * PI * dy / height * self.rotate_speed;

        let offset = camera.position - camera.target;
        let radius = offset.magnitude();
        if radius == 0.0 {
            return false;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        theta -= theta_delta;
        phi = (phi - phi_delta).clamp(Self::POLAR_EPSILON, PI - Self::POLAR_EPSILON);

        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = camera.target + offset;
        true
    }

    /// Moves towards (`scroll > 0`) or away from the target.
    pub fn dolly(&mut self, camera: &mut PerspectiveCamera, scroll: f32) -> bool {
        if scroll == 0.0 {
            return false;
        }
        let offset = camera.position - camera.target;
        let radius = offset.magnitude();
        if radius == 0.0 {
            return false;
        }
        let scale = 0.95f32.powf(self.zoom_speed * scroll);
        let new_radius = (radius * scale).clamp(self.min_distance, self.max_distance);
        if new_radius == radius {
            return false;
        }
        camera.position = camera.target + offset * (new_radius / radius);
        true
    }

    /// Slides camera and target together in the view plane.
    pub fn pan(&mut self, camera: &mut PerspectiveCamera, dx: f32, dy: f32, viewport_height: u32) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        let offset = camera.position - camera.target;
        let distance = offset.magnitude() * (cgmath::Rad::from(camera.fovy).0 / 2.0).tan();
        let height = viewport_height.max(1) as f32;
        let forward = -offset.normalize();
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward);
        let shift = (-right * (2.0 * dx * distance / height) + up * (2.0 * dy * distance / height))
            * self.pan_speed;
        camera.position += shift;
        camera.target += shift;
        true
    }

    /// Feeds a window event to the controls.
    pub fn handle_window_event(
        &mut self,
        camera: &mut PerspectiveCamera,
        event: &WindowEvent,
        viewport_height: u32,
    ) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Pressed, MouseButton::Left) => DragState::Rotate,
                    (ElementState::Pressed, MouseButton::Right) => DragState::Pan,
                    (ElementState::Released, _) => DragState::None,
                    _ => self.drag,
                };
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                let Some(previous) = previous else {
                    return false;
                };
                let dx = (position.x - previous.x) as f32;
                let dy = (position.y - previous.y) as f32;
                match self.drag {
                    DragState::Rotate => self.rotate(camera, dx, dy, viewport_height),
                    DragState::Pan => self.pan(camera, dx, dy, viewport_height),
                    DragState::None => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = DragState::None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.dolly(camera, scroll)
            }
            _ => false,
        }
    }

    pub fn target_distance(camera: &PerspectiveCamera) -> f32 {
        (camera.position - camera.target).magnitude()
    }
}
