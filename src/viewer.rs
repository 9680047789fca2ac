//! The application context: scene, camera, controls and renderer in one place.
//!
//! Nothing is drawn continuously. Every method that changes what is visible
//! finishes its mutation and then calls [`Viewer::redraw`] exactly once.
//! Asynchronous loads are not started here; their settled results are fed in
//! through [`Viewer::on_cube_texture_loaded`] and [`Viewer::on_texture_loaded`].

use std::sync::Arc;

use cgmath::{Deg, Point3, Vector3};
use winit::event::WindowEvent;

use crate::{
    camera::{OrbitControls, PerspectiveCamera},
    config::ViewerConfig,
    data_structures::{
        geometry::{Geometry, flip_y},
        light_probe::LightProbe,
        material::{BasicMaterial, Material, Side, StandardMaterial},
        scene_graph::{DirectionalLight, Mesh, MeshId, Scene},
        texture::{ColorSpace, CubeTexture, Texture2D},
    },
    render::Renderer,
};

pub const PLANE_NAME: &str = "plane";
pub const SPHERE_NAME: &str = "sphere";

const SPHERE_RADIUS: f32 = 0.2;
const SPHERE_WIDTH_SEGMENTS: u32 = 64;
const SPHERE_HEIGHT_SEGMENTS: u32 = 32;

pub struct Viewer<R: Renderer> {
    config: ViewerConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    renderer: R,
    plane: MeshId,
    sphere: Option<MeshId>,
}

impl<R: Renderer> Viewer<R> {
    /// Builds the static part of the scene. Nothing is drawn yet.
    pub fn new(config: ViewerConfig, renderer: R) -> Self {
        let (width, height) = renderer.size();
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let mut camera = PerspectiveCamera::new(Deg(60.0), aspect, 0.1, 100.0);
        camera.position = Point3::new(0.0, 0.0, 1.0);
        camera.look_at(Point3::new(0.0, 0.0, 0.0));

        let light_probe = LightProbe::new(config.settings.light_probe_intensity);
        let mut light = DirectionalLight::new([1.0; 3], config.settings.directional_light_intensity);
        light.position = Vector3::new(10.0, 10.0, 10.0);
        let mut scene = Scene::new(light_probe, light);

        // The compressed painting is stored top row first.
        let mut geometry = Geometry::plane(1.0, 1.0);
        flip_y(&mut geometry);
        let material = Material::basic(BasicMaterial {
            side: Side::Double,
            ..BasicMaterial::default()
        });
        let plane = scene.add(Mesh::new(PLANE_NAME, geometry, material));

        Self {
            config,
            scene,
            camera,
            controls: OrbitControls::new(),
            renderer,
            plane,
            sphere: None,
        }
    }

    /// Draws the first frame.
    pub fn start(&mut self) {
        log::info!("starting with a {:?} viewport", self.renderer.size());
        self.redraw();
    }

    /// Renders the current scene from the current camera, once.
    pub fn redraw(&mut self) {
        if let Err(e) = self.renderer.render(&self.scene, &self.camera) {
            log::error!("Unable to render {e:#}");
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.set_viewport(width, height) {
            self.redraw();
        }
    }

    /// Adopts a new viewport size without drawing. Zero sizes are ignored and
    /// return `false`.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {width}x{height}");
            return false;
        }
        self.camera.aspect = width as f32 / height as f32;
        self.camera.update_projection_matrix();
        self.renderer.set_size(width, height);
        true
    }

    /// Called after the controls moved the camera.
    pub fn on_controls_change(&mut self) {
        self.redraw();
    }

    /// Passes pointer input to the orbit controls. Returns whether the camera moved.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let (_, height) = self.renderer.size();
        let moved = self.controls.handle_window_event(&mut self.camera, event, height);
        if moved {
            self.on_controls_change();
        }
        moved
    }

    /// Uses a loaded cubemap as background, light probe source and sphere env map.
    ///
    /// The sphere is created by the first successful load. Later loads update
    /// it in place.
    pub fn on_cube_texture_loaded(&mut self, result: anyhow::Result<CubeTexture>) {
        let mut cube = match result {
            Ok(cube) => cube,
            Err(e) => {
                log::error!("cannot load the cube texture: {e:#}");
                return;
            }
        };
        cube.color_space = ColorSpace::Srgb;
        let cube = Arc::new(cube);

        self.scene.background = Some(cube.clone());
        let probe = LightProbe::from_cube_texture(&cube);
        self.scene.light_probe.copy_coefficients(&probe);

        let env_map_intensity = self.config.settings.env_map_intensity;
        match self.sphere.and_then(|id| self.scene.mesh_mut(id)) {
            Some(sphere) => {
                if let Some(material) = sphere.material.as_standard_mut() {
                    material.env_map = Some(cube);
                    material.env_map_intensity = env_map_intensity;
                }
                sphere.material.set_needs_update();
            }
            None => {
                let material = Material::standard(StandardMaterial {
                    color: [1.0; 3],
                    metalness: 0.0,
                    roughness: 0.0,
                    env_map: Some(cube),
                    env_map_intensity,
                    ..StandardMaterial::default()
                });
                let geometry =
                    Geometry::sphere(SPHERE_RADIUS, SPHERE_WIDTH_SEGMENTS, SPHERE_HEIGHT_SEGMENTS);
                let mut mesh = Mesh::new(SPHERE_NAME, geometry, material);
                mesh.position = Vector3::new(0.8, 0.0, 0.0);
                self.sphere = Some(self.scene.add(mesh));
            }
        }

        self.redraw();
    }

    /// Attaches a loaded texture as the plane's colour map.
    pub fn on_texture_loaded(&mut self, result: anyhow::Result<Texture2D>) {
        let mut texture = match result {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("cannot load the texture: {e:#}");
                return;
            }
        };
        texture.color_space = ColorSpace::Srgb;

        let Some(plane) = self.scene.mesh_mut(self.plane) else {
            log::error!("the plane is missing from the scene");
            return;
        };
        let Some(material) = plane.material.as_basic_mut() else {
            log::error!("the plane does not have a basic material");
            return;
        };
        material.map = Some(Arc::new(texture));
        plane.material.set_needs_update();

        self.redraw();
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn plane(&self) -> MeshId {
        self.plane
    }

    pub fn sphere(&self) -> Option<MeshId> {
        self.sphere
    }
}
