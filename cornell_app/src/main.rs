//! Cornell box demo application
//!
//! Builds the classic red-green-white room with two rotated boxes and a
//! glass panel, lights it with a shadow-casting spot, a cool point light,
//! and an angled directional, then renders frames under both lighting
//! strategies against the recording device while reporting the pipeline
//! counters each frame.

use std::sync::Arc;

use prism_engine::config::ConfigError;
use prism_engine::foundation::math::{Mat4Ext, Quat};
use prism_engine::prelude::*;

const SETTINGS_PATH: &str = "cornell_settings.toml";
const FRAMES_PER_PHASE: u32 = 3;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

struct CornellApp {
    device: TraceDevice,
    assets: Assets,
    scene: Scene,
    camera: Camera,
    renderer: ForwardRenderer,
    timer: Timer,
}

impl CornellApp {
    fn new(settings: RendererSettings) -> Result<Self, AppError> {
        let mut device = TraceDevice::new();
        let mut assets = Assets::new(&mut device)?;
        let scene = build_scene(&mut device, &mut assets)?;

        let camera = Camera::perspective(
            Vec3::new(0.0, 2.6, 9.5),
            45.0,
            settings.aspect(),
            0.1,
            100.0,
        );

        Ok(Self {
            device,
            assets,
            scene,
            camera,
            renderer: ForwardRenderer::new(settings),
            timer: Timer::new(),
        })
    }

    fn render_frame(&mut self, label: &str, frame: u32) -> Result<(), AppError> {
        self.timer.update();
        self.animate();
        self.renderer.render_scene(
            &mut self.device,
            &self.assets,
            &mut self.scene,
            &self.camera,
        )?;

        let stats = self.renderer.last_frame_stats();
        log::info!(
            "[{label}] frame {frame}: {} calls ({} culled), {} shadow draws, {} color draws, {} lights",
            stats.queued_calls,
            stats.culled_calls,
            stats.shadow_draws,
            stats.color_draws,
            stats.visible_lights
        );
        Ok(())
    }

    /// Spin the floating crate so consecutive frames differ
    fn animate(&mut self) {
        let angle = self.timer.total_time() * 0.8;
        for entity in &mut self.scene.entities {
            if let SceneEntity::Prefab(instance) = entity {
                if instance.name == "spinner" {
                    instance.transform = Mat4::new_translation(&Vec3::new(0.0, 2.6, 0.0))
                        * Mat4::rotation_y(angle);
                }
            }
        }
    }

    fn run(&mut self) -> Result<(), AppError> {
        log::info!("phase 1: single-pass lighting");
        self.scene.lighting_mode = LightingMode::SinglePass;
        for frame in 0..FRAMES_PER_PHASE {
            self.render_frame("single-pass", frame)?;
        }

        log::info!("phase 2: multi-pass lighting");
        self.scene.lighting_mode = LightingMode::MultiPass;
        for frame in 0..FRAMES_PER_PHASE {
            self.render_frame("multi-pass", frame)?;
        }

        log::info!("phase 3: normals channel with the shadow map viewer");
        self.renderer.settings_mut().debug_channel = DebugChannel::Normal;
        self.renderer.settings_mut().debug_shadow_light = Some(0);
        self.render_frame("debug-view", 0)?;
        self.renderer.settings_mut().debug_channel = DebugChannel::Complete;
        self.renderer.settings_mut().debug_shadow_light = None;

        log::info!("phase 4: releasing shadow maps");
        for light in self.scene.lights_mut() {
            light.cast_shadows = false;
        }
        self.render_frame("no-shadows", 0)?;

        log::info!(
            "demo complete: {} frames, {:.1}s elapsed",
            self.timer.frame_count(),
            self.timer.total_time()
        );
        Ok(())
    }
}

/// Assemble the room, its props, and the three lights
fn build_scene(device: &mut TraceDevice, assets: &mut Assets) -> Result<Scene, AppError> {
    let plane = assets.add_mesh(Mesh::plane(device, 8.0)?);
    let cube = assets.add_mesh(Mesh::cube(device, 1.0)?);

    let matte_white =
        assets.add_material(Material::new("matte_white", Vec4::new(0.85, 0.83, 0.80, 1.0)));
    let matte_red =
        assets.add_material(Material::new("matte_red", Vec4::new(0.72, 0.12, 0.10, 1.0)));
    let matte_green =
        assets.add_material(Material::new("matte_green", Vec4::new(0.12, 0.55, 0.14, 1.0)));
    let glass = assets.add_material(
        Material::new("glass", Vec4::new(0.55, 0.75, 0.90, 0.35))
            .with_alpha_mode(AlphaMode::Blend)
            .with_two_sided(true),
    );

    // The room shell: floor plane plus thin cube walls. Side walls carry
    // the classic red and green.
    let wall = |position: Vec3, size: Vec3| {
        Mat4::new_translation(&position) * Mat4::new_nonuniform_scaling(&size)
    };
    let room = Node::new("room")
        .with_child(Node::new("floor").with_mesh(plane).with_material(matte_white))
        .with_child(
            Node::new("back_wall")
                .with_transform(wall(Vec3::new(0.0, 2.0, -4.0), Vec3::new(8.0, 4.0, 0.2)))
                .with_mesh(cube)
                .with_material(matte_white),
        )
        .with_child(
            Node::new("left_wall")
                .with_transform(wall(Vec3::new(-4.0, 2.0, 0.0), Vec3::new(0.2, 4.0, 8.0)))
                .with_mesh(cube)
                .with_material(matte_red),
        )
        .with_child(
            Node::new("right_wall")
                .with_transform(wall(Vec3::new(4.0, 2.0, 0.0), Vec3::new(0.2, 4.0, 8.0)))
                .with_mesh(cube)
                .with_material(matte_green),
        );

    // Props live in one prefab so their transforms compose under a shared
    // root; the tall box uses the Transform helper, the rest raw matrices.
    let tall_box = Transform::from_position_rotation(
        Vec3::new(-1.2, 1.1, -1.0),
        Quat::from_axis_angle(&Vec3::y_axis(), 0.30),
    );
    let props = Node::new("props")
        .with_child(
            Node::new("tall_box")
                .with_transform(
                    tall_box.to_matrix() * Mat4::new_nonuniform_scaling(&Vec3::new(1.2, 2.2, 1.2)),
                )
                .with_mesh(cube)
                .with_material(matte_white),
        )
        .with_child(
            Node::new("short_box")
                .with_transform(
                    Mat4::new_translation(&Vec3::new(1.3, 0.6, 0.8))
                        * Mat4::rotation_y(-0.32)
                        * Mat4::new_nonuniform_scaling(&Vec3::new(1.2, 1.2, 1.2)),
                )
                .with_mesh(cube)
                .with_material(matte_white),
        )
        .with_child(
            Node::new("glass_panel")
                .with_transform(
                    Mat4::new_translation(&Vec3::new(1.3, 1.0, 2.2))
                        * Mat4::new_nonuniform_scaling(&Vec3::new(1.8, 1.6, 0.05)),
                )
                .with_mesh(cube)
                .with_material(glass),
        );

    let mut scene = Scene::new();
    scene.ambient_light = Vec3::new(0.12, 0.12, 0.14);
    scene.add(SceneEntity::Prefab(PrefabInstance::new(
        "room",
        Arc::new(Prefab::new("room", room)),
        Mat4::identity(),
    )));
    scene.add(SceneEntity::Prefab(PrefabInstance::new(
        "props",
        Arc::new(Prefab::new("props", props)),
        Mat4::identity(),
    )));
    scene.add(SceneEntity::Prefab(PrefabInstance::new(
        "spinner",
        Arc::new(Prefab::new(
            "spinner",
            Node::new("crate")
                .with_transform(Mat4::new_nonuniform_scaling(&Vec3::new(0.6, 0.6, 0.6)))
                .with_mesh(cube)
                .with_material(matte_white),
        )),
        Mat4::new_translation(&Vec3::new(0.0, 2.6, 0.0)),
    )));

    // Key spot from above the opening, aimed down into the room.
    scene.add(SceneEntity::Light(
        LightEntity::new("key_spot", LightKind::Spot)
            .with_transform(
                Mat4::new_translation(&Vec3::new(0.0, 3.8, 2.5))
                    * Mat4::rotation_x(-0.9),
            )
            .with_color(Vec3::new(1.0, 0.95, 0.85), 2.2)
            .with_range(25.0)
            .with_cone(55.0, 4.0)
            .with_shadows(0.004),
    ));
    // Cool fill near the red wall.
    scene.add(SceneEntity::Light(
        LightEntity::new("cool_fill", LightKind::Point)
            .at(Vec3::new(-2.6, 1.6, 1.8))
            .with_color(Vec3::new(0.45, 0.55, 1.0), 0.8)
            .with_range(12.0),
    ));
    // Angled sun through the opening; off-axis so its up vector stays sane.
    scene.add(SceneEntity::Light(
        LightEntity::new("sun", LightKind::Directional)
            .at(Vec3::new(5.0, 9.0, 6.0))
            .with_target(Vec3::new(0.0, 0.0, -1.0))
            .with_color(Vec3::new(1.0, 0.98, 0.92), 0.6)
            .with_area_size(24.0)
            .with_shadows(0.002),
    ));

    // Inert extras the pipeline recognizes and skips.
    scene.add(SceneEntity::ReflectionProbe(ReflectionProbe {
        name: "center_probe".to_string(),
        transform: Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0)),
    }));
    scene.add(SceneEntity::Decal(Decal {
        name: "floor_stain".to_string(),
        transform: Mat4::new_translation(&Vec3::new(0.8, 0.0, 1.2)),
    }));

    Ok(scene)
}

fn load_settings() -> Result<RendererSettings, AppError> {
    match RendererSettings::load_from_file(SETTINGS_PATH) {
        Ok(settings) => {
            log::info!("loaded renderer settings from {SETTINGS_PATH}");
            Ok(settings)
        }
        Err(ConfigError::Io(_)) => {
            log::info!("no {SETTINGS_PATH}, using defaults");
            Ok(RendererSettings::new(1280, 720))
        }
        Err(err) => Err(err.into()),
    }
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting Cornell box demo");
    let settings = load_settings()?;
    let mut app = CornellApp::new(settings)?;
    app.run()?;
    Ok(())
}
