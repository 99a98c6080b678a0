//! Forward rendering pipeline
//!
//! Drives a frame end to end in a fixed order: flatten the scene into
//! render calls, sort them, redraw every casting light's shadow map, then
//! shade the camera's view under the scene's lighting strategy. Shadow maps
//! render before any color work so the color passes always sample depth
//! from the current frame.

use crate::config::{DebugChannel, RenderPath, RendererSettings};
use crate::foundation::math::{Vec2, Vec3};
use crate::foundation::time::Stopwatch;
use crate::render::api::{BufferId, ClearMask, RenderDevice, UniformValue};
use crate::render::lighting::{
    upload_multi_pass_light, upload_single_pass_lights, FrameLight, LightBlock,
};
use crate::render::queue::RenderQueue;
use crate::render::resources::{screen_quad_vertices, Assets, Material};
use crate::render::shadow::{render_shadow_pass, shadow_camera, ShadowMap};
use crate::render::state::PassState;
use crate::render::RenderResult;
use crate::scene::{Camera, LightEntity, LightingMode, Scene, SceneEntity};

/// Counters for the most recently rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Drawables the queue build emitted
    pub queued_calls: usize,
    /// Drawables the camera frustum rejected during the color pass
    pub culled_calls: usize,
    /// Draws issued into shadow maps
    pub shadow_draws: u32,
    /// Draws issued by the color pass
    pub color_draws: u32,
    /// Lights that contributed to shading
    pub visible_lights: usize,
}

/// The forward renderer
///
/// Owns the per-frame queue, the packed light block, and the frame clock.
/// Scene and assets stay outside; each [`ForwardRenderer::render_scene`]
/// call reads them fresh, so entities can be mutated freely between frames.
pub struct ForwardRenderer {
    settings: RendererSettings,
    queue: RenderQueue,
    light_block: LightBlock,
    frame_lights: Vec<FrameLight>,
    stopwatch: Stopwatch,
    stats: FrameStats,
    blit_quad: Option<(BufferId, u32)>,
    warned_deferred: bool,
    warned_light_overflow: bool,
}

impl ForwardRenderer {
    /// Create a renderer for the given settings
    pub fn new(settings: RendererSettings) -> Self {
        log::info!(
            "forward renderer: {}x{} viewport, {} light slots, {}px shadow maps",
            settings.viewport_width,
            settings.viewport_height,
            settings.max_lights,
            settings.shadow_map_resolution
        );
        Self {
            light_block: LightBlock::new(settings.max_lights),
            queue: RenderQueue::new(),
            frame_lights: Vec::new(),
            stopwatch: Stopwatch::start_new(),
            stats: FrameStats::default(),
            blit_quad: None,
            warned_deferred: false,
            warned_light_overflow: false,
            settings,
        }
    }

    /// The renderer's settings
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Mutable access to the settings, for runtime toggles like the debug
    /// channel or the shadow map viewer
    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Counters of the last completed frame
    pub fn last_frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Render one frame of the scene through the camera
    ///
    /// The scene is mutable because shadow-casting lights own their maps:
    /// the shadow stage acquires, redraws, and releases those resources in
    /// place. Errors surface only from resource allocation; per-drawable
    /// problems are skipped and logged instead of failing the frame.
    pub fn render_scene(
        &mut self,
        device: &mut dyn RenderDevice,
        assets: &Assets,
        scene: &mut Scene,
        camera: &Camera,
    ) -> RenderResult<()> {
        if self.settings.render_path == RenderPath::Deferred && !self.warned_deferred {
            log::warn!("deferred path is not implemented; rendering forward");
            self.warned_deferred = true;
        }

        self.stats = FrameStats::default();

        self.queue.build(scene, camera, assets);
        self.queue.sort();
        self.stats.queued_calls = self.queue.len();

        for entity in &mut scene.entities {
            if let SceneEntity::Light(light) = entity {
                self.generate_shadow_map(device, assets, light)?;
            }
        }

        device.set_viewport(
            0,
            0,
            self.settings.viewport_width,
            self.settings.viewport_height,
        );
        device.clear(ClearMask::COLOR | ClearMask::DEPTH, scene.background_color);

        self.frame_lights.clear();
        for light in scene.lights() {
            if light.visible {
                self.frame_lights.push(FrameLight::capture(light));
            }
        }
        self.stats.visible_lights = self.frame_lights.len();

        match scene.lighting_mode {
            LightingMode::SinglePass => self.render_single_pass(device, assets, scene, camera),
            LightingMode::MultiPass => self.render_multi_pass(device, assets, scene, camera),
        }

        if let Some(index) = self.settings.debug_shadow_light {
            let shown = scene.lights().filter(|l| l.shadow.is_some()).nth(index);
            if let Some(light) = shown {
                self.show_shadow_map(device, light)?;
            }
        }

        log::debug!(
            "frame: {} calls ({} culled), {} shadow draws, {} color draws, {} lights",
            self.stats.queued_calls,
            self.stats.culled_calls,
            self.stats.shadow_draws,
            self.stats.color_draws,
            self.stats.visible_lights
        );
        Ok(())
    }

    /// Bring one light's shadow map up to date for this frame
    ///
    /// Spot and directional lights with `cast_shadows` set lazily acquire a
    /// depth target the first frame they cast and redraw it every frame
    /// after; clearing the flag releases the target. The entity's visible
    /// flag gates shading only, never the shadow lifecycle. Point lights
    /// never allocate. Leaves the viewport sized to the shadow target;
    /// `render_scene` restores it before the color pass.
    pub fn generate_shadow_map(
        &mut self,
        device: &mut dyn RenderDevice,
        assets: &Assets,
        light: &mut LightEntity,
    ) -> RenderResult<()> {
        if !(light.cast_shadows && light.supports_shadows()) {
            if light.cast_shadows {
                log::debug!("light '{}' cannot cast shadows", light.name);
            }
            if let Some(map) = light.shadow.take() {
                log::info!("releasing shadow map of light '{}'", light.name);
                device.destroy_depth_target(map.target);
            }
            return Ok(());
        }
        let Some(camera) = shadow_camera(light, self.settings.aspect()) else {
            return Ok(());
        };

        match &mut light.shadow {
            Some(map) => map.camera = camera,
            None => {
                let resolution = self.settings.shadow_map_resolution;
                log::info!(
                    "allocating {resolution}x{resolution} shadow map for light '{}'",
                    light.name
                );
                let target = device.create_depth_target(resolution, resolution)?;
                light.shadow = Some(ShadowMap { target, camera });
            }
        }

        let Some(map) = &light.shadow else {
            return Ok(());
        };
        self.stats.shadow_draws += render_shadow_pass(device, assets, self.queue.calls(), map);
        Ok(())
    }

    /// Draw a light's shadow map into a corner viewport for inspection
    ///
    /// Blits the depth texture with the `depth` program, which linearizes
    /// depth with the light camera's near and far planes. A no-op when the
    /// light holds no map. Restores the full viewport before returning.
    pub fn show_shadow_map(
        &mut self,
        device: &mut dyn RenderDevice,
        light: &LightEntity,
    ) -> RenderResult<()> {
        let Some(map) = &light.shadow else {
            log::debug!("light '{}' holds no shadow map to show", light.name);
            return Ok(());
        };
        let Some(program) = device.program("depth") else {
            log::warn!("shadow debug view skipped: no 'depth' program");
            return Ok(());
        };

        let (buffer, vertex_count) = match self.blit_quad {
            Some(quad) => quad,
            None => {
                let vertices = screen_quad_vertices();
                let buffer = device
                    .create_vertex_buffer(bytemuck::cast_slice(&vertices), vertices.len() as u32)?;
                let quad = (buffer, vertices.len() as u32);
                self.blit_quad = Some(quad);
                quad
            }
        };

        let size = self.settings.debug_shadow_viewport;
        device.set_viewport(0, 0, size, size);
        device.bind_program(program);
        device.set_uniform(
            "u_camera_nearfar",
            UniformValue::Vec2(Vec2::new(map.camera.near, map.camera.far)),
        );
        device.bind_texture(0, map.texture());
        PassState::overlay().apply(device);
        device.draw(buffer, vertex_count);
        PassState::reset(device);
        device.set_viewport(
            0,
            0,
            self.settings.viewport_width,
            self.settings.viewport_height,
        );
        Ok(())
    }

    /// Color pass shading every light in one draw per call
    fn render_single_pass(
        &mut self,
        device: &mut dyn RenderDevice,
        assets: &Assets,
        scene: &Scene,
        camera: &Camera,
    ) {
        let Some(program) = device.program("single_pass") else {
            log::warn!("color pass skipped: no 'single_pass' program");
            return;
        };

        self.light_block.reset();
        let mut dropped = 0usize;
        for light in &self.frame_lights {
            if !self.light_block.push(light) {
                dropped += 1;
            }
        }
        if dropped > 0 && !self.warned_light_overflow {
            log::warn!(
                "{dropped} visible lights exceed the {}-slot block; extras ignored",
                self.light_block.capacity()
            );
            self.warned_light_overflow = true;
        }

        device.bind_program(program);
        device.set_uniform(
            "u_viewprojection",
            UniformValue::Mat4(camera.view_projection_matrix()),
        );
        device.set_uniform("u_camera_position", UniformValue::Vec3(camera.position));
        device.set_uniform(
            "u_time",
            UniformValue::Float(self.stopwatch.elapsed_secs()),
        );
        device.set_uniform("u_ambient_light", UniformValue::Vec3(scene.ambient_light));
        device.set_uniform(
            "u_texture2show",
            UniformValue::Int(self.settings.debug_channel.shader_index()),
        );
        upload_single_pass_lights(
            device,
            &self.light_block,
            &self.frame_lights,
            assets.white_texture(),
        );

        let frustum = camera.frustum();
        for call in self.queue.calls() {
            if !frustum.intersects_aabb(&call.world_bounds) {
                self.stats.culled_calls += 1;
                continue;
            }
            let Some(mesh) = assets.mesh(call.mesh) else {
                continue;
            };
            let Some(material) = assets.material(call.material) else {
                continue;
            };

            bind_material_inputs(device, assets, material);
            device.set_uniform("u_model", UniformValue::Mat4(call.model));
            PassState::single_pass(material.blend_mode(), material.two_sided).apply(device);
            device.draw(mesh.buffer, mesh.vertex_count);
            self.stats.color_draws += 1;
            PassState::reset(device);
        }
    }

    /// Color pass re-drawing every call once per visible light
    ///
    /// The first pass lays down ambient plus the first light with the
    /// material's own blending; later passes accumulate additively with the
    /// depth test relaxed to equality. A scene with no visible lights still
    /// gets one pass with a neutralized light so ambient and depth land.
    /// A non-Complete debug channel replaces the shaded output, so only the
    /// first light's pass is drawn in that case; additive passes would stack
    /// the channel once per light.
    fn render_multi_pass(
        &mut self,
        device: &mut dyn RenderDevice,
        assets: &Assets,
        scene: &Scene,
        camera: &Camera,
    ) {
        let Some(program) = device.program("multi_pass") else {
            log::warn!("color pass skipped: no 'multi_pass' program");
            return;
        };

        device.bind_program(program);
        device.set_uniform(
            "u_viewprojection",
            UniformValue::Mat4(camera.view_projection_matrix()),
        );
        device.set_uniform("u_camera_position", UniformValue::Vec3(camera.position));
        device.set_uniform(
            "u_time",
            UniformValue::Float(self.stopwatch.elapsed_secs()),
        );
        device.set_uniform(
            "u_texture2show",
            UniformValue::Int(self.settings.debug_channel.shader_index()),
        );

        let passes = if self.settings.debug_channel == DebugChannel::Complete {
            self.frame_lights.len().max(1)
        } else {
            1
        };
        let placeholder = assets.white_texture();
        let frustum = camera.frustum();

        for call in self.queue.calls() {
            if !frustum.intersects_aabb(&call.world_bounds) {
                self.stats.culled_calls += 1;
                continue;
            }
            let Some(mesh) = assets.mesh(call.mesh) else {
                continue;
            };
            let Some(material) = assets.material(call.material) else {
                continue;
            };

            bind_material_inputs(device, assets, material);
            device.set_uniform("u_model", UniformValue::Mat4(call.model));

            for pass in 0..passes {
                let ambient = if pass == 0 {
                    scene.ambient_light
                } else {
                    Vec3::zeros()
                };
                device.set_uniform("u_ambient_light", UniformValue::Vec3(ambient));
                upload_multi_pass_light(device, self.frame_lights.get(pass), placeholder);
                PassState::multi_pass(pass, material.blend_mode(), material.two_sided)
                    .apply(device);
                device.draw(mesh.buffer, mesh.vertex_count);
                self.stats.color_draws += 1;
            }
            PassState::reset(device);
        }
    }
}

/// Bind a material's color, cutoff, and texture set for a color draw
///
/// Every unit the shaders sample is bound each draw, with the white or
/// black placeholder standing in for absent maps, so no unit ever carries
/// a stale texture from the previous call. The normal map flag tells the
/// shader whether unit 4 holds a real map or the placeholder.
fn bind_material_inputs(device: &mut dyn RenderDevice, assets: &Assets, material: &Material) {
    device.set_uniform("u_color", UniformValue::Vec4(material.base_color));
    device.set_uniform(
        "u_alpha_cutoff",
        UniformValue::Float(material.shader_alpha_cutoff()),
    );

    let white = assets.white_texture();
    device.bind_texture(0, assets.resolve_texture(material.base_color_texture, white));
    device.bind_texture(
        1,
        assets.resolve_texture(material.emissive_texture, assets.black_texture()),
    );
    device.bind_texture(2, assets.resolve_texture(material.occlusion_texture, white));
    device.bind_texture(
        3,
        assets.resolve_texture(material.metallic_roughness_texture, white),
    );

    let normal = material.normal_texture.and_then(|key| assets.texture(key));
    device.set_uniform(
        "u_normal_text_bool",
        UniformValue::Int(i32::from(normal.is_some())),
    );
    device.bind_texture(4, normal.map_or(white, |texture| texture.id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec4};
    use crate::render::backends::{DeviceEvent, TraceDevice};
    use crate::render::resources::{Material, Mesh};
    use crate::scene::{LightKind, Node, Prefab, PrefabInstance};
    use std::sync::Arc;

    fn cube_scene(device: &mut TraceDevice, assets: &mut Assets) -> Scene {
        let mesh = assets.add_mesh(Mesh::cube(device, 1.0).unwrap());
        let material =
            assets.add_material(Material::new("chalk", Vec4::new(0.9, 0.9, 0.9, 1.0)));
        let mut scene = Scene::new();
        scene.add(SceneEntity::Prefab(PrefabInstance::new(
            "cube",
            Arc::new(Prefab::new(
                "cube",
                Node::new("cube").with_mesh(mesh).with_material(material),
            )),
            Mat4::identity(),
        )));
        scene
    }

    fn eye_camera() -> Camera {
        Camera::perspective(Vec3::new(0.0, 0.0, 6.0), 60.0, 1.0, 0.1, 100.0)
    }

    #[test]
    fn test_deferred_path_falls_back_to_forward() {
        let mut device = TraceDevice::new();
        let mut assets = Assets::new(&mut device).unwrap();
        let mut scene = cube_scene(&mut device, &mut assets);
        let settings = RendererSettings::new(640, 480).with_render_path(RenderPath::Deferred);
        let mut renderer = ForwardRenderer::new(settings);

        renderer
            .render_scene(&mut device, &assets, &mut scene, &eye_camera())
            .unwrap();
        assert_eq!(renderer.last_frame_stats().color_draws, 1);
    }

    #[test]
    fn test_shadow_map_released_when_flag_clears() {
        let mut device = TraceDevice::new();
        let assets = Assets::new(&mut device).unwrap();
        let mut light = LightEntity::new("spot", LightKind::Spot)
            .at(Vec3::new(0.0, 4.0, 0.0))
            .with_shadows(0.005);
        let mut renderer = ForwardRenderer::new(RendererSettings::new(640, 480));

        renderer
            .generate_shadow_map(&mut device, &assets, &mut light)
            .unwrap();
        assert!(light.shadow.is_some());
        assert_eq!(device.live_depth_targets(), 1);

        light.cast_shadows = false;
        renderer
            .generate_shadow_map(&mut device, &assets, &mut light)
            .unwrap();
        assert!(light.shadow.is_none());
        assert_eq!(device.live_depth_targets(), 0);
    }

    #[test]
    fn test_point_light_never_allocates_shadow() {
        let mut device = TraceDevice::new();
        let assets = Assets::new(&mut device).unwrap();
        let mut light = LightEntity::new("bulb", LightKind::Point).with_shadows(0.005);
        let mut renderer = ForwardRenderer::new(RendererSettings::new(640, 480));

        renderer
            .generate_shadow_map(&mut device, &assets, &mut light)
            .unwrap();
        assert!(light.shadow.is_none());
        assert_eq!(device.live_depth_targets(), 0);
    }

    #[test]
    fn test_show_shadow_map_restores_viewport() {
        let mut device = TraceDevice::new();
        let assets = Assets::new(&mut device).unwrap();
        let mut light = LightEntity::new("spot", LightKind::Spot)
            .at(Vec3::new(0.0, 4.0, 0.0))
            .with_shadows(0.005);
        let mut renderer = ForwardRenderer::new(RendererSettings::new(800, 600));
        renderer
            .generate_shadow_map(&mut device, &assets, &mut light)
            .unwrap();

        device.clear_events();
        renderer.show_shadow_map(&mut device, &light).unwrap();

        let viewports: Vec<(u32, u32)> = device
            .events()
            .iter()
            .filter_map(|event| match event {
                DeviceEvent::SetViewport { width, height, .. } => Some((*width, *height)),
                _ => None,
            })
            .collect();
        assert_eq!(viewports.first(), Some(&(256, 256)));
        assert_eq!(viewports.last(), Some(&(800, 600)));
        assert_eq!(device.draw_count(), 1);
    }
}
