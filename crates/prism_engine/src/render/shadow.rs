//! Shadow map generation
//!
//! Spot and directional lights own a depth-only render target that the
//! pipeline redraws every frame they cast. This module holds the shadow
//! resources, derives the light's view of the scene, and renders the depth
//! pass; the forward renderer decides when maps are acquired and released.
//!
//! Point lights are excluded: they would need a cube map target the
//! pipeline does not implement.

use crate::render::api::{ClearMask, DepthTarget, RenderDevice, TextureId, UniformValue};
use crate::render::queue::RenderCall;
use crate::render::resources::Assets;
use crate::render::state::PassState;
use crate::scene::{Camera, LightEntity, LightKind};

/// Near plane shared by all shadow projections
const SHADOW_NEAR: f32 = 0.1;

/// Depth resources owned by one shadow-casting light
///
/// Created lazily the first frame the light casts and destroyed the frame
/// its `cast_shadows` flag clears. The camera is refreshed from the light's
/// current transform before every depth pass.
#[derive(Debug)]
pub struct ShadowMap {
    /// Depth-only render target the light draws into
    pub target: DepthTarget,
    /// The light's view of the scene during the last depth pass
    pub camera: Camera,
}

impl ShadowMap {
    /// Depth texture sampled by the color passes
    pub fn texture(&self) -> TextureId {
        self.target.texture
    }

    /// View-projection matrix that maps world space into this shadow map
    pub fn view_projection(&self) -> crate::foundation::math::Mat4 {
        self.camera.view_projection_matrix()
    }
}

/// Derive the camera a light renders its shadow map through
///
/// Spots get a perspective projection with the cone aperture as vertical
/// field of view, square aspect, and the attenuation range as far plane,
/// aimed along the light's forward axis. Directional lights get an
/// orthographic box that spans `area_size` horizontally and `area_size`
/// scaled by the main viewport aspect vertically, aimed at the light's
/// target. Both orient with the light transform's up axis.
///
/// Returns `None` for point lights.
pub fn shadow_camera(light: &LightEntity, viewport_aspect: f32) -> Option<Camera> {
    let mut camera = match light.kind {
        LightKind::Point => return None,
        LightKind::Spot => Camera::perspective(
            light.position(),
            light.cone_angle,
            1.0,
            SHADOW_NEAR,
            light.max_distance,
        ),
        LightKind::Directional => {
            let half_width = light.area_size * 0.5;
            Camera::orthographic(
                light.position(),
                half_width,
                half_width * viewport_aspect,
                SHADOW_NEAR,
                light.max_distance,
            )
        }
    };

    let target = match light.kind {
        LightKind::Spot => light.position() + light.forward(),
        _ => light.target,
    };
    camera.look_at(target, light.up());
    Some(camera)
}

/// Render the depth pass for one shadow map
///
/// Redirects rendering into the map's target, clears depth, and draws every
/// opaque call the light camera can see with the `flat` program. Blended
/// materials never cast; masked materials keep their cutoff so cutouts hole
/// the map. Restores the default framebuffer and baseline state before
/// returning the number of draws issued.
pub(crate) fn render_shadow_pass(
    device: &mut dyn RenderDevice,
    assets: &Assets,
    calls: &[RenderCall],
    shadow: &ShadowMap,
) -> u32 {
    let Some(program) = device.program("flat") else {
        log::warn!("shadow pass skipped: no 'flat' program");
        return 0;
    };

    device.bind_depth_target(shadow.target.id);
    device.set_viewport(0, 0, shadow.target.width, shadow.target.height);
    device.clear(ClearMask::DEPTH, crate::foundation::math::Vec4::zeros());
    device.bind_program(program);
    device.set_uniform(
        "u_viewprojection",
        UniformValue::Mat4(shadow.camera.view_projection_matrix()),
    );

    let frustum = shadow.camera.frustum();
    let mut draws = 0;
    for call in calls {
        if call.blended {
            continue;
        }
        if !frustum.intersects_aabb(&call.world_bounds) {
            continue;
        }
        let Some(mesh) = assets.mesh(call.mesh) else {
            continue;
        };
        let Some(material) = assets.material(call.material) else {
            continue;
        };

        PassState::depth_only(material.two_sided).apply(device);
        device.set_uniform("u_model", UniformValue::Mat4(call.model));
        device.set_uniform(
            "u_alpha_cutoff",
            UniformValue::Float(material.shader_alpha_cutoff()),
        );
        device.bind_texture(
            0,
            assets.resolve_texture(material.base_color_texture, assets.white_texture()),
        );
        device.draw(mesh.buffer, mesh.vertex_count);
        draws += 1;
    }

    PassState::reset(device);
    device.unbind_depth_target();
    draws
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};
    use crate::render::backends::{DeviceEvent, TraceDevice};
    use crate::render::queue::RenderQueue;
    use crate::render::resources::{AlphaMode, Material, Mesh};
    use crate::scene::{Node, Prefab, PrefabInstance, Projection, Scene, SceneEntity};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_spot_camera_uses_cone_as_fov() {
        let light = LightEntity::new("spot", LightKind::Spot)
            .at(Vec3::new(0.0, 5.0, 0.0))
            .with_cone(45.0, 2.0)
            .with_range(30.0);
        let camera = shadow_camera(&light, 16.0 / 9.0).unwrap();
        match camera.projection {
            Projection::Perspective { fov, aspect } => {
                assert_relative_eq!(fov, 45.0_f32.to_radians(), epsilon = 1e-6);
                assert_relative_eq!(aspect, 1.0);
            }
            Projection::Orthographic { .. } => panic!("spot shadows are perspective"),
        }
        assert_relative_eq!(camera.far, 30.0);
        assert_relative_eq!(camera.near, SHADOW_NEAR);
    }

    #[test]
    fn test_directional_camera_spans_area() {
        let light = LightEntity::new("sun", LightKind::Directional)
            .at(Vec3::new(10.0, 10.0, 0.0))
            .with_area_size(40.0)
            .with_range(80.0);
        let camera = shadow_camera(&light, 2.0).unwrap();
        match camera.projection {
            Projection::Orthographic {
                half_width,
                half_height,
            } => {
                assert_relative_eq!(half_width, 20.0);
                assert_relative_eq!(half_height, 40.0);
            }
            Projection::Perspective { .. } => panic!("directional shadows are orthographic"),
        }
        assert_relative_eq!(camera.far, 80.0);
        // Aimed at the light's target.
        assert_relative_eq!(camera.target, Vec3::zeros());
    }

    #[test]
    fn test_point_lights_have_no_shadow_camera() {
        let light = LightEntity::new("bulb", LightKind::Point);
        assert!(shadow_camera(&light, 1.0).is_none());
    }

    struct PassFixture {
        device: TraceDevice,
        assets: Assets,
        queue: RenderQueue,
    }

    fn build_pass_fixture() -> PassFixture {
        let mut device = TraceDevice::new();
        let mut assets = Assets::new(&mut device).unwrap();
        let mesh = assets.add_mesh(Mesh::cube(&mut device, 1.0).unwrap());
        let opaque = assets.add_material(Material::new("wall", Vec4::new(1.0, 1.0, 1.0, 1.0)));
        let glass = assets.add_material(
            Material::new("glass", Vec4::new(1.0, 1.0, 1.0, 0.4))
                .with_alpha_mode(AlphaMode::Blend),
        );

        let root = Node::new("root")
            .with_child(Node::new("wall").with_mesh(mesh).with_material(opaque))
            .with_child(
                Node::new("glass")
                    .with_transform(Mat4::new_translation(&Vec3::new(1.5, 0.0, 0.0)))
                    .with_mesh(mesh)
                    .with_material(glass),
            );
        let mut scene = Scene::new();
        scene.add(SceneEntity::Prefab(PrefabInstance::new(
            "props",
            Arc::new(Prefab::new("props", root)),
            Mat4::identity(),
        )));

        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 0.1, 100.0);
        let mut queue = RenderQueue::new();
        queue.build(&scene, &camera, &assets);

        PassFixture {
            device,
            assets,
            queue,
        }
    }

    fn spot_shadow_map(device: &mut TraceDevice) -> ShadowMap {
        let light = LightEntity::new("spot", LightKind::Spot)
            .at(Vec3::new(0.0, 0.0, 6.0))
            .with_cone(60.0, 2.0)
            .with_range(50.0);
        ShadowMap {
            target: device.create_depth_target(128, 128).unwrap(),
            camera: shadow_camera(&light, 1.0).unwrap(),
        }
    }

    #[test]
    fn test_pass_excludes_blended_calls() {
        let mut fx = build_pass_fixture();
        let shadow = spot_shadow_map(&mut fx.device);
        fx.device.clear_events();

        let draws = render_shadow_pass(&mut fx.device, &fx.assets, fx.queue.calls(), &shadow);
        assert_eq!(fx.queue.len(), 2);
        assert_eq!(draws, 1);
        assert_eq!(fx.device.draw_count(), 1);
    }

    #[test]
    fn test_pass_clears_depth_only_in_own_viewport() {
        let mut fx = build_pass_fixture();
        let shadow = spot_shadow_map(&mut fx.device);
        fx.device.clear_events();

        render_shadow_pass(&mut fx.device, &fx.assets, fx.queue.calls(), &shadow);

        let events = fx.device.events();
        assert_eq!(events[0], DeviceEvent::BindDepthTarget(shadow.target.id));
        assert_eq!(
            events[1],
            DeviceEvent::SetViewport {
                x: 0,
                y: 0,
                width: 128,
                height: 128,
            }
        );
        assert!(matches!(
            &events[2],
            DeviceEvent::Clear { mask, .. } if *mask == ClearMask::DEPTH
        ));
        assert_eq!(events.last(), Some(&DeviceEvent::UnbindDepthTarget));
    }

    #[test]
    fn test_pass_culls_outside_light_frustum() {
        let mut fx = build_pass_fixture();
        // Narrow cone pointed away from both cubes.
        let light = LightEntity::new("spot", LightKind::Spot)
            .with_transform(
                Mat4::new_translation(&Vec3::new(0.0, 0.0, 6.0)) * Mat4::rotation_y(std::f32::consts::PI),
            )
            .with_cone(10.0, 2.0)
            .with_range(50.0);
        let shadow = ShadowMap {
            target: fx.device.create_depth_target(128, 128).unwrap(),
            camera: shadow_camera(&light, 1.0).unwrap(),
        };
        fx.device.clear_events();

        let draws = render_shadow_pass(&mut fx.device, &fx.assets, fx.queue.calls(), &shadow);
        assert_eq!(draws, 0);
    }

    #[test]
    fn test_pass_skips_without_flat_program() {
        let mut device = TraceDevice::with_programs(&["single_pass", "multi_pass", "depth"]);
        let mut assets = Assets::new(&mut device).unwrap();
        let mesh = assets.add_mesh(Mesh::cube(&mut device, 1.0).unwrap());
        let material = assets.add_material(Material::new("wall", Vec4::new(1.0, 1.0, 1.0, 1.0)));

        let mut scene = Scene::new();
        scene.add(SceneEntity::Prefab(PrefabInstance::new(
            "prop",
            Arc::new(Prefab::new(
                "prop",
                Node::new("cube").with_mesh(mesh).with_material(material),
            )),
            Mat4::identity(),
        )));
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 1.0, 0.1, 100.0);
        let mut queue = RenderQueue::new();
        queue.build(&scene, &camera, &assets);

        let light = LightEntity::new("spot", LightKind::Spot).at(Vec3::new(0.0, 0.0, 5.0));
        let shadow = ShadowMap {
            target: device.create_depth_target(64, 64).unwrap(),
            camera: shadow_camera(&light, 1.0).unwrap(),
        };
        device.clear_events();

        let draws = render_shadow_pass(&mut device, &assets, queue.calls(), &shadow);
        assert_eq!(draws, 0);
        assert!(device.events().is_empty());
    }

    #[test]
    fn test_masked_material_keeps_cutoff_in_pass() {
        let mut device = TraceDevice::new();
        let mut assets = Assets::new(&mut device).unwrap();
        let mesh = assets.add_mesh(Mesh::plane(&mut device, 2.0).unwrap());
        let leaves = assets.add_material(
            Material::new("leaves", Vec4::new(1.0, 1.0, 1.0, 1.0))
                .with_alpha_mode(AlphaMode::Mask(0.35)),
        );

        let mut scene = Scene::new();
        scene.add(SceneEntity::Prefab(PrefabInstance::new(
            "foliage",
            Arc::new(Prefab::new(
                "foliage",
                Node::new("leaves").with_mesh(mesh).with_material(leaves),
            )),
            Mat4::identity(),
        )));
        let camera = Camera::perspective(Vec3::new(0.0, 5.0, 5.0), 60.0, 1.0, 0.1, 100.0);
        let mut queue = RenderQueue::new();
        queue.build(&scene, &camera, &assets);

        let light = LightEntity::new("sun", LightKind::Directional)
            .at(Vec3::new(0.0, 10.0, 4.0))
            .with_area_size(30.0);
        let shadow = ShadowMap {
            target: device.create_depth_target(64, 64).unwrap(),
            camera: shadow_camera(&light, 1.0).unwrap(),
        };
        device.clear_events();

        let draws = render_shadow_pass(&mut device, &assets, queue.calls(), &shadow);
        assert_eq!(draws, 1);
        assert_eq!(
            device.uniform_values("u_alpha_cutoff"),
            vec![UniformValue::Float(0.35)]
        );
    }
}
