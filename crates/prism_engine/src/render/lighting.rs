//! Light data for the color passes
//!
//! Two upload strategies share the same per-frame light snapshots. The
//! single-pass strategy packs every visible light into a fixed-size uniform
//! block and draws each call once; the multi-pass strategy re-draws each
//! call per light with singular `u_light_*` uniforms. Shaders never receive
//! a light count: unused block slots stay zeroed, and a zeroed slot's kind
//! is the none sentinel the shader skips.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Vec3};
use crate::render::api::{RenderDevice, TextureId, UniformValue};
use crate::scene::{LightEntity, LightKind};

/// First texture unit of the shadow map range
///
/// Units 0 through 7 carry material textures; shadow maps occupy unit 8
/// upward. The single-pass strategy binds one unit per block slot, the
/// multi-pass strategy only ever uses unit 8.
pub const SHADOW_TEXTURE_UNIT: u32 = 8;

/// Name of the uniform block carrying the packed light array
pub const LIGHT_BLOCK_NAME: &str = "u_lights";

fn kind_index(kind: LightKind) -> i32 {
    match kind {
        LightKind::Point => 1,
        LightKind::Spot => 2,
        LightKind::Directional => 3,
    }
}

/// One light as the single-pass shader block sees it
///
/// `repr(C)` with explicit padding so the array uploads as raw bytes. An
/// all-zero value is a valid empty slot: its kind is [`GpuLight::KIND_NONE`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// World position
    pub position: [f32; 3],
    /// Light kind index; zero marks an empty slot
    pub kind: i32,
    /// Linear RGB color premultiplied by intensity
    pub color: [f32; 3],
    /// Attenuation range
    pub max_distance: f32,
    /// Shading direction, zero for point lights
    pub direction: [f32; 3],
    /// Cosine of the spot cone aperture
    pub cone_cos: f32,
    /// Spot cone falloff exponent
    pub cone_exp: f32,
    /// One when the slot carries a usable shadow map
    pub cast_shadows: i32,
    /// Depth bias applied when sampling the shadow map
    pub shadow_bias: f32,
    /// Explicit padding; the struct must carry no implicit padding to stay `Pod`
    pub pad: f32,
    /// World-to-shadow-map matrix, identity when not casting
    pub view_projection: [[f32; 4]; 4],
}

impl GpuLight {
    /// Kind index of an empty slot
    pub const KIND_NONE: i32 = 0;
}

/// Shadow map sample data captured for one frame
#[derive(Debug, Clone, Copy)]
pub struct ShadowSample {
    /// Depth texture to sample
    pub texture: TextureId,
    /// World-to-shadow-map matrix
    pub view_projection: Mat4,
    /// Depth bias
    pub bias: f32,
}

/// Owned snapshot of one visible light
///
/// Captured after the shadow passes have updated the scene's lights, so the
/// color passes can iterate lights without holding any scene borrow.
#[derive(Debug, Clone, Copy)]
pub struct FrameLight {
    /// Kind of light
    pub kind: LightKind,
    /// World position
    pub position: Vec3,
    /// Shading direction, zero for point lights
    pub direction: Vec3,
    /// Color premultiplied by intensity
    pub color: Vec3,
    /// Attenuation range
    pub max_distance: f32,
    /// Cosine of the spot cone aperture
    pub cone_cos: f32,
    /// Spot cone falloff exponent
    pub cone_exp: f32,
    /// Shadow data when the light holds a live map this frame
    pub shadow: Option<ShadowSample>,
}

impl FrameLight {
    /// Snapshot a scene light for this frame's color passes
    pub fn capture(light: &LightEntity) -> Self {
        let shadow = light
            .shadow
            .as_ref()
            .filter(|_| light.cast_shadows)
            .map(|map| ShadowSample {
                texture: map.texture(),
                view_projection: map.view_projection(),
                bias: light.shadow_bias,
            });
        Self {
            kind: light.kind,
            position: light.position(),
            direction: light.shading_direction(),
            color: light.color * light.intensity,
            max_distance: light.max_distance,
            cone_cos: light.cone_cos(),
            cone_exp: light.cone_exp,
            shadow,
        }
    }

    /// Pack this light into a block slot
    pub fn to_gpu(&self) -> GpuLight {
        let (cast_shadows, view_projection, shadow_bias) = match self.shadow {
            Some(sample) => (1, sample.view_projection, sample.bias),
            None => (0, Mat4::identity(), 0.0),
        };
        GpuLight {
            position: self.position.into(),
            kind: kind_index(self.kind),
            color: self.color.into(),
            max_distance: self.max_distance,
            direction: self.direction.into(),
            cone_cos: self.cone_cos,
            cone_exp: self.cone_exp,
            cast_shadows,
            shadow_bias,
            pad: 0.0,
            view_projection: view_projection.into(),
        }
    }
}

/// Fixed-capacity light array uploaded to the single-pass shader
///
/// Allocated once at the configured light ceiling and reused every frame;
/// `reset` zeroes the slots without releasing capacity.
#[derive(Debug)]
pub struct LightBlock {
    slots: Vec<GpuLight>,
    active: usize,
}

impl LightBlock {
    /// Allocate a block with the given number of slots, at least one
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![GpuLight::zeroed(); capacity.max(1)],
            active: 0,
        }
    }

    /// Number of slots in the block
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots filled since the last reset
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Zero every slot and start filling from the front again
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = GpuLight::zeroed();
        }
        self.active = 0;
    }

    /// Fill the next slot; returns false when the block is full
    pub fn push(&mut self, light: &FrameLight) -> bool {
        if self.active == self.slots.len() {
            return false;
        }
        self.slots[self.active] = light.to_gpu();
        self.active += 1;
        true
    }

    /// The whole block as bytes, trailing empty slots included
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }
}

/// Upload the light block and bind one shadow unit per slot
///
/// Every slot's texture unit is bound even when nothing casts, with the
/// white placeholder standing in, so the shader samples defined memory
/// regardless of which slots are live.
pub(crate) fn upload_single_pass_lights(
    device: &mut dyn RenderDevice,
    block: &LightBlock,
    lights: &[FrameLight],
    placeholder: TextureId,
) {
    device.set_uniform_block(LIGHT_BLOCK_NAME, block.as_bytes());
    for slot in 0..block.capacity() {
        let texture = lights
            .get(slot)
            .and_then(|light| light.shadow)
            .map_or(placeholder, |sample| sample.texture);
        device.bind_texture(SHADOW_TEXTURE_UNIT + slot as u32, texture);
    }
}

/// Upload one light's uniforms for a multi-pass color draw
///
/// `None` uploads a neutralized slot: kind none, black color, no shadows.
/// The ambient-only draw of a lightless frame goes through this path so the
/// shader runs with fully defined light state.
pub(crate) fn upload_multi_pass_light(
    device: &mut dyn RenderDevice,
    light: Option<&FrameLight>,
    placeholder: TextureId,
) {
    let Some(light) = light else {
        device.set_uniform("u_light_type", UniformValue::Int(GpuLight::KIND_NONE));
        device.set_uniform("u_light_color", UniformValue::Vec3(Vec3::zeros()));
        device.set_uniform("u_light_cast_shadows", UniformValue::Int(0));
        device.bind_texture(SHADOW_TEXTURE_UNIT, placeholder);
        return;
    };

    device.set_uniform("u_light_type", UniformValue::Int(kind_index(light.kind)));
    device.set_uniform("u_light_position", UniformValue::Vec3(light.position));
    device.set_uniform("u_light_color", UniformValue::Vec3(light.color));
    device.set_uniform(
        "u_light_max_distance",
        UniformValue::Float(light.max_distance),
    );
    device.set_uniform("u_light_cone_cos", UniformValue::Float(light.cone_cos));
    device.set_uniform("u_light_cone_exp", UniformValue::Float(light.cone_exp));
    device.set_uniform("u_light_direction", UniformValue::Vec3(light.direction));

    match light.shadow {
        Some(sample) => {
            device.set_uniform("u_light_cast_shadows", UniformValue::Int(1));
            device.set_uniform(
                "u_shadow_viewproj",
                UniformValue::Mat4(sample.view_projection),
            );
            device.set_uniform("u_shadow_bias", UniformValue::Float(sample.bias));
            device.bind_texture(SHADOW_TEXTURE_UNIT, sample.texture);
        }
        None => {
            device.set_uniform("u_light_cast_shadows", UniformValue::Int(0));
            device.bind_texture(SHADOW_TEXTURE_UNIT, placeholder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::TraceDevice;
    use crate::render::shadow::{shadow_camera, ShadowMap};
    use approx::assert_relative_eq;

    fn plain_light(kind: LightKind) -> FrameLight {
        FrameLight::capture(&LightEntity::new("test", kind))
    }

    #[test]
    fn test_gpu_light_is_128_bytes() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 128);
    }

    #[test]
    fn test_zeroed_slot_is_none_kind() {
        let slot = GpuLight::zeroed();
        assert_eq!(slot.kind, GpuLight::KIND_NONE);
        assert_eq!(slot.cast_shadows, 0);
    }

    #[test]
    fn test_capture_premultiplies_intensity() {
        let light = LightEntity::new("lamp", LightKind::Point)
            .with_color(Vec3::new(1.0, 0.5, 0.0), 2.0);
        let frame = FrameLight::capture(&light);
        assert_relative_eq!(frame.color, Vec3::new(2.0, 1.0, 0.0));
        assert!(frame.shadow.is_none());
    }

    #[test]
    fn test_capture_carries_live_shadow() {
        let mut device = TraceDevice::new();
        let mut light = LightEntity::new("spot", LightKind::Spot)
            .at(Vec3::new(0.0, 4.0, 0.0))
            .with_shadows(0.01);
        light.shadow = Some(ShadowMap {
            target: device.create_depth_target(64, 64).unwrap(),
            camera: shadow_camera(&light, 1.0).unwrap(),
        });

        let frame = FrameLight::capture(&light);
        let sample = frame.shadow.unwrap();
        assert_relative_eq!(sample.bias, 0.01);
        assert_eq!(sample.texture, light.shadow.as_ref().unwrap().texture());
    }

    #[test]
    fn test_block_keeps_trailing_slots_zeroed() {
        let mut block = LightBlock::new(4);
        assert!(block.push(&plain_light(LightKind::Point)));
        assert!(block.push(&plain_light(LightKind::Directional)));
        assert_eq!(block.active_count(), 2);

        let bytes = block.as_bytes();
        assert_eq!(bytes.len(), 4 * 128);
        let slots: &[GpuLight] = bytemuck::cast_slice(bytes);
        assert_eq!(slots[0].kind, 1);
        assert_eq!(slots[1].kind, 3);
        assert_eq!(slots[2].kind, GpuLight::KIND_NONE);
        assert_eq!(slots[3].kind, GpuLight::KIND_NONE);
    }

    #[test]
    fn test_block_rejects_overflow_and_resets() {
        let mut block = LightBlock::new(1);
        assert!(block.push(&plain_light(LightKind::Point)));
        assert!(!block.push(&plain_light(LightKind::Spot)));

        block.reset();
        assert_eq!(block.active_count(), 0);
        let slots: &[GpuLight] = bytemuck::cast_slice(block.as_bytes());
        assert_eq!(slots[0].kind, GpuLight::KIND_NONE);
    }

    #[test]
    fn test_zero_capacity_rounds_up_to_one() {
        assert_eq!(LightBlock::new(0).capacity(), 1);
    }

    #[test]
    fn test_single_pass_binds_every_shadow_unit() {
        let mut device = TraceDevice::new();
        let placeholder = device.create_texture(1, 1, &[255; 4]).unwrap();

        let mut caster = plain_light(LightKind::Spot);
        let map_texture = TextureId(77);
        caster.shadow = Some(ShadowSample {
            texture: map_texture,
            view_projection: Mat4::identity(),
            bias: 0.005,
        });
        let lights = [caster, plain_light(LightKind::Point)];

        let mut block = LightBlock::new(3);
        for light in &lights {
            block.push(light);
        }
        device.clear_events();
        upload_single_pass_lights(&mut device, &block, &lights, placeholder);

        let block_bytes = device.last_uniform_block(LIGHT_BLOCK_NAME).unwrap();
        assert_eq!(block_bytes.len(), 3 * 128);

        let bound: Vec<(u32, TextureId)> = device
            .events()
            .iter()
            .filter_map(|event| match event {
                crate::render::backends::DeviceEvent::BindTexture { unit, texture } => {
                    Some((*unit, *texture))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            bound,
            vec![
                (SHADOW_TEXTURE_UNIT, map_texture),
                (SHADOW_TEXTURE_UNIT + 1, placeholder),
                (SHADOW_TEXTURE_UNIT + 2, placeholder),
            ]
        );
    }

    #[test]
    fn test_multi_pass_neutral_slot() {
        let mut device = TraceDevice::new();
        let placeholder = device.create_texture(1, 1, &[255; 4]).unwrap();
        device.clear_events();

        upload_multi_pass_light(&mut device, None, placeholder);
        assert_eq!(
            device.uniform_values("u_light_type"),
            vec![UniformValue::Int(GpuLight::KIND_NONE)]
        );
        assert_eq!(
            device.uniform_values("u_light_cast_shadows"),
            vec![UniformValue::Int(0)]
        );
    }

    #[test]
    fn test_multi_pass_uploads_shadow_uniforms() {
        let mut device = TraceDevice::new();
        let placeholder = device.create_texture(1, 1, &[255; 4]).unwrap();

        let mut light = plain_light(LightKind::Spot);
        light.shadow = Some(ShadowSample {
            texture: TextureId(42),
            view_projection: Mat4::identity(),
            bias: 0.002,
        });
        device.clear_events();
        upload_multi_pass_light(&mut device, Some(&light), placeholder);

        assert_eq!(
            device.uniform_values("u_light_cast_shadows"),
            vec![UniformValue::Int(1)]
        );
        assert_eq!(
            device.uniform_values("u_shadow_bias"),
            vec![UniformValue::Float(0.002)]
        );
        assert_eq!(device.uniform_values("u_light_type"), vec![UniformValue::Int(2)]);
    }
}
