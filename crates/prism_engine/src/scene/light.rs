//! Light entities
//!
//! Point, spot, and directional lights with photometric parameters and an
//! optionally owned shadow map. The shadow resources live directly on the
//! light: they are created lazily the first frame the light casts and
//! destroyed the frame its `cast_shadows` flag clears.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::shadow::ShadowMap;

/// The kinds of light the pipeline shades
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Omnidirectional light with distance attenuation
    Point,
    /// Cone-shaped light with angular and distance attenuation
    Spot,
    /// Parallel light arriving from a direction, no distance attenuation
    Directional,
}

/// A light placed in the scene
#[derive(Debug)]
pub struct LightEntity {
    /// Name for debugging
    pub name: String,
    /// World transform; the translation is the light position, the rotation
    /// orients spot cones
    pub transform: Mat4,
    /// Invisible lights do not contribute to shading
    pub visible: bool,
    /// Kind of light
    pub kind: LightKind,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier applied to the color
    pub intensity: f32,
    /// Attenuation range; also the far plane of shadow projections
    pub max_distance: f32,
    /// Spot cone aperture in degrees
    pub cone_angle: f32,
    /// Spot cone falloff exponent
    pub cone_exp: f32,
    /// Extent of the directional shadow volume in world units
    pub area_size: f32,
    /// Aim point for directional lights
    pub target: Vec3,
    /// Whether this light should render a shadow map
    pub cast_shadows: bool,
    /// Depth bias applied when sampling the shadow map
    pub shadow_bias: f32,
    /// Shadow resources owned by this light
    ///
    /// Present iff `cast_shadows` was set on some earlier frame and has not
    /// been cleared since; managed by the shadow generator.
    pub shadow: Option<ShadowMap>,
}

impl LightEntity {
    /// Create a light of the given kind with default parameters
    pub fn new(name: impl Into<String>, kind: LightKind) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::identity(),
            visible: true,
            kind,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            max_distance: 100.0,
            cone_angle: 45.0,
            cone_exp: 2.0,
            area_size: 100.0,
            target: Vec3::zeros(),
            cast_shadows: false,
            shadow_bias: 0.005,
            shadow: None,
        }
    }

    /// Place the light at a world position
    pub fn at(mut self, position: Vec3) -> Self {
        self.transform = Mat4::new_translation(&position);
        self
    }

    /// Set the world transform
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Set color and intensity
    pub fn with_color(mut self, color: Vec3, intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    /// Set the attenuation range
    pub fn with_range(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Set the spot cone aperture (degrees) and falloff exponent
    pub fn with_cone(mut self, angle_degrees: f32, exponent: f32) -> Self {
        self.cone_angle = angle_degrees;
        self.cone_exp = exponent;
        self
    }

    /// Set the directional shadow volume extent
    pub fn with_area_size(mut self, area_size: f32) -> Self {
        self.area_size = area_size;
        self
    }

    /// Aim a directional light at a world point
    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Enable shadow casting with the given sampling bias
    pub fn with_shadows(mut self, bias: f32) -> Self {
        self.cast_shadows = true;
        self.shadow_bias = bias;
        self
    }

    /// World-space position of the light
    pub fn position(&self) -> Vec3 {
        self.transform.translation_part()
    }

    /// Forward axis of the light's transform (spot aim direction)
    pub fn forward(&self) -> Vec3 {
        self.transform.transform_vector(&Vec3::new(0.0, 0.0, -1.0))
    }

    /// Up axis of the light's transform, used for shadow view orientation
    pub fn up(&self) -> Vec3 {
        self.transform.transform_vector(&Vec3::new(0.0, 1.0, 0.0))
    }

    /// Direction uploaded to shaders
    ///
    /// Spots aim along their forward axis; directional lights shine from
    /// their position toward the target, so the uploaded vector points back
    /// at the light. Point lights have no direction.
    pub fn shading_direction(&self) -> Vec3 {
        match self.kind {
            LightKind::Point => Vec3::zeros(),
            LightKind::Spot => self.forward(),
            LightKind::Directional => (self.position() - self.target)
                .try_normalize(1e-6)
                .unwrap_or_else(Vec3::y),
        }
    }

    /// Cosine of the spot cone aperture, precomputed for shaders
    pub fn cone_cos(&self) -> f32 {
        utils::deg_to_rad(self.cone_angle).cos()
    }

    /// Whether this kind of light can render a shadow map
    ///
    /// Point lights never cast; they would need a cube map the pipeline
    /// does not implement.
    pub fn supports_shadows(&self) -> bool {
        matches!(self.kind, LightKind::Spot | LightKind::Directional)
    }
}
