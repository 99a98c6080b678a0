//! Scene model
//!
//! The scene is an ordered collection of entities: prefab instances that
//! contribute geometry, lights that illuminate it, and a couple of declared
//! but inert entity kinds. The render pipeline consumes the scene each frame
//! together with an explicit main camera; nothing in here is global state.
//!
//! ## Architecture
//!
//! ```text
//! Scene (entities, ambient, lighting mode)
//!      |
//! ForwardRenderer (flatten -> sort -> shadows -> color)
//!      |
//! RenderDevice (GPU commands)
//! ```

pub mod camera;
pub mod light;
pub mod prefab;

pub use camera::{Camera, Projection};
pub use light::{LightEntity, LightKind};
pub use prefab::{Node, Prefab};

use std::sync::Arc;

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Multi-light shading strategy for the color pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingMode {
    /// Shade every light in one draw through a bounded uniform array
    SinglePass,
    /// One additive draw per visible light
    MultiPass,
}

/// A prefab placed in the scene
#[derive(Debug, Clone)]
pub struct PrefabInstance {
    /// Name for debugging
    pub name: String,
    /// World transform applied above the prefab's root node
    pub transform: Mat4,
    /// Invisible instances are skipped entirely, children included
    pub visible: bool,
    /// Shared prefab tree
    pub prefab: Arc<Prefab>,
}

impl PrefabInstance {
    /// Instance a prefab at a world transform
    pub fn new(name: impl Into<String>, prefab: Arc<Prefab>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            visible: true,
            prefab,
        }
    }
}

/// A reflection probe placed in the scene
///
/// Declared for scene compatibility; the forward pipeline does not render
/// probes and skips these entities everywhere.
#[derive(Debug, Clone)]
pub struct ReflectionProbe {
    /// Name for debugging
    pub name: String,
    /// World transform
    pub transform: Mat4,
}

/// A decal placed in the scene
///
/// Declared for scene compatibility; the forward pipeline does not project
/// decals and skips these entities everywhere.
#[derive(Debug, Clone)]
pub struct Decal {
    /// Name for debugging
    pub name: String,
    /// World transform
    pub transform: Mat4,
}

/// An entity owned by the scene
///
/// Closed sum over the entity kinds the pipeline understands; matching is
/// exhaustive wherever entities are dispatched, so adding a kind is a
/// compile-visible change.
#[derive(Debug)]
pub enum SceneEntity {
    /// Geometry contributed through a prefab instance
    Prefab(PrefabInstance),
    /// A light
    Light(LightEntity),
    /// Inert reflection probe
    ReflectionProbe(ReflectionProbe),
    /// Inert decal
    Decal(Decal),
}

/// The world being rendered
pub struct Scene {
    /// Entities in insertion order
    pub entities: Vec<SceneEntity>,
    /// Ambient light folded into every shaded draw
    pub ambient_light: Vec3,
    /// Clear color for the main color pass
    pub background_color: Vec4,
    /// Multi-light strategy used by the color pass
    pub lighting_mode: LightingMode,
}

impl Scene {
    /// Create an empty scene with a dark background and dim ambient term
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            ambient_light: Vec3::new(0.1, 0.1, 0.1),
            background_color: Vec4::new(0.005, 0.005, 0.005, 1.0),
            lighting_mode: LightingMode::SinglePass,
        }
    }

    /// Add an entity to the scene
    pub fn add(&mut self, entity: SceneEntity) {
        self.entities.push(entity);
    }

    /// Iterate all lights
    pub fn lights(&self) -> impl Iterator<Item = &LightEntity> {
        self.entities.iter().filter_map(|entity| match entity {
            SceneEntity::Light(light) => Some(light),
            _ => None,
        })
    }

    /// Iterate all lights mutably
    pub fn lights_mut(&mut self) -> impl Iterator<Item = &mut LightEntity> {
        self.entities.iter_mut().filter_map(|entity| match entity {
            SceneEntity::Light(light) => Some(light),
            _ => None,
        })
    }

    /// Iterate all prefab instances
    pub fn prefab_instances(&self) -> impl Iterator<Item = &PrefabInstance> {
        self.entities.iter().filter_map(|entity| match entity {
            SceneEntity::Prefab(instance) => Some(instance),
            _ => None,
        })
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
