//! # Prism Engine
//!
//! A forward-rendering scene pipeline with multi-light shading and shadow
//! maps.
//!
//! ## Features
//!
//! - **Scene Graph**: Prefab node trees instanced into a flat entity list
//! - **Forward Pipeline**: Build, sort, shadow, and color stages in a fixed order
//! - **Two Lighting Strategies**: Every light in one draw, or one draw per light
//! - **Shadow Maps**: Depth targets acquired and released by the lights that cast
//! - **Pluggable Devices**: One trait for GPU backends, with a recording device for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prism_engine::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut device = TraceDevice::new();
//!     let mut assets = Assets::new(&mut device)?;
//!     let cube = assets.add_mesh(Mesh::cube(&mut device, 1.0)?);
//!     let chalk = assets.add_material(Material::new("chalk", Vec4::new(0.9, 0.9, 0.9, 1.0)));
//!
//!     let mut scene = Scene::new();
//!     scene.add(SceneEntity::Prefab(PrefabInstance::new(
//!         "cube",
//!         Arc::new(Prefab::new(
//!             "cube",
//!             Node::new("cube").with_mesh(cube).with_material(chalk),
//!         )),
//!         Mat4::identity(),
//!     )));
//!     scene.add(SceneEntity::Light(
//!         LightEntity::new("key", LightKind::Spot)
//!             .at(Vec3::new(2.0, 4.0, 2.0))
//!             .with_shadows(0.005),
//!     ));
//!
//!     let camera = Camera::perspective(Vec3::new(0.0, 2.0, 6.0), 45.0, 16.0 / 9.0, 0.1, 100.0);
//!     let mut renderer = ForwardRenderer::new(RendererSettings::new(1280, 720));
//!     renderer.render_scene(&mut device, &assets, &mut scene, &camera)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core pipeline modules
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for pipeline users
pub mod prelude {
    pub use crate::{
        config::{Config, DebugChannel, RenderPath, RendererSettings},
        foundation::{
            math::{Mat4, Transform, Vec2, Vec3, Vec4},
            time::{Stopwatch, Timer},
        },
        render::{
            backends::TraceDevice, AlphaMode, Assets, BlendMode, ClearMask, CullMode, DepthFunc,
            ForwardRenderer, FrameStats, Material, Mesh, RenderDevice, RenderError, RenderResult,
            UniformValue,
        },
        scene::{
            Camera, Decal, LightEntity, LightKind, LightingMode, Node, Prefab, PrefabInstance,
            ReflectionProbe, Scene, SceneEntity,
        },
    };
}
