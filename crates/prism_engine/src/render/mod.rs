//! Rendering system
//!
//! The forward render pipeline and everything it drives: the per-frame
//! drawable queue, the shadow map generator, the lighting dispatcher, the
//! render state machine, and the device abstraction they all talk to.
//!
//! One frame flows through four strictly ordered phases:
//!
//! ```text
//! build      flatten visible prefab trees into RenderCalls
//! sort       opaque before blended, near before far
//! shadows    one depth-only pass per shadow-casting light
//! color      one shaded pass over the frustum-culled calls
//! ```

pub mod api;
pub mod backends;
pub mod forward;
pub mod lighting;
pub mod queue;
pub mod resources;
pub mod shadow;
pub mod state;

pub use api::{ClearMask, DepthTarget, RenderDevice, UniformValue};
pub use forward::{ForwardRenderer, FrameStats};
pub use queue::{RenderCall, RenderQueue};
pub use resources::{AlphaMode, Assets, Material, Mesh};
pub use shadow::ShadowMap;
pub use state::{BlendMode, CullMode, DepthFunc, PassState};

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors surfaced by the rendering system
///
/// Per-draw problems (missing meshes, stale handles, absent programs) are
/// not errors: the affected draw is skipped and the frame continues. Only
/// resource management can fail a call.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Resource creation or management failed
    ///
    /// Occurs when GPU resources (buffers, textures, render targets) cannot
    /// be created, typically due to memory constraints or invalid sizes.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),
}
