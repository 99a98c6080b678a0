//! Public rendering device API
//!
//! This module defines the trait that rendering devices must implement to
//! provide a consistent interface for the high-level renderer. The device is
//! an opaque command sink: the pipeline sets render state, binds programs and
//! named uniforms, and issues draws, while the device owns all GPU objects
//! behind small copyable handles.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::state::{BlendMode, CullMode, DepthFunc};
use crate::render::RenderResult;

/// Handle to a shading program owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

/// Handle to a vertex buffer owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Handle to a texture owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Handle to an offscreen depth-only render target owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthTargetId(pub u64);

/// An allocated depth-only render target and its sampleable depth texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthTarget {
    /// Target handle used for binding and destruction
    pub id: DepthTargetId,
    /// Depth texture produced by rendering into the target
    pub texture: TextureId,
    /// Width of the target in pixels
    pub width: u32,
    /// Height of the target in pixels
    pub height: u32,
}

bitflags::bitflags! {
    /// Which framebuffer attachments a clear touches
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        /// Clear the color attachment
        const COLOR = 0b01;
        /// Clear the depth attachment
        const DEPTH = 0b10;
    }
}

/// A value bound to a named shader uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Signed integer uniform
    Int(i32),
    /// Scalar float uniform
    Float(f32),
    /// Two-component vector uniform
    Vec2(Vec2),
    /// Three-component vector uniform
    Vec3(Vec3),
    /// Four-component vector uniform
    Vec4(Vec4),
    /// 4x4 matrix uniform
    Mat4(Mat4),
}

/// Main rendering device trait
///
/// Abstracts over concrete graphics APIs and provides the command surface
/// the forward pipeline drives. State setters, uniform binds, and draws are
/// fire-and-forget; only resource management is fallible.
pub trait RenderDevice {
    /// Set the active viewport rectangle in pixels
    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    /// Clear the currently bound target's attachments
    ///
    /// The color is ignored unless [`ClearMask::COLOR`] is set.
    fn clear(&mut self, mask: ClearMask, color: Vec4);

    /// Enable alpha blending with the given mode, or disable it with `None`
    fn set_blend(&mut self, blend: Option<BlendMode>);

    /// Set the face-culling mode
    fn set_cull_mode(&mut self, mode: CullMode);

    /// Set the depth comparison function
    fn set_depth_func(&mut self, func: DepthFunc);

    /// Look up a shading program by name
    ///
    /// Returns `None` when no program with that name exists; callers skip
    /// the draw rather than fail the frame.
    fn program(&self, name: &str) -> Option<ProgramId>;

    /// Bind a shading program for subsequent uniform binds and draws
    fn bind_program(&mut self, program: ProgramId);

    /// Bind a value to a named uniform of the bound program
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    /// Upload a raw uniform block to a named binding of the bound program
    fn set_uniform_block(&mut self, name: &str, data: &[u8]);

    /// Bind a texture to a numbered texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    /// Create a vertex buffer from raw vertex bytes
    fn create_vertex_buffer(&mut self, data: &[u8], vertex_count: u32) -> RenderResult<BufferId>;

    /// Create a 2D texture from raw RGBA8 pixel bytes
    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> RenderResult<TextureId>;

    /// Allocate an offscreen depth-only render target
    fn create_depth_target(&mut self, width: u32, height: u32) -> RenderResult<DepthTarget>;

    /// Destroy a depth target and its depth texture
    fn destroy_depth_target(&mut self, target: DepthTarget);

    /// Redirect rendering into an offscreen depth target
    fn bind_depth_target(&mut self, target: DepthTargetId);

    /// Restore rendering to the default framebuffer
    fn unbind_depth_target(&mut self);

    /// Draw `vertex_count` vertices from a bound vertex buffer
    fn draw(&mut self, buffer: BufferId, vertex_count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_mask_combines() {
        let both = ClearMask::COLOR | ClearMask::DEPTH;
        assert!(both.contains(ClearMask::COLOR));
        assert!(both.contains(ClearMask::DEPTH));
        assert!(!ClearMask::DEPTH.contains(ClearMask::COLOR));
    }

    #[test]
    fn test_handles_compare_by_value() {
        assert_eq!(TextureId(3), TextureId(3));
        assert_ne!(DepthTargetId(1), DepthTargetId(2));
    }
}
