//! Recording render device
//!
//! A headless [`RenderDevice`] that performs no GPU work and instead appends
//! every call to an event log. Tests drive the full pipeline against it and
//! assert on the recorded sequence; resource handles are handed out from a
//! monotonic counter so they are unique and deterministic within a device.

use std::collections::HashMap;

use crate::foundation::math::Vec4;
use crate::render::api::{
    BufferId, ClearMask, DepthTarget, DepthTargetId, ProgramId, RenderDevice, TextureId,
    UniformValue,
};
use crate::render::state::{BlendMode, CullMode, DepthFunc};
use crate::render::{RenderError, RenderResult};

/// Program names every pipeline stage expects to find
const DEFAULT_PROGRAMS: [&str; 4] = ["single_pass", "multi_pass", "flat", "depth"];

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// Viewport rectangle change
    SetViewport {
        /// Left edge in pixels
        x: u32,
        /// Bottom edge in pixels
        y: u32,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Attachment clear
    Clear {
        /// Attachments cleared
        mask: ClearMask,
        /// Clear color, ignored without [`ClearMask::COLOR`]
        color: Vec4,
    },
    /// Blend state change
    SetBlend(Option<BlendMode>),
    /// Cull state change
    SetCullMode(CullMode),
    /// Depth function change
    SetDepthFunc(DepthFunc),
    /// Program bind
    BindProgram(ProgramId),
    /// Named uniform bind
    SetUniform {
        /// Uniform name
        name: String,
        /// Bound value
        value: UniformValue,
    },
    /// Uniform block upload
    SetUniformBlock {
        /// Block binding name
        name: String,
        /// Uploaded bytes
        data: Vec<u8>,
    },
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit index
        unit: u32,
        /// Bound texture
        texture: TextureId,
    },
    /// Depth target allocation
    CreateDepthTarget(DepthTargetId),
    /// Depth target destruction
    DestroyDepthTarget(DepthTargetId),
    /// Offscreen depth target bound for rendering
    BindDepthTarget(DepthTargetId),
    /// Default framebuffer restored
    UnbindDepthTarget,
    /// Draw call
    Draw {
        /// Source vertex buffer
        buffer: BufferId,
        /// Vertices drawn
        vertex_count: u32,
    },
}

/// Render device that records calls instead of executing them
#[derive(Debug)]
pub struct TraceDevice {
    events: Vec<DeviceEvent>,
    programs: HashMap<String, ProgramId>,
    next_handle: u64,
    live_depth_targets: usize,
}

impl TraceDevice {
    /// Create a device with the standard pipeline programs registered
    pub fn new() -> Self {
        Self::with_programs(&DEFAULT_PROGRAMS)
    }

    /// Create a device exposing only the given program names
    ///
    /// Used to test that the pipeline skips work, rather than failing, when
    /// a program is missing.
    pub fn with_programs(names: &[&str]) -> Self {
        let mut device = Self {
            events: Vec::new(),
            programs: HashMap::new(),
            next_handle: 1,
            live_depth_targets: 0,
        };
        for name in names {
            let id = ProgramId(device.alloc_handle());
            device.programs.insert((*name).to_string(), id);
        }
        device
    }

    fn alloc_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// All events recorded so far, in call order
    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    /// Drop recorded events, keeping resources and program registrations
    ///
    /// Lets a test build assets, then trace only the frame under scrutiny.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Number of draw calls recorded
    pub fn draw_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, DeviceEvent::Draw { .. }))
            .count()
    }

    /// Number of depth targets currently allocated
    pub fn live_depth_targets(&self) -> usize {
        self.live_depth_targets
    }

    /// Values bound to the named uniform, in bind order
    pub fn uniform_values(&self, uniform: &str) -> Vec<UniformValue> {
        self.events
            .iter()
            .filter_map(|event| match event {
                DeviceEvent::SetUniform { name, value } if name == uniform => {
                    Some(value.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Most recent upload to the named uniform block
    pub fn last_uniform_block(&self, block: &str) -> Option<&[u8]> {
        self.events.iter().rev().find_map(|event| match event {
            DeviceEvent::SetUniformBlock { name, data } if name == block => {
                Some(data.as_slice())
            }
            _ => None,
        })
    }
}

impl Default for TraceDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for TraceDevice {
    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.events.push(DeviceEvent::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear(&mut self, mask: ClearMask, color: Vec4) {
        self.events.push(DeviceEvent::Clear { mask, color });
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        self.events.push(DeviceEvent::SetBlend(blend));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.events.push(DeviceEvent::SetCullMode(mode));
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.events.push(DeviceEvent::SetDepthFunc(func));
    }

    fn program(&self, name: &str) -> Option<ProgramId> {
        self.programs.get(name).copied()
    }

    fn bind_program(&mut self, program: ProgramId) {
        self.events.push(DeviceEvent::BindProgram(program));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.events.push(DeviceEvent::SetUniform {
            name: name.to_string(),
            value,
        });
    }

    fn set_uniform_block(&mut self, name: &str, data: &[u8]) {
        self.events.push(DeviceEvent::SetUniformBlock {
            name: name.to_string(),
            data: data.to_vec(),
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.events.push(DeviceEvent::BindTexture { unit, texture });
    }

    fn create_vertex_buffer(&mut self, _data: &[u8], _vertex_count: u32) -> RenderResult<BufferId> {
        Ok(BufferId(self.alloc_handle()))
    }

    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> RenderResult<TextureId> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::ResourceCreationFailed(format!(
                "texture {width}x{height} expects {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(TextureId(self.alloc_handle()))
    }

    fn create_depth_target(&mut self, width: u32, height: u32) -> RenderResult<DepthTarget> {
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "zero-sized depth target {width}x{height}"
            )));
        }
        let target = DepthTarget {
            id: DepthTargetId(self.alloc_handle()),
            texture: TextureId(self.alloc_handle()),
            width,
            height,
        };
        self.live_depth_targets += 1;
        self.events.push(DeviceEvent::CreateDepthTarget(target.id));
        Ok(target)
    }

    fn destroy_depth_target(&mut self, target: DepthTarget) {
        self.live_depth_targets = self.live_depth_targets.saturating_sub(1);
        self.events.push(DeviceEvent::DestroyDepthTarget(target.id));
    }

    fn bind_depth_target(&mut self, target: DepthTargetId) {
        self.events.push(DeviceEvent::BindDepthTarget(target));
    }

    fn unbind_depth_target(&mut self) {
        self.events.push(DeviceEvent::UnbindDepthTarget);
    }

    fn draw(&mut self, buffer: BufferId, vertex_count: u32) {
        self.events.push(DeviceEvent::Draw {
            buffer,
            vertex_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_programs_registered() {
        let device = TraceDevice::new();
        for name in DEFAULT_PROGRAMS {
            assert!(device.program(name).is_some(), "missing program {name}");
        }
        assert!(device.program("wireframe").is_none());
    }

    #[test]
    fn test_handles_are_unique() {
        let mut device = TraceDevice::new();
        let a = device.create_vertex_buffer(&[0u8; 12], 1).unwrap();
        let b = device.create_vertex_buffer(&[0u8; 12], 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_depth_target_lifecycle_counter() {
        let mut device = TraceDevice::new();
        let target = device.create_depth_target(64, 64).unwrap();
        assert_eq!(device.live_depth_targets(), 1);
        device.destroy_depth_target(target);
        assert_eq!(device.live_depth_targets(), 0);
    }

    #[test]
    fn test_texture_size_validation() {
        let mut device = TraceDevice::new();
        assert!(device.create_texture(2, 2, &[0u8; 16]).is_ok());
        assert!(device.create_texture(2, 2, &[0u8; 3]).is_err());
    }

    #[test]
    fn test_events_record_in_call_order() {
        let mut device = TraceDevice::new();
        device.set_viewport(0, 0, 4, 4);
        device.clear(ClearMask::COLOR | ClearMask::DEPTH, Vec4::zeros());
        device.set_uniform("u_time", UniformValue::Float(1.5));
        assert_eq!(device.events().len(), 3);
        assert_eq!(
            device.uniform_values("u_time"),
            vec![UniformValue::Float(1.5)]
        );
        device.clear_events();
        assert!(device.events().is_empty());
    }
}
