//! Render state management
//!
//! Small state machine applied around every draw: face culling follows the
//! material, blending follows the lighting strategy and pass index, and the
//! global state is reset to a fixed baseline after each drawable so one
//! draw's state never leaks into the next.

use crate::render::api::RenderDevice;

/// Blending modes for different rendering effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Standard alpha blending (source alpha, one minus source alpha)
    Alpha,
    /// Additive blending (source alpha, one) for light accumulation passes
    Additive,
}

/// Face culling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Depth comparison functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    /// Pass fragments strictly closer than the stored depth
    Less,
    /// Also pass fragments at equal depth, required when geometry is
    /// re-rasterized once per light
    LessEqual,
    /// Always pass, for overlays drawn on top of the finished frame
    Always,
}

/// Complete render state for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassState {
    /// Alpha blending, disabled when `None`
    pub blend: Option<BlendMode>,
    /// Face culling mode
    pub cull: CullMode,
    /// Depth comparison function
    pub depth: DepthFunc,
}

impl PassState {
    /// State for a depth-only shadow draw
    ///
    /// Shadow passes never blend; two-sided materials still disable culling
    /// so both faces deposit depth.
    pub fn depth_only(two_sided: bool) -> Self {
        Self {
            blend: None,
            cull: cull_for(two_sided),
            depth: DepthFunc::Less,
        }
    }

    /// State for a color draw that shades all lights in one pass
    pub fn single_pass(material_blend: Option<BlendMode>, two_sided: bool) -> Self {
        Self {
            blend: material_blend,
            cull: cull_for(two_sided),
            depth: DepthFunc::Less,
        }
    }

    /// State for one light's draw in the multi-pass strategy
    ///
    /// The first pass composites with the material's own blend mode; every
    /// later pass accumulates additively on top of it. All passes relax the
    /// depth test to `LessEqual` so re-drawn geometry survives its own
    /// depth from the previous pass.
    pub fn multi_pass(pass_index: usize, material_blend: Option<BlendMode>, two_sided: bool) -> Self {
        let blend = if pass_index == 0 {
            material_blend
        } else {
            Some(BlendMode::Additive)
        };
        Self {
            blend,
            cull: cull_for(two_sided),
            depth: DepthFunc::LessEqual,
        }
    }

    /// State for a debug overlay drawn over the finished frame
    ///
    /// No blending, no culling, and an always-pass depth test so the
    /// overlay quad lands regardless of what the frame wrote.
    pub fn overlay() -> Self {
        Self {
            blend: None,
            cull: CullMode::None,
            depth: DepthFunc::Always,
        }
    }

    /// Apply this state through the device
    pub fn apply(&self, device: &mut dyn RenderDevice) {
        device.set_blend(self.blend);
        device.set_cull_mode(self.cull);
        device.set_depth_func(self.depth);
    }

    /// Restore the baseline state after a drawable completes
    ///
    /// Baseline is blending disabled and a strictly-less depth test.
    pub fn reset(device: &mut dyn RenderDevice) {
        device.set_blend(None);
        device.set_depth_func(DepthFunc::Less);
    }
}

fn cull_for(two_sided: bool) -> CullMode {
    if two_sided {
        CullMode::None
    } else {
        CullMode::Back
    }
}
