//! Configuration system
//!
//! File-backed configuration with TOML and RON support, plus the renderer
//! settings applications use to size viewports, shadow maps, and the light
//! ceiling without hardcoding values in the rendering system itself.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Which geometry pipeline the renderer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderPath {
    /// Shade geometry directly while rasterizing it
    Forward,
    /// G-buffer pipeline; declared but not implemented, falls back to forward
    Deferred,
}

/// Debug view selecting which material channel the shaders display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugChannel {
    /// Fully shaded output
    Complete,
    /// Surface normals
    Normal,
    /// Ambient occlusion term
    Occlusion,
    /// Emissive term
    Emissive,
}

impl DebugChannel {
    /// Integer id uploaded to shaders as `u_texture2show`
    pub fn shader_index(self) -> i32 {
        match self {
            Self::Complete => 0,
            Self::Normal => 1,
            Self::Occlusion => 2,
            Self::Emissive => 3,
        }
    }
}

/// Renderer settings loaded at startup
///
/// Applications customize these through the builder methods or by loading a
/// TOML/RON file via the [`Config`] trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererSettings {
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
    /// Square resolution of per-light shadow maps
    pub shadow_map_resolution: u32,
    /// Maximum number of lights a single-pass draw can shade
    pub max_lights: usize,
    /// Edge length of the on-screen shadow map debug view
    pub debug_shadow_viewport: u32,
    /// Light index whose shadow map is blitted after the color pass
    pub debug_shadow_light: Option<usize>,
    /// Geometry pipeline selection
    pub render_path: RenderPath,
    /// Material channel debug view
    pub debug_channel: DebugChannel,
}

impl RendererSettings {
    /// Create settings for a viewport of the given size
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            shadow_map_resolution: 2048,
            max_lights: 10,
            debug_shadow_viewport: 256,
            debug_shadow_light: None,
            render_path: RenderPath::Forward,
            debug_channel: DebugChannel::Complete,
        }
    }

    /// Set the shadow map resolution
    pub fn with_shadow_resolution(mut self, resolution: u32) -> Self {
        self.shadow_map_resolution = resolution;
        self
    }

    /// Set the single-pass light ceiling
    pub fn with_max_lights(mut self, max_lights: usize) -> Self {
        self.max_lights = max_lights.max(1);
        self
    }

    /// Select the geometry pipeline
    pub fn with_render_path(mut self, render_path: RenderPath) -> Self {
        self.render_path = render_path;
        self
    }

    /// Select the material channel debug view
    pub fn with_debug_channel(mut self, channel: DebugChannel) -> Self {
        self.debug_channel = channel;
        self
    }

    /// Blit the given light's shadow map after each frame
    pub fn with_debug_shadow_light(mut self, light_index: usize) -> Self {
        self.debug_shadow_light = Some(light_index);
        self
    }

    /// Viewport aspect ratio (width over height)
    pub fn aspect(&self) -> f32 {
        self.viewport_width as f32 / self.viewport_height as f32
    }
}

impl Default for RendererSettings {
    /// Default settings for a 720p viewport
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl Config for RendererSettings {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RendererSettings::default();
        assert_eq!(settings.shadow_map_resolution, 2048);
        assert_eq!(settings.max_lights, 10);
        assert_eq!(settings.render_path, RenderPath::Forward);
        assert_eq!(settings.debug_channel, DebugChannel::Complete);
    }

    #[test]
    fn test_settings_round_trip_through_toml() {
        let path = std::env::temp_dir().join("prism_settings_test.toml");
        let path = path.to_string_lossy().into_owned();

        let settings = RendererSettings::new(1920, 1080)
            .with_max_lights(4)
            .with_debug_channel(DebugChannel::Normal);
        settings.save_to_file(&path).unwrap();

        let loaded = RendererSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded.viewport_width, 1920);
        assert_eq!(loaded.max_lights, 4);
        assert_eq!(loaded.debug_channel, DebugChannel::Normal);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let path = std::env::temp_dir().join("prism_settings_test.yaml");
        let path = path.to_string_lossy().into_owned();
        std::fs::write(&path, "viewport_width: 100").unwrap();

        let result = RendererSettings::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_max_lights_floor() {
        let settings = RendererSettings::default().with_max_lights(0);
        assert_eq!(settings.max_lights, 1);
    }

    #[test]
    fn test_debug_channel_shader_indices_are_stable() {
        assert_eq!(DebugChannel::Complete.shader_index(), 0);
        assert_eq!(DebugChannel::Normal.shader_index(), 1);
        assert_eq!(DebugChannel::Occlusion.shader_index(), 2);
        assert_eq!(DebugChannel::Emissive.shader_index(), 3);
    }

    #[test]
    fn test_aspect_ratio() {
        let settings = RendererSettings::new(1600, 800);
        assert!((settings.aspect() - 2.0).abs() < f32::EPSILON);
    }
}
