//! GPU-facing asset storage
//!
//! Meshes, materials, and textures live in slotmap registries and are
//! referenced everywhere else by copyable keys. Asset loading itself happens
//! outside this crate; scenes are assembled from already-uploaded resources.
//! Stale keys resolve to `None`, and the drawable that referenced them is
//! skipped for the frame.

use bytemuck::{Pod, Zeroable};
use slotmap::{new_key_type, SlotMap};

use crate::foundation::geometry::Aabb;
use crate::foundation::math::{Vec3, Vec4};
use crate::render::api::{BufferId, RenderDevice, TextureId};
use crate::render::state::BlendMode;
use crate::render::RenderResult;

new_key_type! {
    /// Stable key for a mesh in the asset store
    pub struct MeshKey;
    /// Stable key for a material in the asset store
    pub struct MaterialKey;
    /// Stable key for a texture in the asset store
    pub struct TextureKey;
}

/// Vertex layout shared by every mesh in the pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

/// A mesh uploaded to the device
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex buffer holding the mesh data
    pub buffer: BufferId,
    /// Number of vertices to draw
    pub vertex_count: u32,
    /// Object-space bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Upload a vertex list and compute its object-space bounds
    pub fn from_vertices(device: &mut dyn RenderDevice, vertices: &[Vertex]) -> RenderResult<Self> {
        let mut min = Vec3::from_element(f32::MAX);
        let mut max = Vec3::from_element(f32::MIN);
        for vertex in vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(vertex.position[axis]);
                max[axis] = max[axis].max(vertex.position[axis]);
            }
        }
        if vertices.is_empty() {
            min = Vec3::zeros();
            max = Vec3::zeros();
        }

        let buffer = device.create_vertex_buffer(
            bytemuck::cast_slice(vertices),
            vertices.len() as u32,
        )?;
        Ok(Self {
            buffer,
            vertex_count: vertices.len() as u32,
            bounds: Aabb::new(min, max),
        })
    }

    /// Upload an axis-aligned cube of the given edge length, centered at the origin
    pub fn cube(device: &mut dyn RenderDevice, size: f32) -> RenderResult<Self> {
        Self::from_vertices(device, &cube_vertices(size))
    }

    /// Upload a flat XZ quad of the given edge length with an upward normal
    pub fn plane(device: &mut dyn RenderDevice, size: f32) -> RenderResult<Self> {
        Self::from_vertices(device, &plane_vertices(size))
    }
}

/// Generate the 36 vertices of an axis-aligned cube
pub fn cube_vertices(size: f32) -> Vec<Vertex> {
    let h = size * 0.5;
    // One entry per face: normal, then the axes spanning the face.
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(0.0, 0.0, -1.0), Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
        (Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
    ];

    let corners = [
        (-1.0, -1.0, [0.0, 0.0]),
        (1.0, -1.0, [1.0, 0.0]),
        (1.0, 1.0, [1.0, 1.0]),
        (-1.0, -1.0, [0.0, 0.0]),
        (1.0, 1.0, [1.0, 1.0]),
        (-1.0, 1.0, [0.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (normal, u_axis, v_axis) in faces {
        for (u, v, uv) in corners {
            let position = normal * h + u_axis * (u * h) + v_axis * (v * h);
            vertices.push(Vertex {
                position: [position.x, position.y, position.z],
                normal: [normal.x, normal.y, normal.z],
                uv,
            });
        }
    }
    vertices
}

/// Generate the 6 vertices of a flat XZ quad facing +Y
pub fn plane_vertices(size: f32) -> Vec<Vertex> {
    let h = size * 0.5;
    let corner = |x: f32, z: f32, uv: [f32; 2]| Vertex {
        position: [x * h, 0.0, z * h],
        normal: [0.0, 1.0, 0.0],
        uv,
    };
    vec![
        corner(-1.0, -1.0, [0.0, 0.0]),
        corner(-1.0, 1.0, [0.0, 1.0]),
        corner(1.0, 1.0, [1.0, 1.0]),
        corner(-1.0, -1.0, [0.0, 0.0]),
        corner(1.0, 1.0, [1.0, 1.0]),
        corner(1.0, -1.0, [1.0, 0.0]),
    ]
}

/// Generate a full-viewport quad in normalized device coordinates
///
/// Spans -1..1 in X and Y at z zero, for overlay draws whose vertex stage
/// passes positions through untransformed.
pub fn screen_quad_vertices() -> Vec<Vertex> {
    let corner = |x: f32, y: f32, uv: [f32; 2]| Vertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv,
    };
    vec![
        corner(-1.0, -1.0, [0.0, 0.0]),
        corner(1.0, -1.0, [1.0, 0.0]),
        corner(1.0, 1.0, [1.0, 1.0]),
        corner(-1.0, -1.0, [0.0, 0.0]),
        corner(1.0, 1.0, [1.0, 1.0]),
        corner(-1.0, 1.0, [0.0, 1.0]),
    ]
}

/// Alpha handling modes for materials
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaMode {
    /// No transparency
    Opaque,
    /// Alpha testing with cutoff value
    Mask(f32),
    /// Alpha blending
    Blend,
}

impl Default for AlphaMode {
    fn default() -> Self {
        AlphaMode::Opaque
    }
}

/// Material resource describing how a mesh is shaded
#[derive(Debug, Clone)]
pub struct Material {
    /// Name for debugging
    pub name: String,
    /// Base color factor (linear RGBA)
    pub base_color: Vec4,
    /// Alpha handling mode
    pub alpha_mode: AlphaMode,
    /// Render both faces and skip backface culling
    pub two_sided: bool,
    /// Base color texture, white when absent
    pub base_color_texture: Option<TextureKey>,
    /// Emissive texture, black when absent
    pub emissive_texture: Option<TextureKey>,
    /// Ambient occlusion texture, white when absent
    pub occlusion_texture: Option<TextureKey>,
    /// Metallic-roughness texture, white when absent
    pub metallic_roughness_texture: Option<TextureKey>,
    /// Tangent-space normal map; shading skips normal mapping when absent
    pub normal_texture: Option<TextureKey>,
}

impl Material {
    /// Create an opaque single-color material
    pub fn new(name: impl Into<String>, base_color: Vec4) -> Self {
        Self {
            name: name.into(),
            base_color,
            alpha_mode: AlphaMode::Opaque,
            two_sided: false,
            base_color_texture: None,
            emissive_texture: None,
            occlusion_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
        }
    }

    /// Set the alpha handling mode
    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    /// Render both faces of the geometry
    pub fn with_two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }

    /// Set the base color texture
    pub fn with_base_color_texture(mut self, texture: TextureKey) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    /// Set the tangent-space normal map
    pub fn with_normal_texture(mut self, texture: TextureKey) -> Self {
        self.normal_texture = Some(texture);
        self
    }

    /// Set the emissive texture
    pub fn with_emissive_texture(mut self, texture: TextureKey) -> Self {
        self.emissive_texture = Some(texture);
        self
    }

    /// Whether this material composites with alpha blending
    pub fn is_blended(&self) -> bool {
        matches!(self.alpha_mode, AlphaMode::Blend)
    }

    /// Blend mode applied during color passes, `None` for opaque draws
    pub fn blend_mode(&self) -> Option<BlendMode> {
        if self.is_blended() {
            Some(BlendMode::Alpha)
        } else {
            None
        }
    }

    /// Alpha cutoff uploaded to shaders
    ///
    /// Zero disables the cutout test; masked materials pass their cutoff
    /// through unchanged, including in depth-only passes so cutouts hole
    /// the shadow map.
    pub fn shader_alpha_cutoff(&self) -> f32 {
        match self.alpha_mode {
            AlphaMode::Mask(cutoff) => cutoff,
            AlphaMode::Opaque | AlphaMode::Blend => 0.0,
        }
    }
}

/// A texture uploaded to the device
#[derive(Debug, Clone, Copy)]
pub struct Texture {
    /// Device handle for binding
    pub id: TextureId,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Central registry of GPU-facing assets
///
/// Owns the slotmaps behind [`MeshKey`], [`MaterialKey`], and [`TextureKey`],
/// plus the neutral placeholder textures bound wherever a material leaves a
/// texture slot empty.
pub struct Assets {
    meshes: SlotMap<MeshKey, Mesh>,
    materials: SlotMap<MaterialKey, Material>,
    textures: SlotMap<TextureKey, Texture>,
    white: TextureId,
    black: TextureId,
}

impl Assets {
    /// Create an empty store and upload the 1x1 placeholder textures
    pub fn new(device: &mut dyn RenderDevice) -> RenderResult<Self> {
        let white = device.create_texture(1, 1, &[255, 255, 255, 255])?;
        let black = device.create_texture(1, 1, &[0, 0, 0, 255])?;
        log::info!("Asset store created (placeholders: white={white:?}, black={black:?})");
        Ok(Self {
            meshes: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            white,
            black,
        })
    }

    /// Register a mesh and return its key
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshKey {
        self.meshes.insert(mesh)
    }

    /// Register a material and return its key
    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    /// Register a texture and return its key
    pub fn add_texture(&mut self, texture: Texture) -> TextureKey {
        self.textures.insert(texture)
    }

    /// Remove a mesh, invalidating its key
    pub fn remove_mesh(&mut self, key: MeshKey) -> Option<Mesh> {
        self.meshes.remove(key)
    }

    /// Look up a mesh
    pub fn mesh(&self, key: MeshKey) -> Option<&Mesh> {
        self.meshes.get(key)
    }

    /// Look up a material
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    /// Look up a texture
    pub fn texture(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    /// The 1x1 white placeholder texture
    pub fn white_texture(&self) -> TextureId {
        self.white
    }

    /// The 1x1 black placeholder texture
    pub fn black_texture(&self) -> TextureId {
        self.black
    }

    /// Resolve an optional texture slot to a bindable id
    ///
    /// Missing or stale keys fall back to the given placeholder so shaders
    /// never sample an unbound unit.
    pub fn resolve_texture(&self, key: Option<TextureKey>, fallback: TextureId) -> TextureId {
        key.and_then(|k| self.textures.get(k))
            .map_or(fallback, |texture| texture.id)
    }
}
