//! Per-frame drawable queue
//!
//! Flattens the scene's visible prefab trees into a list of [`RenderCall`]s
//! and orders them for the color pass. The queue is rebuilt from scratch
//! every frame; calls never survive across frames.

use crate::foundation::geometry::Aabb;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::resources::{Assets, MaterialKey, MeshKey};
use crate::scene::{Camera, Scene};

/// Sort-distance offset that moves blended drawables behind every opaque one
///
/// Added to the camera distance of blended calls at build time, so a single
/// ascending sort yields opaque-then-blended order. Large enough to dominate
/// any plausible scene distance.
pub const BLEND_DISTANCE_OFFSET: f32 = 1_000_000.0;

/// One drawable unit for one frame
///
/// Holds keys into the asset store rather than owned resources; keys are
/// resolved again at draw time and the call is skipped if they went stale.
#[derive(Debug, Clone)]
pub struct RenderCall {
    /// Mesh to draw
    pub mesh: MeshKey,
    /// Material shading the mesh
    pub material: MaterialKey,
    /// World transform of the node that produced this call
    pub model: Mat4,
    /// World-space bounding box used for frustum tests
    pub world_bounds: Aabb,
    /// Distance from the camera eye to the node origin, plus
    /// [`BLEND_DISTANCE_OFFSET`] when the material blends
    pub sort_distance: f32,
    /// Whether the material composites with alpha blending
    pub blended: bool,
}

/// Frame-local list of drawables
///
/// Owned by the renderer and reused across frames: `build` clears and
/// repopulates the backing vector, retaining its capacity.
#[derive(Debug, Default)]
pub struct RenderQueue {
    calls: Vec<RenderCall>,
}

impl RenderQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// Rebuild the queue from the scene's visible prefab instances
    ///
    /// Walks each visible instance's node tree, composing local transforms
    /// with their parents. A node contributes one call iff it carries both
    /// a mesh and a material; grouping nodes only pass their transform down.
    /// Lights and inert entities never recurse here. Nodes whose keys have
    /// gone stale, or whose mesh has no vertices, are skipped with a debug
    /// log.
    pub fn build(&mut self, scene: &Scene, camera: &Camera, assets: &Assets) {
        self.calls.clear();
        let calls = &mut self.calls;

        for instance in scene.prefab_instances() {
            if !instance.visible {
                continue;
            }
            instance.prefab.root.visit(&instance.transform, &mut |node, world| {
                let (Some(mesh_key), Some(material_key)) = (node.mesh, node.material) else {
                    return;
                };
                let Some(mesh) = assets.mesh(mesh_key) else {
                    log::debug!("skipping node '{}': stale mesh key", node.name);
                    return;
                };
                if mesh.vertex_count == 0 {
                    log::debug!("skipping node '{}': empty mesh", node.name);
                    return;
                }
                let Some(material) = assets.material(material_key) else {
                    log::debug!("skipping node '{}': stale material key", node.name);
                    return;
                };

                let blended = material.is_blended();
                let mut sort_distance = camera.distance_to(world.translation_part());
                if blended {
                    sort_distance += BLEND_DISTANCE_OFFSET;
                }

                calls.push(RenderCall {
                    mesh: mesh_key,
                    material: material_key,
                    model: *world,
                    world_bounds: mesh.bounds.transformed(world),
                    sort_distance,
                    blended,
                });
            });
        }

        log::debug!("render queue built: {} calls", calls.len());
    }

    /// Order the queue for the color pass
    ///
    /// A single ascending sort on the offset distance: every opaque call
    /// precedes every blended call, and distances ascend within each group.
    /// Stability across equal distances is not required.
    pub fn sort(&mut self) {
        self.calls
            .sort_unstable_by(|a, b| a.sort_distance.total_cmp(&b.sort_distance));
    }

    /// The current frame's calls
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Number of calls in the queue
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether the queue holds no calls
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
