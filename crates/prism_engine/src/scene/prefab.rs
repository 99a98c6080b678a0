//! Prefab node trees
//!
//! A prefab is an immutable tree of nodes with local transforms. Scene
//! entities instance prefabs by reference; the render pipeline flattens the
//! tree into world-space drawables every frame.

use crate::foundation::math::Mat4;
use crate::render::resources::{MaterialKey, MeshKey};

/// One node in a prefab tree
///
/// A node carries a local transform relative to its parent and optionally a
/// mesh and material. Nodes with neither are pure grouping nodes: they
/// contribute their transform to descendants but never produce a drawable.
#[derive(Debug, Clone)]
pub struct Node {
    /// Name for debugging
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Mat4,
    /// Mesh drawn at this node, if any
    pub mesh: Option<MeshKey>,
    /// Material shading the mesh, if any
    pub material: Option<MaterialKey>,
    /// Child nodes, visited regardless of whether this node draws
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty grouping node with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::identity(),
            mesh: None,
            material: None,
            children: Vec::new(),
        }
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Attach a mesh
    pub fn with_mesh(mut self, mesh: MeshKey) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Attach a material
    pub fn with_material(mut self, material: MaterialKey) -> Self {
        self.material = Some(material);
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this node produces a drawable
    ///
    /// Requires both a mesh and a material; a node carrying only one of the
    /// two is treated as a grouping node.
    pub fn is_drawable(&self) -> bool {
        self.mesh.is_some() && self.material.is_some()
    }

    /// Depth-first visit of this node and all descendants
    ///
    /// The visitor receives each node together with its accumulated world
    /// transform (`parent * local`). Children are visited after their
    /// parent, in declaration order.
    pub fn visit(&self, parent_transform: &Mat4, visitor: &mut impl FnMut(&Node, &Mat4)) {
        let world = parent_transform * self.transform;
        visitor(self, &world);
        for child in &self.children {
            child.visit(&world, visitor);
        }
    }

    /// Number of nodes in this subtree, including this node
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }
}

/// An immutable node tree shared across scene entities
///
/// Prefabs are constructed once (by the asset pipeline, outside this crate)
/// and shared by reference; they are never mutated during rendering.
#[derive(Debug, Clone)]
pub struct Prefab {
    /// Name for debugging
    pub name: String,
    /// Root of the node tree
    pub root: Node,
}

impl Prefab {
    /// Create a prefab from a root node
    pub fn new(name: impl Into<String>, root: Node) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.root.subtree_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use approx::assert_relative_eq;
    use slotmap::KeyData;

    fn dummy_mesh() -> MeshKey {
        MeshKey::from(KeyData::from_ffi(1))
    }

    fn dummy_material() -> MaterialKey {
        MaterialKey::from(KeyData::from_ffi(1))
    }

    #[test]
    fn test_drawable_requires_mesh_and_material() {
        let empty = Node::new("group");
        let mesh_only = Node::new("mesh").with_mesh(dummy_mesh());
        let complete = Node::new("drawn")
            .with_mesh(dummy_mesh())
            .with_material(dummy_material());
        assert!(!empty.is_drawable());
        assert!(!mesh_only.is_drawable());
        assert!(complete.is_drawable());
    }

    #[test]
    fn test_visit_accumulates_parent_transforms() {
        let child = Node::new("child")
            .with_transform(Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0)));
        let root = Node::new("root")
            .with_transform(Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)))
            .with_child(child);

        let mut worlds = Vec::new();
        root.visit(&Mat4::identity(), &mut |node, world| {
            worlds.push((node.name.clone(), world.translation_part()));
        });

        assert_eq!(worlds.len(), 2);
        assert_eq!(worlds[0].0, "root");
        assert_relative_eq!(worlds[0].1, Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(worlds[1].1, Vec3::new(5.0, 2.0, 0.0));
    }

    #[test]
    fn test_visit_reaches_children_of_grouping_nodes() {
        let drawn = Node::new("drawn")
            .with_mesh(dummy_mesh())
            .with_material(dummy_material());
        let group = Node::new("group").with_child(drawn);
        let prefab = Prefab::new("rig", group);

        let mut drawables = 0;
        prefab.root.visit(&Mat4::identity(), &mut |node, _| {
            if node.is_drawable() {
                drawables += 1;
            }
        });
        assert_eq!(prefab.node_count(), 2);
        assert_eq!(drawables, 1);
    }
}
