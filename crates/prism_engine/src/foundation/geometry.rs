//! Geometric primitives for visibility culling
//!
//! Bounding boxes, planes, and frusta used by the render pipeline to decide
//! which drawables reach the GPU.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new bounding box from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a bounding box centered at a point with given half-size
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Unit cube centered at the origin
    pub fn unit() -> Self {
        Self::from_center_extents(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5))
    }

    /// Get the center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the bounding box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this bounding box contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Transform this bounding box by an affine matrix, returning the
    /// axis-aligned box that encloses the transformed corners.
    ///
    /// Uses the center/extents formulation: the new extents are the absolute
    /// values of the linear part applied to the old extents, which avoids
    /// visiting all eight corners.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point(&Point3::from(self.center()));
        let extents = self.extents();

        let mut new_extents = Vec3::zeros();
        for row in 0..3 {
            new_extents[row] = matrix[(row, 0)].abs() * extents.x
                + matrix[(row, 1)].abs() * extents.y
                + matrix[(row, 2)].abs() * extents.z;
        }

        Self::from_center_extents(center.coords, new_extents)
    }
}

/// Plane defined by normal and distance from origin
///
/// Points with `normal . p + distance >= 0` are on the positive side.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Normal vector (should be normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Build a plane from raw `ax + by + cz + d = 0` coefficients,
    /// normalizing so that plane distances are in world units.
    ///
    /// A degenerate coefficient row yields an accept-all plane rather than
    /// NaN normals, so culling fails open.
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        let normal = Vec3::new(a, b, c);
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            return Self { normal: Vec3::zeros(), distance: 0.0 };
        }
        Self {
            normal: normal / length,
            distance: d / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix using the
    /// Gribb-Hartmann method.
    ///
    /// For a column-vector convention (`clip = m * world`) each plane is a
    /// sum or difference of the fourth row of `m` with one of the others.
    /// The resulting normals point inward.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| {
            [
                vp_matrix[(i, 0)],
                vp_matrix[(i, 1)],
                vp_matrix[(i, 2)],
                vp_matrix[(i, 3)],
            ]
        };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let combine = |r: [f32; 4], sign: f32| {
            Plane::from_coefficients(
                r3[0] + sign * r[0],
                r3[1] + sign * r[1],
                r3[2] + sign * r[2],
                r3[3] + sign * r[3],
            )
        };

        Self {
            planes: [
                combine(r0, 1.0),  // left
                combine(r0, -1.0), // right
                combine(r1, 1.0),  // bottom
                combine(r1, -1.0), // top
                combine(r2, 1.0),  // near
                combine(r2, -1.0), // far
            ],
        }
    }

    /// Check if a point is inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Check if a bounding box is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        // For each plane, pick the box corner farthest along the plane
        // normal; if even that corner is outside, the whole box is outside.
        for plane in &self.planes {
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }
}
