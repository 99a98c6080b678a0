//! # 3D Camera System
//!
//! Camera abstraction shared by the main view and per-light shadow views.
//!
//! ## Design Principles
//! - **Library-agnostic**: No graphics API dependencies in camera math
//! - **Immutable operation**: Matrix getters never modify camera state
//! - **On-demand math**: Matrices are recomputed per call rather than cached

use crate::foundation::geometry::{Aabb, Frustum};
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Projection parameters for a [`Camera`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection from a field of view (radians) and aspect ratio
    Perspective {
        /// Vertical field of view in radians
        fov: f32,
        /// Aspect ratio (width / height)
        aspect: f32,
    },
    /// Orthographic projection from half-extents of the view volume
    Orthographic {
        /// Half-width of the view volume
        half_width: f32,
        /// Half-height of the view volume
        half_height: f32,
    },
}

/// Camera for perspective and orthographic rendering
///
/// Represents a viewpoint in world space with position, orientation, and
/// projection parameters. The same type drives the main color pass and the
/// depth-only shadow passes; shadow generation reconfigures a camera from
/// each light's transform every frame it casts.
///
/// # Coordinate System
/// Standard right-handed Y-up world space; view space looks down -Z.
///
/// # Performance Notes
/// Matrix calculations are performed on demand rather than cached. For
/// static cameras, callers may cache `view_projection_matrix()` themselves.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Projection parameters
    pub projection: Projection,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera with standard Y-up orientation
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees (stored as radians)
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    ///
    /// The default target is the origin and the up vector is +Y; both can be
    /// changed afterwards with [`Camera::look_at`].
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Perspective {
                fov: utils::deg_to_rad(fov_degrees),
                aspect,
            },
            near,
            far,
        }
    }

    /// Create a new orthographic camera with standard Y-up orientation
    ///
    /// Used primarily for directional-light shadow views, where the view
    /// volume is a box centered on the light's axis.
    pub fn orthographic(
        position: Vec3,
        half_width: f32,
        half_height: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Orthographic {
                half_width,
                half_height,
            },
            near,
            far,
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Configure camera to look at a specific point with custom up vector
    ///
    /// The up vector does not need to be perpendicular to the view
    /// direction; the view matrix calculation orthonormalizes it.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update the aspect ratio of a perspective camera
    ///
    /// Typically called when the window or viewport is resized. Has no
    /// effect on orthographic cameras, whose extents are explicit.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if let Projection::Perspective { fov, aspect: old } = self.projection {
            if (old - aspect).abs() > 0.01 {
                log::info!("Camera aspect ratio changed: {old:.3} -> {aspect:.3}");
            }
            self.projection = Projection::Perspective { fov, aspect };
        }
    }

    /// Generate the view matrix for world-to-camera transformation
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Generate the projection matrix for this camera
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov, aspect } => {
                Mat4::perspective(fov, aspect, self.near, self.far)
            }
            Projection::Orthographic {
                half_width,
                half_height,
            } => Mat4::orthographic(
                -half_width,
                half_width,
                -half_height,
                half_height,
                self.near,
                self.far,
            ),
        }
    }

    /// Generate the combined view-projection matrix
    ///
    /// For rendering individual objects, multiply this result by the model
    /// matrix: `clip = view_projection * model * vertex`.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Extract the camera's world-space frustum
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.view_projection_matrix())
    }

    /// Check whether a world-space bounding box is inside the view volume
    pub fn sees(&self, bounds: &Aabb) -> bool {
        self.frustum().intersects_aabb(bounds)
    }

    /// Distance from the camera position to a world-space point
    pub fn distance_to(&self, point: Vec3) -> f32 {
        (point - self.position).magnitude()
    }
}

impl Default for Camera {
    /// Default perspective camera positioned above and behind the origin
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 3.0, 3.0), 45.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    #[test]
    fn test_perspective_ctor_converts_degrees() {
        let camera = Camera::perspective(Vec3::zeros(), 90.0, 1.0, 0.1, 10.0);
        match camera.projection {
            Projection::Perspective { fov, .. } => {
                assert_relative_eq!(fov, std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
            }
            Projection::Orthographic { .. } => panic!("expected perspective projection"),
        }
    }

    #[test]
    fn test_view_matrix_centers_target() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 8.0), 60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        let view = camera.view_matrix();
        let target_in_view = view.transform_point(&Point3::origin());
        // Target sits straight ahead on the -Z axis.
        assert_relative_eq!(target_in_view.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(target_in_view.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(target_in_view.z, -8.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sees_culls_behind_camera() {
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 1.0, 0.1, 100.0);
        let in_front = Aabb::unit();
        let behind = Aabb::from_center_extents(Vec3::new(0.0, 0.0, 50.0), Vec3::new(0.5, 0.5, 0.5));
        assert!(camera.sees(&in_front));
        assert!(!camera.sees(&behind));
    }

    #[test]
    fn test_orthographic_volume_is_box_shaped() {
        let mut camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 5.0, 5.0, 0.1, 20.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        // Inside the box both near the axis and off to the side.
        assert!(camera.sees(&Aabb::unit()));
        assert!(camera.sees(&Aabb::from_center_extents(
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.5, 0.5, 0.5),
        )));
        // Outside the half-width.
        assert!(!camera.sees(&Aabb::from_center_extents(
            Vec3::new(8.0, 0.0, 0.0),
            Vec3::new(0.5, 0.5, 0.5),
        )));
    }

    #[test]
    fn test_aspect_ratio_update_only_touches_perspective() {
        let mut ortho = Camera::orthographic(Vec3::zeros(), 2.0, 2.0, 0.1, 10.0);
        ortho.set_aspect_ratio(2.0);
        assert!(matches!(
            ortho.projection,
            Projection::Orthographic { .. }
        ));

        let mut persp = Camera::perspective(Vec3::zeros(), 60.0, 1.0, 0.1, 10.0);
        persp.set_aspect_ratio(2.0);
        match persp.projection {
            Projection::Perspective { aspect, .. } => assert_relative_eq!(aspect, 2.0),
            Projection::Orthographic { .. } => panic!("expected perspective projection"),
        }
    }
}
