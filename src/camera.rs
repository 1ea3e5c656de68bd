//! View and projection sources.

use nalgebra::{Isometry3, Matrix4, Orthographic3, Perspective3, Point3, Vector3};

/// The pipeline's view of a camera.
///
/// `linearize` maps a post-projection NDC depth (GL convention, `[-1, 1]`)
/// to the camera-linear `[0, 1]` range the depth buffer stores and tests.
pub trait Camera {
    fn view_matrix(&self) -> &Matrix4<f32>;
    fn projection_matrix(&self) -> &Matrix4<f32>;

    /// World-space camera position, exposed to shaders.
    fn position(&self) -> Vector3<f32>;

    /// Map an NDC depth to a camera-linear value in `[0, 1]` between the
    /// near and far planes.
    fn linearize(&self, ndc_z: f32) -> f32;
}

/// Right-handed perspective camera with a GL-style projection, looking down
/// the negative z axis until aimed with [`look_at`](Self::look_at).
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    position: Vector3<f32>,
    near: f32,
    far: f32,
}

impl PerspectiveCamera {
    /// `fovy` is the vertical field of view in radians.
    pub fn new(fovy: f32, aspect: f32, near: f32, far: f32) -> PerspectiveCamera {
        PerspectiveCamera {
            view: Matrix4::identity(),
            projection: Perspective3::new(aspect, fovy, near, far).to_homogeneous(),
            position: Vector3::zeros(),
            near,
            far,
        }
    }

    /// Aim the camera at a target from the given eye position.
    pub fn look_at(&mut self, eye: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) {
        self.view = Isometry3::look_at_rh(&eye, &target, &up).to_homogeneous();
        self.position = eye.coords;
    }
}

impl Camera for PerspectiveCamera {
    #[inline]
    fn view_matrix(&self) -> &Matrix4<f32> {
        &self.view
    }

    #[inline]
    fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    #[inline]
    fn position(&self) -> Vector3<f32> {
        self.position
    }

    fn linearize(&self, ndc_z: f32) -> f32 {
        let (near, far) = (self.near, self.far);

        // Invert the projection to recover the eye-space distance, then
        // rescale it between the planes.
        let eye_depth = 2.0 * far * near / (far + near - ndc_z * (far - near));

        ((eye_depth - near) / (far - near)).clamp(0.0, 1.0)
    }
}

/// Right-handed orthographic camera. NDC depth is already linear here, so
/// linearization is a plain rescale.
#[derive(Debug, Clone)]
pub struct OrthographicCamera {
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    position: Vector3<f32>,
}

impl OrthographicCamera {
    pub fn new(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> OrthographicCamera {
        OrthographicCamera {
            view: Matrix4::identity(),
            projection: Orthographic3::new(left, right, bottom, top, near, far).to_homogeneous(),
            position: Vector3::zeros(),
        }
    }

    pub fn look_at(&mut self, eye: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) {
        self.view = Isometry3::look_at_rh(&eye, &target, &up).to_homogeneous();
        self.position = eye.coords;
    }
}

impl Camera for OrthographicCamera {
    #[inline]
    fn view_matrix(&self) -> &Matrix4<f32> {
        &self.view
    }

    #[inline]
    fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    #[inline]
    fn position(&self) -> Vector3<f32> {
        self.position
    }

    #[inline]
    fn linearize(&self, ndc_z: f32) -> f32 {
        (ndc_z * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}
