//! The programmable shader contract.

use nalgebra::{Matrix4, Vector3};

use crate::camera::Camera;
use crate::color::Color;
use crate::mesh::VertexInput;
use crate::varying::buffer::{PixelQuad, VaryingMut};
use crate::varying::VaryingDecl;

/// Uniform matrices and camera data, assembled by the pipeline before each
/// draw from the bound camera and the submitted model transform.
#[derive(Debug, Clone)]
pub struct Uniforms {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub view_projection: Matrix4<f32>,
    pub model: Matrix4<f32>,
    pub model_inverse: Matrix4<f32>,
    pub model_view: Matrix4<f32>,
    pub mvp: Matrix4<f32>,
    /// World-space camera position.
    pub camera_position: Vector3<f32>,
}

impl Uniforms {
    pub(crate) fn assemble<C>(camera: &C, model: &Matrix4<f32>) -> Uniforms
    where
        C: Camera + ?Sized,
    {
        let view = *camera.view_matrix();
        let projection = *camera.projection_matrix();
        let view_projection = projection * view;
        let model_view = view * model;

        Uniforms {
            view,
            projection,
            view_projection,
            model: *model,
            model_inverse: model.try_inverse().unwrap_or_else(Matrix4::identity),
            model_view,
            mvp: view_projection * model,
            camera_position: camera.position(),
        }
    }
}

/// A shader program bound for one draw submission.
///
/// A shader supplies three things: the varying record layout it fills, a
/// vertex entry run once per input vertex, and a pixel entry run once per
/// covered lane of a 2x2 quad. The pixel entry receives the whole quad, so
/// screen-space derivatives of any varying are one subtraction away (see
/// [`PixelQuad::ddx_vec2`] and friends) for texture LOD selection.
///
/// Draw calls are generic over the shader type, so both entry points
/// dispatch statically.
pub trait Shader {
    /// The varying record layout this shader writes and reads.
    fn decl(&self) -> &VaryingDecl;

    /// Vertex entry point. Must write the clip-space position via
    /// [`VaryingMut::set_position`]; everything else in the record is up to
    /// the shader.
    fn vertex(&self, input: &VertexInput<'_>, uniforms: &Uniforms, output: &mut VaryingMut<'_>);

    /// Pixel entry point for one covered lane of `quad`.
    fn pixel(&self, quad: &PixelQuad<'_>, lane: usize, uniforms: &Uniforms) -> Color;
}

/// An opaque texture sampler.
///
/// The pipeline knows nothing about images, filtering or mip chains; a
/// shader holds whatever sampler it needs and the only contract is that
/// sampling at `(u, v)` with a level-of-detail yields a color.
pub trait Sampler {
    fn sample(&self, u: f32, v: f32, lod: f32) -> Color;
}
