//! Indexed triangle-mesh input.

use std::fmt::{self, Debug};

use nalgebra::{Vector2, Vector3, Vector4};

use crate::error::{RenderError, RenderResult};

/// Vertex attributes as parallel arrays plus a triangle-list index buffer.
///
/// Only positions are mandatory; the other channels may be left empty, in
/// which case vertex shaders see `None` for them. Indices are consumed three
/// at a time, so a trailing partial triangle is ignored.
#[derive(Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub tangents: Vec<Vector4<f32>>,
    pub texcoords: Vec<Vector2<f32>>,
    pub indices: Vec<u32>,
}

impl Mesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Checks that every non-empty attribute channel lines up with the
    /// positions.
    pub(crate) fn validate(&self) -> RenderResult<()> {
        let expected = self.positions.len();

        let channels: [(&'static str, usize); 3] = [
            ("normal", self.normals.len()),
            ("tangent", self.tangents.len()),
            ("texcoord", self.texcoords.len()),
        ];

        for (attribute, len) in channels {
            if len != 0 && len != expected {
                return Err(RenderError::AttributeLengthMismatch {
                    attribute,
                    len,
                    expected,
                });
            }
        }

        Ok(())
    }

    pub(crate) fn vertex_input(&self, index: usize) -> VertexInput<'_> {
        VertexInput {
            index,
            position: &self.positions[index],
            normal: self.normals.get(index),
            tangent: self.tangents.get(index),
            texcoord: self.texcoords.get(index),
        }
    }
}

impl Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Mesh {{ vertices: {}, triangles: {} }}",
            self.vertex_count(),
            self.triangle_count()
        )
    }
}

/// Per-vertex view handed to the vertex stage.
#[derive(Debug, Clone, Copy)]
pub struct VertexInput<'a> {
    /// Index of the vertex in the mesh's attribute arrays.
    pub index: usize,
    pub position: &'a Vector3<f32>,
    pub normal: Option<&'a Vector3<f32>>,
    pub tangent: Option<&'a Vector4<f32>>,
    pub texcoord: Option<&'a Vector2<f32>>,
}
