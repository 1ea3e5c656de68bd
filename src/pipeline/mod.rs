//! The rendering pipeline.
//!
//! A [`Pipeline`] is a strictly staged, single-draw-call processor: one
//! submission runs the vertex stage over every input vertex, clips each
//! triangle against the view frustum, projects the survivors to screen
//! space and hands them to the quad rasterizer. Control flow is sequential
//! per draw; every scratch allocation lives in the pipeline's varying
//! buffer and is rewound, not freed, between primitives.

use log::{debug, trace};
use nalgebra::Matrix4;

use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::{RenderError, RenderResult};
use crate::geometry::{clip, Projection};
use crate::mesh::Mesh;
use crate::shader::{Shader, Uniforms};
use crate::state::RenderState;
use crate::varying::buffer::VaryingBuffer;

pub mod line;
pub mod raster;

/// An explicit pipeline object; create one per render target.
///
/// Holds the fixed-function [`RenderState`] mutated between draws and the
/// varying arenas reused across them.
#[derive(Default)]
pub struct Pipeline {
    state: RenderState,
    varyings: Option<VaryingBuffer>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline {
            state: RenderState::new(),
            varyings: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    /// Submit one indexed triangle-list draw.
    ///
    /// Configuration problems (empty canvas, mismatched mesh channels) fail
    /// the whole draw before anything is written. Degenerate, off-screen and
    /// out-of-range primitives skip themselves without failing the rest of
    /// the submission.
    pub fn draw<S, C, M>(
        &mut self,
        canvas: &mut C,
        camera: &M,
        mesh: &Mesh,
        model: &Matrix4<f32>,
        shader: &S,
    ) -> RenderResult<()>
    where
        S: Shader,
        C: Canvas,
        M: Camera + ?Sized,
    {
        let dimensions = canvas.dimensions();
        if dimensions.area() == 0 {
            return Err(RenderError::EmptyCanvas);
        }
        mesh.validate()?;

        let uniforms = Uniforms::assemble(camera, model);

        let Pipeline { state, varyings } = self;
        let buffer = varyings.get_or_insert_with(|| VaryingBuffer::new(shader.decl().clone()));
        buffer.set_schema(shader.decl());

        run_vertex_stage(buffer, mesh, shader, &uniforms);

        debug!(
            "draw: {:?} through {}-byte varyings onto {}x{}",
            mesh,
            shader.decl().record_size(),
            dimensions.width,
            dimensions.height
        );

        let vertex_count = buffer.vertex_count();
        let mut skipped = 0usize;

        for triangle in mesh.indices.chunks_exact(3) {
            let (i0, i1, i2) = (
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            );

            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                skipped += 1;
                continue;
            }

            buffer.reset_dynamic();

            let handles = [
                buffer.vertex_handle(i0),
                buffer.vertex_handle(i1),
                buffer.vertex_handle(i2),
            ];

            let clipped_triangles = clip::clip_triangle(buffer, handles);
            if clipped_triangles.is_empty() {
                trace!("triangle ({i0} {i1} {i2}): outside the frustum");
                continue;
            }
            trace!(
                "triangle ({i0} {i1} {i2}): {} after clipping",
                clipped_triangles.len()
            );

            for clipped in clipped_triangles {
                let projected = [
                    Projection::project(&buffer.get(clipped[0]).position(), dimensions, camera),
                    Projection::project(&buffer.get(clipped[1]).position(), dimensions, camera),
                    Projection::project(&buffer.get(clipped[2]).position(), dimensions, camera),
                ];

                trace!(
                    "rasterizing ({}, {}) ({}, {}) ({}, {})",
                    projected[0].x,
                    projected[0].y,
                    projected[1].x,
                    projected[1].y,
                    projected[2].x,
                    projected[2].y
                );

                raster::rasterize_triangle(
                    canvas, state, shader, &uniforms, buffer, clipped, projected,
                );
            }
        }

        if skipped > 0 {
            debug!("draw: skipped {skipped} triangles with out-of-range indices");
        }

        Ok(())
    }

    /// Draw the mesh's triangle edges as flat-colored lines.
    ///
    /// Runs the same vertex stage as [`draw`](Self::draw), clips each edge
    /// with the line clipper, and walks the survivors with Bresenham
    /// traversal. No depth testing; wireframes draw over everything.
    pub fn draw_wireframe<S, C, M>(
        &mut self,
        canvas: &mut C,
        camera: &M,
        mesh: &Mesh,
        model: &Matrix4<f32>,
        shader: &S,
        color: Color,
    ) -> RenderResult<()>
    where
        S: Shader,
        C: Canvas,
        M: Camera + ?Sized,
    {
        let dimensions = canvas.dimensions();
        if dimensions.area() == 0 {
            return Err(RenderError::EmptyCanvas);
        }
        mesh.validate()?;

        let uniforms = Uniforms::assemble(camera, model);

        let Pipeline { varyings, .. } = self;
        let buffer = varyings.get_or_insert_with(|| VaryingBuffer::new(shader.decl().clone()));
        buffer.set_schema(shader.decl());

        run_vertex_stage(buffer, mesh, shader, &uniforms);

        let vertex_count = buffer.vertex_count();

        for triangle in mesh.indices.chunks_exact(3) {
            let (i0, i1, i2) = (
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            );

            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            buffer.reset_dynamic();

            let v0 = buffer.vertex_handle(i0);
            let v1 = buffer.vertex_handle(i1);
            let v2 = buffer.vertex_handle(i2);

            for (a, b) in [(v0, v1), (v0, v2), (v1, v2)] {
                let Some([start, end]) = clip::clip_line(buffer, a, b) else {
                    continue;
                };

                let p0 = Projection::project(&buffer.get(start).position(), dimensions, camera);
                let p1 = Projection::project(&buffer.get(end).position(), dimensions, camera);

                trace!("edge ({}, {}) to ({}, {})", p0.x, p0.y, p1.x, p1.y);

                line::bresenham(p0.x, p0.y, p1.x, p1.y, |x, y| {
                    if x >= 0 && y >= 0 && dimensions.in_bounds(x as u32, y as u32) {
                        canvas.set_pixel(x as u32, y as u32, color);
                    }
                });
            }
        }

        Ok(())
    }

    /// Plot every vertex inside the frustum as a single flat-colored pixel.
    pub fn draw_points<S, C, M>(
        &mut self,
        canvas: &mut C,
        camera: &M,
        mesh: &Mesh,
        model: &Matrix4<f32>,
        shader: &S,
        color: Color,
    ) -> RenderResult<()>
    where
        S: Shader,
        C: Canvas,
        M: Camera + ?Sized,
    {
        let dimensions = canvas.dimensions();
        if dimensions.area() == 0 {
            return Err(RenderError::EmptyCanvas);
        }
        mesh.validate()?;

        let uniforms = Uniforms::assemble(camera, model);

        let Pipeline { varyings, .. } = self;
        let buffer = varyings.get_or_insert_with(|| VaryingBuffer::new(shader.decl().clone()));
        buffer.set_schema(shader.decl());

        run_vertex_stage(buffer, mesh, shader, &uniforms);

        let mut plotted = 0usize;

        for index in 0..buffer.vertex_count() {
            let vertex = buffer.vertex(index);
            if vertex.clip_code() != 0 {
                continue;
            }

            let p = Projection::project(&vertex.position(), dimensions, camera);
            if p.x >= 0 && p.y >= 0 && dimensions.in_bounds(p.x as u32, p.y as u32) {
                canvas.set_pixel(p.x as u32, p.y as u32, color);
                plotted += 1;
            }
        }

        trace!("plotted {plotted} of {} vertices", buffer.vertex_count());

        Ok(())
    }
}

/// Invoke the shader's vertex entry for every input vertex and stamp each
/// output record with its frustum clip code.
fn run_vertex_stage<S>(buffer: &mut VaryingBuffer, mesh: &Mesh, shader: &S, uniforms: &Uniforms)
where
    S: Shader,
{
    buffer.init_vertices(mesh.vertex_count());

    let mut outside = 0usize;

    for index in 0..mesh.vertex_count() {
        let input = mesh.vertex_input(index);
        let mut output = buffer.vertex_mut(index);

        shader.vertex(&input, uniforms, &mut output);

        let code = clip::clip_code(&output.position());
        output.set_clip_code(code);

        if code != 0 {
            outside += 1;
        }
    }

    trace!(
        "vertex stage: {} vertices shaded, {outside} outside the frustum",
        mesh.vertex_count()
    );
}
