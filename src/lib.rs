//! A CPU triangle rasterization pipeline.
//!
//! `softraster` reproduces the shape of a modern hardware pipeline in
//! software: programmable vertex and pixel stages, homogeneous-space
//! frustum clipping, perspective-correct interpolation, and pixel shading
//! dispatched in 2x2 quads so screen-space derivatives are available for
//! texture level-of-detail.
//!
//! The crate deliberately ends at the [`canvas::Canvas`], [`camera::Camera`]
//! and [`shader::Sampler`] traits; windowing, image decoding and texture
//! filtering live outside.

pub mod camera;
pub mod canvas;
pub mod color;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod pipeline;
pub mod shader;
pub mod state;
pub mod varying;

#[cfg(feature = "image_compat")]
pub mod image_compat;

pub use self::camera::Camera;
pub use self::canvas::Canvas;
pub use self::color::Color;
pub use self::error::{RenderError, RenderResult};
pub use self::mesh::Mesh;
pub use self::pipeline::Pipeline;
pub use self::shader::Shader;
pub use self::state::RenderState;
