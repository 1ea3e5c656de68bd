//! Homogeneous-space clipping against the six view-frustum planes.
//!
//! Clipping happens before the perspective divide, so attribute
//! interpolation along a cut edge is a plain linear blend.

use std::mem;

use nalgebra::coordinates::XYZW;
use nalgebra::Vector4;
use smallvec::SmallVec;

use crate::varying::buffer::{VaryingBuffer, VaryingHandle};

/// One clipping plane of the view frustum, in clip space.
///
/// The depth planes follow the GL convention where visible NDC z spans
/// `[-1, 1]`, so the near half-space is `z >= -w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipPlane {
    Left,
    Right,
    Bottom,
    Top,
    Near,
    Far,
}

/// All clipping planes in a constant array. Useful for iterating over all of them.
pub const ALL_CLIP_PLANES: [ClipPlane; 6] = [
    ClipPlane::Left,
    ClipPlane::Right,
    ClipPlane::Bottom,
    ClipPlane::Top,
    ClipPlane::Near,
    ClipPlane::Far,
];

impl ClipPlane {
    /// The bit this plane occupies in a vertex clip code.
    #[inline]
    pub fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Signed distance from the plane in homogeneous coordinates.
    /// Non-negative means the point is inside the plane's half-space.
    #[inline]
    pub fn signed_distance(self, position: &Vector4<f32>) -> f32 {
        let XYZW { x, y, z, w } = **position;

        match self {
            ClipPlane::Left => w + x,
            ClipPlane::Right => w - x,
            ClipPlane::Bottom => w + y,
            ClipPlane::Top => w - y,
            ClipPlane::Near => w + z,
            ClipPlane::Far => w - z,
        }
    }
}

/// Bitmask of the frustum half-spaces a clip-space position violates.
/// Zero means the position is inside the frustum.
pub fn clip_code(position: &Vector4<f32>) -> u32 {
    let mut code = 0;

    for plane in ALL_CLIP_PLANES {
        if plane.signed_distance(position) < 0.0 {
            code |= plane.bit();
        }
    }

    code
}

/// Triangles fanned out of one clipped polygon.
pub type ClippedTriangles = SmallVec<[[VaryingHandle; 3]; 7]>;

/// Clip a triangle of varying records against the view frustum.
///
/// Runs Sutherland-Hodgman over the six planes and fan-triangulates the
/// surviving convex polygon. Vertices cut into existence are allocated from
/// the dynamic arena of `buffer`, with their clip codes recomputed, so every
/// vertex of the result lies inside the frustum.
pub fn clip_triangle(buffer: &mut VaryingBuffer, triangle: [VaryingHandle; 3]) -> ClippedTriangles {
    let codes = [
        buffer.get(triangle[0]).clip_code(),
        buffer.get(triangle[1]).clip_code(),
        buffer.get(triangle[2]).clip_code(),
    ];

    // Entirely inside, the common case for reasonable scenes.
    if codes[0] | codes[1] | codes[2] == 0 {
        return ClippedTriangles::from_slice(&[triangle]);
    }

    // All three vertices violate a common plane.
    if codes[0] & codes[1] & codes[2] != 0 {
        return ClippedTriangles::new();
    }

    let mut polygon: SmallVec<[VaryingHandle; 9]> = SmallVec::from_slice(&triangle);
    let mut clipped: SmallVec<[VaryingHandle; 9]> = SmallVec::new();

    for plane in ALL_CLIP_PLANES {
        if polygon.len() < 3 {
            break;
        }

        clipped.clear();

        for i in 0..polygon.len() {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];

            let da = plane.signed_distance(&buffer.get(a).position());
            let db = plane.signed_distance(&buffer.get(b).position());

            if da >= 0.0 {
                clipped.push(a);
            }

            if (da >= 0.0) != (db >= 0.0) {
                clipped.push(buffer.lerp_dynamic(a, b, da / (da - db)));
            }
        }

        mem::swap(&mut polygon, &mut clipped);
    }

    if polygon.len() < 3 {
        return ClippedTriangles::new();
    }

    (1..polygon.len() - 1)
        .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
        .collect()
}

/// Clip a line segment of varying records against the view frustum.
///
/// Parametric counterpart of [`clip_triangle`] used by wireframe rendering.
/// Returns the surviving segment, or `None` if no part of it is visible.
pub fn clip_line(
    buffer: &mut VaryingBuffer,
    v0: VaryingHandle,
    v1: VaryingHandle,
) -> Option<[VaryingHandle; 2]> {
    let c0 = buffer.get(v0).clip_code();
    let c1 = buffer.get(v1).clip_code();

    if c0 | c1 == 0 {
        return Some([v0, v1]);
    }

    if c0 & c1 != 0 {
        return None;
    }

    let p0 = buffer.get(v0).position();
    let p1 = buffer.get(v1).position();

    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    for plane in ALL_CLIP_PLANES {
        let da = plane.signed_distance(&p0);
        let db = plane.signed_distance(&p1);

        if da < 0.0 && db < 0.0 {
            return None;
        } else if da < 0.0 {
            t0 = t0.max(da / (da - db));
        } else if db < 0.0 {
            t1 = t1.min(da / (da - db));
        }
    }

    if t0 > t1 {
        return None;
    }

    let start = if t0 > 0.0 {
        buffer.lerp_dynamic(v0, v1, t0)
    } else {
        v0
    };

    let end = if t1 < 1.0 {
        buffer.lerp_dynamic(v0, v1, t1)
    } else {
        v1
    };

    Some([start, end])
}
