//! Clip-space to screen-space conversion.

use nalgebra::coordinates::XYZW;
use nalgebra::Vector4;

use crate::camera::Camera;
use crate::canvas::Dimensions;

/// A screen-space vertex produced from a clip-space position.
///
/// Positions are snapped to integer pixel coordinates so the rasterizer can
/// walk edge functions in pure integer arithmetic. `inv_w` is kept for
/// perspective-correct interpolation of everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Pixel column, with 0 at the left edge of the framebuffer.
    pub x: i32,
    /// Pixel row, with 0 at the top edge of the framebuffer.
    pub y: i32,
    /// `1 / w_clip` of the source vertex.
    pub inv_w: f32,
    /// Camera-linear depth in `[0, 1]`.
    pub depth: f32,
}

impl Projection {
    /// Project a clip-space position onto a canvas of the given dimensions.
    ///
    /// The framebuffer origin is the top-left corner, so NDC y is flipped:
    ///
    /// ```text
    /// 0,0-----------------x
    ///  |                  |
    ///  |                  |
    ///  y-----------------x,y
    /// ```
    pub fn project<C>(position: &Vector4<f32>, dimensions: Dimensions, camera: &C) -> Projection
    where
        C: Camera + ?Sized,
    {
        let XYZW { x, y, z, w } = **position;

        let inv_w = 1.0 / w;

        Projection {
            x: ((x * inv_w * 0.5 + 0.5) * dimensions.width as f32).round() as i32,
            y: ((1.0 - (y * inv_w * 0.5 + 0.5)) * dimensions.height as f32).round() as i32,
            inv_w,
            depth: camera.linearize(z * inv_w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::tests::NdcCamera;

    #[test]
    fn ndc_corners_map_to_canvas_corners() {
        let dimensions = Dimensions::new(8, 4);
        let camera = NdcCamera::new();

        let p = Projection::project(&Vector4::new(-1.0, 1.0, 0.0, 1.0), dimensions, &camera);
        assert_eq!((p.x, p.y), (0, 0));

        let p = Projection::project(&Vector4::new(1.0, -1.0, 0.0, 1.0), dimensions, &camera);
        assert_eq!((p.x, p.y), (8, 4));
    }

    #[test]
    fn perspective_divide_applies_before_viewport() {
        let dimensions = Dimensions::new(10, 10);
        let camera = NdcCamera::new();

        // (1, -1) NDC after dividing by w = 2.
        let p = Projection::project(&Vector4::new(2.0, -2.0, 0.0, 2.0), dimensions, &camera);
        assert_eq!((p.x, p.y), (10, 10));
        assert_eq!(p.inv_w, 0.5);
    }

    #[test]
    fn depth_is_linearized_ndc_z() {
        let dimensions = Dimensions::new(4, 4);
        let camera = NdcCamera::new();

        let p = Projection::project(&Vector4::new(0.0, 0.0, 0.5, 1.0), dimensions, &camera);
        assert_eq!(p.depth, 0.75);
    }
}
