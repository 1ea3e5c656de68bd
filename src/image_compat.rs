//! Useful compatibility with the `image` crate.

use crate::canvas::{HasDimensions, RenderBuffer};

/// Additional functionality for copying a render buffer into an image.
pub trait ImageRenderBuffer {
    /// Copies the packed ARGB color attachment into an `Rgba<u8>` image.
    ///
    /// Channels were already clamped when the canvas packed them, so HDR
    /// tonemapping has to happen in the pixel shader.
    fn copy_to_image(&self) -> Option<image::RgbaImage>;
}

impl ImageRenderBuffer for RenderBuffer {
    fn copy_to_image(&self) -> Option<image::RgbaImage> {
        let color_buffer = self.color_buffer();

        let mut res = Vec::with_capacity(color_buffer.len() * 4);

        for argb in color_buffer {
            let [a, r, g, b] = argb.to_be_bytes();
            res.extend_from_slice(&[r, g, b, a]);
        }

        let dimensions = self.dimensions();

        image::RgbaImage::from_raw(dimensions.width, dimensions.height, res)
    }
}
