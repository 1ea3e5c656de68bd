//! Typed scratch storage for interpolated attributes.
//!
//! The buffer owns three arenas sliced into fixed-size records described by
//! the bound [`VaryingDecl`]:
//!
//! - **vertex**: one record per input vertex, written by the vertex stage.
//! - **dynamic**: records cut into existence by the clipper, rewound per
//!   primitive.
//! - **pixel**: the four lanes of the 2x2 quad currently being shaded,
//!   rewound per quad.
//!
//! Records are exposed through [`VaryingRef`] / [`VaryingMut`] views with
//! typed accessors; raw storage never crosses a stage boundary. Each record
//! carries one hidden trailing word holding the vertex clip code.

use nalgebra::{Vector2, Vector3, Vector4};
use smallvec::SmallVec;

use crate::geometry::clip;
use crate::varying::VaryingDecl;

/// Which arena a varying record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arena {
    Vertex,
    Dynamic,
    Pixel,
}

/// Handle to one varying record inside a [`VaryingBuffer`].
///
/// Handles into the dynamic and pixel arenas are invalidated by the matching
/// reset call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaryingHandle {
    arena: Arena,
    index: u32,
}

/// Upper bound on clipper-generated records per primitive. Clipping a
/// triangle against six planes can grow it to at most nine vertices, each
/// cut allocating one record per crossed edge.
const MAX_DYNAMIC_RECORDS: usize = 16;

/// Lanes of one 2x2 pixel quad.
pub(crate) const PIXEL_LANES: usize = 4;

// Inline capacity for one record during aliased arena copies.
type RecordScratch = SmallVec<[f32; 32]>;

pub struct VaryingBuffer {
    decl: VaryingDecl,
    /// Words per record, including the trailing clip-code word.
    stride: usize,
    vertex: Vec<f32>,
    dynamic: Vec<f32>,
    pixel: Vec<f32>,
    vertex_len: usize,
    dynamic_len: usize,
    pixel_len: usize,
}

impl VaryingBuffer {
    pub fn new(decl: VaryingDecl) -> VaryingBuffer {
        let stride = decl.record_words() + 1;

        VaryingBuffer {
            decl,
            stride,
            vertex: Vec::new(),
            dynamic: vec![0.0; MAX_DYNAMIC_RECORDS * stride],
            pixel: vec![0.0; PIXEL_LANES * stride],
            vertex_len: 0,
            dynamic_len: 0,
            pixel_len: 0,
        }
    }

    #[inline]
    pub fn decl(&self) -> &VaryingDecl {
        &self.decl
    }

    /// Bind a (possibly new) record layout. Arenas are resized only when the
    /// layout actually changes, so rebinding the same shader between draws is
    /// free.
    pub fn set_schema(&mut self, decl: &VaryingDecl) {
        if self.decl != *decl {
            *self = VaryingBuffer::new(decl.clone());
        } else {
            self.dynamic_len = 0;
            self.pixel_len = 0;
        }
    }

    /// Reserve (and zero) records for `count` vertex-stage outputs.
    pub fn init_vertices(&mut self, count: usize) {
        self.vertex.clear();
        self.vertex.resize(count * self.stride, 0.0);
        self.vertex_len = count;
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_len
    }

    #[inline]
    pub fn vertex_handle(&self, index: usize) -> VaryingHandle {
        debug_assert!(index < self.vertex_len);

        VaryingHandle {
            arena: Arena::Vertex,
            index: index as u32,
        }
    }

    #[inline]
    pub fn vertex(&self, index: usize) -> VaryingRef<'_> {
        self.get(self.vertex_handle(index))
    }

    #[inline]
    pub fn vertex_mut(&mut self, index: usize) -> VaryingMut<'_> {
        self.get_mut(self.vertex_handle(index))
    }

    #[inline]
    pub fn dynamic(&self, index: usize) -> VaryingRef<'_> {
        debug_assert!(index < self.dynamic_len);

        self.get(VaryingHandle {
            arena: Arena::Dynamic,
            index: index as u32,
        })
    }

    #[inline]
    pub fn pixel(&self, lane: usize) -> VaryingRef<'_> {
        debug_assert!(lane < self.pixel_len);

        self.get(VaryingHandle {
            arena: Arena::Pixel,
            index: lane as u32,
        })
    }

    /// Rewind the clipper arena. Existing dynamic handles become invalid.
    #[inline]
    pub fn reset_dynamic(&mut self) {
        self.dynamic_len = 0;
    }

    /// Rewind the quad arena. Existing pixel handles become invalid.
    #[inline]
    pub fn reset_pixel(&mut self) {
        self.pixel_len = 0;
    }

    /// Allocate a zeroed record from the clipper arena.
    pub fn alloc_dynamic(&mut self) -> VaryingHandle {
        debug_assert!(
            self.dynamic_len < MAX_DYNAMIC_RECORDS,
            "clipper arena exhausted"
        );

        let handle = VaryingHandle {
            arena: Arena::Dynamic,
            index: self.dynamic_len as u32,
        };
        self.dynamic_len += 1;

        let start = handle.index as usize * self.stride;
        self.dynamic[start..start + self.stride].fill(0.0);

        handle
    }

    /// Allocate the next lane record of the current quad.
    pub fn alloc_pixel(&mut self) -> VaryingHandle {
        debug_assert!(self.pixel_len < PIXEL_LANES, "quad arena exhausted");

        let handle = VaryingHandle {
            arena: Arena::Pixel,
            index: self.pixel_len as u32,
        };
        self.pixel_len += 1;

        handle
    }

    pub fn get(&self, handle: VaryingHandle) -> VaryingRef<'_> {
        VaryingRef {
            words: self.record(handle),
            record_words: self.decl.record_words(),
        }
    }

    pub fn get_mut(&mut self, handle: VaryingHandle) -> VaryingMut<'_> {
        let record_words = self.decl.record_words();

        VaryingMut {
            words: self.record_mut(handle),
            record_words,
        }
    }

    /// Allocate a dynamic record holding the linear blend `a + t * (b - a)`
    /// of two records, as used by the clipper. The new record's clip code is
    /// recomputed from its blended position.
    pub(crate) fn lerp_dynamic(
        &mut self,
        a: VaryingHandle,
        b: VaryingHandle,
        t: f32,
    ) -> VaryingHandle {
        let words = self.decl.record_words();

        let mut blended: RecordScratch = SmallVec::with_capacity(words);
        {
            let ra = self.record(a);
            let rb = self.record(b);

            for k in 0..words {
                blended.push(ra[k] + t * (rb[k] - ra[k]));
            }
        }

        let code = clip::clip_code(&Vector4::from_column_slice(&blended[..4]));

        let handle = self.alloc_dynamic();
        let mut record = self.get_mut(handle);
        record.words[..words].copy_from_slice(&blended);
        record.set_clip_code(code);

        handle
    }

    /// Write the perspective-correct interpolation of a triangle's records
    /// into a pixel lane.
    ///
    /// `wy` and `wz` are the normalized barycentric weights of vertices 1
    /// and 2; vertex 0 takes the remainder. The delta form keeps attributes
    /// that agree at all three corners bit-exact at every pixel.
    pub(crate) fn interpolate_pixel(
        &mut self,
        lane: usize,
        triangle: [VaryingHandle; 3],
        wy: f32,
        wz: f32,
    ) {
        debug_assert!(lane < self.pixel_len);

        let words = self.decl.record_words();
        let stride = self.stride;

        let VaryingBuffer {
            vertex,
            dynamic,
            pixel,
            ..
        } = self;

        fn fetch<'a>(
            vertex: &'a [f32],
            dynamic: &'a [f32],
            stride: usize,
            words: usize,
            handle: VaryingHandle,
        ) -> &'a [f32] {
            let start = handle.index as usize * stride;

            match handle.arena {
                Arena::Vertex => &vertex[start..start + words],
                Arena::Dynamic => &dynamic[start..start + words],
                Arena::Pixel => unreachable!("pixel records are not interpolation sources"),
            }
        }

        let r0 = fetch(vertex, dynamic, stride, words, triangle[0]);
        let r1 = fetch(vertex, dynamic, stride, words, triangle[1]);
        let r2 = fetch(vertex, dynamic, stride, words, triangle[2]);

        let start = lane * stride;
        let out = &mut pixel[start..start + stride];

        for k in 0..words {
            let base = r0[k];
            out[k] = base + wy * (r1[k] - base) + wz * (r2[k] - base);
        }

        // Clip codes are meaningless past the clipper.
        out[words] = 0.0;
    }

    /// Bundle the four pixel-lane records into a quad view for the pixel
    /// stage.
    pub(crate) fn pixel_quad(&self, x: i32, y: i32, mask: u8, depth: [f32; 4]) -> PixelQuad<'_> {
        debug_assert_eq!(self.pixel_len, PIXEL_LANES);

        let lanes = [0u32, 1, 2, 3].map(|index| {
            self.get(VaryingHandle {
                arena: Arena::Pixel,
                index,
            })
        });

        PixelQuad {
            lanes,
            x,
            y,
            mask,
            depth,
        }
    }

    fn record(&self, handle: VaryingHandle) -> &[f32] {
        let start = handle.index as usize * self.stride;

        let arena = match handle.arena {
            Arena::Vertex => &self.vertex,
            Arena::Dynamic => &self.dynamic,
            Arena::Pixel => &self.pixel,
        };

        &arena[start..start + self.stride]
    }

    fn record_mut(&mut self, handle: VaryingHandle) -> &mut [f32] {
        let start = handle.index as usize * self.stride;

        let arena = match handle.arena {
            Arena::Vertex => &mut self.vertex,
            Arena::Dynamic => &mut self.dynamic,
            Arena::Pixel => &mut self.pixel,
        };

        &mut arena[start..start + self.stride]
    }
}

/// Read-only typed view of one varying record.
///
/// Offsets are byte offsets from the record's declaration; the clip-space
/// position always lives at offset 0.
#[derive(Clone, Copy)]
pub struct VaryingRef<'a> {
    words: &'a [f32],
    record_words: usize,
}

impl VaryingRef<'_> {
    #[inline]
    pub fn position(&self) -> Vector4<f32> {
        self.get_vec4(0)
    }

    #[inline]
    pub fn clip_code(&self) -> u32 {
        self.words[self.record_words].to_bits()
    }

    #[inline]
    pub fn get_f32(&self, offset: u32) -> f32 {
        self.slot(offset, 1)[0]
    }

    #[inline]
    pub fn get_vec2(&self, offset: u32) -> Vector2<f32> {
        Vector2::from_column_slice(self.slot(offset, 2))
    }

    #[inline]
    pub fn get_vec3(&self, offset: u32) -> Vector3<f32> {
        Vector3::from_column_slice(self.slot(offset, 3))
    }

    #[inline]
    pub fn get_vec4(&self, offset: u32) -> Vector4<f32> {
        Vector4::from_column_slice(self.slot(offset, 4))
    }

    #[inline]
    fn slot(&self, offset: u32, len: usize) -> &[f32] {
        debug_assert_eq!(offset % 4, 0, "varying offsets are 4-byte aligned");

        let word = offset as usize / 4;
        debug_assert!(word + len <= self.record_words);

        &self.words[word..word + len]
    }
}

/// Mutable typed view of one varying record.
pub struct VaryingMut<'a> {
    words: &'a mut [f32],
    record_words: usize,
}

impl VaryingMut<'_> {
    #[inline]
    pub fn as_ref(&self) -> VaryingRef<'_> {
        VaryingRef {
            words: self.words,
            record_words: self.record_words,
        }
    }

    #[inline]
    pub fn position(&self) -> Vector4<f32> {
        self.as_ref().position()
    }

    #[inline]
    pub fn set_position(&mut self, position: Vector4<f32>) {
        self.set_vec4(0, position);
    }

    #[inline]
    pub fn set_clip_code(&mut self, code: u32) {
        self.words[self.record_words] = f32::from_bits(code);
    }

    #[inline]
    pub fn set_f32(&mut self, offset: u32, value: f32) {
        self.slot(offset, 1)[0] = value;
    }

    #[inline]
    pub fn set_vec2(&mut self, offset: u32, value: Vector2<f32>) {
        self.slot(offset, 2).copy_from_slice(value.as_slice());
    }

    #[inline]
    pub fn set_vec3(&mut self, offset: u32, value: Vector3<f32>) {
        self.slot(offset, 3).copy_from_slice(value.as_slice());
    }

    #[inline]
    pub fn set_vec4(&mut self, offset: u32, value: Vector4<f32>) {
        self.slot(offset, 4).copy_from_slice(value.as_slice());
    }

    #[inline]
    fn slot(&mut self, offset: u32, len: usize) -> &mut [f32] {
        debug_assert_eq!(offset % 4, 0, "varying offsets are 4-byte aligned");

        let word = offset as usize / 4;
        debug_assert!(word + len <= self.record_words);

        &mut self.words[word..word + len]
    }
}

/// One 2x2 block of interpolated pixel records handed to the pixel stage.
///
/// All four lanes are interpolated even where not covered, so a shader can
/// form screen-space derivatives by finite differences; the helpers below do
/// exactly that. Lanes are ordered
///
/// ```text
/// 0 1
/// 2 3
/// ```
///
/// relative to the quad's top-left pixel.
pub struct PixelQuad<'a> {
    lanes: [VaryingRef<'a>; 4],
    x: i32,
    y: i32,
    mask: u8,
    depth: [f32; 4],
}

impl<'a> PixelQuad<'a> {
    #[inline]
    pub fn lane(&self, lane: usize) -> VaryingRef<'a> {
        self.lanes[lane]
    }

    /// Pixel coordinate of the given lane.
    #[inline]
    pub fn coordinate(&self, lane: usize) -> (u32, u32) {
        (
            (self.x + (lane as i32 & 1)) as u32,
            (self.y + (lane as i32 >> 1)) as u32,
        )
    }

    /// Coverage bits, one per lane.
    #[inline]
    pub fn mask(&self) -> u8 {
        self.mask
    }

    #[inline]
    pub fn covered(&self, lane: usize) -> bool {
        self.mask & (1 << lane) != 0
    }

    /// Camera-linear depth of the given lane.
    #[inline]
    pub fn depth(&self, lane: usize) -> f32 {
        self.depth[lane]
    }

    #[inline]
    pub fn ddx_f32(&self, offset: u32) -> f32 {
        self.lanes[1].get_f32(offset) - self.lanes[0].get_f32(offset)
    }

    #[inline]
    pub fn ddy_f32(&self, offset: u32) -> f32 {
        self.lanes[2].get_f32(offset) - self.lanes[0].get_f32(offset)
    }

    #[inline]
    pub fn ddx_vec2(&self, offset: u32) -> Vector2<f32> {
        self.lanes[1].get_vec2(offset) - self.lanes[0].get_vec2(offset)
    }

    #[inline]
    pub fn ddy_vec2(&self, offset: u32) -> Vector2<f32> {
        self.lanes[2].get_vec2(offset) - self.lanes[0].get_vec2(offset)
    }

    #[inline]
    pub fn ddx_vec3(&self, offset: u32) -> Vector3<f32> {
        self.lanes[1].get_vec3(offset) - self.lanes[0].get_vec3(offset)
    }

    #[inline]
    pub fn ddy_vec3(&self, offset: u32) -> Vector3<f32> {
        self.lanes[2].get_vec3(offset) - self.lanes[0].get_vec3(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varying::{ElementFormat, Semantic, VaryingElement};

    fn two_element_decl() -> VaryingDecl {
        VaryingDecl::new(
            vec![
                VaryingElement {
                    offset: 0,
                    semantic: Semantic::SvPosition,
                    format: ElementFormat::V4,
                },
                VaryingElement {
                    offset: 16,
                    semantic: Semantic::Texcoord,
                    format: ElementFormat::V2,
                },
            ],
            32,
        )
        .unwrap()
    }

    #[test]
    fn records_round_trip_typed_access() {
        let mut buffer = VaryingBuffer::new(two_element_decl());
        buffer.init_vertices(2);

        let mut vertex = buffer.vertex_mut(1);
        vertex.set_position(Vector4::new(1.0, 2.0, 3.0, 4.0));
        vertex.set_vec2(16, Vector2::new(0.25, 0.75));
        vertex.set_clip_code(0b10_0101);

        let vertex = buffer.vertex(1);
        assert_eq!(vertex.position(), Vector4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(vertex.get_vec2(16), Vector2::new(0.25, 0.75));
        assert_eq!(vertex.clip_code(), 0b10_0101);

        // The neighboring record is untouched.
        assert_eq!(buffer.vertex(0).position(), Vector4::zeros());
    }

    #[test]
    fn dynamic_arena_rewinds_without_freeing() {
        let mut buffer = VaryingBuffer::new(two_element_decl());
        buffer.init_vertices(0);

        let first = buffer.alloc_dynamic();
        buffer.get_mut(first).set_f32(16, 7.0);

        buffer.reset_dynamic();

        let again = buffer.alloc_dynamic();
        assert_eq!(again, first);
        // Fresh allocations come back zeroed.
        assert_eq!(buffer.get(again).get_f32(16), 0.0);
    }

    #[test]
    fn lerp_blends_whole_records_and_recodes() {
        let mut buffer = VaryingBuffer::new(two_element_decl());
        buffer.init_vertices(2);

        {
            let mut v = buffer.vertex_mut(0);
            v.set_position(Vector4::new(0.0, 0.0, -3.0, 1.0));
            v.set_vec2(16, Vector2::new(0.0, 1.0));
        }
        {
            let mut v = buffer.vertex_mut(1);
            v.set_position(Vector4::new(1.0, 0.0, 1.0, 1.0));
            v.set_vec2(16, Vector2::new(1.0, 0.0));
        }

        let mid = buffer.lerp_dynamic(buffer.vertex_handle(0), buffer.vertex_handle(1), 0.5);

        let record = buffer.get(mid);
        assert_eq!(record.position(), Vector4::new(0.5, 0.0, -1.0, 1.0));
        assert_eq!(record.get_vec2(16), Vector2::new(0.5, 0.5));
        // The blended position sits on the near plane, inside the frustum.
        assert_eq!(record.clip_code(), 0);
    }

    #[test]
    fn uniform_attributes_interpolate_bit_exact() {
        let mut buffer = VaryingBuffer::new(two_element_decl());
        buffer.init_vertices(3);

        let value = Vector2::new(0.1, 0.9);
        for i in 0..3 {
            buffer.vertex_mut(i).set_vec2(16, value);
        }

        buffer.reset_pixel();
        for _ in 0..PIXEL_LANES {
            buffer.alloc_pixel();
        }

        let triangle = [
            buffer.vertex_handle(0),
            buffer.vertex_handle(1),
            buffer.vertex_handle(2),
        ];

        // Deliberately awkward weights; the delta form must cancel exactly.
        buffer.interpolate_pixel(0, triangle, 0.3333331, 0.1234567);

        let quad_lane = buffer.get(VaryingHandle {
            arena: Arena::Pixel,
            index: 0,
        });
        assert_eq!(quad_lane.get_vec2(16), value);
    }

    #[test]
    fn quad_derivatives_are_lane_differences() {
        let mut buffer = VaryingBuffer::new(two_element_decl());
        buffer.init_vertices(0);

        buffer.reset_pixel();
        for lane in 0..PIXEL_LANES {
            let handle = buffer.alloc_pixel();
            let mut record = buffer.get_mut(handle);
            let (dx, dy) = ((lane & 1) as f32, (lane >> 1) as f32);
            record.set_vec2(16, Vector2::new(10.0 + dx * 2.0, 5.0 + dy * 3.0));
        }

        let quad = buffer.pixel_quad(4, 6, 0b1111, [0.0; 4]);
        assert_eq!(quad.ddx_vec2(16), Vector2::new(2.0, 0.0));
        assert_eq!(quad.ddy_vec2(16), Vector2::new(0.0, 3.0));
        assert_eq!(quad.coordinate(3), (5, 7));
    }
}
