//! The varying-data schema connecting shader stages.
//!
//! A shader declares the layout of its varying record once; the pipeline
//! uses that declaration to size the interpolation arenas and to move
//! attribute data from the vertex stage to the pixel stage.

use crate::error::{RenderError, RenderResult};

pub mod buffer;

pub use self::buffer::{PixelQuad, VaryingBuffer, VaryingHandle, VaryingMut, VaryingRef};

/// Meaning of one varying element, mirroring the usual HLSL semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    /// The clip-space output position. Exactly one element carries it, a
    /// [`ElementFormat::V4`] leading the record.
    SvPosition,
    Position,
    Normal,
    Texcoord,
    Color,
    Tangent,
}

/// Scalar layout of one varying element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementFormat {
    F32,
    V2,
    V3,
    V4,
}

impl ElementFormat {
    /// Size of the element in bytes.
    #[inline]
    pub fn size(self) -> u32 {
        match self {
            ElementFormat::F32 => 4,
            ElementFormat::V2 => 8,
            ElementFormat::V3 => 12,
            ElementFormat::V4 => 16,
        }
    }
}

/// One element of a varying record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaryingElement {
    /// Byte offset of the element inside the record.
    pub offset: u32,
    pub semantic: Semantic,
    pub format: ElementFormat,
}

/// A validated varying record layout.
///
/// Construction checks the contract the rest of the pipeline relies on:
/// the record leads with an `SV_POSITION` vector, every element is 4-byte
/// aligned and in bounds, and the record size is a multiple of 16 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingDecl {
    elements: Vec<VaryingElement>,
    record_size: u32,
}

impl VaryingDecl {
    pub fn new(elements: Vec<VaryingElement>, record_size: u32) -> RenderResult<VaryingDecl> {
        if elements.is_empty() {
            return Err(RenderError::EmptyDecl);
        }

        if record_size == 0 || record_size % 16 != 0 {
            return Err(RenderError::MisalignedRecord(record_size));
        }

        let position = &elements[0];
        if position.semantic != Semantic::SvPosition
            || position.format != ElementFormat::V4
            || position.offset != 0
        {
            return Err(RenderError::MissingPosition);
        }

        for element in &elements[1..] {
            if element.semantic == Semantic::SvPosition {
                return Err(RenderError::DuplicatePosition);
            }
        }

        for element in &elements {
            if element.offset % 4 != 0 {
                return Err(RenderError::MisalignedElement(element.offset));
            }

            if element.offset + element.format.size() > record_size {
                return Err(RenderError::ElementOutOfBounds {
                    offset: element.offset,
                    record_size,
                });
            }
        }

        Ok(VaryingDecl {
            elements,
            record_size,
        })
    }

    #[inline]
    pub fn elements(&self) -> &[VaryingElement] {
        &self.elements
    }

    /// Record size in bytes.
    #[inline]
    pub fn record_size(&self) -> u32 {
        self.record_size
    }

    /// Record size in `f32` words.
    #[inline]
    pub(crate) fn record_words(&self) -> usize {
        (self.record_size / 4) as usize
    }

    /// First element with the given semantic, if any.
    pub fn find(&self, semantic: Semantic) -> Option<&VaryingElement> {
        self.elements.iter().find(|e| e.semantic == semantic)
    }
}
