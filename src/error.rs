use thiserror::Error;

/// Configuration errors detected at draw submission, before any pixel is
/// touched. Degenerate primitives are not errors; they skip themselves.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    #[error("varying layout declares no elements")]
    EmptyDecl,
    #[error("varying layout must lead with an SV_POSITION Vector4 at offset 0")]
    MissingPosition,
    #[error("varying layout declares more than one SV_POSITION element")]
    DuplicatePosition,
    #[error("varying record size {0} is not a positive multiple of 16 bytes")]
    MisalignedRecord(u32),
    #[error("varying element offset {0} is not 4-byte aligned")]
    MisalignedElement(u32),
    #[error("varying element at offset {offset} overruns the {record_size}-byte record")]
    ElementOutOfBounds { offset: u32, record_size: u32 },
    #[error("canvas must have a non-zero width and height")]
    EmptyCanvas,
    #[error("mesh {attribute} channel has {len} entries for {expected} vertices")]
    AttributeLengthMismatch {
        attribute: &'static str,
        len: usize,
        expected: usize,
    },
}

pub type RenderResult<T> = Result<T, RenderError>;
