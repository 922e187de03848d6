use thiserror::Error;

/// Errors produced while patching or hashing bytecode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BytecodeError {
    /// A patch range does not fit inside the bytecode. Nothing was written.
    #[error("patch {index} at offset {offset} (len {len}) exceeds bytecode length {bytecode_len}")]
    OffsetOutOfBounds { index: usize, offset: u64, len: usize, bytecode_len: usize },

    /// Zero-length bytecode has no leaves and therefore no root.
    #[error("bytecode is empty")]
    EmptyBytecode,

    /// Two patches write to the same byte range (strict mode only).
    #[error("patches {first} and {second} overlap")]
    OverlappingPatches { first: usize, second: usize },

    /// Sizes must be non-zero and `leaf_size` a multiple of `align`.
    #[error("invalid root parameters: leaf_size {leaf_size}, align {align}")]
    InvalidParams { leaf_size: usize, align: usize },
}
