pub mod configurables;
pub mod error;
pub mod hasher;
pub mod leaf;
pub mod merkle;
pub mod patch;
pub mod root;
pub mod verify;

pub use error::BytecodeError;
pub use hasher::{Blake3Hasher, Digest, NodeHasher, Sha256Hasher};
pub use patch::{apply_patches, ConfigurablePatch};
pub use root::{compute_bytecode_root, compute_bytecode_root_with, RootParams, ALIGN, LEAF_SIZE};
