use std::borrow::Cow;

use crate::error::BytecodeError;
use crate::hasher::{leaf_hash, Digest, NodeHasher};
use crate::root::RootParams;

/// Number of leaves for `len` bytes: `ceil(len / leaf_size)`. `params` must be validated.
pub(crate) fn leaf_count(len: usize, params: &RootParams) -> usize {
    len.div_ceil(params.leaf_size)
}

/// Zero-pad `chunk` up to the next multiple of `align` (non-zero); borrowed when already aligned.
pub(crate) fn padded_leaf(chunk: &[u8], align: usize) -> Cow<'_, [u8]> {
    let rem = chunk.len() % align;
    if rem == 0 {
        return Cow::Borrowed(chunk);
    }
    let mut v = Vec::with_capacity(chunk.len() + align - rem);
    v.extend_from_slice(chunk);
    v.resize(chunk.len() + align - rem, 0);
    Cow::Owned(v)
}

fn hash_chunk<H: NodeHasher + ?Sized>(hasher: &H, chunk: &[u8], params: &RootParams) -> Digest {
    if chunk.len() == params.leaf_size {
        leaf_hash(hasher, chunk)
    } else {
        leaf_hash(hasher, &padded_leaf(chunk, params.align))
    }
}

/// Split `bytecode` into `leaf_size` chunks and hash each as `Hash(0x00 || leaf)`.
/// Only the final chunk can be short; it is padded to `align` first.
pub fn leaf_digests<H: NodeHasher + ?Sized>(
    hasher: &H,
    bytecode: &[u8],
    params: &RootParams,
) -> Result<Vec<Digest>, BytecodeError> {
    params.validate()?;
    let leaves: Vec<Digest> =
        bytecode.chunks(params.leaf_size).map(|chunk| hash_chunk(hasher, chunk, params)).collect();
    tracing::debug!(bytes = bytecode.len(), leaves = leaves.len(), "hashed bytecode leaves");
    Ok(leaves)
}

/// Same digests as [`leaf_digests`], hashed on the rayon pool.
/// Output order is byte order regardless of scheduling.
#[cfg(feature = "parallel")]
pub fn par_leaf_digests<H: NodeHasher + ?Sized>(
    hasher: &H,
    bytecode: &[u8],
    params: &RootParams,
) -> Result<Vec<Digest>, BytecodeError> {
    use rayon::prelude::*;

    params.validate()?;
    let leaves: Vec<Digest> = bytecode
        .par_chunks(params.leaf_size)
        .map(|chunk| hash_chunk(hasher, chunk, params))
        .collect();
    tracing::debug!(bytes = bytecode.len(), leaves = leaves.len(), "hashed bytecode leaves (parallel)");
    Ok(leaves)
}
