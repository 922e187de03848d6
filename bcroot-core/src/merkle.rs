use crate::error::BytecodeError;
use crate::hasher::{node_hash, Digest, NodeHasher};

/// Compute one level up: pairs are node-hashed and an unpaired last digest
/// is carried forward unchanged.
fn next_layer<H: NodeHasher + ?Sized>(hasher: &H, layer: &[Digest]) -> Vec<Digest> {
    let mut next = Vec::with_capacity(layer.len().div_ceil(2));
    let mut pairs = layer.chunks_exact(2);
    for pair in &mut pairs {
        next.push(node_hash(hasher, &pair[0], &pair[1]));
    }
    if let [carry] = pairs.remainder() {
        next.push(*carry);
    }
    next
}

/// Reduce leaf digests to a single root with domain-separated node hashes.
///
/// An odd layer carries its last digest up unchanged (it is never duplicated),
/// and a single leaf is its own root. Empty input has no root.
pub fn reduce<H: NodeHasher + ?Sized>(hasher: &H, leaves: &[Digest]) -> Result<Digest, BytecodeError> {
    if leaves.is_empty() {
        return Err(BytecodeError::EmptyBytecode);
    }
    let mut layer = leaves.to_vec();
    let mut height = 0u32;
    while layer.len() > 1 {
        layer = next_layer(hasher, &layer);
        height += 1;
        tracing::trace!(height, width = layer.len(), "reduced merkle layer");
    }
    Ok(layer[0])
}

/// Every layer from the leaves (first) up to the root (last).
pub fn levels<H: NodeHasher + ?Sized>(
    hasher: &H,
    leaves: &[Digest],
) -> Result<Vec<Vec<Digest>>, BytecodeError> {
    if leaves.is_empty() {
        return Err(BytecodeError::EmptyBytecode);
    }
    let mut out = vec![leaves.to_vec()];
    loop {
        let top = &out[out.len() - 1];
        if top.len() == 1 {
            break;
        }
        let next = next_layer(hasher, top);
        out.push(next);
    }
    Ok(out)
}
