use crate::error::BytecodeError;
use crate::hasher::{Digest, NodeHasher, Sha256Hasher};
use crate::leaf::leaf_digests;
use crate::merkle;
use crate::patch::{apply_patches, ConfigurablePatch};

/// Bytes per leaf.
pub const LEAF_SIZE: usize = 16 * 1024;
/// A short final leaf is zero-padded to a multiple of this.
pub const ALIGN: usize = 8;

/// Tree shape. Every platform root is computed with the defaults; other
/// values are only useful for small fixtures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootParams {
    pub leaf_size: usize,
    pub align: usize,
}

impl Default for RootParams {
    fn default() -> Self {
        Self { leaf_size: LEAF_SIZE, align: ALIGN }
    }
}

impl RootParams {
    pub fn validate(&self) -> Result<(), BytecodeError> {
        if self.leaf_size == 0 || self.align == 0 || self.leaf_size % self.align != 0 {
            return Err(BytecodeError::InvalidParams {
                leaf_size: self.leaf_size,
                align: self.align,
            });
        }
        Ok(())
    }
}

/// Patch a private copy of `template` and return its SHA-256 bytecode root.
pub fn compute_bytecode_root(
    template: &[u8],
    patches: &[ConfigurablePatch],
) -> Result<Digest, BytecodeError> {
    compute_bytecode_root_with(&Sha256Hasher, template, patches, &RootParams::default())
}

/// As [`compute_bytecode_root`] with an explicit hasher and tree shape.
pub fn compute_bytecode_root_with<H: NodeHasher + ?Sized>(
    hasher: &H,
    template: &[u8],
    patches: &[ConfigurablePatch],
    params: &RootParams,
) -> Result<Digest, BytecodeError> {
    params.validate()?;
    // checked before patches: an empty template reports EmptyBytecode even
    // when a patch would also be out of bounds
    if template.is_empty() {
        return Err(BytecodeError::EmptyBytecode);
    }
    let mut working = template.to_vec();
    apply_patches(&mut working, patches)?;
    let leaves = leaf_digests(hasher, &working, params)?;
    let root = merkle::reduce(hasher, &leaves)?;
    tracing::debug!(
        bytes = working.len(),
        patches = patches.len(),
        leaves = leaves.len(),
        root = %crate::hasher::hex(&root),
        "computed bytecode root"
    );
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_are_validated() {
        RootParams::default().validate().unwrap();
        for bad in [
            RootParams { leaf_size: 0, align: 8 },
            RootParams { leaf_size: 16, align: 0 },
            RootParams { leaf_size: 12, align: 8 },
        ] {
            assert_eq!(
                bad.validate(),
                Err(BytecodeError::InvalidParams { leaf_size: bad.leaf_size, align: bad.align })
            );
        }
    }

    #[test]
    fn empty_template_is_rejected() {
        assert_eq!(compute_bytecode_root(&[], &[]), Err(BytecodeError::EmptyBytecode));
    }

    #[test]
    fn empty_template_wins_over_bad_patch() {
        let err = compute_bytecode_root(&[], &[ConfigurablePatch::new(4, vec![0xFF; 4])]);
        assert_eq!(err, Err(BytecodeError::EmptyBytecode));
    }

    #[test]
    fn invalid_params_win_over_empty_template() {
        let p = RootParams { leaf_size: 0, align: 8 };
        let err = compute_bytecode_root_with(&Sha256Hasher, &[], &[], &p);
        assert_eq!(err, Err(BytecodeError::InvalidParams { leaf_size: 0, align: 8 }));
    }

    #[test]
    fn template_is_not_mutated() {
        let template = vec![0u8; 64];
        let patched = compute_bytecode_root(&template, &[ConfigurablePatch::new(0, vec![1])]).unwrap();
        assert_eq!(template, vec![0u8; 64]);
        assert_ne!(patched, compute_bytecode_root(&template, &[]).unwrap());
    }

    #[test]
    fn bad_patch_aborts_before_hashing() {
        let err = compute_bytecode_root(&[0u8; 8], &[ConfigurablePatch::new(4, vec![0; 5])]);
        assert!(matches!(err, Err(BytecodeError::OffsetOutOfBounds { .. })));
    }
}
