use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hasher::{decode_digest, hex, NodeHasher};
use crate::leaf::leaf_count;
use crate::patch::ConfigurablePatch;
use crate::root::{compute_bytecode_root_with, RootParams};

/// Outcome of comparing a computed root against an externally reported one.
/// A mismatch is a result, not an error.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RootCheck {
    pub checked_utc: String,
    pub bytecode_len: usize,
    pub patches: usize,
    pub leaves: usize,
    pub computed_hex: String,
    pub expected_hex: String,
    pub matches: bool,
}

pub fn check_root<H: NodeHasher + ?Sized>(
    hasher: &H,
    template: &[u8],
    patches: &[ConfigurablePatch],
    params: &RootParams,
    expected_hex: &str,
) -> Result<RootCheck> {
    let expected = decode_digest(expected_hex).context("parse expected root")?;
    let computed = compute_bytecode_root_with(hasher, template, patches, params)
        .context("compute bytecode root")?;
    let matches = computed == expected;
    if !matches {
        tracing::warn!(computed = %hex(&computed), expected = %hex(&expected), "bytecode root mismatch");
    }
    Ok(RootCheck {
        checked_utc: chrono::Utc::now().to_rfc3339(),
        bytecode_len: template.len(),
        patches: patches.len(),
        leaves: leaf_count(template.len(), params),
        computed_hex: hex(&computed),
        expected_hex: hex(&expected),
        matches,
    })
}
