use serde::{Deserialize, Serialize};

use crate::error::BytecodeError;

/// Replacement bytes for one configurable constant at a fixed offset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConfigurablePatch {
    pub offset: u64,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl ConfigurablePatch {
    pub fn new(offset: u64, data: impl Into<Vec<u8>>) -> Self {
        Self { offset, data: data.into() }
    }

    /// Exclusive end of the patched range, or `None` on u64 overflow.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.data.len() as u64)
    }
}

/// Overwrite `bytecode` with each patch in list order.
///
/// Every range is validated before the first write, so a failing call leaves
/// the buffer untouched. Overlapping patches are allowed; later ones win.
pub fn apply_patches(
    bytecode: &mut [u8],
    patches: &[ConfigurablePatch],
) -> Result<(), BytecodeError> {
    let bytecode_len = bytecode.len();
    let mut ranges = Vec::with_capacity(patches.len());
    for (index, p) in patches.iter().enumerate() {
        let out_of_bounds = || BytecodeError::OffsetOutOfBounds {
            index,
            offset: p.offset,
            len: p.data.len(),
            bytecode_len,
        };
        let end = p.end().ok_or_else(out_of_bounds)?;
        if end > bytecode_len as u64 {
            return Err(out_of_bounds());
        }
        // end <= bytecode.len(), so both casts are lossless
        ranges.push(p.offset as usize..end as usize);
    }
    for (p, range) in patches.iter().zip(ranges) {
        bytecode[range].copy_from_slice(&p.data);
    }
    tracing::trace!(patches = patches.len(), "applied configurable patches");
    Ok(())
}

/// Reject patch lists where two non-empty ranges share a byte.
pub fn check_disjoint(patches: &[ConfigurablePatch]) -> Result<(), BytecodeError> {
    let mut spans: Vec<(u64, u64, usize)> = patches
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.data.is_empty())
        .map(|(i, p)| (p.offset, p.end().unwrap_or(u64::MAX), i))
        .collect();
    spans.sort_unstable();
    for w in spans.windows(2) {
        let (_, a_end, a) = w[0];
        let (b_start, _, b) = w[1];
        if b_start < a_end {
            return Err(BytecodeError::OverlappingPatches { first: a.min(b), second: a.max(b) });
        }
    }
    Ok(())
}

pub(crate) mod hex_bytes {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&crate::hasher::hex(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        crate::hasher::decode_hex(&s).map_err(|e| D::Error::custom(format!("{e:#}")))
    }
}
