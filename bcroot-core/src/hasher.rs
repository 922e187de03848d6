//! Injectable 32-byte hashing used by the leaf and node layers.
//!
//! The tree only relies on `Hash(prefix || payload)`; the concrete primitive is
//! supplied by the caller through [`NodeHasher`]. SHA-256 is the default used by
//! [`crate::compute_bytecode_root`].

use anyhow::{bail, Result};
use sha2::Sha256;

pub type Digest = [u8; 32];

/// Domain tag for leaf digests.
pub const LEAF_PREFIX: u8 = 0x00;
/// Domain tag for internal node digests.
pub const NODE_PREFIX: u8 = 0x01;

/// A stateless 256-bit hash function.
pub trait NodeHasher: Send + Sync {
    fn hash(&self, data: &[u8]) -> Digest;

    /// Hash the concatenation of `parts`.
    /// Default implementation copies into one buffer and calls `hash`.
    fn hash_parts(&self, parts: &[&[u8]]) -> Digest {
        let total = parts.iter().map(|p| p.len()).sum();
        let mut buf = Vec::with_capacity(total);
        for p in parts {
            buf.extend_from_slice(p);
        }
        self.hash(&buf)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl NodeHasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> Digest {
        use sha2::Digest as _;
        Sha256::digest(data).into()
    }

    fn hash_parts(&self, parts: &[&[u8]]) -> Digest {
        use sha2::Digest as _;
        let mut h = Sha256::new();
        for p in parts {
            h.update(p);
        }
        h.finalize().into()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl NodeHasher for Blake3Hasher {
    fn hash(&self, data: &[u8]) -> Digest {
        *blake3::hash(data).as_bytes()
    }

    fn hash_parts(&self, parts: &[&[u8]]) -> Digest {
        let mut h = blake3::Hasher::new();
        for p in parts {
            h.update(p);
        }
        *h.finalize().as_bytes()
    }
}

/// `Hash(0x00 || leaf)`
pub fn leaf_hash<H: NodeHasher + ?Sized>(hasher: &H, leaf: &[u8]) -> Digest {
    hasher.hash_parts(&[&[LEAF_PREFIX], leaf])
}

/// `Hash(0x01 || left || right)`
pub fn node_hash<H: NodeHasher + ?Sized>(hasher: &H, left: &Digest, right: &Digest) -> Digest {
    hasher.hash_parts(&[&[NODE_PREFIX], left, right])
}

pub fn hex(bytes: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(LUT[(b >> 4) as usize] as char);
        s.push(LUT[(b & 0xF) as usize] as char);
    }
    s
}

/// Decode a hex string (optional `0x` prefix, either case) into bytes.
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if s.len() % 2 != 0 {
        bail!("odd number of hex digits ({})", s.len());
    }
    let nibble = |c: u8| -> Result<u8> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => bail!("invalid hex character {:?}", c as char),
        }
    };
    s.as_bytes().chunks(2).map(|pair| Ok((nibble(pair[0])? << 4) | nibble(pair[1])?)).collect()
}

/// Decode a 32-byte digest from 64 hex characters.
pub fn decode_digest(s: &str) -> Result<Digest> {
    let bytes = decode_hex(s)?;
    if bytes.len() != 32 {
        bail!("expected 32-byte digest, got {} bytes", bytes.len());
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const BLAKE3_EMPTY: &str = "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262";

    #[test]
    fn sha256_known_vector() {
        assert_eq!(hex(&Sha256Hasher.hash(b"abc")), SHA256_ABC);
        assert_eq!(hex(&Sha256Hasher.hash_parts(&[b"a", b"", b"bc"])), SHA256_ABC);
    }

    #[test]
    fn blake3_known_vector() {
        assert_eq!(hex(&Blake3Hasher.hash(b"")), BLAKE3_EMPTY);
        assert_eq!(Blake3Hasher.hash_parts(&[b"ab", b"c"]), Blake3Hasher.hash(b"abc"));
    }

    #[test]
    fn default_hash_parts_concatenates() {
        struct Echo;
        impl NodeHasher for Echo {
            fn hash(&self, data: &[u8]) -> Digest {
                let mut d = [0u8; 32];
                let n = data.len().min(32);
                d[..n].copy_from_slice(&data[..n]);
                d
            }
        }
        let d = Echo.hash_parts(&[&[1, 2], &[3]]);
        assert_eq!(&d[..4], &[1, 2, 3, 0]);
    }

    #[test]
    fn prefixes_separate_domains() {
        let l = [7u8; 32];
        let r = [9u8; 32];
        let mut joined = Vec::new();
        joined.extend_from_slice(&l);
        joined.extend_from_slice(&r);
        assert_ne!(leaf_hash(&Sha256Hasher, &joined), node_hash(&Sha256Hasher, &l, &r));
        assert_eq!(
            node_hash(&Sha256Hasher, &l, &r),
            Sha256Hasher.hash(&[&[NODE_PREFIX][..], &joined[..]].concat())
        );
    }

    #[test]
    fn hex_roundtrip_and_errors() {
        assert_eq!(decode_hex("0xDEADbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(hex(&[0x00, 0x0f, 0xf0]), "000ff0");
        assert!(decode_hex("abc").is_err());
        assert!(decode_hex("zz").is_err());
        assert!(decode_digest("00").is_err());
        assert_eq!(decode_digest(SHA256_ABC).unwrap(), Sha256Hasher.hash(b"abc"));
    }
}
