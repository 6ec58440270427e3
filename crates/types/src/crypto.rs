//! Crypto provider seam.
//!
//! Consensus treats hashing and signing as a supplied service. The trait is
//! the integration point for a real signer; [`NodeCrypto`] is the default
//! in-process implementation, fully deterministic so rounds are replayable.

use crate::{Address, Hash};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A signature over a consensus message.
///
/// Fixed 32 bytes under [`NodeCrypto`]; a production signer would carry its
/// own scheme behind the same trait.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature([u8; 32]);

impl Signature {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Signature(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{}..)", hex::encode(&self.0[..4]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("signature must be 32 bytes"));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Signature(out))
    }
}

/// Hashing and signing operations consensus depends on.
pub trait CryptoProvider: Send + Sync {
    /// Compute the canonical hash of a block header.
    fn block_hash(
        &self,
        parent: &Hash,
        state_root: &Hash,
        tx_root: &Hash,
        receipts_root: &Hash,
        timestamp_ms: u64,
    ) -> Hash;

    /// Merkle root over transaction hashes. Empty input yields `Hash::ZERO`.
    fn merkle_root(&self, leaves: &[Hash]) -> Hash;

    /// Sign a message on behalf of `signer`.
    fn sign(&self, signer: &Address, message: &[u8]) -> Signature;

    /// Verify a signature produced by `signer` over `message`.
    fn verify(&self, signer: &Address, message: &[u8], signature: &Signature) -> bool;
}

/// Deterministic blake3-keyed provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeCrypto;

impl NodeCrypto {
    fn key_for(signer: &Address) -> [u8; 32] {
        *blake3::hash(signer.as_bytes()).as_bytes()
    }
}

impl CryptoProvider for NodeCrypto {
    fn block_hash(
        &self,
        parent: &Hash,
        state_root: &Hash,
        tx_root: &Hash,
        receipts_root: &Hash,
        timestamp_ms: u64,
    ) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(parent.as_bytes());
        hasher.update(state_root.as_bytes());
        hasher.update(tx_root.as_bytes());
        hasher.update(receipts_root.as_bytes());
        hasher.update(&timestamp_ms.to_le_bytes());
        hasher.finalize().into()
    }

    fn merkle_root(&self, leaves: &[Hash]) -> Hash {
        if leaves.is_empty() {
            return Hash::ZERO;
        }
        let mut level: Vec<Hash> = leaves.to_vec();
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                let mut hasher = blake3::Hasher::new();
                hasher.update(pair[0].as_bytes());
                // Odd leaf is paired with itself.
                hasher.update(pair.get(1).unwrap_or(&pair[0]).as_bytes());
                next.push(hasher.finalize().into());
            }
            level = next;
        }
        level[0]
    }

    fn sign(&self, signer: &Address, message: &[u8]) -> Signature {
        let digest = blake3::keyed_hash(&Self::key_for(signer), message);
        Signature(*digest.as_bytes())
    }

    fn verify(&self, signer: &Address, message: &[u8], signature: &Signature) -> bool {
        self.sign(signer, message) == *signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let crypto = NodeCrypto;
        let signer = Address::from_public_key(b"v0");
        let sig = crypto.sign(&signer, b"prevote:1:0:0xabc");
        assert!(crypto.verify(&signer, b"prevote:1:0:0xabc", &sig));
        assert!(!crypto.verify(&signer, b"prevote:1:1:0xabc", &sig));
        let other = Address::from_public_key(b"v1");
        assert!(!crypto.verify(&other, b"prevote:1:0:0xabc", &sig));
    }

    #[test]
    fn merkle_root_shapes() {
        let crypto = NodeCrypto;
        assert_eq!(crypto.merkle_root(&[]), Hash::ZERO);

        let a = Hash::new([1; 32]);
        let b = Hash::new([2; 32]);
        let c = Hash::new([3; 32]);
        // A single leaf is its own root.
        assert_eq!(crypto.merkle_root(&[a]), a);
        // Root depends on content and order.
        assert_ne!(crypto.merkle_root(&[a, b]), crypto.merkle_root(&[b, a]));
        // Odd counts fold deterministically.
        assert_eq!(crypto.merkle_root(&[a, b, c]), crypto.merkle_root(&[a, b, c]));
    }

    #[test]
    fn block_hash_covers_every_field() {
        let crypto = NodeCrypto;
        let base = crypto.block_hash(&Hash::ZERO, &Hash::ZERO, &Hash::ZERO, &Hash::ZERO, 1);
        assert_ne!(
            base,
            crypto.block_hash(&Hash::ZERO, &Hash::ZERO, &Hash::ZERO, &Hash::ZERO, 2)
        );
        assert_ne!(
            base,
            crypto.block_hash(&Hash::new([1; 32]), &Hash::ZERO, &Hash::ZERO, &Hash::ZERO, 1)
        );
    }
}
