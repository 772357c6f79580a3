//! Revealed entropy values and the seed derivations built on them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 256-bit unpredictable value revealed by the beacon for an anchor.
///
/// Every random decision in a tournament is derived from one of these by
/// hashing it together with a label and indices, so the whole outcome is
/// reproducible from the revealed values alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entropy([u8; 32]);

impl Entropy {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Expand a small integer seed into a full value. Handy for fakes and tests.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"gauntlet/seed");
        hasher.update(seed.to_be_bytes());
        Self::from_digest(&hasher.finalize())
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive a child value bound to `label` and two indices.
    #[must_use]
    pub fn derive(&self, label: &[u8], a: u64, b: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update((label.len() as u64).to_be_bytes());
        hasher.update(label);
        hasher.update(a.to_be_bytes());
        hasher.update(b.to_be_bytes());
        Self::from_digest(&hasher.finalize())
    }

    /// The leading 8 bytes as a big-endian integer.
    #[must_use]
    pub fn to_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(buf)
    }

    /// Draw an integer uniformly from `0..bound` for the given step.
    ///
    /// Uses rejection sampling over re-hashed candidates so there is no
    /// modulo bias, whatever the bound.
    #[must_use]
    pub fn uniform_below(&self, label: &[u8], step: u64, bound: u64) -> u64 {
        if bound <= 1 {
            return 0;
        }

        // 2^64 mod bound; candidates at or above 2^64 - rem are rejected.
        let rem = (u64::MAX % bound + 1) % bound;
        let limit = 0u64.wrapping_sub(rem);

        let mut nonce = 0u64;
        loop {
            let candidate = self.derive(label, step, nonce).to_u64();
            if rem == 0 || candidate < limit {
                return candidate % bound;
            }
            nonce += 1;
        }
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(digest);
        Self(out)
    }
}

impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
