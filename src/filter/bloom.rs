//! Bloom filter
//!
//! Bit array with `k` probe positions per identifier, derived by double
//! hashing over two seeded MurmurHash3 values: `h(i) = h1 + i * h2`.

use std::io::Cursor;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use super::MembershipFilter;
use crate::error::{BlockError, Result};

/// Bloom filter over block identifiers
#[derive(Clone, Serialize, Deserialize)]
pub struct BloomFilter {
    #[serde(with = "bitvec_serde")]
    bits: BitVec<u8, Lsb0>,
    /// Number of hash functions (k)
    k: u32,
    /// Size in bits (m)
    m: u64,
    /// Number of identifiers added (n)
    n: u64,
}

/// Serde support for BitVec
mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (bits.as_raw_slice(), bits.len()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bytes, len): (Vec<u8>, usize) = Deserialize::deserialize(deserializer)?;
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(len);
        Ok(bits)
    }
}

impl BloomFilter {
    /// Filter sized for `expected_items` at the given false positive rate.
    ///
    /// Callers validate the rate through [`crate::Config::validate`]; an
    /// `expected_items` of zero is treated as one.
    pub fn with_rate(expected_items: usize, fp_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;

        // m = -n * ln(p) / ln(2)^2
        let m = (-n * fp_rate.ln() / std::f64::consts::LN_2.powi(2)).ceil() as u64;
        let m = m.max(8);

        // k = (m / n) * ln(2)
        let k = ((m as f64 / n) * std::f64::consts::LN_2).round() as u32;
        let k = k.max(1);

        Self {
            bits: bitvec![u8, Lsb0; 0; m as usize],
            k,
            m,
            n: 0,
        }
    }

    /// Size in bits
    pub fn size_bits(&self) -> u64 {
        self.m
    }

    /// Number of hash functions
    pub fn hash_count(&self) -> u32 {
        self.k
    }

    /// Number of identifiers added
    pub fn len(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Estimated false positive rate at the current fill: (1 - e^(-kn/m))^k
    pub fn false_positive_rate(&self) -> f64 {
        let k = f64::from(self.k);
        (1.0 - (-k * self.n as f64 / self.m as f64).exp()).powf(k)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let filter: Self = bincode::deserialize(data)?;
        if filter.m == 0 || filter.k == 0 || filter.bits.len() as u64 != filter.m {
            return Err(BlockError::Corruption(format!(
                "bloom filter header does not match its bits: m={}, k={}, bits={}",
                filter.m,
                filter.k,
                filter.bits.len()
            )));
        }
        Ok(filter)
    }

    fn positions(&self, id: &[u8]) -> impl Iterator<Item = usize> + '_ {
        let h1 = murmur(id, 0);
        let h2 = murmur(id, 1);
        (0..self.k).map(move |i| {
            (h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % self.m) as usize
        })
    }
}

impl MembershipFilter for BloomFilter {
    fn add(&mut self, id: &[u8]) {
        let positions: Vec<usize> = self.positions(id).collect();
        for pos in positions {
            self.bits.set(pos, true);
        }
        self.n += 1;
    }

    fn may_contain(&self, id: &[u8]) -> bool {
        self.positions(id).all(|pos| self.bits[pos])
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("m", &self.m)
            .field("k", &self.k)
            .field("n", &self.n)
            .finish()
    }
}

/// Lower 64 bits of seeded MurmurHash3 x64-128
fn murmur(data: &[u8], seed: u32) -> u64 {
    // Reading from an in-memory cursor cannot fail.
    murmur3::murmur3_x64_128(&mut Cursor::new(data), seed).unwrap_or(0) as u64
}
