// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Complex sample buffers and their content hashes.
//!
//! A [`SampleArray`] is the unit stored in the waveform library. Its
//! [`ContentHash`] is a SHA-1 digest over the fixed-width little-endian
//! encoding of every sample, which makes deduplication reproducible across
//! runs and platforms.

use std::fmt;

use num_complex::Complex64;
use num_traits::Zero;
use serde::{Serialize, Serializer};
use sha1::{Digest, Sha1};

/// Canonical bit pattern of a sample component.
///
/// Numerically equal values must hash identically, so `-0.0` maps onto `+0.0`
/// and every NaN payload onto the same NaN.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// Digest identifying the exact content of a [`SampleArray`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 20]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Seven hex digits are enough to tell waveforms apart in logs.
        write!(f, "ContentHash({})", &self.to_string()[..7])
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// An ordered buffer of complex waveform samples.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SampleArray(Vec<Complex64>);

impl SampleArray {
    pub fn new(samples: Vec<Complex64>) -> Self {
        SampleArray(samples)
    }

    pub fn zeros(length: usize) -> Self {
        SampleArray(vec![Complex64::zero(); length])
    }

    pub fn constant(value: Complex64, length: usize) -> Self {
        SampleArray(vec![value; length])
    }

    /// Build an array from real-valued samples, with zero imaginary part.
    pub fn from_real<I: IntoIterator<Item = f64>>(values: I) -> Self {
        values.into_iter().map(|v| Complex64::new(v, 0.0)).collect()
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Complex64> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Complex64> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn abs_at_index(&self, index: usize) -> Option<f64> {
        self.0.get(index).map(|x| x.norm())
    }

    /// Whether all samples are numerically equal.
    ///
    /// An empty array is not considered constant: there is no value it could
    /// be collapsed onto.
    pub fn is_constant(&self) -> bool {
        match self.0.split_first() {
            Some((first, rest)) => rest.iter().all(|x| x == first),
            None => false,
        }
    }

    /// Surround the samples with `before` leading and `after` trailing zeros.
    pub fn padded(&self, before: usize, after: usize) -> Self {
        let mut out = Vec::with_capacity(before + self.0.len() + after);
        out.resize(before, Complex64::zero());
        out.extend_from_slice(&self.0);
        out.resize(before + self.0.len() + after, Complex64::zero());
        SampleArray(out)
    }

    /// Keep only the first `length` samples.
    pub fn truncated(&self, length: usize) -> Self {
        SampleArray(self.0.iter().take(length).copied().collect())
    }

    /// Multiply every sample by `exp(i * angle)`.
    ///
    /// A zero angle returns the samples untouched, bit for bit.
    pub fn rotated(&self, angle: f64) -> Self {
        if angle == 0.0 {
            return self.clone();
        }
        let phasor = Complex64::from_polar(1.0, angle);
        self.0.iter().map(|x| x * phasor).collect()
    }

    /// SHA-1 digest over the canonical encoding of the samples, in order.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha1::new();
        for sample in self.0.iter() {
            hasher.update(canonical_bits(sample.re).to_le_bytes());
            hasher.update(canonical_bits(sample.im).to_le_bytes());
        }
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&hasher.finalize());
        ContentHash(digest)
    }

    /// Equality under the same canonicalization the content hash uses.
    pub fn content_eq(&self, other: &SampleArray) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(a, b)| {
                canonical_bits(a.re) == canonical_bits(b.re)
                    && canonical_bits(a.im) == canonical_bits(b.im)
            })
    }
}

impl From<Vec<Complex64>> for SampleArray {
    fn from(samples: Vec<Complex64>) -> Self {
        SampleArray(samples)
    }
}

impl FromIterator<Complex64> for SampleArray {
    fn from_iter<I: IntoIterator<Item = Complex64>>(iter: I) -> Self {
        SampleArray(iter.into_iter().collect())
    }
}
