//! Strand-independent k-mer identity
//!
//! A k-mer and its reverse complement describe the same genomic locus on
//! opposite strands. [`CanonicalKmer`] stores whichever of the two is
//! lexicographically smaller, so it can be used directly as a hash or
//! ordering key.

use crate::encoding::{complement_base, normalize_kmer, EncodingError};
use std::borrow::Borrow;
use std::fmt;

/// Canonical (strand-independent) form of a k-mer
///
/// Always uppercase ACGT and never longer than the k-mer it came from.
///
/// # Example
/// ```
/// use readgraph_lib::kmer::CanonicalKmer;
///
/// let fwd = CanonicalKmer::new("TTGCA").unwrap();
/// let rev = CanonicalKmer::new("TGCAA").unwrap();
/// assert_eq!(fwd, rev);
/// assert_eq!(fwd.as_str(), "TGCAA");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalKmer(String);

impl CanonicalKmer {
    /// Canonicalize a k-mer given as a string
    ///
    /// # Errors
    /// Returns an error if the k-mer is empty or contains a non-ACGT base
    pub fn new(kmer: &str) -> Result<Self, EncodingError> {
        canonicalize(kmer.as_bytes())
    }

    /// The canonical sequence
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// K-mer length
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a successfully constructed k-mer
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<str> for CanonicalKmer {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CanonicalKmer {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CanonicalKmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalKmer(\"{}\")", self.0)
    }
}

impl std::str::FromStr for CanonicalKmer {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Reverse complement of an uppercase ACGT sequence
#[inline]
fn reverse_complement_normalized(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement_base(b)).collect()
}

/// Reverse complement of a k-mer, uppercased
///
/// # Errors
/// Returns an error if the k-mer is empty or contains a non-ACGT base
pub fn reverse_complement(kmer: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let fwd = normalize_kmer(kmer)?;
    Ok(reverse_complement_normalized(&fwd))
}

/// Lexicographic minimum of a k-mer and its reverse complement
///
/// Input is case-insensitive; the result is uppercase.
///
/// # Errors
/// Returns an error if the k-mer is empty or contains a non-ACGT base
pub fn canonicalize(kmer: &[u8]) -> Result<CanonicalKmer, EncodingError> {
    let fwd = normalize_kmer(kmer)?;
    let rc = reverse_complement_normalized(&fwd);
    let min = if rc < fwd { rc } else { fwd };
    // normalize_kmer only ever yields ASCII ACGT
    Ok(CanonicalKmer(min.into_iter().map(char::from).collect()))
}
