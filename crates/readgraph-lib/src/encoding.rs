//! DNA nucleotide alphabet handling
//!
//! Validation and complement of nucleotide bytes. K-mers must be drawn
//! from {A, C, G, T}; read sequences additionally tolerate `N`. Lowercase
//! input is accepted everywhere and normalized to uppercase.

use thiserror::Error;

/// Error type for alphabet operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The input byte is not a valid nucleotide
    #[error("Invalid DNA base {base:?} at position {position}")]
    InvalidBase {
        /// Offending byte
        base: char,
        /// Position of the byte in the input
        position: usize,
    },
    /// The input sequence is empty
    #[error("Empty k-mer")]
    Empty,
}

/// Normalize a nucleotide to uppercase, rejecting anything outside A/C/G/T
#[inline]
pub const fn normalize_base(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(b'A'),
        b'C' | b'c' => Some(b'C'),
        b'G' | b'g' => Some(b'G'),
        b'T' | b't' => Some(b'T'),
        _ => None,
    }
}

/// Complement of an uppercase nucleotide
///
/// `N` maps to itself; callers validate before complementing.
#[inline]
pub const fn complement_base(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => other,
    }
}

/// Uppercase copy of a k-mer, checking every base is A/C/G/T
///
/// # Errors
/// Returns an error if the k-mer is empty or contains a non-ACGT byte
pub fn normalize_kmer(kmer: &[u8]) -> Result<Vec<u8>, EncodingError> {
    if kmer.is_empty() {
        return Err(EncodingError::Empty);
    }
    kmer.iter()
        .enumerate()
        .map(|(position, &base)| {
            normalize_base(base).ok_or(EncodingError::InvalidBase {
                base: base as char,
                position,
            })
        })
        .collect()
}

/// Validate a read sequence: A, C, G, T or N in either case
///
/// # Errors
/// Returns the first offending byte and its position
pub fn validate_read_sequence(seq: &[u8]) -> Result<(), EncodingError> {
    for (position, &base) in seq.iter().enumerate() {
        match base {
            b'A' | b'C' | b'G' | b'T' | b'N' | b'a' | b'c' | b'g' | b't' | b'n' => {}
            _ => {
                return Err(EncodingError::InvalidBase {
                    base: base as char,
                    position,
                })
            }
        }
    }
    Ok(())
}
