//! Decoded augmented read records
//!
//! An augmented record is an ordinary sequencing read plus the list of
//! k-mers that were flagged in it, each with its abundance in the case
//! sample and in the control sample(s).

/// A k-mer annotation attached to a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerAnnotation {
    /// K-mer sequence as it appears in the read (not necessarily canonical)
    pub sequence: String,
    /// Abundance in the case sample
    pub case_abund: u64,
    /// Abundance in each control sample, in file column order
    pub ctrl_abunds: Vec<u64>,
}

impl KmerAnnotation {
    /// Create an annotation with a single control sample
    pub fn new(sequence: impl Into<String>, case_abund: u64, ctrl_abund: u64) -> Self {
        Self::with_controls(sequence, case_abund, vec![ctrl_abund])
    }

    /// Create an annotation with one abundance per control sample
    pub fn with_controls(sequence: impl Into<String>, case_abund: u64, ctrl_abunds: Vec<u64>) -> Self {
        Self {
            sequence: sequence.into(),
            case_abund,
            ctrl_abunds,
        }
    }

    /// Highest abundance over the control samples, 0 without controls
    #[inline]
    pub fn ctrl_abund(&self) -> u64 {
        self.ctrl_abunds.iter().copied().max().unwrap_or(0)
    }

    /// Present in the case sample and absent from every control
    #[inline]
    pub fn is_interesting(&self) -> bool {
        self.case_abund > 0 && self.ctrl_abund() == 0
    }
}

/// A read together with its k-mer annotations
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AugmentedRecord {
    /// Unique read name
    pub id: String,
    /// Nucleotide sequence
    pub sequence: String,
    /// Quality string (FASTQ input only)
    pub quality: Option<String>,
    /// Annotated k-mers, in file order
    pub annotations: Vec<KmerAnnotation>,
    /// Mate sequences carried through from the input
    pub mates: Vec<String>,
}

impl AugmentedRecord {
    /// Create a record without quality or mates
    pub fn new(
        id: impl Into<String>,
        sequence: impl Into<String>,
        annotations: Vec<KmerAnnotation>,
    ) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
            annotations,
            ..Self::default()
        }
    }

    /// Annotations that are interesting (novel to the case sample)
    pub fn interesting(&self) -> impl Iterator<Item = &KmerAnnotation> {
        self.annotations.iter().filter(|a| a.is_interesting())
    }
}
