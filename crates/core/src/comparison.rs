//! Comparison types: output manifests, mismatches and verdicts
//!
//! A manifest is the comparable view of one output directory. A verdict
//! either passes or carries the first divergence found, located by file
//! index and, for content failures, byte offset.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::FileStatus;

/// Zero-length marker a job writes once its output directory is complete
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// True when `name` is a completion marker rather than job output
pub fn is_sentinel(name: &str) -> bool {
    name == SUCCESS_MARKER
}

/// Ordered, marker-free view of an output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputManifest {
    entries: Vec<FileStatus>,
    total_length: u64,
}

impl OutputManifest {
    /// Derive a manifest from a raw listing
    ///
    /// Sentinel markers are dropped from the entries and the rest is sorted
    /// by name. `total_length` sums every listed entry, markers included.
    pub fn from_listing(listing: Vec<FileStatus>) -> Self {
        let total_length = listing.iter().map(|s| s.length).sum();
        let mut entries: Vec<FileStatus> = listing
            .into_iter()
            .filter(|s| !is_sentinel(&s.name))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        OutputManifest {
            entries,
            total_length,
        }
    }

    /// Entries in name order
    pub fn entries(&self) -> &[FileStatus] {
        &self.entries
    }

    /// Number of compared files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no output files remain after dropping markers
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregate byte length across the listing
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Index of the first name that differs from `other`, if any
    ///
    /// Only meaningful when both manifests have the same length.
    pub fn first_name_difference(&self, other: &OutputManifest) -> Option<usize> {
        self.entries
            .iter()
            .zip(other.entries.iter())
            .position(|(a, b)| a.name != b.name)
    }
}

/// Name/count level divergence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum StructuralMismatch {
    /// Exactly one side resolved an output directory
    #[error("output presence differs: reference={reference}, candidate={candidate}")]
    OutputPresence {
        /// Reference side produced a path
        reference: bool,
        /// Candidate side produced a path
        candidate: bool,
    },

    /// Different number of output files
    #[error("file count differs: reference={reference}, candidate={candidate}")]
    FileCount {
        /// Files in the reference manifest
        reference: usize,
        /// Files in the candidate manifest
        candidate: usize,
    },

    /// Sorted name sequences disagree
    #[error("file name differs at index {index}: reference='{reference}', candidate='{candidate}'")]
    FileName {
        /// First differing position
        index: usize,
        /// Reference name at that position
        reference: String,
        /// Candidate name at that position
        candidate: String,
    },
}

/// How two byte streams diverged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentDivergence {
    /// Both sides have a byte at the offset and they differ
    ByteDiffers {
        /// Reference byte
        reference: u8,
        /// Candidate byte
        candidate: u8,
    },
    /// Candidate ended at the offset while the reference still had bytes
    ReferenceLonger,
    /// Reference ended at the offset while the candidate still had bytes
    CandidateLonger,
}

impl std::fmt::Display for ContentDivergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentDivergence::ByteDiffers {
                reference,
                candidate,
            } => write!(f, "byte 0x{:02x} != 0x{:02x}", reference, candidate),
            ContentDivergence::ReferenceLonger => f.write_str("candidate ended early"),
            ContentDivergence::CandidateLonger => f.write_str("reference ended early"),
        }
    }
}

/// First divergence between a reference and a candidate output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Mismatch {
    /// Name or count mismatch; no bytes were compared
    #[error("structural: {0}")]
    Structural(StructuralMismatch),

    /// Byte-level divergence inside a matched file pair
    #[error("content: file #{file_index} '{file_name}' diverges at offset {offset} ({divergence})")]
    Content {
        /// Index of the file in sorted order
        file_index: usize,
        /// Name shared by both sides
        file_name: String,
        /// Offset of the first differing position
        offset: u64,
        /// What differed at that offset
        divergence: ContentDivergence,
    },

    /// Every file matched but the summed listing lengths did not
    #[error("aggregate: reference={reference_bytes} bytes, candidate={candidate_bytes} bytes")]
    Aggregate {
        /// Summed reference length
        reference_bytes: u64,
        /// Summed candidate length
        candidate_bytes: u64,
    },
}

impl Mismatch {
    /// File index the mismatch is attributed to, when it has one
    pub fn file_index(&self) -> Option<usize> {
        match self {
            Mismatch::Structural(StructuralMismatch::FileName { index, .. }) => Some(*index),
            Mismatch::Content { file_index, .. } => Some(*file_index),
            _ => None,
        }
    }

    /// Byte offset for content divergences
    pub fn offset(&self) -> Option<u64> {
        match self {
            Mismatch::Content { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Verdict of one reference/candidate comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum ComparisonResult {
    /// Neither run resolved an output directory
    NoOutput,
    /// Outputs are byte-identical
    Pass {
        /// Number of compared files
        files: usize,
        /// Aggregate length, equal on both sides
        aggregate_bytes: u64,
    },
    /// First divergence found
    Fail(Mismatch),
}

impl ComparisonResult {
    /// True for `NoOutput` and `Pass`
    pub fn is_pass(&self) -> bool {
        !matches!(self, ComparisonResult::Fail(_))
    }

    /// Mismatch detail on failure
    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            ComparisonResult::Fail(m) => Some(m),
            _ => None,
        }
    }
}
