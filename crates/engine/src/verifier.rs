//! EquivalenceVerifier: structural and byte-exact comparison of two outputs
//!
//! # Contract
//!
//! 1. Both outputs absent: pass (`NoOutput`).
//! 2. Manifests (markers dropped, sorted by name) must have equal counts.
//! 3. Name sequences must be identical position by position.
//! 4. Each matched pair must be byte-identical and end at the same offset.
//! 5. Aggregate listing lengths must be equal.
//!
//! Steps 2 and 3 fail before any file is opened. Step 4 stops at the first
//! differing byte of the first differing file; nothing past either stream's
//! end is ever compared. Streams are read in chunks but the reported offset
//! is always exact.

use std::io::{BufRead, BufReader};
use std::path::Path;

use parity_core::{
    ComparisonResult, ContentDivergence, FileSystem, HarnessResult, Mismatch, OutputManifest,
    StructuralMismatch,
};
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 64 * 1024;

/// Compares a reference output against a candidate output
pub struct EquivalenceVerifier<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> EquivalenceVerifier<'a> {
    /// Verify through `fs`
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        EquivalenceVerifier { fs }
    }

    /// Compare two output directories
    ///
    /// Divergence is reported in the returned `ComparisonResult`; `Err` is
    /// reserved for filesystem failures (missing directory, unreadable
    /// file), which are not equivalence verdicts.
    pub fn verify(
        &self,
        reference: Option<&Path>,
        candidate: Option<&Path>,
    ) -> HarnessResult<ComparisonResult> {
        let (reference, candidate) = match (reference, candidate) {
            (None, None) => {
                debug!(target: "parity::verify", "Neither run produced an output path");
                return Ok(ComparisonResult::NoOutput);
            }
            (Some(r), Some(c)) => (r, c),
            (r, c) => {
                return Ok(self.fail(Mismatch::Structural(StructuralMismatch::OutputPresence {
                    reference: r.is_some(),
                    candidate: c.is_some(),
                })))
            }
        };

        let ref_manifest = self.manifest(reference)?;
        let cand_manifest = self.manifest(candidate)?;

        if ref_manifest.len() != cand_manifest.len() {
            return Ok(self.fail(Mismatch::Structural(StructuralMismatch::FileCount {
                reference: ref_manifest.len(),
                candidate: cand_manifest.len(),
            })));
        }

        if let Some(index) = ref_manifest.first_name_difference(&cand_manifest) {
            return Ok(self.fail(Mismatch::Structural(StructuralMismatch::FileName {
                index,
                reference: ref_manifest.entries()[index].name.clone(),
                candidate: cand_manifest.entries()[index].name.clone(),
            })));
        }

        for (index, entry) in ref_manifest.entries().iter().enumerate() {
            let ref_stream = self.fs.open(&reference.join(&entry.name))?;
            let cand_stream = self.fs.open(&candidate.join(&entry.name))?;
            let divergence = first_divergence(
                BufReader::with_capacity(READ_CHUNK, ref_stream),
                BufReader::with_capacity(READ_CHUNK, cand_stream),
            )?;
            if let Some((offset, divergence)) = divergence {
                return Ok(self.fail(Mismatch::Content {
                    file_index: index,
                    file_name: entry.name.clone(),
                    offset,
                    divergence,
                }));
            }
            debug!(target: "parity::verify", file = %entry.name, "File pair identical");
        }

        if ref_manifest.total_length() != cand_manifest.total_length() {
            return Ok(self.fail(Mismatch::Aggregate {
                reference_bytes: ref_manifest.total_length(),
                candidate_bytes: cand_manifest.total_length(),
            }));
        }

        info!(
            target: "parity::verify",
            files = ref_manifest.len(),
            bytes = ref_manifest.total_length(),
            "Outputs equivalent"
        );
        Ok(ComparisonResult::Pass {
            files: ref_manifest.len(),
            aggregate_bytes: ref_manifest.total_length(),
        })
    }

    /// List `dir` and derive its manifest
    pub fn manifest(&self, dir: &Path) -> HarnessResult<OutputManifest> {
        Ok(OutputManifest::from_listing(self.fs.list_status(dir)?))
    }

    fn fail(&self, mismatch: Mismatch) -> ComparisonResult {
        warn!(target: "parity::verify", mismatch = %mismatch, "Outputs diverge");
        ComparisonResult::Fail(mismatch)
    }
}

/// Scan two streams in lockstep and locate the first divergence
///
/// Returns `None` when both streams hold the same bytes and end together.
/// A stream ending while the other still has data is a divergence at the
/// shorter stream's length.
pub fn first_divergence<A: BufRead, B: BufRead>(
    mut reference: A,
    mut candidate: B,
) -> std::io::Result<Option<(u64, ContentDivergence)>> {
    let mut offset = 0u64;
    loop {
        let matched = {
            let r = reference.fill_buf()?;
            let c = candidate.fill_buf()?;
            match (r.is_empty(), c.is_empty()) {
                (true, true) => return Ok(None),
                (false, true) => return Ok(Some((offset, ContentDivergence::ReferenceLonger))),
                (true, false) => return Ok(Some((offset, ContentDivergence::CandidateLonger))),
                (false, false) => {}
            }

            let n = r.len().min(c.len());
            if let Some(i) = r[..n].iter().zip(&c[..n]).position(|(a, b)| a != b) {
                return Ok(Some((
                    offset + i as u64,
                    ContentDivergence::ByteDiffers {
                        reference: r[i],
                        candidate: c[i],
                    },
                )));
            }
            n
        };
        reference.consume(matched);
        candidate.consume(matched);
        offset += matched as u64;
    }
}
