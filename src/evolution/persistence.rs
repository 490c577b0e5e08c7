//! Checkpoint and run output files.
//!
//! Checkpoints use bincode for compact serialization and LZ4 for
//! compression, behind a magic/version header. Run output is pretty JSON.
//! Both are written to a temporary file next to the destination and then
//! renamed into place, so a crash never leaves a truncated file behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{EvolutionError, EvolutionResult};
use crate::evolution::hall_of_fame::HallOfFame;
use crate::evolution::individual::{Individual, IndividualId, Pedigree};
use crate::evolution::logbook::Logbooks;
use crate::evolution::scheduler::RunSettings;
use crate::experiment::ExperimentParams;

/// Magic bytes for checkpoint identification.
pub const MAGIC: &[u8; 4] = b"ANMT";

/// Current checkpoint format version.
pub const VERSION: u8 = 1;

/// LZ4 never expands data by more than this factor.
const MAX_COMPRESSION_RATIO: usize = 255;

/// Complete state of a run at a generation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Primary experiment parameters.
    pub params: ExperimentParams,
    /// Run settings in effect when the checkpoint was taken.
    pub settings: RunSettings,
    /// Current population, in order.
    pub population: Vec<IndividualId>,
    /// Every live individual.
    pub pedigree: Pedigree,
    /// Last completed generation.
    pub generation: u64,
    /// Master RNG, including its stream position.
    pub rng: ChaCha8Rng,
    /// Best individuals so far.
    pub hall_of_fame: HallOfFame,
    /// Statistics recorded so far.
    pub logbooks: Logbooks,
    /// Seconds spent simulating so far.
    pub elapsed: f64,
}

/// Encode a checkpoint: header, then size-prepended LZ4 of the bincode
/// encoding.
///
/// # Errors
///
/// Returns a description of the failure if serialization fails.
pub fn encode_checkpoint(checkpoint: &Checkpoint) -> Result<Vec<u8>, String> {
    let encoded = bincode::serialize(checkpoint).map_err(|e| e.to_string())?;
    let compressed = lz4_flex::compress_prepend_size(&encoded);
    let mut bytes = Vec::with_capacity(MAGIC.len() + 1 + compressed.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(VERSION);
    bytes.extend_from_slice(&compressed);
    Ok(bytes)
}

/// Decode a checkpoint produced by [`encode_checkpoint`].
///
/// # Errors
///
/// Returns a description of the problem if the header is wrong or the
/// payload is corrupt.
pub fn decode_checkpoint(bytes: &[u8]) -> Result<Checkpoint, String> {
    let Some((magic, rest)) = bytes.split_first_chunk::<4>() else {
        return Err("file too short".to_string());
    };
    if magic != MAGIC {
        return Err("invalid file magic".to_string());
    }
    let Some((&version, compressed)) = rest.split_first() else {
        return Err("missing format version".to_string());
    };
    if version != VERSION {
        return Err(format!("unsupported version: {version}"));
    }

    // Refuse size prefixes no LZ4 stream of this length could produce
    // before decompression allocates for them.
    let declared = compressed
        .first_chunk::<4>()
        .map(|size| u32::from_le_bytes(*size) as usize)
        .ok_or_else(|| "truncated payload".to_string())?;
    if declared > compressed.len().saturating_mul(MAX_COMPRESSION_RATIO) {
        return Err(format!("implausible decompressed size: {declared}"));
    }

    let decompressed = lz4_flex::decompress_size_prepended(compressed).map_err(|e| e.to_string())?;
    bincode::deserialize(&decompressed).map_err(|e| e.to_string())
}

/// Write a checkpoint atomically.
///
/// # Errors
///
/// Returns an error if serialization or file I/O fails.
pub fn save_checkpoint(checkpoint: &Checkpoint, path: &Path) -> EvolutionResult<()> {
    let bytes = encode_checkpoint(checkpoint).map_err(|reason| EvolutionError::CheckpointFormat {
        path: path.to_path_buf(),
        reason,
    })?;
    write_atomically(path, &bytes, true).map_err(|source| EvolutionError::CheckpointIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a checkpoint.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a checkpoint of
/// this format version.
pub fn load_checkpoint(path: &Path) -> EvolutionResult<Checkpoint> {
    let bytes = fs::read(path).map_err(|source| EvolutionError::CheckpointIo {
        path: path.to_path_buf(),
        source,
    })?;
    decode_checkpoint(&bytes).map_err(|reason| EvolutionError::CheckpointFormat {
        path: path.to_path_buf(),
        reason,
    })
}

/// Run metadata stored in the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Seconds spent simulating, including time before any resume.
    pub elapsed: f64,
    /// Version of the software that produced the file.
    pub version: String,
    /// Final generation.
    pub generation: u64,
}

/// Contents of a run output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Primary experiment parameters.
    pub experiment: ExperimentParams,
    /// Ancestor chains, generation 0 first, downsampled by the lineage
    /// interval.
    pub lineages: Vec<Vec<Individual>>,
    /// Recorded statistics.
    pub logbooks: Logbooks,
    /// Hall-of-fame individuals, best first.
    pub hof: Vec<Individual>,
    /// Run metadata.
    pub metadata: Metadata,
}

impl RunOutput {
    /// Genome of the last recorded individual of the first lineage.
    #[must_use]
    pub fn final_genome(&self) -> Option<&[u8]> {
        self.lineages
            .first()
            .and_then(|lineage| lineage.last())
            .map(|individual| individual.genome.nucleotides())
    }
}

/// Fail with [`EvolutionError::OutputExists`] if `path` exists and may not
/// be replaced.
///
/// # Errors
///
/// Returns an error if the file exists and `overwrite` is false.
pub fn check_output_path(path: &Path, overwrite: bool) -> EvolutionResult<()> {
    if !overwrite && path.exists() {
        return Err(EvolutionError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

/// Write run output as pretty JSON.
///
/// # Errors
///
/// Returns an error if the file exists and `overwrite` is false, or on
/// serialization or I/O failure.
pub fn write_output(output: &RunOutput, path: &Path, overwrite: bool) -> EvolutionResult<()> {
    check_output_path(path, overwrite)?;
    let json = serde_json::to_vec_pretty(output).map_err(|source| EvolutionError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomically(path, &json, overwrite).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            EvolutionError::OutputExists(path.to_path_buf())
        } else {
            EvolutionError::OutputIo {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Read a run output file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_output(path: &Path) -> EvolutionResult<RunOutput> {
    let text = fs::read_to_string(path).map_err(|source| EvolutionError::OutputIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| EvolutionError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomically(path: &Path, bytes: &[u8], replace: bool) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    let persisted = if replace {
        file.persist(path)
    } else {
        file.persist_noclobber(path)
    };
    persisted.map(drop).map_err(|e| e.error)
}
