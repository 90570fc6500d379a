//! Rank index export and re-import.
//!
//! Writes the per-instance rank permutations in the same NumPy format used
//! for import, so Python tooling can `np.load` them directly.
//!
//! # Format
//!
//! A 2-D `int64` array with one row per instance:
//!
//! ```text
//! [[1, perm_1[0], perm_1[1], ...],
//!  [2, perm_2[0], perm_2[1], ...],
//!  ...]
//! ```
//!
//! Column 0 is the 1-based instance id; the remaining columns are original
//! shape ids in descending-rank order. Integer storage makes the round trip
//! exact.
//!
//! An optional `<stem>_metadata.json` is written beside the array.
//!
//! # Example
//!
//! ```ignore
//! use shape_explorer::export::RankIndexExporter;
//!
//! let exporter = RankIndexExporter::new().with_metadata(true);
//! exporter.export(&rank_index, "indices.npy")?;
//! let entries = shape_explorer::export::read_rank_index("indices.npy")?;
//! ```

use crate::error::{ExplorerError, Result};
use crate::ranking::{RankEntry, RankIndex};
use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Description stored in the metadata sidecar.
pub const RANK_INDEX_FORMAT: &str =
    "[[instance (1-based), original shape ids in descending-rank order...], ...]";

/// Metadata about an exported rank index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Number of instances (rows)
    pub n_instances: usize,

    /// Number of shapes ranked per instance
    pub n_shapes: usize,

    /// Number of value channels averaged per shape
    pub n_value_channels: usize,

    /// Layout of each row
    pub format: String,

    /// Export timestamp (RFC 3339, UTC)
    pub export_timestamp: String,
}

/// Writes rank indices to `.npy`.
///
/// On the Python side `np.load` returns an `(n_instances, 1 + n_shapes)`
/// `int64` array, not a nested `[[id, [ids]]]` object array: read the
/// instance id from `row[0]` and the ranked shape ids from `row[1:]`.
#[derive(Debug, Clone, Default)]
pub struct RankIndexExporter {
    write_metadata: bool,
}

impl RankIndexExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write `<stem>_metadata.json` next to the array.
    pub fn with_metadata(mut self, enabled: bool) -> Self {
        self.write_metadata = enabled;
        self
    }

    /// Export a rank index. Returns the paths written.
    pub fn export<P: AsRef<Path>>(&self, index: &RankIndex, path: P) -> Result<Vec<PathBuf>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let entries = index.entries();
        write_rank_index(path, &entries)?;
        let mut written = vec![path.to_path_buf()];

        if self.write_metadata {
            let metadata = ExportMetadata {
                n_instances: index.instance_count(),
                n_shapes: index.shape_count(),
                n_value_channels: index.value_count(),
                format: RANK_INDEX_FORMAT.to_string(),
                export_timestamp: chrono::Utc::now().to_rfc3339(),
            };
            let meta_path = metadata_path(path);
            let file = File::create(&meta_path)?;
            serde_json::to_writer_pretty(file, &metadata)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            written.push(meta_path);
        }

        log::info!(
            "Exported rank index: {} [{} instances x {} shapes]",
            path.display(),
            index.instance_count(),
            index.shape_count()
        );

        Ok(written)
    }
}

/// Sidecar path: `dir/indices.npy` -> `dir/indices_metadata.json`.
pub fn metadata_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rank_index".to_string());
    path.with_file_name(format!("{stem}_metadata.json"))
}

/// Write entries as a 2-D `int64` array.
pub fn write_rank_index<P: AsRef<Path>>(path: P, entries: &[RankEntry]) -> Result<()> {
    let width = entries.first().map_or(0, |e| e.order.len());
    if let Some(bad) = entries.iter().find(|e| e.order.len() != width) {
        return Err(ExplorerError::Npy(format!(
            "instance {} has {} shape ids, expected {}",
            bad.instance_id,
            bad.order.len(),
            width
        )));
    }

    let mut flat = Vec::with_capacity(entries.len() * (width + 1));
    for entry in entries {
        flat.push(entry.instance_id as i64);
        flat.extend(entry.order.iter().map(|&s| s as i64));
    }

    let array = Array2::from_shape_vec((entries.len(), width + 1), flat)
        .map_err(|e| ExplorerError::Npy(format!("Failed to create array: {e}")))?;

    let file = File::create(path.as_ref())?;
    array
        .write_npy(file)
        .map_err(|e| ExplorerError::Npy(format!("Failed to write rank index: {e}")))
}

/// Read entries written by [`write_rank_index`].
pub fn read_rank_index<P: AsRef<Path>>(path: P) -> Result<Vec<RankEntry>> {
    let file = File::open(path.as_ref())?;
    let array = Array2::<i64>::read_npy(file)
        .map_err(|e| ExplorerError::Npy(format!("{}: {e}", path.as_ref().display())))?;

    array
        .outer_iter()
        .map(|row| -> Result<RankEntry> {
            let to_index = |v: i64| {
                usize::try_from(v)
                    .map_err(|_| ExplorerError::Npy(format!("negative index {v} in rank index")))
            };
            let (&id, rest) = row
                .as_slice()
                .and_then(|s| s.split_first())
                .ok_or_else(|| ExplorerError::Npy("rank index row has no instance id".into()))?;
            Ok(RankEntry {
                instance_id: to_index(id)?,
                order: rest.iter().map(|&v| to_index(v)).collect::<Result<_>>()?,
            })
        })
        .collect()
}
