//! NumPy file import.
//!
//! Arrays may be stored as `f64`, `f32`, `i64` or `i32`; all are widened to
//! `f64`. Rank checks happen in the store, not here, so a 2-D file reaches
//! [`ArrayStore::load`] and is rejected there with `ShapeMismatch`.

use super::{ArrayStore, TensorKind};
use crate::error::{ExplorerError, Result};
use ndarray::ArrayD;
use ndarray_npy::{NpzReader, ReadNpyExt};
use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::Path;

/// Entry holding per-shape descriptors inside the primary `.npz` archive.
pub const SHAPE_LENGTHS_ENTRY: &str = "arr_0";

/// Entry holding per-shape region descriptors inside the primary `.npz` archive.
pub const SHAPE_REGIONS_ENTRY: &str = "arr_1";

/// Decode an in-memory `.npy` payload into an `f64` tensor.
pub fn decode_npy(bytes: &[u8]) -> Result<ArrayD<f64>> {
    ArrayD::<f64>::read_npy(bytes)
        .or_else(|_| ArrayD::<f32>::read_npy(bytes).map(|a| a.mapv(f64::from)))
        .or_else(|_| ArrayD::<i64>::read_npy(bytes).map(|a| a.mapv(|v| v as f64)))
        .or_else(|_| ArrayD::<i32>::read_npy(bytes).map(|a| a.mapv(f64::from)))
        .map_err(|e| ExplorerError::Npy(e.to_string()))
}

/// Read a `.npy` file into an `f64` tensor.
pub fn read_npy_file<P: AsRef<Path>>(path: P) -> Result<ArrayD<f64>> {
    let bytes = fs::read(path.as_ref())?;
    decode_npy(&bytes).map_err(|e| match e {
        ExplorerError::Npy(msg) => {
            ExplorerError::Npy(format!("{}: {msg}", path.as_ref().display()))
        }
        other => other,
    })
}

/// Read one named entry from an open `.npz` archive.
///
/// numpy's `savez` stores entries as `arr_0.npy`; both that form and the
/// bare name are accepted.
pub fn read_npz_entry<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Result<ArrayD<f64>> {
    let names = npz
        .names()
        .map_err(|e| ExplorerError::Npy(e.to_string()))?;
    let with_ext = format!("{name}.npy");
    let entry = names
        .iter()
        .find(|n| n.as_str() == with_ext || n.as_str() == name)
        .cloned()
        .ok_or_else(|| {
            ExplorerError::Npy(format!("archive has no entry '{name}' (found {names:?})"))
        })?;

    npz.by_name::<_, ndarray::IxDyn>(&entry)
        .map_err(|e| e.to_string())
        .or_else(|_| {
            npz.by_name::<ndarray::OwnedRepr<f32>, ndarray::IxDyn>(&entry)
                .map(|a| a.mapv(f64::from))
                .map_err(|e| e.to_string())
        })
        .or_else(|_| {
            npz.by_name::<ndarray::OwnedRepr<i64>, ndarray::IxDyn>(&entry)
                .map(|a| a.mapv(|v| v as f64))
                .map_err(|e| e.to_string())
        })
        .or_else(|_| {
            npz.by_name::<ndarray::OwnedRepr<i32>, ndarray::IxDyn>(&entry)
                .map(|a| a.mapv(f64::from))
                .map_err(|e| e.to_string())
        })
        .map_err(|msg| ExplorerError::Npy(format!("entry '{entry}': {msg}")))
}

/// Read `arr_0` and `arr_1` from the primary `.npz` archive.
pub fn read_shape_archive<P: AsRef<Path>>(path: P) -> Result<(ArrayD<f64>, ArrayD<f64>)> {
    let file = File::open(path.as_ref())?;
    let mut npz = NpzReader::new(file).map_err(|e| ExplorerError::Npy(e.to_string()))?;
    let lengths = read_npz_entry(&mut npz, SHAPE_LENGTHS_ENTRY)?;
    let regions = read_npz_entry(&mut npz, SHAPE_REGIONS_ENTRY)?;
    Ok((lengths, regions))
}

impl ArrayStore {
    /// Import the primary dataset: shape archive (`.npz`) plus `x_train` (`.npy`).
    ///
    /// Both files are read and all three tensors validated before the store
    /// is touched.
    pub fn import_primary<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        npz_path: P,
        npy_path: Q,
    ) -> Result<u64> {
        let (lengths, regions) = read_shape_archive(npz_path)?;
        let instances = read_npy_file(npy_path)?;
        self.load_primary(lengths, regions, instances)
    }

    /// Import a single-tensor `.npy` file as `kind`.
    pub fn import_npy<P: AsRef<Path>>(&mut self, kind: TensorKind, path: P) -> Result<u64> {
        let tensor = read_npy_file(path)?;
        self.load(kind, tensor)
    }
}
