//! Tests for npy/npz import and rank index export

use ndarray::{Array2, Array3};
use ndarray_npy::{NpzWriter, ReadNpyExt, WriteNpyExt};
use shape_explorer::export::{metadata_path, ExportMetadata};
use shape_explorer::{
    read_rank_index, ArrayStore, Explorer, ExplorerError, RankIndex, RankIndexExporter, TensorKind,
};
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;

/// Write `arr_0`/`arr_1` the way `np.savez(path, a, b)` does.
fn write_shape_archive(path: &Path, lengths: &Array3<f64>, regions: &Array3<f64>) {
    let mut npz = NpzWriter::new(File::create(path).unwrap());
    npz.add_array("arr_0.npy", lengths).unwrap();
    npz.add_array("arr_1.npy", regions).unwrap();
    npz.finish().unwrap();
}

fn write_npy<A: WriteNpyExt>(path: &Path, array: &A) {
    array.write_npy(File::create(path).unwrap()).unwrap();
}

/// Regions `(3, s, s + 3, s % 2)` for `shapes` shapes per instance.
fn regions(instances: usize, shapes: usize) -> Array3<f64> {
    Array3::from_shape_fn((instances, shapes, 4), |(_, s, f)| match f {
        0 => 3.0,
        1 => s as f64,
        2 => (s + 3) as f64,
        _ => (s % 2) as f64,
    })
}

/// Attention with a different ranking per instance (including ties).
fn attention(instances: usize, shapes: usize, channels: usize) -> Array3<f64> {
    Array3::from_shape_fn((instances, shapes, channels), |(i, s, c)| {
        (((s * 7 + i * 3) % 5) as f64) + c as f64 * 0.25
    })
}

#[test]
fn test_import_primary_from_files() {
    let dir = TempDir::new().unwrap();
    let npz = dir.path().join("shapes.npz");
    let npy = dir.path().join("x_train.npy");

    write_shape_archive(&npz, &Array3::zeros((4, 6, 3)), &regions(4, 6));
    write_npy(&npy, &Array3::<f32>::from_elem((4, 50, 2), 0.5));

    let mut explorer = Explorer::new();
    let report = explorer.import_primary(&npz, &npy).unwrap();

    assert_eq!(report.summary.instance_count, Some(4));
    assert_eq!(report.summary.time_length, Some(50));
    assert_eq!(report.summary.variable_count, Some(2));
    assert_eq!(report.summary.shape_count, Some(6));
    assert!(report.checks.is_valid(), "{report}");
}

#[test]
fn test_import_primary_is_all_or_nothing() {
    let dir = TempDir::new().unwrap();
    let npz = dir.path().join("shapes.npz");
    let bad_npy = dir.path().join("x_train.npy");

    write_shape_archive(&npz, &Array3::zeros((2, 3, 3)), &regions(2, 3));
    // x_train with 2 axes is rejected
    write_npy(&bad_npy, &Array2::<f64>::zeros((2, 50)));

    let mut store = ArrayStore::new();
    let err = store.import_primary(&npz, &bad_npy).unwrap_err();
    assert!(matches!(
        err,
        ExplorerError::ShapeMismatch {
            kind: TensorKind::Instances,
            ..
        }
    ));
    assert!(!store.is_loaded(TensorKind::ShapeLengths));
    assert!(!store.is_loaded(TensorKind::ShapeRegions));
    assert!(!store.is_loaded(TensorKind::Instances));
}

#[test]
fn test_rejected_heatmap_file_keeps_previous() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("heatmap.npy");
    let bad = dir.path().join("bad_heatmap.npy");
    write_npy(&good, &Array3::<f64>::from_elem((5, 10, 10), 1.0));
    write_npy(&bad, &Array3::<f64>::zeros((5, 10, 12)));

    let mut explorer = Explorer::new();
    explorer.import_heatmap(&good).unwrap();
    let err = explorer.import_heatmap(&bad).unwrap_err();

    assert!(matches!(
        err,
        ExplorerError::ShapeMismatch {
            kind: TensorKind::Heatmap,
            ..
        }
    ));
    assert_eq!(
        explorer.store().shape_of(TensorKind::Heatmap),
        Some([5, 10, 10]),
        "Previous heatmap should survive a rejected load"
    );
    assert_eq!(explorer.update_heatmap().unwrap().width(), 10);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let mut explorer = Explorer::new();
    let err = explorer
        .import_attention(dir.path().join("missing.npy"))
        .unwrap_err();
    assert!(matches!(err, ExplorerError::Io(_)));
}

#[test]
fn test_rank_index_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ranked_indices.npy");

    let attention = attention(6, 9, 3);
    let index = RankIndex::compute(&attention, 1);
    RankIndexExporter::new().export(&index, &path).unwrap();

    let entries = read_rank_index(&path).unwrap();
    assert_eq!(entries, index.entries());

    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.instance_id, i + 1);
        assert_eq!(entry.order, index.instance(i).unwrap().perm);
    }
}

#[test]
fn test_exported_array_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ranked_indices.npy");

    let mut attention = Array3::<f64>::zeros((2, 3, 1));
    attention[[0, 0, 0]] = 0.1;
    attention[[0, 1, 0]] = 0.9;
    attention[[0, 2, 0]] = 0.5;
    // instance 2: all tied, identity order
    let index = RankIndex::compute(&attention, 1);
    RankIndexExporter::new().export(&index, &path).unwrap();

    let raw: Array2<i64> = Array2::read_npy(File::open(&path).unwrap()).unwrap();
    assert_eq!(raw, ndarray::arr2(&[[1, 1, 2, 0], [2, 0, 1, 2]]));
    // the order is the row tail, not a nested column
    assert_eq!(raw.dim(), (2, 4));
    let order: Vec<i64> = raw.row(0).iter().skip(1).copied().collect();
    assert_eq!(order, vec![1, 2, 0]);
}

#[test]
fn test_export_writes_metadata_sidecar() {
    let dir = TempDir::new().unwrap();
    let attention_path = dir.path().join("attention.npy");
    let out = dir.path().join("out").join("ranked.npy");
    write_npy(&attention_path, &attention(3, 5, 2));

    let mut explorer = Explorer::new();
    explorer.import_attention(&attention_path).unwrap();
    let written = explorer.export_rank_index(&out).unwrap();

    assert_eq!(written.len(), 2);
    assert!(out.exists());

    let meta: ExportMetadata =
        serde_json::from_reader(File::open(metadata_path(&out)).unwrap()).unwrap();
    assert_eq!(meta.n_instances, 3);
    assert_eq!(meta.n_shapes, 5);
    assert_eq!(meta.n_value_channels, 2);
}

#[test]
fn test_export_without_attention_fails() {
    let dir = TempDir::new().unwrap();
    let explorer = Explorer::new();
    let err = explorer
        .export_rank_index(dir.path().join("ranked.npy"))
        .unwrap_err();
    assert!(matches!(err, ExplorerError::NotLoaded(TensorKind::Attention)));
}
