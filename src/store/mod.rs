//! Array store: the five loaded tensors and their extents.
//!
//! # Tensors
//!
//! | Kind | Source name | Axes |
//! |------|-------------|------|
//! | Instances | `x_train` | (instance, time, variable) |
//! | ShapeLengths | `arr_0` | (instance, shape, descriptor) |
//! | ShapeRegions | `arr_1` | (instance, shape, VP field) |
//! | Heatmap | heatmap file | (instance, shape, shape) |
//! | Attention | attention file | (instance, shape, value channel) |
//!
//! # Generations
//!
//! Every successful load stamps its kind with a fresh value from a
//! monotonically increasing counter. Derived state (rank index, cached
//! heatmap window) remembers the stamp of the tensor it was computed from
//! and is discarded when the stamp moves. A rejected load never touches the
//! store, so the previous tensor and its stamp remain valid.

pub mod import;

use crate::error::{ExplorerError, Result};
use ndarray::{Array3, ArrayD, Ix3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tensor a load or query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TensorKind {
    /// Primary time-series tensor (`x_train`)
    Instances,
    /// Per-shape fixed-length descriptors (`arr_0`)
    ShapeLengths,
    /// Per-shape `(length, start, end, label)` descriptors (`arr_1`)
    ShapeRegions,
    /// Square shape-by-shape affinity matrices
    Heatmap,
    /// Per-shape value channels used for ranking
    Attention,
}

impl TensorKind {
    /// All kinds, in slot order.
    pub const ALL: [TensorKind; 5] = [
        TensorKind::Instances,
        TensorKind::ShapeLengths,
        TensorKind::ShapeRegions,
        TensorKind::Heatmap,
        TensorKind::Attention,
    ];

    /// Number of axes every tensor of this kind must have.
    pub fn expected_rank(&self) -> usize {
        3
    }

    /// Name used in reports and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            TensorKind::Instances => "x_train",
            TensorKind::ShapeLengths => "arr_0",
            TensorKind::ShapeRegions => "arr_1",
            TensorKind::Heatmap => "heatmap",
            TensorKind::Attention => "attention",
        }
    }

    /// Axis names, for error messages.
    fn axes(&self) -> &'static str {
        match self {
            TensorKind::Instances => "(instance, time, variable)",
            TensorKind::ShapeLengths => "(instance, shape, descriptor)",
            TensorKind::ShapeRegions => "(instance, shape, field)",
            TensorKind::Heatmap => "(instance, shape, shape)",
            TensorKind::Attention => "(instance, shape, value)",
        }
    }

    fn slot(&self) -> usize {
        match self {
            TensorKind::Instances => 0,
            TensorKind::ShapeLengths => 1,
            TensorKind::ShapeRegions => 2,
            TensorKind::Heatmap => 3,
            TensorKind::Attention => 4,
        }
    }
}

impl fmt::Display for TensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Check rank and kind-specific invariants, converting to a 3-axis tensor.
///
/// Does not touch any store; used to validate every part of a combined load
/// before the first mutation.
pub fn validate_tensor(kind: TensorKind, tensor: ArrayD<f64>) -> Result<Array3<f64>> {
    if tensor.ndim() != kind.expected_rank() {
        return Err(ExplorerError::shape_mismatch(
            kind,
            format!(
                "expected {} axes {}, got shape {:?}",
                kind.expected_rank(),
                kind.axes(),
                tensor.shape()
            ),
        ));
    }

    let tensor = tensor
        .into_dimensionality::<Ix3>()
        .map_err(|e| ExplorerError::shape_mismatch(kind, e.to_string()))?;

    if kind == TensorKind::Heatmap {
        let (_, rows, cols) = tensor.dim();
        if rows != cols {
            return Err(ExplorerError::shape_mismatch(
                kind,
                format!("trailing axes must be equal, got {rows} x {cols}"),
            ));
        }
    }

    Ok(tensor)
}

/// Owner of all loaded tensor data.
#[derive(Debug, Clone, Default)]
pub struct ArrayStore {
    tensors: [Option<Array3<f64>>; 5],
    generations: [u64; 5],
    counter: u64,
}

impl ArrayStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and install a tensor, replacing any prior tensor of that kind.
    ///
    /// Returns the new generation stamp for `kind`. On failure the store is
    /// left exactly as it was.
    pub fn load(&mut self, kind: TensorKind, tensor: ArrayD<f64>) -> Result<u64> {
        let tensor = match validate_tensor(kind, tensor) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Rejected {kind} load: {e}");
                return Err(e);
            }
        };
        Ok(self.install(kind, tensor))
    }

    /// Load `arr_0`, `arr_1` and `x_train` as one operation.
    ///
    /// All three are validated before any is installed, so a failure in any
    /// part leaves the store untouched.
    pub fn load_primary(
        &mut self,
        shape_lengths: ArrayD<f64>,
        shape_regions: ArrayD<f64>,
        instances: ArrayD<f64>,
    ) -> Result<u64> {
        let validated = validate_tensor(TensorKind::ShapeLengths, shape_lengths).and_then(
            |lengths| {
                let regions = validate_tensor(TensorKind::ShapeRegions, shape_regions)?;
                let instances = validate_tensor(TensorKind::Instances, instances)?;
                Ok((lengths, regions, instances))
            },
        );

        let (lengths, regions, instances) = match validated {
            Ok(parts) => parts,
            Err(e) => {
                log::warn!("Rejected primary load: {e}");
                return Err(e);
            }
        };

        self.install(TensorKind::ShapeLengths, lengths);
        self.install(TensorKind::ShapeRegions, regions);
        Ok(self.install(TensorKind::Instances, instances))
    }

    fn install(&mut self, kind: TensorKind, tensor: Array3<f64>) -> u64 {
        log::info!("Loaded {kind}: shape {:?}", tensor.shape());
        self.counter += 1;
        self.tensors[kind.slot()] = Some(tensor);
        self.generations[kind.slot()] = self.counter;
        self.counter
    }

    /// Borrow a loaded tensor.
    pub fn tensor(&self, kind: TensorKind) -> Result<&Array3<f64>> {
        self.tensors[kind.slot()]
            .as_ref()
            .ok_or(ExplorerError::NotLoaded(kind))
    }

    /// Whether a tensor of this kind is present.
    pub fn is_loaded(&self, kind: TensorKind) -> bool {
        self.tensors[kind.slot()].is_some()
    }

    /// Generation stamp of the current tensor of this kind (0 if never loaded).
    pub fn generation(&self, kind: TensorKind) -> u64 {
        self.generations[kind.slot()]
    }

    /// Shape of a loaded tensor, if present.
    pub fn shape_of(&self, kind: TensorKind) -> Option<[usize; 3]> {
        self.tensors[kind.slot()].as_ref().map(|t| {
            let (a, b, c) = t.dim();
            [a, b, c]
        })
    }

    /// Number of instances in `x_train`.
    pub fn instance_count(&self) -> Result<usize> {
        Ok(self.tensor(TensorKind::Instances)?.dim().0)
    }

    /// Number of shapes per instance in `arr_0`.
    pub fn shape_count(&self) -> Result<usize> {
        Ok(self.tensor(TensorKind::ShapeLengths)?.dim().1)
    }

    /// Time steps per instance in `x_train`.
    pub fn time_length(&self) -> Result<usize> {
        Ok(self.tensor(TensorKind::Instances)?.dim().1)
    }

    /// Variables per time step in `x_train`.
    pub fn variable_count(&self) -> Result<usize> {
        Ok(self.tensor(TensorKind::Instances)?.dim().2)
    }
}
