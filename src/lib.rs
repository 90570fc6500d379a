//! Shape Explorer
//!
//! Data-addressing and cross-view linking engine for exploring shapes
//! extracted from time-series instances.
//!
//! # Overview
//!
//! An analyst loads a primary dataset (`x_train` plus the `arr_0`/`arr_1`
//! shape descriptors) and, optionally, heatmap and attention tensors. The
//! engine decides what each linked view should draw:
//!
//! - **Sequences**: up to 4 independent line plots of `x_train`
//! - **Heatmap**: a square shape-by-shape window of one instance
//! - **Attention**: shapes ranked by mean attention, highest first
//! - **Comparison**: two shapes side by side, triggered by heatmap clicks
//!
//! Drawing itself is left to a [`render::RenderSink`] implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Shape Explorer                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  store/      - Tensor ownership, load validation, npy/npz import│
//! │  coords      - Saturating clamps for every coordinate space     │
//! │  ranking     - Per-instance attention ranking and rank index    │
//! │  region      - VP descriptors and two-shape comparisons         │
//! │  click       - Heatmap window and click routing                 │
//! │  sequence/   - Sequence control set                             │
//! │  export      - Rank index export for Python/NumPy               │
//! │  explorer    - Session tying the views to one store             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use shape_explorer::prelude::*;
//!
//! let mut explorer = Explorer::new();
//! explorer.import_primary("shapes.npz", "x_train.npy")?;
//! explorer.import_attention("attention.npy")?;
//!
//! let bars = explorer.attention_bars()?;
//! explorer.export_rank_index("ranked_indices.npy")?;
//! ```

pub mod click;
pub mod config;
pub mod coords;
pub mod error;
pub mod explorer;
pub mod export;
pub mod prelude;
pub mod ranking;
pub mod region;
pub mod render;
pub mod sequence;
pub mod store;
pub mod validation;

// Re-exports - Core
pub use error::{ExplorerError, Result};
pub use explorer::{AttentionView, Explorer};
pub use store::{ArrayStore, TensorKind};

// Re-exports - Config
pub use config::{
    AttentionSettings, ComparisonSettings, ExplorerConfig, HeatmapSettings, SequenceSettings,
};

// Re-exports - Views
pub use click::{route_click, ClickRouter, HeatmapView, HeatmapWindow, ShapePair};
pub use coords::{CoordinateTranslator, TimeRange};
pub use ranking::{rank, AttentionBars, RankEntry, RankIndex, RankedShapes};
pub use region::{ComparisonPanel, RegionResolver, ShapeComparison, ShapeRef, ShapeRegion};
pub use render::{Colormap, RenderRequest, RenderSink};
pub use sequence::{SequenceControlEntry, SequenceControlSet, SequencePlot};

// Re-exports - Export
pub use export::{read_rank_index, ExportMetadata, RankIndexExporter};

// Re-exports - Validation
pub use validation::{
    Check, DatasetSummary, DatasetValidator, LoadReport, ValidationConfig, ValidationLevel,
    ValidationResult,
};
