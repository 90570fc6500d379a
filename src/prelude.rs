//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```ignore
//! use shape_explorer::prelude::*;
//!
//! let mut explorer = Explorer::with_config(ExplorerConfig::default())?;
//! explorer.import_primary("shapes.npz", "x_train.npy")?;
//! let plots = explorer.render_sequences()?;
//! ```
//!
//! # What's Included
//!
//! ## Session
//! - [`Explorer`] - Linked views over one store
//! - [`ExplorerConfig`] - View defaults
//!
//! ## Data
//! - [`ArrayStore`] - Loaded tensors and their generations
//! - [`TensorKind`] - Which tensor a load refers to
//! - [`CoordinateTranslator`] - Clamping of requested coordinates
//!
//! ## Views
//! - [`HeatmapView`] / [`HeatmapWindow`] - Heatmap selector and rendered window
//! - [`AttentionBars`] - Ranked attention bar chart
//! - [`ShapeComparison`] - Two-shape comparison panels
//! - [`SequenceControlSet`] - Sequence plot controls
//!
//! ## Rendering
//! - [`RenderRequest`] - One drawing call
//! - [`RenderSink`] - Trait implemented by the drawing backend

// ============================================================================
// Session
// ============================================================================

pub use crate::config::ExplorerConfig;
pub use crate::error::{ExplorerError, Result};
pub use crate::explorer::{AttentionView, Explorer};

// ============================================================================
// Data
// ============================================================================

pub use crate::coords::{CoordinateTranslator, TimeRange};
pub use crate::store::{ArrayStore, TensorKind};

// ============================================================================
// Views
// ============================================================================

pub use crate::click::{ClickRouter, HeatmapView, HeatmapWindow, ShapePair};
pub use crate::ranking::{AttentionBars, RankEntry, RankIndex};
pub use crate::region::{RegionResolver, ShapeComparison, ShapeRegion};
pub use crate::sequence::{SequenceControlEntry, SequenceControlSet, SequencePlot};

// ============================================================================
// Rendering
// ============================================================================

pub use crate::render::{replay, Colormap, RenderRequest, RenderSink};

// ============================================================================
// Export & Validation
// ============================================================================

pub use crate::export::{read_rank_index, RankIndexExporter};
pub use crate::validation::{DatasetSummary, DatasetValidator, LoadReport, ValidationResult};
