//! Explorer session: the linked views over one array store.
//!
//! The session owns the store and every piece of derived state that depends
//! on it (rank index, heatmap selector, click router, sequence controls), so
//! a load and the recomputation it triggers happen inside one `&mut self`
//! call and can never be observed half-done by a render call.
//!
//! # Example
//!
//! ```ignore
//! use shape_explorer::Explorer;
//!
//! let mut explorer = Explorer::new();
//! let report = explorer.import_primary("shapes.npz", "x_train.npy")?;
//! println!("{report}");
//!
//! explorer.import_heatmap("heatmap.npy")?;
//! let window = explorer.update_heatmap()?;
//!
//! // user clicks cell (2, 5) of the rendered window
//! if let Some(comparison) = explorer.click_heatmap(2.0, 5.0) {
//!     for panel in comparison.render_requests() {
//!         shape_explorer::render::replay(&panel, &mut sink);
//!     }
//! }
//! ```

use crate::click::{ClickRouter, HeatmapView, HeatmapWindow};
use crate::config::ExplorerConfig;
use crate::coords::CoordinateTranslator;
use crate::error::{ExplorerError, Result};
use crate::export::RankIndexExporter;
use crate::ranking::{AttentionBars, RankIndex};
use crate::region::ShapeComparison;
use crate::render::RenderRequest;
use crate::sequence::{SequenceControlSet, SequencePlot};
use crate::store::{ArrayStore, TensorKind};
use crate::validation::{DatasetSummary, DatasetValidator, LoadReport, ValidationResult};
use ndarray::ArrayD;
use std::path::{Path, PathBuf};

/// Attention bar selector (0-based requests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionView {
    pub instance: i64,
    pub top_count: i64,
}

/// One exploration session.
#[derive(Debug, Clone)]
pub struct Explorer {
    config: ExplorerConfig,
    store: ArrayStore,
    ranks: Option<RankIndex>,
    heatmap_view: HeatmapView,
    attention_view: AttentionView,
    router: ClickRouter,
    sequences: SequenceControlSet,
}

impl Default for Explorer {
    fn default() -> Self {
        Self::build(ExplorerConfig::default())
    }
}

impl Explorer {
    /// Session with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with custom settings; the configuration is validated first.
    pub fn with_config(config: ExplorerConfig) -> Result<Self> {
        config.validate().map_err(ExplorerError::Config)?;
        Ok(Self::build(config))
    }

    fn build(config: ExplorerConfig) -> Self {
        let seq = &config.sequence;
        let sequences = SequenceControlSet::new(seq.plot_count, seq.default_entry, seq.max_plots);
        let attention_view = AttentionView {
            instance: 0,
            top_count: config.attention.top_count as i64,
        };
        Self {
            config,
            store: ArrayStore::new(),
            ranks: None,
            heatmap_view: HeatmapView::default(),
            attention_view,
            router: ClickRouter::new(),
            sequences,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn store(&self) -> &ArrayStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Import the shape archive and `x_train`, then report on the dataset.
    ///
    /// Failed consistency checks are logged and returned in the report; they
    /// never undo the load.
    pub fn import_primary<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        npz_path: P,
        npy_path: Q,
    ) -> Result<LoadReport> {
        self.store.import_primary(npz_path, npy_path)?;
        Ok(self.after_primary_load())
    }

    /// In-memory counterpart of [`Explorer::import_primary`].
    pub fn load_primary(
        &mut self,
        shape_lengths: ArrayD<f64>,
        shape_regions: ArrayD<f64>,
        instances: ArrayD<f64>,
    ) -> Result<LoadReport> {
        self.store
            .load_primary(shape_lengths, shape_regions, instances)?;
        Ok(self.after_primary_load())
    }

    fn after_primary_load(&self) -> LoadReport {
        let report = LoadReport::from_store(&self.store);
        report.log_problems();
        report
    }

    pub fn import_heatmap<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.store.import_npy(TensorKind::Heatmap, path)?;
        self.after_heatmap_load();
        Ok(())
    }

    pub fn load_heatmap(&mut self, tensor: ArrayD<f64>) -> Result<()> {
        self.store.load(TensorKind::Heatmap, tensor)?;
        self.after_heatmap_load();
        Ok(())
    }

    /// Reset the window to the first `min(window_span, shapes)` shapes.
    fn after_heatmap_load(&mut self) {
        let shapes = self
            .store
            .shape_of(TensorKind::Heatmap)
            .map_or(0, |[_, s, _]| s);
        self.heatmap_view.start_shape = 0;
        self.heatmap_view.end_shape = self.config.heatmap.window_span.min(shapes) as i64;
        self.router.clear();
    }

    pub fn import_attention<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.store.import_npy(TensorKind::Attention, path)?;
        self.after_attention_load()
    }

    pub fn load_attention(&mut self, tensor: ArrayD<f64>) -> Result<()> {
        self.store.load(TensorKind::Attention, tensor)?;
        self.after_attention_load()
    }

    /// Re-rank every instance and cap the bar count at the shape count.
    fn after_attention_load(&mut self) -> Result<()> {
        let index = RankIndex::from_store(&self.store)?;
        self.attention_view.top_count =
            self.config.attention.top_count.min(index.shape_count()) as i64;
        self.ranks = Some(index);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Heatmap and click routing
    // ------------------------------------------------------------------

    pub fn heatmap_view(&self) -> HeatmapView {
        self.heatmap_view
    }

    /// Replace the heatmap selector. Takes effect on the next update.
    pub fn set_heatmap_view(&mut self, view: HeatmapView) {
        self.heatmap_view = view;
    }

    /// Cut the selected window and make it the target for clicks.
    pub fn update_heatmap(&mut self) -> Result<HeatmapWindow> {
        let window = self
            .heatmap_view
            .window(&self.store, self.config.heatmap.colormap)?;
        self.router.set_window(&window);
        Ok(window)
    }

    /// Compare the two shapes under a click on the last rendered window.
    ///
    /// The instance comes from the heatmap selector, not from the click.
    pub fn click_heatmap(&self, pixel_x: f64, pixel_y: f64) -> Option<ShapeComparison> {
        let selected = CoordinateTranslator::for_tensor(&self.store, TensorKind::Heatmap)
            .clamp_instance(self.heatmap_view.instance);
        self.router.on_click(
            &self.store,
            pixel_x,
            pixel_y,
            selected as i64,
            self.config.comparison.channel,
        )
    }

    /// Compare two arbitrary shapes; indices are clamped to `arr_1`.
    pub fn compare_positions(&self, a: (i64, i64), b: (i64, i64)) -> Result<ShapeComparison> {
        ShapeComparison::build(&self.store, a, b, self.config.comparison.channel)
    }

    // ------------------------------------------------------------------
    // Attention
    // ------------------------------------------------------------------

    /// Rank index for the attention tensor currently loaded.
    pub fn rank_index(&self) -> Option<&RankIndex> {
        self.ranks
            .as_ref()
            .filter(|index| index.is_current(&self.store))
    }

    pub fn attention_view(&self) -> AttentionView {
        self.attention_view
    }

    pub fn set_attention_view(&mut self, view: AttentionView) {
        self.attention_view = view;
    }

    pub fn attention_bars(&self) -> Result<AttentionBars> {
        let index = self
            .rank_index()
            .ok_or(ExplorerError::NotLoaded(TensorKind::Attention))?;
        Ok(index.top_bars(self.attention_view.instance, self.attention_view.top_count))
    }

    /// Annotation for a hovered bar of the current chart.
    pub fn hover_attention(&self, bar: usize) -> Option<RenderRequest> {
        self.attention_bars().ok()?.hover(bar)
    }

    /// Write the rank index (plus metadata sidecar) to `path`.
    pub fn export_rank_index<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>> {
        let index = self
            .rank_index()
            .ok_or(ExplorerError::NotLoaded(TensorKind::Attention))?;
        RankIndexExporter::new().with_metadata(true).export(index, path)
    }

    // ------------------------------------------------------------------
    // Sequences
    // ------------------------------------------------------------------

    pub fn sequences(&self) -> &SequenceControlSet {
        &self.sequences
    }

    pub fn sequences_mut(&mut self) -> &mut SequenceControlSet {
        &mut self.sequences
    }

    pub fn resize_sequences(&mut self, n: usize) -> usize {
        self.sequences.resize(n)
    }

    pub fn render_sequences(&self) -> Result<Vec<SequencePlot>> {
        self.sequences.render(&self.store)
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::from_store(&self.store)
    }

    pub fn validate(&self) -> ValidationResult {
        DatasetValidator::new().validate(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, IxDyn};

    fn loaded() -> Explorer {
        let mut explorer = Explorer::new();
        let regions = Array3::from_shape_fn((2, 30, 4), |(_, s, f)| match f {
            0 => 3.0,
            1 => s as f64,
            2 => (s + 3) as f64,
            _ => 1.0,
        });
        explorer
            .load_primary(
                ArrayD::zeros(IxDyn(&[2, 30, 3])),
                regions.into_dyn(),
                Array3::from_shape_fn((2, 40, 2), |(i, t, v)| (i * 1000 + t * 10 + v) as f64)
                    .into_dyn(),
            )
            .unwrap();
        explorer
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = ExplorerConfig::default().with_plot_count(0);
        let err = Explorer::with_config(config).unwrap_err();
        assert!(matches!(err, ExplorerError::Config(_)));
    }

    #[test]
    fn test_heatmap_load_sets_window_span() {
        let mut explorer = loaded();
        explorer
            .load_heatmap(ArrayD::zeros(IxDyn(&[2, 30, 30])))
            .unwrap();
        assert_eq!(explorer.heatmap_view().end_shape, 20);

        explorer
            .load_heatmap(ArrayD::zeros(IxDyn(&[2, 6, 6])))
            .unwrap();
        assert_eq!(explorer.heatmap_view().end_shape, 6);
    }

    #[test]
    fn test_click_uses_selector_instance() {
        let mut explorer = loaded();
        explorer
            .load_heatmap(ArrayD::zeros(IxDyn(&[2, 30, 30])))
            .unwrap();
        explorer.set_heatmap_view(HeatmapView {
            instance: 1,
            start_shape: 10,
            end_shape: 20,
        });
        assert!(explorer.click_heatmap(2.0, 5.0).is_none());

        explorer.update_heatmap().unwrap();
        let cmp = explorer.click_heatmap(2.0, 5.0).unwrap();
        assert_eq!(cmp.panels[0].region.shape.instance, 1);
        assert_eq!(cmp.panels[0].region.shape.shape, 12);
        assert_eq!(cmp.panels[1].region.shape.shape, 15);
    }

    #[test]
    fn test_reloading_heatmap_invalidates_clicks() {
        let mut explorer = loaded();
        explorer
            .load_heatmap(ArrayD::zeros(IxDyn(&[2, 30, 30])))
            .unwrap();
        explorer.update_heatmap().unwrap();
        assert!(explorer.click_heatmap(1.0, 1.0).is_some());

        explorer
            .load_heatmap(ArrayD::zeros(IxDyn(&[2, 30, 30])))
            .unwrap();
        assert!(explorer.click_heatmap(1.0, 1.0).is_none());
    }

    #[test]
    fn test_attention_bars_follow_reload() {
        let mut explorer = loaded();
        assert!(matches!(
            explorer.attention_bars(),
            Err(ExplorerError::NotLoaded(TensorKind::Attention))
        ));

        let attention = Array3::from_shape_fn((2, 4, 2), |(_, s, _)| s as f64);
        explorer.load_attention(attention.into_dyn()).unwrap();
        let bars = explorer.attention_bars().unwrap();
        assert_eq!(bars.original_ids, vec![3, 2, 1, 0]);
        assert_eq!(explorer.attention_view().top_count, 4);

        let reversed = Array3::from_shape_fn((2, 4, 2), |(_, s, _)| -(s as f64));
        explorer.load_attention(reversed.into_dyn()).unwrap();
        assert_eq!(explorer.attention_bars().unwrap().original_ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_rejected_attention_keeps_ranks() {
        let mut explorer = loaded();
        let attention = Array3::from_shape_fn((1, 3, 1), |(_, s, _)| s as f64);
        explorer.load_attention(attention.into_dyn()).unwrap();

        assert!(explorer
            .load_attention(ArrayD::zeros(IxDyn(&[3, 3])))
            .is_err());
        assert!(explorer.rank_index().is_some());
        assert_eq!(
            explorer.hover_attention(0),
            Some(RenderRequest::Annotation {
                position: (0.0, 2.0),
                text: "Original Idx: 2".to_string(),
            })
        );
    }

    #[test]
    fn test_render_sequences_after_resize() {
        let mut explorer = loaded();
        assert_eq!(explorer.resize_sequences(3), 3);
        let plots = explorer.render_sequences().unwrap();
        assert_eq!(plots.len(), 3);
        assert!(plots.iter().all(|p| p.time_axis.len() == 40));
    }
}
