//! Heatmap window and cross-view click routing.
//!
//! The heatmap view shows a square window `[start, end)` of one instance's
//! shape-by-shape matrix. A click at pixel `(x, y)` inside that window maps
//! back to shapes `floor(x) + start` and `floor(y) + start`, which are then
//! compared using the instance currently chosen in the heatmap's own
//! selector. The click carries coordinates only.
//!
//! Clicks that are not finite, fall outside the rendered window, hit a
//! window rendered from a heatmap that has since been replaced, or address
//! shapes beyond `arr_1` are dropped without error.

use crate::coords::{CoordinateTranslator, TimeRange};
use crate::error::Result;
use crate::region::ShapeComparison;
use crate::render::{Colormap, RenderRequest};
use crate::store::{ArrayStore, TensorKind};
use ndarray::{s, Array2};

/// Two shape ids produced by a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapePair {
    pub first: usize,
    pub second: usize,
}

/// Map a click to shape ids: `floor(px) + origin`, `floor(py) + origin`.
///
/// Non-finite or negative coordinates produce no pair.
pub fn route_click(pixel_x: f64, pixel_y: f64, view_origin_shape: usize) -> Option<ShapePair> {
    let cell = |p: f64| -> Option<usize> {
        if !p.is_finite() || p < 0.0 {
            return None;
        }
        let floored = p.floor();
        if floored > usize::MAX as f64 {
            return None;
        }
        (floored as usize).checked_add(view_origin_shape)
    };

    Some(ShapePair {
        first: cell(pixel_x)?,
        second: cell(pixel_y)?,
    })
}

/// Heatmap selector state (0-based requests, not yet clamped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapView {
    /// Selected instance
    pub instance: i64,
    /// First shape of the window
    pub start_shape: i64,
    /// One past the last shape of the window
    pub end_shape: i64,
}

impl Default for HeatmapView {
    fn default() -> Self {
        Self {
            instance: 0,
            start_shape: 0,
            end_shape: 10,
        }
    }
}

impl HeatmapView {
    /// Clamp the request against the loaded heatmap and extract the window.
    pub fn window(&self, store: &ArrayStore, colormap: Colormap) -> Result<HeatmapWindow> {
        let heatmap = store.tensor(TensorKind::Heatmap)?;
        let translator = CoordinateTranslator::for_tensor(store, TensorKind::Heatmap);

        let instance = translator.clamp_instance(self.instance);
        let shapes = translator.clamp_shape_range(self.start_shape, self.end_shape);
        if (self.start_shape, self.end_shape) != (shapes.start as i64, shapes.end as i64) {
            log::debug!(
                "Heatmap window {}..{} clamped to {}..{}",
                self.start_shape,
                self.end_shape,
                shapes.start,
                shapes.end
            );
        }

        // no instances: nothing to cut, the window is empty
        let (shapes, values) = if heatmap.dim().0 == 0 {
            (TimeRange { start: 0, end: 0 }, Array2::zeros((0, 0)))
        } else {
            let values = heatmap
                .slice(s![instance, shapes.start..shapes.end, shapes.start..shapes.end])
                .to_owned();
            (shapes, values)
        };

        Ok(HeatmapWindow {
            instance,
            shapes,
            values,
            colormap,
            generation: store.generation(TensorKind::Heatmap),
        })
    }
}

/// A rendered heatmap window.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapWindow {
    /// Instance shown (0-based)
    pub instance: usize,
    /// Shape window `[start, end)`
    pub shapes: TimeRange,
    pub values: Array2<f64>,
    pub colormap: Colormap,
    generation: u64,
}

impl HeatmapWindow {
    /// Shape index of the window's first row and column.
    pub fn origin(&self) -> usize {
        self.shapes.start
    }

    /// Rows (and columns) in the window.
    pub fn width(&self) -> usize {
        self.shapes.len()
    }

    /// `(min, max)` of the window, for the colour bar.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values.iter().copied().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    pub fn title(&self) -> String {
        format!(
            "Heatmap: Instance {}, Shapes {}-{}",
            self.instance + 1,
            self.shapes.start + 1,
            self.shapes.end
        )
    }

    pub fn render_requests(&self) -> Vec<RenderRequest> {
        vec![
            RenderRequest::Title(self.title()),
            RenderRequest::Matrix {
                values: self.values.clone(),
                colormap: self.colormap,
            },
        ]
    }

    /// Whether this window was cut from the heatmap now in the store.
    pub fn is_current(&self, store: &ArrayStore) -> bool {
        store.is_loaded(TensorKind::Heatmap)
            && store.generation(TensorKind::Heatmap) == self.generation
    }
}

/// Bounds of the last rendered window, used to interpret clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowBounds {
    origin: usize,
    width: usize,
    generation: u64,
}

/// Turns heatmap clicks into shape comparisons.
#[derive(Debug, Clone, Default)]
pub struct ClickRouter {
    bounds: Option<WindowBounds>,
}

impl ClickRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the window the user is looking at.
    pub fn set_window(&mut self, window: &HeatmapWindow) {
        self.bounds = Some(WindowBounds {
            origin: window.origin(),
            width: window.width(),
            generation: window.generation,
        });
    }

    pub fn clear(&mut self) {
        self.bounds = None;
    }

    /// Resolve a click to a shape pair, or `None` if it should be ignored.
    pub fn locate(&self, store: &ArrayStore, pixel_x: f64, pixel_y: f64) -> Option<ShapePair> {
        let bounds = match self.bounds {
            Some(b) if store.generation(TensorKind::Heatmap) == b.generation => b,
            Some(_) => {
                log::debug!("Dropped click on stale heatmap window");
                return None;
            }
            None => return None,
        };

        let pair = route_click(pixel_x, pixel_y, bounds.origin)?;
        let end = bounds.origin + bounds.width;
        if pair.first >= end || pair.second >= end {
            log::debug!("Dropped click outside window at ({pixel_x}, {pixel_y})");
            return None;
        }
        Some(pair)
    }

    /// Route a click into a comparison of the two shapes for `selected_instance`.
    ///
    /// Any click that cannot be resolved (outside the window, shapes beyond
    /// `arr_1`, primary data missing) produces `None`.
    pub fn on_click(
        &self,
        store: &ArrayStore,
        pixel_x: f64,
        pixel_y: f64,
        selected_instance: i64,
        channel: usize,
    ) -> Option<ShapeComparison> {
        let pair = self.locate(store, pixel_x, pixel_y)?;

        let [instances, shapes, _] = store.shape_of(TensorKind::ShapeRegions)?;
        let in_range = selected_instance >= 0
            && (selected_instance as u64) < instances as u64
            && pair.first < shapes
            && pair.second < shapes;
        if !in_range {
            log::debug!(
                "Dropped click: instance {} shapes ({}, {}) outside region data",
                selected_instance + 1,
                pair.first + 1,
                pair.second + 1
            );
            return None;
        }

        match ShapeComparison::build(
            store,
            (selected_instance, pair.first as i64),
            (selected_instance, pair.second as i64),
            channel,
        ) {
            Ok(cmp) => Some(cmp),
            Err(e) => {
                log::debug!("Dropped click: {e}");
                None
            }
        }
    }
}
