//! Shape region resolution and two-shape comparison.
//!
//! A shape's region is read from the `arr_1` descriptor
//! `(length, start, end, label)`. The resolver only decodes; whether the
//! region can be highlighted on its series is decided by the comparison
//! builder:
//!
//! - the series is drawn only when `start < T` and `end <= T`
//! - the span is highlighted only when additionally `start < end`
//!
//! An inverted or empty region is therefore "no highlight", never an error.
//!
//! Comparison panels always plot one fixed channel of `x_train` (channel 0
//! by default) regardless of the variable the shape was detected on.

use crate::coords::{CoordinateTranslator, TimeRange};
use crate::error::{ExplorerError, Result};
use crate::render::RenderRequest;
use crate::store::{ArrayStore, TensorKind};
use ndarray::s;

/// Number of leading descriptor fields a region needs.
pub const REGION_FIELDS: usize = 4;

/// Address of one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeRef {
    /// Instance (0-based)
    pub instance: usize,
    /// Shape (0-based)
    pub shape: usize,
}

impl ShapeRef {
    pub fn new(instance: usize, shape: usize) -> Self {
        Self { instance, shape }
    }
}

/// Decoded VP descriptor of one shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeRegion {
    pub shape: ShapeRef,
    pub length: i64,
    pub start: i64,
    pub end: i64,
    /// Variable label as stored (numeric)
    pub label: f64,
}

impl ShapeRegion {
    /// Variable index encoded in the label.
    pub fn variable(&self) -> i64 {
        self.label as i64
    }

    /// Whether the region lies inside a series of `time_length` steps.
    pub fn fits(&self, time_length: usize) -> bool {
        let t = time_length as i64;
        self.start >= 0 && self.start < t && self.end <= t
    }

    /// Span to highlight, or `None` when the region is empty, inverted, or
    /// falls outside the series.
    pub fn highlight_span(&self, time_length: usize) -> Option<TimeRange> {
        if !self.fits(time_length) || self.start >= self.end {
            return None;
        }
        Some(TimeRange {
            start: self.start as usize,
            end: self.end as usize,
        })
    }
}

/// Reads region descriptors from `arr_1`.
#[derive(Debug, Clone, Copy)]
pub struct RegionResolver<'a> {
    store: &'a ArrayStore,
}

impl<'a> RegionResolver<'a> {
    pub fn new(store: &'a ArrayStore) -> Self {
        Self { store }
    }

    /// Resolve the descriptor of one shape.
    ///
    /// `instance` and `shape` are clamped to `arr_1`'s extents. Fails with
    /// `NotLoaded` without `arr_1`, or `MalformedRegion` when the descriptor
    /// axis has fewer than 4 fields.
    pub fn resolve(&self, instance: i64, shape: i64) -> Result<ShapeRegion> {
        let regions = self.store.tensor(TensorKind::ShapeRegions)?;
        let translator = CoordinateTranslator::for_tensor(self.store, TensorKind::ShapeRegions);
        let shape_ref = ShapeRef::new(
            translator.clamp_instance(instance),
            translator.clamp_shape(shape),
        );

        let fields = regions.dim().2;
        if fields < REGION_FIELDS || regions.dim().0 == 0 || regions.dim().1 == 0 {
            return Err(ExplorerError::MalformedRegion {
                instance: shape_ref.instance,
                shape: shape_ref.shape,
                fields,
            });
        }

        let vp = regions.slice(s![shape_ref.instance, shape_ref.shape, ..]);
        Ok(ShapeRegion {
            shape: shape_ref,
            length: vp[0] as i64,
            start: vp[1] as i64,
            end: vp[2] as i64,
            label: vp[3],
        })
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPanel {
    pub region: ShapeRegion,
    /// Full series of the comparison channel; `None` when the region does
    /// not fit the series
    pub series: Option<Vec<f64>>,
    pub highlight: Option<TimeRange>,
    pub title: String,
}

impl ComparisonPanel {
    fn build(store: &ArrayStore, region: ShapeRegion, channel: usize) -> Result<Self> {
        let instances = store.tensor(TensorKind::Instances)?;
        let (count, time_length, variables) = instances.dim();

        let series = if region.fits(time_length)
            && region.shape.instance < count
            && channel < variables
        {
            Some(
                instances
                    .slice(s![region.shape.instance, .., channel])
                    .to_vec(),
            )
        } else {
            None
        };
        let highlight = series
            .as_ref()
            .and_then(|_| region.highlight_span(time_length));

        let title = format!(
            "Instance {}, Shape {}\nTime: {}-{}, Variable: {}",
            region.shape.instance + 1,
            region.shape.shape + 1,
            region.start,
            region.end,
            region.variable()
        );

        Ok(Self {
            region,
            series,
            highlight,
            title,
        })
    }

    pub fn render_requests(&self, label: &str) -> Vec<RenderRequest> {
        let mut requests = vec![RenderRequest::Title(self.title.clone())];
        if let Some(series) = &self.series {
            requests.push(RenderRequest::Line {
                time_axis: (0..series.len()).collect(),
                values: series.clone(),
                label: label.to_string(),
            });
            if let Some(span) = self.highlight {
                requests.push(RenderRequest::HighlightSpan {
                    start: span.start,
                    end: span.end,
                });
                requests.push(RenderRequest::Line {
                    time_axis: (span.start..span.end).collect(),
                    values: series[span.start..span.end].to_vec(),
                    label: "Corresponding Shape".to_string(),
                });
            }
        }
        requests
    }
}

/// Side-by-side view of two shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeComparison {
    pub panels: [ComparisonPanel; 2],
}

impl ShapeComparison {
    pub const TITLE: &'static str = "Heatmap-Based Shape Comparison Analysis";

    /// Build a comparison of two shapes, plotting `channel` of `x_train`.
    pub fn build(store: &ArrayStore, a: (i64, i64), b: (i64, i64), channel: usize) -> Result<Self> {
        let resolver = RegionResolver::new(store);
        let first = resolver.resolve(a.0, a.1)?;
        let second = resolver.resolve(b.0, b.1)?;
        Ok(Self {
            panels: [
                ComparisonPanel::build(store, first, channel)?,
                ComparisonPanel::build(store, second, channel)?,
            ],
        })
    }

    /// Requests for both panels; the outer vector is indexed by panel.
    pub fn render_requests(&self) -> Vec<Vec<RenderRequest>> {
        self.panels
            .iter()
            .enumerate()
            .map(|(i, p)| p.render_requests(&format!("Time Series {}", i + 1)))
            .collect()
    }
}
