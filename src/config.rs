//! Explorer configuration.
//!
//! Defaults for every view, with serialization support so an analysis
//! session's view settings can be saved alongside the data.
//!
//! # Features
//!
//! - **Unified Configuration**: One struct covering every view
//! - **Serialization**: Save/load configurations to TOML or JSON
//! - **Validation**: Ensure configurations are valid before use
//!
//! # Example
//!
//! ```ignore
//! use shape_explorer::config::ExplorerConfig;
//!
//! let config = ExplorerConfig::default().with_plot_count(4);
//! config.save_toml("session.toml")?;
//!
//! let loaded = ExplorerConfig::load_toml("session.toml")?;
//! let explorer = Explorer::with_config(loaded)?;
//! ```

use crate::render::Colormap;
use crate::sequence::{SequenceControlEntry, MAX_SEQUENCE_PLOTS};
use std::fs;
use std::path::Path;

/// Unified explorer configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExplorerConfig {
    /// Sequence plot defaults
    #[serde(default)]
    pub sequence: SequenceSettings,

    /// Heatmap view defaults
    #[serde(default)]
    pub heatmap: HeatmapSettings,

    /// Attention bar view defaults
    #[serde(default)]
    pub attention: AttentionSettings,

    /// Shape comparison settings
    #[serde(default)]
    pub comparison: ComparisonSettings,
}

/// Sequence plot defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceSettings {
    /// Number of plots shown initially
    pub plot_count: usize,

    /// Maximum number of plots (at most 4)
    pub max_plots: usize,

    /// Entry used for newly created plots
    pub default_entry: SequenceControlEntry,
}

/// Heatmap view defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HeatmapSettings {
    /// Shapes shown after a heatmap load (capped at the shape count)
    pub window_span: usize,

    /// Colour map for the matrix
    pub colormap: Colormap,
}

/// Attention bar view defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttentionSettings {
    /// Bars shown after an attention load (capped at the shape count)
    pub top_count: usize,
}

/// Shape comparison settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComparisonSettings {
    /// `x_train` channel plotted in comparison panels.
    ///
    /// Panels plot this channel whatever variable the shape's label names.
    pub channel: usize,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            plot_count: 2,
            max_plots: MAX_SEQUENCE_PLOTS,
            default_entry: SequenceControlEntry::default(),
        }
    }
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            window_span: 20,
            colormap: Colormap::Viridis,
        }
    }
}

impl Default for AttentionSettings {
    fn default() -> Self {
        Self { top_count: 15 }
    }
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self { channel: 0 }
    }
}

impl ExplorerConfig {
    /// Create default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial number of sequence plots.
    pub fn with_plot_count(mut self, count: usize) -> Self {
        self.sequence.plot_count = count;
        self
    }

    /// Set the entry used for new sequence plots.
    pub fn with_default_entry(mut self, entry: SequenceControlEntry) -> Self {
        self.sequence.default_entry = entry;
        self
    }

    /// Set the heatmap window span applied on load.
    pub fn with_heatmap_span(mut self, span: usize) -> Self {
        self.heatmap.window_span = span;
        self
    }

    /// Set the heatmap colour map.
    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.heatmap.colormap = colormap;
        self
    }

    /// Set the attention bar count applied on load.
    pub fn with_attention_top(mut self, count: usize) -> Self {
        self.attention.top_count = count;
        self
    }

    /// Set the channel plotted in comparisons.
    pub fn with_comparison_channel(mut self, channel: usize) -> Self {
        self.comparison.channel = channel;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        let seq = &self.sequence;
        if seq.max_plots == 0 || seq.max_plots > MAX_SEQUENCE_PLOTS {
            return Err(format!(
                "max_plots must be in 1..={MAX_SEQUENCE_PLOTS}, got {}",
                seq.max_plots
            ));
        }

        if seq.plot_count == 0 || seq.plot_count > seq.max_plots {
            return Err(format!(
                "plot_count must be in 1..={}, got {}",
                seq.max_plots, seq.plot_count
            ));
        }

        if self.heatmap.window_span == 0 {
            return Err("heatmap window_span must be > 0".to_string());
        }

        if self.attention.top_count == 0 {
            return Err("attention top_count must be > 0".to_string());
        }

        Ok(())
    }

    /// Save configuration to TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load configuration from TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: ExplorerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load configuration from JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: ExplorerConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}
