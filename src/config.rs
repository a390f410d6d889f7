//! Render Settings
//! Fixed constants for the strategy chart: file locations, title and figure size.

use std::path::PathBuf;

/// Strategy log written by the imbalance strategy.
pub const DEFAULT_INPUT_PATH: &str = "imbalance_strat_log.csv";
/// Static HTML report, overwritten on every run.
pub const DEFAULT_OUTPUT_PATH: &str = "strategy_visualization.html";
pub const DEFAULT_TITLE: &str = "Imbalance Strategy Performance";

/// Settings for one render of the strategy chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub title: String,
    /// Figure width in pixels
    pub width: u32,
    /// Figure height in pixels, shared by the four panels
    pub height: u32,
    /// Gap between panels as a fraction of the figure height
    pub vertical_spacing: f64,
    /// Open the interactive viewer after the HTML is written
    pub show_viewer: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            title: DEFAULT_TITLE.to_string(),
            width: 1000,
            height: 1200,
            vertical_spacing: 0.02,
            show_viewer: true,
        }
    }
}
