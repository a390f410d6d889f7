//! GUI module - Interactive strategy viewer

mod app;
mod chart_viewer;

pub use app::VisualizerApp;
pub use chart_viewer::ChartViewer;
