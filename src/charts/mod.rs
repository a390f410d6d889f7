//! Charts module - Figure model and rendering

mod figure;
mod plotter;
mod renderer;

pub use figure::{Figure, FigureBuilder};
pub use plotter::PanelPlotter;
pub use renderer::HtmlRenderer;
