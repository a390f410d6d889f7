//! Imbalance Strategy Visualizer
//!
//! Loads the imbalance strategy's CSV log, renders a four-panel chart of price,
//! volume, position, P&L, order book imbalance and trade executions, writes it
//! as a static HTML page and opens it in an interactive viewer.

mod charts;
mod config;
mod data;
mod gui;

use anyhow::{anyhow, Context, Result};
use charts::{FigureBuilder, HtmlRenderer};
use config::RenderSettings;
use data::{DataLoader, DataProcessor};
use gui::VisualizerApp;
use log::{info, warn};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = RenderSettings::default();

    let df = DataLoader::load_csv(&settings.input_path)
        .with_context(|| format!("loading {}", settings.input_path.display()))?;
    info!(
        "Loaded {} rows from {}",
        df.height(),
        settings.input_path.display()
    );

    let log = DataProcessor::to_strategy_log(&df)
        .with_context(|| format!("reading {}", settings.input_path.display()))?;

    if log.is_empty() {
        warn!("Strategy log has no rows; panels will be empty");
    }

    let (buys, sells) = log.executions();
    info!("Trade executions: {} buys, {} sells", buys.len(), sells.len());
    if buys.is_empty() {
        warn!("No buy executions in log");
    }
    if sells.is_empty() {
        warn!("No sell executions in log");
    }

    let figure = FigureBuilder::build(&log, &settings);

    HtmlRenderer::write_html(&figure, &settings.output_path)
        .with_context(|| format!("writing {}", settings.output_path.display()))?;
    info!("Wrote {}", settings.output_path.display());

    if settings.show_viewer {
        VisualizerApp::run(figure).map_err(|e| anyhow!("viewer failed: {}", e))?;
    }

    Ok(())
}
