//! Figure Model
//! Backend-independent description of the four-panel strategy chart.
//!
//! Layout (top to bottom, shared time axis):
//! 1. Price and Volume: mid price line, volume bars on a right-side axis
//! 2. Strategy Position and P&L: position line, P&L line on a right-side axis
//! 3. Order Book Imbalance: imbalance line
//! 4. Trade Executions: buy (green up) and sell (red down) markers at trade price

use crate::config::RenderSettings;
use crate::data::{Execution, StrategyLog};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// RGB colour shared by the HTML and interactive renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TraceColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub const MID_PRICE_COLOR: TraceColor = TraceColor::rgb(99, 110, 250); // Blue
pub const VOLUME_COLOR: TraceColor = TraceColor::rgb(239, 85, 59); // Red-orange
pub const POSITION_COLOR: TraceColor = TraceColor::rgb(0, 204, 150); // Teal
pub const PNL_COLOR: TraceColor = TraceColor::rgb(171, 99, 250); // Purple
pub const IMBALANCE_COLOR: TraceColor = TraceColor::rgb(255, 161, 90); // Orange
pub const BUY_COLOR: TraceColor = TraceColor::rgb(0, 128, 0); // Green
pub const SELL_COLOR: TraceColor = TraceColor::rgb(255, 0, 0); // Red

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerShape {
    TriangleUp,
    TriangleDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Line,
    Bar,
    Markers(MarkerShape),
}

/// Which vertical axis of its panel a trace is scaled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Primary,
    Secondary,
}

/// One data series. Points are `[seconds since epoch, value]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub axis: AxisSide,
    pub color: TraceColor,
    pub points: Vec<[f64; 2]>,
}

impl Trace {
    fn new(name: &str, kind: TraceKind, axis: AxisSide, color: TraceColor) -> Self {
        Self {
            name: name.to_string(),
            kind,
            axis,
            color,
            points: Vec::new(),
        }
    }

    fn with_points(mut self, points: Vec<[f64; 2]>) -> Self {
        self.points = points;
        self
    }

    /// Runs of consecutive finite points; missing values split the trace into gaps.
    pub fn finite_segments(&self) -> Vec<Vec<[f64; 2]>> {
        let mut segments = Vec::new();
        let mut current: Vec<[f64; 2]> = Vec::new();

        for &[x, y] in &self.points {
            if x.is_finite() && y.is_finite() {
                current.push([x, y]);
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        segments
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub y_title: String,
    pub secondary_y_title: Option<String>,
    pub x_title: Option<String>,
    pub traces: Vec<Trace>,
}

impl Panel {
    fn new(title: &str, y_title: &str) -> Self {
        Self {
            title: title.to_string(),
            y_title: y_title.to_string(),
            secondary_y_title: None,
            x_title: None,
            traces: Vec::new(),
        }
    }

    pub fn has_secondary_axis(&self) -> bool {
        self.traces.iter().any(|t| t.axis == AxisSide::Secondary)
    }

    /// Finite value range of the traces on `axis`. Bars always include zero.
    pub fn y_range(&self, axis: AxisSide) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for trace in self.traces.iter().filter(|t| t.axis == axis) {
            if trace.kind == TraceKind::Bar && !trace.points.is_empty() {
                min = min.min(0.0);
                max = max.max(0.0);
            }
            for &[_, y] in &trace.points {
                if y.is_finite() {
                    min = min.min(y);
                    max = max.max(y);
                }
            }
        }

        if min.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }

    /// Bar width in seconds: 80% of the median gap between consecutive bars.
    pub fn bar_width(&self) -> f64 {
        let mut steps: Vec<f64> = self
            .traces
            .iter()
            .filter(|t| t.kind == TraceKind::Bar)
            .flat_map(|t| t.points.windows(2).map(|w| w[1][0] - w[0][0]))
            .filter(|step| *step > 0.0)
            .collect();

        if steps.is_empty() {
            return 1.0;
        }
        steps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        steps[steps.len() / 2] * 0.8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vertical_spacing: f64,
    pub panels: Vec<Panel>,
}

impl Figure {
    /// Time range covered by every trace, in seconds since epoch.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for trace in self.panels.iter().flat_map(|p| p.traces.iter()) {
            for &[x, _] in &trace.points {
                min = min.min(x);
                max = max.max(x);
            }
        }

        if min.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }

    /// Pixel gap between two stacked panels.
    pub fn panel_gap_px(&self) -> u32 {
        (self.height as f64 * self.vertical_spacing).round() as u32
    }

    #[cfg(test)]
    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.panels
            .iter()
            .flat_map(|p| p.traces.iter())
            .find(|t| t.name == name)
    }
}

/// Seconds since the Unix epoch, millisecond precision.
pub fn to_plot_x(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64 / 1000.0
}

/// Inverse of `to_plot_x`, for axis labels.
pub fn from_plot_x(x: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis((x * 1000.0).round() as i64)
}

/// Axis tick label for a plot x value.
pub fn format_time_label(x: f64) -> String {
    from_plot_x(x)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Pad a value range by 5% on each side; degenerate ranges get a unit span.
pub fn padded_range(range: Option<(f64, f64)>) -> (f64, f64) {
    match range {
        Some((min, max)) if max > min => {
            let pad = (max - min) * 0.05;
            (min - pad, max + pad)
        }
        Some((v, _)) => (v - 0.5, v + 0.5),
        None => (0.0, 1.0),
    }
}

/// Builds the strategy figure from a typed log.
pub struct FigureBuilder;

impl FigureBuilder {
    pub fn build(log: &StrategyLog, settings: &RenderSettings) -> Figure {
        let xs: Vec<f64> = log.timestamps.iter().map(to_plot_x).collect();
        let series = |values: &[f64]| -> Vec<[f64; 2]> {
            xs.iter().zip(values.iter()).map(|(&x, &y)| [x, y]).collect()
        };

        let mut price = Panel::new("Price and Volume", "Price");
        price.secondary_y_title = Some("Volume".to_string());
        price.traces.push(
            Trace::new("Mid Price", TraceKind::Line, AxisSide::Primary, MID_PRICE_COLOR)
                .with_points(series(&log.mid_price)),
        );
        price.traces.push(
            Trace::new("Volume", TraceKind::Bar, AxisSide::Secondary, VOLUME_COLOR)
                .with_points(series(&log.volume)),
        );

        let mut position = Panel::new("Strategy Position and P&L", "Position");
        position.secondary_y_title = Some("P&L".to_string());
        position.traces.push(
            Trace::new("Position", TraceKind::Line, AxisSide::Primary, POSITION_COLOR)
                .with_points(series(&log.position)),
        );
        position.traces.push(
            Trace::new("P&L", TraceKind::Line, AxisSide::Secondary, PNL_COLOR)
                .with_points(series(&log.pnl)),
        );

        let mut imbalance = Panel::new("Order Book Imbalance", "Imbalance");
        imbalance.traces.push(
            Trace::new("Imbalance", TraceKind::Line, AxisSide::Primary, IMBALANCE_COLOR)
                .with_points(series(&log.imbalance)),
        );

        let (buys, sells) = log.executions();
        let markers = |executions: &[Execution]| -> Vec<[f64; 2]> {
            executions
                .iter()
                .map(|e| [to_plot_x(&e.timestamp), e.price])
                .collect()
        };

        let mut trades = Panel::new("Trade Executions", "Price");
        trades.x_title = Some("Time".to_string());
        trades.traces.push(
            Trace::new(
                "Buy",
                TraceKind::Markers(MarkerShape::TriangleUp),
                AxisSide::Primary,
                BUY_COLOR,
            )
            .with_points(markers(&buys)),
        );
        trades.traces.push(
            Trace::new(
                "Sell",
                TraceKind::Markers(MarkerShape::TriangleDown),
                AxisSide::Primary,
                SELL_COLOR,
            )
            .with_points(markers(&sells)),
        );

        Figure {
            title: settings.title.clone(),
            width: settings.width,
            height: settings.height,
            vertical_spacing: settings.vertical_spacing,
            panels: vec![price, position, imbalance, trades],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataLoader, DataProcessor, TradeSide};
    use chrono::TimeZone;
    use std::fs;
    use std::path::PathBuf;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, h, m, 0).unwrap()
    }

    /// Two-row log: no trade at 09:30, a buy at 101 at 09:31.
    fn scenario_log() -> StrategyLog {
        StrategyLog {
            timestamps: vec![ts(9, 30), ts(9, 31)],
            mid_price: vec![100.0, 101.0],
            volume: vec![50.0, 30.0],
            position: vec![0.0, 10.0],
            pnl: vec![0.0, 5.0],
            imbalance: vec![0.1, -0.2],
            trade_direction: vec![TradeSide::None, TradeSide::Buy],
            trade_price: vec![f64::NAN, 101.0],
        }
    }

    #[test]
    fn test_four_panels_in_order() {
        let figure = FigureBuilder::build(&scenario_log(), &RenderSettings::default());
        let titles: Vec<&str> = figure.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Price and Volume",
                "Strategy Position and P&L",
                "Order Book Imbalance",
                "Trade Executions"
            ]
        );
        assert_eq!(figure.title, "Imbalance Strategy Performance");
        assert_eq!(figure.panels[3].x_title.as_deref(), Some("Time"));
        assert_eq!(figure.panels[0].secondary_y_title.as_deref(), Some("Volume"));
        assert_eq!(figure.panels[1].secondary_y_title.as_deref(), Some("P&L"));
        assert!(!figure.panels[2].has_secondary_axis());
    }

    #[test]
    fn test_series_lengths_match_rows() {
        let log = scenario_log();
        let figure = FigureBuilder::build(&log, &RenderSettings::default());

        for name in ["Mid Price", "Volume", "Position", "P&L", "Imbalance"] {
            assert_eq!(figure.trace(name).unwrap().points.len(), log.len(), "{}", name);
        }
        assert_eq!(figure.trace("Volume").unwrap().kind, TraceKind::Bar);
        assert_eq!(figure.trace("Volume").unwrap().axis, AxisSide::Secondary);
        assert_eq!(figure.trace("P&L").unwrap().axis, AxisSide::Secondary);
    }

    fn write_temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "imbalance_vis_figure_{}_{}.csv",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    fn figure_from_csv(path: &PathBuf) -> Figure {
        let df = DataLoader::load_csv(path).unwrap();
        let log = DataProcessor::to_strategy_log(&df).unwrap();
        FigureBuilder::build(&log, &RenderSettings::default())
    }

    #[test]
    fn test_buy_marker_from_csv_file() {
        let path = write_temp_csv(
            "scenario",
            "timestamp,mid_price,volume,position,pnl,imbalance,trade_direction,trade_price\n\
             2024-01-02 09:30:00,100,50,0,0,0.1,0,\n\
             2024-01-02 09:31:00,101,30,10,5,-0.2,1,101\n",
        );

        let figure = figure_from_csv(&path);
        assert_eq!(
            figure.trace("Buy").unwrap().points,
            vec![[to_plot_x(&ts(9, 31)), 101.0]]
        );
        assert!(figure.trace("Sell").unwrap().points.is_empty());
        assert_eq!(
            figure.trace("Mid Price").unwrap().points,
            vec![[to_plot_x(&ts(9, 30)), 100.0], [to_plot_x(&ts(9, 31)), 101.0]]
        );

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_late_decimal_trade_keeps_marker() {
        let mut contents = String::from(
            "timestamp,mid_price,volume,position,pnl,imbalance,trade_direction,trade_price\n",
        );
        for i in 0..10_001 {
            let price = if i == 10_000 { "101.25" } else { "101" };
            contents.push_str(&format!(
                "2024-01-02 {:02}:{:02}:{:02},101,1,0,0,0,1,{}\n",
                9 + i / 3600,
                i / 60 % 60,
                i % 60,
                price
            ));
        }
        let path = write_temp_csv("late_decimal", &contents);

        let figure = figure_from_csv(&path);
        let buys = &figure.trace("Buy").unwrap().points;
        assert_eq!(buys.len(), 10_001);
        assert!(buys.iter().all(|[x, y]| x.is_finite() && y.is_finite()));
        assert_eq!(buys.last().unwrap()[1], 101.25);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_buy_marker_scenario() {
        let figure = FigureBuilder::build(&scenario_log(), &RenderSettings::default());

        let buy = figure.trace("Buy").unwrap();
        assert_eq!(buy.points, vec![[to_plot_x(&ts(9, 31)), 101.0]]);
        assert_eq!(buy.kind, TraceKind::Markers(MarkerShape::TriangleUp));
        assert_eq!(buy.color, BUY_COLOR);

        let sell = figure.trace("Sell").unwrap();
        assert!(sell.points.is_empty());
        assert_eq!(sell.kind, TraceKind::Markers(MarkerShape::TriangleDown));
        assert_eq!(sell.color, SELL_COLOR);
    }

    #[test]
    fn test_build_is_deterministic() {
        let log = scenario_log();
        let a = FigureBuilder::build(&log, &RenderSettings::default());
        let b = FigureBuilder::build(&log, &RenderSettings::default());
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_ranges() {
        let figure = FigureBuilder::build(&scenario_log(), &RenderSettings::default());

        let (x0, x1) = figure.x_range().unwrap();
        assert_eq!(x1 - x0, 60.0);

        // Volume bars are anchored at zero
        assert_eq!(figure.panels[0].y_range(AxisSide::Secondary), Some((0.0, 50.0)));
        assert_eq!(figure.panels[0].y_range(AxisSide::Primary), Some((100.0, 101.0)));
        assert_eq!(figure.panels[2].y_range(AxisSide::Secondary), None);
    }

    #[test]
    fn test_empty_log_builds() {
        let figure = FigureBuilder::build(&StrategyLog::default(), &RenderSettings::default());
        assert_eq!(figure.panels.len(), 4);
        assert!(figure.x_range().is_none());
        assert!(figure.panels[0].y_range(AxisSide::Primary).is_none());
    }

    #[test]
    fn test_finite_segments_split_on_nan() {
        let trace = Trace::new("Mid Price", TraceKind::Line, AxisSide::Primary, MID_PRICE_COLOR)
            .with_points(vec![[0.0, 1.0], [1.0, f64::NAN], [2.0, 3.0], [3.0, 4.0]]);
        assert_eq!(
            trace.finite_segments(),
            vec![vec![[0.0, 1.0]], vec![[2.0, 3.0], [3.0, 4.0]]]
        );
    }

    #[test]
    fn test_bar_width_uses_median_step() {
        let figure = FigureBuilder::build(&scenario_log(), &RenderSettings::default());
        assert!((figure.panels[0].bar_width() - 48.0).abs() < 1e-9); // 60s * 0.8
        assert_eq!(figure.panels[2].bar_width(), 1.0);
    }

    #[test]
    fn test_panel_gap() {
        let figure = FigureBuilder::build(&scenario_log(), &RenderSettings::default());
        assert_eq!(figure.panel_gap_px(), 24); // 1200 * 0.02
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(None), (0.0, 1.0));
        assert_eq!(padded_range(Some((5.0, 5.0))), (4.5, 5.5));
        assert_eq!(padded_range(Some((0.0, 100.0))), (-5.0, 105.0));
    }

    #[test]
    fn test_format_time_label() {
        assert_eq!(format_time_label(to_plot_x(&ts(9, 31))), "09:31:00");
    }

    #[test]
    fn test_plot_x_round_trip() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 15).unwrap();
        assert_eq!(from_plot_x(to_plot_x(&t)), Some(t));
    }
}
