//! Chart Plotter Module
//! Draws figure panels as interactive egui_plot charts.

use crate::charts::figure::{
    format_time_label, padded_range, AxisSide, MarkerShape, Panel, TraceColor, TraceKind,
};
use egui::{Color32, Id, Vec2b};
use egui_plot::{
    AxisHints, Bar, BarChart, HPlacement, Legend, Line, MarkerShape as PlotMarker, Plot,
    PlotPoints, Points,
};

const MARKER_RADIUS: f32 = 6.0;

pub fn to_color32(color: TraceColor) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

/// Linear map from a secondary axis range onto the primary one.
///
/// egui_plot has a single coordinate system per plot, so secondary traces are
/// drawn rescaled and a right-hand axis formats ticks back to their own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryScale {
    primary: (f64, f64),
    secondary: (f64, f64),
}

impl SecondaryScale {
    pub fn for_panel(panel: &Panel) -> Option<Self> {
        if !panel.has_secondary_axis() {
            return None;
        }
        Some(Self {
            primary: padded_range(panel.y_range(AxisSide::Primary)),
            secondary: padded_range(panel.y_range(AxisSide::Secondary)),
        })
    }

    pub fn to_primary(&self, value: f64) -> f64 {
        let (p0, p1) = self.primary;
        let (s0, s1) = self.secondary;
        p0 + (value - s0) * (p1 - p0) / (s1 - s0)
    }

    pub fn to_secondary(&self, value: f64) -> f64 {
        let (p0, p1) = self.primary;
        let (s0, s1) = self.secondary;
        s0 + (value - p0) * (s1 - s0) / (p1 - p0)
    }
}

/// Draws strategy panels using egui_plot.
pub struct PanelPlotter;

impl PanelPlotter {
    /// Draw one panel. All panels sharing `link_group` pan and zoom together on x.
    pub fn draw_panel(
        ui: &mut egui::Ui,
        panel: &Panel,
        index: usize,
        height: f32,
        link_group: Id,
    ) {
        let scale = SecondaryScale::for_panel(panel);

        let mut plot = Plot::new(format!("strategy_panel_{}", index))
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .link_axis(link_group, Vec2b::new(true, false))
            .link_cursor(link_group, Vec2b::new(true, false))
            .x_axis_formatter(|mark, _range| format_time_label(mark.value));

        if let Some(x_title) = &panel.x_title {
            plot = plot.x_axis_label(x_title.clone());
        }

        plot = match scale {
            Some(scale) => {
                let secondary_title = panel.secondary_y_title.clone().unwrap_or_default();
                plot.custom_y_axes(vec![
                    AxisHints::new_y().label(panel.y_title.clone()),
                    AxisHints::new_y()
                        .label(secondary_title)
                        .placement(HPlacement::Right)
                        .formatter(move |mark, _range| {
                            format!("{:.2}", scale.to_secondary(mark.value))
                        }),
                ])
            }
            None => plot.y_axis_label(panel.y_title.clone()),
        };

        let bar_width = panel.bar_width();

        plot.show(ui, |plot_ui| {
            for trace in &panel.traces {
                let color = to_color32(trace.color);
                let y = |v: f64| match (trace.axis, scale) {
                    (AxisSide::Secondary, Some(scale)) => scale.to_primary(v),
                    _ => v,
                };

                match trace.kind {
                    TraceKind::Line => {
                        for segment in trace.finite_segments() {
                            let points: PlotPoints =
                                segment.iter().map(|&[px, py]| [px, y(py)]).collect();
                            plot_ui.line(
                                Line::new(points)
                                    .color(color)
                                    .width(1.5)
                                    .name(&trace.name),
                            );
                        }
                    }
                    TraceKind::Bar => {
                        let base = y(0.0);
                        let bars: Vec<Bar> = trace
                            .points
                            .iter()
                            .filter(|[_, v]| v.is_finite())
                            .map(|&[px, v]| {
                                Bar::new(px, y(v) - base)
                                    .base_offset(base)
                                    .width(bar_width)
                                    .fill(color.gamma_multiply(0.6))
                            })
                            .collect();
                        plot_ui.bar_chart(BarChart::new(bars).color(color).name(&trace.name));
                    }
                    TraceKind::Markers(shape) => {
                        let marker = match shape {
                            MarkerShape::TriangleUp => PlotMarker::Up,
                            MarkerShape::TriangleDown => PlotMarker::Down,
                        };
                        let points: PlotPoints = trace
                            .points
                            .iter()
                            .filter(|[px, py]| px.is_finite() && py.is_finite())
                            .copied()
                            .collect();
                        plot_ui.points(
                            Points::new(points)
                                .shape(marker)
                                .filled(true)
                                .radius(MARKER_RADIUS)
                                .color(color)
                                .name(&trace.name),
                        );
                    }
                }
            }
        });
    }
}
