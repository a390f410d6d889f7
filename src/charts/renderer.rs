//! Static Chart Renderer
//! Draws the strategy figure with plotters' SVG backend and wraps it in a
//! self-contained HTML page.
//!
//! Layout:
//! 1. Title centered at the top
//! 2. Four panels stacked vertically with a fixed gap, sharing the time range
//! 3. Each panel: caption, mesh, left value axis, optional right value axis, legend

use crate::charts::figure::{
    format_time_label, padded_range, AxisSide, Figure, MarkerShape, Panel, TraceColor, TraceKind,
};
use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

const FONT: &str = "sans-serif";
const MARKER_SIZE: i32 = 6;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Failed to serialize figure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write HTML: {0}")]
    Io(#[from] std::io::Error),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn to_rgb(color: TraceColor) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

pub struct HtmlRenderer;

impl HtmlRenderer {
    /// Render the figure as a standalone SVG document.
    pub fn render_svg(figure: &Figure) -> Result<String, RenderError> {
        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (figure.width, figure.height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;
            let body = root.titled(&figure.title, (FONT, 24)).map_err(draw_err)?;

            let x_range = padded_range(figure.x_range());
            debug!("time axis {:.3}..{:.3}", x_range.0, x_range.1);

            for (panel, area) in figure
                .panels
                .iter()
                .zip(Self::split_panels(&body, figure))
            {
                Self::draw_panel(&area, panel, x_range)?;
            }

            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// Render the figure as a complete HTML page with the SVG inline and the
    /// figure data embedded as JSON.
    pub fn render_html(figure: &Figure) -> Result<String, RenderError> {
        let svg = Self::render_svg(figure)?;
        let json = serde_json::to_string(figure)?.replace("</", "<\\/");
        let title = escape_html(&figure.title);

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ margin: 0; background: #ffffff; font-family: sans-serif; }}
.figure {{ width: {width}px; margin: 0 auto; }}
</style>
</head>
<body>
<div class="figure">
{svg}
</div>
<script type="application/json" id="figure-data">{json}</script>
</body>
</html>
"#,
            title = title,
            width = figure.width,
            svg = svg,
            json = json,
        ))
    }

    /// Write the HTML page to `path`, replacing any existing file.
    pub fn write_html(figure: &Figure, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let html = Self::render_html(figure)?;
        fs::write(path.as_ref(), html)?;
        Ok(())
    }

    /// Cut the area below the title into equal panels separated by the configured gap.
    fn split_panels<'a>(
        area: &DrawingArea<SVGBackend<'a>, Shift>,
        figure: &Figure,
    ) -> Vec<DrawingArea<SVGBackend<'a>, Shift>> {
        let n = figure.panels.len() as u32;
        if n == 0 {
            return Vec::new();
        }

        let (width, height) = area.dim_in_pixel();
        let gap = figure.panel_gap_px();
        let panel_height = height.saturating_sub(gap * (n - 1)) / n;

        (0..n)
            .map(|i| {
                area.clone()
                    .shrink((0, i * (panel_height + gap)), (width, panel_height))
            })
            .collect()
    }

    fn draw_panel(
        area: &DrawingArea<SVGBackend<'_>, Shift>,
        panel: &Panel,
        x_range: (f64, f64),
    ) -> Result<(), RenderError> {
        let has_secondary = panel.has_secondary_axis();
        let (y0, y1) = padded_range(panel.y_range(AxisSide::Primary));
        let (s0, s1) = if has_secondary {
            padded_range(panel.y_range(AxisSide::Secondary))
        } else {
            (y0, y1)
        };

        let mut chart = ChartBuilder::on(area)
            .caption(&panel.title, (FONT, 16))
            .margin(8)
            .x_label_area_size(if panel.x_title.is_some() { 40 } else { 24 })
            .y_label_area_size(64)
            .right_y_label_area_size(if has_secondary { 64 } else { 0 })
            .build_cartesian_2d(x_range.0..x_range.1, y0..y1)
            .map_err(draw_err)?
            .set_secondary_coord(x_range.0..x_range.1, s0..s1);

        let time_label = |x: &f64| format_time_label(*x);
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(8)
            .x_label_formatter(&time_label)
            .y_desc(panel.y_title.as_str())
            .light_line_style(RGBColor(235, 235, 235).stroke_width(1));
        if let Some(x_title) = &panel.x_title {
            mesh.x_desc(x_title.as_str());
        }
        mesh.draw().map_err(draw_err)?;

        if has_secondary {
            chart
                .configure_secondary_axes()
                .y_desc(panel.secondary_y_title.as_deref().unwrap_or_default())
                .draw()
                .map_err(draw_err)?;
        }

        let bar_width = panel.bar_width();
        for trace in &panel.traces {
            let color = to_rgb(trace.color);
            match trace.kind {
                TraceKind::Line => {
                    let mut segments = trace
                        .finite_segments()
                        .into_iter()
                        .map(|seg| seg.into_iter().map(|[x, y]| (x, y)).collect::<Vec<_>>());
                    let first = segments.next().unwrap_or_default();
                    let style = color.stroke_width(2);

                    let anno = match trace.axis {
                        AxisSide::Primary => chart.draw_series(LineSeries::new(first, style)),
                        AxisSide::Secondary => {
                            chart.draw_secondary_series(LineSeries::new(first, style))
                        }
                    }
                    .map_err(draw_err)?;
                    anno.label(trace.name.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });

                    for segment in segments {
                        match trace.axis {
                            AxisSide::Primary => chart.draw_series(LineSeries::new(segment, style)),
                            AxisSide::Secondary => {
                                chart.draw_secondary_series(LineSeries::new(segment, style))
                            }
                        }
                        .map_err(draw_err)?;
                    }
                }
                TraceKind::Bar => {
                    let fill = color.mix(0.6).filled();
                    let bars = trace
                        .points
                        .iter()
                        .filter(|[_, y]| y.is_finite())
                        .map(move |&[x, y]| {
                            Rectangle::new(
                                [(x - bar_width / 2.0, 0.0), (x + bar_width / 2.0, y)],
                                fill,
                            )
                        });

                    let anno = match trace.axis {
                        AxisSide::Primary => chart.draw_series(bars),
                        AxisSide::Secondary => chart.draw_secondary_series(bars),
                    }
                    .map_err(draw_err)?;
                    anno.label(trace.name.as_str()).legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.6).filled())
                    });
                }
                TraceKind::Markers(shape) => {
                    // Markers always sit on the primary axis
                    let points: Vec<(f64, f64)> = trace
                        .points
                        .iter()
                        .filter(|[x, y]| x.is_finite() && y.is_finite())
                        .map(|&[x, y]| (x, y))
                        .collect();
                    let style = color.filled();

                    let anno = match shape {
                        MarkerShape::TriangleUp => chart.draw_series(
                            points
                                .iter()
                                .map(|&p| TriangleMarker::new(p, MARKER_SIZE, style)),
                        ),
                        MarkerShape::TriangleDown => chart.draw_series(points.iter().map(|&p| {
                            EmptyElement::at(p)
                                + Polygon::new(
                                    vec![
                                        (-MARKER_SIZE, -MARKER_SIZE / 2),
                                        (MARKER_SIZE, -MARKER_SIZE / 2),
                                        (0, MARKER_SIZE),
                                    ],
                                    style,
                                )
                        })),
                    }
                    .map_err(draw_err)?;

                    anno.label(trace.name.as_str())
                        .legend(move |(x, y)| {
                            let tip = match shape {
                                MarkerShape::TriangleUp => -5,
                                MarkerShape::TriangleDown => 5,
                            };
                            EmptyElement::at((x + 10, y))
                                + Polygon::new(vec![(-5, -tip), (5, -tip), (0, tip)], style)
                        });
                }
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8).filled())
            .border_style(RGBColor(200, 200, 200).stroke_width(1))
            .label_font((FONT, 12))
            .draw()
            .map_err(draw_err)?;

        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
