//! Chart Viewer Widget
//! Scrollable stack of the four strategy panels with a shared, linked time axis.

use crate::charts::{Figure, PanelPlotter};
use egui::{Id, RichText, ScrollArea};

const PANEL_SPACING: f32 = 12.0;
const PANEL_TITLE_HEIGHT: f32 = 22.0;
const MIN_PANEL_HEIGHT: f32 = 180.0;

/// Vertical stack of interactive panels for one figure.
pub struct ChartViewer {
    figure: Figure,
    link_group: Id,
}

impl ChartViewer {
    pub fn new(figure: Figure) -> Self {
        Self {
            figure,
            link_group: Id::new("strategy_time_axis"),
        }
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Height of each panel so the stack fills `available` (never below the minimum).
    pub fn panel_height(&self, available: f32) -> f32 {
        let n = self.figure.panels.len().max(1) as f32;
        let chrome = n * (PANEL_TITLE_HEIGHT + PANEL_SPACING);
        ((available - chrome) / n).max(MIN_PANEL_HEIGHT)
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        if self.figure.panels.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        let panel_height = self.panel_height(ui.available_height());

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (index, panel) in self.figure.panels.iter().enumerate() {
                    ui.label(RichText::new(&panel.title).size(14.0).strong());
                    PanelPlotter::draw_panel(ui, panel, index, panel_height, self.link_group);
                    ui.add_space(PANEL_SPACING);
                }
            });
    }
}
