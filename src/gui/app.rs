//! Strategy Visualizer Application
//! Native window showing the figure title and the interactive panel stack.

use crate::charts::Figure;
use crate::gui::ChartViewer;
use egui::RichText;

/// Main application window.
pub struct VisualizerApp {
    chart_viewer: ChartViewer,
}

impl VisualizerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, figure: Figure) -> Self {
        Self {
            chart_viewer: ChartViewer::new(figure),
        }
    }

    /// Run the viewer until the window is closed.
    pub fn run(figure: Figure) -> eframe::Result<()> {
        let title = figure.title.clone();
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([figure.width as f32 + 40.0, 900.0])
                .with_min_inner_size([800.0, 600.0])
                .with_title(&title),
            ..Default::default()
        };

        eframe::run_native(
            &title,
            options,
            Box::new(|cc| Ok(Box::new(VisualizerApp::new(cc, figure)))),
        )
    }
}

impl eframe::App for VisualizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new(&self.chart_viewer.figure().title)
                        .size(20.0)
                        .strong(),
                );
            });
            ui.add_space(8.0);

            self.chart_viewer.show(ui);
        });
    }
}
