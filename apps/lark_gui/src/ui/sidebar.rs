//! 侧边栏 - 目录浏览

use egui::{RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::theme::LarkTheme;

pub struct BrowserSidebar;

impl BrowserSidebar {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        egui::Frame::none()
            .fill(LarkTheme::BG_PANEL)
            .inner_margin(egui::Margin::same(10.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("⬆").on_hover_text("Parent folder").clicked() {
                        state.go_up();
                    }
                    if ui.button("🔄").on_hover_text("Refresh").clicked() {
                        state.refresh();
                    }
                    if ui.button("📂").on_hover_text("Open folder").clicked() {
                        state.pick_directory();
                    }
                });

                ui.label(
                    RichText::new(state.browser.root().display().to_string())
                        .color(LarkTheme::TEXT_DIM)
                        .size(11.0),
                );
                ui.separator();

                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        Self::entries(ui, state);
                    });
            });
    }

    fn entries(ui: &mut Ui, state: &mut AppState) {
        if let Some(err) = state.browser.error() {
            ui.label(RichText::new(err.to_string()).color(LarkTheme::ERROR));
            return;
        }

        if state.browser.entries().is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(30.0);
                ui.label(RichText::new("No audio files").color(LarkTheme::TEXT_DIM));
            });
            return;
        }

        let mut activated = None;
        for (idx, entry) in state.browser.entries().iter().enumerate() {
            let icon = if entry.is_dir { "📁" } else { "🎵" };
            let text = RichText::new(format!("{} {}", icon, entry.name)).color(LarkTheme::TEXT);
            let response = ui.selectable_label(state.selected == Some(idx), text);

            if response.clicked() {
                state.selected = Some(idx);
            }
            if response.double_clicked() {
                activated = Some(idx);
            }
        }

        if let Some(idx) = activated {
            state.activate_entry(idx);
        }
    }
}
