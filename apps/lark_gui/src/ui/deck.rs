//! 底部播放控制栏

use egui::{Align, Layout, RichText, Ui};
use lark_player::format_time;

use crate::state::{AppState, RATE_CHOICES};
use crate::ui::theme::LarkTheme;

pub struct PlayerDeck;

impl PlayerDeck {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        egui::Frame::none()
            .fill(LarkTheme::BG_PANEL)
            .inner_margin(egui::Margin::symmetric(16.0, 10.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());

                Self::seek_bar(ui, state);
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    Self::transport_controls(ui, state);
                    ui.add_space(12.0);
                    Self::track_name(ui, state);

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        Self::volume_control(ui, state);
                        ui.add_space(12.0);
                        Self::rate_control(ui, state);
                    });
                });
            });
    }

    fn track_name(ui: &mut Ui, state: &AppState) {
        let text = match state.display.track_name() {
            Some(name) => RichText::new(name).color(LarkTheme::TEXT),
            None => RichText::new("No track loaded").color(LarkTheme::TEXT_DIM),
        };
        ui.label(text.size(14.0));
    }

    fn transport_controls(ui: &mut Ui, state: &mut AppState) {
        let glyph = state.display.play_button_glyph();
        if ui
            .add(egui::Button::new(RichText::new(glyph).size(22.0)))
            .clicked()
        {
            state.toggle_play();
        }
        if ui.button("⏹").on_hover_text("Stop").clicked() {
            state.stop();
        }
    }

    fn seek_bar(ui: &mut Ui, state: &mut AppState) {
        ui.horizontal(|ui| {
            let label_width = 110.0;
            let mut value = state.display.slider.value();
            let slider = egui::Slider::new(&mut value, 0..=100)
                .show_value(false)
                .trailing_fill(true);
            let width = (ui.available_width() - label_width).max(100.0);
            let response = ui.add_sized([width, 16.0], slider);

            // 单击不一定产生拖动开始，按值变化补上按下
            if response.drag_started()
                || (response.changed() && !state.display.slider.is_tracking())
            {
                state.seek_pressed();
            }
            if response.changed() {
                state.seek_moved(value);
            }
            if response.drag_stopped()
                || (state.display.slider.is_tracking()
                    && !response.dragged()
                    && !response.is_pointer_button_down_on())
            {
                state.seek_released();
            }

            let label = if state.display.slider.label().is_empty() {
                format_time(0)
            } else {
                state.display.slider.label().to_string()
            };
            ui.label(RichText::new(label).color(LarkTheme::TEXT_DIM).size(11.0));
        });
    }

    fn volume_control(ui: &mut Ui, state: &mut AppState) {
        let mut volume = state.display.volume();
        let slider = egui::Slider::new(&mut volume, 0..=100).show_value(false);
        if ui.add_sized([90.0, 16.0], slider).changed() {
            state.set_volume(volume);
        }

        let icon = match volume {
            0 => "🔇",
            1..=50 => "🔉",
            _ => "🔊",
        };
        ui.label(icon);
    }

    fn rate_control(ui: &mut Ui, state: &mut AppState) {
        let current = state.controller.playback_rate();
        egui::ComboBox::from_id_salt("playback_rate")
            .width(60.0)
            .selected_text(format!("{}x", current))
            .show_ui(ui, |ui| {
                for rate in RATE_CHOICES {
                    if ui
                        .selectable_label((rate - current).abs() < f32::EPSILON, format!("{}x", rate))
                        .clicked()
                    {
                        state.set_rate(rate);
                    }
                }
            });
    }
}
