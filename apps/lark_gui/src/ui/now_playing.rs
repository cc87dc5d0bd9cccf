//! 正在播放：封面与曲目信息

use egui::{RichText, Ui};
use lark_player::MediaStatus;

use crate::state::AppState;
use crate::ui::theme::LarkTheme;

const COVER_SIZE: f32 = 280.0;

pub struct NowPlaying;

impl NowPlaying {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        let texture = state.cover_texture(ui.ctx());

        ui.vertical_centered(|ui| {
            ui.add_space(32.0);

            match texture {
                Some(texture) => {
                    let size = texture.size_vec2();
                    let scale = (COVER_SIZE / size.x.max(size.y)).min(1.0);
                    ui.add(egui::Image::new(egui::load::SizedTexture::new(
                        texture.id(),
                        size * scale,
                    )));
                }
                None => {
                    egui::Frame::none()
                        .fill(LarkTheme::BG_PANEL)
                        .rounding(egui::Rounding::same(10.0))
                        .show(ui, |ui| {
                            ui.allocate_space(egui::vec2(COVER_SIZE, COVER_SIZE));
                        });
                }
            }

            ui.add_space(20.0);

            let metadata = state.display.metadata();
            let title = metadata
                .title
                .as_deref()
                .or(state.display.track_name())
                .unwrap_or("Nothing playing");
            ui.label(RichText::new(title).size(22.0).color(LarkTheme::TEXT).strong());

            let byline: Vec<&str> = [metadata.artist.as_deref(), metadata.album.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !byline.is_empty() {
                ui.label(
                    RichText::new(byline.join(" · "))
                        .size(14.0)
                        .color(LarkTheme::TEXT_DIM),
                );
            }

            if state.display.media_status() == MediaStatus::InvalidMedia {
                ui.add_space(8.0);
                ui.label(RichText::new("Cannot play this file").color(LarkTheme::ERROR));
            }
            if let Some(err) = state.display.last_error() {
                ui.label(RichText::new(err).size(12.0).color(LarkTheme::ERROR));
            }
        });
    }
}
