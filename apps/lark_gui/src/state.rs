//! 应用状态

use std::path::PathBuf;

use crossbeam_channel::Receiver;
use lark_library::{Activation, DirectoryBrowser};
use lark_player::{
    DisplayModel, EngineHandle, PlaybackController, PlaybackSource, PlayerNotification,
};

use crate::config::AppConfig;

/// 可选的播放速率
pub const RATE_CHOICES: [f32; 5] = [0.5, 0.75, 1.0, 1.5, 2.0];

/// 应用状态
pub struct AppState {
    pub controller: PlaybackController<EngineHandle>,
    pub display: DisplayModel,
    pub browser: DirectoryBrowser,

    // UI 状态
    pub selected: Option<usize>,

    notifications: Receiver<PlayerNotification>,
    cover_texture: Option<egui::TextureHandle>,
    cover_texture_revision: u64,
}

impl AppState {
    pub fn new(engine: EngineHandle, config: &AppConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut controller = PlaybackController::new(engine, tx);
        controller.set_volume(config.volume);

        Self {
            controller,
            display: DisplayModel::new(),
            browser: DirectoryBrowser::new(&config.music_dir),
            selected: None,
            notifications: rx,
            cover_texture: None,
            cover_texture_revision: 0,
        }
    }

    /// 中继引擎事件并更新显示模型
    pub fn poll_events(&mut self) {
        self.controller.process_events();
        for notification in self.notifications.try_iter() {
            self.display.apply(&notification);
        }
    }

    /// 双击列表项
    pub fn activate_entry(&mut self, index: usize) {
        match self.browser.activate_index(index) {
            Activation::Play(path) => {
                self.selected = Some(index);
                self.play_file(path);
            }
            Activation::Descended => self.selected = None,
            Activation::Ignored => {}
        }
    }

    pub fn play_file(&mut self, path: PathBuf) {
        self.controller
            .set_source(PlaybackSource::from_local_file(path));
        self.controller.play();
    }

    pub fn toggle_play(&mut self) {
        self.controller.toggle_play();
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    pub fn go_up(&mut self) {
        if self.browser.go_up() {
            self.selected = None;
        }
    }

    pub fn refresh(&mut self) {
        self.browser.refresh();
        self.selected = None;
    }

    pub fn pick_directory(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(self.browser.root())
            .pick_folder()
        {
            self.browser.load_directory(dir);
            self.selected = None;
        }
    }

    pub fn seek_pressed(&mut self) {
        self.display.slider.press();
    }

    pub fn seek_moved(&mut self, value: i32) {
        let duration = self.controller.duration();
        self.display.slider.drag(value, duration);
    }

    pub fn seek_released(&mut self) {
        let duration = self.controller.duration();
        if let Some(target) = self.display.slider.release(duration) {
            self.controller.set_position(target);
        }
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.controller.set_volume(volume);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.controller.set_playback_rate(rate);
    }

    /// 封面纹理，封面变化时重建
    pub fn cover_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        if self.cover_texture_revision != self.display.cover_revision() {
            self.cover_texture_revision = self.display.cover_revision();
            self.cover_texture = self.display.cover().map(|cover| {
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [cover.width as usize, cover.height as usize],
                    &cover.rgba,
                );
                ctx.load_texture("cover-art", image, egui::TextureOptions::LINEAR)
            });
        }
        self.cover_texture.clone()
    }
}
