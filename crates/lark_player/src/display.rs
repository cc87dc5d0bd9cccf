//! 显示状态
//!
//! 把控制器通知落到与 UI 工具包无关的显示模型上。

use crate::{
    format_time, CoverArt, MediaMetadata, MediaStatus, PlaybackSource, PlaybackState,
    PlayerNotification,
};

/// 窗口标题后缀
pub const APP_TITLE: &str = "Lark";

pub const PLAY_GLYPH: &str = "▶";
pub const PAUSE_GLYPH: &str = "⏸";

/// 进度条模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliderMode {
    /// 跟随引擎进度
    #[default]
    Live,
    /// 用户正在拖动
    Tracking,
}

/// 进度条（0 - 100）与时间标签
///
/// 拖动期间引擎进度不会改动滑块，松开时才发出一次跳转。
#[derive(Debug, Clone, Default)]
pub struct PositionSlider {
    mode: SliderMode,
    value: i32,
    label: String,
}

impl PositionSlider {
    pub fn mode(&self) -> SliderMode {
        self.mode
    }

    pub fn is_tracking(&self) -> bool {
        self.mode == SliderMode::Tracking
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// 按下：Live -> Tracking
    pub fn press(&mut self) {
        self.mode = SliderMode::Tracking;
    }

    /// 拖动：只更新滑块与时间标签，不跳转
    pub fn drag(&mut self, value: i32, duration: u64) {
        if !self.is_tracking() {
            return;
        }
        self.value = value.clamp(0, 100);
        if duration > 0 {
            self.label = format_time(slider_to_position(self.value, duration));
        }
    }

    /// 松开：Tracking -> Live，时长已知时返回跳转目标（毫秒）
    pub fn release(&mut self, duration: u64) -> Option<u64> {
        if !self.is_tracking() {
            return None;
        }
        self.mode = SliderMode::Live;
        (duration > 0).then(|| slider_to_position(self.value, duration))
    }

    /// 引擎进度；拖动中忽略，返回是否更新了滑块
    pub fn on_position(&mut self, position: u64, duration: u64) -> bool {
        if self.is_tracking() || duration == 0 {
            return false;
        }
        self.value = ((position as f64 * 100.0 / duration as f64) as i32).clamp(0, 100);
        self.label = format!("{} / {}", format_time(position), format_time(duration));
        true
    }

    /// 停止后归零
    pub fn reset(&mut self) {
        self.value = 0;
        self.label.clear();
    }
}

/// 滑块值对应的媒体位置
pub fn slider_to_position(value: i32, duration: u64) -> u64 {
    (value.clamp(0, 100) as f64 / 100.0 * duration as f64).round() as u64
}

/// 播放器界面的显示模型
#[derive(Debug, Clone)]
pub struct DisplayModel {
    pub slider: PositionSlider,
    position: u64,
    duration: u64,
    volume: i32,
    playback_state: PlaybackState,
    media_status: MediaStatus,
    source: Option<PlaybackSource>,
    track_name: Option<String>,
    window_title: String,
    cover: Option<CoverArt>,
    cover_revision: u64,
    metadata: MediaMetadata,
    last_error: Option<String>,
}

impl Default for DisplayModel {
    fn default() -> Self {
        Self {
            slider: PositionSlider::default(),
            position: 0,
            duration: 0,
            volume: 0,
            playback_state: PlaybackState::Stopped,
            media_status: MediaStatus::NoMedia,
            source: None,
            track_name: None,
            window_title: APP_TITLE.to_string(),
            cover: None,
            cover_revision: 0,
            metadata: MediaMetadata::default(),
            last_error: None,
        }
    }
}

impl DisplayModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, notification: &PlayerNotification) {
        match notification {
            PlayerNotification::PositionChanged(pos) => {
                self.position = *pos;
                self.slider.on_position(*pos, self.duration);
            }
            PlayerNotification::DurationChanged(dur) => {
                self.duration = *dur;
            }
            PlayerNotification::PlaybackStateChanged(state) => {
                self.playback_state = *state;
                match state {
                    PlaybackState::Playing => {
                        if let Some(name) = self.source.as_ref().and_then(|s| s.base_name()) {
                            self.window_title = format!("{} - {}", name, APP_TITLE);
                        }
                    }
                    PlaybackState::Stopped => {
                        if !self.slider.is_tracking() {
                            self.slider.reset();
                        }
                    }
                    PlaybackState::Paused => {}
                }
            }
            PlayerNotification::MediaStatusChanged(status) => {
                self.media_status = *status;
            }
            PlayerNotification::VolumeChanged(volume) => {
                self.on_volume(*volume);
            }
            PlayerNotification::SourceChanged(source) => {
                self.track_name = source.file_name();
                self.source = Some(source.clone());
                self.position = 0;
                self.duration = 0;
                self.slider.reset();
                self.set_cover(None);
                self.metadata = MediaMetadata::default();
                self.last_error = None;
            }
            PlayerNotification::CoverArtChanged(cover) => {
                self.set_cover(cover.clone());
            }
            PlayerNotification::MetadataChanged(metadata) => {
                self.metadata = metadata.clone();
            }
            PlayerNotification::Error(message) => {
                self.last_error = Some(message.clone());
            }
        }
    }

    /// 同步音量滑块，只在值不同时改动，返回是否改动
    pub fn on_volume(&mut self, volume: i32) -> bool {
        if self.volume == volume {
            return false;
        }
        self.volume = volume;
        true
    }

    fn set_cover(&mut self, cover: Option<CoverArt>) {
        self.cover = cover;
        self.cover_revision += 1;
    }

    pub fn play_button_glyph(&self) -> &'static str {
        if self.playback_state == PlaybackState::Playing {
            PAUSE_GLYPH
        } else {
            PLAY_GLYPH
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state == PlaybackState::Playing
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback_state
    }

    pub fn media_status(&self) -> MediaStatus {
        self.media_status
    }

    pub fn track_name(&self) -> Option<&str> {
        self.track_name.as_deref()
    }

    pub fn window_title(&self) -> &str {
        &self.window_title
    }

    pub fn cover(&self) -> Option<&CoverArt> {
        self.cover.as_ref()
    }

    /// 每次封面被替换或清除都会递增，供 UI 判断是否重建纹理
    pub fn cover_revision(&self) -> u64 {
        self.cover_revision
    }

    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_release_seek_target() {
        let duration = 215_347;
        for value in [0, 1, 33, 50, 99, 100] {
            let mut slider = PositionSlider::default();
            slider.press();
            slider.drag(value, duration);
            let target = slider.release(duration).unwrap();
            let expected = (value as f64 / 100.0 * duration as f64).round() as u64;
            assert_eq!(target, expected);
            assert_eq!(slider.mode(), SliderMode::Live);
        }
    }

    #[test]
    fn test_release_without_duration_is_noop() {
        let mut slider = PositionSlider::default();
        slider.press();
        slider.drag(40, 0);
        assert_eq!(slider.release(0), None);
        assert!(!slider.is_tracking());
        assert_eq!(slider.label(), "");
    }

    #[test]
    fn test_drag_updates_label_only_while_tracking() {
        let mut slider = PositionSlider::default();
        slider.drag(50, 120_000);
        assert_eq!(slider.value(), 0);

        slider.press();
        slider.drag(50, 120_000);
        assert_eq!(slider.value(), 50);
        assert_eq!(slider.label(), "01:00");
    }

    #[test]
    fn test_tracking_ignores_engine_positions() {
        let duration = 200_000;
        let mut slider = PositionSlider::default();
        assert!(slider.on_position(20_000, duration));
        assert_eq!(slider.value(), 10);

        slider.press();
        slider.drag(75, duration);
        assert!(!slider.on_position(40_000, duration));
        assert!(!slider.on_position(60_000, duration));
        assert_eq!(slider.value(), 75);

        slider.release(duration);
        assert!(slider.on_position(150_000, duration));
        assert_eq!(slider.value(), 75);
        assert!(slider.on_position(100_000, duration));
        assert_eq!(slider.value(), 50);
        assert_eq!(slider.label(), "01:40 / 03:20");
    }

    fn playing_model() -> DisplayModel {
        let mut model = DisplayModel::new();
        model.apply(&PlayerNotification::SourceChanged(
            PlaybackSource::from_local_file("/music/Night Drive.flac"),
        ));
        model.apply(&PlayerNotification::DurationChanged(300_000));
        model.apply(&PlayerNotification::PlaybackStateChanged(
            PlaybackState::Playing,
        ));
        model
    }

    #[test]
    fn test_model_playing_state() {
        let mut model = playing_model();
        assert_eq!(model.track_name(), Some("Night Drive.flac"));
        assert_eq!(model.window_title(), "Night Drive - Lark");
        assert_eq!(model.play_button_glyph(), PAUSE_GLYPH);

        model.apply(&PlayerNotification::PositionChanged(150_000));
        assert_eq!(model.slider.value(), 50);

        model.apply(&PlayerNotification::PlaybackStateChanged(
            PlaybackState::Paused,
        ));
        assert_eq!(model.play_button_glyph(), PLAY_GLYPH);
        assert_eq!(model.slider.value(), 50);

        model.apply(&PlayerNotification::PlaybackStateChanged(
            PlaybackState::Stopped,
        ));
        assert_eq!(model.slider.value(), 0);
        assert_eq!(model.slider.label(), "");
    }

    #[test]
    fn test_model_detaches_position_while_dragging() {
        let mut model = playing_model();
        model.apply(&PlayerNotification::PositionChanged(30_000));
        assert_eq!(model.slider.value(), 10);

        model.slider.press();
        model.slider.drag(80, model.duration());
        model.apply(&PlayerNotification::PositionChanged(33_000));
        assert_eq!(model.slider.value(), 80);
        assert_eq!(model.position(), 33_000);

        assert_eq!(model.slider.release(model.duration()), Some(240_000));
        model.apply(&PlayerNotification::PositionChanged(240_000));
        assert_eq!(model.slider.value(), 80);
        assert_eq!(model.slider.label(), "04:00 / 05:00");
    }

    #[test]
    fn test_new_source_clears_stale_state() {
        let mut model = playing_model();
        let cover = CoverArt {
            width: 1,
            height: 1,
            rgba: Arc::from(vec![1u8, 2, 3, 4]),
        };
        model.apply(&PlayerNotification::CoverArtChanged(Some(cover)));
        model.apply(&PlayerNotification::PositionChanged(90_000));
        model.apply(&PlayerNotification::Error("Seek error".into()));
        let revision = model.cover_revision();

        model.apply(&PlayerNotification::SourceChanged(
            PlaybackSource::from_local_file("/music/next.mp3"),
        ));
        assert!(model.cover().is_none());
        assert!(model.cover_revision() > revision);
        assert_eq!(model.duration(), 0);
        assert_eq!(model.slider.value(), 0);
        assert_eq!(model.last_error(), None);
        assert_eq!(model.track_name(), Some("next.mp3"));
    }

    #[test]
    fn test_volume_sync_only_on_change() {
        let mut model = DisplayModel::new();
        assert!(model.on_volume(50));
        assert!(!model.on_volume(50));
        model.apply(&PlayerNotification::VolumeChanged(70));
        assert_eq!(model.volume(), 70);
    }
}
