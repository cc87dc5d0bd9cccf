//! 播放控制器
//!
//! 持有当前音源，把传输命令转发给 [`MediaEngine`]，
//! 并把引擎事件中继为 [`PlayerNotification`] 发给注入的接收端。

use crossbeam_channel::Sender;

use crate::{
    CoverArt, EngineEvent, MediaEngine, MediaMetadata, MediaStatus, PlaybackSource, PlaybackState,
};

/// 控制器通知（控制器 -> UI）
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerNotification {
    PositionChanged(u64),
    DurationChanged(u64),
    PlaybackStateChanged(PlaybackState),
    MediaStatusChanged(MediaStatus),
    /// 每次 `set_volume` 都会发出，即使值没变
    VolumeChanged(i32),
    SourceChanged(PlaybackSource),
    /// 每次加载恰好一次；`None` 表示没有封面
    CoverArtChanged(Option<CoverArt>),
    MetadataChanged(MediaMetadata),
    /// 仅供提示，不代表状态变化
    Error(String),
}

/// 播放控制器
///
/// 所有方法都在 UI 线程上调用；引擎事件通过 [`PlaybackController::process_events`] 取回。
/// 通知接收端应为无界通道，控制器与 UI 共用一个线程。
pub struct PlaybackController<E: MediaEngine> {
    engine: E,
    notify: Sender<PlayerNotification>,
    current_source: Option<PlaybackSource>,
    /// 已发出加载，尚未发布该次加载的元数据
    awaiting_metadata: bool,
}

impl<E: MediaEngine> PlaybackController<E> {
    pub fn new(engine: E, notify: Sender<PlayerNotification>) -> Self {
        Self {
            engine,
            notify,
            current_source: None,
            awaiting_metadata: false,
        }
    }

    fn publish(&self, notification: PlayerNotification) {
        if self.notify.send(notification).is_err() {
            log::debug!("notification receiver dropped");
        }
    }

    /// 设置音源；与当前音源相同时什么也不做
    pub fn set_source(&mut self, source: PlaybackSource) {
        if self.current_source.as_ref() == Some(&source) {
            return;
        }
        log::info!("source: {}", source);
        self.engine.load(&source);
        self.awaiting_metadata = true;
        self.current_source = Some(source.clone());
        self.publish(PlayerNotification::SourceChanged(source));
    }

    /// 暂停时恢复；无媒体但曾设置过音源时重新加载再播放；否则直接播放
    pub fn play(&mut self) {
        if self.engine.playback_state() == PlaybackState::Paused {
            self.engine.play();
        } else if self.engine.media_status() == MediaStatus::NoMedia {
            if let Some(source) = &self.current_source {
                log::debug!("reloading {}", source);
                self.engine.load(source);
                self.awaiting_metadata = true;
                self.engine.play();
            }
        } else {
            self.engine.play();
        }
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    /// 播放中则暂停，否则播放
    pub fn toggle_play(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// 音量百分比，钳制到 [0, 100]
    pub fn set_volume(&mut self, volume: i32) {
        let volume = volume.clamp(0, 100);
        self.engine.set_volume(volume as f32 / 100.0);
        self.publish(PlayerNotification::VolumeChanged(volume));
    }

    /// 跳转（毫秒）。调用方只应在时长已知时调用
    pub fn set_position(&mut self, position: u64) {
        self.engine.set_position(position);
    }

    pub fn set_playback_rate(&mut self, rate: f32) {
        self.engine.set_playback_rate(rate);
    }

    pub fn is_playing(&self) -> bool {
        self.engine.playback_state() == PlaybackState::Playing
    }

    pub fn volume(&self) -> i32 {
        (self.engine.volume() * 100.0).round() as i32
    }

    pub fn duration(&self) -> u64 {
        self.engine.duration()
    }

    pub fn position(&self) -> u64 {
        self.engine.position()
    }

    pub fn playback_rate(&self) -> f32 {
        self.engine.playback_rate()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.engine.playback_state()
    }

    pub fn media_status(&self) -> MediaStatus {
        self.engine.media_status()
    }

    pub fn current_source(&self) -> Option<&PlaybackSource> {
        self.current_source.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// 取回引擎事件并中继给接收端，返回处理的事件数
    pub fn process_events(&mut self) -> usize {
        let events = self.engine.drain_events();
        let count = events.len();
        for event in events {
            self.relay(event);
        }
        count
    }

    fn relay(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Position(pos) => self.publish(PlayerNotification::PositionChanged(pos)),
            EngineEvent::Duration(dur) => self.publish(PlayerNotification::DurationChanged(dur)),
            EngineEvent::StateChanged(state) => {
                self.publish(PlayerNotification::PlaybackStateChanged(state))
            }
            EngineEvent::MediaStatusChanged(status) => {
                self.publish(PlayerNotification::MediaStatusChanged(status));
                // 播完后重播会经过 Loaded，但不是新的加载
                if status == MediaStatus::Loaded && self.awaiting_metadata {
                    self.awaiting_metadata = false;
                    self.publish_track_metadata();
                }
            }
            // 元数据在加载完成时统一发布
            EngineEvent::Metadata(_) => {}
            EngineEvent::Error(message) => {
                log::warn!("playback error: {}", message);
                self.publish(PlayerNotification::Error(message));
            }
        }
    }

    fn publish_track_metadata(&self) {
        let metadata = self.engine.metadata().clone();
        let cover = metadata.artwork().cloned();
        match &cover {
            Some(c) => log::debug!("cover art {}x{}", c.width, c.height),
            None => log::debug!("no cover art"),
        }
        self.publish(PlayerNotification::MetadataChanged(metadata));
        self.publish(PlayerNotification::CoverArtChanged(cover));
    }
}

impl<E: MediaEngine> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        self.engine.stop();
    }
}
