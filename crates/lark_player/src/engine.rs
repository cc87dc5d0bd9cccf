//! 播放引擎
//!
//! 引擎线程持有解码器与输出设备，通过通道接收命令、回送事件。
//! [`EngineHandle`] 在调用方线程上实现 [`MediaEngine`]。

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError, TrySendError};

use crate::{
    AudioDecoder, AudioOutput, DecoderError, EngineEvent, MediaMetadata, MediaStatus, OutputConfig,
    PlaybackSource, PlaybackState, PlayerCommand, RateAdapter, TaggedEvent, MAX_PLAYBACK_RATE,
    MIN_PLAYBACK_RATE,
};

/// 控制器所见的媒体引擎
///
/// 命令立即返回，结果以事件形式由 [`MediaEngine::drain_events`] 取回。
/// 读取器反映引擎自身的状态。
pub trait MediaEngine {
    /// 异步加载音源，取代任何进行中的加载
    fn load(&mut self, source: &PlaybackSource);
    fn play(&mut self);
    fn pause(&mut self);
    /// 停止并释放解码会话与输出设备
    fn stop(&mut self);
    /// 跳转（毫秒），无媒体时忽略
    fn set_position(&mut self, position_ms: u64);
    /// 音量 0.0 - 1.0
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    fn set_playback_rate(&mut self, rate: f32);
    fn playback_rate(&self) -> f32;
    fn playback_state(&self) -> PlaybackState;
    fn media_status(&self) -> MediaStatus;
    fn position(&self) -> u64;
    fn duration(&self) -> u64;
    fn metadata(&self) -> &MediaMetadata;
    /// 取回自上次调用以来属于当前音源的事件
    fn drain_events(&mut self) -> Vec<EngineEvent>;
}

/// 引擎错误
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// 引擎参数
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 命令循环间隔
    pub tick: Duration,
    /// 播放中的进度事件间隔
    pub position_interval: Duration,
    /// 输出缓冲（帧）
    pub buffer_frames: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(5),
            position_interval: Duration::from_millis(100),
            buffer_frames: 8192,
        }
    }
}

const COMMAND_QUEUE: usize = 64;

/// 启动播放引擎
pub fn spawn_engine(config: EngineConfig) -> Result<EngineHandle, EngineError> {
    let (cmd_tx, cmd_rx) = bounded(COMMAND_QUEUE);
    // 调用方可能长时间不取事件（窗口最小化），引擎线程不能因此阻塞
    let (evt_tx, evt_rx) = unbounded();

    let thread = thread::Builder::new()
        .name("lark-engine".into())
        .spawn(move || run_engine(cmd_rx, evt_tx, config))?;

    log::debug!("engine thread started");

    Ok(EngineHandle {
        cmd_tx,
        evt_rx,
        thread: Some(thread),
        generation: 0,
        mirror: EngineMirror::default(),
        volume: 1.0,
        rate: 1.0,
    })
}

/// 调用方线程上看到的引擎状态
#[derive(Debug, Default)]
struct EngineMirror {
    state: PlaybackState,
    status: MediaStatus,
    position: u64,
    duration: u64,
    metadata: MediaMetadata,
}

impl EngineMirror {
    fn apply(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::StateChanged(state) => self.state = *state,
            EngineEvent::MediaStatusChanged(status) => self.status = *status,
            EngineEvent::Position(pos) => self.position = *pos,
            EngineEvent::Duration(dur) => self.duration = *dur,
            EngineEvent::Metadata(meta) => self.metadata = meta.clone(),
            EngineEvent::Error(_) => {}
        }
    }
}

/// 播放引擎句柄
///
/// drop 时关闭并等待引擎线程，设备随之释放。
pub struct EngineHandle {
    cmd_tx: Sender<PlayerCommand>,
    evt_rx: Receiver<TaggedEvent>,
    thread: Option<JoinHandle<()>>,
    generation: u64,
    mirror: EngineMirror,
    volume: f32,
    rate: f32,
}

impl EngineHandle {
    /// 不阻塞调用方；队列满或引擎已退出时丢弃命令
    fn send(&self, cmd: PlayerCommand) {
        match self.cmd_tx.try_send(cmd) {
            Ok(()) => {}
            Err(TrySendError::Full(cmd)) => log::warn!("engine busy, dropped {:?}", cmd),
            Err(TrySendError::Disconnected(_)) => {
                log::error!("engine thread is gone, command dropped")
            }
        }
    }
}

impl MediaEngine for EngineHandle {
    fn load(&mut self, source: &PlaybackSource) {
        self.generation += 1;
        self.mirror = EngineMirror {
            status: MediaStatus::Loading,
            ..Default::default()
        };
        self.send(PlayerCommand::Load {
            source: source.clone(),
            generation: self.generation,
        });
    }

    fn play(&mut self) {
        self.send(PlayerCommand::Play);
    }

    fn pause(&mut self) {
        self.send(PlayerCommand::Pause);
    }

    fn stop(&mut self) {
        // stop 的结果是确定的，先反映到本地
        self.mirror.state = PlaybackState::Stopped;
        self.mirror.status = MediaStatus::NoMedia;
        self.mirror.position = 0;
        self.mirror.duration = 0;
        self.send(PlayerCommand::Stop);
    }

    fn set_position(&mut self, position_ms: u64) {
        self.send(PlayerCommand::Seek(position_ms));
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.send(PlayerCommand::SetVolume(self.volume));
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_playback_rate(&mut self, rate: f32) {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        }
        self.send(PlayerCommand::SetRate(rate));
    }

    fn playback_rate(&self) -> f32 {
        self.rate
    }

    fn playback_state(&self) -> PlaybackState {
        self.mirror.state
    }

    fn media_status(&self) -> MediaStatus {
        self.mirror.status
    }

    fn position(&self) -> u64 {
        self.mirror.position
    }

    fn duration(&self) -> u64 {
        self.mirror.duration
    }

    fn metadata(&self) -> &MediaMetadata {
        &self.mirror.metadata
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        for tagged in self.evt_rx.try_iter() {
            // 旧音源的迟到事件
            if tagged.generation != self.generation {
                continue;
            }
            self.mirror.apply(&tagged.event);
            events.push(tagged.event);
        }
        events
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            // 命令队列满时重试，直到关闭命令送达
            let mut shutdown_sent = false;
            while !thread.is_finished() {
                if !shutdown_sent {
                    shutdown_sent = !matches!(
                        self.cmd_tx.try_send(PlayerCommand::Shutdown),
                        Err(TrySendError::Full(_))
                    );
                }
                thread::sleep(Duration::from_millis(1));
            }
            if thread.join().is_err() {
                log::error!("engine thread panicked");
            }
        }
        log::debug!("engine thread stopped");
    }
}

fn run_engine(cmd_rx: Receiver<PlayerCommand>, evt_tx: Sender<TaggedEvent>, config: EngineConfig) {
    let tick = config.tick;
    let mut state = EngineState::new(evt_tx, config);

    'outer: loop {
        // 处理所有待处理命令
        loop {
            match cmd_rx.try_recv() {
                Ok(cmd) => {
                    if !state.handle_command(cmd) {
                        break 'outer;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'outer,
            }
        }

        if state.playback_state == PlaybackState::Playing {
            state.fill_output();
            state.update_position();
        }

        thread::sleep(tick);
    }

    state.release_track();
}

struct EngineState {
    evt_tx: Sender<TaggedEvent>,
    config: EngineConfig,
    generation: u64,
    playback_state: PlaybackState,
    media_status: MediaStatus,
    current_track: Option<LoadedTrack>,
    volume: f32,
    rate: f32,
    /// 上次重置输出计数时的媒体位置（毫秒）
    position_base: u64,
    duration: u64,
    last_position_update: Instant,
    last_reported_position: u64,
}

struct LoadedTrack {
    decoder: AudioDecoder,
    output: AudioOutput,
    adapter: RateAdapter,
    /// 输出缓冲写不下的采样
    pending: Vec<f32>,
    decoder_finished: bool,
}

impl EngineState {
    fn new(evt_tx: Sender<TaggedEvent>, config: EngineConfig) -> Self {
        Self {
            evt_tx,
            config,
            generation: 0,
            playback_state: PlaybackState::Stopped,
            media_status: MediaStatus::NoMedia,
            current_track: None,
            volume: 1.0,
            rate: 1.0,
            position_base: 0,
            duration: 0,
            last_position_update: Instant::now(),
            last_reported_position: 0,
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.evt_tx.send(TaggedEvent {
            generation: self.generation,
            event,
        });
    }

    fn handle_command(&mut self, cmd: PlayerCommand) -> bool {
        match cmd {
            PlayerCommand::Load { source, generation } => {
                self.generation = generation;
                self.load_track(&source);
            }
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::Seek(pos) => self.seek(pos),
            PlayerCommand::SetVolume(vol) => {
                self.volume = vol.clamp(0.0, 1.0);
                if let Some(track) = &self.current_track {
                    track.output.set_volume(self.volume);
                }
            }
            PlayerCommand::SetRate(rate) => self.set_rate(rate),
            PlayerCommand::Shutdown => return false,
        }
        true
    }

    fn load_track(&mut self, source: &PlaybackSource) {
        self.release_track();
        self.position_base = 0;
        self.duration = 0;
        self.set_state(PlaybackState::Stopped);
        self.set_status(MediaStatus::Loading);
        self.report_position(0);

        let decoder = match AudioDecoder::open(source) {
            Ok(d) => d,
            Err(e @ DecoderError::UnsupportedSource(_)) => {
                self.fail_load(e.to_string());
                return;
            }
            Err(e) => {
                self.fail_load(format!("Failed to open {}: {}", source, e));
                return;
            }
        };

        let info = &decoder.info;
        let output_config = OutputConfig {
            sample_rate: info.sample_rate,
            channels: info.channels as u16,
            buffer_frames: self.config.buffer_frames,
        };

        let output = match AudioOutput::new(output_config) {
            Ok(o) => o,
            Err(e) => {
                self.fail_load(format!("Audio output error: {}", e));
                return;
            }
        };
        output.set_volume(self.volume);

        let mut adapter = RateAdapter::new(info.channels);
        adapter.set_rate(self.rate as f64);

        log::info!(
            "loaded {} ({}, {} Hz, {} ch, {} ms)",
            source,
            info.codec,
            info.sample_rate,
            info.channels,
            info.duration_ms()
        );

        self.duration = info.duration_ms();
        let metadata = decoder.metadata.clone();

        self.current_track = Some(LoadedTrack {
            decoder,
            output,
            adapter,
            pending: Vec::new(),
            decoder_finished: false,
        });

        self.emit(EngineEvent::Duration(self.duration));
        self.emit(EngineEvent::Metadata(metadata));
        self.set_status(MediaStatus::Loaded);
    }

    fn fail_load(&mut self, message: String) {
        log::warn!("{}", message);
        self.emit(EngineEvent::Error(message));
        self.set_status(MediaStatus::InvalidMedia);
        self.set_state(PlaybackState::Stopped);
    }

    fn play(&mut self) {
        if self.current_track.is_none() {
            log::debug!("play ignored: no media loaded");
            return;
        }
        if self.media_status == MediaStatus::EndOfMedia {
            self.seek(0);
        }
        if let Some(track) = &self.current_track {
            track.output.set_playing(true);
        }
        self.set_state(PlaybackState::Playing);
        self.set_status(MediaStatus::Buffered);
    }

    fn pause(&mut self) {
        if let Some(track) = &self.current_track {
            if self.playback_state != PlaybackState::Paused {
                track.output.set_playing(false);
                self.set_state(PlaybackState::Paused);
            }
        }
    }

    fn stop(&mut self) {
        self.release_track();
        self.position_base = 0;
        self.set_state(PlaybackState::Stopped);
        self.report_position(0);
        if self.duration != 0 {
            self.duration = 0;
            self.emit(EngineEvent::Duration(0));
        }
        self.set_status(MediaStatus::NoMedia);
    }

    fn seek(&mut self, pos: u64) {
        let pos = if self.duration > 0 {
            pos.min(self.duration)
        } else {
            pos
        };
        let Some(track) = &mut self.current_track else {
            return;
        };

        if let Err(e) = track.decoder.seek(Duration::from_millis(pos)) {
            let message = format!("Seek error: {}", e);
            log::warn!("{}", message);
            self.emit(EngineEvent::Error(message));
            return;
        }

        track.output.clear();
        track.output.reset_position();
        track.adapter.reset();
        track.pending.clear();
        track.decoder_finished = false;
        self.position_base = pos;
        self.report_position(pos);

        if self.media_status == MediaStatus::EndOfMedia {
            self.set_status(MediaStatus::Loaded);
        }
    }

    fn set_rate(&mut self, rate: f32) {
        if !rate.is_finite() || rate <= 0.0 {
            log::warn!("ignoring playback rate {}", rate);
            return;
        }
        // 以当前位置为基准重新计数
        self.position_base = self.current_position();
        self.rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        if let Some(track) = &mut self.current_track {
            track.output.reset_position();
            track.adapter.set_rate(self.rate as f64);
        }
    }

    fn fill_output(&mut self) {
        let mut finished = false;
        let mut decode_error = None;

        if let Some(track) = &mut self.current_track {
            // 先写上次剩下的
            if !track.pending.is_empty() {
                let written = track.output.write(&track.pending);
                track.pending.drain(..written);
            }

            let mut budget = 16;
            while track.pending.is_empty()
                && !track.decoder_finished
                && track.output.needs_data()
                && budget > 0
            {
                budget -= 1;
                match track.decoder.decode_next() {
                    Ok(Some(samples)) => {
                        let samples = track.adapter.process(samples);
                        let written = track.output.write(&samples);
                        if written < samples.len() {
                            track.pending.extend_from_slice(&samples[written..]);
                        }
                    }
                    Ok(None) => track.decoder_finished = true,
                    Err(e) => {
                        decode_error = Some(format!("Decode error: {}", e));
                        break;
                    }
                }
            }

            finished = track.decoder_finished
                && track.pending.is_empty()
                && track.output.buffered() == 0;
        }

        if let Some(message) = decode_error {
            log::warn!("{}", message);
            self.emit(EngineEvent::Error(message));
            if let Some(track) = &self.current_track {
                track.output.set_playing(false);
            }
            self.set_state(PlaybackState::Stopped);
            self.set_status(MediaStatus::InvalidMedia);
            return;
        }

        if finished {
            if let Some(track) = &self.current_track {
                track.output.set_playing(false);
            }
            let end = self.current_position().max(self.duration);
            self.report_position(end);
            self.set_state(PlaybackState::Stopped);
            self.set_status(MediaStatus::EndOfMedia);
        }
    }

    fn current_position(&self) -> u64 {
        let Some(track) = &self.current_track else {
            return self.position_base;
        };
        let rate = track.output.sample_rate().max(1) as f64;
        let played_ms = track.output.frames_played() as f64 * self.rate as f64 * 1000.0 / rate;
        let pos = self.position_base + played_ms as u64;
        if self.duration > 0 {
            pos.min(self.duration)
        } else {
            pos
        }
    }

    fn update_position(&mut self) {
        if self.last_position_update.elapsed() < self.config.position_interval {
            return;
        }
        self.last_position_update = Instant::now();

        self.report_position(self.current_position());
    }

    /// 只在位置变化时发出进度事件
    fn report_position(&mut self, pos: u64) {
        if pos != self.last_reported_position {
            self.last_reported_position = pos;
            self.emit(EngineEvent::Position(pos));
        }
    }

    /// 释放解码器与输出设备
    fn release_track(&mut self) {
        if let Some(track) = self.current_track.take() {
            track.output.set_playing(false);
            log::debug!("released output device");
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.playback_state != state {
            self.playback_state = state;
            self.emit(EngineEvent::StateChanged(state));
        }
    }

    fn set_status(&mut self, status: MediaStatus) {
        if self.media_status != status {
            self.media_status = status;
            self.emit(EngineEvent::MediaStatusChanged(status));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_until<F>(handle: &mut EngineHandle, mut done: F) -> Vec<EngineEvent>
    where
        F: FnMut(&EngineEvent) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            for event in handle.drain_events() {
                let stop = done(&event);
                seen.push(event);
                if stop {
                    return seen;
                }
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out, saw {:?}", seen);
    }

    #[test]
    fn test_load_missing_file_reports_error() {
        let mut handle = spawn_engine(EngineConfig::default()).unwrap();
        let source = PlaybackSource::from_local_file("/nonexistent/lark/track.mp3");
        handle.load(&source);
        assert_eq!(handle.media_status(), MediaStatus::Loading);

        let events = drain_until(&mut handle, |e| {
            *e == EngineEvent::MediaStatusChanged(MediaStatus::InvalidMedia)
        });
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::Error(msg) if msg.contains("track.mp3"))));
        assert_eq!(handle.media_status(), MediaStatus::InvalidMedia);
        assert_eq!(handle.playback_state(), PlaybackState::Stopped);
        // 位置本来就是 0
        assert!(!events.iter().any(|e| matches!(e, EngineEvent::Position(_))));
    }

    #[test]
    fn test_uri_source_is_unsupported() {
        let mut handle = spawn_engine(EngineConfig::default()).unwrap();
        let source = PlaybackSource::parse("http://radio.example/live.ogg").unwrap();
        handle.load(&source);

        let events = drain_until(&mut handle, |e| {
            *e == EngineEvent::MediaStatusChanged(MediaStatus::InvalidMedia)
        });
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::Error(msg) if msg.contains("Unsupported source"))));
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut handle = spawn_engine(EngineConfig::default()).unwrap();
        handle.load(&PlaybackSource::from_local_file("/nonexistent/a.mp3"));
        handle.load(&PlaybackSource::from_local_file("/nonexistent/b.mp3"));

        let events = drain_until(&mut handle, |e| {
            *e == EngineEvent::MediaStatusChanged(MediaStatus::InvalidMedia)
        });
        assert!(!events
            .iter()
            .any(|e| matches!(e, EngineEvent::Error(msg) if msg.contains("a.mp3"))));
    }

    #[test]
    fn test_undrained_loads_do_not_block() {
        let started = Instant::now();
        let mut handle = spawn_engine(EngineConfig::default()).unwrap();
        for i in 0..300 {
            handle.load(&PlaybackSource::from_local_file(format!(
                "/nonexistent/lark/{}.mp3",
                i
            )));
        }
        handle.set_volume(0.5);
        drop(handle);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_stop_and_seek_without_media_emit_nothing() {
        let (tx, rx) = unbounded();
        let mut state = EngineState::new(tx, EngineConfig::default());
        state.stop();
        state.stop();
        state.seek(1500);
        state.play();
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_volume_and_rate_accessors() {
        let mut handle = spawn_engine(EngineConfig::default()).unwrap();
        handle.set_volume(1.7);
        assert_eq!(handle.volume(), 1.0);
        handle.set_volume(0.29);
        assert_eq!(handle.volume(), 0.29);

        handle.set_playback_rate(2.0);
        assert_eq!(handle.playback_rate(), 2.0);
        handle.set_playback_rate(-1.0);
        assert_eq!(handle.playback_rate(), 2.0);
        handle.set_playback_rate(10.0);
        assert_eq!(handle.playback_rate(), MAX_PLAYBACK_RATE);
    }

    #[test]
    fn test_stop_without_media() {
        let mut handle = spawn_engine(EngineConfig::default()).unwrap();
        handle.stop();
        handle.play();
        handle.set_position(1000);
        assert_eq!(handle.media_status(), MediaStatus::NoMedia);
        assert_eq!(handle.playback_state(), PlaybackState::Stopped);
        assert_eq!(handle.position(), 0);
    }
}
