//! 音频输出
//!
//! 使用 cpal 进行音频播放

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};

/// 音频输出错误
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("No output device available")]
    NoDevice,
    #[error("No supported config for {channels} ch @ {sample_rate} Hz")]
    NoConfig { sample_rate: u32, channels: u16 },
    #[error("Stream error: {0}")]
    Stream(String),
}

/// 音频输出配置
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// 环形缓冲区容量（帧）
    pub buffer_frames: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_frames: 8192,
        }
    }
}

/// 音频输出流
///
/// 持有设备流；drop 即释放设备。
pub struct AudioOutput {
    _stream: Stream,
    ring: Arc<RingBuffer>,
    is_playing: Arc<AtomicBool>,
    volume_bits: Arc<AtomicU32>,
    frames_played: Arc<AtomicU64>,
    sample_rate: u32,
}

impl AudioOutput {
    /// 在默认设备上创建音频输出
    pub fn new(config: OutputConfig) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(OutputError::NoDevice)?;

        Self::with_device(&device, config)
    }

    /// 使用指定设备创建音频输出
    pub fn with_device(device: &Device, config: OutputConfig) -> Result<Self, OutputError> {
        let no_config = || OutputError::NoConfig {
            sample_rate: config.sample_rate,
            channels: config.channels,
        };

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| OutputError::Stream(e.to_string()))?
            .find(|c| {
                c.channels() == config.channels
                    && c.min_sample_rate().0 <= config.sample_rate
                    && c.max_sample_rate().0 >= config.sample_rate
                    && c.sample_format() == SampleFormat::F32
            })
            .ok_or_else(no_config)?;

        let stream_config: StreamConfig = supported_config
            .with_sample_rate(cpal::SampleRate(config.sample_rate))
            .into();

        let channels = config.channels.max(1) as usize;
        let ring = Arc::new(RingBuffer::new(config.buffer_frames * channels));
        let is_playing = Arc::new(AtomicBool::new(false));
        let volume_bits = Arc::new(AtomicU32::new(1.0f32.to_bits()));
        let frames_played = Arc::new(AtomicU64::new(0));

        let ring_cb = ring.clone();
        let playing_cb = is_playing.clone();
        let volume_cb = volume_bits.clone();
        let played_cb = frames_played.clone();

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !playing_cb.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }

                    let read = ring_cb.read(data);
                    data[read..].fill(0.0);

                    let volume = f32::from_bits(volume_cb.load(Ordering::Relaxed));
                    if volume < 1.0 {
                        for sample in &mut data[..read] {
                            *sample *= volume;
                        }
                    }

                    played_cb.fetch_add((read / channels) as u64, Ordering::Relaxed);
                },
                |err| {
                    log::error!("audio output stream error: {}", err);
                },
                None,
            )
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            ring,
            is_playing,
            volume_bits,
            frames_played,
            sample_rate: config.sample_rate,
        })
    }

    /// 写入交错采样，返回实际写入的采样数
    pub fn write(&self, samples: &[f32]) -> usize {
        self.ring.write(samples)
    }

    /// 缓冲区是否低于半满
    pub fn needs_data(&self) -> bool {
        self.ring.len() < self.ring.capacity() / 2
    }

    /// 缓冲区中尚未播放的采样数
    pub fn buffered(&self) -> usize {
        self.ring.len()
    }

    /// 丢弃尚未播放的采样（seek 后）
    pub fn clear(&self) {
        self.ring.clear();
    }

    pub fn set_playing(&self, playing: bool) {
        self.is_playing.store(playing, Ordering::Relaxed);
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume_bits
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    /// 自上次重置以来播放的帧数
    pub fn frames_played(&self) -> u64 {
        self.frames_played.load(Ordering::Relaxed)
    }

    pub fn reset_position(&self) {
        self.frames_played.store(0, Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// 有界采样缓冲区，满时拒绝写入
pub(crate) struct RingBuffer {
    buffer: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl RingBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    // 音频回调中不能因锁中毒而 panic
    fn lock(&self) -> MutexGuard<'_, VecDeque<f32>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    pub(crate) fn write(&self, data: &[f32]) -> usize {
        let mut buf = self.lock();
        let room = self.capacity.saturating_sub(buf.len());
        let n = room.min(data.len());
        buf.extend(data[..n].iter().copied());
        n
    }

    pub(crate) fn read(&self, output: &mut [f32]) -> usize {
        let mut buf = self.lock();
        let to_read = output.len().min(buf.len());

        let (a, b) = buf.as_slices();
        let a_len = a.len().min(to_read);
        output[..a_len].copy_from_slice(&a[..a_len]);
        let b_len = to_read - a_len;
        if b_len > 0 {
            output[a_len..to_read].copy_from_slice(&b[..b_len]);
        }

        buf.drain(..to_read);
        to_read
    }
}
