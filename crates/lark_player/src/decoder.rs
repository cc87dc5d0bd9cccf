//! 音频解码器
//!
//! 使用 symphonia 解码本地音频文件，并读取标签与封面

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{
    MetadataOptions, MetadataRevision, StandardTagKey, StandardVisualKey, Value,
};
use symphonia::core::probe::Hint;

use crate::{CoverArt, MediaMetadata, PlaybackSource};

/// 解码器错误
#[derive(thiserror::Error, Debug)]
pub enum DecoderError {
    #[error("No supported audio track found")]
    NoTrack,
    #[error("Unsupported codec")]
    UnsupportedCodec,
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SymphoniaError> for DecoderError {
    fn from(e: SymphoniaError) -> Self {
        match e {
            SymphoniaError::IoError(e) => DecoderError::Io(e),
            SymphoniaError::Unsupported(what) => DecoderError::UnsupportedFormat(what.to_string()),
            e => DecoderError::Decode(e.to_string()),
        }
    }
}

/// 音频信息
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration: Option<Duration>,
    pub codec: String,
}

impl AudioInfo {
    /// 时长（毫秒），未知时为 0
    pub fn duration_ms(&self) -> u64 {
        self.duration.map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// 音频解码器
pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_buf: Option<SampleBuffer<f32>>,
    pub info: AudioInfo,
    pub metadata: MediaMetadata,
}

impl AudioDecoder {
    /// 打开本地音源，扩展名作为格式探测提示
    pub fn open(source: &PlaybackSource) -> Result<Self, DecoderError> {
        let path = source
            .to_local_file()
            .ok_or_else(|| DecoderError::UnsupportedSource(source.to_string()))?;
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut probe_hint = Hint::new();
        if let Some(ext) = source.extension() {
            probe_hint.with_extension(&ext);
        }

        let mut probed = symphonia::default::get_probe()
            .format(
                &probe_hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(DecoderError::from)?;

        // 容器内的标签优先，其次是容器前的 ID3 等标签
        let mut metadata = MediaMetadata::default();
        if let Some(rev) = probed.format.metadata().current() {
            collect_revision(rev, &mut metadata);
        }
        if let Some(meta) = probed.metadata.get() {
            if let Some(rev) = meta.current() {
                collect_revision(rev, &mut metadata);
            }
        }

        let format = probed.format;

        // 查找第一个音频轨道
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecoderError::NoTrack)?;

        let track_id = track.id;
        let codec_params = &track.codec_params;

        let sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

        let duration = codec_params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / sample_rate as f64));

        let info = AudioInfo {
            sample_rate,
            channels,
            duration,
            codec: format!("{:?}", codec_params.codec),
        };

        let decoder = symphonia::default::get_codecs()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|_| DecoderError::UnsupportedCodec)?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_buf: None,
            info,
            metadata,
        })
    }

    /// 解码下一帧，返回交错的 f32 采样；文件结束时返回 `None`
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>, DecoderError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                // 损坏的包直接跳过
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity();

            // SampleBuffer 的容量按采样数计，解码缓冲按帧数计
            let needed = capacity * spec.channels.count();
            if self.sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
                self.sample_buf = Some(SampleBuffer::new(capacity as u64, spec));
            }
            let Some(sample_buf) = self.sample_buf.as_mut() else {
                continue;
            };
            sample_buf.copy_interleaved_ref(decoded);

            return Ok(Some(sample_buf.samples().to_vec()));
        }
    }

    /// 跳转到指定时间
    pub fn seek(&mut self, time: Duration) -> Result<(), DecoderError> {
        let seek_to = SeekTo::Time {
            time: symphonia::core::units::Time::from(time.as_secs_f64()),
            track_id: Some(self.track_id),
        };

        self.format
            .seek(SeekMode::Accurate, seek_to)
            .map_err(|e| DecoderError::Decode(e.to_string()))?;

        self.decoder.reset();

        Ok(())
    }
}

/// 只读取时长与元数据，不做解码
pub fn probe_metadata(path: &Path) -> Result<(AudioInfo, MediaMetadata), DecoderError> {
    let decoder = AudioDecoder::open(&PlaybackSource::from_local_file(path))?;
    Ok((decoder.info, decoder.metadata))
}

fn collect_revision(rev: &MetadataRevision, metadata: &mut MediaMetadata) {
    for tag in rev.tags() {
        let Value::String(value) = &tag.value else {
            continue;
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match tag.std_key {
            Some(StandardTagKey::TrackTitle) => {
                metadata.title.get_or_insert(value);
            }
            Some(StandardTagKey::Artist) => {
                metadata.artist.get_or_insert(value);
            }
            Some(StandardTagKey::Album) => {
                metadata.album.get_or_insert(value);
            }
            _ => {}
        }
    }

    for visual in rev.visuals() {
        if visual.data.is_empty() {
            continue;
        }
        match visual.usage {
            Some(StandardVisualKey::FrontCover) => {
                if metadata.cover_art.is_none() {
                    metadata.cover_art = CoverArt::decode(&visual.data);
                }
            }
            // 图标或未标注用途的图片作为缩略图
            Some(StandardVisualKey::FileIcon) | Some(StandardVisualKey::OtherIcon) | None => {
                if metadata.thumbnail.is_none() {
                    metadata.thumbnail = CoverArt::decode(&visual.data);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "lark-decoder-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn open_file(path: &Path) -> Result<AudioDecoder, DecoderError> {
        AudioDecoder::open(&PlaybackSource::from_local_file(path))
    }

    /// 写一个 16-bit PCM 单声道 WAV
    fn write_wav(path: &Path, sample_rate: u32, frames: u32) {
        let data_len = frames * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for i in 0..frames {
            let s = ((i % 100) as i16 - 50) * 100;
            out.extend_from_slice(&s.to_le_bytes());
        }
        let mut file = File::create(path).unwrap();
        file.write_all(&out).unwrap();
    }

    #[test]
    fn test_open_wav_info() {
        let path = temp_path("tone.wav");
        write_wav(&path, 8000, 16000);

        let decoder = open_file(&path).unwrap();
        assert_eq!(decoder.info.sample_rate, 8000);
        assert_eq!(decoder.info.channels, 1);
        assert_eq!(decoder.info.duration_ms(), 2000);
        assert!(decoder.metadata.artwork().is_none());
    }

    #[test]
    fn test_decode_until_end() {
        let path = temp_path("short.wav");
        write_wav(&path, 8000, 4000);

        let mut decoder = open_file(&path).unwrap();
        let mut total = 0usize;
        while let Some(samples) = decoder.decode_next().unwrap() {
            total += samples.len();
        }
        assert_eq!(total, 4000);
    }

    #[test]
    fn test_seek_then_decode() {
        let path = temp_path("seek.wav");
        write_wav(&path, 8000, 16000);

        let mut decoder = open_file(&path).unwrap();
        decoder.seek(Duration::from_millis(1500)).unwrap();
        let mut total = 0usize;
        while let Some(samples) = decoder.decode_next().unwrap() {
            total += samples.len();
        }
        assert!(total > 0);
        assert!(total < 16000, "seek had no effect: {} samples", total);
    }

    #[test]
    fn test_open_garbage_fails() {
        let path = temp_path("noise.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(open_file(&path).is_err());

        let missing = temp_path("missing.flac");
        assert!(matches!(
            open_file(&missing),
            Err(DecoderError::Io(_))
        ));
    }

    #[test]
    fn test_open_uri_is_unsupported() {
        let source = PlaybackSource::parse("http://radio.example/live.ogg").unwrap();
        assert!(matches!(
            AudioDecoder::open(&source),
            Err(DecoderError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_uppercase_extension_hint() {
        let path = temp_path("LOUD.WAV");
        write_wav(&path, 8000, 800);
        let decoder = open_file(&path).unwrap();
        assert_eq!(decoder.info.duration_ms(), 100);
    }
}
