//! 播放命令和事件定义

use std::sync::Arc;

use crate::PlaybackSource;

/// 播放器命令（控制器 -> 引擎线程）
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// 加载音源，`generation` 用于丢弃旧音源的迟到事件
    Load {
        source: PlaybackSource,
        generation: u64,
    },
    /// 播放
    Play,
    /// 暂停
    Pause,
    /// 停止并释放输出设备
    Stop,
    /// 跳转到指定位置（毫秒）
    Seek(u64),
    /// 设置音量 (0.0 - 1.0)
    SetVolume(f32),
    /// 设置播放速率
    SetRate(f32),
    /// 关闭引擎
    Shutdown,
}

/// 引擎事件（引擎线程 -> 控制器）
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// 播放状态变更
    StateChanged(PlaybackState),
    /// 媒体状态变更
    MediaStatusChanged(MediaStatus),
    /// 播放进度（毫秒）
    Position(u64),
    /// 总时长（毫秒）
    Duration(u64),
    /// 当前音源的元数据
    Metadata(MediaMetadata),
    /// 错误
    Error(String),
}

/// 带加载代次的引擎事件
#[derive(Debug, Clone)]
pub struct TaggedEvent {
    pub generation: u64,
    pub event: EngineEvent,
}

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// 媒体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaStatus {
    /// 没有打开的解码会话
    #[default]
    NoMedia,
    Loading,
    Loaded,
    /// 正在向输出设备供数
    Buffered,
    EndOfMedia,
    InvalidMedia,
}

/// 解码后的封面图像 (RGBA8)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

impl CoverArt {
    /// 解码 PNG/JPEG 等图像数据，无法识别时返回 `None`
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                log::debug!("cover art decode failed: {}", e);
                return None;
            }
        };
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba: Arc::from(image.into_raw()),
        })
    }
}

/// 曲目元数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// 主封面（front cover）
    pub cover_art: Option<CoverArt>,
    /// 备用缩略图
    pub thumbnail: Option<CoverArt>,
}

impl MediaMetadata {
    /// 主封面优先，其次缩略图
    pub fn artwork(&self) -> Option<&CoverArt> {
        self.cover_art.as_ref().or(self.thumbnail.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_cover_decode() {
        let cover = CoverArt::decode(&tiny_png()).unwrap();
        assert_eq!((cover.width, cover.height), (2, 3));
        assert_eq!(cover.rgba.len(), 2 * 3 * 4);
        assert_eq!(&cover.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_cover_decode_rejects_garbage() {
        assert!(CoverArt::decode(&[]).is_none());
        assert!(CoverArt::decode(b"not an image").is_none());
    }

    #[test]
    fn test_artwork_prefers_primary() {
        let primary = CoverArt::decode(&tiny_png()).unwrap();
        let thumb = CoverArt {
            width: 1,
            height: 1,
            rgba: Arc::from(vec![0u8; 4]),
        };

        let mut meta = MediaMetadata {
            thumbnail: Some(thumb.clone()),
            ..Default::default()
        };
        assert_eq!(meta.artwork(), Some(&thumb));

        meta.cover_art = Some(primary.clone());
        assert_eq!(meta.artwork(), Some(&primary));

        assert!(MediaMetadata::default().artwork().is_none());
    }
}
