//! 音源定位符

use std::fmt;
use std::path::{Path, PathBuf};

/// 当前加载的音源：本地文件或 URI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaybackSource {
    File(PathBuf),
    Uri(String),
}

impl PlaybackSource {
    pub fn from_local_file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// 解析定位符。`file://` 前缀归一化为本地路径，空串返回 `None`
    pub fn parse(locator: &str) -> Option<Self> {
        let locator = locator.trim();
        if locator.is_empty() {
            return None;
        }

        if let Some(rest) = locator.strip_prefix("file://") {
            // file:///C:/music -> C:/music
            let bytes = rest.as_bytes();
            let rest = if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' {
                &rest[1..]
            } else {
                rest
            };
            if rest.is_empty() {
                return None;
            }
            return Some(Self::File(PathBuf::from(rest)));
        }

        if locator.contains("://") {
            Some(Self::Uri(locator.to_string()))
        } else {
            Some(Self::File(PathBuf::from(locator)))
        }
    }

    /// 本地文件路径，URI 音源返回 `None`
    pub fn to_local_file(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Uri(_) => None,
        }
    }

    /// 带扩展名的文件名
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::File(path) => path.file_name().map(|s| s.to_string_lossy().into_owned()),
            Self::Uri(uri) => uri
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// 去掉扩展名的文件名，用于窗口标题
    pub fn base_name(&self) -> Option<String> {
        let name = self.file_name()?;
        let stem = match name.find('.') {
            Some(0) | None => name.as_str(),
            Some(idx) => &name[..idx],
        };
        Some(stem.to_string())
    }

    /// 小写扩展名，作为解码探测提示
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl fmt::Display for PlaybackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Uri(uri) => f.write_str(uri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locators() {
        assert_eq!(PlaybackSource::parse(""), None);
        assert_eq!(PlaybackSource::parse("   "), None);
        assert_eq!(PlaybackSource::parse("file://"), None);
        assert_eq!(
            PlaybackSource::parse("/music/a.mp3"),
            Some(PlaybackSource::File(PathBuf::from("/music/a.mp3")))
        );
        assert_eq!(
            PlaybackSource::parse("file:///music/a.mp3"),
            Some(PlaybackSource::File(PathBuf::from("/music/a.mp3")))
        );
        assert_eq!(
            PlaybackSource::parse("file:///C:/music/a.mp3"),
            Some(PlaybackSource::File(PathBuf::from("C:/music/a.mp3")))
        );
        assert_eq!(
            PlaybackSource::parse("http://radio.example/stream.ogg"),
            Some(PlaybackSource::Uri("http://radio.example/stream.ogg".into()))
        );
    }

    #[test]
    fn test_names() {
        let src = PlaybackSource::from_local_file("/music/Artist - Song.Live.FLAC");
        assert_eq!(src.file_name().as_deref(), Some("Artist - Song.Live.FLAC"));
        assert_eq!(src.base_name().as_deref(), Some("Artist - Song"));
        assert_eq!(src.extension().as_deref(), Some("flac"));

        let uri = PlaybackSource::parse("http://radio.example/live/stream.ogg").unwrap();
        assert_eq!(uri.file_name().as_deref(), Some("stream.ogg"));
        assert_eq!(uri.to_local_file(), None);

        let hidden = PlaybackSource::from_local_file("/music/.intro");
        assert_eq!(hidden.base_name().as_deref(), Some(".intro"));
    }
}
