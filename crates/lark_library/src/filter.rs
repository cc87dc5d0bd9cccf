//! 音频扩展名过滤

use std::path::Path;

/// 浏览器显示的音频扩展名
pub const AUDIO_EXTENSIONS: [&str; 7] = ["mp3", "wav", "ogg", "flac", "m4a", "aac", "wma"];

/// 扩展名是否在白名单内（不区分大小写）
pub fn is_audio_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_audio_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_filter() {
        assert!(is_audio_file(Path::new("/music/a.mp3")));
        assert!(is_audio_file(Path::new("/music/B.FLAC")));
        assert!(is_audio_file(Path::new("song.M4a")));
        assert!(!is_audio_file(Path::new("cover.jpg")));
        assert!(!is_audio_file(Path::new("mp3")));
        assert!(!is_audio_file(Path::new("notes.mp3.txt")));
    }
}
