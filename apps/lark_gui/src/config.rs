//! 应用配置
//!
//! 从工作目录下可选的 `lark.json` 读取，命令行参数可覆盖音乐目录。

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 配置错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 浏览器的起始目录
    pub music_dir: PathBuf,
    /// 启动音量 (0 - 100)
    pub volume: i32,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            music_dir: PathBuf::from("music"),
            volume: 50,
            window_size: [900.0, 600.0],
        }
    }
}

impl AppConfig {
    pub const FILE_NAME: &'static str = "lark.json";

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&text)?;
        config.volume = config.volume.clamp(0, 100);
        Ok(config)
    }

    /// 读取配置；文件不存在或无效时使用默认值
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// 第一个位置参数作为音乐目录
    pub fn with_args(mut self, mut args: impl Iterator<Item = String>) -> Self {
        if let Some(dir) = args.next() {
            self.music_dir = PathBuf::from(dir);
        }
        self
    }
}
