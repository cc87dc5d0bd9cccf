//! lark_library - 目录浏览
//!
//! 列出目录中的子目录与音频文件，激活条目时进入目录或请求播放。

mod browser;
mod filter;

pub use browser::*;
pub use filter::*;
