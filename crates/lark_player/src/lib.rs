//! lark_player - 播放引擎与播放控制器
//!
//! 引擎线程负责解码和输出，控制器在 UI 线程上转发命令、中继引擎事件。

mod command;
mod controller;
mod decoder;
mod display;
mod engine;
mod format;
mod output;
mod rate;
mod source;

pub use command::*;
pub use controller::*;
pub use decoder::*;
pub use display::*;
pub use engine::*;
pub use format::*;
pub use output::*;
pub use rate::*;
pub use source::*;
