//! UI 模块

pub mod deck;
pub mod now_playing;
pub mod sidebar;
pub mod theme;

pub use deck::PlayerDeck;
pub use now_playing::NowPlaying;
pub use sidebar::BrowserSidebar;
pub use theme::LarkTheme;
