//! Lark 桌面播放器

mod config;
mod state;
mod ui;

use std::path::Path;
use std::time::Duration;

use eframe::egui;
use lark_player::{spawn_engine, EngineConfig, APP_TITLE};

use config::AppConfig;
use state::AppState;
use ui::{BrowserSidebar, LarkTheme, NowPlaying, PlayerDeck};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load(Path::new(AppConfig::FILE_NAME)).with_args(std::env::args().skip(1));
    log::info!("music directory: {}", config.music_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([520.0, 360.0])
            .with_title(APP_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| {
            LarkTheme::apply(&cc.egui_ctx);

            let engine = spawn_engine(EngineConfig::default())?;
            Ok(Box::new(LarkApp::new(AppState::new(engine, &config))))
        }),
    )
}

struct LarkApp {
    state: AppState,
    title: String,
}

impl LarkApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            title: APP_TITLE.to_string(),
        }
    }

    fn sync_title(&mut self, ctx: &egui::Context) {
        let title = self.state.display.window_title();
        if title != self.title {
            self.title = title.to_string();
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.title.clone()));
        }
    }
}

impl eframe::App for LarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_events();
        self.sync_title(ctx);

        egui::TopBottomPanel::bottom("player_deck")
            .resizable(false)
            .show(ctx, |ui| {
                PlayerDeck::show(ui, &mut self.state);
            });

        egui::SidePanel::left("browser_sidebar")
            .resizable(true)
            .default_width(280.0)
            .min_width(180.0)
            .show(ctx, |ui| {
                BrowserSidebar::show(ui, &mut self.state);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            NowPlaying::show(ui, &mut self.state);
        });

        // 引擎事件只在帧内取回，空闲时也要定期唤醒
        let interval = if self.state.display.is_playing() {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(250)
        };
        ctx.request_repaint_after(interval);
    }
}
