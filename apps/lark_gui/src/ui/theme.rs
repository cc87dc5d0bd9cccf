//! 主题定义

use egui::{Color32, Rounding, Stroke, Style, Visuals};

/// 暖色深色主题
pub struct LarkTheme;

impl LarkTheme {
    pub const BG_BASE: Color32 = Color32::from_rgb(22, 20, 18);
    pub const BG_PANEL: Color32 = Color32::from_rgb(34, 31, 28);
    pub const BG_RAISED: Color32 = Color32::from_rgb(46, 42, 38);
    pub const ACCENT: Color32 = Color32::from_rgb(214, 164, 84);
    pub const TEXT: Color32 = Color32::from_rgb(236, 230, 220);
    pub const TEXT_DIM: Color32 = Color32::from_rgb(150, 142, 132);
    pub const ERROR: Color32 = Color32::from_rgb(220, 96, 80);
    pub const BORDER: Color32 = Color32::from_rgb(64, 58, 52);

    pub fn apply(ctx: &egui::Context) {
        let mut style = Style::default();
        let mut visuals = Visuals::dark();

        visuals.panel_fill = Self::BG_BASE;
        visuals.window_fill = Self::BG_PANEL;
        visuals.extreme_bg_color = Self::BG_BASE;
        visuals.faint_bg_color = Self::BG_PANEL;

        let round = Rounding::same(6.0);
        visuals.widgets.noninteractive.bg_fill = Self::BG_PANEL;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Self::TEXT_DIM);
        visuals.widgets.noninteractive.rounding = round;

        visuals.widgets.inactive.bg_fill = Self::BG_RAISED;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Self::TEXT);
        visuals.widgets.inactive.rounding = round;

        visuals.widgets.hovered.bg_fill = Self::ACCENT.gamma_multiply(0.3);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Self::TEXT);
        visuals.widgets.hovered.rounding = round;

        visuals.widgets.active.bg_fill = Self::ACCENT;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, Self::BG_BASE);
        visuals.widgets.active.rounding = round;

        visuals.selection.bg_fill = Self::ACCENT.gamma_multiply(0.4);
        visuals.selection.stroke = Stroke::new(1.0, Self::ACCENT);
        visuals.window_stroke = Stroke::new(1.0, Self::BORDER);

        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        style.spacing.button_padding = egui::vec2(10.0, 4.0);

        ctx.set_style(style);
    }
}
