//! Dashboard theme and styling

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

/// Dark color palette
pub struct ThemeColors;

impl ThemeColors {
    pub const BG_DARK: Color32 = Color32::from_rgb(18, 18, 24);
    pub const BG_MEDIUM: Color32 = Color32::from_rgb(28, 28, 36);
    pub const BG_LIGHT: Color32 = Color32::from_rgb(38, 38, 48);
    pub const BG_HOVER: Color32 = Color32::from_rgb(48, 48, 60);

    pub const ACCENT_PRIMARY: Color32 = Color32::from_rgb(88, 166, 255);
    pub const ACCENT_WARNING: Color32 = Color32::from_rgb(255, 193, 7);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(160, 160, 175);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(100, 100, 115);

    pub const BORDER: Color32 = Color32::from_rgb(50, 50, 65);

    pub const STATUS_RUNNING: Color32 = Color32::from_rgb(46, 204, 113);
    pub const STATUS_STOPPED: Color32 = Color32::from_rgb(160, 160, 175);
    pub const STATUS_ERROR: Color32 = Color32::from_rgb(231, 76, 60);
}

/// Apply the dark theme to egui
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let mut visuals = Visuals::dark();

    visuals.window_fill = ThemeColors::BG_MEDIUM;
    visuals.panel_fill = ThemeColors::BG_DARK;
    visuals.faint_bg_color = ThemeColors::BG_LIGHT;
    visuals.extreme_bg_color = ThemeColors::BG_DARK;

    let rounding = Rounding::same(6.0);
    visuals.widgets.noninteractive.bg_fill = ThemeColors::BG_MEDIUM;
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_SECONDARY);
    visuals.widgets.noninteractive.rounding = rounding;

    visuals.widgets.inactive.bg_fill = ThemeColors::BG_LIGHT;
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    visuals.widgets.inactive.rounding = rounding;

    visuals.widgets.hovered.bg_fill = ThemeColors::BG_HOVER;
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    visuals.widgets.hovered.rounding = rounding;

    visuals.widgets.active.bg_fill = ThemeColors::ACCENT_PRIMARY;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    visuals.widgets.active.rounding = rounding;

    visuals.selection.bg_fill = color_with_alpha(ThemeColors::ACCENT_PRIMARY, 77);
    visuals.selection.stroke = Stroke::new(1.0, ThemeColors::ACCENT_PRIMARY);
    visuals.window_stroke = Stroke::new(1.0, ThemeColors::BORDER);

    style.visuals = visuals;
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);

    style.text_styles = [
        (TextStyle::Small, FontId::new(13.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(15.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(22.0, FontFamily::Proportional)),
    ]
    .into();

    ctx.set_style(style);
}

/// Same color with a different alpha
pub fn color_with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}
