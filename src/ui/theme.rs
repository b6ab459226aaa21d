use ratatui::style::Color;

/// Fixed dark palette for the control surface.
pub struct SkyTheme {
    pub bg_dark: Color,
    pub fg_secondary: Color,
    pub fg_muted: Color,
    pub accent_primary: Color,
    pub accent_highlight: Color,
    pub border_focused: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

pub fn sky_theme() -> SkyTheme {
    SkyTheme {
        bg_dark: Color::Rgb(18, 22, 30),
        fg_secondary: Color::Rgb(160, 170, 185),
        fg_muted: Color::Rgb(95, 105, 120),
        accent_primary: Color::Rgb(110, 170, 250),
        accent_highlight: Color::Rgb(150, 205, 255),
        border_focused: Color::Rgb(70, 110, 170),
        success: Color::Rgb(140, 210, 150),
        warning: Color::Rgb(235, 195, 110),
        error: Color::Rgb(235, 120, 120),
    }
}
