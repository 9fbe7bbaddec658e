//! Light palette for the search app.

use layoutlab_core::*;

pub fn search_theme() -> Theme {
    Theme {
        background: Color::from_hex("#F5F0EE"),
        on_background: Color::from_hex("#232323"),
        surface: Color::from_hex("#FFFFFF"),
        on_surface: Color::from_hex("#232323"),
        // Favorite cards.
        surface_variant: Color::from_hex("#888888"),
        on_surface_variant: Color::from_hex("#1C1B1F"),
        primary: Color::from_hex("#6B3A28"),
        on_primary: Color::WHITE,
        secondary_container: Color::from_hex("#E8D4CB"),
        on_secondary_container: Color::from_hex("#2C1610"),
        outline: Color::from_hex("#C9BFBA"),
        focus: Color::from_hex("#6B3A28"),
        ..Theme::default()
    }
}

/// Runs `content` with the app's theme installed.
pub fn SearchTheme<R>(content: impl FnOnce() -> R) -> R {
    with_theme(search_theme(), content)
}
