//! Settings-related commands
//!
//! Commands for the appearance preference.

use crate::app::AppState;
use crate::error::Result;
use crate::models::AppTheme;

/// Get current theme
pub async fn get_theme(state: &AppState) -> Result<AppTheme> {
    state.settings_service.load().await
}

/// Flip dark mode
pub async fn toggle_dark_mode(state: &AppState) -> Result<AppTheme> {
    state.settings_service.toggle_dark_mode().await
}

/// Update any combination of theme fields
pub async fn update_theme(
    state: &AppState,
    dark_mode: Option<bool>,
    accent_color: Option<String>,
) -> Result<AppTheme> {
    // Validate the colour first so a bad value changes nothing
    if let Some(color) = accent_color {
        state.settings_service.set_accent_color(&color).await?;
    }
    if let Some(dark) = dark_mode {
        state.settings_service.set_dark_mode(dark).await?;
    }
    state.settings_service.load().await
}
