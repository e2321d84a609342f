//! Settings service
//!
//! Manages the appearance preference, persisted as its own JSON blob
//! independent of the task collection.

use crate::config::THEME_STORAGE_KEY;
use crate::error::{AppError, Result};
use crate::models::AppTheme;
use crate::storage::BlobStore;

/// Service for managing the theme preference
#[derive(Clone)]
pub struct SettingsService {
    store: BlobStore,
}

impl SettingsService {
    pub fn new(store: BlobStore) -> Self {
        Self { store }
    }

    /// Load the theme, creating the default if none was saved.
    ///
    /// An unreadable blob falls back to the default theme.
    pub async fn load(&self) -> Result<AppTheme> {
        let Some(content) = self.store.read(THEME_STORAGE_KEY).await? else {
            tracing::info!("Theme not found, creating default theme");
            let default = AppTheme::default();
            self.save(&default).await?;
            return Ok(default);
        };

        match serde_json::from_slice(&content) {
            Ok(theme) => Ok(theme),
            Err(e) => {
                tracing::warn!("Failed to parse theme, using default: {}", e);
                Ok(AppTheme::default())
            }
        }
    }

    /// Save the theme
    pub async fn save(&self, theme: &AppTheme) -> Result<()> {
        validate_accent_color(&theme.accent_color)?;

        let content = serde_json::to_vec_pretty(theme)?;
        self.store.write(THEME_STORAGE_KEY, &content).await?;
        tracing::info!("Theme saved (dark mode: {})", theme.dark_mode);

        Ok(())
    }

    /// Flip dark mode
    pub async fn toggle_dark_mode(&self) -> Result<AppTheme> {
        let mut theme = self.load().await?;
        theme.dark_mode = !theme.dark_mode;
        self.save(&theme).await?;
        Ok(theme)
    }

    pub async fn set_dark_mode(&self, dark_mode: bool) -> Result<AppTheme> {
        let mut theme = self.load().await?;
        theme.dark_mode = dark_mode;
        self.save(&theme).await?;
        Ok(theme)
    }

    /// Update the accent colour (`#rgb` or `#rrggbb`)
    pub async fn set_accent_color(&self, color: &str) -> Result<AppTheme> {
        let color = color.trim().to_lowercase();
        validate_accent_color(&color)?;

        let mut theme = self.load().await?;
        theme.accent_color = color;
        self.save(&theme).await?;
        Ok(theme)
    }
}

fn validate_accent_color(color: &str) -> Result<()> {
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));

    if !valid {
        return Err(AppError::InvalidInput(format!(
            "Invalid accent color '{}'. Use #rgb or #rrggbb",
            color
        )));
    }
    Ok(())
}
