//! paybridge theme command

use bus::{EventBus, FileStorage, ThemeController};
use clap::{Args, Subcommand};
use shared::Theme;
use std::path::Path;

#[derive(Debug, Args)]
pub struct ThemeCommand {
    #[command(subcommand)]
    pub action: Option<ThemeAction>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ThemeAction {
    /// Switch between light and dark
    Toggle,
    /// Use the light theme
    Light,
    /// Use the dark theme
    Dark,
}

impl ThemeCommand {
    /// Apply the action to the preference stored at `settings`
    pub fn apply(&self, settings: &Path) -> anyhow::Result<Theme> {
        let controller = ThemeController::new(Box::new(FileStorage::new(settings)), EventBus::new(), false);
        let theme = match self.action {
            None => controller.current(),
            Some(ThemeAction::Toggle) => controller.toggle()?,
            Some(ThemeAction::Light) => {
                controller.set(Theme::Light)?;
                Theme::Light
            }
            Some(ThemeAction::Dark) => {
                controller.set(Theme::Dark)?;
                Theme::Dark
            }
        };
        Ok(theme)
    }

    pub fn run(&self, settings: &Path) -> anyhow::Result<()> {
        let theme = self.apply(settings)?;
        println!("Theme: {}", theme.as_str());
        Ok(())
    }
}
