use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::store::KeyValueStore;

pub const THEME_KEY: &str = "appTheme";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    #[default]
    TimeTools,
    Notepad,
    WorkFile,
    Salary,
}

/// UI-only state. Only the theme outlives the session.
pub struct ViewState {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
    section: Section,
}

impl ViewState {
    pub fn load(store: Arc<dyn KeyValueStore>, fallback: Theme) -> Self {
        let theme = match store.get(THEME_KEY) {
            Ok(Some(raw)) => Theme::parse(raw.as_str()).unwrap_or(fallback),
            Ok(None) => fallback,
            Err(err) => {
                warn!(error = %err, "theme preference unreadable");
                fallback
            }
        };
        Self {
            store,
            theme,
            section: Section::default(),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<Theme, StoreError> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(theme)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, StoreError> {
        self.set_theme(self.theme.toggled())
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn switch_to(&mut self, section: Section) {
        self.section = section;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn theme_defaults_and_ignores_garbage() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(ViewState::load(store.clone(), Theme::Dark).theme(), Theme::Dark);
        store.set(THEME_KEY, "purple").unwrap();
        assert_eq!(ViewState::load(store, Theme::Light).theme(), Theme::Light);
    }

    #[test]
    fn toggle_persists_plain_string() {
        let store = Arc::new(MemoryStore::new());
        let mut view = ViewState::load(store.clone(), Theme::Dark);
        assert_eq!(view.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(store.raw(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(ViewState::load(store, Theme::Dark).theme(), Theme::Light);
    }

    #[test]
    fn failed_theme_write_keeps_current_theme() {
        let store = Arc::new(MemoryStore::with_quota(4));
        let mut view = ViewState::load(store, Theme::Dark);
        assert!(view.toggle_theme().is_err());
        assert_eq!(view.theme(), Theme::Dark);
    }

    #[test]
    fn section_switch_is_in_memory() {
        let mut view = ViewState::load(Arc::new(MemoryStore::new()), Theme::Dark);
        assert_eq!(view.section(), Section::TimeTools);
        view.switch_to(Section::WorkFile);
        assert_eq!(view.section(), Section::WorkFile);
    }
}
