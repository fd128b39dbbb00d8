// UI theme preference

use super::store::{KeyValueStore, StoreError};
use std::fmt;
use std::str::FromStr;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
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

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("Unknown theme '{}' (expected dark or light)", other)),
        }
    }
}

pub fn save_theme(store: &mut dyn KeyValueStore, theme: Theme) -> Result<(), StoreError> {
    store.set(THEME_KEY, theme.as_str())
}

/// Stored theme; absent or unknown values give the dark theme
pub fn load_theme(store: &dyn KeyValueStore) -> Theme {
    match store.get(THEME_KEY) {
        Ok(Some(value)) => value.parse().unwrap_or_else(|e| {
            log::warn!("{}", e);
            Theme::default()
        }),
        Ok(None) => Theme::default(),
        Err(e) => {
            log::warn!("Failed to read stored theme: {}", e);
            Theme::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::store::MemoryStore;

    #[test]
    fn test_theme_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(load_theme(&store), Theme::Dark);

        save_theme(&mut store, Theme::Light).unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
        assert_eq!(load_theme(&store), Theme::Light);
    }

    #[test]
    fn test_unknown_value_is_dark() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(load_theme(&store), Theme::Dark);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
        assert_eq!("LIGHT".parse::<Theme>(), Ok(Theme::Light));
    }
}
