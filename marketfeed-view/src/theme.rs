//! Light/dark theme and its persisted preference.
//!
//! The theme is the only state that outlives a session. It is stored as a
//! single string under [`THEME_PREFERENCE_KEY`] in a [`PreferenceStore`]: read
//! once at startup, written on every toggle.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use marketfeed_core::constants::THEME_PREFERENCE_KEY;
use marketfeed_core::error::{MarketError, Result};

/// Display theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background
    #[default]
    Light,
    /// Dark background
    Dark,
}

impl Theme {
    /// Stored preference value.
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The other theme.
    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Icon of the toggle control, showing the theme it switches to.
    pub fn icon(self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(MarketError::InvalidTheme(s.to_string())),
        }
    }
}

/// String key-value store for user preferences.
pub trait PreferenceStore: Send + Sync {
    /// Returns the stored value, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store; preferences last as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a JSON object on disk.
///
/// A missing file reads as empty. Each write replaces the whole file through a
/// temporary sibling, creating parent directories as needed.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FilePreferences {
    /// Creates a store at `path`. Nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            MarketError::PreferenceError(format!("{}: {e}", self.path.display()))
        })
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _read = self.lock.read();
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _write = self.lock.write();
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(&values)?)?;
        fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), key, "Preference saved");
        Ok(())
    }
}

/// The current theme, bound to the store it is persisted in.
pub struct ThemePreference {
    store: Box<dyn PreferenceStore>,
    current: Theme,
}

impl ThemePreference {
    /// Reads the saved theme, falling back to [`Theme::Light`] when it is
    /// missing, unreadable or not a theme.
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let current = match store.get(THEME_PREFERENCE_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring saved theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!(error = %e, "Could not read theme preference");
                Theme::default()
            }
        };

        Self { store, current }
    }

    /// Returns the current theme.
    pub fn current(&self) -> Theme {
        self.current
    }

    /// Switches to the other theme and saves it.
    ///
    /// The in-memory theme changes even if saving fails.
    pub fn toggle(&mut self) -> Result<Theme> {
        self.set(self.current.toggle())
    }

    /// Sets and saves the theme.
    pub fn set(&mut self, theme: Theme) -> Result<Theme> {
        self.current = theme;
        self.store.set(THEME_PREFERENCE_KEY, theme.as_str())?;
        Ok(theme)
    }
}

impl fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemePreference")
            .field("current", &self.current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toggle_and_icon() {
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Light.icon(), "🌙");
        assert_eq!(Theme::Dark.icon(), "☀️");
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().unwrap_err().is_user_input_error());
    }

    #[test]
    fn test_missing_preference_defaults_to_light() {
        let pref = ThemePreference::load(Box::new(MemoryPreferences::new()));
        assert_eq!(pref.current(), Theme::Light);
    }

    #[test]
    fn test_invalid_preference_defaults_to_light() {
        let store = MemoryPreferences::new();
        store.set(THEME_PREFERENCE_KEY, "purple").unwrap();

        let pref = ThemePreference::load(Box::new(store));
        assert_eq!(pref.current(), Theme::Light);
    }

    #[test]
    fn test_toggle_writes_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let mut pref = ThemePreference::load(Box::new(FilePreferences::new(&path)));
        assert_eq!(pref.toggle().unwrap(), Theme::Dark);

        let reloaded = ThemePreference::load(Box::new(FilePreferences::new(&path)));
        assert_eq!(reloaded.current(), Theme::Dark);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"theme\": \"dark\""));
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let store = FilePreferences::new(dir.path().join("preferences.json"));

        store.set("language", "pt-BR").unwrap();
        store.set(THEME_PREFERENCE_KEY, "dark").unwrap();

        assert_eq!(store.get("language").unwrap().as_deref(), Some("pt-BR"));
        assert_eq!(store.get(THEME_PREFERENCE_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        let store = FilePreferences::new(&path);

        store.set(THEME_PREFERENCE_KEY, "dark").unwrap();
        store.set(THEME_PREFERENCE_KEY, "light").unwrap();

        assert!(!path.with_extension("tmp").exists());
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(store.get(THEME_PREFERENCE_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_light() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();

        let store = FilePreferences::new(&path);
        assert!(matches!(store.get(THEME_PREFERENCE_KEY), Err(MarketError::PreferenceError(_))));

        let pref = ThemePreference::load(Box::new(store));
        assert_eq!(pref.current(), Theme::Light);
    }
}
