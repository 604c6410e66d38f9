//! Project settings that receive the selected game's keys.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::{info, warn};

use crate::errors::LinkError;
use crate::structs::Game;

/// Settings section that holds the game keys.
pub const SETTINGS_SECTION: &str = "/Script/GameAnalyticsEditor.GameAnalyticsProjectSettings";

/// Target platform. Each platform stores its own key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Ios, Platform::Android];

    pub fn game_key_name(self) -> &'static str {
        match self {
            Platform::Ios => "IosGameKey",
            Platform::Android => "AndroidGameKey",
        }
    }

    pub fn secret_key_name(self) -> &'static str {
        match self {
            Platform::Ios => "IosSecretKey",
            Platform::Android => "AndroidSecretKey",
        }
    }

    pub fn other(self) -> Platform {
        match self {
            Platform::Ios => Platform::Android,
            Platform::Android => Platform::Ios,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => f.write_str("iOS"),
            Platform::Android => f.write_str("Android"),
        }
    }
}

/// Persisted key/value settings, grouped in sections.
pub trait ConfigStore {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn set_string(&mut self, section: &str, key: &str, value: &str);

    /// Writes pending changes to the backing storage.
    fn flush(&mut self) -> Result<(), LinkError>;

    /// Discards in-memory state and reads the backing storage again.
    fn reload(&mut self) -> Result<(), LinkError>;

    /// Drops changes made since the last successful flush or reload.
    fn discard(&mut self);
}

/// Settings file with one TOML table per section.
#[derive(Debug)]
pub struct TomlConfigStore {
    path: PathBuf,
    document: Table,
    /// Last state read from or written to disk.
    persisted: Table,
}

impl TomlConfigStore {
    /// Opens the file at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LinkError> {
        let path = path.into();
        let document = read_document(&path)?;
        Ok(Self {
            path,
            persisted: document.clone(),
            document,
        })
    }

    /// Location of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn settings_error(&self, reason: impl fmt::Display) -> LinkError {
        LinkError::Settings {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

fn read_document(path: &Path) -> Result<Table, LinkError> {
    let to_error = |reason: String| LinkError::Settings {
        path: path.display().to_string(),
        reason,
    };

    match fs::read_to_string(path) {
        Ok(text) => toml::from_str::<Table>(&text).map_err(|e| to_error(e.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Table::new()),
        Err(e) => Err(to_error(e.to_string())),
    }
}

impl ConfigStore for TomlConfigStore {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.document
            .get(section)?
            .get(key)?
            .as_str()
            .map(str::to_string)
    }

    fn set_string(&mut self, section: &str, key: &str, value: &str) {
        let entry = self
            .document
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));

        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }

        if let Value::Table(table) = entry {
            table.insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        let text = toml::to_string(&self.document).map_err(|e| self.settings_error(e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.settings_error(e))?;
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, text).map_err(|e| self.settings_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.settings_error(e))?;

        self.persisted = self.document.clone();
        Ok(())
    }

    fn reload(&mut self) -> Result<(), LinkError> {
        self.document = read_document(&self.path)?;
        self.persisted = self.document.clone();
        Ok(())
    }

    fn discard(&mut self) {
        self.document = self.persisted.clone();
    }
}

/// Game key and secret key stored for `platform`, if both are set.
pub fn stored_keys(store: &impl ConfigStore, platform: Platform) -> Option<(String, String)> {
    let game_key = store.get_string(SETTINGS_SECTION, platform.game_key_name())?;
    let secret_key = store.get_string(SETTINGS_SECTION, platform.secret_key_name())?;
    Some((game_key, secret_key))
}

/// Writes the game's keys for `platform`, flushes and reloads the store.
///
/// Refuses keys already stored for the other platform. On a failed flush the
/// store is left as it was before the call.
pub fn save_game_keys(
    store: &mut impl ConfigStore,
    platform: Platform,
    game: &Game,
) -> Result<(), LinkError> {
    let other = platform.other();
    if store.get_string(SETTINGS_SECTION, other.game_key_name()).as_deref()
        == Some(game.game_key.as_str())
    {
        warn!(
            game = %game.name,
            %platform,
            "game keys already used for {}; not saving",
            other
        );
        return Err(LinkError::KeysInUse(other));
    }

    store.set_string(SETTINGS_SECTION, platform.game_key_name(), &game.game_key);
    store.set_string(SETTINGS_SECTION, platform.secret_key_name(), &game.secret_key);
    if let Err(err) = store.flush() {
        store.discard();
        warn!(%platform, error = %err, "game keys not saved");
        return Err(err);
    }
    store.reload()?;

    info!(%platform, game_key = %game.game_key, "game keys saved");
    Ok(())
}
