//! Persistence of [`GranularSettings`] in a key-value store.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::{
    settings::{commit, GranularSettings, OperatingMode},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Versioned key of the persisted settings record.
pub const SETTINGS_KEY: &str = "granular-settings.v1";

// -------------------------------------------------------------------------------------------------

/// A persistent string key-value store.
pub trait SettingsStore {
    /// Read the value of the given key. Returns `None` when the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Write or replace the value of the given key.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;
}

// -------------------------------------------------------------------------------------------------

/// A [`SettingsStore`] which keeps values in memory only.
#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    values: HashMap<String, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// A [`SettingsStore`] which writes each key into a separate JSON file in a directory.
///
/// Files get replaced atomically, so an interrupted write never leaves a partially written
/// value behind.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    directory: PathBuf,
}

impl FileSettingsStore {
    /// Create a new store in the given directory. The directory gets created on the first write.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// The store's directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, Error> {
        let is_valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !is_valid {
            return Err(Error::ParameterError(format!(
                "invalid settings key '{key}'"
            )));
        }
        Ok(self.directory.join(format!("{key}.json")))
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.key_path(key)?;
        fs::create_dir_all(&self.directory)?;
        let mut temp_path = path.clone();
        temp_path.set_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.flush()?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Serialize the given settings and write them under [`SETTINGS_KEY`] into the store.
pub fn save_settings(store: &mut dyn SettingsStore, settings: &GranularSettings) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(settings)?;
    store.set(SETTINGS_KEY, &json)
}

/// Load the settings from the store, committed in their mode.
///
/// Never fails: when no settings were stored yet, or the stored record can't be read or
/// parsed, the cinematic default settings are returned.
pub fn load_settings(store: &dyn SettingsStore) -> GranularSettings {
    let settings = match store.get(SETTINGS_KEY) {
        Ok(Some(json)) => match serde_json::from_str::<GranularSettings>(&json) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Failed to parse stored granular settings: {err}. Using defaults...");
                GranularSettings::defaults(OperatingMode::Cinematic)
            }
        },
        Ok(None) => {
            log::debug!("No stored granular settings found. Using defaults...");
            GranularSettings::defaults(OperatingMode::Cinematic)
        }
        Err(err) => {
            log::warn!("Failed to read stored granular settings: {err}. Using defaults...");
            GranularSettings::defaults(OperatingMode::Cinematic)
        }
    };
    commit(&settings)
}

// -------------------------------------------------------------------------------------------------
