// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::emitter::{Emitter, ListenerId};
use crate::error::ConfigError;
use crate::settings::StoreSettings;

/// Holds the current settings and notifies listeners when they change.
pub struct ConfigStore {
    source: Option<PathBuf>,
    current: RwLock<Arc<StoreSettings>>,
    emitter: Emitter<StoreSettings>,
}

impl ConfigStore {
    /// Wraps already-built settings. The store cannot be reloaded.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the settings fail validation.
    pub fn new(settings: StoreSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            source: None,
            current: RwLock::new(Arc::new(settings)),
            emitter: Emitter::new(),
        })
    }

    /// Loads settings from a JSON file that [`ConfigStore::reload`] re-reads.
    ///
    /// # Errors
    ///
    /// See [`StoreSettings::load`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings: StoreSettings = StoreSettings::load(path)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(Self {
            source: Some(path.to_path_buf()),
            current: RwLock::new(Arc::new(settings)),
            emitter: Emitter::new(),
        })
    }

    /// The file settings were loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Returns the current settings.
    #[must_use]
    pub fn get(&self) -> Arc<StoreSettings> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the settings and notifies listeners if anything changed.
    ///
    /// Returns the previous settings.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` and keeps the current settings if `settings` fail
    /// validation.
    pub fn set(&self, settings: StoreSettings) -> Result<Arc<StoreSettings>, ConfigError> {
        settings.validate()?;
        let new: Arc<StoreSettings> = Arc::new(settings);

        let old: Arc<StoreSettings> = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, Arc::clone(&new))
        };

        if *old != *new {
            self.emitter.notify(&old, &new);
        }
        Ok(old)
    }

    /// Re-reads the source file. Returns whether the settings changed.
    ///
    /// # Errors
    ///
    /// Returns `NoSource` when the store was not loaded from a file, or any
    /// error from reading the file. On error the current settings are kept.
    pub fn reload(&self) -> Result<bool, ConfigError> {
        self.reload_with(std::convert::identity)
    }

    /// Re-reads the source file and passes the result through `adjust`
    /// before it is validated and stored. Returns whether the settings
    /// changed.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::reload`].
    pub fn reload_with<F>(&self, adjust: F) -> Result<bool, ConfigError>
    where
        F: FnOnce(StoreSettings) -> StoreSettings,
    {
        let path: &Path = self.source.as_deref().ok_or(ConfigError::NoSource)?;
        let settings: StoreSettings = adjust(StoreSettings::load(path)?);
        let old: Arc<StoreSettings> = self.set(settings)?;
        let changed: bool = *old != *self.get();
        if changed {
            info!(path = %path.display(), "Settings changed on reload");
        }
        Ok(changed)
    }

    /// Registers a callback invoked with `(old, new)` after every change.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StoreSettings, &StoreSettings) + Send + Sync + 'static,
    {
        self.emitter.add_listener(listener)
    }

    /// Removes a callback registered with [`ConfigStore::add_listener`].
    pub fn remove_listener(&self, id: &str) -> bool {
        self.emitter.remove_listener(id)
    }
}
