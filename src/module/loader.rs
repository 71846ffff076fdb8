/*
 *  module/loader.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Generic dynamic-module loader
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{debug, info};

use crate::module::error::ModuleError;
use crate::module::ffi::{ARCADE_DISPLAY_ENTRY_SYMBOL, ARCADE_GAME_ENTRY_SYMBOL};
use crate::module::traits::{Display, Game};
use crate::module::types::ModuleKind;

/// An opened native module.
///
/// Dropping the handle releases the library; instances created through it
/// must be dropped first.
pub trait ModuleHandle {
    /// Path the module was opened from
    fn path(&self) -> &Path;

    /// Resolve and call the `arcade_get_name` query
    fn query_name(&self) -> Result<String, ModuleError>;

    /// Resolve and call the `arcade_get_type` query
    fn query_kind(&self) -> Result<ModuleKind, ModuleError>;

    /// Resolve `entry` as a game factory and build an instance
    fn create_game(&self, entry: &str) -> Result<Box<dyn Game>, ModuleError>;

    /// Resolve `entry` as a display factory and build an instance
    fn create_display(&self, entry: &str) -> Result<Box<dyn Display>, ModuleError>;
}

/// The one seam between the host and the dynamic linker
pub trait ModuleOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ModuleHandle>, ModuleError>;
}

/// The interface a loader instantiates, with its default factory symbol
pub trait Contract {
    type Instance: ?Sized;

    const KIND: ModuleKind;
    const DEFAULT_ENTRY: &'static str;

    fn instantiate(handle: &dyn ModuleHandle, entry: &str)
        -> Result<Box<Self::Instance>, ModuleError>;
}

/// Game modules, built from `arcade_game_entry`
pub struct GameContract;

impl Contract for GameContract {
    type Instance = dyn Game;

    const KIND: ModuleKind = ModuleKind::Game;
    const DEFAULT_ENTRY: &'static str = ARCADE_GAME_ENTRY_SYMBOL;

    fn instantiate(handle: &dyn ModuleHandle, entry: &str) -> Result<Box<dyn Game>, ModuleError> {
        handle.create_game(entry)
    }
}

/// Display modules, built from `arcade_display_entry`
pub struct DisplayContract;

impl Contract for DisplayContract {
    type Instance = dyn Display;

    const KIND: ModuleKind = ModuleKind::Display;
    const DEFAULT_ENTRY: &'static str = ARCADE_DISPLAY_ENTRY_SYMBOL;

    fn instantiate(handle: &dyn ModuleHandle, entry: &str) -> Result<Box<dyn Display>, ModuleError> {
        handle.create_display(entry)
    }
}

/// A native handle bound to the one instance created from it
struct LoadedModule<C: Contract> {
    // Fields drop in declaration order: the instance goes before the handle.
    instance: Box<C::Instance>,
    handle: Box<dyn ModuleHandle>,
}

/// Loads one module at a time for a given contract.
///
/// Loading always releases the previous module first, so an old and a new
/// module never share the process (modules may export colliding symbols).
pub struct ModuleLoader<C: Contract> {
    opener: Arc<dyn ModuleOpener>,
    entry: String,
    current: Option<LoadedModule<C>>,
    _contract: PhantomData<C>,
}

impl<C: Contract> ModuleLoader<C> {
    /// Loader resolving the contract's default factory symbol
    pub fn new(opener: Arc<dyn ModuleOpener>) -> Self {
        Self::with_entry(opener, C::DEFAULT_ENTRY)
    }

    /// Loader resolving a custom factory symbol
    pub fn with_entry(opener: Arc<dyn ModuleOpener>, entry: &str) -> Self {
        Self {
            opener,
            entry: entry.to_string(),
            current: None,
            _contract: PhantomData,
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Open `path`, resolve the factory and return the new instance.
    ///
    /// Any module already held by this loader is released before the new
    /// one is opened. On error nothing stays open.
    pub fn load(&mut self, path: &Path) -> Result<&mut C::Instance, ModuleError> {
        self.reset();

        info!("Loading {} module from: {}", C::KIND, path.display());
        let handle = self.opener.open(path)?;
        let instance = C::instantiate(handle.as_ref(), &self.entry)?;

        let module = self.current.insert(LoadedModule { instance, handle });
        Ok(module.instance.as_mut())
    }

    /// Best-effort `arcade_get_name` query; empty on any failure
    pub fn probe_name(&self, path: &Path) -> String {
        match self.opener.open(path).and_then(|handle| handle.query_name()) {
            Ok(name) => name,
            Err(e) => {
                debug!("Name query failed: {}", e);
                String::new()
            }
        }
    }

    /// Best-effort `arcade_get_type` query; `Unknown` on any failure
    pub fn probe_kind(&self, path: &Path) -> ModuleKind {
        match self.opener.open(path).and_then(|handle| handle.query_kind()) {
            Ok(kind) => kind,
            Err(e) => {
                debug!("Kind query failed: {}", e);
                ModuleKind::Unknown
            }
        }
    }

    /// Release the current instance and handle, if any
    pub fn reset(&mut self) {
        if let Some(module) = self.current.take() {
            debug!("Unloading {} module: {}", C::KIND, module.handle.path().display());
            drop(module);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Path of the loaded module
    pub fn path(&self) -> Option<&Path> {
        self.current.as_ref().map(|m| m.handle.path())
    }

    pub fn path_buf(&self) -> Option<PathBuf> {
        self.path().map(Path::to_path_buf)
    }

    pub fn instance(&self) -> Option<&C::Instance> {
        self.current.as_ref().map(|m| m.instance.as_ref())
    }

    pub fn instance_mut(&mut self) -> Option<&mut C::Instance> {
        self.current.as_mut().map(|m| m.instance.as_mut())
    }
}

impl<C: Contract> Drop for ModuleLoader<C> {
    fn drop(&mut self) {
        if self.current.is_some() {
            self.reset();
        } else {
            debug!("{} loader dropped with nothing loaded", C::KIND);
        }
    }
}
