/*
 *  module/native.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Native module backend - opens .so/.dylib/.dll files with libloading
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

use std::ffi::CStr;
use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use libloading::{Library, Symbol};

use crate::module::adapter::{PluginDisplay, PluginGame, catch_ffi_call};
use crate::module::error::ModuleError;
use crate::module::loader::{ModuleHandle, ModuleOpener};
use crate::module::traits::{Display, Game};
use crate::module::types::ModuleKind;
use super::ffi::{
    DisplayEntryFn,
    GameEntryFn,
    ModuleNameFn,
    ModuleTypeFn,
    ARCADE_ABI_VERSION_MAJOR,
    ARCADE_ABI_VERSION_MINOR,
    ARCADE_ABI_VERSION_PATCH,
    ARCADE_NAME_SYMBOL,
    ARCADE_TYPE_SYMBOL,
};

/// Opens modules through the platform dynamic linker
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

impl NativeOpener {
    /// File name a module with the given stem has on this platform
    ///
    /// For example, for "arcade_menu" this returns:
    /// - Linux: "arcade_menu.so"
    /// - macOS: "arcade_menu.dylib"
    /// - Windows: "arcade_menu.dll"
    pub fn file_name(stem: &str) -> String {
        format!("{}.{}", stem, std::env::consts::DLL_EXTENSION)
    }
}

impl ModuleOpener for NativeOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ModuleHandle>, ModuleError> {
        debug!("Opening module: {}", path.display());

        // Library::new runs the module's initialisers; a module is trusted
        // code by contract, nothing here sandboxes it.
        let library = unsafe {
            Library::new(path).map_err(|e| ModuleError::open(path, e))?
        };

        Ok(Box::new(NativeModule {
            library,
            path: path.to_path_buf(),
        }))
    }
}

/// A mapped shared library; unmapped on drop
pub struct NativeModule {
    library: Library,
    path: PathBuf,
}

impl NativeModule {
    fn symbol<T>(&self, name: &str) -> Result<Symbol<'_, T>, ModuleError> {
        unsafe {
            self.library.get::<T>(name.as_bytes())
                .map_err(|_| ModuleError::symbol_not_found(&self.path, name))
        }
    }

    /// Verify the module was built against a compatible ABI
    fn check_abi(
        &self,
        abi_version: extern "C" fn(*mut u32, *mut u32, *mut u32),
    ) -> Result<(), ModuleError> {
        let mut major = 0u32;
        let mut minor = 0u32;
        let mut patch = 0u32;

        catch_ffi_call(|| abi_version(&mut major, &mut minor, &mut patch))?;

        debug!("Module ABI version: {}.{}.{}", major, minor, patch);

        if major != ARCADE_ABI_VERSION_MAJOR {
            return Err(ModuleError::AbiMismatch {
                path: self.path.clone(),
                found: (major, minor, patch),
                expected: (
                    ARCADE_ABI_VERSION_MAJOR,
                    ARCADE_ABI_VERSION_MINOR,
                    ARCADE_ABI_VERSION_PATCH,
                ),
            });
        }

        if minor > ARCADE_ABI_VERSION_MINOR {
            warn!("Module {} has newer minor version {}.{}.{} than host {}.{}.{}",
                self.path.display(),
                major, minor, patch,
                ARCADE_ABI_VERSION_MAJOR,
                ARCADE_ABI_VERSION_MINOR,
                ARCADE_ABI_VERSION_PATCH
            );
        }

        Ok(())
    }
}

impl ModuleHandle for NativeModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn query_name(&self) -> Result<String, ModuleError> {
        let name_fn = self.symbol::<ModuleNameFn>(ARCADE_NAME_SYMBOL)?;
        let ptr = catch_ffi_call(|| name_fn())?;
        if ptr.is_null() {
            return Ok(String::new());
        }
        let name = unsafe { CStr::from_ptr(ptr) };
        Ok(name.to_string_lossy().into_owned())
    }

    fn query_kind(&self) -> Result<ModuleKind, ModuleError> {
        let type_fn = self.symbol::<ModuleTypeFn>(ARCADE_TYPE_SYMBOL)?;
        let raw = catch_ffi_call(|| type_fn())?;
        Ok(ModuleKind::from_raw(raw))
    }

    fn create_game(&self, entry: &str) -> Result<Box<dyn Game>, ModuleError> {
        let entry_fn = self.symbol::<GameEntryFn>(entry)?;

        let vtable_ptr = catch_ffi_call(|| entry_fn())?;
        if vtable_ptr.is_null() {
            return Err(ModuleError::null_instance(&self.path, entry));
        }

        // The vtable lives in the library's static data; it stays valid for
        // as long as this handle keeps the library mapped.
        let vtable = unsafe { &*vtable_ptr };
        self.check_abi(vtable.abi_version)?;

        let handle = catch_ffi_call(|| (vtable.create)())?;
        if handle.is_null() {
            return Err(ModuleError::null_instance(&self.path, entry));
        }

        info!("Loaded game module: {}", self.path.display());
        Ok(Box::new(PluginGame::new(vtable, handle)))
    }

    fn create_display(&self, entry: &str) -> Result<Box<dyn Display>, ModuleError> {
        let entry_fn = self.symbol::<DisplayEntryFn>(entry)?;

        let vtable_ptr = catch_ffi_call(|| entry_fn())?;
        if vtable_ptr.is_null() {
            return Err(ModuleError::null_instance(&self.path, entry));
        }

        let vtable = unsafe { &*vtable_ptr };
        self.check_abi(vtable.abi_version)?;

        let handle = catch_ffi_call(|| (vtable.create)())?;
        if handle.is_null() {
            return Err(ModuleError::null_instance(&self.path, entry));
        }

        info!("Loaded display module: {}", self.path.display());
        Ok(Box::new(PluginDisplay::new(vtable, handle)))
    }
}

impl Drop for NativeModule {
    fn drop(&mut self) {
        debug!("Releasing module handle: {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_uses_platform_extension() {
        let name = NativeOpener::file_name("arcade_menu");

        #[cfg(target_os = "linux")]
        assert_eq!(name, "arcade_menu.so");

        #[cfg(target_os = "macos")]
        assert_eq!(name, "arcade_menu.dylib");

        #[cfg(target_os = "windows")]
        assert_eq!(name, "arcade_menu.dll");

        assert!(name.starts_with("arcade_menu."));
    }

    #[test]
    fn test_open_missing_file_is_open_error() {
        let result = NativeOpener.open(Path::new("./definitely/not/here.so"));
        assert!(matches!(result, Err(ModuleError::Open { .. })));
    }

    #[test]
    fn test_open_non_library_is_open_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garbage.so");
        std::fs::write(&path, b"not an elf").unwrap();

        let result = NativeOpener.open(&path);
        assert!(matches!(result, Err(ModuleError::Open { .. })));
    }
}
