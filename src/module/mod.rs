/*
 *  module/mod.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Dynamic game and display modules
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

//! Dynamic game and display modules
//!
//! Games and renderers are shipped as shared libraries (.so/.dylib/.dll)
//! and swapped at runtime without restarting the host.
//!
//! ## Architecture
//!
//! 1. **FFI Layer** (`ffi.rs`) - C ABI vtables for the stable module interface
//! 2. **Native** (`native.rs`) - Opens libraries with `libloading`
//! 3. **Adapter** (`adapter.rs`) - Wraps vtables as `Game` / `Display` trait objects
//! 4. **Loader** (`loader.rs`) - One module at a time per contract, released before reload
//! 5. **Catalog** (`catalog.rs`) - Discovers and classifies a module directory
//!
//! ## Module Exports
//!
//! - `arcade_get_name() -> *const c_char`
//! - `arcade_get_type() -> i32` (0 = game, 1 = display)
//! - `arcade_game_entry()` or `arcade_display_entry()` returning a static vtable

// Core types
pub mod types;
pub mod traits;
pub mod error;

// C ABI and its Rust wrappers
pub mod ffi;
pub mod adapter;

// Native library backend (needs libloading)
#[cfg(feature = "plugin-system")]
pub mod native;

pub mod loader;
pub mod catalog;

// In-memory backend for tests
pub mod mock;

pub use catalog::LibraryCatalog;
pub use error::ModuleError;
pub use loader::{Contract, DisplayContract, GameContract, ModuleHandle, ModuleLoader, ModuleOpener};
#[cfg(feature = "plugin-system")]
pub use native::NativeOpener;
pub use traits::{Display, Game};
pub use types::{
    DisplayKind, Entity, EntitySet, EventKind, KeyCode, ModuleDescriptor, ModuleKind,
    RawEvent, RenderObject, Rgb, ScoreRecord, Shape,
};
