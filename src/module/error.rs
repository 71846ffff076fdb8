/*
 *  module/error.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Error types for module loading and classification
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

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between the host and a dynamic module.
///
/// All variants are recoverable: discovery drops the path, the orchestrator
/// falls back to a display-less tick or to the emergency menu.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The file is missing or could not be mapped by the dynamic linker
    #[error("cannot open module {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    /// An expected export is absent
    #[error("symbol `{symbol}` not found in {}", .path.display())]
    SymbolNotFound { path: PathBuf, symbol: String },

    /// The factory ran but produced no instance
    #[error("factory `{symbol}` in {} returned no instance", .path.display())]
    NullInstance { path: PathBuf, symbol: String },

    /// The module answered its kind and name queries but is neither a game nor a display
    #[error("module {} is not a recognised game or display module", .path.display())]
    ClassificationUnknown { path: PathBuf },

    /// Host and module were built against incompatible ABI majors
    #[error("module {} speaks ABI {}.{}.{}, host speaks {}.{}.{}", .path.display(),
        .found.0, .found.1, .found.2, .expected.0, .expected.1, .expected.2)]
    AbiMismatch {
        path: PathBuf,
        found: (u32, u32, u32),
        expected: (u32, u32, u32),
    },

    /// Module code panicked while the host was calling into it
    #[error("module panicked: {0}")]
    Panicked(String),
}

impl ModuleError {
    pub fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ModuleError::Open { path: path.into(), reason: reason.to_string() }
    }

    pub fn symbol_not_found(path: impl Into<PathBuf>, symbol: &str) -> Self {
        ModuleError::SymbolNotFound { path: path.into(), symbol: symbol.to_string() }
    }

    pub fn null_instance(path: impl Into<PathBuf>, symbol: &str) -> Self {
        ModuleError::NullInstance { path: path.into(), symbol: symbol.to_string() }
    }
}
