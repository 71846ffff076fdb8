/*
 *  module/catalog.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Module discovery and classification
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

use std::env::consts::DLL_EXTENSION;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{debug, info, warn};

use crate::module::error::ModuleError;
use crate::module::loader::{GameContract, ModuleLoader, ModuleOpener};
use crate::module::types::{ModuleDescriptor, ModuleKind};

/// Sorted game and display modules found in one directory
pub struct LibraryCatalog {
    opener: Arc<dyn ModuleOpener>,
    directory: PathBuf,
    reserved: Option<PathBuf>,
    games: Vec<ModuleDescriptor>,
    displays: Vec<ModuleDescriptor>,
}

impl LibraryCatalog {
    /// Empty catalog over `directory`; call [`refresh`](Self::refresh) to populate
    pub fn new(opener: Arc<dyn ModuleOpener>, directory: impl Into<PathBuf>) -> Self {
        Self {
            opener,
            directory: directory.into(),
            reserved: None,
            games: Vec::new(),
            displays: Vec::new(),
        }
    }

    /// Exclude the fallback menu module from classification
    pub fn with_reserved(mut self, reserved: impl Into<PathBuf>) -> Self {
        self.reserved = Some(reserved.into());
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Re-scan the directory and re-classify everything in it
    pub fn refresh(&mut self) {
        let paths = Self::scan(&self.directory);
        let (games, displays) = self.classify(&paths);
        info!("Catalog {}: {} game(s), {} display(s)",
            self.directory.display(), games.len(), displays.len());
        self.games = games;
        self.displays = displays;
    }

    /// Regular files in `dir` carrying the platform's dynamic-library extension.
    ///
    /// A missing or unreadable directory yields an empty list.
    pub fn scan(dir: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read module directory {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == DLL_EXTENSION))
            .collect();

        paths.sort();
        paths
    }

    /// Classify every path and split the results into `(games, displays)`.
    ///
    /// The reserved menu module and anything that is neither a game nor a
    /// display are left out. Both lists are sorted by declared name, then
    /// path, and contain each path at most once.
    pub fn classify(&self, paths: &[PathBuf]) -> (Vec<ModuleDescriptor>, Vec<ModuleDescriptor>) {
        // classification only, this loader never holds a module
        let classifier: ModuleLoader<GameContract> = ModuleLoader::new(Arc::clone(&self.opener));
        let mut games = Vec::new();
        let mut displays = Vec::new();

        for path in paths {
            if self.is_reserved(path) {
                debug!("Skipping reserved module {}", path.display());
                continue;
            }

            let declared_kind = classifier.probe_kind(path);
            if declared_kind == ModuleKind::Unknown {
                warn!("{}", ModuleError::ClassificationUnknown { path: path.clone() });
                continue;
            }

            let descriptor = ModuleDescriptor {
                path: path.clone(),
                declared_name: classifier.probe_name(path),
                declared_kind,
            };
            match declared_kind {
                ModuleKind::Game => games.push(descriptor),
                ModuleKind::Display => displays.push(descriptor),
                ModuleKind::Unknown => {}
            }
        }

        sort_and_dedup(&mut games);
        sort_and_dedup(&mut displays);
        (games, displays)
    }

    pub fn games(&self) -> &[ModuleDescriptor] {
        &self.games
    }

    pub fn displays(&self) -> &[ModuleDescriptor] {
        &self.displays
    }

    /// Index of `path` in the sorted list for `kind`
    pub fn position_of(&self, kind: ModuleKind, path: &Path) -> Option<usize> {
        let list = match kind {
            ModuleKind::Game => &self.games,
            ModuleKind::Display => &self.displays,
            ModuleKind::Unknown => return None,
        };
        list.iter().position(|d| same_file(&d.path, path))
    }

    fn is_reserved(&self, path: &Path) -> bool {
        self.reserved.as_deref().is_some_and(|reserved| same_file(reserved, path))
    }
}

fn sort_and_dedup(list: &mut Vec<ModuleDescriptor>) {
    list.sort_by(|a, b| {
        a.declared_name.cmp(&b.declared_name).then_with(|| a.path.cmp(&b.path))
    });
    let mut seen: Vec<PathBuf> = Vec::with_capacity(list.len());
    list.retain(|d| {
        if seen.contains(&d.path) {
            false
        } else {
            seen.push(d.path.clone());
            true
        }
    });
}

/// Path equality that tolerates `./lib/x` vs `lib/x` when both exist
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::mock::{MockModule, MockOpener};
    use tempfile::TempDir;

    fn lib(dir: &TempDir, stem: &str) -> PathBuf {
        let path = dir.path().join(format!("{}.{}", stem, DLL_EXTENSION));
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_scan_filters_extension_and_kind() {
        let dir = TempDir::new().unwrap();
        let a = lib(&dir, "arcade_a");
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join(format!("sub.{}", DLL_EXTENSION))).unwrap();

        assert_eq!(LibraryCatalog::scan(dir.path()), vec![a]);
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        assert!(LibraryCatalog::scan(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_classify_sorts_by_name_and_drops_unknown() {
        let dir = TempDir::new().unwrap();
        let opener = MockOpener::new();
        let snake = lib(&dir, "arcade_snake");
        let pacman = lib(&dir, "arcade_pacman");
        let sdl = lib(&dir, "arcade_sdl2");
        let junk = lib(&dir, "junk");
        let other = lib(&dir, "other");
        opener.add(&snake, MockModule::game("Snake"));
        opener.add(&pacman, MockModule::game("Pacman"));
        opener.add(&sdl, MockModule::display("SDL2"));
        opener.add(&junk, MockModule::game("Junk").with_kind(ModuleKind::Unknown));
        // `other` is not registered: opening it fails

        let mut catalog = LibraryCatalog::new(opener.clone(), dir.path());
        catalog.refresh();

        let names: Vec<&str> = catalog.games().iter().map(|d| d.declared_name.as_str()).collect();
        assert_eq!(names, vec!["Pacman", "Snake"]);
        assert_eq!(catalog.displays().len(), 1);
        assert_eq!(catalog.displays()[0].path, sdl);
        assert!(catalog.games().iter().all(|d| d.path != junk && d.path != other));

        // every handle opened for classification was released
        assert_eq!(opener.state().open_handles(), 0);
    }

    #[test]
    fn test_classify_skips_reserved_menu() {
        let dir = TempDir::new().unwrap();
        let opener = MockOpener::new();
        let menu = lib(&dir, "arcade_menu");
        let snake = lib(&dir, "arcade_snake");
        opener.add(&menu, MockModule::game("Menu"));
        opener.add(&snake, MockModule::game("Snake"));

        let mut catalog = LibraryCatalog::new(opener.clone(), dir.path()).with_reserved(&menu);
        catalog.refresh();

        assert_eq!(catalog.games().len(), 1);
        assert_eq!(catalog.games()[0].path, snake);
        assert!(!opener.state().log.iter().any(|l| l.contains("arcade_menu")));
    }

    #[test]
    fn test_classify_is_deterministic_and_dedups() {
        let dir = TempDir::new().unwrap();
        let opener = MockOpener::new();
        let b = lib(&dir, "b");
        let a = lib(&dir, "a");
        opener.add(&a, MockModule::game("Same"));
        opener.add(&b, MockModule::game("Same"));

        let catalog = LibraryCatalog::new(opener, dir.path());
        let paths = vec![b.clone(), a.clone(), b.clone()];
        let first = catalog.classify(&paths);
        let second = catalog.classify(&paths);

        assert_eq!(first, second);
        // equal names fall back to path order
        assert_eq!(first.0.iter().map(|d| d.path.clone()).collect::<Vec<_>>(), vec![a, b]);
        assert!(first.1.is_empty());
    }

    #[test]
    fn test_position_of() {
        let dir = TempDir::new().unwrap();
        let opener = MockOpener::new();
        let x = lib(&dir, "x");
        let y = lib(&dir, "y");
        opener.add(&x, MockModule::display("Zeta"));
        opener.add(&y, MockModule::display("Alpha"));

        let mut catalog = LibraryCatalog::new(opener, dir.path());
        catalog.refresh();

        assert_eq!(catalog.position_of(ModuleKind::Display, &y), Some(0));
        assert_eq!(catalog.position_of(ModuleKind::Display, &x), Some(1));
        assert_eq!(catalog.position_of(ModuleKind::Game, &x), None);
    }
}
