/*
 *  module/mock.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Mock module backend for testing without shared libraries
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

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::module::error::ModuleError;
use crate::module::ffi::{ARCADE_DISPLAY_ENTRY_SYMBOL, ARCADE_GAME_ENTRY_SYMBOL};
use crate::module::loader::{ModuleHandle, ModuleOpener};
use crate::module::traits::{Display, Game};
use crate::module::types::{
    DisplayKind, EntitySet, ModuleKind, RawEvent, RenderObject, ScoreRecord,
};

/// Mock module opener
///
/// Serves in-memory modules registered by path and records every open,
/// close, create and destroy. Useful for:
/// - Unit tests of the loader and catalog
/// - Driving the orchestrator loop end-to-end
/// - Lifecycle checks (no leaked handles, no instance outliving its handle)
pub struct MockOpener {
    modules: Mutex<HashMap<PathBuf, MockModule>>,
    state: Arc<Mutex<MockState>>,
}

/// Lifecycle counters shared by the opener, its handles and instances
#[derive(Debug, Default, Clone)]
pub struct MockState {
    /// Handles opened / released
    pub opened: usize,
    pub closed: usize,

    /// Instances created / dropped
    pub created: usize,
    pub destroyed: usize,

    /// Highest number of handles open at the same time
    pub max_open_handles: usize,

    /// Paths whose instance was dropped after its handle had been released
    pub instance_outlived_handle: Vec<PathBuf>,

    /// "open <path>" / "close <path>" in call order
    pub log: Vec<String>,

    open_ids: HashSet<u64>,
    next_id: u64,
}

impl MockState {
    pub fn open_handles(&self) -> usize {
        self.opened - self.closed
    }

    pub fn live_instances(&self) -> usize {
        self.created - self.destroyed
    }
}

/// Behaviour of one fake module file
#[derive(Clone)]
pub struct MockModule {
    pub name: String,
    pub kind: ModuleKind,
    entry: Option<String>,
    metadata: bool,
    null_instance: bool,
    game: Arc<Mutex<MockGameState>>,
    display: Arc<Mutex<MockDisplayState>>,
}

impl MockModule {
    pub fn game(name: &str) -> Self {
        Self::new(name, ModuleKind::Game, Some(ARCADE_GAME_ENTRY_SYMBOL))
    }

    pub fn display(name: &str) -> Self {
        Self::new(name, ModuleKind::Display, Some(ARCADE_DISPLAY_ENTRY_SYMBOL))
    }

    fn new(name: &str, kind: ModuleKind, entry: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            entry: entry.map(str::to_string),
            metadata: true,
            null_instance: false,
            game: Arc::new(Mutex::new(MockGameState::default())),
            display: Arc::new(Mutex::new(MockDisplayState::default())),
        }
    }

    /// Declared kind differs from the factory it exports
    pub fn with_kind(mut self, kind: ModuleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_entry(mut self, entry: &str) -> Self {
        self.entry = Some(entry.to_string());
        self
    }

    pub fn with_display_kind(self, kind: DisplayKind) -> Self {
        self.display.lock().unwrap().kind = kind;
        self
    }

    /// No factory symbol exported
    pub fn without_factory(mut self) -> Self {
        self.entry = None;
        self
    }

    /// No `arcade_get_name` / `arcade_get_type` exported
    pub fn without_metadata(mut self) -> Self {
        self.metadata = false;
        self
    }

    /// Factory exported but returns null
    pub fn with_null_instance(mut self) -> Self {
        self.null_instance = true;
        self
    }

    /// Script shared by every game instance created from this module
    pub fn game_state(&self) -> Arc<Mutex<MockGameState>> {
        Arc::clone(&self.game)
    }

    /// Script shared by every display instance created from this module
    pub fn display_state(&self) -> Arc<Mutex<MockDisplayState>> {
        Arc::clone(&self.display)
    }
}

impl MockOpener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            modules: Mutex::new(HashMap::new()),
            state: Arc::new(Mutex::new(MockState::default())),
        })
    }

    /// Register (or replace) the module served at `path`
    pub fn add(&self, path: impl Into<PathBuf>, module: MockModule) -> MockModule {
        self.modules.lock().unwrap().insert(path.into(), module.clone());
        module
    }

    /// Make `path` unopenable, as if the file was deleted
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.modules.lock().unwrap().remove(path.as_ref());
    }

    /// Snapshot of the lifecycle counters
    pub fn state(&self) -> MockState {
        self.state.lock().unwrap().clone()
    }
}

impl ModuleOpener for MockOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ModuleHandle>, ModuleError> {
        let module = self.modules.lock().unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ModuleError::open(path, "no such file"))?;

        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.opened += 1;
        state.open_ids.insert(id);
        state.max_open_handles = state.max_open_handles.max(state.open_ids.len());
        state.log.push(format!("open {}", path.display()));

        Ok(Box::new(MockHandle {
            path: path.to_path_buf(),
            module,
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockHandle {
    path: PathBuf,
    module: MockModule,
    id: u64,
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    fn check_factory(&self, entry: &str) -> Result<(), ModuleError> {
        if self.module.entry.as_deref() != Some(entry) {
            return Err(ModuleError::symbol_not_found(&self.path, entry));
        }
        if self.module.null_instance {
            return Err(ModuleError::null_instance(&self.path, entry));
        }
        Ok(())
    }

    fn track_instance(&self) -> InstanceTracker {
        self.state.lock().unwrap().created += 1;
        InstanceTracker {
            path: self.path.clone(),
            handle_id: self.id,
            state: Arc::clone(&self.state),
        }
    }
}

impl ModuleHandle for MockHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn query_name(&self) -> Result<String, ModuleError> {
        if !self.module.metadata {
            return Err(ModuleError::symbol_not_found(&self.path, "arcade_get_name"));
        }
        Ok(self.module.name.clone())
    }

    fn query_kind(&self) -> Result<ModuleKind, ModuleError> {
        if !self.module.metadata {
            return Err(ModuleError::symbol_not_found(&self.path, "arcade_get_type"));
        }
        Ok(self.module.kind)
    }

    fn create_game(&self, entry: &str) -> Result<Box<dyn Game>, ModuleError> {
        self.check_factory(entry)?;
        Ok(Box::new(MockGame {
            name: self.module.name.clone(),
            state: self.module.game_state(),
            _tracker: self.track_instance(),
        }))
    }

    fn create_display(&self, entry: &str) -> Result<Box<dyn Display>, ModuleError> {
        self.check_factory(entry)?;
        Ok(Box::new(MockDisplay {
            name: self.module.name.clone(),
            state: self.module.display_state(),
            _tracker: self.track_instance(),
        }))
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.closed += 1;
        state.open_ids.remove(&self.id);
        state.log.push(format!("close {}", self.path.display()));
    }
}

/// Notices when an instance is dropped after its handle
struct InstanceTracker {
    path: PathBuf,
    handle_id: u64,
    state: Arc<Mutex<MockState>>,
}

impl Drop for InstanceTracker {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.destroyed += 1;
        if !state.open_ids.contains(&self.handle_id) {
            state.instance_outlived_handle.push(self.path.clone());
        }
    }
}

/// Scripted behaviour and recorded calls of a mock game
#[derive(Debug, Default)]
pub struct MockGameState {
    pub game_over: bool,
    pub score: f32,
    pub player: String,
    pub game_end: bool,
    pub new_lib: Option<PathBuf>,
    pub new_display: Option<PathBuf>,
    pub entities: EntitySet,

    /// Every event forwarded by the host
    pub received: Vec<RawEvent>,
    /// Every name passed to `set_username`
    pub usernames: Vec<String>,
    pub renders: usize,
}

struct MockGame {
    name: String,
    state: Arc<Mutex<MockGameState>>,
    _tracker: InstanceTracker,
}

impl Game for MockGame {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_game_over(&mut self) -> bool {
        self.state.lock().unwrap().game_over
    }

    fn score(&mut self) -> ScoreRecord {
        let state = self.state.lock().unwrap();
        ScoreRecord::new(state.player.clone(), state.score)
    }

    fn is_game_end(&mut self) -> bool {
        self.state.lock().unwrap().game_end
    }

    fn new_lib(&mut self) -> Option<PathBuf> {
        self.state.lock().unwrap().new_lib.clone()
    }

    fn new_display(&mut self) -> Option<PathBuf> {
        self.state.lock().unwrap().new_display.clone()
    }

    fn clear_new_display(&mut self) {
        self.state.lock().unwrap().new_display = None;
    }

    fn handle_events(&mut self, events: &[RawEvent]) {
        self.state.lock().unwrap().received.extend_from_slice(events);
    }

    fn render(&mut self) -> EntitySet {
        let mut state = self.state.lock().unwrap();
        state.renders += 1;
        state.entities.clone()
    }

    fn set_username(&mut self, username: &str) {
        self.state.lock().unwrap().usernames.push(username.to_string());
    }
}

/// Scripted behaviour and recorded calls of a mock display
#[derive(Debug)]
pub struct MockDisplayState {
    pub kind: DisplayKind,

    /// Event batches returned by successive polls; empty polls once drained
    pub pending: VecDeque<Vec<RawEvent>>,

    pub drawn: Vec<RenderObject>,
    pub polls: usize,
    pub clears: usize,
    pub presents: usize,
}

impl Default for MockDisplayState {
    fn default() -> Self {
        Self {
            kind: DisplayKind::Graphical,
            pending: VecDeque::new(),
            drawn: Vec::new(),
            polls: 0,
            clears: 0,
            presents: 0,
        }
    }
}

impl MockDisplayState {
    /// Queue the events returned by one future poll
    pub fn push_events(&mut self, events: Vec<RawEvent>) {
        self.pending.push_back(events);
    }
}

struct MockDisplay {
    name: String,
    state: Arc<Mutex<MockDisplayState>>,
    _tracker: InstanceTracker,
}

impl Display for MockDisplay {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> DisplayKind {
        self.state.lock().unwrap().kind
    }

    fn poll_events(&mut self) -> Vec<RawEvent> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        state.pending.pop_front().unwrap_or_default()
    }

    fn draw(&mut self, object: &RenderObject) {
        self.state.lock().unwrap().drawn.push(object.clone());
    }

    fn clear(&mut self) {
        self.state.lock().unwrap().clears += 1;
    }

    fn present(&mut self) {
        self.state.lock().unwrap().presents += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close_are_counted() {
        let opener = MockOpener::new();
        opener.add("a.so", MockModule::game("A"));

        let handle = opener.open(Path::new("a.so")).unwrap();
        assert_eq!(opener.state().open_handles(), 1);
        drop(handle);

        let state = opener.state();
        assert_eq!(state.open_handles(), 0);
        assert_eq!(state.log, vec!["open a.so".to_string(), "close a.so".to_string()]);
    }

    #[test]
    fn test_instance_outliving_handle_is_recorded() {
        let opener = MockOpener::new();
        opener.add("a.so", MockModule::game("A"));

        let handle = opener.open(Path::new("a.so")).unwrap();
        let game = handle.create_game(ARCADE_GAME_ENTRY_SYMBOL).unwrap();
        drop(handle);
        drop(game);

        assert_eq!(opener.state().instance_outlived_handle, vec![PathBuf::from("a.so")]);
    }

    #[test]
    fn test_removed_module_cannot_be_opened() {
        let opener = MockOpener::new();
        opener.add("a.so", MockModule::display("A"));
        opener.remove("a.so");
        assert!(matches!(opener.open(Path::new("a.so")), Err(ModuleError::Open { .. })));
    }
}
