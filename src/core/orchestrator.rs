/*
 *  core/orchestrator.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Main loop, hot-swap and failure recovery
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

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::Config;
use crate::constants::DISPLAYLESS_IDLE_MS;
use crate::core::emergency::EmergencyMenu;
use crate::core::hotkeys::{cycle, HotkeyAction, Hotkeys};
use crate::module::catalog::LibraryCatalog;
use crate::module::error::ModuleError;
use crate::module::loader::{DisplayContract, GameContract, ModuleLoader, ModuleOpener};
use crate::module::traits::Game;
use crate::module::types::{ModuleKind, RawEvent, ScoreRecord};
use crate::scores::ScoreBoard;

/// The one unrecoverable failure: nothing to render on
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot load initial display {}: {source}", .path.display())]
    InitialDisplay {
        path: PathBuf,
        #[source]
        source: ModuleError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Starting,
    /// A game module fills the game slot
    Running,
    /// The built-in menu fills the game slot
    Emergency,
    Stopped,
}

impl fmt::Display for CoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreState::Starting => write!(f, "starting"),
            CoreState::Running => write!(f, "running"),
            CoreState::Emergency => write!(f, "emergency"),
            CoreState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Owns the display and game slots and drives them tick by tick.
///
/// Only the initial display load can fail the host; every later load
/// failure leaves either no display (ticks skip drawing) or the emergency
/// menu in the game slot.
pub struct Orchestrator {
    opener: Arc<dyn ModuleOpener>,
    catalog: LibraryCatalog,
    library_dir: PathBuf,
    menu_file: PathBuf,
    default_game: PathBuf,

    // games drop before displays
    game: ModuleLoader<GameContract>,
    menu: Option<EmergencyMenu>,
    display: ModuleLoader<DisplayContract>,

    last_game: Option<PathBuf>,
    last_display: Option<PathBuf>,

    hotkeys: Hotkeys,
    scores: ScoreBoard,
    player: String,
    /// Last score written for the current game-over episode
    last_saved: Option<ScoreRecord>,

    state: CoreState,
    tick: u64,
}

impl Orchestrator {
    pub fn new(opener: Arc<dyn ModuleOpener>, config: &Config) -> Self {
        let library_dir = config.library_dir();
        let menu_file = config.menu_file();
        let catalog = LibraryCatalog::new(Arc::clone(&opener), &library_dir)
            .with_reserved(&menu_file);
        let game = ModuleLoader::with_entry(Arc::clone(&opener), config.game_entry());
        let display = ModuleLoader::with_entry(Arc::clone(&opener), config.display_entry());
        debug!("Factories: game `{}`, display `{}`", game.entry(), display.entry());

        Self {
            game,
            display,
            opener,
            catalog,
            library_dir,
            menu_file,
            default_game: config.default_game(),
            menu: None,
            last_game: None,
            last_display: None,
            hotkeys: Hotkeys::from_config(&config.hotkeys()),
            scores: ScoreBoard::new(config.score_dir()),
            player: config.player(),
            last_saved: None,
            state: CoreState::Starting,
            tick: 0,
        }
    }

    /// Scan the catalog, bind the initial display and the default game.
    ///
    /// Fails only when `display_path` cannot be loaded; a missing default
    /// game puts the emergency menu in place instead.
    pub fn start(&mut self, display_path: &Path) -> Result<(), CoreError> {
        self.catalog.refresh();

        self.load_display(display_path).map_err(|source| CoreError::InitialDisplay {
            path: display_path.to_path_buf(),
            source,
        })?;

        let default_game = self.default_game.clone();
        self.load_game(&default_game);
        info!("Host {} (display {})", self.state, display_path.display());
        Ok(())
    }

    /// Tick until a quit event arrives, then release both slots
    pub fn run(&mut self) {
        while self.state != CoreState::Stopped {
            self.step();
            if self.state != CoreState::Stopped && !self.display.is_loaded() {
                thread::sleep(Duration::from_millis(DISPLAYLESS_IDLE_MS));
            }
        }
        self.shutdown();
    }

    /// One iteration of the main loop
    pub fn step(&mut self) -> CoreState {
        if !matches!(self.state, CoreState::Running | CoreState::Emergency) {
            return self.state;
        }
        self.tick += 1;

        self.check_game_over();
        self.check_display_request();
        self.check_game_end();

        let events = self.poll_events();
        if events.iter().any(RawEvent::is_quit) {
            info!("Quit requested after {} ticks", self.tick);
            self.state = CoreState::Stopped;
            return self.state;
        }

        let forwarded = self.apply_hotkeys(events);
        if let Some(game) = self.active_game() {
            game.handle_events(&forwarded);
        }

        self.render();
        self.state
    }

    /// Drop the game, then the display
    pub fn shutdown(&mut self) {
        self.remember_player();
        self.menu = None;
        self.game.reset();
        self.display.reset();
        self.state = CoreState::Stopped;
        debug!("Host stopped");
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn catalog(&self) -> &LibraryCatalog {
        &self.catalog
    }

    pub fn game_path(&self) -> Option<&Path> {
        self.game.path()
    }

    pub fn display_path(&self) -> Option<&Path> {
        self.display.path()
    }

    pub fn is_menu_active(&self) -> bool {
        self.menu.is_some()
    }

    /// Name of whatever fills the game slot
    pub fn game_name(&self) -> Option<String> {
        match self.menu.as_ref() {
            Some(menu) => Some(menu.name()),
            None => self.game.instance().map(|g| g.name()),
        }
    }

    pub fn display_name(&self) -> Option<String> {
        self.display.instance().map(|d| d.name())
    }

    /// Player name handed to the next game
    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn active_game(&mut self) -> Option<&mut (dyn Game + 'static)> {
        match self.menu.as_mut() {
            Some(menu) => Some(menu as &mut (dyn Game + 'static)),
            None => self.game.instance_mut(),
        }
    }

    fn check_game_over(&mut self) {
        let Some(game) = self.active_game() else { return };
        if !game.is_game_over() {
            self.last_saved = None;
            return;
        }

        let record = game.score();
        let name = game.name();
        // unchanged since the last write, the rewrite would be a no-op
        if self.last_saved.as_ref() == Some(&record) {
            return;
        }
        info!("{} is over: {} scored {}", name, record.player, record.score);

        if !record.player.is_empty() {
            self.player = record.player.clone();
        }
        if let Err(e) = self.scores.save(&name, &record) {
            warn!("Score not saved: {}", e);
        }
        self.last_saved = Some(record);
    }

    fn check_display_request(&mut self) {
        let Some(game) = self.active_game() else { return };
        let Some(path) = game.new_display() else { return };
        game.clear_new_display();

        info!("Game requested display {}", path.display());
        if let Err(e) = self.load_display(&path) {
            warn!("{}; running without display", e);
        }
    }

    fn check_game_end(&mut self) {
        let Some(game) = self.active_game() else { return };
        if !game.is_game_end() {
            return;
        }
        let next = game.new_lib();
        match next {
            Some(path) => {
                info!("Game requested switch to {}", path.display());
                self.load_game(&path);
            }
            None => {
                warn!("Game ended without naming a successor");
                self.enter_emergency();
            }
        }
    }

    fn poll_events(&mut self) -> Vec<RawEvent> {
        self.display
            .instance_mut()
            .map(|display| display.poll_events())
            .unwrap_or_default()
    }

    /// Run host actions for reserved keys, in order; return what the game gets
    fn apply_hotkeys(&mut self, events: Vec<RawEvent>) -> Vec<RawEvent> {
        let mut forwarded = Vec::with_capacity(events.len());
        for event in events {
            if let Some(action) = self.hotkeys.action_for(&event) {
                debug!("Hotkey {:?} -> {:?}", event.key, action);
                self.apply(action);
            } else if !self.hotkeys.is_reserved(&event) {
                forwarded.push(event);
            }
        }
        forwarded
    }

    fn apply(&mut self, action: HotkeyAction) {
        match action {
            HotkeyAction::PrevDisplay => self.cycle_display(false),
            HotkeyAction::NextDisplay => self.cycle_display(true),
            HotkeyAction::PrevGame => self.cycle_game(false),
            HotkeyAction::NextGame => self.cycle_game(true),
            HotkeyAction::ReloadGame => self.reload_game(),
            HotkeyAction::ReloadDisplay => self.reload_display(),
            HotkeyAction::ReloadAll => {
                self.reload_display();
                self.reload_game();
            }
        }
    }

    fn cycle_display(&mut self, forward: bool) {
        let current = self.display.path_buf().or_else(|| self.last_display.clone());
        let index = current.and_then(|p| self.catalog.position_of(ModuleKind::Display, &p));
        let Some(next) = cycle(index, self.catalog.displays().len(), forward) else {
            warn!("No display modules to cycle through");
            return;
        };

        let path = self.catalog.displays()[next].path.clone();
        if let Err(e) = self.load_display(&path) {
            warn!("{}; running without display", e);
        }
    }

    fn cycle_game(&mut self, forward: bool) {
        let index = if self.menu.is_some() {
            None
        } else {
            self.game.path().and_then(|p| self.catalog.position_of(ModuleKind::Game, p))
        };
        let Some(next) = cycle(index, self.catalog.games().len(), forward) else {
            warn!("No game modules to cycle through");
            return;
        };

        let path = self.catalog.games()[next].path.clone();
        self.load_game(&path);
    }

    fn reload_game(&mut self) {
        match self.last_game.clone() {
            Some(path) => self.load_game(&path),
            None => {
                debug!("No game loaded yet, rebuilding menu");
                self.enter_emergency();
            }
        }
    }

    fn reload_display(&mut self) {
        let Some(path) = self.last_display.clone() else {
            warn!("No display loaded yet, nothing to reload");
            return;
        };
        if let Err(e) = self.load_display(&path) {
            warn!("{}; running without display", e);
        }
    }

    /// Replace the display; on error the slot stays empty
    fn load_display(&mut self, path: &Path) -> Result<(), ModuleError> {
        let display = self.display.load(path)?;
        info!("Display {} ({:?}) bound", display.name(), display.kind());
        self.last_display = Some(path.to_path_buf());
        Ok(())
    }

    /// Replace the game; on error the emergency menu takes the slot
    fn load_game(&mut self, path: &Path) {
        self.remember_player();
        self.menu = None;

        match self.game.load(path) {
            Ok(game) => {
                game.set_username(&self.player);
                info!("Game {} bound", game.name());
                self.last_game = Some(path.to_path_buf());
                self.last_saved = None;
                self.state = CoreState::Running;
            }
            Err(e) => {
                error!("{}", e);
                self.enter_emergency();
            }
        }
    }

    fn enter_emergency(&mut self) {
        self.remember_player();
        self.game.reset();

        let catalog = LibraryCatalog::new(Arc::clone(&self.opener), &self.library_dir)
            .with_reserved(&self.menu_file);
        let mut menu = EmergencyMenu::new(catalog);
        menu.set_username(&self.player);

        self.menu = Some(menu);
        self.last_saved = None;
        self.state = CoreState::Emergency;
        warn!("No usable game module, emergency menu active");
    }

    /// Keep the name the current game knows the player by
    fn remember_player(&mut self) {
        let Some(game) = self.active_game() else { return };
        let player = game.score().player;
        if !player.is_empty() {
            self.player = player;
        }
    }

    fn render(&mut self) {
        let Some(game) = self.active_game() else { return };
        let entities = game.render();
        if entities.is_empty() {
            return;
        }

        let Some(display) = self.display.instance_mut() else { return };
        let kind = display.kind();
        display.clear();
        for entity in entities.values() {
            if let Some(object) = entity.resolve(kind) {
                display.draw(&object);
            }
        }
        display.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::mock::{MockModule, MockOpener};
    use crate::module::types::{DisplayKind, Entity, KeyCode, Shape};
    use std::env::consts::DLL_EXTENSION;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        opener: Arc<MockOpener>,
    }

    impl Fixture {
        fn new() -> Self {
            Self { dir: TempDir::new().unwrap(), opener: MockOpener::new() }
        }

        fn add(&self, stem: &str, module: MockModule) -> (PathBuf, MockModule) {
            let path = self.dir.path().join(format!("{}.{}", stem, DLL_EXTENSION));
            fs::write(&path, b"").unwrap();
            let module = self.opener.add(&path, module);
            (path, module)
        }

        fn path(&self, stem: &str) -> PathBuf {
            self.dir.path().join(format!("{}.{}", stem, DLL_EXTENSION))
        }

        fn config(&self) -> Config {
            Config {
                library_dir: Some(self.dir.path().to_path_buf()),
                score_dir: Some(self.dir.path().join("score")),
                ..Default::default()
            }
        }

        fn host(&self) -> Orchestrator {
            Orchestrator::new(self.opener.clone(), &self.config())
        }
    }

    fn queue(module: &MockModule, events: Vec<RawEvent>) {
        module.display_state().lock().unwrap().push_events(events);
    }

    #[test]
    fn test_initial_display_failure_is_fatal() {
        let fx = Fixture::new();
        let mut host = fx.host();
        let err = host.start(&fx.path("missing")).unwrap_err();
        assert!(matches!(err, CoreError::InitialDisplay { .. }));
        assert_eq!(host.state(), CoreState::Starting);
    }

    #[test]
    fn test_missing_default_game_enters_emergency() {
        let fx = Fixture::new();
        let (display, _) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        let mut host = fx.host();

        host.start(&display).unwrap();
        assert_eq!(host.state(), CoreState::Emergency);
        assert!(host.is_menu_active());
        assert_eq!(host.game_name().as_deref(), Some("Emergency Menu"));
    }

    #[test]
    fn test_startup_binds_menu_module() {
        let fx = Fixture::new();
        let (display, _) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        fx.add("arcade_menu", MockModule::game("Menu"));
        fx.add("arcade_snake", MockModule::game("Snake"));
        let mut host = fx.host();

        host.start(&display).unwrap();
        assert_eq!(host.state(), CoreState::Running);
        assert_eq!(host.game_name().as_deref(), Some("Menu"));
        // the menu module is not part of the catalog
        assert_eq!(host.catalog().games().len(), 1);
        assert_eq!(host.catalog().displays().len(), 1);
    }

    #[test]
    fn test_quit_stops_loop() {
        let fx = Fixture::new();
        let (display, display_module) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        fx.add("arcade_menu", MockModule::game("Menu"));
        let mut host = fx.host();
        host.start(&display).unwrap();

        queue(&display_module, vec![RawEvent::press(KeyCode::A), RawEvent::quit()]);
        assert_eq!(host.step(), CoreState::Stopped);
        assert_eq!(host.step(), CoreState::Stopped);
        assert_eq!(host.ticks(), 1);

        host.shutdown();
        assert_eq!(fx.opener.state().open_handles(), 0);
        assert!(fx.opener.state().instance_outlived_handle.is_empty());
    }

    #[test]
    fn test_hotkeys_are_not_forwarded() {
        let fx = Fixture::new();
        let (display, display_module) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        let (_, menu) = fx.add("arcade_menu", MockModule::game("Menu"));
        let mut host = fx.host();
        host.start(&display).unwrap();

        queue(&display_module, vec![
            RawEvent::press(KeyCode::Up),
            RawEvent::press(KeyCode::F6),
            RawEvent::release(KeyCode::F6),
            RawEvent::release(KeyCode::Up),
        ]);
        host.step();

        let received = menu.game_state().lock().unwrap().received.clone();
        assert_eq!(received, vec![RawEvent::press(KeyCode::Up), RawEvent::release(KeyCode::Up)]);
    }

    #[test]
    fn test_display_cycle_wraps() {
        let fx = Fixture::new();
        let (ncurses, ncurses_module) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        let (sdl, sdl_module) = fx.add("arcade_sdl2", MockModule::display("SDL2"));
        fx.add("arcade_menu", MockModule::game("Menu"));
        let mut host = fx.host();
        host.start(&ncurses).unwrap();

        queue(&ncurses_module, vec![RawEvent::press(KeyCode::F2)]);
        host.step();
        assert_eq!(host.display_path(), Some(sdl.as_path()));

        queue(&sdl_module, vec![RawEvent::press(KeyCode::F2)]);
        host.step();
        assert_eq!(host.display_path(), Some(ncurses.as_path()));

        queue(&ncurses_module, vec![RawEvent::press(KeyCode::F1)]);
        host.step();
        assert_eq!(host.display_path(), Some(sdl.as_path()));

        let state = fx.opener.state();
        assert!(state.instance_outlived_handle.is_empty());
        // display + game, never an old and new display together
        assert_eq!(state.open_handles(), 2);
    }

    #[test]
    fn test_game_cycle_from_emergency() {
        let fx = Fixture::new();
        let (display, display_module) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        let (pacman, _) = fx.add("arcade_pacman", MockModule::game("Pacman"));
        let (snake, _) = fx.add("arcade_snake", MockModule::game("Snake"));
        let mut host = fx.host();
        host.start(&display).unwrap();
        assert!(host.is_menu_active());

        queue(&display_module, vec![RawEvent::press(KeyCode::F3)]);
        host.step();
        assert_eq!(host.state(), CoreState::Running);
        assert_eq!(host.game_path(), Some(snake.as_path()));

        queue(&display_module, vec![RawEvent::press(KeyCode::F4)]);
        host.step();
        assert_eq!(host.game_path(), Some(pacman.as_path()));
    }

    #[test]
    fn test_failed_display_request_runs_displayless() {
        let fx = Fixture::new();
        let (display, _) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        let (_, menu) = fx.add("arcade_menu", MockModule::game("Menu"));
        let mut host = fx.host();
        host.start(&display).unwrap();

        {
            let state = menu.game_state();
            let mut state = state.lock().unwrap();
            state.new_display = Some(fx.path("gone"));
            state.entities.insert("dot".into(), Entity::new(Shape::Circle, 1, 1)
                .with_sprite(DisplayKind::Graphical, "dot.png"));
        }
        assert_eq!(host.step(), CoreState::Running);
        assert_eq!(host.display_path(), None);
        // the request was acknowledged, not replayed
        assert_eq!(menu.game_state().lock().unwrap().new_display, None);
        assert_eq!(host.step(), CoreState::Running);

        // F6 brings back the last display that loaded
        host.reload_display();
        assert_eq!(host.display_path(), Some(display.as_path()));
    }

    #[test]
    fn test_game_end_switches_or_falls_back() {
        let fx = Fixture::new();
        let (display, _) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        let (_, menu) = fx.add("arcade_menu", MockModule::game("Menu"));
        let (snake, snake_module) = fx.add("arcade_snake", MockModule::game("Snake"));
        let mut host = fx.host();
        host.start(&display).unwrap();

        {
            let state = menu.game_state();
            let mut state = state.lock().unwrap();
            state.game_end = true;
            state.new_lib = Some(snake.clone());
            state.player = "ann".into();
        }
        host.step();
        assert_eq!(host.game_path(), Some(snake.as_path()));
        assert_eq!(snake_module.game_state().lock().unwrap().usernames, vec!["ann".to_string()]);

        {
            let state = snake_module.game_state();
            let mut state = state.lock().unwrap();
            state.game_end = true;
            state.new_lib = Some(fx.path("gone"));
        }
        host.step();
        assert_eq!(host.state(), CoreState::Emergency);
        assert!(host.active_game().is_some());
        assert_eq!(host.player(), "ann");
    }

    #[test]
    fn test_game_over_ticks_persist_current_score() {
        let fx = Fixture::new();
        let (display, _) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        let (_, menu) = fx.add("arcade_menu", MockModule::game("Menu"));
        let mut host = fx.host();
        host.start(&display).unwrap();

        let score_file = fx.dir.path().join("score").join("score_Menu.txt");
        {
            let state = menu.game_state();
            let mut state = state.lock().unwrap();
            state.game_over = true;
            state.player = "Ann".into();
            state.score = 50.0;
        }
        assert_eq!(host.step(), CoreState::Running);
        assert_eq!(host.step(), CoreState::Running);
        assert_eq!(fs::read_to_string(&score_file).unwrap(), "Player: Ann - Score: 50\n");

        // a score that improves while the game still reports over is kept
        menu.game_state().lock().unwrap().score = 80.0;
        host.step();
        assert_eq!(fs::read_to_string(&score_file).unwrap(), "Player: Ann - Score: 80\n");

        // a lower one never replaces it
        menu.game_state().lock().unwrap().score = 30.0;
        host.step();
        assert_eq!(fs::read_to_string(&score_file).unwrap(), "Player: Ann - Score: 80\n");

        // a new episode by another player adds a row
        {
            let state = menu.game_state();
            let mut state = state.lock().unwrap();
            state.game_over = false;
            state.player = "Bob".into();
            state.score = 90.0;
        }
        host.step();
        menu.game_state().lock().unwrap().game_over = true;
        host.step();
        assert_eq!(fs::read_to_string(&score_file).unwrap(),
            "Player: Bob - Score: 90\nPlayer: Ann - Score: 80\n");
        assert_eq!(host.player(), "Bob");
    }

    #[test]
    fn test_failed_display_reload_runs_displayless() {
        let fx = Fixture::new();
        let (display, display_module) = fx.add("arcade_ncurses", MockModule::display("Ncurses"));
        let (_, menu) = fx.add("arcade_menu", MockModule::game("Menu"));
        let mut host = fx.host();
        host.start(&display).unwrap();

        menu.game_state().lock().unwrap().entities
            .insert("a".into(), Entity::text(0, 0, "@"));
        host.step();
        let presents = display_module.display_state().lock().unwrap().presents;
        assert_eq!(presents, 1);

        // the display file disappears, then F6 asks for a reload
        fx.opener.remove(&display);
        queue(&display_module, vec![RawEvent::press(KeyCode::F6)]);
        assert_eq!(host.step(), CoreState::Running);
        assert_eq!(host.display_path(), None);
        assert_eq!(fx.opener.state().open_handles(), 1);

        assert_eq!(host.step(), CoreState::Running);
        let state = display_module.display_state();
        let state = state.lock().unwrap();
        assert_eq!(state.presents, 1);
        assert_eq!(state.drawn.len(), 1);

        // F7 does the same for both slots: the game survives, the display stays unbound
        drop(state);
        host.apply(HotkeyAction::ReloadAll);
        assert_eq!(host.display_path(), None);
        assert_eq!(host.state(), CoreState::Running);
        assert_eq!(host.game_name().as_deref(), Some("Menu"));
    }

    #[test]
    fn test_render_skips_missing_sprites_and_empty_frames() {
        let fx = Fixture::new();
        let (display, display_module) = fx.add("arcade_ncurses",
            MockModule::display("Ncurses").with_display_kind(DisplayKind::Terminal));
        let (_, menu) = fx.add("arcade_menu", MockModule::game("Menu"));
        let mut host = fx.host();
        host.start(&display).unwrap();

        host.step();
        {
            let state = display_module.display_state();
            let state = state.lock().unwrap();
            assert_eq!((state.clears, state.presents), (0, 0));
        }

        {
            let state = menu.game_state();
            let mut state = state.lock().unwrap();
            state.entities.insert("a".into(), Entity::text(0, 0, "@"));
            state.entities.insert("b".into(), Entity::new(Shape::Rectangle, 5, 5)
                .with_sprite(DisplayKind::Graphical, "wall.png"));
        }
        host.step();

        let state = display_module.display_state();
        let state = state.lock().unwrap();
        assert_eq!((state.clears, state.presents), (1, 1));
        assert_eq!(state.drawn.len(), 1);
        assert_eq!(state.drawn[0].sprite, "@");
    }
}
