/*
 *  core/emergency.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Built-in fallback menu used when no game module can be loaded
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
use log::{debug, info};

use crate::constants::*;
use crate::module::catalog::LibraryCatalog;
use crate::module::traits::Game;
use crate::module::types::{
    Entity, EntitySet, EventKind, KeyCode, ModuleDescriptor, RawEvent, Rgb, ScoreRecord,
};

/// Which list has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuList {
    Display,
    Game,
}

/// Highlight and commit state of one list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub highlighted: usize,
    pub committed: usize,
}

/// Display/game picker implementing the game contract in-process.
///
/// Lists come from its own catalog scan, so they can differ from the
/// host's if the directory changed in between.
pub struct EmergencyMenu {
    displays: Vec<ModuleDescriptor>,
    games: Vec<ModuleDescriptor>,
    display: Selection,
    game: Selection,
    focus: MenuList,
    start_focused: bool,
    started: bool,
    display_taken: bool,
    username: String,
}

impl EmergencyMenu {
    /// Refresh `catalog` and build the menu over its lists
    pub fn new(mut catalog: LibraryCatalog) -> Self {
        catalog.refresh();
        Self::from_lists(catalog.displays().to_vec(), catalog.games().to_vec())
    }

    pub fn from_lists(displays: Vec<ModuleDescriptor>, games: Vec<ModuleDescriptor>) -> Self {
        info!("Emergency menu: {} display(s), {} game(s)", displays.len(), games.len());
        Self {
            displays,
            games,
            display: Selection::default(),
            game: Selection::default(),
            focus: MenuList::Display,
            start_focused: false,
            started: false,
            display_taken: false,
            username: String::new(),
        }
    }

    pub fn focus(&self) -> MenuList {
        self.focus
    }

    pub fn start_focused(&self) -> bool {
        self.start_focused
    }

    pub fn selection(&self, list: MenuList) -> Selection {
        match list {
            MenuList::Display => self.display,
            MenuList::Game => self.game,
        }
    }

    fn focused(&mut self) -> (&mut Selection, usize) {
        match self.focus {
            MenuList::Display => (&mut self.display, self.displays.len()),
            MenuList::Game => (&mut self.game, self.games.len()),
        }
    }

    fn move_down(&mut self) {
        let start_focused = self.start_focused;
        let (selection, len) = self.focused();
        if start_focused {
            selection.highlighted = 0;
            self.start_focused = false;
        } else if selection.highlighted + 1 < len {
            selection.highlighted += 1;
        } else {
            self.start_focused = true;
        }
    }

    fn move_up(&mut self) {
        let start_focused = self.start_focused;
        let (selection, len) = self.focused();
        if start_focused {
            selection.highlighted = len.saturating_sub(1);
            self.start_focused = false;
        } else if selection.highlighted > 0 {
            selection.highlighted -= 1;
        } else {
            self.start_focused = true;
        }
    }

    fn switch_list(&mut self) {
        let carried = self.selection(self.focus).highlighted;
        self.focus = match self.focus {
            MenuList::Display => MenuList::Game,
            MenuList::Game => MenuList::Display,
        };
        let (selection, len) = self.focused();
        selection.highlighted = carried.min(len.saturating_sub(1));
    }

    fn confirm(&mut self) {
        if self.start_focused {
            debug!("Emergency menu: start");
            self.started = true;
            return;
        }
        let (selection, len) = self.focused();
        if selection.highlighted < len {
            selection.committed = selection.highlighted;
        }
    }

    fn render_list(&self, list: MenuList, entities: &mut EntitySet) {
        let (items, selection, x, prefix) = match list {
            MenuList::Display => (&self.displays, self.display, MENU_DISPLAY_COLUMN_X, "display_"),
            MenuList::Game => (&self.games, self.game, MENU_GAMES_COLUMN_X, "game_"),
        };

        let mut y = MENU_LIST_Y;
        for (i, item) in items.iter().enumerate() {
            let (mark, color) = if i == selection.highlighted && list == self.focus && !self.start_focused {
                (MENU_HIGHLIGHT_MARK, Rgb::CYAN)
            } else if i == selection.committed {
                (MENU_COMMITTED_MARK, Rgb::GREEN)
            } else {
                (MENU_PLAIN_MARK, Rgb::GREY)
            };
            let label = format!("{}{}", mark, item.declared_name);
            entities.insert(format!("{}{}", prefix, i), label_entity(x, y, &label, color));
            y += MENU_ROW_STEP;
        }
    }
}

fn label_entity(x: i32, y: i32, label: &str, color: Rgb) -> Entity {
    Entity::text(x, y, label)
        .with_size(MENU_ROW_WIDTH, MENU_ROW_HEIGHT)
        .with_color(color)
}

/// Path at `index`, else the first one
fn pick(list: &[ModuleDescriptor], index: usize) -> Option<PathBuf> {
    list.get(index).or_else(|| list.first()).map(|d| d.path.clone())
}

impl Game for EmergencyMenu {
    fn name(&self) -> String {
        "Emergency Menu".to_string()
    }

    fn is_game_over(&mut self) -> bool {
        false
    }

    fn score(&mut self) -> ScoreRecord {
        ScoreRecord::new(self.username.clone(), 0.0)
    }

    fn is_game_end(&mut self) -> bool {
        self.started
    }

    fn new_lib(&mut self) -> Option<PathBuf> {
        if !self.started {
            return None;
        }
        pick(&self.games, self.game.committed)
    }

    fn new_display(&mut self) -> Option<PathBuf> {
        if !self.started || self.display_taken {
            return None;
        }
        pick(&self.displays, self.display.committed)
    }

    fn clear_new_display(&mut self) {
        self.display_taken = true;
    }

    fn handle_events(&mut self, events: &[RawEvent]) {
        for event in events.iter().filter(|e| e.kind == EventKind::Press) {
            match event.key {
                KeyCode::Up => self.move_up(),
                KeyCode::Down => self.move_down(),
                KeyCode::Left | KeyCode::Right => self.switch_list(),
                KeyCode::Enter => self.confirm(),
                _ => {}
            }
        }
    }

    fn render(&mut self) -> EntitySet {
        let mut entities = EntitySet::new();

        entities.insert("title".into(),
            label_entity(MENU_TITLE_X, MENU_TITLE_Y, MENU_TITLE, Rgb::WHITE));
        entities.insert("display_title".into(),
            label_entity(MENU_DISPLAY_COLUMN_X, MENU_LIST_TITLE_Y, MENU_DISPLAY_TITLE, Rgb::WHITE));
        entities.insert("games_title".into(),
            label_entity(MENU_GAMES_COLUMN_X, MENU_LIST_TITLE_Y, MENU_GAMES_TITLE, Rgb::WHITE));

        self.render_list(MenuList::Display, &mut entities);
        self.render_list(MenuList::Game, &mut entities);

        let start = if self.start_focused {
            label_entity(MENU_START_X - MENU_START_FOCUS_SHIFT, MENU_START_Y,
                MENU_START_FOCUSED_LABEL, Rgb::CYAN)
        } else {
            label_entity(MENU_START_X, MENU_START_Y, MENU_START_LABEL, Rgb::YELLOW)
        };
        entities.insert("start_button".into(), start);
        entities
    }

    fn set_username(&mut self, username: &str) {
        self.username = username.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::types::{DisplayKind, ModuleKind};

    fn descriptors(kind: ModuleKind, names: &[&str]) -> Vec<ModuleDescriptor> {
        names.iter().map(|name| ModuleDescriptor {
            path: PathBuf::from(format!("./lib/{}.so", name.to_lowercase())),
            declared_name: name.to_string(),
            declared_kind: kind,
        }).collect()
    }

    fn menu(displays: &[&str], games: &[&str]) -> EmergencyMenu {
        EmergencyMenu::from_lists(
            descriptors(ModuleKind::Display, displays),
            descriptors(ModuleKind::Game, games),
        )
    }

    fn press(menu: &mut EmergencyMenu, keys: &[KeyCode]) {
        let events: Vec<RawEvent> = keys.iter().map(|k| RawEvent::press(*k)).collect();
        menu.handle_events(&events);
    }

    fn sprite(entities: &EntitySet, name: &str) -> String {
        entities[name].sprite_for(DisplayKind::Terminal).unwrap().to_string()
    }

    #[test]
    fn test_starts_on_display_list() {
        let menu = menu(&["Ncurses", "SDL2"], &["Snake"]);
        assert_eq!(menu.focus(), MenuList::Display);
        assert!(!menu.start_focused());
    }

    #[test]
    fn test_up_from_first_game_wraps_through_start() {
        let mut menu = menu(&["Ncurses"], &["Nibbler", "Pacman", "Snake"]);
        press(&mut menu, &[KeyCode::Right]);
        assert_eq!(menu.focus(), MenuList::Game);
        assert_eq!(menu.selection(MenuList::Game).highlighted, 0);

        press(&mut menu, &[KeyCode::Up]);
        assert!(menu.start_focused());

        press(&mut menu, &[KeyCode::Up]);
        assert!(!menu.start_focused());
        assert_eq!(menu.selection(MenuList::Game).highlighted, 2);
    }

    #[test]
    fn test_down_past_end_goes_to_start_then_first() {
        let mut menu = menu(&["Ncurses", "SDL2"], &[]);
        press(&mut menu, &[KeyCode::Down]);
        assert_eq!(menu.selection(MenuList::Display).highlighted, 1);
        press(&mut menu, &[KeyCode::Down]);
        assert!(menu.start_focused());
        press(&mut menu, &[KeyCode::Down]);
        assert!(!menu.start_focused());
        assert_eq!(menu.selection(MenuList::Display).highlighted, 0);
    }

    #[test]
    fn test_down_from_start_returns_to_first_row() {
        let mut menu = menu(&["Ncurses", "SDL2", "Qt"], &["Snake"]);
        press(&mut menu, &[KeyCode::Up]);
        assert!(menu.start_focused());

        press(&mut menu, &[KeyCode::Down]);
        assert!(!menu.start_focused());
        assert_eq!(menu.selection(MenuList::Display).highlighted, 0);

        // Enter now commits the row instead of starting
        press(&mut menu, &[KeyCode::Enter]);
        assert!(!menu.is_game_end());
    }

    #[test]
    fn test_switch_list_carries_and_clamps() {
        let mut menu = menu(&["A", "B", "C"], &["Snake"]);
        press(&mut menu, &[KeyCode::Down, KeyCode::Down, KeyCode::Right]);
        assert_eq!(menu.focus(), MenuList::Game);
        assert_eq!(menu.selection(MenuList::Game).highlighted, 0);

        press(&mut menu, &[KeyCode::Left]);
        assert_eq!(menu.focus(), MenuList::Display);
        assert_eq!(menu.selection(MenuList::Display).highlighted, 0);
    }

    #[test]
    fn test_nothing_requested_before_start() {
        let mut menu = menu(&["Ncurses", "SDL2"], &["Pacman", "Snake"]);
        assert!(!menu.is_game_end());
        assert_eq!(menu.new_lib(), None);
        assert_eq!(menu.new_display(), None);
        assert!(!menu.is_game_over());
    }

    #[test]
    fn test_commit_and_start() {
        let mut menu = menu(&["Ncurses", "SDL2"], &["Pacman", "Snake"]);
        // commit SDL2, then Snake, then start
        press(&mut menu, &[KeyCode::Down, KeyCode::Enter, KeyCode::Right, KeyCode::Enter]);
        assert_eq!(menu.selection(MenuList::Game).committed, 1);
        press(&mut menu, &[KeyCode::Down, KeyCode::Enter]);

        assert!(menu.is_game_end());
        assert_eq!(menu.new_lib(), Some(PathBuf::from("./lib/snake.so")));
        assert_eq!(menu.new_display(), Some(PathBuf::from("./lib/sdl2.so")));

        menu.clear_new_display();
        assert_eq!(menu.new_display(), None);
        assert_eq!(menu.new_lib(), Some(PathBuf::from("./lib/snake.so")));
    }

    #[test]
    fn test_start_without_commit_uses_first_entries() {
        let mut menu = menu(&["Ncurses", "SDL2"], &["Pacman", "Snake"]);
        press(&mut menu, &[KeyCode::Up, KeyCode::Enter]);
        assert_eq!(menu.new_lib(), Some(PathBuf::from("./lib/pacman.so")));
        assert_eq!(menu.new_display(), Some(PathBuf::from("./lib/ncurses.so")));
    }

    #[test]
    fn test_empty_lists_are_safe() {
        let mut menu = menu(&[], &[]);
        press(&mut menu, &[
            KeyCode::Down, KeyCode::Down, KeyCode::Up, KeyCode::Up,
            KeyCode::Right, KeyCode::Enter, KeyCode::Left, KeyCode::Down, KeyCode::Enter,
        ]);
        let entities = menu.render();
        assert_eq!(entities.len(), 4);
        assert!(menu.is_game_end());
        assert_eq!(menu.new_lib(), None);
        assert_eq!(menu.new_display(), None);
    }

    #[test]
    fn test_render_row_states() {
        let mut menu = menu(&["Ncurses", "SDL2"], &["Pacman"]);
        press(&mut menu, &[KeyCode::Down]);
        let entities = menu.render();

        assert_eq!(sprite(&entities, "title"), "Arcade Menu");
        assert_eq!(sprite(&entities, "display_0"), " > Ncurses");
        assert_eq!(entities["display_0"].color, Rgb::GREEN);
        assert_eq!(sprite(&entities, "display_1"), " * SDL2");
        assert_eq!(entities["display_1"].color, Rgb::CYAN);
        assert_eq!(entities["display_1"].y, 345);
        // game list is not focused, its committed row shows as such
        assert_eq!(sprite(&entities, "game_0"), " > Pacman");
        assert_eq!(entities["game_0"].x, 600);
        assert_eq!(sprite(&entities, "start_button"), "Start");
        assert_eq!(entities["start_button"].color, Rgb::YELLOW);
    }

    #[test]
    fn test_render_focused_start_button() {
        let mut menu = menu(&["Ncurses"], &["Pacman", "Snake"]);
        press(&mut menu, &[KeyCode::Right, KeyCode::Down, KeyCode::Down]);
        let entities = menu.render();

        assert_eq!(sprite(&entities, "start_button"), "> Start <");
        assert_eq!(entities["start_button"].x, 465);
        assert_eq!(entities["start_button"].color, Rgb::CYAN);
        assert_eq!(sprite(&entities, "game_1"), "   Snake");
        assert_eq!(entities["game_1"].color, Rgb::GREY);
    }

    #[test]
    fn test_username_is_reported_back() {
        let mut menu = menu(&[], &[]);
        menu.set_username("ann");
        assert_eq!(menu.score(), ScoreRecord::new("ann", 0.0));
    }
}
