//! This module contains global constants used across the host.

/// Exit status for every fatal condition (bad usage, initial display failure).
pub const EXIT_FAILURE: i32 = 84;

/// Directory scanned for game and display modules.
pub const DEFAULT_LIBRARY_DIR: &str = "./lib";
/// File stem of the menu module loaded at start-up and excluded from the catalog.
pub const MENU_MODULE_STEM: &str = "arcade_menu";
/// Directory receiving `score_<game>.txt` files.
pub const DEFAULT_SCORE_DIR: &str = "score";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Emergency menu layout, in display units
pub const MENU_TITLE: &str = "Arcade Menu";
pub const MENU_TITLE_X: i32 = 425;
pub const MENU_TITLE_Y: i32 = 150;

pub const MENU_DISPLAY_TITLE: &str = "Display Libraries:";
pub const MENU_GAMES_TITLE: &str = "Game Libraries:";
pub const MENU_DISPLAY_COLUMN_X: i32 = 200;
pub const MENU_GAMES_COLUMN_X: i32 = 600;
pub const MENU_LIST_TITLE_Y: i32 = 250;

/// Y of the first row of each list.
pub const MENU_LIST_Y: i32 = 300;
/// Vertical distance between rows.
pub const MENU_ROW_STEP: i32 = 45;
pub const MENU_ROW_WIDTH: i32 = 20;
pub const MENU_ROW_HEIGHT: i32 = 0;

// Row prefixes: committed, highlighted while focused, plain
pub const MENU_COMMITTED_MARK: &str = " > ";
pub const MENU_HIGHLIGHT_MARK: &str = " * ";
pub const MENU_PLAIN_MARK: &str = "   ";

pub const MENU_START_X: i32 = 480;
pub const MENU_START_Y: i32 = 600;
/// Shift applied to the start button while it has focus.
pub const MENU_START_FOCUS_SHIFT: i32 = 15;
pub const MENU_START_LABEL: &str = "Start";
pub const MENU_START_FOCUSED_LABEL: &str = "> Start <";

/// Pause between ticks while no display module is bound, since nothing blocks in poll.
pub const DISPLAYLESS_IDLE_MS: u64 = 50;
