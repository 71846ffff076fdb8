/*
 *  module/traits.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  The two module contracts: Game and Display
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

use crate::module::types::{DisplayKind, EntitySet, RawEvent, RenderObject, ScoreRecord};

/// Contract every game module fulfils, including the built-in emergency menu
///
/// "Game over" and "game end" are independent signals: the first asks the
/// host to checkpoint the score, the second asks it to switch to `new_lib`.
pub trait Game {
    /// Human-readable name; also names the score file
    fn name(&self) -> String;

    fn is_game_over(&mut self) -> bool;

    /// Current score and the player it belongs to
    fn score(&mut self) -> ScoreRecord;

    /// True once the game wants to be replaced by `new_lib`
    fn is_game_end(&mut self) -> bool;

    /// Game module to load next, if any
    fn new_lib(&mut self) -> Option<PathBuf>;

    /// Display module to switch to, if any
    fn new_display(&mut self) -> Option<PathBuf>;

    /// Called once the host has acted on `new_display`
    fn clear_new_display(&mut self);

    fn handle_events(&mut self, events: &[RawEvent]);

    /// Entities of the current frame
    fn render(&mut self) -> EntitySet;

    fn set_username(&mut self, username: &str);
}

/// Contract every display module fulfils
pub trait Display {
    fn name(&self) -> String;

    /// Which sprite variant of an entity this display draws
    fn kind(&self) -> DisplayKind;

    /// Collect pending input. Implementations bound the wait themselves
    /// (tens of milliseconds) so the host loop stays responsive.
    fn poll_events(&mut self) -> Vec<RawEvent>;

    fn draw(&mut self, object: &RenderObject);

    fn clear(&mut self);

    /// Present the frame drawn since the last `clear`
    fn present(&mut self);
}
