/*
 *  core/hotkeys.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Reserved host key bindings
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

use crate::config::HotkeyConfig;
use crate::module::types::{KeyCode, RawEvent};

/// What a reserved key asks the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    PrevDisplay,
    NextDisplay,
    PrevGame,
    NextGame,
    ReloadGame,
    ReloadDisplay,
    ReloadAll,
}

/// Key bound to each host action; presses of these keys never reach the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkeys {
    bindings: [(KeyCode, HotkeyAction); 7],
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            bindings: [
                (KeyCode::F1, HotkeyAction::PrevDisplay),
                (KeyCode::F2, HotkeyAction::NextDisplay),
                (KeyCode::F3, HotkeyAction::PrevGame),
                (KeyCode::F4, HotkeyAction::NextGame),
                (KeyCode::F5, HotkeyAction::ReloadGame),
                (KeyCode::F6, HotkeyAction::ReloadDisplay),
                (KeyCode::F7, HotkeyAction::ReloadAll),
            ],
        }
    }
}

impl Hotkeys {
    /// Defaults overridden by whatever the config binds
    pub fn from_config(config: &HotkeyConfig) -> Self {
        let mut hotkeys = Self::default();
        let overrides = [
            (config.prev_display, HotkeyAction::PrevDisplay),
            (config.next_display, HotkeyAction::NextDisplay),
            (config.prev_game, HotkeyAction::PrevGame),
            (config.next_game, HotkeyAction::NextGame),
            (config.reload_game, HotkeyAction::ReloadGame),
            (config.reload_display, HotkeyAction::ReloadDisplay),
            (config.reload_all, HotkeyAction::ReloadAll),
        ];
        for (key, action) in overrides {
            if let Some(key) = key {
                if let Some(binding) = hotkeys.bindings.iter_mut().find(|(_, a)| *a == action) {
                    binding.0 = key;
                }
            }
        }
        hotkeys
    }

    pub fn key_for(&self, action: HotkeyAction) -> Option<KeyCode> {
        self.bindings.iter().find(|(_, a)| *a == action).map(|(k, _)| *k)
    }

    /// First key bound to more than one action
    pub fn conflict(&self) -> Option<KeyCode> {
        self.bindings.iter().enumerate().find_map(|(i, (key, _))| {
            self.bindings[i + 1..].iter().any(|(k, _)| k == key).then_some(*key)
        })
    }

    /// Host action for an event; only presses trigger actions
    pub fn action_for(&self, event: &RawEvent) -> Option<HotkeyAction> {
        self.bindings
            .iter()
            .find(|(key, _)| event.is_press(*key))
            .map(|(_, action)| *action)
    }

    /// Whether the event concerns a reserved key (press or release)
    pub fn is_reserved(&self, event: &RawEvent) -> bool {
        !event.is_quit() && self.bindings.iter().any(|(key, _)| *key == event.key)
    }
}

/// Next index in a list of `len` items, wrapping; `None` for an empty list.
///
/// `current` outside the list (nothing selected yet) starts at the first
/// item going forward and the last one going backward.
pub fn cycle(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match current.filter(|&i| i < len) {
        None if forward => 0,
        None => len - 1,
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
    };
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let hotkeys = Hotkeys::default();
        assert_eq!(hotkeys.action_for(&RawEvent::press(KeyCode::F2)), Some(HotkeyAction::NextDisplay));
        assert_eq!(hotkeys.action_for(&RawEvent::press(KeyCode::F7)), Some(HotkeyAction::ReloadAll));
        assert_eq!(hotkeys.action_for(&RawEvent::release(KeyCode::F2)), None);
        assert_eq!(hotkeys.action_for(&RawEvent::press(KeyCode::A)), None);
        assert!(hotkeys.conflict().is_none());
    }

    #[test]
    fn test_reserved_covers_releases_but_not_quit() {
        let hotkeys = Hotkeys::default();
        assert!(hotkeys.is_reserved(&RawEvent::release(KeyCode::F1)));
        assert!(!hotkeys.is_reserved(&RawEvent::press(KeyCode::Up)));
        assert!(!hotkeys.is_reserved(&RawEvent::quit()));
    }

    #[test]
    fn test_config_overrides() {
        let config = HotkeyConfig { next_display: Some(KeyCode::Tab), ..Default::default() };
        let hotkeys = Hotkeys::from_config(&config);
        assert_eq!(hotkeys.key_for(HotkeyAction::NextDisplay), Some(KeyCode::Tab));
        assert_eq!(hotkeys.action_for(&RawEvent::press(KeyCode::F2)), None);
        assert_eq!(hotkeys.key_for(HotkeyAction::PrevDisplay), Some(KeyCode::F1));
    }

    #[test]
    fn test_conflict_with_default() {
        let config = HotkeyConfig { next_game: Some(KeyCode::F2), ..Default::default() };
        assert_eq!(Hotkeys::from_config(&config).conflict(), Some(KeyCode::F2));
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(cycle(Some(2), 3, true), Some(0));
        assert_eq!(cycle(Some(0), 3, false), Some(2));
        assert_eq!(cycle(Some(1), 3, true), Some(2));
        assert_eq!(cycle(None, 3, true), Some(0));
        assert_eq!(cycle(None, 3, false), Some(2));
        assert_eq!(cycle(Some(7), 3, true), Some(0));
        assert_eq!(cycle(None, 0, true), None);
    }
}
