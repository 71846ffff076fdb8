/*
 *  module/types.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Value types shared by the host and its game/display modules
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

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Classification of a dynamic module, as reported by its `getType` query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKind {
    Game,
    Display,
    Unknown,
}

impl ModuleKind {
    /// Map the raw value returned across the ABI; anything unexpected is `Unknown`
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => ModuleKind::Game,
            1 => ModuleKind::Display,
            _ => ModuleKind::Unknown,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            ModuleKind::Game => 0,
            ModuleKind::Display => 1,
            ModuleKind::Unknown => -1,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Game => write!(f, "game"),
            ModuleKind::Display => write!(f, "display"),
            ModuleKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Rendering family of a display module, used to pick an entity's sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DisplayKind {
    /// Windowed renderers (textures, fonts)
    Graphical,
    /// Character-cell renderers
    Terminal,
}

impl DisplayKind {
    pub const COUNT: usize = 2;
    pub const ALL: [DisplayKind; Self::COUNT] = [DisplayKind::Graphical, DisplayKind::Terminal];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn index(self) -> usize {
        match self {
            DisplayKind::Graphical => 0,
            DisplayKind::Terminal => 1,
        }
    }
}

/// Descriptor of one discovered module file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub path: PathBuf,
    pub declared_name: String,
    pub declared_kind: ModuleKind,
}

/// Primitive drawn by a display for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rectangle,
    Circle,
    Text,
    Music,
}

impl Shape {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Shape::Rectangle),
            1 => Some(Shape::Circle),
            2 => Some(Shape::Text),
            3 => Some(Shape::Music),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            Shape::Rectangle => 0,
            Shape::Circle => 1,
            Shape::Text => 2,
            Shape::Music => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const GREY: Rgb = Rgb::new(180, 180, 180);
    pub const CYAN: Rgb = Rgb::new(0, 255, 255);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Kind of an input event reported by a display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Press,
    Release,
    Quit,
}

impl EventKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(EventKind::Press),
            1 => Some(EventKind::Release),
            2 => Some(EventKind::Quit),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            EventKind::Press => 0,
            EventKind::Release => 1,
            EventKind::Quit => 2,
        }
    }
}

macro_rules! key_codes {
    ($($name:ident),* $(,)?) => {
        /// Keys and mouse buttons a display can report.
        ///
        /// The ABI carries the declaration index, so the order is part of the
        /// module contract.
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum KeyCode {
            $($name),*
        }

        impl KeyCode {
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$name),*];
        }
    };
}

key_codes! {
    MouseLeft, MouseRight, MouseMiddle, MouseWheelUp, MouseWheelDown,
    A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Escape, Enter, Space, Backspace, Tab, Up, Down, Left, Right,
    LShift, RShift, LCtrl, RCtrl, LAlt, RAlt,
    Home, End, Delete, Insert, PageUp, PageDown,
    Minus, Plus, Comma, Period, Slash, Semicolon, Apostrophe, Backslash, Grave,
    LBracket, RBracket,
}

impl KeyCode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

/// One input event, produced by the active display once per poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub key: KeyCode,
    pub x: i32,
    pub y: i32,
}

impl RawEvent {
    pub fn press(key: KeyCode) -> Self {
        Self { kind: EventKind::Press, key, x: 0, y: 0 }
    }

    pub fn release(key: KeyCode) -> Self {
        Self { kind: EventKind::Release, key, x: 0, y: 0 }
    }

    /// Window close / terminal hang-up; the key is not meaningful
    pub fn quit() -> Self {
        Self { kind: EventKind::Quit, key: KeyCode::Escape, x: 0, y: 0 }
    }

    pub fn is_press(&self, key: KeyCode) -> bool {
        self.kind == EventKind::Press && self.key == key
    }

    pub fn is_quit(&self) -> bool {
        self.kind == EventKind::Quit
    }
}

/// Render primitive emitted by a game, with one sprite per display family
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub rotation: i32,
    pub color: Rgb,
    pub sprites: BTreeMap<DisplayKind, String>,
}

impl Entity {
    pub fn new(shape: Shape, x: i32, y: i32) -> Self {
        Self {
            shape,
            x,
            y,
            width: 0,
            height: 0,
            rotation: 0,
            color: Rgb::WHITE,
            sprites: BTreeMap::new(),
        }
    }

    /// Text entity carrying the same label for every display family
    pub fn text(x: i32, y: i32, label: &str) -> Self {
        let mut entity = Self::new(Shape::Text, x, y);
        for kind in DisplayKind::ALL {
            entity.sprites.insert(kind, label.to_string());
        }
        entity
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_sprite(mut self, kind: DisplayKind, sprite: impl Into<String>) -> Self {
        self.sprites.insert(kind, sprite.into());
        self
    }

    pub fn sprite_for(&self, kind: DisplayKind) -> Option<&str> {
        self.sprites.get(&kind).map(String::as_str)
    }

    /// Resolve against a display family; `None` when no sprite exists for it
    pub fn resolve(&self, kind: DisplayKind) -> Option<RenderObject> {
        let sprite = self.sprite_for(kind)?;
        Some(RenderObject {
            shape: self.shape,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            color: self.color,
            sprite: sprite.to_string(),
        })
    }
}

/// Named entities of one frame; names are unique, order carries no meaning
pub type EntitySet = BTreeMap<String, Entity>;

/// An entity resolved for one display family, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub rotation: i32,
    pub color: Rgb,
    pub sprite: String,
}

/// Score reported by a game
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub player: String,
    pub score: f32,
}

impl ScoreRecord {
    pub fn new(player: impl Into<String>, score: f32) -> Self {
        Self { player: player.into(), score }
    }
}
