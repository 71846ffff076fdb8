/*
 *  module/ffi.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  C ABI types for the module interface
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

//! FFI types for the Arcade module system
//!
//! Host and modules share no Rust types. Everything that crosses the boundary
//! is defined here with `#[repr(C)]`, and every module exports the same four
//! no-argument symbols:
//!
//! ```c
//! const ArcadeGameVTable    *arcade_game_entry(void);     // game modules
//! const ArcadeDisplayVTable *arcade_display_entry(void);  // display modules
//! const char                *arcade_get_name(void);
//! int32_t                    arcade_get_type(void);       // 0 game, 1 display
//! ```
//!
//! Strings leave a module by being copied into host-owned buffers, entities
//! are streamed through a host-supplied sink, and events are written into a
//! host-provided array.

use std::ffi::{c_char, c_void};

use crate::module::types::{
    DisplayKind, Entity, EventKind, KeyCode, RawEvent, RenderObject, Rgb, Shape,
};

/// Module ABI version
pub const ARCADE_ABI_VERSION_MAJOR: u32 = 1;
pub const ARCADE_ABI_VERSION_MINOR: u32 = 0;
pub const ARCADE_ABI_VERSION_PATCH: u32 = 0;

/// Factory of game modules
pub const ARCADE_GAME_ENTRY_SYMBOL: &str = "arcade_game_entry";
/// Factory of display modules
pub const ARCADE_DISPLAY_ENTRY_SYMBOL: &str = "arcade_display_entry";
/// Metadata query returning the module's human-readable name
pub const ARCADE_NAME_SYMBOL: &str = "arcade_get_name";
/// Metadata query returning the module's kind
pub const ARCADE_TYPE_SYMBOL: &str = "arcade_get_type";

/// Buffer size for names (module, player)
pub const ARCADE_NAME_SIZE: usize = 64;
/// Buffer size for module paths requested by a game
pub const ARCADE_PATH_SIZE: usize = 1024;
/// Maximum events a display may hand over per poll
pub const ARCADE_MAX_EVENTS: usize = 64;

/// Opaque handle to a module instance
#[repr(C)]
pub struct ArcadeInstanceHandle {
    _private: [u8; 0],
}

/// Input event as written by a display module
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArcadeRawEvent {
    pub kind: u32,
    pub key: u32,
    pub x: i32,
    pub y: i32,
}

impl From<&RawEvent> for ArcadeRawEvent {
    fn from(event: &RawEvent) -> Self {
        Self {
            kind: event.kind.as_raw(),
            key: event.key.as_raw(),
            x: event.x,
            y: event.y,
        }
    }
}

impl ArcadeRawEvent {
    /// `None` for kinds or keys this host does not know
    pub fn to_event(&self) -> Option<RawEvent> {
        Some(RawEvent {
            kind: EventKind::from_raw(self.kind)?,
            key: KeyCode::from_raw(self.key)?,
            x: self.x,
            y: self.y,
        })
    }
}

/// Entity streamed out of a game module.
///
/// `sprites` is indexed by display kind (0 graphical, 1 terminal); a null
/// pointer means the entity has no sprite for that family. The pointers only
/// need to stay valid for the duration of the sink call.
#[repr(C)]
pub struct ArcadeEntity {
    pub shape: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub rotation: i32,
    pub rgb: [u8; 3],
    pub sprites: [*const c_char; DisplayKind::COUNT],
}

impl ArcadeEntity {
    /// Copy into an owned entity.
    ///
    /// # Safety
    ///
    /// Every non-null sprite pointer must reference a nul-terminated string.
    pub unsafe fn to_entity(&self) -> Option<Entity> {
        let shape = Shape::from_raw(self.shape)?;
        let mut entity = Entity::new(shape, self.x, self.y)
            .with_size(self.width, self.height)
            .with_color(Rgb::new(self.rgb[0], self.rgb[1], self.rgb[2]));
        entity.rotation = self.rotation;

        for kind in DisplayKind::ALL {
            let ptr = self.sprites[kind.index()];
            if !ptr.is_null() {
                let sprite = unsafe { std::ffi::CStr::from_ptr(ptr) };
                entity.sprites.insert(kind, sprite.to_string_lossy().into_owned());
            }
        }
        Some(entity)
    }
}

/// Object handed to a display's `draw`; `sprite` is owned by the host and
/// valid only for the duration of the call
#[repr(C)]
pub struct ArcadeRenderObject {
    pub shape: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub rotation: i32,
    pub rgb: [u8; 3],
    pub sprite: *const c_char,
}

impl ArcadeRenderObject {
    /// Borrow `sprite` for the lifetime of the returned value's use
    pub fn new(object: &RenderObject, sprite: *const c_char) -> Self {
        Self {
            shape: object.shape.as_raw(),
            x: object.x,
            y: object.y,
            width: object.width,
            height: object.height,
            rotation: object.rotation,
            rgb: [object.color.r, object.color.g, object.color.b],
            sprite,
        }
    }
}

/// Callback a game calls once per entity during `render`
pub type ArcadeEntitySink = extern "C" fn(
    ctx: *mut c_void,
    name: *const c_char,
    entity: *const ArcadeEntity,
);

/// Game vtable - function pointers for every game operation
#[repr(C)]
pub struct ArcadeGameVTable {
    /// Get module ABI version (major, minor, patch)
    pub abi_version: extern "C" fn(major: *mut u32, minor: *mut u32, patch: *mut u32),

    /// Create a game instance, null on failure
    pub create: extern "C" fn() -> *mut ArcadeInstanceHandle,

    /// Destroy a game instance
    pub destroy: extern "C" fn(handle: *mut ArcadeInstanceHandle),

    pub name: extern "C" fn(handle: *const ArcadeInstanceHandle, buf: *mut c_char, cap: usize),

    pub is_game_over: extern "C" fn(handle: *mut ArcadeInstanceHandle) -> bool,

    pub score: extern "C" fn(
        handle: *mut ArcadeInstanceHandle,
        value: *mut f32,
        player: *mut c_char,
        cap: usize,
    ),

    pub is_game_end: extern "C" fn(handle: *mut ArcadeInstanceHandle) -> bool,

    /// Copy the next game path into `buf`; empty string means none
    pub new_lib: extern "C" fn(handle: *mut ArcadeInstanceHandle, buf: *mut c_char, cap: usize),

    /// Copy the requested display path into `buf`; empty string means none
    pub new_display:
        extern "C" fn(handle: *mut ArcadeInstanceHandle, buf: *mut c_char, cap: usize),

    pub clear_new_display: extern "C" fn(handle: *mut ArcadeInstanceHandle),

    pub handle_events: extern "C" fn(
        handle: *mut ArcadeInstanceHandle,
        events: *const ArcadeRawEvent,
        len: usize,
    ),

    /// Emit every entity of the frame through `sink`
    pub render:
        extern "C" fn(handle: *mut ArcadeInstanceHandle, sink: ArcadeEntitySink, ctx: *mut c_void),

    pub set_username: extern "C" fn(handle: *mut ArcadeInstanceHandle, name: *const c_char),
}

/// Display vtable - function pointers for every display operation
#[repr(C)]
pub struct ArcadeDisplayVTable {
    /// Get module ABI version (major, minor, patch)
    pub abi_version: extern "C" fn(major: *mut u32, minor: *mut u32, patch: *mut u32),

    /// Create a display instance (opens the window / terminal), null on failure
    pub create: extern "C" fn() -> *mut ArcadeInstanceHandle,

    /// Destroy a display instance
    pub destroy: extern "C" fn(handle: *mut ArcadeInstanceHandle),

    pub name: extern "C" fn(handle: *const ArcadeInstanceHandle, buf: *mut c_char, cap: usize),

    /// Display family, see [`DisplayKind`]
    pub kind: extern "C" fn(handle: *const ArcadeInstanceHandle) -> u32,

    /// Write up to `cap` events into `out`, return how many were written
    pub poll_events: extern "C" fn(
        handle: *mut ArcadeInstanceHandle,
        out: *mut ArcadeRawEvent,
        cap: usize,
    ) -> usize,

    pub draw: extern "C" fn(handle: *mut ArcadeInstanceHandle, object: *const ArcadeRenderObject),

    pub clear: extern "C" fn(handle: *mut ArcadeInstanceHandle),

    pub present: extern "C" fn(handle: *mut ArcadeInstanceHandle),
}

/// Game factory. Each game module must export:
/// ```c
/// #[unsafe(no_mangle)]
/// pub extern "C" fn arcade_game_entry() -> *const ArcadeGameVTable
/// ```
pub type GameEntryFn = extern "C" fn() -> *const ArcadeGameVTable;

/// Display factory, exported as `arcade_display_entry`
pub type DisplayEntryFn = extern "C" fn() -> *const ArcadeDisplayVTable;

/// `arcade_get_name`: static nul-terminated module name
pub type ModuleNameFn = extern "C" fn() -> *const c_char;

/// `arcade_get_type`: 0 game, 1 display
pub type ModuleTypeFn = extern "C" fn() -> i32;

/// Extract a nul-terminated string from a C buffer
pub fn extract_string(buffer: &[c_char]) -> String {
    let len = buffer.iter()
        .position(|&c| c == 0)
        .unwrap_or(buffer.len());

    let bytes: Vec<u8> = buffer[..len]
        .iter()
        .map(|&c| c as u8)
        .collect();

    String::from_utf8_lossy(&bytes).into_owned()
}
