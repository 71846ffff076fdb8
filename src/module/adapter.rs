/*
 *  module/adapter.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Module adapters - wrap C ABI vtables as Rust trait objects
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

use std::ffi::{CStr, CString, c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use log::{debug, error, warn};

use crate::module::error::ModuleError;
use crate::module::traits::{Display, Game};
use crate::module::types::{DisplayKind, EntitySet, RawEvent, RenderObject, ScoreRecord};
use super::ffi::{
    ArcadeDisplayVTable,
    ArcadeEntity,
    ArcadeGameVTable,
    ArcadeInstanceHandle,
    ArcadeRawEvent,
    ArcadeRenderObject,
    ARCADE_MAX_EVENTS,
    ARCADE_NAME_SIZE,
    ARCADE_PATH_SIZE,
    extract_string,
};

/// Adapter that drives a game module through its vtable
///
/// The vtable and the instance live inside the module's mapped library. The
/// owning `LoadedModule` drops this adapter before it releases the library,
/// so neither pointer is used after unload.
pub struct PluginGame {
    vtable: &'static ArcadeGameVTable,
    handle: *mut ArcadeInstanceHandle,
}

impl PluginGame {
    /// Wrap an instance returned by `vtable.create`; `handle` must be non-null
    pub fn new(vtable: &'static ArcadeGameVTable, handle: *mut ArcadeInstanceHandle) -> Self {
        debug!("Created game instance: {:p}", handle);
        Self { vtable, handle }
    }

    fn read_path(&self, f: extern "C" fn(*mut ArcadeInstanceHandle, *mut c_char, usize))
        -> Option<PathBuf>
    {
        let mut buf = vec![0 as c_char; ARCADE_PATH_SIZE];
        let handle = self.handle;
        if let Err(e) = catch_ffi_call(|| f(handle, buf.as_mut_ptr(), buf.len())) {
            error!("{}", e);
            return None;
        }
        let path = extract_string(&buf);
        if path.is_empty() { None } else { Some(PathBuf::from(path)) }
    }
}

impl Game for PluginGame {
    fn name(&self) -> String {
        read_name(self.vtable.name, self.handle)
    }

    fn is_game_over(&mut self) -> bool {
        let (f, handle) = (self.vtable.is_game_over, self.handle);
        catch_ffi_call(|| f(handle)).unwrap_or_else(|e| {
            error!("{}", e);
            false
        })
    }

    fn score(&mut self) -> ScoreRecord {
        let (f, handle) = (self.vtable.score, self.handle);
        let mut value = 0.0f32;
        let mut player = vec![0 as c_char; ARCADE_NAME_SIZE];

        if let Err(e) = catch_ffi_call(|| f(handle, &mut value, player.as_mut_ptr(), player.len())) {
            error!("{}", e);
            return ScoreRecord::new("", 0.0);
        }
        ScoreRecord::new(extract_string(&player), value)
    }

    fn is_game_end(&mut self) -> bool {
        let (f, handle) = (self.vtable.is_game_end, self.handle);
        catch_ffi_call(|| f(handle)).unwrap_or_else(|e| {
            error!("{}", e);
            false
        })
    }

    fn new_lib(&mut self) -> Option<PathBuf> {
        self.read_path(self.vtable.new_lib)
    }

    fn new_display(&mut self) -> Option<PathBuf> {
        self.read_path(self.vtable.new_display)
    }

    fn clear_new_display(&mut self) {
        let (f, handle) = (self.vtable.clear_new_display, self.handle);
        if let Err(e) = catch_ffi_call(|| f(handle)) {
            error!("{}", e);
        }
    }

    fn handle_events(&mut self, events: &[RawEvent]) {
        let raw: Vec<ArcadeRawEvent> = events.iter().map(ArcadeRawEvent::from).collect();
        let (f, handle) = (self.vtable.handle_events, self.handle);
        if let Err(e) = catch_ffi_call(|| f(handle, raw.as_ptr(), raw.len())) {
            error!("{}", e);
        }
    }

    fn render(&mut self) -> EntitySet {
        let mut entities = EntitySet::new();
        let ctx = &mut entities as *mut EntitySet as *mut c_void;
        let (f, handle) = (self.vtable.render, self.handle);

        if let Err(e) = catch_ffi_call(|| f(handle, collect_entity, ctx)) {
            error!("{}", e);
            return EntitySet::new();
        }
        entities
    }

    fn set_username(&mut self, username: &str) {
        let Ok(name) = CString::new(username) else {
            warn!("Ignoring player name with an embedded nul: {:?}", username);
            return;
        };
        let (f, handle) = (self.vtable.set_username, self.handle);
        if let Err(e) = catch_ffi_call(|| f(handle, name.as_ptr())) {
            error!("{}", e);
        }
    }
}

impl Drop for PluginGame {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            debug!("Destroying game instance: {:p}", self.handle);
            (self.vtable.destroy)(self.handle);
            self.handle = std::ptr::null_mut();
        }
    }
}

/// Adapter that drives a display module through its vtable
///
/// Name and kind are queried once and cached.
pub struct PluginDisplay {
    vtable: &'static ArcadeDisplayVTable,
    handle: *mut ArcadeInstanceHandle,
    name: String,
    kind: DisplayKind,
}

impl PluginDisplay {
    /// Wrap an instance returned by `vtable.create`; `handle` must be non-null
    pub fn new(vtable: &'static ArcadeDisplayVTable, handle: *mut ArcadeInstanceHandle) -> Self {
        let name = read_name(vtable.name, handle);
        let kind_fn = vtable.kind;
        let raw_kind = catch_ffi_call(|| kind_fn(handle)).unwrap_or(u32::MAX);
        let kind = DisplayKind::from_raw(raw_kind).unwrap_or_else(|| {
            warn!("Display {} reports unknown kind {}, assuming graphical", name, raw_kind);
            DisplayKind::Graphical
        });

        debug!("Created display instance {:p}: {} ({:?})", handle, name, kind);

        Self { vtable, handle, name, kind }
    }
}

impl Display for PluginDisplay {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> DisplayKind {
        self.kind
    }

    fn poll_events(&mut self) -> Vec<RawEvent> {
        let mut buf = [ArcadeRawEvent::default(); ARCADE_MAX_EVENTS];
        let (f, handle) = (self.vtable.poll_events, self.handle);

        let count = match catch_ffi_call(|| f(handle, buf.as_mut_ptr(), buf.len())) {
            Ok(count) => count.min(buf.len()),
            Err(e) => {
                error!("{}", e);
                return Vec::new();
            }
        };

        buf[..count].iter()
            .filter_map(|raw| {
                let event = raw.to_event();
                if event.is_none() {
                    debug!("Dropping unknown event from {}: {:?}", self.name, raw);
                }
                event
            })
            .collect()
    }

    fn draw(&mut self, object: &RenderObject) {
        let Ok(sprite) = CString::new(object.sprite.as_str()) else {
            warn!("Skipping sprite with an embedded nul: {:?}", object.sprite);
            return;
        };
        let ffi_object = ArcadeRenderObject::new(object, sprite.as_ptr());
        let (f, handle) = (self.vtable.draw, self.handle);
        if let Err(e) = catch_ffi_call(|| f(handle, &ffi_object)) {
            error!("{}", e);
        }
    }

    fn clear(&mut self) {
        let (f, handle) = (self.vtable.clear, self.handle);
        if let Err(e) = catch_ffi_call(|| f(handle)) {
            error!("{}", e);
        }
    }

    fn present(&mut self) {
        let (f, handle) = (self.vtable.present, self.handle);
        if let Err(e) = catch_ffi_call(|| f(handle)) {
            error!("{}", e);
        }
    }
}

impl Drop for PluginDisplay {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            debug!("Destroying display instance: {:p}", self.handle);
            (self.vtable.destroy)(self.handle);
            self.handle = std::ptr::null_mut();
        }
    }
}

fn read_name(
    f: extern "C" fn(*const ArcadeInstanceHandle, *mut c_char, usize),
    handle: *const ArcadeInstanceHandle,
) -> String {
    let mut buf = vec![0 as c_char; ARCADE_NAME_SIZE];
    match catch_ffi_call(|| f(handle, buf.as_mut_ptr(), buf.len())) {
        Ok(()) => extract_string(&buf),
        Err(e) => {
            error!("{}", e);
            String::new()
        }
    }
}

/// Sink handed to a game's `render`; `ctx` is the `EntitySet` being filled
extern "C" fn collect_entity(ctx: *mut c_void, name: *const c_char, entity: *const ArcadeEntity) {
    if ctx.is_null() || name.is_null() || entity.is_null() {
        return;
    }

    let entities = unsafe { &mut *(ctx as *mut EntitySet) };
    let name = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();

    match unsafe { (*entity).to_entity() } {
        Some(entity) => {
            entities.insert(name, entity);
        }
        None => debug!("Dropping entity {} with an unknown shape", name),
    }
}

/// Wrap an FFI call with panic safety
///
/// Panics raised on the module side are caught and reported as
/// `ModuleError::Panicked` instead of unwinding through the host loop.
pub(crate) fn catch_ffi_call<F, T>(f: F) -> Result<T, ModuleError>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|panic_info| {
        let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown error".to_string()
        };

        error!("Caught panic in module call: {}", message);
        ModuleError::Panicked(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::types::{Entity, Shape};

    #[test]
    fn test_catch_ffi_call_success() {
        let result = catch_ffi_call(|| 7);
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_catch_ffi_call_panic() {
        let result: Result<(), _> = catch_ffi_call(|| panic!("Test panic"));
        match result {
            Err(ModuleError::Panicked(msg)) => assert!(msg.contains("Test panic")),
            other => panic!("expected a panic error, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_entity_fills_the_set() {
        let mut entities = EntitySet::new();
        let name = CString::new("player").unwrap();
        let sprite = CString::new("assets/player.png").unwrap();
        let ffi_entity = ArcadeEntity {
            shape: Shape::Rectangle.as_raw(),
            x: 10,
            y: 20,
            width: 30,
            height: 40,
            rotation: 0,
            rgb: [255, 0, 0],
            sprites: [sprite.as_ptr(), std::ptr::null()],
        };

        collect_entity(&mut entities as *mut EntitySet as *mut c_void, name.as_ptr(), &ffi_entity);

        let expected = Entity::new(Shape::Rectangle, 10, 20)
            .with_size(30, 40)
            .with_color(crate::module::types::Rgb::new(255, 0, 0))
            .with_sprite(DisplayKind::Graphical, "assets/player.png");
        assert_eq!(entities.get("player"), Some(&expected));
    }

    #[test]
    fn test_collect_entity_ignores_null_arguments() {
        let mut entities = EntitySet::new();
        collect_entity(
            &mut entities as *mut EntitySet as *mut c_void,
            std::ptr::null(),
            std::ptr::null(),
        );
        assert!(entities.is_empty());
    }

    mod fake_display {
        use super::*;
        use crate::module::types::{EventKind, KeyCode};
        use std::sync::atomic::{AtomicUsize, Ordering};

        pub static DESTROYED: AtomicUsize = AtomicUsize::new(0);

        extern "C" fn abi_version(_: *mut u32, _: *mut u32, _: *mut u32) {}

        pub extern "C" fn create() -> *mut ArcadeInstanceHandle {
            Box::into_raw(Box::new(0u8)) as *mut ArcadeInstanceHandle
        }

        extern "C" fn destroy(handle: *mut ArcadeInstanceHandle) {
            unsafe { drop(Box::from_raw(handle as *mut u8)) };
            DESTROYED.fetch_add(1, Ordering::SeqCst);
        }

        extern "C" fn name(_: *const ArcadeInstanceHandle, buf: *mut c_char, cap: usize) {
            let bytes = b"Fake\0";
            let len = bytes.len().min(cap);
            unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, buf, len) };
        }

        extern "C" fn kind(_: *const ArcadeInstanceHandle) -> u32 {
            1
        }

        extern "C" fn poll_events(_: *mut ArcadeInstanceHandle, out: *mut ArcadeRawEvent, cap: usize) -> usize {
            let events = [
                ArcadeRawEvent { kind: EventKind::Press.as_raw(), key: KeyCode::Up.as_raw(), x: 0, y: 0 },
                ArcadeRawEvent { kind: 99, key: 0, x: 0, y: 0 },
            ];
            let len = events.len().min(cap);
            unsafe { std::ptr::copy_nonoverlapping(events.as_ptr(), out, len) };
            len
        }

        extern "C" fn draw(_: *mut ArcadeInstanceHandle, _: *const ArcadeRenderObject) {}

        extern "C" fn noop(_: *mut ArcadeInstanceHandle) {}

        pub static VTABLE: ArcadeDisplayVTable = ArcadeDisplayVTable {
            abi_version,
            create,
            destroy,
            name,
            kind,
            poll_events,
            draw,
            clear: noop,
            present: noop,
        };
    }

    #[test]
    fn test_plugin_display_through_vtable() {
        use crate::module::types::KeyCode;
        use std::sync::atomic::Ordering;

        let mut display = PluginDisplay::new(&fake_display::VTABLE, fake_display::create());
        assert_eq!(display.name(), "Fake");
        assert_eq!(display.kind(), DisplayKind::Terminal);

        // the event with an unknown kind is dropped
        assert_eq!(display.poll_events(), vec![RawEvent::press(KeyCode::Up)]);

        drop(display);
        assert_eq!(fake_display::DESTROYED.load(Ordering::SeqCst), 1);
    }
}
