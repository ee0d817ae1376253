//! In-memory window system and browser doubles for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use x11rb::errors::ConnectionError;
use x11rb::protocol::xproto::{Atom, ClientMessageEvent, ConfigureWindowAux, EventMask, Window};

use crate::browser::{BrowserHost, HostLookup, ToolkitHost};
use crate::error::{Result, WindowError};
use crate::shared::{Point, Rect};
use crate::x11::atoms::Atoms;
use crate::x11::display::{TreeInfo, WindowSystem};

pub const ROOT: Window = 1;

pub fn fake_atoms() -> Atoms {
    Atoms {
        wm_protocols: 100,
        wm_delete_window: 101,
        net_wm_pid: 102,
        net_wm_ping: 103,
        net_wm_state: 104,
        net_wm_state_above: 105,
        net_wm_name: 106,
        utf8_string: 107,
        xdnd_proxy: 108,
        atom: 4,
        cardinal: 6,
        window: 33,
        string: 31,
        wm_name: 39,
        wm_client_machine: 36,
    }
}

#[derive(Debug, Default)]
struct FakeWindow {
    parent: Window,
    children: Vec<Window>,
    mapped: bool,
    bounds: Rect,
    event_mask: Option<EventMask>,
    props32: HashMap<Atom, (Atom, Vec<u32>)>,
    props8: HashMap<Atom, (Atom, Vec<u8>)>,
}

/// A recorded configure request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configure {
    pub window: Window,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A recorded SendEvent
#[derive(Debug, Clone)]
pub struct Sent {
    pub destination: Window,
    pub mask: EventMask,
    pub message: ClientMessageEvent,
}

/// Window system double with a real parent/child tree
pub struct FakeDisplay {
    atoms: Atoms,
    windows: RefCell<HashMap<Window, FakeWindow>>,
    next_id: Cell<Window>,
    focus: Cell<Option<Window>>,
    pub fail_create: Cell<bool>,
    pub fail_property_writes: Cell<bool>,
    pub maps: RefCell<Vec<Window>>,
    pub withdrawals: RefCell<Vec<Window>>,
    pub destroyed: RefCell<Vec<Window>>,
    pub configures: RefCell<Vec<Configure>>,
    pub position_hints: RefCell<Vec<(Window, i32, i32)>>,
    pub property_writes: RefCell<Vec<(Window, Atom, Vec<u32>)>>,
    pub sent: RefCell<Vec<Sent>>,
    pub focus_requests: RefCell<Vec<Window>>,
    pub flushes: Cell<usize>,
}

impl FakeDisplay {
    pub fn new() -> Self {
        let mut windows = HashMap::new();
        windows.insert(
            ROOT,
            FakeWindow {
                mapped: true,
                bounds: Rect::new(0, 0, 1920, 1080),
                ..Default::default()
            },
        );
        Self {
            atoms: fake_atoms(),
            windows: RefCell::new(windows),
            next_id: Cell::new(0x0040_0000),
            focus: Cell::new(None),
            fail_create: Cell::new(false),
            fail_property_writes: Cell::new(false),
            maps: RefCell::new(Vec::new()),
            withdrawals: RefCell::new(Vec::new()),
            destroyed: RefCell::new(Vec::new()),
            configures: RefCell::new(Vec::new()),
            position_hints: RefCell::new(Vec::new()),
            property_writes: RefCell::new(Vec::new()),
            sent: RefCell::new(Vec::new()),
            focus_requests: RefCell::new(Vec::new()),
            flushes: Cell::new(0),
        }
    }

    /// Insert a mapped window at the origin of `parent`
    pub fn add_window(&self, window: Window, parent: Window) {
        self.insert(window, parent, Rect::new(0, 0, 100, 100), true);
    }

    pub fn add_window_at(&self, window: Window, parent: Window, bounds: Rect) {
        self.insert(window, parent, bounds, true);
    }

    fn insert(&self, window: Window, parent: Window, bounds: Rect, mapped: bool) {
        let mut windows = self.windows.borrow_mut();
        windows.insert(
            window,
            FakeWindow {
                parent,
                mapped,
                bounds,
                ..Default::default()
            },
        );
        if let Some(p) = windows.get_mut(&parent) {
            p.children.push(window);
        }
    }

    pub fn exists(&self, window: Window) -> bool {
        self.windows.borrow().contains_key(&window)
    }

    pub fn is_mapped(&self, window: Window) -> bool {
        self.windows.borrow().get(&window).is_some_and(|w| w.mapped)
    }

    pub fn set_mapped(&self, window: Window, mapped: bool) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.mapped = mapped;
        }
    }

    pub fn event_mask(&self, window: Window) -> Option<EventMask> {
        self.windows.borrow().get(&window).and_then(|w| w.event_mask)
    }

    pub fn set_focus(&self, window: Option<Window>) {
        self.focus.set(window);
    }

    pub fn focused(&self) -> Option<Window> {
        self.focus.get()
    }

    pub fn property32(&self, window: Window, property: Atom) -> Option<Vec<u32>> {
        self.windows
            .borrow()
            .get(&window)
            .and_then(|w| w.props32.get(&property))
            .map(|(_, data)| data.clone())
    }

    pub fn property8(&self, window: Window, property: Atom) -> Option<Vec<u8>> {
        self.windows
            .borrow()
            .get(&window)
            .and_then(|w| w.props8.get(&property))
            .map(|(_, data)| data.clone())
    }

    /// Store a property without recording it as a write
    pub fn preset_property32(&self, window: Window, property: Atom, type_: Atom, data: &[u32]) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.props32.insert(property, (type_, data.to_vec()));
        }
    }

    pub fn writes_to(&self, window: Window, property: Atom) -> Vec<Vec<u32>> {
        self.property_writes
            .borrow()
            .iter()
            .filter(|(w, p, _)| *w == window && *p == property)
            .map(|(_, _, data)| data.clone())
            .collect()
    }

    pub fn configures_of(&self, window: Window) -> Vec<Configure> {
        self.configures
            .borrow()
            .iter()
            .filter(|c| c.window == window)
            .copied()
            .collect()
    }
}

impl WindowSystem for FakeDisplay {
    fn root(&self) -> Window {
        ROOT
    }

    fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    fn create_window(&self, parent: Window, bounds: Rect) -> Result<Window> {
        if self.fail_create.get() || !self.exists(parent) {
            return Err(WindowError::CreateFailed { parent });
        }
        let window = self.next_id.get();
        self.next_id.set(window + 1);
        self.insert(window, parent, bounds, false);
        Ok(window)
    }

    fn destroy_window(&self, window: Window) -> Result<()> {
        let mut windows = self.windows.borrow_mut();
        if let Some(removed) = windows.remove(&window) {
            if let Some(p) = windows.get_mut(&removed.parent) {
                p.children.retain(|&c| c != window);
            }
            for child in removed.children {
                windows.remove(&child);
            }
        }
        self.destroyed.borrow_mut().push(window);
        Ok(())
    }

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()> {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.event_mask = Some(mask);
        }
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.set_mapped(window, true);
        self.maps.borrow_mut().push(window);
        Ok(())
    }

    fn withdraw_window(&self, window: Window) -> Result<()> {
        self.set_mapped(window, false);
        self.withdrawals.borrow_mut().push(window);
        Ok(())
    }

    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        self.configures.borrow_mut().push(Configure {
            window,
            x: changes.x,
            y: changes.y,
            width: changes.width,
            height: changes.height,
        });
        Ok(())
    }

    fn set_position_hints(&self, window: Window, x: i32, y: i32) -> Result<()> {
        self.position_hints.borrow_mut().push((window, x, y));
        Ok(())
    }

    fn get_property32(&self, window: Window, property: Atom, _type: Atom) -> Option<Vec<u32>> {
        self.property32(window, property)
    }

    fn change_property32(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> Result<()> {
        if self.fail_property_writes.get() {
            return Err(ConnectionError::UnknownError.into());
        }
        self.preset_property32(window, property, type_, data);
        self.property_writes
            .borrow_mut()
            .push((window, property, data.to_vec()));
        Ok(())
    }

    fn change_property8(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u8],
    ) -> Result<()> {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.props8.insert(property, (type_, data.to_vec()));
        }
        Ok(())
    }

    fn send_event(
        &self,
        destination: Window,
        mask: EventMask,
        message: &ClientMessageEvent,
    ) -> Result<()> {
        self.sent.borrow_mut().push(Sent {
            destination,
            mask,
            message: message.clone(),
        });
        Ok(())
    }

    fn input_focus(&self) -> Option<Window> {
        self.focus.get()
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.focus.set(Some(window));
        self.focus_requests.borrow_mut().push(window);
        Ok(())
    }

    fn translate_to_root(&self, window: Window, x: i16, y: i16) -> Option<Point> {
        let windows = self.windows.borrow();
        let mut current = windows.get(&window)?;
        let mut point = Point::new(x as i32, y as i32);
        let mut id = window;
        while id != ROOT {
            point = point.offset(current.bounds.origin());
            id = current.parent;
            current = windows.get(&id)?;
        }
        Some(point)
    }

    fn query_tree(&self, window: Window) -> Option<TreeInfo> {
        let windows = self.windows.borrow();
        let w = windows.get(&window)?;
        Some(TreeInfo {
            root: ROOT,
            parent: w.parent,
            children: w.children.clone(),
        })
    }

    fn is_viewable(&self, window: Window) -> bool {
        let windows = self.windows.borrow();
        let mut id = window;
        while id != ROOT {
            match windows.get(&id) {
                Some(w) if w.mapped => id = w.parent,
                _ => return false,
            }
        }
        true
    }

    fn flush(&self) -> Result<()> {
        self.flushes.set(self.flushes.get() + 1);
        Ok(())
    }
}

/// Browser double that records every callback
#[derive(Default)]
pub struct RecordingBrowser {
    pub allow_close: Cell<bool>,
    pub close_requests: Cell<usize>,
    pub destroyed: Cell<usize>,
    pub move_resize: Cell<usize>,
    pub focus_calls: RefCell<Vec<bool>>,
}

impl RecordingBrowser {
    pub fn allowing_close() -> Arc<Self> {
        let browser = Self::default();
        browser.allow_close.set(true);
        Arc::new(browser)
    }

    pub fn vetoing_close() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl BrowserHost for RecordingBrowser {
    fn try_close_browser(&self) -> bool {
        self.close_requests.set(self.close_requests.get() + 1);
        self.allow_close.get()
    }

    fn window_destroyed(&self) {
        self.destroyed.set(self.destroyed.get() + 1);
    }

    fn notify_move_or_resize_started(&self) {
        self.move_resize.set(self.move_resize.get() + 1);
    }

    fn set_focus(&self, focus: bool) {
        self.focus_calls.borrow_mut().push(focus);
    }
}

/// Toolkit host double that remembers the last screen bounds
#[derive(Default)]
pub struct RecordingToolkitHost {
    pub screen_bounds: RefCell<Option<Rect>>,
}

impl ToolkitHost for RecordingToolkitHost {
    fn set_screen_bounds(&self, bounds: Rect) {
        *self.screen_bounds.borrow_mut() = Some(bounds);
    }
}

/// Lookup double backed by a window-to-host map
#[derive(Default)]
pub struct FakeHostLookup {
    pub hosts: HashMap<Window, Arc<RecordingToolkitHost>>,
}

impl HostLookup for FakeHostLookup {
    fn host_for_window(&self, window: Window) -> Option<Arc<dyn ToolkitHost>> {
        self.hosts
            .get(&window)
            .map(|host| host.clone() as Arc<dyn ToolkitHost>)
    }
}
