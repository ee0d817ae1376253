//! Native host window.
//!
//! Owns one top-level (or embedded) X window that hosts the toolkit's child
//! window tree. Geometry and mapping requests go straight to the window
//! system; close requests go through the window manager protocol so the
//! dispatcher can ask the browser first.

use std::sync::Arc;

use tracing::{debug, info, warn};
use x11rb::protocol::xproto::{ClientMessageEvent, ConfigureWindowAux, EventMask, Window};
use x11rb::{CURRENT_TIME, NONE};

use crate::browser::{BrowserRef, HostLookup, ToolkitHost};
use crate::error::Result;
use crate::shared::Rect;
use crate::x11::display::WindowSystem;
use crate::x11::tree::{find_child, find_toplevel_parent, is_parent_of_child_window};

/// A native window hosting an embedded browser view
pub struct NativeWindow<D: WindowSystem> {
    ws: Arc<D>,
    browser: BrowserRef,
    /// `NONE` once destroyed
    xwindow: Window,
    parent: Window,
    bounds: Rect,
    mapped: bool,
    /// Focus owner before we took focus; a back-reference only
    previously_focused: Option<Window>,
}

impl<D: WindowSystem> NativeWindow<D> {
    /// Create the native window under `parent` (the root when `NONE`).
    ///
    /// There is no fallback when the window cannot be created; the error is
    /// meant to end whatever was trying to host a browser.
    pub fn create(
        ws: Arc<D>,
        browser: BrowserRef,
        parent: Window,
        bounds: Rect,
        name: &str,
    ) -> Result<Self> {
        let parent = if parent == NONE { ws.root() } else { parent };
        let xwindow = ws.create_window(parent, bounds)?;
        if let Err(e) = init_window(&*ws, xwindow, name) {
            // Nothing owns the window yet, so nothing else would destroy it
            if let Err(destroy) = ws.destroy_window(xwindow) {
                warn!("Failed to destroy half-created window 0x{:x}: {}", xwindow, destroy);
            }
            return Err(e);
        }

        info!(
            "Created host window 0x{:x} under 0x{:x} at {:?}",
            xwindow, parent, bounds
        );

        Ok(Self {
            ws,
            browser,
            xwindow,
            parent,
            bounds,
            mapped: false,
            previously_focused: None,
        })
    }

    pub fn xwindow(&self) -> Window {
        self.xwindow
    }

    pub fn parent(&self) -> Window {
        self.parent
    }

    /// Last bounds reported by the window system, relative to the parent
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// False once the window has been destroyed
    pub fn is_live(&self) -> bool {
        self.xwindow != NONE
    }

    pub fn browser(&self) -> &BrowserRef {
        &self.browser
    }

    pub fn previously_focused(&self) -> Option<Window> {
        self.previously_focused
    }

    pub(crate) fn window_system(&self) -> &Arc<D> {
        &self.ws
    }

    pub(crate) fn set_cached_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    /// The toolkit child, only looked up when a browser is attached
    pub(crate) fn embedded_child(&self) -> Option<Window> {
        if !self.is_live() || !self.browser.is_attached() {
            return None;
        }
        find_child(self.ws.as_ref(), self.xwindow)
    }

    /// Map the window. Only the first call does anything.
    pub fn show(&mut self) -> Result<()> {
        if !self.is_live() || self.mapped {
            return Ok(());
        }

        // Without a position hint some window managers ignore our placement
        self.ws
            .set_position_hints(self.xwindow, self.bounds.x, self.bounds.y)?;
        self.ws.map_window(self.xwindow)?;
        self.ws.flush()?;
        self.mapped = true;
        debug!("Mapped host window 0x{:x}", self.xwindow);

        self.install_drag_drop_proxy()
    }

    /// Route XDND traffic aimed at the top-level to the embedded child
    fn install_drag_drop_proxy(&self) -> Result<()> {
        let Some(child) = find_child(self.ws.as_ref(), self.xwindow) else {
            return Ok(());
        };
        let toplevel = find_toplevel_parent(self.ws.as_ref(), self.xwindow);
        let atoms = self.ws.atoms();

        let current = self
            .ws
            .get_property32(toplevel, atoms.xdnd_proxy, atoms.window)
            .and_then(|values| values.first().copied());
        if current == Some(child) {
            return Ok(());
        }

        // XDND requires the proxy to point at itself as well
        self.ws
            .change_property32(toplevel, atoms.xdnd_proxy, atoms.window, &[child])?;
        self.ws
            .change_property32(child, atoms.xdnd_proxy, atoms.window, &[child])?;
        debug!("XdndProxy on 0x{:x} now targets 0x{:x}", toplevel, child);
        Ok(())
    }

    pub fn hide(&mut self) -> Result<()> {
        if !self.is_live() || !self.mapped {
            return Ok(());
        }
        self.ws.withdraw_window(self.xwindow)?;
        self.mapped = false;
        debug!("Withdrew host window 0x{:x}", self.xwindow);
        Ok(())
    }

    /// Ask for a close the same way the window manager would.
    ///
    /// The actual destroy happens when the dispatcher sees the message and
    /// the browser agrees.
    pub fn close(&self) -> Result<()> {
        if !self.is_live() {
            return Ok(());
        }
        let atoms = self.ws.atoms();
        let message = ClientMessageEvent::new(
            32,
            self.xwindow,
            atoms.wm_protocols,
            [atoms.wm_delete_window, CURRENT_TIME, 0, 0, 0],
        );
        self.ws
            .send_event(self.xwindow, EventMask::NO_EVENT, &message)?;
        self.ws.flush()?;
        debug!("Requested close of host window 0x{:x}", self.xwindow);
        Ok(())
    }

    /// Request new geometry, touching only the parts that changed
    pub fn set_bounds(&mut self, bounds: Rect) -> Result<()> {
        if !self.is_live() {
            return Ok(());
        }

        let mut changes = ConfigureWindowAux::new();
        let mut changed = false;
        if self.bounds.size() != bounds.size() {
            changes = changes.width(bounds.width).height(bounds.height);
            changed = true;
        }
        if self.bounds.origin() != bounds.origin() {
            changes = changes.x(bounds.x).y(bounds.y);
            changed = true;
        }

        if changed {
            self.ws.configure_window(self.xwindow, &changes)?;
        }
        Ok(())
    }

    /// Bounds in root coordinates, or an empty rect if the window is gone
    pub fn bounds_in_screen(&self) -> Rect {
        if !self.is_live() {
            return Rect::default();
        }
        self.ws
            .translate_to_root(self.xwindow, 0, 0)
            .map(|origin| Rect::from_parts(origin, self.bounds.size()))
            .unwrap_or_default()
    }

    /// Give keyboard focus to the embedded child (or to this window when
    /// there is no usable child), remembering who had it before.
    pub fn focus(&mut self) -> Result<()> {
        if !self.is_live() || !self.mapped {
            return Ok(());
        }

        let focused = self.ws.input_focus();
        let target = match self.embedded_child() {
            Some(child) if focused == Some(child) => return Ok(()),
            Some(child) if self.ws.is_viewable(child) => child,
            _ if focused == Some(self.xwindow) => return Ok(()),
            _ => self.xwindow,
        };

        self.ws.set_input_focus(target)?;
        if focused != Some(self.xwindow) {
            self.previously_focused = focused;
        }
        debug!(
            "Focused 0x{:x}, previous focus {:?}",
            target, self.previously_focused
        );
        Ok(())
    }

    /// Hand keyboard focus back to whoever had it before `focus`
    pub fn unfocus(&mut self) -> Result<()> {
        if !self.is_live() || !self.mapped {
            return Ok(());
        }
        let Some(focused) = self.ws.input_focus() else {
            return Ok(());
        };

        let ws = self.ws.as_ref();
        let toplevel = find_toplevel_parent(ws, self.xwindow);
        // Nothing above us to give focus back to
        if toplevel == self.xwindow {
            return Ok(());
        }

        let child = self.embedded_child();
        if focused != self.xwindow && Some(focused) != child {
            return Ok(());
        }

        // Toolkits may focus a dedicated window inside the top-level
        let target = self
            .previously_focused
            .filter(|&previous| is_parent_of_child_window(ws, toplevel, previous))
            .unwrap_or(toplevel);
        ws.set_input_focus(target)?;
        debug!("Returned focus to 0x{:x}", target);
        Ok(())
    }

    /// Toolkit host object for the embedded child
    pub fn host(&self, lookup: &dyn HostLookup) -> Option<Arc<dyn ToolkitHost>> {
        let child = self.embedded_child()?;
        lookup.host_for_window(child)
    }

    /// Whether the top-level ancestor asked to be kept above other windows
    pub fn top_level_always_on_top(&self) -> bool {
        if !self.is_live() {
            return false;
        }
        let ws = self.ws.as_ref();
        let atoms = ws.atoms();
        let toplevel = find_toplevel_parent(ws, self.xwindow);
        ws.get_property32(toplevel, atoms.net_wm_state, atoms.atom)
            .is_some_and(|state| state.contains(&atoms.net_wm_state_above))
    }

    /// Destroy the native window. Only the dispatcher calls this.
    pub(crate) fn destroy(&mut self) -> Result<()> {
        if !self.is_live() {
            return Ok(());
        }
        let xwindow = self.xwindow;
        self.xwindow = NONE;
        self.mapped = false;
        self.previously_focused = None;
        self.ws.destroy_window(xwindow)?;
        self.ws.flush()?;
        info!("Destroyed host window 0x{:x}", xwindow);
        Ok(())
    }
}

impl<D: WindowSystem> std::fmt::Debug for NativeWindow<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeWindow")
            .field("xwindow", &self.xwindow)
            .field("parent", &self.parent)
            .field("bounds", &self.bounds)
            .field("mapped", &self.mapped)
            .field("previously_focused", &self.previously_focused)
            .field("browser", &self.browser)
            .finish()
    }
}

/// Select events and write the identification properties of a fresh window
fn init_window<D: WindowSystem>(ws: &D, xwindow: Window, name: &str) -> Result<()> {
    ws.select_input(
        xwindow,
        EventMask::FOCUS_CHANGE | EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE,
    )?;
    ws.flush()?;

    let atoms = ws.atoms();
    ws.change_property32(
        xwindow,
        atoms.wm_protocols,
        atoms.atom,
        &[atoms.wm_delete_window, atoms.net_wm_ping],
    )?;

    // Desktop environments expect WM_CLIENT_MACHINE next to _NET_WM_PID
    match nix::unistd::gethostname() {
        Ok(host) => {
            let host = host.to_string_lossy();
            ws.change_property8(
                xwindow,
                atoms.wm_client_machine,
                atoms.string,
                host.as_bytes(),
            )?;
        }
        Err(e) => warn!("Failed to read hostname for WM_CLIENT_MACHINE: {}", e),
    }

    if !name.is_empty() {
        ws.change_property8(xwindow, atoms.wm_name, atoms.string, name.as_bytes())?;
        ws.change_property8(xwindow, atoms.net_wm_name, atoms.utf8_string, name.as_bytes())?;
    }

    // Lets the window manager find (and kill) a hung owner
    ws.change_property32(xwindow, atoms.net_wm_pid, atoms.cardinal, &[std::process::id()])?;
    Ok(())
}
