//! Display Module
//!
//! The windowing-system primitives the host window is built on. Windows and
//! the dispatcher only ever talk to a `WindowSystem`, so the X server
//! connection is an explicit dependency rather than a process-wide handle.

use std::sync::Arc;

use tracing::{debug, error, info};
use x11rb::connection::Connection;
use x11rb::properties::{WmSizeHints, WmSizeHintsSpecification};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

use crate::error::{Result, WindowError};
use crate::shared::{Point, Rect};
use crate::x11::atoms::Atoms;

/// Result of a tree query: the window's root, parent and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeInfo {
    pub root: Window,
    pub parent: Window,
    pub children: Vec<Window>,
}

/// Windowing-system operations used by the host window.
///
/// Queries that can fail transiently (window gone, bad match) return
/// `Option` or `bool` instead of an error; callers treat a failed query as
/// "nothing to do".
pub trait WindowSystem {
    fn root(&self) -> Window;

    fn atoms(&self) -> &Atoms;

    fn create_window(&self, parent: Window, bounds: Rect) -> Result<Window>;

    fn destroy_window(&self, window: Window) -> Result<()>;

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()>;

    fn map_window(&self, window: Window) -> Result<()>;

    /// Unmap and tell the window manager the window is withdrawn (ICCCM 4.1.4)
    fn withdraw_window(&self, window: Window) -> Result<()>;

    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()>;

    /// Program-specified position with static gravity in WM_NORMAL_HINTS
    fn set_position_hints(&self, window: Window, x: i32, y: i32) -> Result<()>;

    fn get_property32(&self, window: Window, property: Atom, type_: Atom) -> Option<Vec<u32>>;

    fn change_property32(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> Result<()>;

    fn change_property8(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u8],
    ) -> Result<()>;

    fn send_event(
        &self,
        destination: Window,
        mask: EventMask,
        message: &ClientMessageEvent,
    ) -> Result<()>;

    /// Window holding keyboard focus, `None` if nothing does or the query failed
    fn input_focus(&self) -> Option<Window>;

    fn set_input_focus(&self, window: Window) -> Result<()>;

    fn translate_to_root(&self, window: Window, x: i16, y: i16) -> Option<Point>;

    fn query_tree(&self, window: Window) -> Option<TreeInfo>;

    fn is_viewable(&self, window: Window) -> bool;

    fn flush(&self) -> Result<()>;
}

/// x11rb-backed window system for one screen
pub struct X11Display {
    conn: Arc<RustConnection>,
    screen_num: usize,
    root: Window,
    atoms: Atoms,
}

impl X11Display {
    /// Connect to the X server named by `display_name` (or `$DISPLAY`)
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display_name)?;
        Self::new(Arc::new(conn), screen_num)
    }

    pub fn new(conn: Arc<RustConnection>, screen_num: usize) -> Result<Self> {
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or(WindowError::NoScreen(screen_num))?
            .root;
        let atoms = Atoms::new(conn.as_ref())?;
        info!("Connected to X server, screen {}, root window 0x{:x}", screen_num, root);

        Ok(Self {
            conn,
            screen_num,
            root,
            atoms,
        })
    }

    pub fn connection(&self) -> &Arc<RustConnection> {
        &self.conn
    }

    pub fn screen_num(&self) -> usize {
        self.screen_num
    }
}

/// Clamp bounds to the CreateWindow field widths. X rejects zero-sized windows.
fn wire_geometry(bounds: Rect) -> (i16, i16, u16, u16) {
    (
        bounds.x.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        bounds.y.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        bounds.width.clamp(1, u16::MAX as u32) as u16,
        bounds.height.clamp(1, u16::MAX as u32) as u16,
    )
}

impl WindowSystem for X11Display {
    fn root(&self) -> Window {
        self.root
    }

    fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    fn create_window(&self, parent: Window, bounds: Rect) -> Result<Window> {
        let window = self.conn.generate_id()?;
        let aux = CreateWindowAux::new()
            .background_pixmap(NONE)
            .override_redirect(0);
        let (x, y, width, height) = wire_geometry(bounds);

        self.conn
            .create_window(
                COPY_DEPTH_FROM_PARENT,
                window,
                parent,
                x,
                y,
                width,
                height,
                0,
                WindowClass::INPUT_OUTPUT,
                COPY_FROM_PARENT,
                &aux,
            )?
            .check()
            .map_err(|e| {
                error!("CreateWindow under 0x{:x} failed: {}", parent, e);
                WindowError::CreateFailed { parent }
            })?;

        debug!("Created window 0x{:x} under 0x{:x}", window, parent);
        Ok(window)
    }

    fn destroy_window(&self, window: Window) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(mask),
        )?;
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn withdraw_window(&self, window: Window) -> Result<()> {
        self.conn.unmap_window(window)?;
        let event = UnmapNotifyEvent {
            response_type: UNMAP_NOTIFY_EVENT,
            sequence: 0,
            event: self.root,
            window,
            from_configure: false,
        };
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }

    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        self.conn.configure_window(window, changes)?;
        Ok(())
    }

    fn set_position_hints(&self, window: Window, x: i32, y: i32) -> Result<()> {
        let mut hints = WmSizeHints::new();
        hints.position = Some((WmSizeHintsSpecification::ProgramSpecified, x, y));
        hints.win_gravity = Some(Gravity::STATIC);
        hints.set_normal_hints(self.conn.as_ref(), window)?;
        Ok(())
    }

    fn get_property32(&self, window: Window, property: Atom, type_: Atom) -> Option<Vec<u32>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX)
            .ok()?
            .reply()
            .map_err(|e| debug!("GetProperty {} on 0x{:x} failed: {}", property, window, e))
            .ok()?;
        reply.value32().map(|values| values.collect())
    }

    fn change_property32(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> Result<()> {
        self.conn
            .change_property32(PropMode::REPLACE, window, property, type_, data)?;
        Ok(())
    }

    fn change_property8(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u8],
    ) -> Result<()> {
        self.conn
            .change_property8(PropMode::REPLACE, window, property, type_, data)?;
        Ok(())
    }

    fn send_event(
        &self,
        destination: Window,
        mask: EventMask,
        message: &ClientMessageEvent,
    ) -> Result<()> {
        self.conn.send_event(false, destination, mask, message)?;
        Ok(())
    }

    fn input_focus(&self) -> Option<Window> {
        let reply = self.conn.get_input_focus().ok()?.reply().ok()?;
        (reply.focus != NONE).then_some(reply.focus)
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::PARENT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn translate_to_root(&self, window: Window, x: i16, y: i16) -> Option<Point> {
        let reply = self
            .conn
            .translate_coordinates(window, self.root, x, y)
            .ok()?
            .reply()
            .map_err(|e| debug!("TranslateCoordinates on 0x{:x} failed: {}", window, e))
            .ok()?;
        Some(Point::new(reply.dst_x as i32, reply.dst_y as i32))
    }

    fn query_tree(&self, window: Window) -> Option<TreeInfo> {
        let reply = self.conn.query_tree(window).ok()?.reply().ok()?;
        Some(TreeInfo {
            root: reply.root,
            parent: reply.parent,
            children: reply.children,
        })
    }

    fn is_viewable(&self, window: Window) -> bool {
        self.conn
            .get_window_attributes(window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .is_some_and(|attrs| attrs.map_state == MapState::VIEWABLE)
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}
