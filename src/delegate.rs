//! Platform Delegate
//!
//! Browser-facing facade over one host window: creates it from a
//! `WindowInfo`, forwards focus/close/resize requests and translates input
//! relative to the window's screen position.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info, warn};
use x11rb::protocol::xproto::Window;
use x11rb::NONE;

use crate::browser::{BrowserRef, HostLookup};
use crate::config::Config;
use crate::dispatch::WindowRegistry;
use crate::error::Result;
use crate::input::{
    self, KeyEvent, MouseButtonType, MouseEvent, WebKeyboardEvent, WebMouseEvent,
    WebMouseWheelEvent,
};
use crate::shared::{Point, Rect, Size};
use crate::x11::display::WindowSystem;

/// Where and how to create the host window
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowInfo {
    pub x: i32,
    pub y: i32,
    /// 0 selects the configured default
    pub width: u32,
    /// 0 selects the configured default
    pub height: u32,
    /// `NONE` for a top-level window
    pub parent_window: Window,
    pub window_name: String,
}

impl WindowInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            x: config.window.x,
            y: config.window.y,
            width: 0,
            height: 0,
            parent_window: config.window.parent_window.unwrap_or(NONE),
            window_name: config.window.name.clone(),
        }
    }
}

pub struct PlatformDelegate {
    window_info: WindowInfo,
    default_size: Size,
    wheel_pixels_per_tick: f64,
    window: Option<Window>,
    always_on_top: bool,
}

impl PlatformDelegate {
    pub fn new(window_info: WindowInfo, config: &Config) -> Self {
        Self {
            window_info,
            default_size: Size::new(config.window.default_width, config.window.default_height),
            wheel_pixels_per_tick: config.input.wheel_pixels_per_tick,
            window: None,
            always_on_top: false,
        }
    }

    /// Create and show the host window for `browser`
    pub fn create_host_window<D: WindowSystem>(
        &mut self,
        registry: &mut WindowRegistry<D>,
        browser: BrowserRef,
    ) -> Result<Window> {
        if self.window_info.width == 0 {
            self.window_info.width = self.default_size.width;
        }
        if self.window_info.height == 0 {
            self.window_info.height = self.default_size.height;
        }
        let info = &self.window_info;
        let bounds = Rect::new(info.x, info.y, info.width, info.height);

        let id = registry.create_window(browser, info.parent_window, bounds, &info.window_name)?;
        self.window = Some(id);
        if let Some(window) = registry.window_mut(id) {
            self.always_on_top = window.top_level_always_on_top();
            window.show()?;
        }
        info!(
            "Host window 0x{:x} ready (always on top: {})",
            id, self.always_on_top
        );
        Ok(id)
    }

    /// Native handle of the host window, kept after the window is destroyed
    pub fn host_window_handle(&self) -> Option<Window> {
        self.window
    }

    /// Whether the embedding top-level was kept above others at creation
    pub fn always_on_top(&self) -> bool {
        self.always_on_top
    }

    /// Ask the window to close; the browser can still veto it
    pub fn close_host_window<D: WindowSystem>(&self, registry: &WindowRegistry<D>) -> Result<()> {
        match self.window.and_then(|id| registry.window(id)) {
            Some(window) => window.close(),
            None => Ok(()),
        }
    }

    pub fn send_focus_event<D: WindowSystem>(
        &self,
        registry: &mut WindowRegistry<D>,
        set_focus: bool,
    ) -> Result<()> {
        let Some(window) = self.window.and_then(|id| registry.window_mut(id)) else {
            return Ok(());
        };
        if set_focus {
            window.focus()
        } else {
            window.unfocus()
        }
    }

    /// Push the window's screen bounds to the toolkit so popups land in the
    /// right place
    pub fn notify_move_or_resize_started<D: WindowSystem>(
        &self,
        registry: &WindowRegistry<D>,
        lookup: &dyn HostLookup,
    ) {
        let Some(window) = self.window.and_then(|id| registry.window(id)) else {
            return;
        };
        let Some(host) = window.host(lookup) else {
            debug!("No toolkit host for window 0x{:x}", window.xwindow());
            return;
        };
        host.set_screen_bounds(window.bounds_in_screen());
    }

    /// Resize, keeping the current origin
    pub fn size_to<D: WindowSystem>(
        &self,
        registry: &mut WindowRegistry<D>,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let Some(window) = self.window.and_then(|id| registry.window_mut(id)) else {
            return Ok(());
        };
        let bounds = Rect::from_parts(window.bounds().origin(), Size::new(width, height));
        window.set_bounds(bounds)
    }

    /// Convert a point in view coordinates to screen coordinates
    pub fn screen_point<D: WindowSystem>(&self, registry: &WindowRegistry<D>, view: Point) -> Point {
        // Bounds relative to the parent are not screen coordinates when
        // embedded, so always go through the root translation
        match self.window.and_then(|id| registry.window(id)) {
            Some(window) => view.offset(window.bounds_in_screen().origin()),
            None => view,
        }
    }

    pub fn translate_key_event(&self, event: &KeyEvent) -> WebKeyboardEvent {
        input::translate_key_event(event)
    }

    pub fn translate_click_event<D: WindowSystem>(
        &self,
        registry: &WindowRegistry<D>,
        event: &MouseEvent,
        button: MouseButtonType,
        mouse_up: bool,
        click_count: i32,
    ) -> WebMouseEvent {
        let screen = self.screen_point(registry, Point::new(event.x, event.y));
        input::translate_click_event(
            event,
            screen,
            input::event_timestamp(),
            button,
            mouse_up,
            click_count,
        )
    }

    pub fn translate_move_event<D: WindowSystem>(
        &self,
        registry: &WindowRegistry<D>,
        event: &MouseEvent,
        mouse_leave: bool,
    ) -> WebMouseEvent {
        let screen = self.screen_point(registry, Point::new(event.x, event.y));
        input::translate_move_event(event, screen, input::event_timestamp(), mouse_leave)
    }

    pub fn translate_wheel_event<D: WindowSystem>(
        &self,
        registry: &WindowRegistry<D>,
        event: &MouseEvent,
        delta_x: i32,
        delta_y: i32,
    ) -> WebMouseWheelEvent {
        let screen = self.screen_point(registry, Point::new(event.x, event.y));
        input::translate_wheel_event(
            event,
            screen,
            input::event_timestamp(),
            delta_x,
            delta_y,
            self.wheel_pixels_per_tick,
        )
    }

    /// Show `text` in the desktop's default text viewer
    pub fn view_text(&self, text: &str) {
        let path = match write_view_source(text) {
            Ok(path) => path,
            Err(e) => {
                warn!("Failed to write view-source file: {}", e);
                return;
            }
        };

        match Command::new("xdg-open").arg(&path).spawn() {
            Ok(mut child) => {
                // Reap the opener without blocking the event loop
                std::thread::spawn(move || {
                    if let Err(e) = child.wait() {
                        debug!("xdg-open did not exit cleanly: {}", e);
                    }
                });
                debug!("Opened {:?} with xdg-open", path);
            }
            Err(e) => warn!("Failed to run xdg-open for {:?}: {}", path, e),
        }
    }
}

/// Write `text` to a persistent temp file ending in `.txt`
fn write_view_source(text: &str) -> std::io::Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("embedwin-source-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    let (_, path) = file.keep()?;
    Ok(path)
}
