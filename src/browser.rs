//! Collaborators on the browser side of the host window.
//!
//! The host window never owns the browser: it keeps a `Weak` back-reference
//! and only calls into it to ask for permission or report what happened.

use std::sync::{Arc, Weak};

use x11rb::protocol::xproto::Window;

use crate::shared::Rect;

/// Lifecycle owner of a hosted browser
pub trait BrowserHost {
    /// Veto hook for a window-manager close request
    fn try_close_browser(&self) -> bool;

    /// The native window is gone. Called at most once per window.
    fn window_destroyed(&self);

    /// The host was moved or resized; transient popups should be dismissed
    fn notify_move_or_resize_started(&self);

    fn set_focus(&self, focus: bool);
}

/// Toolkit-side object hosting the embedded child window
pub trait ToolkitHost {
    /// Cache the child's bounds in root coordinates
    fn set_screen_bounds(&self, bounds: Rect);
}

/// Resolves the toolkit host for a child window id
pub trait HostLookup {
    fn host_for_window(&self, window: Window) -> Option<Arc<dyn ToolkitHost>>;
}

/// Non-owning handle to the browser that owns a window
#[derive(Clone, Default)]
pub struct BrowserRef(Option<Weak<dyn BrowserHost>>);

impl BrowserRef {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(browser: &Arc<dyn BrowserHost>) -> Self {
        Self(Some(Arc::downgrade(browser)))
    }

    /// The browser, if one was attached and is still alive
    pub fn get(&self) -> Option<Arc<dyn BrowserHost>> {
        self.0.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        self.get().is_some()
    }
}

impl std::fmt::Debug for BrowserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BrowserRef")
            .field(&self.is_attached())
            .finish()
    }
}
