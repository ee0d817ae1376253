//! Platform events seen by a host window.
//!
//! A narrowed view of `x11rb::protocol::Event`: only the categories the
//! dispatcher acts on get their own variant.

use x11rb::protocol::xproto::{Atom, ClientMessageEvent, Window};
use x11rb::protocol::Event;

#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// ConfigureNotify; `event` is the window the notification was delivered to
    Configure {
        event: Window,
        window: Window,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    ClientMessage(ClientMessageEvent),
    FocusIn { window: Window },
    FocusOut { window: Window },
    Property { window: Window, atom: Atom },
    /// XInput2 device event, keyed by the window inside the cookie payload
    Input { window: Window },
    Other { window: Option<Window> },
}

impl PlatformEvent {
    pub fn from_x11(event: &Event) -> Self {
        match event {
            Event::ConfigureNotify(e) => PlatformEvent::Configure {
                event: e.event,
                window: e.window,
                x: e.x as i32,
                y: e.y as i32,
                width: e.width as u32,
                height: e.height as u32,
            },
            Event::ClientMessage(e) => PlatformEvent::ClientMessage(e.clone()),
            Event::FocusIn(e) => PlatformEvent::FocusIn { window: e.event },
            Event::FocusOut(e) => PlatformEvent::FocusOut { window: e.event },
            Event::PropertyNotify(e) => PlatformEvent::Property {
                window: e.window,
                atom: e.atom,
            },
            // Generic events carry the target in their extension payload
            Event::XinputKeyPress(e) => PlatformEvent::Input { window: e.event },
            Event::XinputKeyRelease(e) => PlatformEvent::Input { window: e.event },
            Event::XinputButtonPress(e) => PlatformEvent::Input { window: e.event },
            Event::XinputButtonRelease(e) => PlatformEvent::Input { window: e.event },
            Event::XinputMotion(e) => PlatformEvent::Input { window: e.event },
            Event::XinputEnter(e) => PlatformEvent::Input { window: e.event },
            Event::XinputLeave(e) => PlatformEvent::Input { window: e.event },
            Event::MapNotify(e) => PlatformEvent::Other { window: Some(e.event) },
            Event::UnmapNotify(e) => PlatformEvent::Other { window: Some(e.event) },
            Event::DestroyNotify(e) => PlatformEvent::Other { window: Some(e.event) },
            Event::ReparentNotify(e) => PlatformEvent::Other { window: Some(e.event) },
            Event::Expose(e) => PlatformEvent::Other { window: Some(e.window) },
            _ => PlatformEvent::Other { window: None },
        }
    }

    /// Window the event is addressed to
    pub fn target(&self) -> Option<Window> {
        match self {
            PlatformEvent::Configure { event, .. } => Some(*event),
            PlatformEvent::ClientMessage(e) => Some(e.window),
            PlatformEvent::FocusIn { window }
            | PlatformEvent::FocusOut { window }
            | PlatformEvent::Property { window, .. }
            | PlatformEvent::Input { window } => Some(*window),
            PlatformEvent::Other { window } => *window,
        }
    }
}
