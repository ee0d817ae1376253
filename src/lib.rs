//! embedwin
//!
//! X11 host windows for embedded browser views: window creation and
//! geometry, window-manager protocol handling (close with veto, ping),
//! focus hand-off between the host and the toolkit child, and translation
//! of embedder input into web input events.

pub mod browser;
pub mod config;
pub mod delegate;
pub mod dispatch;
pub mod error;
pub mod focus;
pub mod input;
pub mod shared;
pub mod tasks;
pub mod window;
pub mod x11;
pub mod x11_async;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::{BrowserHost, BrowserRef, HostLookup, ToolkitHost};
pub use delegate::{PlatformDelegate, WindowInfo};
pub use dispatch::{EventResult, WindowRegistry};
pub use error::{Result, WindowError};
pub use window::NativeWindow;
pub use x11::{PlatformEvent, WindowSystem, X11Display};
