//! X11 plumbing: atoms, the window-system seam, tree queries and events.

pub mod atoms;
pub mod display;
pub mod event;
pub mod tree;

pub use atoms::Atoms;
pub use display::{TreeInfo, WindowSystem, X11Display};
pub use event::PlatformEvent;
