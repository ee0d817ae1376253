//! Types shared across the window, dispatcher and delegate.

pub mod geometry;

pub use geometry::{Point, Rect, Size};
