//! Window tree helpers.
//!
//! The embedded toolkit creates exactly one child inside the host window,
//! and the host itself may be reparented several levels deep by the
//! embedding application.

use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::x11::display::WindowSystem;

/// The host's single embedded child, if any
pub fn find_child<W: WindowSystem + ?Sized>(ws: &W, window: Window) -> Option<Window> {
    let tree = ws.query_tree(window)?;
    if tree.children.len() > 1 {
        debug!(
            "Window 0x{:x} has {} children, using the first",
            window,
            tree.children.len()
        );
    }
    tree.children.first().copied()
}

/// The ancestor of `window` whose parent is the root (possibly `window` itself)
pub fn find_toplevel_parent<W: WindowSystem + ?Sized>(ws: &W, window: Window) -> Window {
    let mut current = window;
    let mut top_level = window;
    while let Some(tree) = ws.query_tree(current) {
        top_level = current;
        if tree.parent == tree.root {
            break;
        }
        current = tree.parent;
    }
    top_level
}

/// Whether `parent` is a strict ancestor of `child`
pub fn is_parent_of_child_window<W: WindowSystem + ?Sized>(
    ws: &W,
    parent: Window,
    child: Window,
) -> bool {
    if parent == child {
        return false;
    }
    let mut current = child;
    while let Some(tree) = ws.query_tree(current) {
        if tree.parent == tree.root {
            return tree.parent == parent;
        }
        if tree.parent == parent {
            return true;
        }
        current = tree.parent;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDisplay;

    // root(1) -> shell(10) -> host(20) -> child(30)
    fn nested() -> FakeDisplay {
        let ws = FakeDisplay::new();
        ws.add_window(10, 1);
        ws.add_window(20, 10);
        ws.add_window(30, 20);
        ws
    }

    #[test]
    fn test_find_child() {
        let ws = nested();
        assert_eq!(find_child(&ws, 20), Some(30));
        assert_eq!(find_child(&ws, 30), None);
        assert_eq!(find_child(&ws, 999), None);
    }

    #[test]
    fn test_find_toplevel_parent() {
        let ws = nested();
        assert_eq!(find_toplevel_parent(&ws, 30), 10);
        assert_eq!(find_toplevel_parent(&ws, 10), 10);
        // Unknown windows resolve to themselves
        assert_eq!(find_toplevel_parent(&ws, 999), 999);
    }

    #[test]
    fn test_is_parent_of_child_window() {
        let ws = nested();
        assert!(is_parent_of_child_window(&ws, 10, 30));
        assert!(is_parent_of_child_window(&ws, 20, 30));
        assert!(!is_parent_of_child_window(&ws, 30, 30));
        assert!(!is_parent_of_child_window(&ws, 30, 10));

        ws.add_window(40, 1);
        assert!(!is_parent_of_child_window(&ws, 10, 40));
    }
}
