//! Input Module
//!
//! Translates the embedder's key and mouse events into the web input
//! events the browser consumes. Position in screen coordinates and the
//! event timestamp are supplied by the caller, which owns the host window.

pub mod keycodes;

use std::time::Duration;

use bitflags::bitflags;
use tracing::debug;

use crate::shared::Point;
use keycodes::{
    dom_code_for_native_keycode, dom_key_for_keysym, keysym_for_windows_key_code,
    unicode_for_keysym, DomKey,
};

/// Scroll distance of one GTK wheel tick
pub const DEFAULT_WHEEL_PIXELS_PER_TICK: f64 = 40.0;

bitflags! {
    /// Modifier and button state reported by the embedder
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u32 {
        const CAPS_LOCK_ON        = 1 << 0;
        const SHIFT_DOWN          = 1 << 1;
        const CONTROL_DOWN        = 1 << 2;
        const ALT_DOWN            = 1 << 3;
        const LEFT_MOUSE_BUTTON   = 1 << 4;
        const MIDDLE_MOUSE_BUTTON = 1 << 5;
        const RIGHT_MOUSE_BUTTON  = 1 << 6;
        const COMMAND_DOWN        = 1 << 7;
        const NUM_LOCK_ON         = 1 << 8;
        const IS_KEY_PAD          = 1 << 9;
        const IS_LEFT             = 1 << 10;
        const IS_RIGHT            = 1 << 11;
        const ALTGR_DOWN          = 1 << 12;
    }
}

bitflags! {
    /// Modifier bits of a web input event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WebModifiers: u32 {
        const SHIFT               = 1 << 0;
        const CONTROL             = 1 << 1;
        const ALT                 = 1 << 2;
        const META                = 1 << 3;
        const IS_KEY_PAD          = 1 << 4;
        const IS_AUTO_REPEAT      = 1 << 5;
        const LEFT_BUTTON_DOWN    = 1 << 6;
        const MIDDLE_BUTTON_DOWN  = 1 << 7;
        const RIGHT_BUTTON_DOWN   = 1 << 8;
        const CAPS_LOCK_ON        = 1 << 9;
        const NUM_LOCK_ON         = 1 << 10;
        const IS_LEFT             = 1 << 11;
        const IS_RIGHT            = 1 << 12;
        const ALTGR               = 1 << 15;
    }
}

const MODIFIER_MAP: [(EventFlags, WebModifiers); 13] = [
    (EventFlags::SHIFT_DOWN, WebModifiers::SHIFT),
    (EventFlags::CONTROL_DOWN, WebModifiers::CONTROL),
    (EventFlags::ALT_DOWN, WebModifiers::ALT),
    (EventFlags::COMMAND_DOWN, WebModifiers::META),
    (EventFlags::IS_KEY_PAD, WebModifiers::IS_KEY_PAD),
    (EventFlags::LEFT_MOUSE_BUTTON, WebModifiers::LEFT_BUTTON_DOWN),
    (EventFlags::MIDDLE_MOUSE_BUTTON, WebModifiers::MIDDLE_BUTTON_DOWN),
    (EventFlags::RIGHT_MOUSE_BUTTON, WebModifiers::RIGHT_BUTTON_DOWN),
    (EventFlags::CAPS_LOCK_ON, WebModifiers::CAPS_LOCK_ON),
    (EventFlags::NUM_LOCK_ON, WebModifiers::NUM_LOCK_ON),
    (EventFlags::IS_LEFT, WebModifiers::IS_LEFT),
    (EventFlags::IS_RIGHT, WebModifiers::IS_RIGHT),
    (EventFlags::ALTGR_DOWN, WebModifiers::ALTGR),
];

pub fn translate_modifiers(flags: EventFlags) -> WebModifiers {
    MODIFIER_MAP
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .fold(WebModifiers::empty(), |acc, (_, modifier)| acc | *modifier)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    RawKeyDown,
    KeyDown,
    KeyUp,
    Char,
}

/// Keyboard event as reported by the embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventType,
    pub modifiers: EventFlags,
    pub windows_key_code: i32,
    /// X keycode of the physical key
    pub native_key_code: i32,
    pub is_system_key: bool,
    pub character: u16,
    pub unmodified_character: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonType {
    Left,
    Middle,
    Right,
}

/// Mouse event as reported by the embedder, in view coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
    pub modifiers: EventFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebInputType {
    RawKeyDown,
    KeyUp,
    Char,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseLeave,
    MouseWheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebMouseButton {
    #[default]
    NoButton,
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerType {
    #[default]
    Mouse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebKeyboardEvent {
    pub kind: WebInputType,
    pub modifiers: WebModifiers,
    pub windows_key_code: i32,
    pub native_key_code: i32,
    pub is_system_key: bool,
    pub dom_code: Option<&'static str>,
    pub dom_key: DomKey,
    pub text: [u16; 4],
    pub unmodified_text: [u16; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebMouseEvent {
    pub kind: WebInputType,
    pub button: WebMouseButton,
    pub position_in_widget: Point,
    pub position_in_screen: Point,
    pub modifiers: WebModifiers,
    pub click_count: i32,
    /// Time since boot
    pub timestamp: Duration,
    pub pointer_type: PointerType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebMouseWheelEvent {
    pub mouse: WebMouseEvent,
    pub delta_x: f32,
    pub delta_y: f32,
    pub wheel_ticks_x: f32,
    pub wheel_ticks_y: f32,
    pub has_precise_scrolling_deltas: bool,
}

pub fn translate_key_event(event: &KeyEvent) -> WebKeyboardEvent {
    let kind = match event.kind {
        KeyEventType::RawKeyDown | KeyEventType::KeyDown => WebInputType::RawKeyDown,
        KeyEventType::KeyUp => WebInputType::KeyUp,
        KeyEventType::Char => WebInputType::Char,
    };

    let keysym = keysym_for_windows_key_code(
        event.windows_key_code,
        event.modifiers.contains(EventFlags::SHIFT_DOWN),
    );
    let character = unicode_for_keysym(keysym);

    let mut text = [0u16; 4];
    let mut unmodified_text = [0u16; 4];
    text[0] = event.character;
    unmodified_text[0] = event.unmodified_character;

    WebKeyboardEvent {
        kind,
        modifiers: translate_modifiers(event.modifiers),
        windows_key_code: event.windows_key_code,
        native_key_code: event.native_key_code,
        is_system_key: event.is_system_key,
        dom_code: dom_code_for_native_keycode(event.native_key_code),
        dom_key: dom_key_for_keysym(keysym, character),
        text,
        unmodified_text,
    }
}

/// Fields shared by every mouse event
fn mouse_event_base(event: &MouseEvent, screen: Point, timestamp: Duration) -> WebMouseEvent {
    WebMouseEvent {
        kind: WebInputType::MouseMove,
        button: WebMouseButton::NoButton,
        position_in_widget: Point::new(event.x, event.y),
        position_in_screen: screen,
        modifiers: translate_modifiers(event.modifiers),
        click_count: 0,
        timestamp,
        pointer_type: PointerType::Mouse,
    }
}

/// Held button for move and wheel events; left wins over middle over right
fn held_button(flags: EventFlags) -> WebMouseButton {
    if flags.contains(EventFlags::LEFT_MOUSE_BUTTON) {
        WebMouseButton::Left
    } else if flags.contains(EventFlags::MIDDLE_MOUSE_BUTTON) {
        WebMouseButton::Middle
    } else if flags.contains(EventFlags::RIGHT_MOUSE_BUTTON) {
        WebMouseButton::Right
    } else {
        WebMouseButton::NoButton
    }
}

pub fn translate_click_event(
    event: &MouseEvent,
    screen: Point,
    timestamp: Duration,
    button: MouseButtonType,
    mouse_up: bool,
    click_count: i32,
) -> WebMouseEvent {
    let mut result = mouse_event_base(event, screen, timestamp);
    result.kind = if mouse_up {
        WebInputType::MouseUp
    } else {
        WebInputType::MouseDown
    };
    result.button = match button {
        MouseButtonType::Left => WebMouseButton::Left,
        MouseButtonType::Middle => WebMouseButton::Middle,
        MouseButtonType::Right => WebMouseButton::Right,
    };
    result.click_count = click_count;
    result
}

pub fn translate_move_event(
    event: &MouseEvent,
    screen: Point,
    timestamp: Duration,
    mouse_leave: bool,
) -> WebMouseEvent {
    let mut result = mouse_event_base(event, screen, timestamp);
    if mouse_leave {
        result.kind = WebInputType::MouseLeave;
    } else {
        result.kind = WebInputType::MouseMove;
        result.button = held_button(event.modifiers);
    }
    result
}

pub fn translate_wheel_event(
    event: &MouseEvent,
    screen: Point,
    timestamp: Duration,
    delta_x: i32,
    delta_y: i32,
    pixels_per_tick: f64,
) -> WebMouseWheelEvent {
    let mut mouse = mouse_event_base(event, screen, timestamp);
    mouse.kind = WebInputType::MouseWheel;
    mouse.button = held_button(event.modifiers);

    let pixels_per_tick = if pixels_per_tick > 0.0 {
        pixels_per_tick
    } else {
        debug!("Invalid wheel tick size {}, using default", pixels_per_tick);
        DEFAULT_WHEEL_PIXELS_PER_TICK
    };

    WebMouseWheelEvent {
        mouse,
        delta_x: delta_x as f32,
        delta_y: delta_y as f32,
        wheel_ticks_x: (delta_x as f64 / pixels_per_tick) as f32,
        wheel_ticks_y: (delta_y as f64 / pixels_per_tick) as f32,
        has_precise_scrolling_deltas: true,
    }
}

/// Time since boot, the clock web input timestamps are measured on
pub fn event_timestamp() -> Duration {
    use nix::time::{clock_gettime, ClockId};

    match clock_gettime(ClockId::CLOCK_BOOTTIME) {
        Ok(now) => Duration::new(now.tv_sec() as u64, now.tv_nsec() as u32),
        Err(e) => {
            debug!("CLOCK_BOOTTIME unavailable: {}", e);
            Duration::ZERO
        }
    }
}
