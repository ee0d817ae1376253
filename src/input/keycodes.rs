//! Key code tables.
//!
//! Three independent mappings are needed to build a keyboard event: the
//! Windows virtual key code the embedder reports, the X keysym it stands
//! for, and the DOM `code`/`key` values web content sees.

/// Windows virtual key codes (the subset embedders send)
pub mod vk {
    pub const BACK: i32 = 0x08;
    pub const TAB: i32 = 0x09;
    pub const RETURN: i32 = 0x0D;
    pub const SHIFT: i32 = 0x10;
    pub const CONTROL: i32 = 0x11;
    pub const MENU: i32 = 0x12;
    pub const PAUSE: i32 = 0x13;
    pub const CAPITAL: i32 = 0x14;
    pub const ESCAPE: i32 = 0x1B;
    pub const SPACE: i32 = 0x20;
    pub const PRIOR: i32 = 0x21;
    pub const NEXT: i32 = 0x22;
    pub const END: i32 = 0x23;
    pub const HOME: i32 = 0x24;
    pub const LEFT: i32 = 0x25;
    pub const UP: i32 = 0x26;
    pub const RIGHT: i32 = 0x27;
    pub const DOWN: i32 = 0x28;
    pub const INSERT: i32 = 0x2D;
    pub const DELETE: i32 = 0x2E;
    pub const KEY_0: i32 = 0x30;
    pub const KEY_9: i32 = 0x39;
    pub const KEY_A: i32 = 0x41;
    pub const KEY_Z: i32 = 0x5A;
    pub const LWIN: i32 = 0x5B;
    pub const RWIN: i32 = 0x5C;
    pub const APPS: i32 = 0x5D;
    pub const NUMPAD0: i32 = 0x60;
    pub const NUMPAD9: i32 = 0x69;
    pub const MULTIPLY: i32 = 0x6A;
    pub const ADD: i32 = 0x6B;
    pub const SUBTRACT: i32 = 0x6D;
    pub const DECIMAL: i32 = 0x6E;
    pub const DIVIDE: i32 = 0x6F;
    pub const F1: i32 = 0x70;
    pub const F24: i32 = 0x87;
    pub const NUMLOCK: i32 = 0x90;
    pub const SCROLL: i32 = 0x91;
    pub const OEM_1: i32 = 0xBA;
    pub const OEM_PLUS: i32 = 0xBB;
    pub const OEM_COMMA: i32 = 0xBC;
    pub const OEM_MINUS: i32 = 0xBD;
    pub const OEM_PERIOD: i32 = 0xBE;
    pub const OEM_2: i32 = 0xBF;
    pub const OEM_3: i32 = 0xC0;
    pub const OEM_4: i32 = 0xDB;
    pub const OEM_5: i32 = 0xDC;
    pub const OEM_6: i32 = 0xDD;
    pub const OEM_7: i32 = 0xDE;
}

/// X keysyms used by the tables below
pub mod xk {
    pub const BACKSPACE: u32 = 0xFF08;
    pub const TAB: u32 = 0xFF09;
    pub const ISO_LEFT_TAB: u32 = 0xFE20;
    pub const RETURN: u32 = 0xFF0D;
    pub const PAUSE: u32 = 0xFF13;
    pub const SCROLL_LOCK: u32 = 0xFF14;
    pub const ESCAPE: u32 = 0xFF1B;
    pub const HOME: u32 = 0xFF50;
    pub const LEFT: u32 = 0xFF51;
    pub const UP: u32 = 0xFF52;
    pub const RIGHT: u32 = 0xFF53;
    pub const DOWN: u32 = 0xFF54;
    pub const PAGE_UP: u32 = 0xFF55;
    pub const PAGE_DOWN: u32 = 0xFF56;
    pub const END: u32 = 0xFF57;
    pub const INSERT: u32 = 0xFF63;
    pub const MENU: u32 = 0xFF67;
    pub const NUM_LOCK: u32 = 0xFF7F;
    pub const KP_SPACE: u32 = 0xFF80;
    pub const KP_ENTER: u32 = 0xFF8D;
    pub const KP_EQUAL: u32 = 0xFFBD;
    pub const KP_MULTIPLY: u32 = 0xFFAA;
    pub const KP_ADD: u32 = 0xFFAB;
    pub const KP_SUBTRACT: u32 = 0xFFAD;
    pub const KP_DECIMAL: u32 = 0xFFAE;
    pub const KP_DIVIDE: u32 = 0xFFAF;
    pub const KP_0: u32 = 0xFFB0;
    pub const KP_9: u32 = 0xFFB9;
    pub const F1: u32 = 0xFFBE;
    pub const F24: u32 = 0xFFD5;
    pub const SHIFT_L: u32 = 0xFFE1;
    pub const SHIFT_R: u32 = 0xFFE2;
    pub const CONTROL_L: u32 = 0xFFE3;
    pub const CONTROL_R: u32 = 0xFFE4;
    pub const CAPS_LOCK: u32 = 0xFFE5;
    pub const ALT_L: u32 = 0xFFE9;
    pub const ALT_R: u32 = 0xFFEA;
    pub const SUPER_L: u32 = 0xFFEB;
    pub const SUPER_R: u32 = 0xFFEC;
    pub const DELETE: u32 = 0xFFFF;
    /// Keysyms at or above this encode a Unicode code point directly
    pub const UNICODE_OFFSET: u32 = 0x0100_0000;
}

/// The DOM `key` value of a keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomKey {
    Character(char),
    Named(&'static str),
    #[default]
    Unidentified,
}

const FUNCTION_KEYS: [&str; 24] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14",
    "F15", "F16", "F17", "F18", "F19", "F20", "F21", "F22", "F23", "F24",
];

/// Map a Windows key code to the keysym an X keyboard would produce.
///
/// Returns 0 for codes without an X equivalent.
pub fn keysym_for_windows_key_code(key_code: i32, shift: bool) -> u32 {
    let pick = |shifted: char, plain: char| if shift { shifted as u32 } else { plain as u32 };
    match key_code {
        vk::BACK => xk::BACKSPACE,
        vk::TAB if shift => xk::ISO_LEFT_TAB,
        vk::TAB => xk::TAB,
        vk::RETURN => xk::RETURN,
        vk::SHIFT => xk::SHIFT_L,
        vk::CONTROL => xk::CONTROL_L,
        vk::MENU => xk::ALT_L,
        vk::PAUSE => xk::PAUSE,
        vk::CAPITAL => xk::CAPS_LOCK,
        vk::ESCAPE => xk::ESCAPE,
        vk::SPACE => ' ' as u32,
        vk::PRIOR => xk::PAGE_UP,
        vk::NEXT => xk::PAGE_DOWN,
        vk::END => xk::END,
        vk::HOME => xk::HOME,
        vk::LEFT => xk::LEFT,
        vk::UP => xk::UP,
        vk::RIGHT => xk::RIGHT,
        vk::DOWN => xk::DOWN,
        vk::INSERT => xk::INSERT,
        vk::DELETE => xk::DELETE,
        vk::KEY_0..=vk::KEY_9 => '0' as u32 + (key_code - vk::KEY_0) as u32,
        vk::KEY_A..=vk::KEY_Z => {
            let base = if shift { 'A' } else { 'a' };
            base as u32 + (key_code - vk::KEY_A) as u32
        }
        vk::LWIN => xk::SUPER_L,
        vk::RWIN => xk::SUPER_R,
        vk::APPS => xk::MENU,
        vk::NUMPAD0..=vk::NUMPAD9 => xk::KP_0 + (key_code - vk::NUMPAD0) as u32,
        vk::MULTIPLY => xk::KP_MULTIPLY,
        vk::ADD => xk::KP_ADD,
        vk::SUBTRACT => xk::KP_SUBTRACT,
        vk::DECIMAL => xk::KP_DECIMAL,
        vk::DIVIDE => xk::KP_DIVIDE,
        vk::F1..=vk::F24 => xk::F1 + (key_code - vk::F1) as u32,
        vk::NUMLOCK => xk::NUM_LOCK,
        vk::SCROLL => xk::SCROLL_LOCK,
        vk::OEM_1 => pick(':', ';'),
        vk::OEM_PLUS => pick('+', '='),
        vk::OEM_COMMA => pick('<', ','),
        vk::OEM_MINUS => pick('_', '-'),
        vk::OEM_PERIOD => pick('>', '.'),
        vk::OEM_2 => pick('?', '/'),
        vk::OEM_3 => pick('~', '`'),
        vk::OEM_4 => pick('{', '['),
        vk::OEM_5 => pick('|', '\\'),
        vk::OEM_6 => pick('}', ']'),
        vk::OEM_7 => pick('"', '\''),
        _ => 0,
    }
}

/// Character a keysym types, including the control characters produced by
/// editing keys
pub fn unicode_for_keysym(keysym: u32) -> Option<char> {
    match keysym {
        0x20..=0x7E | 0xA0..=0xFF => char::from_u32(keysym),
        xk::BACKSPACE => Some('\u{8}'),
        xk::TAB | xk::ISO_LEFT_TAB => Some('\t'),
        xk::RETURN | xk::KP_ENTER => Some('\r'),
        xk::ESCAPE => Some('\u{1b}'),
        xk::DELETE => Some('\u{7f}'),
        xk::KP_SPACE => Some(' '),
        xk::KP_EQUAL => Some('='),
        xk::KP_MULTIPLY => Some('*'),
        xk::KP_ADD => Some('+'),
        xk::KP_SUBTRACT => Some('-'),
        xk::KP_DECIMAL => Some('.'),
        xk::KP_DIVIDE => Some('/'),
        xk::KP_0..=xk::KP_9 => char::from_u32('0' as u32 + (keysym - xk::KP_0)),
        k if k >= xk::UNICODE_OFFSET => char::from_u32(k - xk::UNICODE_OFFSET),
        _ => None,
    }
}

/// DOM `key` for a keysym. Printable characters win over key names.
pub fn dom_key_for_keysym(keysym: u32, character: Option<char>) -> DomKey {
    if let Some(c) = character.filter(|c| !c.is_control()) {
        return DomKey::Character(c);
    }
    let name = match keysym {
        xk::BACKSPACE => "Backspace",
        xk::TAB | xk::ISO_LEFT_TAB => "Tab",
        xk::RETURN | xk::KP_ENTER => "Enter",
        xk::ESCAPE => "Escape",
        xk::DELETE => "Delete",
        xk::PAUSE => "Pause",
        xk::SCROLL_LOCK => "ScrollLock",
        xk::NUM_LOCK => "NumLock",
        xk::CAPS_LOCK => "CapsLock",
        xk::HOME => "Home",
        xk::END => "End",
        xk::PAGE_UP => "PageUp",
        xk::PAGE_DOWN => "PageDown",
        xk::LEFT => "ArrowLeft",
        xk::UP => "ArrowUp",
        xk::RIGHT => "ArrowRight",
        xk::DOWN => "ArrowDown",
        xk::INSERT => "Insert",
        xk::MENU => "ContextMenu",
        xk::SHIFT_L | xk::SHIFT_R => "Shift",
        xk::CONTROL_L | xk::CONTROL_R => "Control",
        xk::ALT_L | xk::ALT_R => "Alt",
        xk::SUPER_L | xk::SUPER_R => "Meta",
        xk::F1..=xk::F24 => FUNCTION_KEYS[(keysym - xk::F1) as usize],
        _ => return DomKey::Unidentified,
    };
    DomKey::Named(name)
}

/// DOM `code` for an X keycode on an evdev keyboard (keycode = evdev + 8)
pub fn dom_code_for_native_keycode(keycode: i32) -> Option<&'static str> {
    let code = match keycode {
        9 => "Escape",
        10 => "Digit1",
        11 => "Digit2",
        12 => "Digit3",
        13 => "Digit4",
        14 => "Digit5",
        15 => "Digit6",
        16 => "Digit7",
        17 => "Digit8",
        18 => "Digit9",
        19 => "Digit0",
        20 => "Minus",
        21 => "Equal",
        22 => "Backspace",
        23 => "Tab",
        24 => "KeyQ",
        25 => "KeyW",
        26 => "KeyE",
        27 => "KeyR",
        28 => "KeyT",
        29 => "KeyY",
        30 => "KeyU",
        31 => "KeyI",
        32 => "KeyO",
        33 => "KeyP",
        34 => "BracketLeft",
        35 => "BracketRight",
        36 => "Enter",
        37 => "ControlLeft",
        38 => "KeyA",
        39 => "KeyS",
        40 => "KeyD",
        41 => "KeyF",
        42 => "KeyG",
        43 => "KeyH",
        44 => "KeyJ",
        45 => "KeyK",
        46 => "KeyL",
        47 => "Semicolon",
        48 => "Quote",
        49 => "Backquote",
        50 => "ShiftLeft",
        51 => "Backslash",
        52 => "KeyZ",
        53 => "KeyX",
        54 => "KeyC",
        55 => "KeyV",
        56 => "KeyB",
        57 => "KeyN",
        58 => "KeyM",
        59 => "Comma",
        60 => "Period",
        61 => "Slash",
        62 => "ShiftRight",
        63 => "NumpadMultiply",
        64 => "AltLeft",
        65 => "Space",
        66 => "CapsLock",
        67 => "F1",
        68 => "F2",
        69 => "F3",
        70 => "F4",
        71 => "F5",
        72 => "F6",
        73 => "F7",
        74 => "F8",
        75 => "F9",
        76 => "F10",
        77 => "NumLock",
        78 => "ScrollLock",
        79 => "Numpad7",
        80 => "Numpad8",
        81 => "Numpad9",
        82 => "NumpadSubtract",
        83 => "Numpad4",
        84 => "Numpad5",
        85 => "Numpad6",
        86 => "NumpadAdd",
        87 => "Numpad1",
        88 => "Numpad2",
        89 => "Numpad3",
        90 => "Numpad0",
        91 => "NumpadDecimal",
        94 => "IntlBackslash",
        95 => "F11",
        96 => "F12",
        104 => "NumpadEnter",
        105 => "ControlRight",
        106 => "NumpadDivide",
        107 => "PrintScreen",
        108 => "AltRight",
        110 => "Home",
        111 => "ArrowUp",
        112 => "PageUp",
        113 => "ArrowLeft",
        114 => "ArrowRight",
        115 => "End",
        116 => "ArrowDown",
        117 => "PageDown",
        118 => "Insert",
        119 => "Delete",
        127 => "Pause",
        133 => "MetaLeft",
        134 => "MetaRight",
        135 => "ContextMenu",
        _ => return None,
    };
    Some(code)
}
