//! Translates host key events into the byte sequences written to the PTY.

/// A key, independent of any particular windowing toolkit. A host adapts
/// its own key event type into this one before calling [`to_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Return,
    Backspace,
    Tab,
    Escape,
    Up,
    Down,
    Right,
    Left,
    PageUp,
    PageDown,
    Home,
    End,
    Delete,
}

/// Keyboard modifiers relevant to byte translation. Only Control is
/// consulted; other modifiers are the host's concern (e.g. Shift changing
/// which `Key::Char` is produced).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub control: bool,
}

/// Translates a non-repeat key event into the bytes to write to the PTY.
/// Returns `None` for keys this mapping has no translation for (the host
/// should fall back to its own text-input path for plain characters
/// without a Control modifier).
pub fn to_bytes(key: Key, modifiers: Modifiers) -> Option<Vec<u8>> {
    if modifiers.control {
        if let Key::Char(c) = key {
            let lower = c.to_ascii_lowercase();
            if lower.is_ascii_lowercase() {
                return Some(vec![(lower as u8) - b'a' + 1]);
            }
            if c == ' ' {
                return Some(vec![0]);
            }
        }
    }

    match key {
        Key::Return => Some(vec![b'\r']),
        Key::Backspace => Some(vec![0x7f]),
        Key::Tab => Some(vec![b'\t']),
        Key::Escape => Some(vec![0x1b]),
        Key::Up => Some(b"\x1b[A".to_vec()),
        Key::Down => Some(b"\x1b[B".to_vec()),
        Key::Right => Some(b"\x1b[C".to_vec()),
        Key::Left => Some(b"\x1b[D".to_vec()),
        Key::PageUp => Some(b"\x1b[5~".to_vec()),
        Key::PageDown => Some(b"\x1b[6~".to_vec()),
        Key::Home => Some(b"\x1b[H".to_vec()),
        Key::End => Some(b"\x1b[F".to_vec()),
        Key::Delete => Some(b"\x1b[3~".to_vec()),
        Key::Char(c) => {
            let mut buf = [0u8; 4];
            Some(c.encode_utf8(&mut buf).as_bytes().to_vec())
        }
    }
}
