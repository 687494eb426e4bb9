use serde::{Deserialize, Serialize};

/// Terminal dimensions, in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub rows: u16,
    pub cols: u16,
}

impl Size {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { rows, cols }
    }
}

/// A grid coordinate, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: u16,
    pub col: u16,
}

impl Position {
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

/// An RGBA color. The terminal itself only ever produces opaque colors
/// (alpha is carried through for the benefit of the external renderer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }
}

/// The 16-color ANSI base palette, in SGR 30-37 / 90-97 order.
pub const ANSI_16: [Color; 16] = [
    Color::rgb(0x00, 0x00, 0x00), // black
    Color::rgb(0xaa, 0x00, 0x00), // red
    Color::rgb(0x00, 0xaa, 0x00), // green
    Color::rgb(0xaa, 0x55, 0x00), // yellow
    Color::rgb(0x00, 0x00, 0xaa), // blue
    Color::rgb(0xaa, 0x00, 0xaa), // magenta
    Color::rgb(0x00, 0xaa, 0xaa), // cyan
    Color::rgb(0xaa, 0xaa, 0xaa), // light gray
    Color::rgb(0x55, 0x55, 0x55), // dark gray
    Color::rgb(0xff, 0x55, 0x55), // bright red
    Color::rgb(0x55, 0xff, 0x55), // bright green
    Color::rgb(0xff, 0xff, 0x55), // bright yellow
    Color::rgb(0x55, 0x55, 0xff), // bright blue
    Color::rgb(0xff, 0x55, 0xff), // bright magenta
    Color::rgb(0x55, 0xff, 0xff), // bright cyan
    Color::rgb(0xff, 0xff, 0xff), // white
];

/// Resolves an SGR 256-color index (0-255) to an RGBA color.
pub fn indexed_color(index: u8) -> Color {
    match index {
        0..=15 => ANSI_16[index as usize],
        16..=231 => {
            let n = index - 16;
            let r = n / 36;
            let g = (n % 36) / 6;
            let b = n % 6;
            let expand = |c: u8| if c == 0 { 0 } else { c * 40 + 55 };
            Color::rgb(expand(r), expand(g), expand(b))
        }
        232..=255 => {
            let v = ((index as u16 - 232) * 10 + 8).min(255) as u8;
            Color::rgb(v, v, v)
        }
    }
}

/// Graphic rendition state. The engine keeps three instances of this:
/// the currently-active one (mutated by SGR), the default (SGR 0 target,
/// never mutated after construction) and a saved snapshot (DECSC/DECRC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    pub foreground: Color,
    pub background: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub inverse: bool,
}

impl Attributes {
    pub const fn defaults() -> Self {
        Self {
            foreground: Color::rgb(0xaa, 0xaa, 0xaa),
            background: Color::rgb(0x00, 0x00, 0x00),
            bold: false,
            italic: false,
            underline: false,
            inverse: false,
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::defaults()
    }
}

/// One grid position. `inverse` is resolved into fg/bg at write time and
/// is not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub codepoint: char,
    pub foreground: Color,
    pub background: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Cell {
    pub fn blank(defaults: Attributes) -> Self {
        Self {
            codepoint: ' ',
            foreground: defaults.foreground,
            background: defaults.background,
            bold: defaults.bold,
            italic: defaults.italic,
            underline: defaults.underline,
        }
    }

    /// Writes `ch` into a cell at `attrs`, swapping fg/bg if `attrs.inverse`
    /// is set. This is the only place the inverse flag has any effect.
    pub fn write(ch: char, attrs: Attributes) -> Self {
        let (fg, bg) = if attrs.inverse {
            (attrs.background, attrs.foreground)
        } else {
            (attrs.foreground, attrs.background)
        };
        Self {
            codepoint: ch,
            foreground: fg,
            background: bg,
            bold: attrs.bold,
            italic: attrs.italic,
            underline: attrs.underline,
        }
    }
}

/// Terminal mode flags surfaced for external consumers (e.g. a renderer
/// deciding whether to draw a cursor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminalMode {
    pub echo: bool,
    pub raw: bool,
    pub line_wrap: bool,
    pub cursor_visible: bool,
}

/// A point-in-time snapshot of externally-visible terminal state, useful
/// for logging and for the observer hook.
#[derive(Debug, Clone)]
pub struct TerminalSnapshot {
    pub size: Size,
    pub cursor: Position,
    pub cursor_visible: bool,
}
