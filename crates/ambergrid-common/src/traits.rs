use crate::error::Result;
use crate::types::{Attributes, Position, Size, TerminalSnapshot};

/// The capability set the ANSI parser drives. A concrete screen model
/// implements this; the parser crate never names a concrete type, so it can
/// be exercised in tests against a mock.
pub trait ScreenOps {
    fn put_char(&mut self, ch: char);
    fn carriage_return(&mut self);
    fn line_feed(&mut self, new_line: bool);
    fn backspace(&mut self);
    fn tab(&mut self);

    fn cursor_up(&mut self, n: u16);
    fn cursor_down(&mut self, n: u16);
    fn cursor_forward(&mut self, n: u16);
    fn cursor_backward(&mut self, n: u16);
    fn cursor_next_line(&mut self, n: u16);
    fn cursor_prev_line(&mut self, n: u16);
    fn set_cursor_column(&mut self, col: u16);
    fn set_cursor_position(&mut self, row: u16, col: u16);

    fn erase_in_display(&mut self, mode: u16);
    fn erase_in_line(&mut self, mode: u16);
    fn insert_lines(&mut self, n: u16);
    fn delete_lines(&mut self, n: u16);
    fn scroll_up(&mut self, n: u16);
    fn scroll_down(&mut self, n: u16);

    fn save_cursor(&mut self);
    fn restore_cursor(&mut self);
    fn set_cursor_visible(&mut self, visible: bool);

    fn set_attributes(&mut self, attrs: Attributes);
    fn attributes(&self) -> Attributes;
    fn default_attributes(&self) -> Attributes;

    fn reset(&mut self);

    fn columns(&self) -> u16;
    fn rows(&self) -> u16;

    /// OSC payloads are otherwise discarded; this lets a caller log them.
    /// The default implementation ignores the payload.
    fn osc_dispatch(&mut self, payload: &[u8]) {
        let _ = payload;
    }
}

/// The engine calls these hooks directly from inside `Terminal::update`;
/// there is no channel and no buffering.
pub trait TerminalObserver {
    fn on_output(&mut self, _bytes: &[u8]) {}
    fn on_state_changed(&mut self, _snapshot: &TerminalSnapshot) {}
    fn on_resized(&mut self, _size: Size) {}
    fn on_closed(&mut self) {}
    fn on_osc(&mut self, _payload: &[u8]) {}
}

/// A no-op observer, useful as a default and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TerminalObserver for NullObserver {}

/// External collaborator: allocates a render target and draws the grid into
/// it. Not implemented by this crate; a host application supplies one.
pub trait Renderer {
    fn resize(&mut self, size: Size) -> Result<()>;
    fn present(&mut self) -> Result<()>;
}

/// External collaborator: rasterizes glyphs for a monospace font and
/// reports the pixel metrics of one cell.
pub trait FontService {
    fn cell_size_px(&self) -> (u32, u32);
}

/// External collaborator: applies a CRT-style post-processing pass over a
/// rendered frame (scanlines, noise, vignette).
pub trait PostProcessor {
    fn apply(&mut self) -> Result<()>;
}

/// External collaborator: produces keyboard, resize, and quit events from
/// a windowing layer.
pub trait EventSource {
    type Event;
    fn poll(&mut self) -> Option<Self::Event>;
}
