//! Hand-rolled UTF-8 decoder and ANSI/VT escape-sequence parser.
//!
//! The parser is byte-driven and holds no reference to any concrete screen
//! type: it is generic over [`ScreenOps`], so it can be driven against a
//! mock screen in tests.

mod sgr;
mod utf8;

pub use utf8::Utf8Decoder;

use ambergrid_common::ScreenOps;
use tracing::trace;

/// Parser state, matching the six states a VT-style escape sequence moves
/// through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    CsiEntry,
    CsiParam,
    OscString,
    SosPmApcString,
}

/// Drives a [`ScreenOps`] implementation from a raw output byte stream.
pub struct AnsiParser<S: ScreenOps> {
    screen: S,
    decoder: Utf8Decoder,
    state: State,
    parameters: Vec<i64>,
    intermediate: Vec<u8>,
    private_mode: bool,
    osc_buffer: Vec<u8>,
}

impl<S: ScreenOps> AnsiParser<S> {
    pub fn new(screen: S) -> Self {
        Self {
            screen,
            decoder: Utf8Decoder::new(),
            state: State::Ground,
            parameters: Vec::new(),
            intermediate: Vec::new(),
            private_mode: false,
            osc_buffer: Vec::new(),
        }
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn into_screen(self) -> S {
        self.screen
    }

    /// Resets the parser's own state (not the screen's) back to `Ground`.
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.parameters.clear();
        self.intermediate.clear();
        self.private_mode = false;
        self.osc_buffer.clear();
        self.decoder.reset();
    }

    /// Feeds a chunk of PTY output through the state machine.
    pub fn process(&mut self, data: &[u8]) {
        for &byte in data {
            self.step(byte);
        }
    }

    fn step(&mut self, byte: u8) {
        match self.state {
            State::Ground => {
                if byte == 0x1b {
                    self.state = State::Escape;
                    self.parameters.clear();
                    self.intermediate.clear();
                    self.private_mode = false;
                } else if byte < 0x20 {
                    self.handle_control(byte);
                } else {
                    let screen = &mut self.screen;
                    self.decoder.push(byte, |cp| screen.put_char(cp));
                }
            }
            State::Escape => self.step_escape(byte),
            State::CsiEntry => self.step_csi_entry(byte),
            State::CsiParam => self.step_csi_param(byte),
            State::OscString => self.step_osc_string(byte),
            State::SosPmApcString => {
                if byte == b'\\' {
                    self.execute_osc();
                    self.state = State::Ground;
                }
            }
        }
    }

    fn step_escape(&mut self, byte: u8) {
        match byte {
            b'[' => {
                self.state = State::CsiEntry;
                self.parameters.clear();
                self.intermediate.clear();
                self.private_mode = false;
            }
            b']' => {
                self.state = State::OscString;
                self.osc_buffer.clear();
            }
            b'7' => {
                self.screen.save_cursor();
                self.state = State::Ground;
            }
            b'8' => {
                self.screen.restore_cursor();
                self.state = State::Ground;
            }
            b'c' => {
                self.screen.reset();
                self.state = State::Ground;
            }
            0x20..=0x2f => self.intermediate.push(byte),
            0x30..=0x7e => {
                trace!(byte, "unsupported escape sequence, ignoring");
                self.state = State::Ground;
            }
            _ => {}
        }
    }

    fn step_csi_entry(&mut self, byte: u8) {
        match byte {
            b'?' => self.private_mode = true,
            b'0'..=b'9' => {
                self.parameters.push((byte - b'0') as i64);
                self.state = State::CsiParam;
            }
            b';' => {
                self.parameters.push(0);
                self.state = State::CsiParam;
            }
            0x40..=0x7e => {
                self.dispatch_csi(byte as char);
                self.state = State::Ground;
            }
            _ => {}
        }
    }

    fn step_csi_param(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => {
                if self.parameters.is_empty() {
                    self.parameters.push(0);
                }
                let last = self.parameters.last_mut().expect("just pushed");
                *last = *last * 10 + (byte - b'0') as i64;
            }
            b';' => self.parameters.push(0),
            0x40..=0x7e => {
                self.dispatch_csi(byte as char);
                self.state = State::Ground;
            }
            _ => {}
        }
    }

    fn step_osc_string(&mut self, byte: u8) {
        match byte {
            0x07 => {
                self.execute_osc();
                self.state = State::Ground;
            }
            0x1b => self.state = State::SosPmApcString,
            _ => self.osc_buffer.push(byte),
        }
    }

    fn handle_control(&mut self, byte: u8) {
        match byte {
            0x07 => self.screen.set_cursor_visible(true),
            0x08 => self.screen.backspace(),
            0x09 => self.screen.tab(),
            0x0a => self.screen.line_feed(true),
            0x0d => self.screen.carriage_return(),
            _ => {}
        }
    }

    fn dispatch_csi(&mut self, final_byte: char) {
        self.execute_csi(final_byte);
        self.parameters.clear();
        self.private_mode = false;
    }

    fn execute_csi(&mut self, final_byte: char) {
        let param = |index: usize, default: i64| -> i64 {
            match self.parameters.get(index) {
                Some(&v) if v != 0 => v,
                _ => default,
            }
        };

        match final_byte {
            'A' => self.screen.cursor_up(param(0, 1) as u16),
            'B' => self.screen.cursor_down(param(0, 1) as u16),
            'C' => self.screen.cursor_forward(param(0, 1) as u16),
            'D' => self.screen.cursor_backward(param(0, 1) as u16),
            'E' => self.screen.cursor_next_line(param(0, 1) as u16),
            'F' => self.screen.cursor_prev_line(param(0, 1) as u16),
            'G' => {
                let col = (param(0, 1).max(1) - 1) as u16;
                self.screen.set_cursor_column(col);
            }
            'H' | 'f' => {
                let row = (param(0, 1).max(1) - 1) as u16;
                let col = (param(1, 1).max(1) - 1) as u16;
                self.screen.set_cursor_position(row, col);
            }
            'J' => {
                let mode = self.parameters.first().copied().unwrap_or(0) as u16;
                self.screen.erase_in_display(mode);
            }
            'K' => {
                let mode = self.parameters.first().copied().unwrap_or(0) as u16;
                self.screen.erase_in_line(mode);
            }
            'L' => self.screen.insert_lines(param(0, 1) as u16),
            'M' => self.screen.delete_lines(param(0, 1) as u16),
            'S' => self.screen.scroll_up(param(0, 1) as u16),
            'T' => self.screen.scroll_down(param(0, 1) as u16),
            'm' => {
                let attrs = sgr::apply_sgr(
                    self.screen.attributes(),
                    self.screen.default_attributes(),
                    &self.parameters,
                );
                self.screen.set_attributes(attrs);
            }
            'h' | 'l' => {
                if self.private_mode && self.parameters.first() == Some(&25) {
                    self.screen.set_cursor_visible(final_byte == 'h');
                }
            }
            _ => trace!(final_byte, "unrecognized CSI final byte, ignoring"),
        }
    }

    fn execute_osc(&mut self) {
        if self.osc_buffer.is_empty() {
            return;
        }
        self.screen.osc_dispatch(&self.osc_buffer);
    }
}
