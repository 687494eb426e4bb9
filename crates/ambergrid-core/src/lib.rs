//! Wires the PTY host, the ANSI parser, and the screen model into a single
//! synchronous engine driven one tick at a time by a host's frame loop.

pub mod events;
pub mod keyboard;
pub mod pty;
pub mod terminal;

use ambergrid_common::{NullObserver, Result, ScreenOps, Size, TerminalObserver, TerminalSnapshot};
use ambergrid_parser::AnsiParser;
use tracing::{debug, info, instrument};

pub use events::Command;
pub use keyboard::{to_bytes, Key, Modifiers};
pub use pty::PtyHost;
pub use terminal::TerminalState;

/// Ties the PTY host, parser and screen model together behind one
/// `update()` call per frame. Generic over the observer so a host can plug
/// in its own notification sink; [`NullObserver`] is used when none is
/// supplied.
pub struct Terminal<O: TerminalObserver = NullObserver> {
    host: PtyHost,
    parser: AnsiParser<TerminalState>,
    observer: O,
    size: Size,
    read_buf: Vec<u8>,
}

impl Terminal<NullObserver> {
    /// Spawns a shell of the given size with no observer attached.
    #[instrument]
    pub fn new(size: Size) -> Result<Self> {
        Self::with_observer(size, NullObserver)
    }
}

impl<O: TerminalObserver> Terminal<O> {
    /// Spawns a shell of the given size, reporting lifecycle events to
    /// `observer`.
    #[instrument(skip(observer))]
    pub fn with_observer(size: Size, observer: O) -> Result<Self> {
        info!(?size, "creating terminal");
        let host = PtyHost::spawn(size)?;
        let parser = AnsiParser::new(TerminalState::new(size));
        Ok(Self {
            host,
            parser,
            observer,
            size,
            read_buf: Vec::new(),
        })
    }

    pub fn state(&self) -> &TerminalState {
        self.parser.screen()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Applies a command synchronously. Write and Resize act immediately;
    /// Close tears the PTY down (a later `update()` will simply see a dead
    /// child and no more output).
    #[instrument(skip(self, command))]
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Write(data) => {
                self.host.write(&data);
            }
            Command::Resize(size) => {
                self.size = size;
                self.host.apply_winsize(size);
                self.parser.screen_mut().resize(size);
                self.observer.on_resized(size);
            }
            Command::Close => {
                self.host.shutdown();
                self.observer.on_closed();
            }
        }
    }

    /// One engine tick: flush any buffered input, drain everything
    /// available from the PTY, feed it through the parser, and report a
    /// state-changed notification if the screen actually moved. Returns
    /// whether the child shell is still alive.
    #[instrument(skip(self))]
    pub fn update(&mut self) -> bool {
        self.host.flush_pending();

        self.read_buf.clear();
        let n = self.host.read_available(&mut self.read_buf);
        if n > 0 {
            debug!(bytes = n, "pty output this tick");
            self.observer.on_output(&self.read_buf[..n]);
            let data = std::mem::take(&mut self.read_buf);
            self.parser.process(&data);
            self.read_buf = data;

            if let Some(payload) = self.parser.screen_mut().take_pending_osc() {
                self.observer.on_osc(&payload);
            }

            if self.parser.screen().dirty() {
                let snapshot = TerminalSnapshot {
                    size: self.size,
                    cursor: self.parser.screen().cursor_position(),
                    cursor_visible: self.parser.screen().cursor_visible(),
                };
                self.observer.on_state_changed(&snapshot);
                self.parser.screen_mut().clear_dirty();
            }
        }

        let alive = self.host.is_alive();
        if !alive {
            self.observer.on_closed();
        }
        alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingObserver {
        state_changes: u32,
        closed: bool,
        oscs: Vec<Vec<u8>>,
    }

    impl TerminalObserver for RecordingObserver {
        fn on_state_changed(&mut self, _snapshot: &TerminalSnapshot) {
            self.state_changes += 1;
        }
        fn on_closed(&mut self) {
            self.closed = true;
        }
        fn on_osc(&mut self, payload: &[u8]) {
            self.oscs.push(payload.to_vec());
        }
    }

    #[test]
    fn echoed_output_reaches_the_screen_model() {
        std::env::set_var("SHELL", "/bin/sh");
        let mut term =
            Terminal::with_observer(Size::new(80, 24), RecordingObserver::default()).expect("spawn");

        term.dispatch(Command::Write(b"echo hi\n".to_vec()));

        let start = std::time::Instant::now();
        let mut seen = false;
        while start.elapsed() < Duration::from_secs(5) {
            term.update();
            let text: String = term.state().cells().iter().map(|c| c.codepoint).collect();
            if text.contains("hi") {
                seen = true;
                break;
            }
            sleep(Duration::from_millis(20));
        }
        assert!(seen, "expected echoed output in the grid");
        assert!(term.observer_mut().state_changes > 0);
    }

    #[test]
    fn close_command_reports_closed() {
        std::env::set_var("SHELL", "/bin/sh");
        let mut term =
            Terminal::with_observer(Size::new(80, 24), RecordingObserver::default()).expect("spawn");
        term.dispatch(Command::Close);
        assert!(term.observer_mut().closed);
    }

    #[test]
    fn osc_sequences_are_forwarded_to_the_observer() {
        std::env::set_var("SHELL", "/bin/sh");
        let mut term =
            Terminal::with_observer(Size::new(80, 24), RecordingObserver::default()).expect("spawn");

        term.dispatch(Command::Write(b"printf '\\033]0;hi\\007'\n".to_vec()));

        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            term.update();
            if !term.observer_mut().oscs.is_empty() {
                break;
            }
            sleep(Duration::from_millis(20));
        }
        assert!(
            term.observer_mut().oscs.iter().any(|p| p.ends_with(b"hi")),
            "expected an OSC payload ending in \"hi\", got {:?}",
            term.observer_mut().oscs
        );
    }
}
