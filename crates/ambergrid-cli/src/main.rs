use ambergrid_common::{Size, TerminalObserver, TerminalSnapshot};
use ambergrid_core::{keyboard, Command, Key, Modifiers, Terminal};
use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(author, version, about = "Ambergrid terminal engine test harness", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Terminal rows (defaults to the host terminal's current size)
    #[arg(long)]
    rows: Option<u16>,

    /// Terminal columns (defaults to the host terminal's current size)
    #[arg(long)]
    cols: Option<u16>,

    /// Override the shell to spawn (defaults to $SHELL, falling back to /bin/bash)
    #[arg(long)]
    shell: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug { "ambergrid=debug" } else { "ambergrid=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!("starting ambergrid CLI harness");

    if let Some(shell) = &args.shell {
        std::env::set_var("SHELL", shell);
        info!(shell, "shell override in effect");
    }

    let (width, height) = terminal::size().unwrap_or((80, 24));
    let size = Size::new(
        args.cols.unwrap_or(if width > 0 { width } else { 80 }),
        args.rows.unwrap_or(if height > 0 { height } else { 24 }),
    );
    info!(?size, "terminal size");

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), Hide)?;

    let result = run(&mut stdout, size);

    execute!(stdout, Show)?;
    terminal::disable_raw_mode()?;
    result
}

/// Reports state changes back to the frame loop, since `Terminal::update`
/// clears its internal dirty flag as soon as it notifies the observer.
#[derive(Default)]
struct RenderObserver {
    changed: bool,
}

impl TerminalObserver for RenderObserver {
    fn on_state_changed(&mut self, _snapshot: &TerminalSnapshot) {
        self.changed = true;
    }
}

fn run(stdout: &mut io::Stdout, size: Size) -> Result<()> {
    let mut term = Terminal::with_observer(size, RenderObserver::default())?;
    let mut needs_render = true;

    loop {
        let tick_start = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    if key_event.code == KeyCode::Char('c')
                        && key_event.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        info!("ctrl+c received, closing");
                        term.dispatch(Command::Close);
                        return Ok(());
                    }
                    if let Some(translated) = translate_key(key_event.code, key_event.modifiers) {
                        term.dispatch(Command::Write(translated));
                    }
                }
                Event::Resize(cols, rows) => {
                    let new_size = Size::new(cols, rows);
                    info!(?new_size, "host terminal resized");
                    term.dispatch(Command::Resize(new_size));
                }
                _ => {}
            }
        }

        let alive = term.update();
        if !alive {
            info!("child shell exited");
            break;
        }

        if std::mem::take(&mut term.observer_mut().changed) {
            needs_render = true;
        }
        if needs_render {
            render(stdout, &term)?;
            needs_render = false;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < FRAME_INTERVAL {
            std::thread::sleep(FRAME_INTERVAL - elapsed);
        }
    }

    Ok(())
}

fn translate_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Vec<u8>> {
    let control = modifiers.contains(KeyModifiers::CONTROL);
    let key = match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Return,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::Esc => Key::Escape,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Right => Key::Right,
        KeyCode::Left => Key::Left,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Delete => Key::Delete,
        _ => return None,
    };
    keyboard::to_bytes(key, Modifiers { control })
}

/// Draws the full grid every tick this harness decides to render. A
/// production renderer would diff against the previous frame; this one
/// exists only to exercise the engine end to end.
fn render(stdout: &mut io::Stdout, term: &Terminal<RenderObserver>) -> Result<()> {
    let size = term.size();
    let state = term.state();

    queue!(stdout, MoveTo(0, 0))?;
    for row in 0..size.rows {
        let mut line = String::with_capacity(size.cols as usize);
        for col in 0..size.cols {
            line.push(state.cell(row, col).codepoint);
        }
        queue!(stdout, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
        stdout.write_all(line.as_bytes())?;
    }

    let cursor = state.cursor_position();
    queue!(stdout, MoveTo(cursor.col, cursor.row))?;
    if state.cursor_visible() {
        queue!(stdout, Show)?;
    } else {
        queue!(stdout, Hide)?;
    }
    stdout.flush()?;
    debug!("frame rendered");
    Ok(())
}
