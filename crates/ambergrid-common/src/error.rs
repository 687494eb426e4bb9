use thiserror::Error;

/// Construction-time failures: anything that happens during `PtyHost::spawn`
/// or `Terminal::new` is fatal and reported here. Steady-state per-tick
/// failures (EAGAIN, malformed UTF-8, unrecognized escapes, out-of-range
/// parameters) are absorbed silently elsewhere and never reach this type.
#[derive(Error, Debug)]
pub enum TermError {
    #[error("failed to allocate a pseudo-terminal: {0}")]
    PtyAlloc(String),

    #[error("failed to fork child process: {0}")]
    Fork(String),

    #[error("failed to exec shell: {0}")]
    Exec(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid terminal size: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TermError>;
