use ambergrid_common::Size;

/// A request the host makes of a running [`crate::Terminal`]. Handed to
/// [`crate::Terminal::dispatch`] directly; there is no queue or channel
/// behind this type, since the engine has no background thread to hand it
/// to. The corresponding notifications (output ready, state changed,
/// resized, closed) are delivered the same way, via direct calls to
/// [`ambergrid_common::TerminalObserver`] rather than a matching `Event`
/// enum, since nothing here ever needs to queue or replay them.
#[derive(Debug, Clone)]
pub enum Command {
    /// Write data to the PTY (typically translated key/text input).
    Write(Vec<u8>),

    /// Resize the terminal and propagate the new size to the PTY.
    Resize(Size),

    /// Tear down the PTY and the child shell.
    Close,
}
