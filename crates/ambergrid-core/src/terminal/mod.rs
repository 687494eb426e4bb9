pub mod cursor;
pub mod state;

pub use state::TerminalState;
