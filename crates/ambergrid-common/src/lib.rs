pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, TermError};
pub use traits::{
    EventSource, FontService, NullObserver, PostProcessor, Renderer, ScreenOps, TerminalObserver,
};
pub use types::{Attributes, Cell, Color, Position, Size, TerminalMode, TerminalSnapshot};
