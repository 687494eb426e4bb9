use ambergrid_common::Position;

/// Cursor state: position, an optional saved snapshot, and visibility.
/// Bounds-clamping against the grid size is the caller's responsibility
/// (see `TerminalState`), since the cursor itself doesn't know the grid
/// dimensions.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    position: Position,
    visible: bool,
}

impl Cursor {
    pub fn new() -> Self {
        Self {
            position: Position::new(0, 0),
            visible: true,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, pos: Position) {
        self.position = pos;
    }

    pub fn set_column(&mut self, col: u16) {
        self.position.col = col;
    }

    pub fn move_up(&mut self, n: u16) {
        self.position.row = self.position.row.saturating_sub(n);
    }

    pub fn move_down(&mut self, n: u16) {
        self.position.row = self.position.row.saturating_add(n);
    }

    pub fn move_left(&mut self, n: u16) {
        self.position.col = self.position.col.saturating_sub(n);
    }

    pub fn move_right(&mut self, n: u16) {
        self.position.col = self.position.col.saturating_add(n);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}
