//! Drag painting state machine.
//!
//! A pointer press starts painting, a release anywhere stops it. While
//! painting, every cell the pointer enters gets the selected tool applied
//! again, so re-entering a cell toggles it back.

/// Pointer drag state, owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Painting,
}

impl DragState {
    /// State after a pointer press on a cell.
    pub fn on_pointer_down(self) -> Self {
        DragState::Painting
    }

    /// State after a pointer release, wherever it happened.
    pub fn on_pointer_up(self) -> Self {
        DragState::Idle
    }

    /// True if entering a cell in this state should paint it.
    pub fn paints_on_enter(self) -> bool {
        matches!(self, DragState::Painting)
    }
}
