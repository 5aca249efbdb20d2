//! Per-block interaction state.
//!
//! At most one block is being edited and at most one is being dragged, and
//! never the same block for both. A block's [`BlockState`] is derived from
//! the single [`Interaction`] record rather than stored per block.

#[cfg(test)]
#[path = "interaction_test.rs"]
mod interaction_test;

use crate::block::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    #[default]
    Idle,
    Editing,
    Dragging,
}

/// Outcome of a [`Interaction::begin_edit`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStart {
    /// Editing started; nothing else was being edited.
    Started,
    /// Editing started and the returned block's edit was closed.
    Replaced(BlockId),
    /// Already editing this block.
    Unchanged,
    /// The block is being dragged; request ignored.
    Ignored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interaction {
    editing: Option<BlockId>,
    dragging: Option<BlockId>,
}

impl Interaction {
    #[must_use]
    pub fn state_of(&self, id: &BlockId) -> BlockState {
        if self.editing.as_ref() == Some(id) {
            BlockState::Editing
        } else if self.dragging.as_ref() == Some(id) {
            BlockState::Dragging
        } else {
            BlockState::Idle
        }
    }

    #[must_use]
    pub fn editing(&self) -> Option<BlockId> {
        self.editing
    }

    #[must_use]
    pub fn dragging(&self) -> Option<BlockId> {
        self.dragging
    }

    /// Enter editing. A different block's edit is force-closed.
    pub fn begin_edit(&mut self, id: BlockId) -> EditStart {
        if self.dragging == Some(id) {
            return EditStart::Ignored;
        }
        match self.editing.replace(id) {
            None => EditStart::Started,
            Some(prev) if prev == id => EditStart::Unchanged,
            Some(prev) => EditStart::Replaced(prev),
        }
    }

    /// Leave editing. Returns whether `id` was the edited block.
    pub fn end_edit(&mut self, id: &BlockId) -> bool {
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
            true
        } else {
            false
        }
    }

    /// Enter dragging. Ignored while the block is being edited or while a
    /// different block is already being dragged.
    pub fn begin_drag(&mut self, id: BlockId) -> bool {
        if self.editing == Some(id) {
            return false;
        }
        match self.dragging {
            Some(current) => current == id,
            None => {
                self.dragging = Some(id);
                true
            }
        }
    }

    /// Leave dragging. Returns whether `id` was the dragged block.
    pub fn end_drag(&mut self, id: &BlockId) -> bool {
        if self.dragging.as_ref() == Some(id) {
            self.dragging = None;
            true
        } else {
            false
        }
    }

    /// Drop any state referring to `id`.
    pub fn forget(&mut self, id: &BlockId) {
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        if self.dragging.as_ref() == Some(id) {
            self.dragging = None;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
