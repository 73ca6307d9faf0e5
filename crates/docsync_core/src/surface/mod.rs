//! Editing surface contract used by sync sessions.
//!
//! # Responsibility
//! - Describe the rich-text widget the engine drives: contents, selection,
//!   read-only flag and post-render callbacks.
//!
//! # Invariants
//! - `ApplyMode::Silent` updates never produce a change event.
//! - Render hooks run after the surface has laid out the latest contents,
//!   never inside `set_contents`.

pub mod headless;

use crate::model::delta::Delta;

pub use headless::{settle, HeadlessSurface};

/// Origin tag for a contents update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Treated like user input; emits a change event.
    Normal,
    /// Applied without emitting a change event.
    Silent,
}

/// Cursor position (`length == 0`) or highlighted range, in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// Collapsed selection at `index`.
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.index.saturating_add(self.length)
    }

    pub fn fits_within(&self, document_length: usize) -> bool {
        self.end() <= document_length
    }

    /// Shrinks the selection so it lies inside a document of `document_length`.
    pub fn clamp_to(&self, document_length: usize) -> Self {
        let index = self.index.min(document_length);
        let length = self.length.min(document_length - index);
        Self { index, length }
    }
}

/// Callback run once the surface has rendered pending contents.
pub type RenderHook = Box<dyn FnOnce()>;

/// Rich-text editing widget driven by a sync session.
pub trait EditingSurface {
    fn contents(&self) -> Delta;
    fn set_contents(&mut self, contents: &Delta, mode: ApplyMode);
    /// `None` when the surface has no focus.
    fn selection(&self) -> Option<Selection>;
    fn set_selection(&mut self, selection: Selection);
    fn set_read_only(&mut self, read_only: bool);
    /// Schedules `hook` after the next render.
    fn after_render(&mut self, hook: RenderHook);

    /// Document length in characters; embeds count as one.
    fn length(&self) -> usize {
        self.contents().len()
    }
}
