//! In-process editing surface without a renderer.
//!
//! Used by the CLI and by tests to drive sessions the way a UI would:
//! typing emits change events, render hooks queue until `settle` runs them.

use crate::model::delta::Delta;
use crate::surface::{ApplyMode, EditingSurface, RenderHook, Selection};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub struct HeadlessSurface {
    contents: Delta,
    selection: Option<Selection>,
    read_only: bool,
    change_events: usize,
    silent_applies: usize,
    render_hooks: Vec<RenderHook>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// New surface wrapped for sharing with a session.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Types `text` at the caret (document end when unfocused) and moves the
    /// caret past it. Returns `false` when the surface is read-only.
    pub fn type_text(&mut self, text: &str) -> bool {
        let index = self
            .selection
            .map_or_else(|| self.contents.len(), |selection| selection.index);
        self.type_text_at(index, text)
    }

    /// Types `text` at `index`, as user input.
    pub fn type_text_at(&mut self, index: usize, text: &str) -> bool {
        if self.read_only {
            return false;
        }
        let index = index.min(self.contents.len());
        self.contents.insert_text(index, text, None);
        self.selection = Some(Selection::caret(index + text.chars().count()));
        self.change_events += 1;
        true
    }

    /// Deletes `length` characters at `index`, as user input.
    pub fn delete_text(&mut self, index: usize, length: usize) -> bool {
        if self.read_only {
            return false;
        }
        self.contents.delete(index, length);
        self.selection = Some(Selection::caret(index.min(self.contents.len())));
        self.change_events += 1;
        true
    }

    /// Moves focus and the caret without editing.
    pub fn set_cursor(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    /// Returns and resets the number of change events since the last call.
    pub fn take_change_events(&mut self) -> usize {
        std::mem::take(&mut self.change_events)
    }

    pub fn take_render_hooks(&mut self) -> Vec<RenderHook> {
        std::mem::take(&mut self.render_hooks)
    }

    pub fn pending_render_hooks(&self) -> usize {
        self.render_hooks.len()
    }

    /// Number of silent `set_contents` calls so far.
    pub fn silent_applies(&self) -> usize {
        self.silent_applies
    }

    pub fn plain_text(&self) -> String {
        self.contents.plain_text()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl EditingSurface for HeadlessSurface {
    fn contents(&self) -> Delta {
        self.contents.clone()
    }

    fn set_contents(&mut self, contents: &Delta, mode: ApplyMode) {
        self.contents = contents.clone();
        let length = self.contents.len();
        self.selection = self.selection.map(|selection| selection.clamp_to(length));
        match mode {
            ApplyMode::Normal => self.change_events += 1,
            ApplyMode::Silent => self.silent_applies += 1,
        }
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection.clamp_to(self.contents.len()));
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn after_render(&mut self, hook: RenderHook) {
        self.render_hooks.push(hook);
    }

    fn length(&self) -> usize {
        self.contents.len()
    }
}

/// Runs queued render hooks outside the surface borrow, including hooks they
/// schedule. Returns how many ran.
pub fn settle(surface: &Rc<RefCell<HeadlessSurface>>) -> usize {
    let mut ran = 0;
    loop {
        let hooks = surface.borrow_mut().take_render_hooks();
        if hooks.is_empty() {
            return ran;
        }
        for hook in hooks {
            hook();
            ran += 1;
        }
    }
}
