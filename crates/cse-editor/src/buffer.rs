//! Headless text editor backed by a rope.
//!
//! Implements `TextEditor` without any UI, for native hosts that drive the
//! buffer themselves and for tests.

use crate::host::TextEditor;
use ropey::Rope;
use std::ops::Range;

#[derive(Debug, Default)]
pub struct RopeEditor {
    rope: Rope,
    /// Selection in char indices; empty range = caret.
    selection: Range<usize>,
    focused: bool,
}

impl RopeEditor {
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let end = rope.len_chars();
        Self {
            rope,
            selection: end..end,
            focused: false,
        }
    }

    /// Select a char range, clamped to the buffer.
    pub fn select(&mut self, range: Range<usize>) {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.selection = start..end;
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// Type `text` at the caret, as a user would.
    pub fn type_text(&mut self, text: &str) {
        self.insert_at_cursor(text);
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

impl TextEditor for RopeEditor {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn replace_all(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        let end = self.rope.len_chars();
        self.selection = end..end;
    }

    fn insert_at_cursor(&mut self, text: &str) {
        let Range { start, end } = self.selection.clone();
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        let caret = start + text.chars().count();
        self.selection = caret..caret;
    }

    fn focus(&mut self) {
        self.focused = true;
    }
}
