//! Rich-text operation sequence.
//!
//! # Responsibility
//! - Represent document content as an ordered list of insert operations.
//! - Provide the small set of editing primitives a headless surface needs.
//!
//! # Invariants
//! - Lengths and indices count Unicode scalar values; an embed counts as one.
//! - `Delta::from_ops` keeps operations exactly as given (no normalization), so
//!   decoded store content compares equal to what was stored.
//! - Editing primitives (`push`, `insert_text`, `delete`) keep the sequence
//!   compact: no empty text inserts, adjacent text with equal attributes merged.

use serde_json::{Map, Value};

/// Formatting attributes attached to one insert (`bold`, `header`, ...).
pub type Attributes = Map<String, Value>;

/// Inserted payload of one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Insert {
    /// Plain text run.
    Text(String),
    /// Embedded object such as `{"image": "cover.png"}`.
    Embed(Map<String, Value>),
}

/// One insert operation with optional formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    pub insert: Insert,
    pub attributes: Option<Attributes>,
}

impl Op {
    /// Creates an unformatted text insert.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes: None,
        }
    }

    /// Creates a text insert carrying formatting attributes.
    pub fn formatted(text: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes: Some(attributes),
        }
    }

    /// Creates an embed insert with a single `kind -> value` entry.
    pub fn embed(kind: impl Into<String>, value: Value) -> Self {
        let mut embed = Map::new();
        embed.insert(kind.into(), value);
        Self {
            insert: Insert::Embed(embed),
            attributes: None,
        }
    }

    /// Length of this operation in document positions.
    pub fn len(&self) -> usize {
        match &self.insert {
            Insert::Text(text) => text.chars().count(),
            Insert::Embed(_) => 1,
        }
    }

    /// Returns whether this operation occupies no positions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_text(&self, text: String) -> Self {
        Self {
            insert: Insert::Text(text),
            attributes: self.attributes.clone(),
        }
    }
}

/// Ordered sequence of insert operations describing a whole document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    ops: Vec<Op>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps operations exactly as given.
    pub fn from_ops(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Builds a single unformatted text run; empty input yields an empty delta.
    pub fn text(text: &str) -> Self {
        let mut delta = Self::new();
        delta.push(Op::text(text));
        delta
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    /// Total length in document positions.
    pub fn len(&self) -> usize {
        self.ops.iter().map(Op::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Concatenated text runs; embeds contribute nothing.
    pub fn plain_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match &op.insert {
                Insert::Text(text) => Some(text.as_str()),
                Insert::Embed(_) => None,
            })
            .collect()
    }

    /// Copy with adjacent equally-formatted text runs merged and empty runs
    /// dropped.
    pub fn normalized(&self) -> Delta {
        let mut delta = Delta::new();
        for op in &self.ops {
            delta.push(op.clone());
        }
        delta
    }

    /// Whether both deltas describe the same document, however their runs
    /// are split.
    pub fn same_content(&self, other: &Delta) -> bool {
        self == other || self.normalized() == other.normalized()
    }

    /// Appends one operation, merging it into the previous text run when the
    /// attributes match. Empty text inserts are dropped.
    pub fn push(&mut self, op: Op) {
        if let Insert::Text(text) = &op.insert {
            if text.is_empty() {
                return;
            }
            if let Some(last) = self.ops.last_mut() {
                if let Insert::Text(previous) = &mut last.insert {
                    if last.attributes == op.attributes {
                        previous.push_str(text);
                        return;
                    }
                }
            }
        }
        self.ops.push(op);
    }

    /// Inserts `text` at `index` (clamped to the end).
    pub fn insert_text(&mut self, index: usize, text: &str, attributes: Option<Attributes>) {
        if text.is_empty() {
            return;
        }

        let index = index.min(self.len());
        let mut pending = Some(Op {
            insert: Insert::Text(text.to_string()),
            attributes,
        });
        let mut result = Delta::new();
        let mut offset = 0;

        for op in std::mem::take(&mut self.ops) {
            let op_len = op.len();
            if index == offset {
                if let Some(inserted) = pending.take() {
                    result.push(inserted);
                }
            } else if index > offset && index < offset + op_len {
                if let (Insert::Text(run), Some(inserted)) = (&op.insert, pending.take()) {
                    let split = byte_offset(run, index - offset);
                    result.push(op.with_text(run[..split].to_string()));
                    result.push(inserted);
                    result.push(op.with_text(run[split..].to_string()));
                    offset += op_len;
                    continue;
                }
            }
            offset += op_len;
            result.push(op);
        }

        if let Some(inserted) = pending {
            result.push(inserted);
        }
        *self = result;
    }

    /// Removes `length` positions starting at `index`.
    pub fn delete(&mut self, index: usize, length: usize) {
        if length == 0 {
            return;
        }

        let end = index.saturating_add(length);
        let mut result = Delta::new();
        let mut offset = 0;

        for op in std::mem::take(&mut self.ops) {
            let op_start = offset;
            let op_end = offset + op.len();
            offset = op_end;

            if op_end <= index || op_start >= end {
                result.push(op);
                continue;
            }

            if let Insert::Text(run) = &op.insert {
                let head_chars = index.saturating_sub(op_start);
                let tail_from = end.min(op_end) - op_start;
                let kept: String = run
                    .chars()
                    .enumerate()
                    .filter(|(position, _)| *position < head_chars || *position >= tail_from)
                    .map(|(_, ch)| ch)
                    .collect();
                result.push(op.with_text(kept));
            }
        }

        *self = result;
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}
