//! Annotation scanner: documentation text → candidate directive lines.

use crate::symbols::DocComment;

pub const DIRECTIVE_SIGIL: char = '$';

/// One logical documentation line that starts with the directive sigil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveLine {
    pub text: String,
    /// `(byte index in text, absolute source offset)` for each joined piece.
    segments: Vec<(usize, u32)>,
}

impl DirectiveLine {
    pub fn new(text: impl Into<String>, offset: u32) -> Self {
        Self {
            text: text.into(),
            segments: vec![(0, offset)],
        }
    }

    /// Absolute source offset of byte `index` of `text`.
    pub fn offset_of(&self, index: usize) -> u32 {
        let (start, offset) = self
            .segments
            .iter()
            .rev()
            .find(|(start, _)| *start <= index)
            .copied()
            .unwrap_or((0, 0));
        offset + (index - start) as u32
    }

    fn append(&mut self, piece: &str, offset: u32) {
        self.text.push(' ');
        self.segments.push((self.text.len(), offset));
        self.text.push_str(piece);
    }
}

/// Splits documentation into logical lines (gutter stripped, indented lines
/// joined onto the previous one) and keeps those that start with `$`.
pub fn scan_directives(doc: &DocComment) -> Vec<DirectiveLine> {
    let mut logical: Vec<DirectiveLine> = Vec::new();
    let mut open = false;
    let mut line_start = 0usize;

    for raw in doc.text.split('\n') {
        let base = doc.start + line_start as u32;
        line_start += raw.len() + 1;

        let raw = raw.trim_end();
        let mut skip = raw.len() - raw.trim_start().len();
        let mut content = &raw[skip..];
        if let Some(rest) = content.strip_prefix('*') {
            skip += 1;
            content = rest;
            if let Some(rest) = content.strip_prefix(' ') {
                skip += 1;
                content = rest;
            }
        }

        if content.trim().is_empty() {
            open = false;
            continue;
        }

        let indented = content.starts_with(char::is_whitespace);
        let trimmed = content.trim_start();
        let offset = base + (skip + content.len() - trimmed.len()) as u32;

        match logical.last_mut() {
            Some(last) if open && indented => last.append(trimmed, offset),
            _ => logical.push(DirectiveLine::new(trimmed, offset)),
        }
        open = true;
    }

    logical
        .into_iter()
        .filter(|line| line.text.starts_with(DIRECTIVE_SIGIL))
        .collect()
}
