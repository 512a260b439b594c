use std::ops::Range;

use thiserror::Error;

/// Inline markup the server passes through as HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Bold,
    Italic,
    Mono,
    Strike,
    Underline,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("selection {start}..{end} is outside the text ({len} bytes)")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("selection boundary {0} is inside a character")]
    NotCharBoundary(usize),
}

impl FormatKind {
    pub fn tags(self) -> (&'static str, &'static str) {
        match self {
            Self::Bold => ("<b>", "</b>"),
            Self::Italic => ("<i>", "</i>"),
            Self::Mono => ("<code>", "</code>"),
            Self::Strike => ("<s>", "</s>"),
            Self::Underline => ("<u>", "</u>"),
        }
    }

    /// Letter pressed together with Ctrl/Cmd (no Alt, no Shift).
    pub fn from_hotkey(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'b' => Some(Self::Bold),
            'i' => Some(Self::Italic),
            'm' => Some(Self::Mono),
            's' => Some(Self::Strike),
            'u' => Some(Self::Underline),
            _ => None,
        }
    }
}

/// Wraps `selection` (byte offsets) in `kind`'s tags.
///
/// Returns the new text and the range of the originally selected text inside it,
/// so an empty selection leaves the cursor between the tags.
pub fn insert_formatting(
    text: &str,
    selection: Range<usize>,
    kind: FormatKind,
) -> Result<(String, Range<usize>), FormatError> {
    let Range { start, end } = selection;

    if start > end || end > text.len() {
        return Err(FormatError::OutOfBounds { start, end, len: text.len() });
    }
    for idx in [start, end] {
        if !text.is_char_boundary(idx) {
            return Err(FormatError::NotCharBoundary(idx));
        }
    }

    let (open, close) = kind.tags();
    let selected = &text[start..end];

    let mut out = String::with_capacity(text.len() + open.len() + close.len());
    out.push_str(&text[..start]);
    out.push_str(open);
    out.push_str(selected);
    out.push_str(close);
    out.push_str(&text[end..]);

    let new_start = start + open.len();
    Ok((out, new_start..new_start + selected.len()))
}
