//! Styled console text
//!
//! Console renderings are kept as ordered (style, text) segments instead of a
//! pre-rendered string. The plain rendering is the concatenation of the
//! segment texts, so it is always exactly the styled rendering minus escape
//! codes.

use std::fmt::{self, Write as _};

use crossterm::style::{Color, ContentStyle};

/// Build a style from optional foreground and background colors
pub fn style(fg: Option<Color>, bg: Option<Color>) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = fg;
    style.background_color = bg;
    style
}

/// Console output made of styled segments
#[derive(Debug, Clone, Default)]
pub struct ConsoleText {
    segments: Vec<(ContentStyle, String)>,
}

impl ConsoleText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment
    pub fn push(&mut self, style: ContentStyle, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.segments.push((style, text));
        }
    }

    /// Append every segment of another text
    pub fn extend(&mut self, other: &ConsoleText) {
        self.segments.extend(other.segments.iter().cloned());
    }

    /// Text with ANSI styling applied
    pub fn styled(&self) -> String {
        let mut out = String::new();
        for (style, text) in &self.segments {
            // Newlines stay outside the styled span so backgrounds don't bleed
            // into the next line.
            let mut lines = text.split('\n').peekable();
            while let Some(line) = lines.next() {
                if !line.is_empty() {
                    let _ = write!(out, "{}", style.apply(line));
                }
                if lines.peek().is_some() {
                    out.push('\n');
                }
            }
        }
        out
    }

    /// Text without any styling
    pub fn plain(&self) -> String {
        self.segments.iter().map(|(_, text)| text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ConsoleText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.styled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_concatenates_segments() {
        let mut text = ConsoleText::new();
        text.push(style(Some(Color::Black), Some(Color::White)), "[12:00]");
        text.push(style(Some(Color::Cyan), Some(Color::White)), "[App]");
        text.push(ContentStyle::new(), " hello\n");
        assert_eq!(text.plain(), "[12:00][App] hello\n");
    }

    #[test]
    fn test_styled_keeps_text() {
        let mut text = ConsoleText::new();
        text.push(style(Some(Color::Yellow), None), "careful\nnow\n");
        let styled = text.styled();
        assert!(styled.contains("careful"));
        assert!(styled.contains("now"));
        assert!(styled.ends_with('\n'));
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let mut text = ConsoleText::new();
        text.push(ContentStyle::new(), "");
        assert!(text.is_empty());
    }
}
