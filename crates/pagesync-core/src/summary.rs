//! Plain-text summaries of markdown bodies.

use pulldown_cmark::{Event, Parser, TagEnd};

/// Maximum number of characters kept before the ellipsis.
pub const SUMMARY_LIMIT: usize = 100;

const ELLIPSIS: &str = "...";

/// Flatten `markdown` to its text content.
///
/// Inline markup is dropped and its text kept; block boundaries and line
/// breaks become spaces.
#[must_use]
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
            Event::End(end) if !is_inline(&end) => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Summarize `markdown` for the `desc` field.
///
/// Whitespace runs collapse to single spaces; text longer than
/// [`SUMMARY_LIMIT`] characters is cut and gets `...` appended.
#[must_use]
pub fn summarize(markdown: &str) -> String {
    let flat = plain_text(markdown)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    match flat.char_indices().nth(SUMMARY_LIMIT) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &flat[..cut]),
        None => flat,
    }
}

const fn is_inline(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
    )
}
