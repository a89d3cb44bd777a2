//! Markdown helpers built on [`pulldown_cmark`]: HTML rendering for post
//! bodies and plain-text excerpts for listings.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// The default maximum excerpt length, in characters.
pub const EXCERPT_LENGTH: usize = 140;

const ELLIPSIS: char = '…';

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Converts markdown to HTML.
pub fn to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options()));
    out
}

/// Extracts the plain text of `markdown` and prunes it to at most
/// `prune_length` characters. Pruning happens at a word boundary and appends
/// `…` whenever text was dropped.
pub fn excerpt(markdown: &str, prune_length: usize) -> String {
    let mut text = String::new();
    for ev in Parser::new_ext(markdown, options()) {
        match ev {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(_))
            | Event::End(Tag::Item)
            | Event::End(Tag::CodeBlock(_))
            | Event::End(Tag::TableCell) => text.push(' '),
            _ => {}
        }
    }
    prune(&text, prune_length)
}

/// Collapses whitespace in `text` and truncates it to `length` characters
/// (not counting the ellipsis) without splitting words.
fn prune(text: &str, length: usize) -> String {
    let mut out = String::new();
    let mut out_len = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let sep = if out.is_empty() { 0 } else { 1 };
        if out_len + sep + word_len > length {
            if out.is_empty() {
                // a single word longer than the limit
                out.extend(word.chars().take(length));
            }
            out.push(ELLIPSIS);
            return out;
        }
        if sep == 1 {
            out.push(' ');
        }
        out.push_str(word);
        out_len += sep + word_len;
    }
    out
}
