//! Telegram HTML sanitizer for model output.
//!
//! Allowed inline tags pass through verbatim, attributes included. Any other tag is
//! removed with its attributes; for active-content elements (`script`, `style`, ...)
//! the enclosed content goes too. Text outside tags is never altered.

use std::sync::OnceLock;

use regex::Regex;

/// Tags Telegram renders in HTML mode and the summary instruction permits.
pub const ALLOWED_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "a", "blockquote",
];

/// Disallowed elements whose content is dropped along with the tags.
const DROP_CONTENT_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "head", "title", "noscript", "template",
];

const TAG_PATTERN: &str = r"</?([A-Za-z][A-Za-z0-9-]*)(?:\s[^<>]*)?/?>";

static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(TAG_PATTERN).expect("tag pattern is valid"))
}

/// Strips every tag outside [`ALLOWED_TAGS`].
pub fn sanitize_html(input: &str) -> String {
    let re = tag_re();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while let Some(caps) = re.captures_at(input, pos) {
        let (Some(tag), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        out.push_str(&input[pos..tag.start()]);
        let name = name.as_str().to_ascii_lowercase();
        let raw = tag.as_str();
        pos = tag.end();
        if ALLOWED_TAGS.contains(&name.as_str()) {
            out.push_str(raw);
        } else if DROP_CONTENT_TAGS.contains(&name.as_str())
            && !raw.starts_with("</")
            && !raw.ends_with("/>")
        {
            if let Some(end) = balanced_close(input, pos, &name) {
                pos = end;
            }
        }
    }
    out.push_str(&input[pos..]);
    out
}

/// Escapes text for inclusion in Telegram HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Byte offset just past the `</name>` that closes an element opened before `from`.
fn balanced_close(input: &str, from: usize, name: &str) -> Option<usize> {
    let re = tag_re();
    let mut depth = 1usize;
    let mut pos = from;
    while let Some(caps) = re.captures_at(input, pos) {
        let tag = caps.get(0)?;
        pos = tag.end();
        if !caps.get(1)?.as_str().eq_ignore_ascii_case(name) {
            continue;
        }
        if tag.as_str().starts_with("</") {
            depth -= 1;
            if depth == 0 {
                return Some(tag.end());
            }
        } else if !tag.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    None
}
