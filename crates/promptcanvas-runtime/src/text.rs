//! Text helpers for names, identifiers and untrusted model output.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum length of names and field identifiers derived from titles.
pub const MAX_IDENTIFIER_LEN: usize = 50;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][^>]*>").expect("markup pattern is valid")
});

/// Derives a message participant name from a node title.
///
/// Lowercases, turns whitespace into `_`, keeps only `[a-z0-9_-]` and
/// truncates to [`MAX_IDENTIFIER_LEN`] characters.
pub fn slugify(title: &str) -> String {
    title
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            '_' | '-' => Some(c),
            _ => None,
        })
        .take(MAX_IDENTIFIER_LEN)
        .collect()
}

/// Derives a structured-output field identifier from a title.
///
/// Keeps only `[A-Za-z0-9_-]` and truncates to [`MAX_IDENTIFIER_LEN`] characters.
pub fn field_identifier(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_IDENTIFIER_LEN)
        .collect()
}

/// Derives a table column key from a column title.
///
/// Lowercases and replaces every non-alphanumeric character with `_`.
pub fn column_key(title: &str) -> String {
    let key: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    field_identifier(&key)
}

/// Removes HTML tags and comments until none are left.
///
/// Stripping repeats so that tags nested inside other tags cannot
/// reassemble into live markup.
pub fn strip_tags(text: &str) -> String {
    let mut current = text.to_owned();
    loop {
        let stripped = MARKUP.replace_all(&current, "").into_owned();
        if stripped == current {
            return current;
        }
        current = stripped;
    }
}

/// Removes HTML tags and neutralizes leftover angle brackets.
///
/// Used for untrusted text written into node content: an unterminated tag
/// such as `<img src=x onerror=..` survives [`strip_tags`] and is escaped here.
pub fn strip_markup(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in strip_tags(text).chars() {
        match c {
            '<' => cleaned.push_str("&lt;"),
            '>' => cleaned.push_str("&gt;"),
            c => cleaned.push(c),
        }
    }
    cleaned
}

/// Escapes text for insertion into HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Strips markup, then escapes what remains.
pub fn sanitize_html_text(text: &str) -> String {
    escape_html(&strip_tags(text))
}
