// SPDX-License-Identifier: MPL-2.0
//! Small HTML helpers shared by log fragments and report rendering.

/// Escapes text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(&mut escaped, ch);
    }
    escaped
}

/// Escapes text and turns line breaks into `<br>`.
///
/// The result never contains a raw newline.
#[must_use]
pub fn escape_multiline(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped_multiline(&mut escaped, ch);
    }
    escaped
}

/// Appends the escaped form of one character.
pub(crate) fn push_escaped_multiline(out: &mut String, ch: char) {
    match ch {
        '\n' => out.push_str("<br>"),
        '\r' => {}
        _ => push_escaped(out, ch),
    }
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(ch),
    }
}

/// Rewrites the text between tags, leaving every `<...>` tag untouched.
pub fn map_text_nodes(html: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut output = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        output.push_str(&rewrite(&rest[..open]));
        match rest[open..].find('>') {
            Some(close) => {
                output.push_str(&rest[open..=open + close]);
                rest = &rest[open + close + 1..];
            }
            None => {
                output.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    output.push_str(&rewrite(rest));
    output
}

/// Anchor slug for a chapter title: lower-cased, spaces replaced by hyphens.
#[must_use]
pub fn anchor(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}
