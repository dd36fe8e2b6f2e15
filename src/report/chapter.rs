// SPDX-License-Identifier: MPL-2.0
//! Titled unit of report content.

use std::collections::BTreeMap;

use super::html;

/// Payload of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterContent {
    /// Ready-to-embed HTML.
    Html(String),
    /// Key/value pairs, rendered as a table. Keys are unique.
    Mapping(BTreeMap<String, String>),
}

/// One section of a compiled report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub content: ChapterContent,
}

impl Chapter {
    #[must_use]
    pub fn html(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: ChapterContent::Html(html.into()),
        }
    }

    #[must_use]
    pub fn mapping(title: impl Into<String>, mapping: BTreeMap<String, String>) -> Self {
        Self {
            title: title.into(),
            content: ChapterContent::Mapping(mapping),
        }
    }

    /// Anchor id used by the navigation section.
    #[must_use]
    pub fn anchor(&self) -> String {
        html::anchor(&self.title)
    }

    /// Renders the chapter body, without its heading.
    #[must_use]
    pub fn body_html(&self) -> String {
        match &self.content {
            ChapterContent::Html(html) => html.clone(),
            ChapterContent::Mapping(mapping) => {
                let mut table = String::from("<table>\n");
                for (key, value) in mapping {
                    table.push_str(&format!(
                        "<tr><th>{}</th><td>{}</td></tr>\n",
                        html::escape(key),
                        html::escape_multiline(value)
                    ));
                }
                table.push_str("</table>");
                table
            }
        }
    }

    /// Renders the chapter as a `<section>` with an anchored heading.
    #[must_use]
    pub fn to_html(&self) -> String {
        let anchor = html::escape(&self.anchor());
        format!(
            "<section class=\"chapter\" id=\"{anchor}\">\n<h2><a href=\"#{anchor}\">{}</a></h2>\n<div class=\"chapter-body\">\n{}\n</div>\n</section>\n",
            html::escape(&self.title),
            self.body_html()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_is_derived_from_title() {
        assert_eq!(Chapter::html("Smart Insights", "").anchor(), "smart-insights");
    }

    #[test]
    fn mapping_is_rendered_as_escaped_table() {
        let mut mapping = BTreeMap::new();
        mapping.insert("Key <1>".to_string(), "a & b".to_string());
        let html = Chapter::mapping("Info", mapping).body_html();
        assert!(html.contains("<tr><th>Key &lt;1&gt;</th><td>a &amp; b</td></tr>"));
    }

    #[test]
    fn html_content_is_embedded_verbatim() {
        let chapter = Chapter::html("Logs", "<p class=\"debug\">x</p>");
        let rendered = chapter.to_html();
        assert!(rendered.contains("id=\"logs\""));
        assert!(rendered.contains("<p class=\"debug\">x</p>"));
    }
}
