// SPDX-License-Identifier: MPL-2.0
//! Self-contained HTML document holding the compiled chapters.

use chrono::Local;
use rust_embed::RustEmbed;
use uuid::Uuid;

use super::chapter::Chapter;
use super::html;

#[derive(RustEmbed)]
#[folder = "assets/report/"]
struct Asset;

fn asset_text(name: &str) -> String {
    match Asset::get(name) {
        Some(file) => String::from_utf8_lossy(file.data.as_ref()).into_owned(),
        None => {
            tracing::warn!(asset = name, "Missing embedded report asset");
            String::new()
        }
    }
}

/// Serializes chapters into one HTML page.
///
/// The page carries its stylesheet and script inline, so the file can be
/// opened offline with nothing else around it.
#[must_use]
pub fn render_document(title: &str, chapters: &[Chapter]) -> String {
    let title = html::escape(title);
    let mut page = String::with_capacity(16 * 1024);

    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    page.push_str(&format!("<title>{title}</title>\n"));
    page.push_str(&format!("<style>\n{}</style>\n", asset_text("style.css")));
    page.push_str(&format!(
        "<script type=\"text/javascript\">\n{}</script>\n",
        asset_text("functions.js")
    ));
    page.push_str("</head>\n<body>\n<div class=\"container\">\n");

    page.push_str(&navigation(chapters));

    page.push_str("<main class=\"main-content\">\n");
    page.push_str(&format!("<header><h1>{title}</h1></header>\n"));
    for chapter in chapters {
        page.push_str(&chapter.to_html());
    }
    page.push_str("</main>\n</div>\n");

    page.push_str(&footer());
    page.push_str("</body>\n</html>\n");
    page
}

fn navigation(chapters: &[Chapter]) -> String {
    let mut nav = String::from("<aside class=\"nav-container\">\n<nav>\n<ul>\n");
    for chapter in chapters {
        nav.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>\n",
            html::escape(&chapter.anchor()),
            html::escape(&chapter.title)
        ));
    }
    nav.push_str("<li><button id=\"expand-sections\">Expand sessions</button></li>\n");
    nav.push_str("<li><button id=\"collapse-sections\">Collapse sessions</button></li>\n");
    for category in ["system", "error", "debug"] {
        nav.push_str(&format!(
            "<li><input type=\"checkbox\" id=\"{category}-logs\" name=\"{category}-logs\" checked>\
             <label for=\"{category}-logs\">Show {category} logs</label></li>\n"
        ));
    }
    nav.push_str(
        "<li><input type=\"search\" id=\"log-filter\" placeholder=\"Filter logs\"></li>\n",
    );
    nav.push_str("</ul>\n</nav>\n</aside>\n");
    nav
}

fn footer() -> String {
    format!(
        "<footer>\nBuilt using Diagnostics Journal {}<br>\nReport {} generated at {}\n</footer>\n",
        env!("CARGO_PKG_VERSION"),
        Uuid::new_v4(),
        Local::now().format("%Y-%m-%d %H:%M:%S %:z")
    )
}
