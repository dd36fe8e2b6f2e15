// SPDX-License-Identifier: MPL-2.0
//! Chapter rendering the diagnostic log, one collapsible block per session.

use async_trait::async_trait;

use super::chapter::Chapter;
use super::reporter::Reporter;
use super::ReporterError;
use crate::config;
use crate::logging::{parse_fragments, Category, Fragment, LogHandle};

/// Reads the log through a [`LogHandle`] and renders it newest session first.
#[derive(Debug, Clone)]
pub struct LogsReporter {
    handle: LogHandle,
    title: String,
}

impl LogsReporter {
    #[must_use]
    pub fn new(handle: LogHandle) -> Self {
        Self {
            handle,
            title: config::LOGS_CHAPTER_TITLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

#[async_trait]
impl Reporter for LogsReporter {
    async fn report(&self) -> Result<Chapter, ReporterError> {
        let handle = self.handle.clone();
        let data = tokio::task::spawn_blocking(move || handle.read_log())
            .await
            .map_err(|err| ReporterError::Unavailable(err.to_string()))??;
        Ok(Chapter::html(self.title.clone(), render_log(&data)))
    }
}

/// Fragments of one process run.
struct Session<'a> {
    marker: Option<Fragment<'a>>,
    entries: Vec<Fragment<'a>>,
}

/// Renders raw log content as HTML, sessions newest first.
#[must_use]
pub fn render_log(data: &[u8]) -> String {
    let mut sessions: Vec<Session<'_>> = Vec::new();
    for fragment in parse_fragments(data) {
        if Category::from_class(fragment.class) == Some(Category::Session) {
            sessions.push(Session {
                marker: Some(fragment),
                entries: Vec::new(),
            });
            continue;
        }
        match sessions.last_mut() {
            Some(session) => session.entries.push(fragment),
            None => sessions.push(Session {
                marker: None,
                entries: vec![fragment],
            }),
        }
    }

    if sessions.is_empty() {
        return "<p class=\"empty-log\">No log entries recorded.</p>".to_string();
    }

    let mut html = String::new();
    for (index, session) in sessions.iter().rev().enumerate() {
        let open = if index == 0 { " open" } else { "" };
        html.push_str(&format!("<details class=\"session\"{open}>\n"));
        html.push_str(&format!(
            "<summary>{}</summary>\n",
            session_summary(session.marker.as_ref())
        ));
        html.push_str("<div class=\"log-lines\">\n");
        for fragment in session.marker.iter().chain(session.entries.iter()) {
            html.push_str(&String::from_utf8_lossy(&data[fragment.range.clone()]));
        }
        html.push_str("</div>\n</details>\n");
    }
    html
}

fn session_summary(marker: Option<&Fragment<'_>>) -> String {
    const DATE_OPEN: &str = "<span class=\"log-date\">";

    let started = marker.and_then(|fragment| {
        let body = String::from_utf8_lossy(fragment.body);
        let start = body.find(DATE_OPEN)? + DATE_OPEN.len();
        let end = body[start..].find("</span>")? + start;
        Some(body[start..end].to_string())
    });
    match started {
        Some(date) => format!("Session started {date}"),
        None => "Earlier entries".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogEntry, Origin};

    fn fragments(entries: &[LogEntry]) -> Vec<u8> {
        entries
            .iter()
            .map(LogEntry::to_fragment)
            .collect::<String>()
            .into_bytes()
    }

    fn session() -> LogEntry {
        LogEntry::session(vec![("System".into(), "Linux".into())])
    }

    fn debug(message: &str) -> LogEntry {
        LogEntry::debug(message, Origin::new("a.rs", "a", 1))
    }

    #[test]
    fn empty_log_renders_placeholder() {
        assert!(render_log(b"").contains("No log entries recorded."));
    }

    #[test]
    fn sessions_render_newest_first_and_only_first_is_open() {
        let data = fragments(&[session(), debug("old run"), session(), debug("new run")]);
        let html = render_log(&data);

        let new_pos = html.find("new run").expect("new run present");
        let old_pos = html.find("old run").expect("old run present");
        assert!(new_pos < old_pos);
        assert_eq!(html.matches("<details class=\"session\" open>").count(), 1);
        assert_eq!(html.matches("<details class=\"session\"").count(), 2);
        assert!(html.contains("<summary>Session started "));
    }

    #[test]
    fn entries_before_any_marker_form_their_own_group() {
        let data = fragments(&[debug("orphan"), session(), debug("current")]);
        let html = render_log(&data);
        assert!(html.contains("<summary>Earlier entries</summary>"));
        assert!(html.find("current") < html.find("orphan"));
    }

    #[test]
    fn fragments_keep_their_category_class() {
        let data = fragments(&[session(), LogEntry::system("stdout line")]);
        let html = render_log(&data);
        assert!(html.contains("<p class=\"system\">"));
        assert!(html.contains("<p class=\"session\">"));
    }
}
