// SPDX-License-Identifier: MPL-2.0
//! Orchestrates reporters, filters and insights into one [`Report`].

use super::chapter::Chapter;
use super::document::render_document;
use super::export::Report;
use super::filter::ReportFilter;
use super::insight::InsightsProvider;
use super::reporter::Section;
use crate::config;
use crate::domain::diagnostics::InsightTimeout;

const DEFAULT_TITLE: &str = "Diagnostics Report";

/// Builds a report from an ordered list of [`Section`]s.
///
/// A reporter or filter failure drops only the affected chapter; it is
/// logged at info level and compilation carries on.
///
/// The default title names no application. Hosts set theirs with
/// [`with_app_name`](Self::with_app_name) or [`with_title`](Self::with_title).
pub struct ReportCompiler {
    filters: Vec<Box<dyn ReportFilter>>,
    insights_provider: Option<Box<dyn InsightsProvider>>,
    title: String,
    filename: String,
    insight_timeout: Option<InsightTimeout>,
}

impl ReportCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            insights_provider: None,
            title: DEFAULT_TITLE.to_string(),
            filename: config::DEFAULT_REPORT_FILENAME.to_string(),
            insight_timeout: None,
        }
    }

    /// Adds a filter. Filters run in the order they were added.
    #[must_use]
    pub fn with_filter(mut self, filter: impl ReportFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    #[must_use]
    pub fn with_insights_provider(mut self, provider: impl InsightsProvider + 'static) -> Self {
        self.insights_provider = Some(Box::new(provider));
        self
    }

    /// Titles the document after the host application.
    #[must_use]
    pub fn with_app_name(self, app_name: &str) -> Self {
        self.with_title(format!("{app_name} - {DEFAULT_TITLE}"))
    }

    /// Heading and `<title>` of the document.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Overrides the timeout of the insights section.
    #[must_use]
    pub fn with_insight_timeout(mut self, timeout: InsightTimeout) -> Self {
        self.insight_timeout = Some(timeout);
        self
    }

    fn apply_filters(&self, chapter: Chapter) -> Option<Chapter> {
        let Chapter { title, mut content } = chapter;
        for filter in &self.filters {
            content = match filter.apply(content) {
                Ok(filtered) => filtered,
                Err(err) => {
                    tracing::info!(
                        filter = filter.name(),
                        chapter = %title,
                        %err,
                        "Filter failed, omitting chapter"
                    );
                    return None;
                }
            };
        }
        Some(Chapter { title, content })
    }

    /// Compiles the chapters in section order.
    ///
    /// Only the first [`Section::Insights`] is used. It is evaluated after
    /// every other section, so it also sees insights derived from their
    /// filtered chapters, and is inserted where it was listed.
    pub async fn compile(&self, sections: Vec<Section>) -> Report {
        let chapters = self.compile_chapters(sections).await;
        tracing::debug!(chapters = chapters.len(), filename = %self.filename, "Rendering report");
        let document = render_document(&self.title, &chapters);
        Report::new(self.filename.clone(), document.into_bytes())
    }

    /// Produces the filtered chapters without rendering the document.
    pub async fn compile_chapters(&self, sections: Vec<Section>) -> Vec<Chapter> {
        let mut chapters = Vec::with_capacity(sections.len());
        let mut derived = Vec::new();
        let mut insights = None;

        for section in sections {
            match section {
                Section::Reporter(reporter) => {
                    let chapter = match reporter.report().await {
                        Ok(chapter) => chapter,
                        Err(err) => {
                            tracing::info!(%err, "Reporter failed, omitting chapter");
                            continue;
                        }
                    };
                    let Some(chapter) = self.apply_filters(chapter) else {
                        continue;
                    };
                    // Providers only see what the report will show.
                    if let Some(provider) = &self.insights_provider {
                        derived.extend(provider.insights_for(&chapter));
                    }
                    chapters.push(chapter);
                }
                Section::Insights(reporter) => {
                    if insights.is_some() {
                        tracing::warn!("Ignoring additional insights section");
                        continue;
                    }
                    insights = Some((chapters.len(), reporter));
                }
            }
        }

        if let Some((position, mut reporter)) = insights {
            reporter.extend(derived);
            if let Some(timeout) = self.insight_timeout {
                reporter = reporter.with_timeout(timeout);
            }
            if let Some(chapter) = self.apply_filters(reporter.report().await) {
                chapters.insert(position.min(chapters.len()), chapter);
            }
        }

        chapters
    }
}

impl Default for ReportCompiler {
    fn default() -> Self {
        Self::new()
    }
}
