// SPDX-License-Identifier: MPL-2.0
//! Advisory insights.
//!
//! An [`Insight`] is evaluated on its own and may produce no result. Insights
//! sharing a name are duplicates; only one survives into a report.

use std::fmt;

use async_trait::async_trait;
use regex::Regex;

use super::chapter::{Chapter, ChapterContent};
use crate::config;
use crate::system_info::{format_bytes, DiskSpace};

/// Outcome of one insight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightResult {
    Success(String),
    Warn(String),
    Error(String),
}

impl InsightResult {
    /// Message prefixed with a status marker, as shown in the report.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Success(message) => format!("✅ {message}"),
            Self::Warn(message) => format!("⚠️ {message}"),
            Self::Error(message) => format!("❌ {message}"),
        }
    }
}

impl fmt::Display for InsightResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_message())
    }
}

/// An independently evaluated advisory judgment.
#[async_trait]
pub trait Insight: Send + Sync {
    /// Identifier, also the deduplication key.
    fn name(&self) -> &str;

    /// Evaluates the insight. `None` means "nothing to say".
    async fn evaluate(&self) -> Option<InsightResult>;
}

/// Insight with a precomputed result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticInsight {
    name: String,
    result: Option<InsightResult>,
}

impl StaticInsight {
    #[must_use]
    pub fn new(name: impl Into<String>, result: Option<InsightResult>) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

#[async_trait]
impl Insight for StaticInsight {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self) -> Option<InsightResult> {
        self.result.clone()
    }
}

/// Warns when the disk holding the home directory is low on space.
#[derive(Debug, Clone, Default)]
pub struct DeviceStorageInsight {
    space: Option<DiskSpace>,
}

impl DeviceStorageInsight {
    /// Insight over the live home disk.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insight over a fixed measurement.
    #[must_use]
    pub fn with_space(space: DiskSpace) -> Self {
        Self { space: Some(space) }
    }

    fn judge(space: DiskSpace) -> InsightResult {
        let summary = format!(
            "{} of {} left",
            format_bytes(space.available_bytes),
            format_bytes(space.total_bytes)
        );
        if space.available_bytes < config::LOW_STORAGE_THRESHOLD_BYTES {
            InsightResult::Warn(format!("The user is low on storage ({summary})"))
        } else {
            InsightResult::Success(format!("The user has enough storage ({summary})"))
        }
    }
}

#[async_trait]
impl Insight for DeviceStorageInsight {
    fn name(&self) -> &str {
        "Device storage"
    }

    async fn evaluate(&self) -> Option<InsightResult> {
        let space = match self.space {
            Some(space) => space,
            None => tokio::task::spawn_blocking(DiskSpace::for_home)
                .await
                .ok()
                .flatten()?,
        };
        Some(Self::judge(space))
    }
}

/// Derives extra insights from already-rendered chapters.
pub trait InsightsProvider: Send + Sync {
    fn insights_for(&self, chapter: &Chapter) -> Vec<Box<dyn Insight>>;
}

/// One rule of an [`ErrorPatternProvider`].
#[derive(Debug, Clone)]
pub struct ErrorPattern {
    pub name: String,
    pub pattern: Regex,
    pub result: InsightResult,
}

/// Scans `error` log lines for known patterns.
///
/// Each rule that matches at least one error fragment yields a
/// [`StaticInsight`] named after the rule.
#[derive(Debug, Clone, Default)]
pub struct ErrorPatternProvider {
    rules: Vec<ErrorPattern>,
}

impl ErrorPatternProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn with_rule(
        mut self,
        name: impl Into<String>,
        pattern: &str,
        result: InsightResult,
    ) -> Result<Self, regex::Error> {
        self.rules.push(ErrorPattern {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            result,
        });
        Ok(self)
    }

    fn error_lines(html: &str) -> impl Iterator<Item = &str> {
        html.split("<p class=\"error\">")
            .skip(1)
            .filter_map(|rest| rest.split("</p>").next())
    }
}

impl InsightsProvider for ErrorPatternProvider {
    fn insights_for(&self, chapter: &Chapter) -> Vec<Box<dyn Insight>> {
        let ChapterContent::Html(html) = &chapter.content else {
            return Vec::new();
        };

        self.rules
            .iter()
            .filter(|rule| Self::error_lines(html).any(|line| rule.pattern.is_match(line)))
            .map(|rule| {
                Box::new(StaticInsight::new(rule.name.clone(), Some(rule.result.clone())))
                    as Box<dyn Insight>
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_message_prefixes_status() {
        assert_eq!(InsightResult::Success("ok".into()).display_message(), "✅ ok");
        assert_eq!(InsightResult::Warn("hm".into()).display_message(), "⚠️ hm");
        assert_eq!(InsightResult::Error("no".into()).display_message(), "❌ no");
    }

    #[tokio::test]
    async fn storage_insight_warns_under_one_gigabyte() {
        let insight = DeviceStorageInsight::with_space(DiskSpace {
            available_bytes: 800_000_000,
            total_bytes: 100_000_000_000,
        });
        assert_eq!(
            insight.evaluate().await,
            Some(InsightResult::Warn(
                "The user is low on storage (800 MB of 100 GB left)".into()
            ))
        );
    }

    #[tokio::test]
    async fn storage_insight_succeeds_with_enough_space() {
        let insight = DeviceStorageInsight::with_space(DiskSpace {
            available_bytes: 8_000_000_000,
            total_bytes: 100_000_000_000,
        });
        assert_eq!(
            insight.evaluate().await,
            Some(InsightResult::Success(
                "The user has enough storage (8 GB of 100 GB left)".into()
            ))
        );
    }

    #[tokio::test]
    async fn static_insight_returns_its_result() {
        let insight = StaticInsight::new("X", None);
        assert_eq!(insight.name(), "X");
        assert_eq!(insight.evaluate().await, None);
    }

    #[test]
    fn error_pattern_provider_matches_only_error_lines() {
        let provider = ErrorPatternProvider::new()
            .with_rule(
                "Disk full",
                "(?i)no space left",
                InsightResult::Error("The device ran out of space".into()),
            )
            .expect("valid regex")
            .with_rule(
                "Timeouts",
                "timed out",
                InsightResult::Warn("Network timeouts occurred".into()),
            )
            .expect("valid regex");

        let chapter = Chapter::html(
            "Logs",
            concat!(
                "<p class=\"debug\">request timed out</p>\n",
                "<p class=\"error\"><span class=\"log-message\">write failed: No space left on device</span></p>\n",
            ),
        );
        let names: Vec<String> = provider
            .insights_for(&chapter)
            .iter()
            .map(|insight| insight.name().to_string())
            .collect();
        assert_eq!(names, ["Disk full"]);
    }

    #[test]
    fn error_pattern_provider_ignores_mappings() {
        let provider = ErrorPatternProvider::new()
            .with_rule("Any", ".*", InsightResult::Success("x".into()))
            .expect("valid regex");
        let chapter = Chapter::mapping("Info", Default::default());
        assert!(provider.insights_for(&chapter).is_empty());
    }
}
