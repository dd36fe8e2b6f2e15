// SPDX-License-Identifier: MPL-2.0
//! The "Smart Insights" chapter.

use std::collections::BTreeMap;

use futures_util::future::join_all;

use super::chapter::Chapter;
use super::insight::{DeviceStorageInsight, Insight, InsightResult};
use crate::config;
use crate::domain::diagnostics::InsightTimeout;

/// Evaluates insights concurrently and renders them as a mapping.
///
/// Insights that time out or return `None` are skipped. When several
/// insights share a name, the one registered last wins.
pub struct InsightsReporter {
    insights: Vec<Box<dyn Insight>>,
    timeout: InsightTimeout,
}

impl InsightsReporter {
    /// Reporter without any insight.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            insights: Vec::new(),
            timeout: InsightTimeout::default(),
        }
    }

    /// Reporter seeded with the default insights.
    #[must_use]
    pub fn new() -> Self {
        Self::empty().with_insight(DeviceStorageInsight::new())
    }

    #[must_use]
    pub fn with_insight(mut self, insight: impl Insight + 'static) -> Self {
        self.insights.push(Box::new(insight));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: InsightTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Appends insights derived elsewhere, e.g. from chapter content.
    pub fn extend(&mut self, insights: impl IntoIterator<Item = Box<dyn Insight>>) {
        self.insights.extend(insights);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.insights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    /// Evaluates every insight and merges the results by name.
    pub async fn evaluate(&self) -> BTreeMap<String, InsightResult> {
        let limit = self.timeout.as_duration();
        let evaluations = self.insights.iter().map(|insight| async move {
            let outcome = tokio::time::timeout(limit, insight.evaluate()).await;
            if outcome.is_err() {
                tracing::info!(
                    insight = insight.name(),
                    timeout_ms = self.timeout.millis(),
                    "Insight timed out"
                );
            }
            (insight.name().to_string(), outcome.ok().flatten())
        });

        let mut results = BTreeMap::new();
        for (name, result) in join_all(evaluations).await {
            if let Some(result) = result {
                results.insert(name, result);
            }
        }
        results
    }

    /// Renders the chapter.
    pub async fn report(&self) -> Chapter {
        let mapping = self
            .evaluate()
            .await
            .into_iter()
            .map(|(name, result)| (name, result.display_message()))
            .collect();
        Chapter::mapping(config::INSIGHTS_CHAPTER_TITLE, mapping)
    }
}

impl Default for InsightsReporter {
    fn default() -> Self {
        Self::new()
    }
}
