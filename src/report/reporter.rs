// SPDX-License-Identifier: MPL-2.0
//! Chapter producers.

use async_trait::async_trait;

use super::chapter::Chapter;
use super::insights_reporter::InsightsReporter;
use super::ReporterError;
use crate::report::html;
use crate::system_info::SystemInfo;

/// Produces one chapter from some data source.
///
/// Reporters may be invoked repeatedly and share no state with each other.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn report(&self) -> Result<Chapter, ReporterError>;
}

/// One slot in the ordered list handed to the compiler.
///
/// The insights reporter is a distinct variant because it is evaluated last
/// but rendered at its own position.
pub enum Section {
    Reporter(Box<dyn Reporter>),
    Insights(InsightsReporter),
}

impl Section {
    pub fn reporter(reporter: impl Reporter + 'static) -> Self {
        Self::Reporter(Box::new(reporter))
    }

    #[must_use]
    pub fn insights(reporter: InsightsReporter) -> Self {
        Self::Insights(reporter)
    }
}

impl From<InsightsReporter> for Section {
    fn from(reporter: InsightsReporter) -> Self {
        Self::Insights(reporter)
    }
}

/// Free-form information chapter, titled "Information" by default.
#[derive(Debug, Clone)]
pub struct GeneralInfoReporter {
    title: String,
    description: String,
}

impl GeneralInfoReporter {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            title: "Information".to_string(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Default for GeneralInfoReporter {
    fn default() -> Self {
        Self::new(concat!(
            "This report contains the logs, system metadata and insights ",
            "collected to help diagnose a problem. ",
            "Use the checkboxes to toggle log categories and the filter box to search."
        ))
    }
}

#[async_trait]
impl Reporter for GeneralInfoReporter {
    async fn report(&self) -> Result<Chapter, ReporterError> {
        Ok(Chapter::html(
            self.title.clone(),
            format!("<p>{}</p>", html::escape_multiline(&self.description)),
        ))
    }
}

/// Key/value chapter of app and system metadata.
#[derive(Debug, Clone)]
pub struct SystemMetadataReporter {
    app_name: String,
    app_version: String,
}

impl SystemMetadataReporter {
    /// `app_name` and `app_version` identify the host application.
    #[must_use]
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
        }
    }
}

#[async_trait]
impl Reporter for SystemMetadataReporter {
    async fn report(&self) -> Result<Chapter, ReporterError> {
        let info = tokio::task::spawn_blocking(SystemInfo::collect)
            .await
            .map_err(|err| ReporterError::Unavailable(err.to_string()))?;
        Ok(Chapter::mapping(
            "System metadata",
            info.to_mapping(&self.app_name, &self.app_version),
        ))
    }
}
