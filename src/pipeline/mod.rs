//! Report Pipeline
//!
//! Sequencing only: extraction output becomes the payload the drafting agent
//! reads, and the content the agent produces is mapped onto a render request
//! for the template engine. No step here interprets document text.

mod prompts;

pub use prompts::build_report_prompt;

use crate::error::PathError;
use crate::extract::PdfTextExtractor;
use crate::models::{ActivityDescriptionRow, ActivityTitleRow};
use crate::template::{RenderRequest, RenderSummary, TemplateEngine, TemplateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Filename → extracted text, or an error line for files that failed
pub type SourcePayload = BTreeMap<String, String>;

/// Content drafted for one monthly report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportContent {
    #[serde(alias = "mes")]
    pub month: Option<String>,
    #[serde(alias = "actividades")]
    pub activities: Option<String>,
    #[serde(alias = "conclusiones")]
    pub conclusions: Option<String>,
    #[serde(alias = "recomendaciones")]
    pub recommendations: Option<String>,
    #[serde(alias = "title_activities")]
    pub title_activities: Option<Vec<ActivityTitleRow>>,
    #[serde(alias = "description_activities")]
    pub description_activities: Option<Vec<ActivityDescriptionRow>>,
}

impl ReportContent {
    /// Render request that writes the report over `template` unless `output` is set
    pub fn into_request(self, template: &Path, output: Option<PathBuf>) -> RenderRequest {
        let scalars = [
            ("month", self.month),
            ("activities", self.activities),
            ("conclusions", self.conclusions),
            ("recommendations", self.recommendations),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect();

        RenderRequest {
            template: template.to_path_buf(),
            output,
            scalars,
            title_rows: self.title_activities,
            description_rows: self.description_activities,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportPipeline {
    extractor: PdfTextExtractor,
    engine: TemplateEngine,
}

impl ReportPipeline {
    pub fn new(extractor: PdfTextExtractor, engine: TemplateEngine) -> Self {
        Self { extractor, engine }
    }

    /// Extract every PDF in `folder` into the agent payload
    pub async fn collect_sources(&self, folder: &Path) -> Result<SourcePayload, PathError> {
        let document = self.extractor.extract_all(folder).await?;

        let payload: SourcePayload = document
            .files
            .into_iter()
            .map(|file| {
                let text = match file.result {
                    Ok(extracted) => extracted.text,
                    Err(e) => format!("Error extracting text: {}", e),
                };
                (file.file_name, text)
            })
            .collect();

        tracing::info!("[ReportPipeline] Collected {} sources", payload.len());
        Ok(payload)
    }

    pub fn build_prompt(&self, report_path: &Path, folder_path: &Path) -> String {
        build_report_prompt(report_path, folder_path)
    }

    /// Write `content` into the report at `report_path`
    pub fn materialize(
        &self,
        report_path: &Path,
        content: ReportContent,
        output: Option<PathBuf>,
    ) -> Result<RenderSummary, TemplateError> {
        let request = content.into_request(report_path, output);
        self.engine.render(&request)
    }
}
