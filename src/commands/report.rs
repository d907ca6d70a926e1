use super::documents::{read_json, render_summary};
use super::{blocking, print_one, Context};
use crate::error::{Error, Result};
use crate::extract::PdfTextExtractor;
use crate::pipeline::{ReportContent, ReportPipeline};
use crate::template::TemplateEngine;
use crate::weather;
use serde::Serialize;
use std::path::{Path, PathBuf};

fn pipeline(ctx: &Context) -> ReportPipeline {
    ReportPipeline::new(
        PdfTextExtractor::new(ctx.settings.extractor_options()),
        TemplateEngine::new(ctx.settings.template_options()),
    )
}

pub async fn report(
    ctx: &Context,
    report: &Path,
    content: &Path,
    output: Option<PathBuf>,
) -> Result<()> {
    let content: ReportContent = read_json(content)?;
    let pipeline = pipeline(ctx);
    let report = report.to_path_buf();

    let summary =
        blocking(move || pipeline.materialize(&report, content, output).map_err(Error::from)).await?;
    print_one(ctx.json, &summary, render_summary)
}

pub async fn sources(ctx: &Context, folder: &Path) -> Result<()> {
    let payload = pipeline(ctx).collect_sources(folder).await?;
    print_one(ctx.json, &payload, |p| {
        if p.is_empty() {
            return format!("No PDF files found in {}", folder.display());
        }
        p.iter()
            .map(|(name, text)| format!("== {} ==\n{}", name, text))
            .collect::<Vec<_>>()
            .join("\n\n")
    })
}

#[derive(Serialize)]
struct PromptOut {
    prompt: String,
}

pub fn prompt(ctx: &Context, report: &Path, folder: &Path) -> Result<()> {
    let out = PromptOut {
        prompt: pipeline(ctx).build_prompt(report, folder),
    };
    print_one(ctx.json, &out, |p| p.prompt.clone())
}

pub async fn weather(ctx: &Context, location: &str) -> Result<()> {
    let body = weather::fetch_point(location).await?;
    print_one(ctx.json, &body, |b| {
        serde_json::to_string_pretty(b).unwrap_or_else(|_| b.to_string())
    })
}
