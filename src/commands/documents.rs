use super::{blocking, print_one, Context};
use crate::error::{Error, Result};
use crate::pipeline::ReportContent;
use crate::template::{RenderSummary, TemplateEngine};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub async fn render(
    ctx: &Context,
    template: &Path,
    content: &Path,
    output: Option<PathBuf>,
) -> Result<()> {
    let content: ReportContent = read_json(content)?;
    let request = content.into_request(template, output);
    let engine = TemplateEngine::new(ctx.settings.template_options());

    let summary = blocking(move || engine.render(&request).map_err(Error::from)).await?;
    print_one(ctx.json, &summary, render_summary)
}

pub async fn inspect(ctx: &Context, template: &Path) -> Result<()> {
    let engine = TemplateEngine::new(ctx.settings.template_options());
    let template = template.to_path_buf();
    let inspection = blocking(move || engine.inspect(&template).map_err(Error::from)).await?;

    print_one(ctx.json, &inspection, |i| {
        let anchor = |a: Option<crate::template::AnchorKind>| match a {
            Some(kind) => format!("{:?}", kind).to_lowercase(),
            None => "none".to_string(),
        };
        let mut lines = vec![format!("{}", i.path.display())];
        if i.markers.is_empty() {
            lines.push("  no markers".to_string());
        }
        for marker in &i.markers {
            lines.push(format!("  {{{}}}", marker));
        }
        lines.push(format!("  title anchor: {}", anchor(i.title_anchor)));
        lines.push(format!("  description anchor: {}", anchor(i.description_anchor)));
        lines.join("\n")
    })
}

pub(crate) fn render_summary(summary: &RenderSummary) -> String {
    let replaced: usize = summary.scalars_replaced.values().sum();
    let mut text = format!(
        "Wrote {}: {} markers replaced, {} title rows, {} description rows",
        summary.output.display(),
        replaced,
        summary.title_rows_inserted,
        summary.description_rows_inserted
    );
    if !summary.unresolved_markers.is_empty() {
        let names: Vec<String> = summary
            .unresolved_markers
            .iter()
            .map(|m| format!("{{{}}}", m))
            .collect();
        text.push_str(&format!("\nUnresolved markers: {}", names.join(", ")));
    }
    text
}

/// Read and parse a JSON file given on the command line
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::input(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&raw)?)
}
