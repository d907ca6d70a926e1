use super::{blocking, print_one, Context};
use crate::error::{Error, Result};
use crate::extract::{ExtractedDocument, PdfTextExtractor};
use crate::fileops::{self, DuplicateOptions, FileRenamer, RenameMode, Renamed};
use crate::lexicon::{Clock, FixedClock, MonthLexicon, MonthLocale, SystemClock};
use crate::models::FileOperationResult;
use std::path::Path;
use std::sync::Arc;

pub async fn extract(ctx: &Context, folder: &Path) -> Result<()> {
    let extractor = PdfTextExtractor::new(ctx.settings.extractor_options());
    let document = extractor.extract_all(folder).await?;
    print_one(ctx.json, &document, render_extraction)
}

fn render_extraction(document: &ExtractedDocument) -> String {
    if document.is_empty() {
        return format!("No PDF files found in {}", document.folder.display());
    }

    let mut out = Vec::with_capacity(document.len() + 1);
    for file in &document.files {
        match &file.result {
            Ok(text) => out.push(format!(
                "{}\t{} pages\t{} words",
                file.file_name, text.page_count, text.word_count
            )),
            Err(e) => out.push(format!("{}\tError extracting text: {}", file.file_name, e)),
        }
    }
    out.push(format!(
        "{} extracted, {} failed",
        document.successes().count(),
        document.failures().count()
    ));
    out.join("\n")
}

pub async fn duplicate(ctx: &Context, source: &Path, destination: &Path, verify: bool) -> Result<()> {
    let (source, destination) = (source.to_path_buf(), destination.to_path_buf());
    let summary = blocking(move || {
        fileops::duplicate(&source, &destination, DuplicateOptions { verify }).map_err(Error::from)
    })
    .await?;

    print_one(ctx.json, &summary, |s| {
        format!(
            "Copied {} files and {} folders ({} bytes) to {}{}",
            s.files_copied,
            s.directories_copied,
            s.bytes_copied,
            s.destination.display(),
            if s.verified { ", checksums verified" } else { "" }
        )
    })
}

pub async fn rename(
    ctx: &Context,
    folder: &Path,
    dry_run: bool,
    locale: Option<MonthLocale>,
    month: Option<u32>,
) -> Result<()> {
    let clock: Arc<dyn Clock> = match month {
        Some(m) => Arc::new(
            FixedClock::for_month(m)
                .ok_or_else(|| Error::input(format!("Month must be 1-12, got {}", m)))?,
        ),
        None => Arc::new(SystemClock),
    };
    let lexicon = MonthLexicon::new(locale.unwrap_or(ctx.settings.locale), clock);
    let renamer = FileRenamer::new(lexicon);
    let mode = if dry_run { RenameMode::DryRun } else { RenameMode::Apply };

    let folder = folder.to_path_buf();
    let results = blocking(move || renamer.rename_by_month(&folder, mode).map_err(Error::from)).await?;

    print_one(ctx.json, &results, |results| render_renames(results))
}

fn render_renames(results: &[FileOperationResult<Renamed>]) -> String {
    if results.is_empty() {
        return "No files found".to_string();
    }

    results
        .iter()
        .map(|result| match result {
            FileOperationResult::Success { detail, .. } if detail.from == detail.to => {
                format!("unchanged  {}", detail.from)
            }
            FileOperationResult::Success { detail, .. } if detail.applied => {
                format!("renamed    {} -> {}", detail.from, detail.to)
            }
            FileOperationResult::Success { detail, .. } => {
                format!("would rename {} -> {}", detail.from, detail.to)
            }
            FileOperationResult::Failure { path, reason } => format!(
                "skipped    {}: {}",
                path.file_name().unwrap_or_default().to_string_lossy(),
                reason
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
