//! Document Template Engine
//!
//! Renders a DOCX template: scalar `{name}` markers are replaced in body
//! paragraphs and table cells, the `{titleActivities}` and
//! `{descriptionActivities}` anchors are expanded into activity tables, and
//! the result is written through a staging file so the destination is
//! replaced only by a complete document.
//!
//! Order of work: scalars first, then tables, then the unresolved-marker scan.

mod markers;
mod tables;

pub use tables::{AnchorKind, GeneratedTable};

#[cfg(test)]
pub(crate) use markers::paragraph_text;

use crate::fileops::staging::StagedPath;
use crate::models::{ActivityDescriptionRow, ActivityTitleRow};
use docx_rs::Docx;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Anchor marker for the activities summary table
pub const TITLE_ANCHOR: &str = "titleActivities";

/// Anchor marker for the planned/executed/verifier table
pub const DESCRIPTION_ANCHOR: &str = "descriptionActivities";

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateError {
    #[error("Template not found: {}", .path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("Unsupported template format: {} (only .docx files are accepted)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Template could not be read as DOCX: {message}")]
    TemplateUnreadable { path: PathBuf, message: String },

    #[error("No anchor for {{{marker}}} in template, rows cannot be inserted")]
    AnchorNotFound { marker: String },

    #[error("Anchor row for {{{marker}}} has {found} cells but {expected} are needed")]
    TableShape {
        marker: String,
        expected: usize,
        found: usize,
    },

    #[error("Failed to write document: {message}")]
    #[serde(rename = "WRITE_ERROR")]
    Write { path: PathBuf, message: String },
}

/// Everything needed for one render
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub template: PathBuf,
    /// Destination; defaults to overwriting the template
    pub output: Option<PathBuf>,
    pub scalars: BTreeMap<String, String>,
    /// `None` leaves the title anchor untouched
    pub title_rows: Option<Vec<ActivityTitleRow>>,
    /// `None` leaves the description anchor untouched
    pub description_rows: Option<Vec<ActivityDescriptionRow>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSummary {
    pub output: PathBuf,
    /// Replacement count per scalar marker
    pub scalars_replaced: BTreeMap<String, usize>,
    pub title_rows_inserted: usize,
    pub description_rows_inserted: usize,
    /// Markers still in the document after rendering
    pub unresolved_markers: Vec<String>,
}

/// Markers and anchors found in a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInspection {
    pub path: PathBuf,
    pub markers: Vec<String>,
    pub title_anchor: Option<AnchorKind>,
    pub description_anchor: Option<AnchorKind>,
}

#[derive(Debug, Clone)]
pub struct TemplateOptions {
    /// Markers whose paragraphs are justified after substitution
    pub justified_markers: BTreeSet<String>,
    pub title_table: GeneratedTable,
    pub description_table: GeneratedTable,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            justified_markers: ["activities", "conclusions", "recommendations"]
                .into_iter()
                .map(String::from)
                .collect(),
            title_table: GeneratedTable::title_default(),
            description_table: GeneratedTable::description_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    options: TemplateOptions,
}

impl TemplateEngine {
    pub fn new(options: TemplateOptions) -> Self {
        Self { options }
    }

    pub fn render(&self, request: &RenderRequest) -> Result<RenderSummary, TemplateError> {
        let mut docx = load_template(&request.template)?;
        let output = request
            .output
            .clone()
            .unwrap_or_else(|| request.template.clone());

        tracing::info!(
            "[TemplateEngine] Rendering {} -> {}",
            request.template.display(),
            output.display()
        );

        let body = &mut docx.document.children;
        let scalars_replaced =
            markers::replace_scalars(body, &request.scalars, &self.options.justified_markers);

        let title_rows_inserted = match &request.title_rows {
            Some(rows) => {
                let records: Vec<Vec<String>> = rows
                    .iter()
                    .map(|r| r.cells().into_iter().map(String::from).collect())
                    .collect();
                self.fill(body, TITLE_ANCHOR, &records, 2, &self.options.title_table)?
            }
            None => 0,
        };

        let description_rows_inserted = match &request.description_rows {
            Some(rows) => {
                let records: Vec<Vec<String>> = rows
                    .iter()
                    .map(|r| r.cells().into_iter().map(String::from).collect())
                    .collect();
                self.fill(body, DESCRIPTION_ANCHOR, &records, 3, &self.options.description_table)?
            }
            None => 0,
        };

        let unresolved_markers = markers::find_markers(body);
        if !unresolved_markers.is_empty() {
            tracing::debug!("[TemplateEngine] Unresolved markers: {:?}", unresolved_markers);
        }

        write_docx(docx, &output)?;

        let summary = RenderSummary {
            output,
            scalars_replaced,
            title_rows_inserted,
            description_rows_inserted,
            unresolved_markers,
        };
        tracing::info!(
            "[TemplateEngine] Done: {} scalar markers, {} + {} table rows",
            summary.scalars_replaced.values().sum::<usize>(),
            summary.title_rows_inserted,
            summary.description_rows_inserted
        );
        Ok(summary)
    }

    fn fill(
        &self,
        body: &mut [docx_rs::DocumentChild],
        marker: &str,
        records: &[Vec<String>],
        fields: usize,
        generated: &GeneratedTable,
    ) -> Result<usize, TemplateError> {
        match tables::fill_anchor(body, marker, records, fields, generated)? {
            Some(_) => Ok(records.len()),
            None if records.is_empty() => Ok(0),
            None => Err(TemplateError::AnchorNotFound {
                marker: marker.to_string(),
            }),
        }
    }

    /// List the markers and anchors of a template without rendering it
    pub fn inspect(&self, template: &Path) -> Result<TemplateInspection, TemplateError> {
        let mut docx = load_template(template)?;
        let body = &mut docx.document.children;

        Ok(TemplateInspection {
            path: template.to_path_buf(),
            title_anchor: tables::locate_anchor(body, TITLE_ANCHOR),
            description_anchor: tables::locate_anchor(body, DESCRIPTION_ANCHOR),
            markers: markers::find_markers(body),
        })
    }
}

fn load_template(path: &Path) -> Result<Docx, TemplateError> {
    if !path.is_file() {
        return Err(TemplateError::TemplateNotFound {
            path: path.to_path_buf(),
        });
    }

    let is_docx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));
    if !is_docx {
        return Err(TemplateError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| TemplateError::TemplateUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    docx_rs::read_docx(&bytes).map_err(|e| TemplateError::TemplateUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_docx(docx: Docx, output: &Path) -> Result<(), TemplateError> {
    let write_err = |message: String| TemplateError::Write {
        path: output.to_path_buf(),
        message,
    };

    // Keep the mode of the document being replaced
    let permissions = fs::metadata(output).ok().map(|meta| meta.permissions());

    let staged = StagedPath::beside(output);
    let mut file = File::create(staged.path())
        .map_err(|e| write_err(format!("Failed to create staging file: {}", e)))?;
    docx.build()
        .pack(&mut file)
        .map_err(|e| write_err(format!("Failed to pack DOCX: {}", e)))?;
    file.sync_all()
        .map_err(|e| write_err(format!("Failed to sync staging file: {}", e)))?;
    drop(file);

    if let Some(permissions) = permissions {
        fs::set_permissions(staged.path(), permissions)
            .map_err(|e| write_err(format!("Failed to copy permissions: {}", e)))?;
    }

    staged
        .commit(output)
        .map_err(|e| write_err(format!("Failed to replace {}: {}", output.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{docx_body_text, write_docx_fixture};
    use docx_rs::{Paragraph, Run, Table, TableCell, TableRow};
    use tempfile::tempdir;

    fn para(text: &str) -> Paragraph {
        Paragraph::new().add_run(Run::new().add_text(text))
    }

    fn cell(text: &str) -> TableCell {
        TableCell::new().add_paragraph(para(text))
    }

    fn report_template(path: &Path) {
        let docx = Docx::new()
            .add_paragraph(para("INFORME DEL MES DE {month}"))
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("{activi"))
                    .add_run(Run::new().add_text("ties}")),
            )
            .add_table(Table::new(vec![
                TableRow::new(vec![cell("ACTIVIDADES"), cell("MESES")]),
                TableRow::new(vec![cell("{titleActivities}"), cell("")]),
            ]))
            .add_paragraph(para("{descriptionActivities}"))
            .add_paragraph(para("Conclusiones: {conclusions}"))
            .add_paragraph(para("Firma: {signature}"));
        write_docx_fixture(path, docx);
    }

    fn request(template: &Path, output: Option<PathBuf>) -> RenderRequest {
        RenderRequest {
            template: template.to_path_buf(),
            output,
            scalars: [
                ("month", "ABRIL"),
                ("activities", "Se realizaron talleres."),
                ("conclusions", "Todo en orden."),
                ("neverUsed", "x"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            title_rows: Some(vec![
                ActivityTitleRow {
                    activity: "Taller de seguridad".to_string(),
                    month: "Abril".to_string(),
                },
                ActivityTitleRow {
                    activity: "Visita técnica".to_string(),
                    month: "Abril".to_string(),
                },
            ]),
            description_rows: Some(vec![ActivityDescriptionRow {
                activity: "Taller".to_string(),
                description: "Se dictó el taller".to_string(),
                verifier: "Lista de asistencia".to_string(),
            }]),
        }
    }

    #[test]
    fn test_render_fills_scalars_and_tables() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("plantilla.docx");
        let output = dir.path().join("informe.docx");
        report_template(&template);

        let summary = TemplateEngine::default()
            .render(&request(&template, Some(output.clone())))
            .unwrap();

        assert_eq!(summary.scalars_replaced.get("month"), Some(&1));
        assert_eq!(summary.scalars_replaced.get("activities"), Some(&1));
        assert_eq!(summary.scalars_replaced.get("neverUsed"), None);
        assert_eq!(summary.title_rows_inserted, 2);
        assert_eq!(summary.description_rows_inserted, 1);
        assert_eq!(summary.unresolved_markers, vec!["signature"]);

        let text = docx_body_text(&output);
        assert!(text.contains("INFORME DEL MES DE ABRIL"));
        assert!(text.contains("Se realizaron talleres."));
        assert!(text.contains("Taller de seguridad | Abril"));
        assert!(text.contains("Visita técnica | Abril"));
        assert!(text.contains("Actividad Planificada | Actividad Ejecutada | Verificador"));
        assert!(text.contains("Taller | Se dictó el taller | Lista de asistencia"));
        assert!(!text.contains("{titleActivities}"));

        // Template untouched when an output path is given
        assert!(docx_body_text(&template).contains("{month}"));
    }

    #[test]
    fn test_render_defaults_to_template_in_place() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("informe.docx");
        report_template(&template);

        let summary = TemplateEngine::default().render(&request(&template, None)).unwrap();

        assert_eq!(summary.output, template);
        assert!(docx_body_text(&template).contains("ABRIL"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_render_twice_is_deterministic() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("t.docx");
        report_template(&template);

        let engine = TemplateEngine::default();
        let a = dir.path().join("a.docx");
        let b = dir.path().join("b.docx");
        engine.render(&request(&template, Some(a.clone()))).unwrap();
        engine.render(&request(&template, Some(b.clone()))).unwrap();

        assert_eq!(docx_body_text(&a), docx_body_text(&b));
    }

    #[test]
    fn test_missing_anchor_fails_without_writing() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("plain.docx");
        write_docx_fixture(&template, Docx::new().add_paragraph(para("{month}")));
        let before = std::fs::read(&template).unwrap();

        let err = TemplateEngine::default().render(&request(&template, None)).unwrap_err();

        assert_eq!(
            err,
            TemplateError::AnchorNotFound {
                marker: TITLE_ANCHOR.to_string()
            }
        );
        assert_eq!(std::fs::read(&template).unwrap(), before);
    }

    #[test]
    fn test_empty_rows_without_anchor_are_fine() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("plain.docx");
        write_docx_fixture(&template, Docx::new().add_paragraph(para("{month}")));

        let mut req = request(&template, None);
        req.title_rows = Some(Vec::new());
        req.description_rows = None;
        let summary = TemplateEngine::default().render(&req).unwrap();
        assert_eq!(summary.title_rows_inserted, 0);
        assert!(summary.unresolved_markers.is_empty());
    }

    #[test]
    fn test_template_errors() {
        let dir = tempdir().unwrap();
        let engine = TemplateEngine::default();

        let missing = engine.render(&request(&dir.path().join("nope.docx"), None));
        assert!(matches!(missing, Err(TemplateError::TemplateNotFound { .. })));

        let legacy = dir.path().join("old.doc");
        std::fs::write(&legacy, b"binary").unwrap();
        let unsupported = engine.render(&request(&legacy, None));
        assert!(matches!(unsupported, Err(TemplateError::UnsupportedFormat { .. })));

        let fake = dir.path().join("fake.docx");
        std::fs::write(&fake, b"not a zip").unwrap();
        let unreadable = engine.render(&request(&fake, None));
        assert!(matches!(unreadable, Err(TemplateError::TemplateUnreadable { .. })));
    }

    fn title_rows(pairs: &[(&str, &str)]) -> Vec<ActivityTitleRow> {
        pairs
            .iter()
            .map(|(activity, month)| ActivityTitleRow {
                activity: activity.to_string(),
                month: month.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_render_table_anchor_row_counts() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("tabla.docx");
        write_docx_fixture(
            &template,
            Docx::new().add_table(Table::new(vec![
                TableRow::new(vec![cell("ACTIVIDADES"), cell("MESES")]),
                TableRow::new(vec![cell("{titleActivities}"), cell("")]),
            ])),
        );
        let engine = TemplateEngine::default();

        let empty = dir.path().join("vacio.docx");
        let summary = engine
            .render(&RenderRequest {
                template: template.clone(),
                output: Some(empty.clone()),
                title_rows: Some(Vec::new()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(summary.title_rows_inserted, 0);
        assert_eq!(docx_body_text(&empty), "ACTIVIDADES | MESES");

        let filled = dir.path().join("lleno.docx");
        let summary = engine
            .render(&RenderRequest {
                template: template.clone(),
                output: Some(filled.clone()),
                title_rows: Some(title_rows(&[("Taller", "Abril"), ("Visita", "Mayo")])),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(summary.title_rows_inserted, 2);
        let lines: Vec<String> = docx_body_text(&filled).lines().map(String::from).collect();
        assert_eq!(
            lines,
            vec!["ACTIVIDADES | MESES", "Taller | Abril", "Visita | Mayo"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_render_in_place_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let template = dir.path().join("informe.docx");
        report_template(&template);
        fs::set_permissions(&template, fs::Permissions::from_mode(0o640)).unwrap();

        TemplateEngine::default().render(&request(&template, None)).unwrap();

        let mode = fs::metadata(&template).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert!(docx_body_text(&template).contains("ABRIL"));
    }

    #[test]
    fn test_inspect_lists_markers_and_anchors() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("t.docx");
        report_template(&template);

        let inspection = TemplateEngine::default().inspect(&template).unwrap();
        assert_eq!(inspection.title_anchor, Some(AnchorKind::Table));
        assert_eq!(inspection.description_anchor, Some(AnchorKind::Paragraph));
        assert!(inspection.markers.contains(&"month".to_string()));
        assert!(inspection.markers.contains(&"activities".to_string()));
    }
}
