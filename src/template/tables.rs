//! Dynamically sized activity tables.
//!
//! Two anchor styles are supported for `{titleActivities}` and
//! `{descriptionActivities}`:
//! - Table anchor: a row of an existing table contains the marker. That row
//!   is the template for every data row; header rows above it stay as they are.
//! - Paragraph anchor: a paragraph contains the marker. It is replaced by a
//!   generated table with a bold shaded header.

use super::markers::{expand_line_breaks, paragraph_text};
use super::TemplateError;
use docx_rs::{
    AlignmentType, DocumentChild, Paragraph, ParagraphChild, Run, Shading, Table, TableAlignmentType,
    TableCell, TableCellContent, TableChild, TableRow, TableRowChild, WidthType,
};
use serde::{Deserialize, Serialize};

/// Header fill of generated tables
const HEADER_FILL: &str = "F4F4F4";

/// Header and column widths (twentieths of a point) of a generated table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTable {
    pub headers: Vec<String>,
    pub widths: Vec<usize>,
}

impl GeneratedTable {
    pub fn title_default() -> Self {
        Self {
            headers: vec!["ACTIVIDADES".to_string(), "MESES".to_string()],
            // 4.5in / 1.5in
            widths: vec![6480, 2160],
        }
    }

    pub fn description_default() -> Self {
        Self {
            headers: vec![
                "Actividad Planificada".to_string(),
                "Actividad Ejecutada".to_string(),
                "Verificador".to_string(),
            ],
            // 2.5in / 3.0in / 1.5in
            widths: vec![3600, 4320, 2160],
        }
    }
}

/// Where an anchor was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnchorKind {
    Table,
    Paragraph,
}

/// Fill the anchor named `marker` with `rows`.
///
/// Returns `None` when the body has no anchor for it.
pub(crate) fn fill_anchor(
    children: &mut [DocumentChild],
    marker: &str,
    rows: &[Vec<String>],
    fields: usize,
    generated: &GeneratedTable,
) -> Result<Option<AnchorKind>, TemplateError> {
    let token = format!("{{{}}}", marker);

    for child in children.iter_mut() {
        match child {
            DocumentChild::Table(table) => {
                if let Some(index) = anchor_row(table, &token) {
                    fill_table_anchor(table, index, marker, rows, fields)?;
                    return Ok(Some(AnchorKind::Table));
                }
            }
            DocumentChild::Paragraph(paragraph) => {
                if paragraph_text(paragraph).contains(&token) {
                    *child = DocumentChild::Table(Box::new(generated_table(generated, rows)));
                    return Ok(Some(AnchorKind::Paragraph));
                }
            }
            _ => {}
        }
    }

    Ok(None)
}

/// Anchor kind for `marker` without modifying anything
pub(crate) fn locate_anchor(children: &[DocumentChild], marker: &str) -> Option<AnchorKind> {
    let token = format!("{{{}}}", marker);
    children.iter().find_map(|child| match child {
        DocumentChild::Table(table) => anchor_row(table, &token).map(|_| AnchorKind::Table),
        DocumentChild::Paragraph(p) if paragraph_text(p).contains(&token) => {
            Some(AnchorKind::Paragraph)
        }
        _ => None,
    })
}

fn row_text(row: &TableRow) -> String {
    let mut text = String::new();
    for cell in &row.cells {
        let TableRowChild::TableCell(cell) = cell;
        for content in &cell.children {
            if let TableCellContent::Paragraph(p) = content {
                text.push_str(&paragraph_text(p));
            }
        }
    }
    text
}

fn anchor_row(table: &Table, token: &str) -> Option<usize> {
    table.rows.iter().position(|row| {
        let TableChild::TableRow(row) = row;
        row_text(row).contains(token)
    })
}

fn fill_table_anchor(
    table: &mut Table,
    index: usize,
    marker: &str,
    rows: &[Vec<String>],
    fields: usize,
) -> Result<(), TemplateError> {
    let TableChild::TableRow(template) = &table.rows[index];
    if template.cells.len() < fields {
        return Err(TemplateError::TableShape {
            marker: marker.to_string(),
            expected: fields,
            found: template.cells.len(),
        });
    }

    let TableChild::TableRow(template) = table.rows.remove(index);
    for (offset, record) in rows.iter().enumerate() {
        let row = fill_row(&template, record);
        table.rows.insert(index + offset, TableChild::TableRow(row));
    }

    tracing::debug!(
        "[TemplateEngine] {} rows inserted at table anchor {}",
        rows.len(),
        marker
    );
    Ok(())
}

/// Clone the template row with cell k holding field k
fn fill_row(template: &TableRow, record: &[String]) -> TableRow {
    let mut row = template.clone();
    for (k, cell) in row.cells.iter_mut().enumerate() {
        let TableRowChild::TableCell(cell) = cell;
        let value = record.get(k).map(String::as_str).unwrap_or_default();

        let first_paragraph = cell.children.iter().find_map(|c| match c {
            TableCellContent::Paragraph(p) => Some(p),
            _ => None,
        });
        let mut paragraph = Paragraph::new();
        let mut run = Run::new().add_text(value);
        if let Some(source) = first_paragraph {
            paragraph.property = source.property.clone();
            if let Some(style) = source.children.iter().find_map(|c| match c {
                ParagraphChild::Run(r) => Some(r.run_property.clone()),
                _ => None,
            }) {
                run.run_property = style;
            }
        }
        paragraph = paragraph.add_run(run);
        expand_line_breaks(&mut paragraph);
        cell.children = vec![TableCellContent::Paragraph(Box::new(paragraph))];
    }
    row
}

fn generated_table(layout: &GeneratedTable, rows: &[Vec<String>]) -> Table {
    let header = TableRow::new(
        layout.headers
            .iter()
            .enumerate()
            .map(|(k, title)| {
                let paragraph = Paragraph::new()
                    .add_run(Run::new().add_text(title).bold())
                    .align(AlignmentType::Center);
                sized(
                    TableCell::new()
                        .add_paragraph(paragraph)
                        .shading(Shading::new().fill(HEADER_FILL)),
                    layout.widths.get(k),
                )
            })
            .collect(),
    );

    let mut table_rows = vec![header];
    for record in rows {
        let cells = (0..layout.headers.len())
            .map(|k| {
                let value = record.get(k).map(String::as_str).unwrap_or_default();
                let mut paragraph = Paragraph::new().add_run(Run::new().add_text(value));
                expand_line_breaks(&mut paragraph);
                sized(TableCell::new().add_paragraph(paragraph), layout.widths.get(k))
            })
            .collect();
        table_rows.push(TableRow::new(cells));
    }

    Table::new(table_rows)
        .set_grid(layout.widths.clone())
        .align(TableAlignmentType::Center)
}

fn sized(cell: TableCell, width: Option<&usize>) -> TableCell {
    match width {
        Some(w) => cell.width(*w, WidthType::Dxa),
        None => cell,
    }
}
