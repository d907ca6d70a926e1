//! Marker scanning and run-aware scalar substitution.
//!
//! Word splits text into runs wherever formatting, spell-check state or edit
//! history changes, so `{month}` is often stored as `{`, `mon`, `th}` across
//! three runs. Substitution works on the concatenated text of a paragraph and
//! maps each match back onto the run texts: the run holding the opening brace
//! receives the value (keeping its formatting), the covered parts of the
//! following runs are emptied.

use docx_rs::{
    AlignmentType, Break, BreakType, DocumentChild, Paragraph, ParagraphChild, RunChild, Table,
    TableCellContent, TableChild, TableRowChild, Text,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z][A-Za-z0-9_]*)\}").expect("valid marker regex"));

/// Call `f` on every paragraph of the body, including table cells at any depth
pub(crate) fn visit_paragraphs<F>(children: &mut [DocumentChild], f: &mut F)
where
    F: FnMut(&mut Paragraph),
{
    for child in children.iter_mut() {
        match child {
            DocumentChild::Paragraph(paragraph) => f(paragraph.as_mut()),
            DocumentChild::Table(table) => visit_table(table, f),
            _ => {}
        }
    }
}

fn visit_table<F>(table: &mut Table, f: &mut F)
where
    F: FnMut(&mut Paragraph),
{
    for row in table.rows.iter_mut() {
        let TableChild::TableRow(row) = row;
        for cell in row.cells.iter_mut() {
            let TableRowChild::TableCell(cell) = cell;
            for content in cell.children.iter_mut() {
                match content {
                    TableCellContent::Paragraph(paragraph) => f(paragraph),
                    TableCellContent::Table(nested) => visit_table(nested, f),
                    _ => {}
                }
            }
        }
    }
}

/// Plain text of a paragraph, runs and hyperlinks concatenated
pub(crate) fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_text(&paragraph.children, &mut text);
    text
}

fn push_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    if let RunChild::Text(t) = run_child {
                        out.push_str(&t.text);
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_text(&link.children, out),
            _ => {}
        }
    }
}

/// Text nodes of a paragraph in document order
fn collect_texts<'a>(children: &'a mut [ParagraphChild], out: &mut Vec<&'a mut Text>) {
    for child in children.iter_mut() {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in run.children.iter_mut() {
                    if let RunChild::Text(t) = run_child {
                        out.push(t);
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => collect_texts(&mut link.children, out),
            _ => {}
        }
    }
}

/// Replace every supplied `{name}` in one paragraph.
///
/// Returns the names replaced, once per occurrence.
pub(crate) fn replace_in_paragraph(
    paragraph: &mut Paragraph,
    values: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut texts = Vec::new();
    collect_texts(&mut paragraph.children, &mut texts);
    if texts.is_empty() {
        return Vec::new();
    }

    let mut starts = Vec::with_capacity(texts.len());
    let mut joined = String::new();
    for t in texts.iter() {
        starts.push(joined.len());
        joined.push_str(&t.text);
    }

    let mut matches: Vec<(usize, usize, &str)> = Vec::new();
    for (name, _) in values.iter() {
        let marker = format!("{{{}}}", name);
        for (pos, _) in joined.match_indices(&marker) {
            matches.push((pos, pos + marker.len(), name.as_str()));
        }
    }
    if matches.is_empty() {
        return Vec::new();
    }
    matches.sort_by_key(|m| m.0);

    let mut accepted: Vec<(usize, usize, &str)> = Vec::with_capacity(matches.len());
    for m in matches {
        if accepted.last().map_or(true, |last| m.0 >= last.1) {
            accepted.push(m);
        }
    }

    // Back to front so earlier offsets stay valid
    for &(start, end, name) in accepted.iter().rev() {
        let value = values.get(name).map(String::as_str).unwrap_or_default();
        let first = node_at(&starts, start);
        let last = node_at(&starts, end - 1);

        if first == last {
            let base = starts[first];
            texts[first].text.replace_range(start - base..end - base, value);
        } else {
            let tail_end = end - starts[last];
            texts[last].text.replace_range(..tail_end, "");
            for node in texts.iter_mut().take(last).skip(first + 1) {
                node.text.clear();
            }
            let head_start = start - starts[first];
            texts[first].text.replace_range(head_start.., value);
        }
    }

    for t in texts.iter_mut() {
        t.preserve_space = true;
    }

    let replaced: Vec<String> = accepted.iter().map(|m| m.2.to_string()).collect();
    expand_line_breaks(paragraph);
    replaced
}

/// Index of the text node containing byte `offset`
fn node_at(starts: &[usize], offset: usize) -> usize {
    match starts.binary_search(&offset) {
        // Empty nodes share a start with the next one; take the last
        Ok(mut i) => {
            while i + 1 < starts.len() && starts[i + 1] == offset {
                i += 1;
            }
            i
        }
        Err(i) => i - 1,
    }
}

/// Turn `\n` inside run text into Word line breaks
pub(crate) fn expand_line_breaks(paragraph: &mut Paragraph) {
    for child in paragraph.children.iter_mut() {
        let ParagraphChild::Run(run) = child else {
            continue;
        };
        let has_newline = run
            .children
            .iter()
            .any(|c| matches!(c, RunChild::Text(t) if t.text.contains('\n')));
        if !has_newline {
            continue;
        }

        let old = std::mem::take(&mut run.children);
        for run_child in old {
            match run_child {
                RunChild::Text(t) if t.text.contains('\n') => {
                    for (i, line) in t.text.split('\n').enumerate() {
                        if i > 0 {
                            run.children
                                .push(RunChild::Break(Break::new(BreakType::TextWrapping)));
                        }
                        run.children
                            .push(RunChild::Text(Text::new(line.trim_end_matches('\r'))));
                    }
                }
                other => run.children.push(other),
            }
        }
    }
}

/// Substitute scalars across the whole body.
///
/// Returns how many times each name was replaced. Paragraphs that received
/// one of `justified` are set to justified alignment.
pub(crate) fn replace_scalars(
    children: &mut [DocumentChild],
    values: &BTreeMap<String, String>,
    justified: &BTreeSet<String>,
) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    if values.is_empty() {
        return counts;
    }

    visit_paragraphs(children, &mut |paragraph: &mut Paragraph| {
        let replaced = replace_in_paragraph(paragraph, values);
        if replaced.is_empty() {
            return;
        }
        let justify = replaced.iter().any(|name| justified.contains(name));
        for name in replaced {
            *counts.entry(name).or_default() += 1;
        }
        if justify {
            let taken = std::mem::replace(paragraph, Paragraph::new());
            *paragraph = taken.align(AlignmentType::Both);
        }
    });

    counts
}

/// Marker names still present in the body, sorted and deduplicated
pub(crate) fn find_markers(children: &mut [DocumentChild]) -> Vec<String> {
    let mut names = BTreeSet::new();
    visit_paragraphs(children, &mut |paragraph: &mut Paragraph| {
        let text = paragraph_text(paragraph);
        for caps in MARKER_RE.captures_iter(&text) {
            names.insert(caps[1].to_string());
        }
    });
    names.into_iter().collect()
}
