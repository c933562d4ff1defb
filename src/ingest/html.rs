//! # HTML Step Parser / HTML 步骤解析器
//!
//! Extracts per-case step narratives from the HTML report. The first table of
//! the document is read row by row:
//!
//! - row 0 is a header and is skipped;
//! - odd rows are case headers: a `<p>` in the first cell holds the case name
//!   with its bracketed case id and an optional `[+]` toggle marker;
//! - each case header is followed by a steps row whose first cell holds a
//!   nested table with one step per row;
//! - a header cell containing `Summary` ends the per-case section.
//!
//! 从 HTML 报告中提取每个用例的步骤描述。逐行读取文档中的第一个表格：
//! 第 0 行是表头并被跳过；奇数行是用例标题；每个用例标题后面跟着一个步骤行；
//! 包含 `Summary` 的标题单元格表示用例部分结束。

use thiserror::Error;

use crate::core::models::{CaseId, StepReport, StepReports};
use crate::ingest::dom::{self, DomError, Element};

const TOGGLE_MARKER: &str = "[+]";
const SUMMARY_MARKER: &str = "Summary";

/// Structural problems in the report. The caller degrades to empty step data.
#[derive(Debug, Error)]
pub enum HtmlParseError {
    #[error(transparent)]
    Markup(#[from] DomError),
    #[error("report contains no table")]
    NoTable,
    #[error("row {row}: expected a case header cell")]
    MissingHeaderCell { row: usize },
    #[error("row {row}: case header cell has no paragraph with the case name")]
    MissingCaseName { row: usize },
    #[error("row {row}: case name {name:?} has no bracketed case id")]
    MissingCaseId { row: usize, name: String },
    #[error("row {row}: expected a steps row for case {case_id} (header at row {header_row})")]
    MissingStepsRow {
        row: usize,
        header_row: usize,
        case_id: CaseId,
    },
    #[error("row {row}: steps row for case {case_id} has no nested step table")]
    MissingStepsTable { row: usize, case_id: CaseId },
}

/// Where the walk is within a case block.
enum RowState {
    ExpectHeaderRow,
    ExpectStepsRow {
        header_row: usize,
        case_id: CaseId,
        name: String,
    },
}

/// Parses the report into one [`StepReport`] per case header row.
///
/// If a case id appears in more than one block, the last block wins.
pub fn parse(html: &str) -> Result<StepReports, HtmlParseError> {
    let document = dom::parse_document(html)?;
    let table = document.find("table").ok_or(HtmlParseError::NoTable)?;

    let mut reports = StepReports::new();
    let mut state = RowState::ExpectHeaderRow;

    for (row, tr) in table_rows(table).into_iter().enumerate().skip(1) {
        state = match state {
            RowState::ExpectHeaderRow => {
                let cells = cells(tr);
                if cells.iter().any(|cell| cell.text().contains(SUMMARY_MARKER)) {
                    break;
                }
                let first = cells
                    .first()
                    .ok_or(HtmlParseError::MissingHeaderCell { row })?;
                let paragraph = first
                    .find("p")
                    .ok_or(HtmlParseError::MissingCaseName { row })?;
                let name = dom::collapse_whitespace(&paragraph.text().replace(TOGGLE_MARKER, ""));
                let case_id = CaseId::extract(&name)
                    .ok_or_else(|| HtmlParseError::MissingCaseId { row, name: name.clone() })?;
                RowState::ExpectStepsRow {
                    header_row: row,
                    case_id,
                    name,
                }
            }
            RowState::ExpectStepsRow { case_id, name, .. } => {
                let row_cells = cells(tr);
                let Some(steps_table) = row_cells.first().and_then(|cell| cell.find("table")) else {
                    return Err(HtmlParseError::MissingStepsTable { row, case_id });
                };
                let steps = table_rows(steps_table)
                    .into_iter()
                    .map(row_text)
                    .collect();
                reports.insert(
                    case_id.clone(),
                    StepReport {
                        case_id,
                        name,
                        steps,
                    },
                );
                RowState::ExpectHeaderRow
            }
        };
    }

    match state {
        RowState::ExpectHeaderRow => Ok(reports),
        RowState::ExpectStepsRow {
            header_row,
            case_id,
            ..
        } => Err(HtmlParseError::MissingStepsRow {
            row: header_row + 1,
            header_row,
            case_id,
        }),
    }
}

/// Rows of `table`, looking through `thead`/`tbody`/`tfoot` but not into
/// nested tables.
fn table_rows(table: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    for el in table.elements() {
        match el.name.as_str() {
            "tr" => rows.push(el),
            "thead" | "tbody" | "tfoot" => rows.extend(el.elements().filter(|r| r.is("tr"))),
            _ => {}
        }
    }
    rows
}

fn cells(row: &Element) -> Vec<&Element> {
    row.elements()
        .filter(|cell| cell.is("td") || cell.is("th"))
        .collect()
}

fn row_text(row: &Element) -> String {
    cells(row)
        .into_iter()
        .map(Element::text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
