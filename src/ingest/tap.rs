//! # TAP Result Parser / TAP 结果解析器
//!
//! Reads the pipeline's TAP log into outcomes keyed by case id. Only the narrow
//! shape the pipeline produces is supported: a result line contains `ok ` or
//! `not ok ` and a bracketed case id somewhere on the line.
//!
//! 将流水线的 TAP 日志读取为按用例 ID 索引的结果。
//! 仅支持流水线生成的特定格式：结果行包含 `ok ` 或 `not ok ` 以及一个方括号用例 ID。

use thiserror::Error;
use tracing::warn;

use crate::core::models::{CaseId, TapOutcome, TapOutcomes};

/// A result line without a usable case id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: result line has no bracketed case id: {line:?}")]
pub struct TapLineError {
    pub line_number: usize,
    pub line: String,
}

/// Classifies a single trimmed line.
///
/// Returns `Ok(None)` for lines that are not result lines (plan, diagnostics,
/// blank lines).
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<TapOutcome>, TapLineError> {
    let line = line.trim();
    let passed = if line.contains("not ok ") {
        false
    } else if line.contains("ok ") {
        true
    } else {
        return Ok(None);
    };

    let case_id = CaseId::extract(line).ok_or_else(|| TapLineError {
        line_number,
        line: line.to_string(),
    })?;
    Ok(Some(TapOutcome { case_id, passed }))
}

/// Parses the whole log.
///
/// When a case id appears on several result lines, the last one wins: a case
/// re-run later in the log reports its final outcome. Malformed result lines
/// are skipped with a warning.
///
/// 解析整个日志。
/// 当一个用例 ID 出现在多个结果行中时，以最后一次为准。格式错误的结果行会被跳过并给出警告。
pub fn parse(text: &str) -> TapOutcomes {
    let mut outcomes = TapOutcomes::new();
    for (index, line) in text.lines().enumerate() {
        match parse_line(index + 1, line) {
            Ok(Some(outcome)) => {
                outcomes.insert(outcome.case_id.clone(), outcome);
            }
            Ok(None) => {}
            Err(e) => warn!("skipping TAP {e}"),
        }
    }
    outcomes
}
