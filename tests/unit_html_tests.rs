mod common;

use common::html_report;
use testrail_sync::ingest::html::{self, HtmlParseError};
use testrail_sync::models::CaseId;

/// A report shaped like the ones the pipeline writes (scripts, entities,
/// toggle markers and a trailing summary section) yields one entry per case.
///
/// 与流水线生成的报告形状相同的报告（包含脚本、实体、切换标记和结尾摘要）
/// 每个用例产生一个条目。
#[test]
fn test_full_report_yields_case_steps() {
    let report = html_report(&[
        ("[A] opens dashboard", &["I am on page \"/\"", "I see \"Dashboard\""]),
        ("[B] logs out", &["I click \"Logout\""]),
    ]);

    let reports = html::parse(&report).unwrap();

    assert_eq!(
        reports.keys().map(CaseId::as_str).collect::<Vec<_>>(),
        vec!["A", "B"]
    );
    let a = &reports[&CaseId::from("A")];
    assert_eq!(a.name, "[A] opens dashboard (0.52s)");
    assert_eq!(a.steps, vec!["I am on page \"/\"", "I see \"Dashboard\""]);
}

#[test]
fn test_rows_after_summary_are_ignored() {
    let report = html_report(&[("[A] only case", &["one"])]);
    let reports = html::parse(&report).unwrap();
    assert!(!reports.contains_key(&CaseId::from("ZZ")));
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_report_without_cases_is_empty() {
    let reports = html::parse(&html_report(&[])).unwrap();
    assert!(reports.is_empty());
}

#[test]
fn test_repeated_case_keeps_last_block() {
    let report = html_report(&[("[A] first try", &["old"]), ("[A] second try", &["new"])]);
    let reports = html::parse(&report).unwrap();
    assert_eq!(reports[&CaseId::from("A")].steps, vec!["new"]);
}

#[test]
fn test_plain_text_is_not_a_report() {
    let err = html::parse("no markup here").unwrap_err();
    assert!(matches!(err, HtmlParseError::NoTable));
}
