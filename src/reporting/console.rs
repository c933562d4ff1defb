//! # Console Reporting Module / 控制台报告模块
//!
//! Prints colorful summaries of a synchronization pass and of the parsed
//! reports to stdout.
//!
//! 在标准输出上打印同步过程和已解析报告的彩色摘要。

use colored::*;

use crate::core::sync::{ParsedReports, SyncSummary};

/// Prints the outcome of a completed pass.
///
/// 打印已完成同步过程的结果。
///
/// # Output Format / 输出格式
/// ```text
/// --- Sync Summary ---
///   - Run                | R42
///   - Run URL            | https://example.testrail.io/index.php?/runs/view/42
///   - Cases parsed       | 12
///   - Tests in run       | 12
///   - Passed             | 10
///   - Failed             | 2
///   - Skipped            | 0
///   - Step reports       | 12
/// ```
pub fn print_summary(summary: &SyncSummary) {
    println!("\n{}", "--- Sync Summary ---".bold());
    print_row("Run", summary.run_id.to_string().cyan());
    if let Some(url) = &summary.run_url {
        print_row("Run URL", url.as_str().underline());
    }
    print_row("Cases parsed", summary.cases_parsed.to_string().normal());
    print_row("Tests in run", summary.tests_listed.to_string().normal());
    print_row("Passed", summary.passed.to_string().green());
    let failed = summary.failed.to_string();
    print_row(
        "Failed",
        if summary.failed > 0 { failed.red() } else { failed.normal() },
    );
    print_row("Skipped", summary.skipped.to_string().dimmed());
    let steps = if summary.steps_degraded {
        "unavailable".yellow()
    } else {
        summary.step_reports.to_string().normal()
    };
    print_row("Step reports", steps);
}

/// Prints every case of the TAP log with its outcome and step count.
///
/// 打印 TAP 日志中的每个用例及其结果和步骤数。
pub fn print_local_view(reports: &ParsedReports) {
    println!("\n{}", "--- Local Results ---".bold());
    for (case_id, outcome) in &reports.outcomes {
        let status = if outcome.passed {
            "Passed".green()
        } else {
            "Failed".red()
        };
        let steps = reports
            .steps
            .get(case_id)
            .map(|report| format!("{} steps", report.steps.len()))
            .unwrap_or_else(|| "no steps".to_string());
        println!("  - {:<8} | {:<24} | {}", status, case_id.as_str(), steps.dimmed());
    }
    if reports.steps_degraded {
        println!("{}", "Step report could not be used; comments will be empty.".yellow());
    }
    let orphans = reports
        .steps
        .keys()
        .filter(|id| !reports.outcomes.contains_key(*id))
        .count();
    if orphans > 0 {
        println!(
            "{}",
            format!("{orphans} step report(s) have no TAP outcome and will not be submitted.").yellow()
        );
    }
}

fn print_row(label: &str, value: ColoredString) {
    println!("  - {:<18} | {}", label, value);
}
