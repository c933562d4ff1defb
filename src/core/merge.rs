//! # Result Merger / 结果合并器
//!
//! Combines local outcomes and step narratives with the tests of a remote run
//! into the batch of result records to submit.
//!
//! 将本地结果和步骤描述与远程运行中的测试合并为待提交的结果记录。

use crate::core::links::CommentLinks;
use crate::core::models::{
    CaseId, RemoteTest, ResultRecord, ResultStatus, StepReport, StepReports, TapOutcomes,
};

/// Separator line between the step narrative and the generated links.
pub const COMMENT_SEPARATOR: &str = "---";

/// Builds one record per remote test that has a local outcome, in the order
/// the remote service returned the tests. Tests without a local outcome are
/// left out.
///
/// 为每个具有本地结果的远程测试生成一条记录，顺序与远程服务返回的测试顺序一致。
/// 没有本地结果的测试会被跳过。
pub fn merge(
    outcomes: &TapOutcomes,
    steps: &StepReports,
    tests: &[RemoteTest],
    links: &CommentLinks,
) -> Vec<ResultRecord> {
    tests
        .iter()
        .filter_map(|test| {
            let outcome = outcomes.get(&test.case_id)?;
            let comment = steps
                .get(&test.case_id)
                .map(|report| render_comment(report, &test.case_id, links))
                .unwrap_or_default();
            Some(ResultRecord {
                test_id: test.id,
                status_id: ResultStatus::from_passed(outcome.passed),
                comment,
            })
        })
        .collect()
}

fn render_comment(report: &StepReport, case_id: &CaseId, links: &CommentLinks) -> String {
    let mut comment = report.steps.join("\n");
    comment.push_str("\n\n");
    comment.push_str(COMMENT_SEPARATOR);
    for (label, url) in links.render(case_id) {
        comment.push('\n');
        comment.push_str(label);
        comment.push_str(": ");
        comment.push_str(&url);
    }
    comment
}
