//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures shared by the report parsers, the
//! result merger and the remote client. Everything here is ephemeral and lives
//! for a single synchronization pass.
//!
//! 此模块定义报告解析器、结果合并器和远程客户端共享的数据结构。
//! 这里的所有内容都是临时的，只存在于单次同步过程中。

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// An opaque test case identifier, taken from the first bracketed token of a
/// report line (`ok 3 - [C42] login works` yields `C42`).
///
/// 不透明的测试用例标识符，取自报告行中第一个方括号标记。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extracts the text between the first `[` and the first `]` that follows it.
    /// Returns `None` when either bracket is missing or the token is empty.
    ///
    /// Both report parsers go through this function so that identifiers
    /// correlate across formats.
    ///
    /// 提取第一个 `[` 与其后第一个 `]` 之间的文本。
    /// 如果缺少任一方括号或标记为空，则返回 `None`。
    pub fn extract(text: &str) -> Option<Self> {
        let open = text.find('[')?;
        let rest = &text[open + 1..];
        let close = rest.find(']')?;
        let token = &rest[..close];
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// The remote service reports `case_id` as a number; local reports carry strings.
impl<'de> Deserialize<'de> for CaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CaseIdVisitor;

        impl Visitor<'_> for CaseIdVisitor {
            type Value = CaseId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a case id as a string or an integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CaseId, E> {
                Ok(CaseId::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CaseId, E> {
                Ok(CaseId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<CaseId, E> {
                Ok(CaseId(v.to_string()))
            }
        }

        deserializer.deserialize_any(CaseIdVisitor)
    }
}

/// The outcome of one case as recorded in the TAP log.
/// TAP 日志中记录的单个用例结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapOutcome {
    pub case_id: CaseId,
    pub passed: bool,
}

/// Outcomes keyed by case id. A case that appears more than once keeps the
/// outcome of its last occurrence.
pub type TapOutcomes = BTreeMap<CaseId, TapOutcome>;

/// The step narrative of one case, taken from the HTML report.
/// 来自 HTML 报告的单个用例步骤描述。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub case_id: CaseId,
    /// Case name as shown in the report, without the `[+]` toggle marker.
    pub name: String,
    /// Step lines in execution order.
    pub steps: Vec<String>,
}

pub type StepReports = BTreeMap<CaseId, StepReport>;

/// Identifier of a run, assigned by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

/// Identifier of a test within a run, assigned by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// A run created on the remote service. Only `id` drives the pass; `url` is
/// shown to the operator when the service returns one.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRun {
    pub id: RunId,
    #[serde(default)]
    pub url: Option<String>,
}

/// A test belonging to a remote run, linking the remote test id back to the
/// local case id space.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteTest {
    pub id: TestId,
    pub case_id: CaseId,
    #[serde(default)]
    pub title: Option<String>,
}

/// Status codes understood by the remote service.
/// 远程服务可识别的状态码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Passed = 1,
    Failed = 5,
}

impl ResultStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            ResultStatus::Passed
        } else {
            ResultStatus::Failed
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Serialize for ResultStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// One entry of the result batch submitted to the remote run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub test_id: TestId,
    pub status_id: ResultStatus,
    pub comment: String,
}

/// Build metadata handed over by the CI host.
///
/// 由 CI 主机传入的构建元数据。
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Branch the build ran on; embedded in the remote run name.
    pub branch: String,
    /// CI build identifier; used for generated links.
    pub build_id: String,
    /// Directory the report paths are resolved against.
    pub build_root: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl BuildContext {
    /// The name given to the remote run for this build.
    pub fn run_name(&self) -> String {
        format!(
            "{} #{} ({})",
            self.branch,
            self.build_id,
            self.started_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_takes_first_bracketed_token() {
        assert_eq!(CaseId::extract("ok 1 - [C12] login [C13]"), Some(CaseId::from("C12")));
        assert_eq!(CaseId::extract("[A] then [B]"), Some(CaseId::from("A")));
    }

    #[test]
    fn extract_requires_both_brackets() {
        assert_eq!(CaseId::extract("ok 1 - login"), None);
        assert_eq!(CaseId::extract("ok 1 - [C12 login"), None);
        assert_eq!(CaseId::extract("ok 1 - C12] login"), None);
        assert_eq!(CaseId::extract("ok 1 - [] login"), None);
    }

    #[test]
    fn case_id_deserializes_from_number_or_string() {
        let numeric: CaseId = serde_json::from_str("42").unwrap();
        let text: CaseId = serde_json::from_str("\"C42\"").unwrap();
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.as_str(), "C42");
    }

    #[test]
    fn result_record_serializes_numeric_status() {
        let record = ResultRecord {
            test_id: TestId(10),
            status_id: ResultStatus::Failed,
            comment: String::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"test_id": 10, "status_id": 5, "comment": ""}));
    }

    #[test]
    fn run_name_embeds_branch_and_build() {
        let build = BuildContext {
            branch: "feature/login".to_string(),
            build_id: "981".to_string(),
            build_root: PathBuf::from("."),
            started_at: DateTime::parse_from_rfc3339("2024-05-01T08:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        assert_eq!(build.run_name(), "feature/login #981 (2024-05-01 08:30 UTC)");
    }
}
