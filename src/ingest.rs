//! # Report Ingestion Module / 报告读取模块
//!
//! Parsers for the two report artifacts a build leaves behind: the TAP log
//! with pass/fail outcomes and the HTML report with step narratives.
//!
//! 构建留下的两种报告产物的解析器：包含通过/失败结果的 TAP 日志，
//! 以及包含步骤描述的 HTML 报告。

pub mod dom;
pub mod html;
pub mod tap;
