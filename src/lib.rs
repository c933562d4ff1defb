//! # TestRail Sync Library / TestRail 同步库
//!
//! This library reconciles the test reports of a finished CI build with a
//! TestRail instance: it creates a run scoped to the executed cases, maps
//! local outcomes and step narratives onto the run's tests, submits the
//! results and closes the run.
//!
//! 此库将已完成 CI 构建的测试报告与 TestRail 实例进行对账：
//! 创建仅包含已执行用例的运行，将本地结果和步骤描述映射到运行中的测试，
//! 提交结果并关闭运行。
//!
//! ## Modules / 模块
//!
//! - `core` - Data model, configuration, result merging and pass orchestration
//! - `ingest` - TAP and HTML report parsers
//! - `infra` - Artifact reading, logging and the remote API client
//! - `reporting` - Console summaries
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、配置、结果合并和同步编排
//! - `ingest` - TAP 和 HTML 报告解析器
//! - `infra` - 产物读取、日志和远程 API 客户端
//! - `reporting` - 控制台摘要
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod ingest;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::config;
pub use crate::core::models;
pub use crate::core::sync;
