//! # Core Module / 核心模块
//!
//! This module contains the core functionality of the synchronizer:
//! the shared data model, configuration, result merging and the orchestration
//! of a synchronization pass.
//!
//! 此模块包含同步器的核心功能：
//! 共享数据模型、配置、结果合并以及同步过程的编排。

pub mod config;
pub mod links;
pub mod merge;
pub mod models;
pub mod sync;

// Re-exports
pub use config::SyncConfig;
pub use models::{BuildContext, CaseId, ResultRecord};
pub use sync::{SyncError, SyncOrchestrator, SyncSummary};
