//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the synchronizer,
//! including artifact reading, logging setup and the remote API client.
//!
//! 此模块为同步器提供基础设施服务，
//! 包括产物读取、日志设置和远程 API 客户端。

pub mod fs;
pub mod logging;
pub mod remote;

pub use remote::{RemoteError, RunApi, TestRailClient};
