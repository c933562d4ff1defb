//! # Reporting Module / 报告模块
//!
//! Console output for the operator: the outcome of a synchronization pass and
//! the local view of a build's reports.
//!
//! 面向操作员的控制台输出：同步过程的结果以及构建报告的本地视图。

pub mod console;

pub use console::{print_local_view, print_summary};
