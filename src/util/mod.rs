//! 工具模块
//!
//! 日志宏与断言宏通过 `#[macro_export]` 导出到 crate 根。

pub mod log;
