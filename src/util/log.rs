//! 条件编译日志系统
//!
//! 根据 feature 选择不同的日志后端:
//! - `log-defmt`: 使用 defmt (高效二进制日志)
//! - `dev` / `log-println`: 使用 esp-println (文本日志)
//! - 默认: 完全禁用日志 (零开销)
//!
//! 驱动只在生命周期事件 (start/stop、强制唤醒等待者) 和丢弃数据时记录日志，
//! 逐字节的中断路径不打印任何内容。
//!
//! # 日志级别
//! - `log_error!`: 错误信息
//! - `log_warn!`: 警告信息 (丢弃数据等)
//! - `log_info!`: 一般信息
//! - `log_debug!`: 调试信息 (驱动启停)
//! - `log_trace!`: 详细跟踪

// ===================================================================
// 后端选择
// ===================================================================

#[cfg(feature = "log-defmt")]
#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[cfg(all(any(feature = "dev", feature = "log-println"), not(feature = "log-defmt")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    (error, $($arg:tt)*) => { esp_println::println!("[ERROR] {}", format_args!($($arg)*)) };
    (warn, $($arg:tt)*) => { esp_println::println!("[WARN] {}", format_args!($($arg)*)) };
    (info, $($arg:tt)*) => { esp_println::println!("[INFO] {}", format_args!($($arg)*)) };
    (debug, $($arg:tt)*) => { esp_println::println!("[DEBUG] {}", format_args!($($arg)*)) };
    (trace, $($arg:tt)*) => { esp_println::println!("[TRACE] {}", format_args!($($arg)*)) };
}

#[cfg(not(any(feature = "dev", feature = "log-defmt", feature = "log-println")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $($arg:tt)*) => {{}};
}

// ===================================================================
// 日志宏
// ===================================================================

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log!(error, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log!(warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log!(info, $($arg)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => { $crate::__log!(trace, $($arg)*) };
}

// ===================================================================
// 断言宏
// ===================================================================

/// Debug 断言 (仅在 debug 模式下检查)
///
/// 失败时先通过日志后端输出条件，再带消息 panic。
/// release 模式下条件不会被求值。
#[macro_export]
macro_rules! debug_assert_msg {
    ($cond:expr, $($arg:tt)*) => {
        #[cfg(debug_assertions)]
        {
            if !$cond {
                $crate::log_error!("assertion failed: {}", stringify!($cond));
                panic!($($arg)*);
            }
        }
    };
}
