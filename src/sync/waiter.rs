//! 线程等待器契约
//!
//! 驱动通过本 trait 使用 RTOS 的线程阻塞/唤醒能力，而不是自己实现线程:
//! - `current()`: 当前线程句柄
//! - `wait()`: 阻塞当前线程直到被唤醒
//! - `signal()`: 线程上下文唤醒 (例如 `stop()`)
//! - `su_signal()`: 中断上下文唤醒，返回是否需要在中断退出时调度
//!
//! # 语义要求
//!
//! - 唤醒是"粘滞"的: 在 `wait()` 之前到达的 signal 会让下一次 `wait()` 立即返回。
//!   线程在临界区内登记自己之后、调用 `wait()` 之前，中断可能已经唤醒它。
//! - `wait()` 允许伪唤醒，驱动总是在循环中重新检查条件。

/// RTOS 线程等待/唤醒能力
pub trait ThreadWaiter {
    /// 被阻塞线程的句柄
    type Handle: Clone + Send;

    /// 返回调用线程的句柄
    fn current(&self) -> Self::Handle;

    /// 阻塞调用线程，直到被 signal
    fn wait(&self);

    /// 从线程上下文唤醒
    fn signal(&self, waiter: &Self::Handle);

    /// 从中断上下文唤醒
    ///
    /// # Returns
    /// 需要在中断退出时触发调度 (yield-on-exit) 时返回 `true`
    fn su_signal(&self, waiter: &Self::Handle) -> bool;
}

/// 基于 `std::thread` park/unpark 的等待器 (主机仿真/测试)
///
/// park 令牌正好提供粘滞唤醒语义
#[cfg(any(test, feature = "std"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct ParkWaiter;

#[cfg(any(test, feature = "std"))]
impl ThreadWaiter for ParkWaiter {
    type Handle = std::thread::Thread;

    fn current(&self) -> Self::Handle {
        std::thread::current()
    }

    fn wait(&self) {
        std::thread::park();
    }

    fn signal(&self, waiter: &Self::Handle) {
        waiter.unpark();
    }

    fn su_signal(&self, waiter: &Self::Handle) -> bool {
        waiter.unpark();
        true
    }
}
