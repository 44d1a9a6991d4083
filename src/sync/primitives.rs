//! 原子计数器
//!
//! ISR 只做无锁递增，线程侧读取或清零，不需要进入临界区

use portable_atomic::{AtomicUsize, Ordering};

/// 饱和原子计数器 - ISR 递增，线程读取/清零
///
/// 到达 `usize::MAX` 后停止增长，不会回绕
pub struct AtomicCounter {
    count: AtomicUsize,
}

impl AtomicCounter {
    /// 创建新的计数器
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    /// 饱和递增并返回新值
    #[inline(always)]
    pub fn increment(&self) -> usize {
        self.add(1)
    }

    /// 饱和增加指定值并返回新值
    #[inline]
    pub fn add(&self, value: usize) -> usize {
        let prev = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                Some(c.saturating_add(value))
            })
            .unwrap_or_else(|c| c);
        prev.saturating_add(value)
    }

    /// 获取当前值
    #[inline(always)]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// 读取并清零
    #[inline(always)]
    pub fn take(&self) -> usize {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// 读取，`clear` 为 true 时同时清零
    #[inline]
    pub fn read(&self, clear: bool) -> usize {
        if clear {
            self.take()
        } else {
            self.get()
        }
    }

    /// 重置为 0
    #[inline(always)]
    pub fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}
