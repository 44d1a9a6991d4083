//! 带互斥锁的环形缓冲区
//!
//! 用于两端都不是 ISR/线程 配对的场景 (例如两个任务或两个线程共享缓冲区)。
//! 中断上下文不能使用本类型: 它会等待锁。
//!
//! # 批量访问
//!
//! `peek_next_add_region()` / `peek_next_remove_region()` 获取并持有锁，
//! 对应的 `commit_added()` / `commit_removed()` 释放锁。区域守卫拥有锁，
//! 所以即使传输 0 个元素、或者守卫被直接丢弃，锁也一定会被释放。
//!
//! ```ignore
//! static mut MEM: [u8; 128] = [0; 128];
//! let ring: CriticalRingBuffer<u8> = LockedRingBuffer::new(unsafe { &mut MEM });
//!
//! // 任务上下文
//! let mut region = ring.peek_next_add_region().await;
//! let n = fill(&mut region);
//! region.commit_added(n);
//!
//! // 线程上下文
//! ring.blocking_add(0x55);
//! ```

use core::ops::{Deref, DerefMut};

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::mutex::{Mutex, MutexGuard};

use super::ringbuffer::RingBuffer;

/// 线程安全的环形缓冲区
pub struct LockedRingBuffer<'a, M: RawMutex, T> {
    inner: Mutex<M, RingBuffer<'a, T>>,
    max_count: usize,
}

/// 使用全局临界区的线程安全环形缓冲区
pub type CriticalRingBuffer<'a, T> = LockedRingBuffer<'a, CriticalSectionRawMutex, T>;

impl<'a, M: RawMutex, T> LockedRingBuffer<'a, M, T> {
    /// 在调用方提供的存储上创建空缓冲区
    pub fn new(elements: &'a mut [T]) -> Self {
        let ring = RingBuffer::new(elements);
        let max_count = ring.max_count();
        Self {
            inner: Mutex::new(ring),
            max_count,
        }
    }

    /// 最多可容纳的元素数量 (不需要锁)
    #[inline(always)]
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub async fn add(&self, item: T) -> bool {
        self.inner.lock().await.add(item)
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.count()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    pub async fn is_full(&self) -> bool {
        self.inner.lock().await.is_full()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    /// 获取连续可写区域并持有锁，直到 `commit_added()`
    pub async fn peek_next_add_region(&self) -> LockedAddRegion<'_, 'a, M, T> {
        let guard = self.inner.lock().await;
        let len = guard.flat_free();
        LockedAddRegion { guard, len }
    }

    /// 获取连续可读区域并持有锁，直到 `commit_removed()`
    pub async fn peek_next_remove_region(&self) -> LockedRemoveRegion<'_, 'a, M, T> {
        let guard = self.inner.lock().await;
        let len = guard.flat_used();
        LockedRemoveRegion { guard, len }
    }

    /// 在当前上下文中对底层缓冲区执行一组操作 (整个闭包持有锁)
    pub async fn with<R>(&self, f: impl FnOnce(&mut RingBuffer<'a, T>) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    /// 不等待: 锁被占用时返回 `None`
    pub fn try_with<R>(&self, f: impl FnOnce(&mut RingBuffer<'a, T>) -> R) -> Option<R> {
        let mut guard = self.inner.try_lock().ok()?;
        Some(f(&mut guard))
    }

    // ===== 线程上下文 (阻塞) 版本 =====

    pub fn blocking_add(&self, item: T) -> bool {
        block_on(self.add(item))
    }

    pub fn blocking_count(&self) -> usize {
        block_on(self.count())
    }

    pub fn blocking_clear(&self) {
        block_on(self.clear())
    }

    pub fn blocking_peek_next_add_region(&self) -> LockedAddRegion<'_, 'a, M, T> {
        block_on(self.peek_next_add_region())
    }

    pub fn blocking_peek_next_remove_region(&self) -> LockedRemoveRegion<'_, 'a, M, T> {
        block_on(self.peek_next_remove_region())
    }
}

impl<'a, M: RawMutex, T: Copy> LockedRingBuffer<'a, M, T> {
    pub async fn remove(&self) -> Option<T> {
        self.inner.lock().await.remove()
    }

    /// 第一个元素的副本 (引用无法带出锁)
    pub async fn peek_head(&self) -> Option<T> {
        self.inner.lock().await.peek_head().copied()
    }

    /// 最后一个元素的副本
    pub async fn peek_tail(&self) -> Option<T> {
        self.inner.lock().await.peek_tail().copied()
    }

    /// 批量写入，整个拷贝过程持有锁
    pub async fn write(&self, data: &[T]) -> usize {
        self.inner.lock().await.write(data)
    }

    /// 批量读取，整个拷贝过程持有锁
    pub async fn read(&self, buffer: &mut [T]) -> usize {
        self.inner.lock().await.read(buffer)
    }

    pub fn blocking_remove(&self) -> Option<T> {
        block_on(self.remove())
    }

    pub fn blocking_write(&self, data: &[T]) -> usize {
        block_on(self.write(data))
    }

    pub fn blocking_read(&self, buffer: &mut [T]) -> usize {
        block_on(self.read(buffer))
    }
}

/// 持有锁的连续可写区域
pub struct LockedAddRegion<'g, 'a, M: RawMutex, T> {
    guard: MutexGuard<'g, M, RingBuffer<'a, T>>,
    len: usize,
}

impl<M: RawMutex, T> LockedAddRegion<'_, '_, M, T> {
    /// 推进 `tail` 并释放锁
    pub fn commit_added(mut self, n: usize) {
        self.guard.advance_tail(n, self.len);
    }
}

impl<M: RawMutex, T> Deref for LockedAddRegion<'_, '_, M, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.guard.free_slots(self.len)
    }
}

impl<M: RawMutex, T> DerefMut for LockedAddRegion<'_, '_, M, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        let len = self.len;
        self.guard.free_slots_mut(len)
    }
}

/// 持有锁的连续可读区域
pub struct LockedRemoveRegion<'g, 'a, M: RawMutex, T> {
    guard: MutexGuard<'g, M, RingBuffer<'a, T>>,
    len: usize,
}

impl<M: RawMutex, T> LockedRemoveRegion<'_, '_, M, T> {
    /// 推进 `head` 并释放锁
    pub fn commit_removed(mut self, n: usize) {
        self.guard.advance_head(n, self.len);
    }
}

impl<M: RawMutex, T> Deref for LockedRemoveRegion<'_, '_, M, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.guard.used_slots(self.len)
    }
}
