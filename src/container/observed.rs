//! 发布元素数量的环形缓冲区
//!
//! 在 [`LockedRingBuffer`] 之上，每次成功的 add/remove/clear 之后
//! 通过 `Watch` 广播当前元素数量，订阅者可以异步等待队列深度变化
//! (例如在 UI 或诊断任务中显示积压)。

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::watch::Watch;

use super::locked::LockedRingBuffer;

/// 带元素数量广播的线程安全环形缓冲区
///
/// `N` 为 `Watch` 支持的最大接收者数量
pub struct ObservedRingBuffer<'a, 'w, M: RawMutex, T, const N: usize> {
    ring: LockedRingBuffer<'a, M, T>,
    count: &'w Watch<M, usize, N>,
}

impl<'a, 'w, M: RawMutex, T, const N: usize> ObservedRingBuffer<'a, 'w, M, T, N> {
    pub fn new(elements: &'a mut [T], count: &'w Watch<M, usize, N>) -> Self {
        Self {
            ring: LockedRingBuffer::new(elements),
            count,
        }
    }

    pub fn max_count(&self) -> usize {
        self.ring.max_count()
    }

    /// 当前元素数量，与最近一次发布的值一致
    pub async fn count(&self) -> usize {
        self.ring.count().await
    }

    pub async fn is_empty(&self) -> bool {
        self.ring.is_empty().await
    }

    pub async fn add(&self, item: T) -> bool {
        let sender = self.count.sender();
        self.ring
            .with(|ring| {
                let ok = ring.add(item);
                if ok {
                    sender.send(ring.count());
                }
                ok
            })
            .await
    }

    pub async fn clear(&self) {
        let sender = self.count.sender();
        self.ring
            .with(|ring| {
                ring.clear();
                sender.send(0);
            })
            .await
    }
}

impl<'a, 'w, M: RawMutex, T: Copy, const N: usize> ObservedRingBuffer<'a, 'w, M, T, N> {
    pub async fn remove(&self) -> Option<T> {
        let sender = self.count.sender();
        self.ring
            .with(|ring| {
                let item = ring.remove();
                if item.is_some() {
                    sender.send(ring.count());
                }
                item
            })
            .await
    }
}
