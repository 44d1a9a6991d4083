//! 零拷贝环形缓冲区
//!
//! 单生产者单消费者 (SPSC) 环形缓冲区，存储由调用方提供
//! 特点:
//! - 不分配内存 (借用外部 `&mut [T]` 作为存储)
//! - 零拷贝批量读写 (返回连续区域游标)
//! - 预留一个槽位: `head == tail` 唯一表示空
//! - 内部无锁: 由使用方负责中断/线程之间的互斥
//!
//! # 批量访问协议
//!
//! 存储是平面数组而不是真正的环，所以连续区域在数组物理末尾截断，
//! 跨越回绕点时需要提交后再取一次区域。
//!
//! ```ignore
//! let mut mem = [0u8; 64];
//! let mut ring = RingBuffer::new(&mut mem);
//!
//! // 生产者: 外设直接写入环形缓冲区的存储
//! let mut region = ring.peek_next_add_region();
//! let n = uart.read_fifo(&mut region);
//! region.commit_added(n);
//!
//! // 消费者
//! let region = ring.peek_next_remove_region();
//! let n = uart.write_fifo(&region);
//! region.commit_removed(n);
//! ```

use core::ops::{Deref, DerefMut};

use crate::config::MIN_RINGBUF_SIZE;
use crate::debug_assert_msg;

/// 基于外部存储的环形缓冲区
///
/// `storage.len()` 为槽位数 `N`，可用容量为 `N - 1`。
/// `head` 只由消费者推进，`tail` 只由生产者推进。
pub struct RingBuffer<'a, T> {
    /// 元素存储 (调用方拥有，永不重新分配)
    elements: &'a mut [T],
    /// 第一个元素的位置 (消费者更新)
    head: usize,
    /// 下一个写入位置 (生产者更新)
    tail: usize,
}

impl<'a, T> RingBuffer<'a, T> {
    /// 在调用方提供的存储上创建空缓冲区
    ///
    /// # Panics
    /// 存储不能为空
    pub fn new(elements: &'a mut [T]) -> Self {
        assert!(
            elements.len() >= MIN_RINGBUF_SIZE,
            "ring buffer storage must not be empty"
        );

        Self {
            elements,
            head: 0,
            tail: 0,
        }
    }

    /// 槽位数 (存储长度)
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// 最多可容纳的元素数量
    #[inline(always)]
    pub fn max_count(&self) -> usize {
        self.elements.len() - 1
    }

    /// 当前元素数量
    #[inline]
    pub fn count(&self) -> usize {
        if self.tail >= self.head {
            self.tail - self.head
        } else {
            self.elements.len() - self.head + self.tail
        }
    }

    /// 剩余可写入的槽位
    #[inline]
    pub fn available(&self) -> usize {
        self.max_count() - self.count()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.next(self.tail) == self.head
    }

    /// 清空缓冲区
    ///
    /// 只有在生产者和消费者都静止时才安全
    #[inline]
    pub fn clear(&mut self) {
        self.head = self.tail;
    }

    /// 在尾部添加一个元素 (仅生产者)
    ///
    /// # Returns
    /// - `true`: 写入成功
    /// - `false`: 缓冲区已满，未做任何修改
    #[inline]
    pub fn add(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }

        self.elements[self.tail] = item;
        self.tail = self.next(self.tail);
        true
    }

    /// 查看第一个 (最早) 元素，不移除
    #[inline]
    pub fn peek_head(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        Some(&self.elements[self.head])
    }

    /// 查看最后一个 (最新) 元素，不移除
    #[inline]
    pub fn peek_tail(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let last = if self.tail == 0 {
            self.elements.len() - 1
        } else {
            self.tail - 1
        };
        Some(&self.elements[last])
    }

    /// 获取从 `tail` 开始的连续可写区域 (零拷贝)
    ///
    /// 区域长度可能小于剩余空间 (空闲空间跨越数组末尾时)，
    /// 缓冲区已满时区域为空。
    #[inline]
    pub fn peek_next_add_region(&mut self) -> AddRegion<'_, 'a, T> {
        let len = self.flat_free();
        AddRegion { ring: self, len }
    }

    /// 获取从 `head` 开始的连续可读区域 (零拷贝)
    ///
    /// 数据跨越数组末尾时只返回末尾之前的部分，缓冲区为空时区域为空。
    #[inline]
    pub fn peek_next_remove_region(&mut self) -> RemoveRegion<'_, 'a, T> {
        let len = self.flat_used();
        RemoveRegion { ring: self, len }
    }

    #[inline(always)]
    fn next(&self, idx: usize) -> usize {
        let next = idx + 1;
        if next == self.elements.len() {
            0
        } else {
            next
        }
    }

    /// `tail` 开始、不越过数组末尾的空闲槽位数
    pub(crate) fn flat_free(&self) -> usize {
        let len = self.elements.len();
        if self.tail >= self.head {
            // head 位于 0 时最后一个槽位必须保留
            if self.head == 0 {
                len - 1 - self.tail
            } else {
                len - self.tail
            }
        } else {
            self.head - 1 - self.tail
        }
    }

    /// `head` 开始、不越过数组末尾的已用槽位数
    pub(crate) fn flat_used(&self) -> usize {
        if self.tail >= self.head {
            self.tail - self.head
        } else {
            self.elements.len() - self.head
        }
    }

    pub(crate) fn free_slots(&self, len: usize) -> &[T] {
        &self.elements[self.tail..self.tail + len]
    }

    pub(crate) fn free_slots_mut(&mut self, len: usize) -> &mut [T] {
        let start = self.tail;
        &mut self.elements[start..start + len]
    }

    pub(crate) fn used_slots(&self, len: usize) -> &[T] {
        &self.elements[self.head..self.head + len]
    }

    /// 提交写入: `n` 不能超过 `limit` (对应区域长度)
    pub(crate) fn advance_tail(&mut self, n: usize, limit: usize) {
        debug_assert_msg!(n <= limit, "commit_added({}) exceeds region of {}", n, limit);
        let n = n.min(limit);
        self.tail = (self.tail + n) % self.elements.len();
    }

    /// 提交读取: `n` 不能超过 `limit` (对应区域长度)
    pub(crate) fn advance_head(&mut self, n: usize, limit: usize) {
        debug_assert_msg!(n <= limit, "commit_removed({}) exceeds region of {}", n, limit);
        let n = n.min(limit);
        self.head = (self.head + n) % self.elements.len();
    }
}

impl<'a, T: Copy> RingBuffer<'a, T> {
    /// 移除第一个元素 (仅消费者)
    ///
    /// # Returns
    /// - `Some(T)`: 读取成功
    /// - `None`: 缓冲区为空
    #[inline]
    pub fn remove(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let value = self.elements[self.head];
        self.head = self.next(self.head);
        Some(value)
    }

    /// 批量写入
    ///
    /// # Returns
    /// 实际写入的元素数 (缓冲区满时可能小于 `data.len()`)
    pub fn write(&mut self, data: &[T]) -> usize {
        let mut written = 0;
        let mut remaining = data;

        // 最多两轮: 数组末尾之前一段，回绕之后一段
        while !remaining.is_empty() {
            let mut region = self.peek_next_add_region();
            if region.is_empty() {
                break;
            }

            let n = region.len().min(remaining.len());
            region[..n].copy_from_slice(&remaining[..n]);
            region.commit_added(n);

            written += n;
            remaining = &remaining[n..];
        }

        written
    }

    /// 批量读取
    ///
    /// # Returns
    /// 实际读取的元素数
    pub fn read(&mut self, buffer: &mut [T]) -> usize {
        let mut read_total = 0;
        let mut remaining = buffer;

        while !remaining.is_empty() {
            let region = self.peek_next_remove_region();
            if region.is_empty() {
                break;
            }

            let n = region.len().min(remaining.len());
            remaining[..n].copy_from_slice(&region[..n]);
            region.commit_removed(n);

            read_total += n;
            remaining = &mut core::mem::take(&mut remaining)[n..];
        }

        read_total
    }
}

/// 连续可写区域游标
///
/// 由 [`RingBuffer::peek_next_add_region`] 返回，通过
/// [`commit_added`](Self::commit_added) 消耗。直接丢弃等同于 `commit_added(0)`。
pub struct AddRegion<'r, 'a, T> {
    ring: &'r mut RingBuffer<'a, T>,
    len: usize,
}

impl<T> AddRegion<'_, '_, T> {
    /// 推进 `tail`，发布已写入区域前 `n` 个元素
    #[inline]
    pub fn commit_added(self, n: usize) {
        self.ring.advance_tail(n, self.len);
    }
}

impl<T> Deref for AddRegion<'_, '_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.ring.free_slots(self.len)
    }
}

impl<T> DerefMut for AddRegion<'_, '_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.ring.free_slots_mut(self.len)
    }
}

/// 连续可读区域游标
///
/// 由 [`RingBuffer::peek_next_remove_region`] 返回，通过
/// [`commit_removed`](Self::commit_removed) 消耗。
pub struct RemoveRegion<'r, 'a, T> {
    ring: &'r mut RingBuffer<'a, T>,
    len: usize,
}

impl<T> RemoveRegion<'_, '_, T> {
    /// 推进 `head`，释放区域前 `n` 个元素
    #[inline]
    pub fn commit_removed(self, n: usize) {
        self.ring.advance_head(n, self.len);
    }
}

impl<T> Deref for RemoveRegion<'_, '_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.ring.used_slots(self.len)
    }
}

// ===== 特化版本: 字节缓冲区 =====

/// 字节环形缓冲区类型别名
pub type ByteRingBuffer<'a> = RingBuffer<'a, u8>;
