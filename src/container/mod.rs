//! 无分配容器模块
//!
//! 所有容器都建立在调用方提供的存储之上:
//! - `RingBuffer`: SPSC 环形缓冲区，支持零拷贝批量访问 (内部无锁)
//! - `LockedRingBuffer`: 加互斥锁的装饰器，用于任务/线程之间共享
//! - `ObservedRingBuffer`: 通过 `Watch` 广播元素数量的线程安全缓冲区

pub mod locked;
pub mod observed;
pub mod ringbuffer;

pub use locked::{CriticalRingBuffer, LockedAddRegion, LockedRemoveRegion, LockedRingBuffer};
pub use observed::ObservedRingBuffer;
pub use ringbuffer::{AddRegion, ByteRingBuffer, RemoveRegion, RingBuffer};
