//! RustRTOS Stream - 中断同步的环形缓冲区字节流
//!
//! 本库提供以下核心功能:
//! - 零拷贝批量访问的环形缓冲区 (`container`)
//! - 线程/中断同步原语与线程等待器契约 (`sync`)
//! - 阻塞式 UART 接收器/发送器 (`uart`)
//! - 条件编译日志系统 (`util`)
//!
//! 所有存储由调用方提供，运行时不做任何动态内存分配。

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod container;
pub mod sync;
pub mod uart;
pub mod util;

// ===== 重导出常用类型 =====
pub use container::{ByteRingBuffer, CriticalRingBuffer, LockedRingBuffer, ObservedRingBuffer, RingBuffer};
pub use sync::{AtomicCounter, IrqLine, IrqLineRawMutex, ThreadWaiter};
pub use uart::{Error, FirstTxMode, Receiver, SerialStream, Transmitter, UartFifoHal, UartHal};

// ===== 版本信息 =====
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 默认配置常量
pub mod config {
    /// 发送缓冲区默认大小 (字节，可用 `N - 1`)
    pub const DEFAULT_TX_BUF_SIZE: usize = 64;

    /// 接收缓冲区默认大小 (字节，可用 `N - 1`)
    pub const DEFAULT_RX_BUF_SIZE: usize = 128;

    /// 环形缓冲区最小存储长度 (单个槽位的缓冲区永远为空)
    pub const MIN_RINGBUF_SIZE: usize = 1;

    /// 驱动缓冲区最小存储长度: 至少要能暂存 1 个字节
    pub const MIN_DRIVER_BUF_SIZE: usize = 2;

    /// FIFO 接收中断在缓冲区满时用于丢弃数据的栈上临时缓冲区大小
    pub const RX_DISCARD_CHUNK: usize = 16;
}
