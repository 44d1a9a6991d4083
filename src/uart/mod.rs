//! 中断驱动的 UART 字节流
//!
//! - `hal`: 寄存器级硬件契约 (`UartHal` / `UartFifoHal`)
//! - `receiver`: ISR 填充环形缓冲区，线程阻塞读取
//! - `transmitter`: 线程填充环形缓冲区，ISR 逐字节发送
//! - `stream`: `embedded-io` 适配与全双工 `SerialStream`
//!
//! 每个方向最多只能有一个线程阻塞等待。两个线程同时调用同一个驱动的
//! `read()` (或 `write()`) 时，后登记的线程会覆盖前一个，前一个线程
//! 只能在 `stop()` 或下一次数据事件后被唤醒。

use core::fmt;

pub mod hal;
pub mod receiver;
pub mod stream;
pub mod transmitter;

#[cfg(test)]
pub(crate) mod sim;

pub use hal::{UartFifoHal, UartHal};
pub use receiver::Receiver;
pub use stream::{ReadUntilError, SerialStream};
pub use transmitter::Transmitter;

/// 驱动错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// 驱动尚未 `start()`
    NotStarted,
    /// 阻塞期间驱动被 `stop()`
    Stopped,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotStarted => f.write_str("uart driver not started"),
            Error::Stopped => f.write_str("uart driver stopped while blocked"),
        }
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Error::NotStarted => embedded_io::ErrorKind::NotConnected,
            Error::Stopped => embedded_io::ErrorKind::Interrupted,
        }
    }
}

/// 发送流的启动方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FirstTxMode {
    /// 使能发送中断即可触发第一次 "发送完成" 中断
    #[default]
    Interrupt,
    /// 硬件不会自动触发: 驱动复位发送管道并亲自写入第一个字节
    Manual,
}
