//! 同步原语模块
//!
//! 提供线程/中断之间的同步能力:
//! - `primitives`: ISR 递增的饱和原子计数器
//! - `waiter`: RTOS 线程阻塞/唤醒契约 (`ThreadWaiter`)
//! - `gate`: 只屏蔽单条中断线的 `RawMutex`

pub mod gate;
pub mod primitives;
pub mod waiter;

pub use gate::{IrqLine, IrqLineRawMutex};
pub use primitives::AtomicCounter;
#[cfg(any(test, feature = "std"))]
pub use waiter::ParkWaiter;
pub use waiter::ThreadWaiter;
