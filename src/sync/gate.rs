//! 中断线门控
//!
//! 线程与 ISR 共享的驱动状态只需要屏蔽相关的那一条中断线，
//! 而不必关闭全局中断。`IrqLineRawMutex` 把"屏蔽一条中断线"包装成
//! embassy-sync 的 `RawMutex`，可以直接注入到驱动的状态锁中:
//!
//! ```ignore
//! struct Uart0Line;
//!
//! // 只有 uart 线程和 UART0 中断访问被门控的驱动
//! unsafe impl IrqLine for Uart0Line {
//!     fn mask() { NVIC::mask(Interrupt::UART0) }
//!     fn unmask() { unsafe { NVIC::unmask(Interrupt::UART0) } }
//! }
//!
//! type Uart0Gate = IrqLineRawMutex<Uart0Line>;
//! let rx: Receiver<'_, Uart0Gate, _, _> = Receiver::new(hal, waiter, &mut RX_MEM);
//! ```
//!
//! 只在单核、线程 + 中断两级的模型下成立: 线程持有门控时该中断不会进入，
//! ISR 内部再次进入门控只会增加嵌套深度。
//!
//! 屏蔽中断线不能阻止另一个线程进入门控，所以使用 `IrqLineRawMutex`
//! 的驱动只能由一个线程上下文访问 (加上它自己的 ISR)。需要多个线程
//! 共享同一个驱动时使用 `CriticalSectionRawMutex`。

use core::marker::PhantomData;

use embassy_sync::blocking_mutex::raw::RawMutex;
use portable_atomic::{AtomicU8, Ordering};

/// 一条可以单独屏蔽的中断线
///
/// # Safety
///
/// 实现者保证:
/// - `mask()` 返回后该中断线的处理函数不会开始执行，直到 `unmask()`
/// - 通过 `IrqLineRawMutex<Self>` 保护的每个对象只被一个线程上下文
///   和该中断线的 ISR 访问，不存在两个线程同时进入门控的情况
pub unsafe trait IrqLine {
    /// 屏蔽该中断线 (幂等)
    fn mask();

    /// 解除屏蔽 (幂等)
    fn unmask();
}

/// 屏蔽单条中断线的 `RawMutex`
///
/// 支持嵌套: 只有最外层进入时屏蔽、最外层退出时解除屏蔽
pub struct IrqLineRawMutex<L: IrqLine> {
    depth: AtomicU8,
    _line: PhantomData<fn() -> L>,
}

impl<L: IrqLine> IrqLineRawMutex<L> {
    pub const fn new() -> Self {
        Self {
            depth: AtomicU8::new(0),
            _line: PhantomData,
        }
    }
}

impl<L: IrqLine> Default for IrqLineRawMutex<L> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: `IrqLine` 的实现者保证只有一个线程上下文与该中断线的 ISR
// 竞争门控，屏蔽中断线即可在两者之间互斥
unsafe impl<L: IrqLine> RawMutex for IrqLineRawMutex<L> {
    const INIT: Self = Self::new();

    fn lock<R>(&self, f: impl FnOnce() -> R) -> R {
        if self.depth.fetch_add(1, Ordering::Acquire) == 0 {
            L::mask();
        }

        let result = f();

        if self.depth.fetch_sub(1, Ordering::Release) == 1 {
            L::unmask();
        }
        result
    }
}
