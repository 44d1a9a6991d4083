//! 阻塞式 UART 接收驱动
//!
//! 接收中断把字节追加到环形缓冲区 (生产者)，应用线程通过 `read()`
//! 取出 (消费者)。缓冲区为空时调用线程登记为等待者并阻塞，
//! 下一个字节到达时由 ISR 唤醒。
//!
//! 线程与 ISR 共享的状态由注入的 `RawMutex` 保护:
//! - `CriticalSectionRawMutex`: 关闭全局中断
//! - `IrqLineRawMutex<L>`: 只屏蔽本 UART 的中断线。此时只能有一个线程
//!   使用该接收器 (包括 `stop()`、`available()` 等查询)，见 `IrqLine`
//!
//! # Example
//! ```ignore
//! static mut RX_MEM: [u8; DEFAULT_RX_BUF_SIZE] = [0; DEFAULT_RX_BUF_SIZE];
//!
//! let rx: Receiver<'_, CriticalSectionRawMutex, _, _> =
//!     Receiver::new(&uart0, waiter, unsafe { &mut RX_MEM });
//! rx.start();
//!
//! // 中断处理函数
//! fn uart0_isr() {
//!     if RX.on_rx_event() { yield_on_exit(); }
//! }
//!
//! // 线程
//! let mut buf = [0u8; 16];
//! let n = rx.read(&mut buf)?;
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::hal::{UartFifoHal, UartHal};
use super::Error;
use crate::config::{MIN_DRIVER_BUF_SIZE, RX_DISCARD_CHUNK};
use crate::container::RingBuffer;
use crate::sync::{AtomicCounter, ThreadWaiter};
use crate::{log_debug, log_warn};

struct RxState<'a, Hd> {
    buffer: RingBuffer<'a, u8>,
    waiter: Option<Hd>,
    started: bool,
    session: u32,
}

/// 中断驱动的 UART 接收器
pub struct Receiver<'a, M: RawMutex, H: UartHal, W: ThreadWaiter> {
    hal: H,
    waiter: W,
    state: Mutex<M, RefCell<RxState<'a, W::Handle>>>,
    framing_errors: AtomicCounter,
    overruns: AtomicCounter,
}

impl<'a, M: RawMutex, H: UartHal, W: ThreadWaiter> Receiver<'a, M, H, W> {
    /// 创建接收器 (未启动)
    ///
    /// # Arguments
    /// * `buffer` - 接收环形缓冲区的存储，最多缓存 `buffer.len() - 1` 个字节
    ///
    /// # Panics
    /// `buffer.len()` 小于 `MIN_DRIVER_BUF_SIZE`
    pub fn new(hal: H, waiter: W, buffer: &'a mut [u8]) -> Self {
        assert!(
            buffer.len() >= MIN_DRIVER_BUF_SIZE,
            "uart rx buffer must hold at least one byte"
        );

        Self {
            hal,
            waiter,
            state: Mutex::new(RefCell::new(RxState {
                buffer: RingBuffer::new(buffer),
                waiter: None,
                started: false,
                session: 0,
            })),
            framing_errors: AtomicCounter::new(),
            overruns: AtomicCounter::new(),
        }
    }

    /// 启动接收: 清空缓冲区和计数器，使能接收器及接收中断
    ///
    /// 已启动时先执行一次 `stop()`
    pub fn start(&self) {
        if self.is_started() {
            self.stop();
        }

        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.buffer.clear();
            s.waiter = None;
            s.started = true;
            s.session = s.session.wrapping_add(1);
        });
        self.framing_errors.reset();
        self.overruns.reset();

        self.hal.enable_rx();
        self.hal.enable_rx_irq();
        log_debug!("uart rx started");
    }

    /// 停止接收
    ///
    /// 阻塞在 `read()` 中的线程会被唤醒并得到 `Err(Error::Stopped)`
    pub fn stop(&self) {
        self.hal.disable_rx_irq();
        self.hal.disable_rx();

        let blocked = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.buffer.clear();
            s.started = false;
            s.waiter.take()
        });
        self.framing_errors.reset();
        self.overruns.reset();

        if let Some(handle) = blocked {
            log_debug!("uart rx stopped, releasing blocked reader");
            self.waiter.signal(&handle);
        } else {
            log_debug!("uart rx stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.lock(|s| s.borrow().started)
    }

    /// 缓冲区中是否有数据 (未启动时总是 false)
    pub fn available(&self) -> bool {
        self.state.lock(|s| !s.borrow().buffer.is_empty())
    }

    /// 帧错误计数，`clear` 为 true 时读后清零
    pub fn framing_errors(&self, clear: bool) -> usize {
        self.framing_errors.read(clear)
    }

    /// 因缓冲区满而丢弃的字节数，`clear` 为 true 时读后清零
    pub fn overruns(&self, clear: bool) -> usize {
        self.overruns.read(clear)
    }

    /// 读取数据
    ///
    /// 缓冲区为空时阻塞直到至少收到一个字节，然后不再阻塞地取出
    /// 尽可能多的字节 (最多 `buf.len()`)。
    ///
    /// # Returns
    /// * `Ok(n)` - 实际读取的字节数，`buf` 为空时为 0
    /// * `Err(Error::NotStarted)` - 驱动未启动
    /// * `Err(Error::Stopped)` - 阻塞期间驱动被停止
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let session = self
            .state
            .lock(|s| {
                let s = s.borrow();
                s.started.then_some(s.session)
            })
            .ok_or(Error::NotStarted)?;

        if buf.is_empty() {
            return Ok(0);
        }

        let me = self.waiter.current();
        loop {
            let outcome = self.state.lock(|s| {
                let mut s = s.borrow_mut();
                if !s.started || s.session != session {
                    return Some(Err(Error::Stopped));
                }
                if s.buffer.is_empty() {
                    s.waiter = Some(me.clone());
                    return None;
                }
                s.waiter = None;
                Some(Ok(s.buffer.read(buf)))
            });

            match outcome {
                Some(result) => return result,
                // 唤醒可能是伪唤醒，回到循环重新检查
                None => self.waiter.wait(),
            }
        }
    }

    /// 接收中断处理 (数据 + 错误)
    ///
    /// 必须在中断上下文中调用。
    ///
    /// # Returns
    /// 唤醒了等待线程、需要在中断退出时调度时返回 `true`
    pub fn on_rx_event(&self) -> bool {
        let hal = &self.hal;

        if hal.is_rx_error() {
            hal.clr_rx_errors();
            hal.clr_rx_irq();
            self.framing_errors.increment();
            return false;
        }

        if !hal.is_rx_irq() {
            return false;
        }

        hal.clr_rx_irq();
        let byte = hal.rx_byte();

        let woken = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if !s.buffer.add(byte) {
                self.overruns.increment();
            }
            s.waiter.take()
        });

        woken.is_some_and(|handle| self.waiter.su_signal(&handle))
    }

    #[cfg(test)]
    fn has_waiter(&self) -> bool {
        self.state.lock(|s| s.borrow().waiter.is_some())
    }
}

impl<'a, M: RawMutex, H: UartFifoHal, W: ThreadWaiter> Receiver<'a, M, H, W> {
    /// 接收 FIFO 中断处理
    ///
    /// 把硬件 FIFO 直接读入环形缓冲区的连续可写区域；缓冲区写满后
    /// FIFO 中剩余的字节被丢弃并计入 `overruns()`。
    pub fn on_rx_fifo_event(&self) -> bool {
        let (full, woken) = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let mut received = 0;
            loop {
                let mut region = s.buffer.peek_next_add_region();
                let len = region.len();
                if len == 0 {
                    break;
                }
                let n = self.hal.read_rx_fifo(&mut region);
                region.commit_added(n);
                received += n;
                if n < len {
                    break;
                }
            }

            let full = s.buffer.is_full();
            let woken = if received > 0 { s.waiter.take() } else { None };
            (full, woken)
        });

        if full {
            let mut scratch = [0u8; RX_DISCARD_CHUNK];
            let mut dropped = 0;
            loop {
                let n = self.hal.read_rx_fifo(&mut scratch);
                if n == 0 {
                    break;
                }
                dropped += n;
            }
            if dropped > 0 {
                self.overruns.add(dropped);
                log_warn!("uart rx buffer full, dropped {} bytes", dropped);
            }
        }

        woken.is_some_and(|handle| self.waiter.su_signal(&handle))
    }
}
