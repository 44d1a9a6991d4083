//! 阻塞式 UART 发送驱动
//!
//! 应用线程把数据写入环形缓冲区 (生产者)，"发送完成" 中断逐字节取出
//! 并发送 (消费者)。缓冲区满时调用线程阻塞，直到 ISR 把缓冲区发完
//! 并关闭发送中断时被唤醒。
//!
//! 发送中断只在有数据待发时使能: `write()` 发现中断未使能时负责
//! "踢" 出第一个字节，ISR 发现缓冲区为空时关闭中断。
//!
//! 使用 `IrqLineRawMutex<L>` 作为门控时，只能有一个线程使用该发送器，
//! 见 `IrqLine`。
//!
//! # Example
//! ```ignore
//! static mut TX_MEM: [u8; DEFAULT_TX_BUF_SIZE] = [0; DEFAULT_TX_BUF_SIZE];
//!
//! let tx: Transmitter<'_, CriticalSectionRawMutex, _, _> =
//!     Transmitter::new(&uart0, waiter, unsafe { &mut TX_MEM }, FirstTxMode::Interrupt);
//! tx.start();
//! tx.write(b"hello\r\n")?;
//!
//! // UART0 发送完成中断
//! tx.on_tx_done();
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::hal::{UartFifoHal, UartHal};
use super::{Error, FirstTxMode};
use crate::config::MIN_DRIVER_BUF_SIZE;
use crate::container::RingBuffer;
use crate::log_debug;
use crate::sync::ThreadWaiter;

struct TxState<'a, Hd> {
    buffer: RingBuffer<'a, u8>,
    waiter: Option<Hd>,
    started: bool,
    session: u32,
}

/// 中断驱动的 UART 发送器
pub struct Transmitter<'a, M: RawMutex, H: UartHal, W: ThreadWaiter> {
    hal: H,
    waiter: W,
    mode: FirstTxMode,
    state: Mutex<M, RefCell<TxState<'a, W::Handle>>>,
}

impl<'a, M: RawMutex, H: UartHal, W: ThreadWaiter> Transmitter<'a, M, H, W> {
    /// 创建发送器 (未启动)
    ///
    /// # Arguments
    /// * `buffer` - 发送环形缓冲区的存储，最多暂存 `buffer.len() - 1` 个字节
    /// * `mode` - 发送流的启动方式，取决于硬件能否自动产生第一次发送中断
    ///
    /// # Panics
    /// `buffer.len()` 小于 `MIN_DRIVER_BUF_SIZE`
    pub fn new(hal: H, waiter: W, buffer: &'a mut [u8], mode: FirstTxMode) -> Self {
        assert!(
            buffer.len() >= MIN_DRIVER_BUF_SIZE,
            "uart tx buffer must hold at least one byte"
        );

        Self {
            hal,
            waiter,
            mode,
            state: Mutex::new(RefCell::new(TxState {
                buffer: RingBuffer::new(buffer),
                waiter: None,
                started: false,
                session: 0,
            })),
        }
    }

    /// 启动发送: 只使能发送器，发送中断在有数据时才使能
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

        self.hal.enable_tx();
        log_debug!("uart tx started");
    }

    /// 停止发送，丢弃尚未发出的数据
    ///
    /// 阻塞在 `write()` 中的线程会被唤醒并得到 `Err(Error::Stopped)`
    pub fn stop(&self) {
        self.hal.disable_tx_irq();
        self.hal.disable_tx();

        let blocked = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.buffer.clear();
            s.started = false;
            s.waiter.take()
        });

        if let Some(handle) = blocked {
            log_debug!("uart tx stopped, releasing blocked writer");
            self.waiter.signal(&handle);
        } else {
            log_debug!("uart tx stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.lock(|s| s.borrow().started)
    }

    /// 尚未发出的字节数
    pub fn pending(&self) -> usize {
        self.state.lock(|s| s.borrow().buffer.count())
    }

    pub fn mode(&self) -> FirstTxMode {
        self.mode
    }

    /// 写入数据
    ///
    /// 全部数据进入发送缓冲区后返回 (不等待线路上发送完成)。
    /// 缓冲区满时阻塞，直到 ISR 把缓冲区发空。
    ///
    /// # Returns
    /// * `Ok(())` - 全部数据已进入发送缓冲区
    /// * `Err(Error::NotStarted)` - 驱动未启动
    /// * `Err(Error::Stopped)` - 阻塞期间驱动被停止，剩余数据未写入
    pub fn write(&self, data: &[u8]) -> Result<(), Error> {
        let session = self.session()?;

        if data.is_empty() {
            return Ok(());
        }

        let me = self.waiter.current();
        let mut remaining = data;
        loop {
            let done = self.state.lock(|s| {
                let mut s = s.borrow_mut();
                if !s.started || s.session != session {
                    return Err(Error::Stopped);
                }

                let n = s.buffer.write(remaining);
                remaining = &remaining[n..];

                s.waiter = if remaining.is_empty() {
                    None
                } else {
                    Some(me.clone())
                };

                if !self.hal.is_tx_irq_enabled() {
                    self.kick(&mut s.buffer);
                }
                Ok(remaining.is_empty())
            })?;

            if done {
                return Ok(());
            }
            self.waiter.wait();
        }
    }

    /// 阻塞直到发送缓冲区被 ISR 取空
    ///
    /// 最后一个字节可能仍在移位寄存器中
    pub fn flush(&self) -> Result<(), Error> {
        let session = self.session()?;
        let me = self.waiter.current();
        loop {
            let done = self.state.lock(|s| {
                let mut s = s.borrow_mut();
                if !s.started || s.session != session {
                    return Err(Error::Stopped);
                }
                if s.buffer.is_empty() {
                    return Ok(true);
                }
                s.waiter = Some(me.clone());
                Ok(false)
            })?;

            if done {
                return Ok(());
            }
            self.waiter.wait();
        }
    }

    fn session(&self) -> Result<u32, Error> {
        self.state
            .lock(|s| {
                let s = s.borrow();
                s.started.then_some(s.session)
            })
            .ok_or(Error::NotStarted)
    }

    /// 启动发送流 (调用方持有状态锁)
    fn kick(&self, buffer: &mut RingBuffer<'a, u8>) {
        match self.mode {
            FirstTxMode::Interrupt => self.hal.enable_tx_irq(),
            FirstTxMode::Manual => {
                if let Some(byte) = buffer.remove() {
                    self.hal.reset_tx_pipe();
                    self.hal.enable_tx_irq();
                    self.hal.transmit_byte(byte);
                }
            }
        }
    }

    /// "发送完成" 中断处理
    ///
    /// 必须在中断上下文中调用。
    ///
    /// # Returns
    /// 唤醒了等待线程、需要在中断退出时调度时返回 `true`
    pub fn on_tx_done(&self) -> bool {
        if !self.hal.is_tx_irq() {
            return false;
        }
        self.hal.clr_tx_irq();

        let woken = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            match s.buffer.remove() {
                Some(byte) => {
                    self.hal.transmit_byte(byte);
                    None
                }
                None => {
                    self.hal.disable_tx_irq();
                    s.waiter.take()
                }
            }
        });

        woken.is_some_and(|handle| self.waiter.su_signal(&handle))
    }

    #[cfg(test)]
    fn has_waiter(&self) -> bool {
        self.state.lock(|s| s.borrow().waiter.is_some())
    }
}

impl<'a, M: RawMutex, H: UartFifoHal, W: ThreadWaiter> Transmitter<'a, M, H, W> {
    /// 发送 FIFO 中断处理
    ///
    /// 把环形缓冲区的连续已用区域直接写入硬件 FIFO，直到 FIFO 满或
    /// 缓冲区空；缓冲区空时关闭发送中断并唤醒等待线程。
    pub fn on_tx_fifo_done(&self) -> bool {
        if !self.hal.is_tx_irq() {
            return false;
        }
        self.hal.clr_tx_irq();

        let woken = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            loop {
                let region = s.buffer.peek_next_remove_region();
                let len = region.len();
                if len == 0 {
                    break;
                }
                let n = self.hal.write_tx_fifo(&region);
                region.commit_removed(n);
                if n < len {
                    break;
                }
            }

            if s.buffer.is_empty() {
                self.hal.disable_tx_irq();
                s.waiter.take()
            } else {
                None
            }
        });

        woken.is_some_and(|handle| self.waiter.su_signal(&handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TX_BUF_SIZE;
    use crate::sync::ParkWaiter;
    use crate::uart::sim::SimUart;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    type SimTransmitter<'a> = Transmitter<'a, CriticalSectionRawMutex, &'a SimUart, ParkWaiter>;

    fn transmitter<'a>(uart: &'a SimUart, mem: &'a mut [u8], mode: FirstTxMode) -> SimTransmitter<'a> {
        Transmitter::new(uart, ParkWaiter, mem, mode)
    }

    /// 模拟中断: 发送中断使能期间持续触发
    fn drain(tx: &SimTransmitter<'_>, uart: &SimUart) {
        while uart.is_tx_irq_enabled() {
            tx.on_tx_done();
        }
    }

    #[test]
    fn test_write_before_start_fails() {
        let uart = SimUart::new();
        let mut mem = [0u8; 8];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Interrupt);

        assert_eq!(tx.write(b"x"), Err(Error::NotStarted));
        assert!(uart.wire().is_empty());
    }

    #[test]
    fn test_start_enables_tx_only() {
        let uart = SimUart::new();
        let mut mem = [0u8; 8];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Interrupt);

        tx.start();
        assert!(uart.tx_enabled());
        assert!(!uart.is_tx_irq_enabled());
        assert_eq!(tx.write(&[]), Ok(()));
        assert!(!uart.is_tx_irq_enabled());
    }

    #[test]
    fn test_write_stages_and_isr_drains() {
        let uart = SimUart::new();
        let mut mem = [0u8; 8];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Interrupt);
        tx.start();

        assert_eq!(tx.write(b"hello"), Ok(()));
        assert_eq!(tx.pending(), 5);
        assert!(uart.is_tx_irq_enabled());
        assert!(uart.wire().is_empty());

        drain(&tx, &uart);
        assert_eq!(uart.wire(), b"hello");
        assert_eq!(tx.pending(), 0);
        assert!(!uart.is_tx_irq_enabled());
    }

    #[test]
    fn test_manual_first_byte() {
        let uart = SimUart::new();
        let mut mem = [0u8; 8];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Manual);
        tx.start();

        assert_eq!(tx.write(b"abc"), Ok(()));
        assert_eq!(uart.pipe_resets(), 1);
        assert_eq!(uart.wire(), b"a");
        assert_eq!(tx.pending(), 2);

        // 中断已使能，后续写入不再复位发送管道
        assert_eq!(tx.write(b"d"), Ok(()));
        assert_eq!(uart.pipe_resets(), 1);

        drain(&tx, &uart);
        assert_eq!(uart.wire(), b"abcd");
    }

    #[test]
    fn test_oversize_write_completes_across_drains() {
        let uart = SimUart::new();
        let mut mem = [0u8; 7];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Interrupt);
        tx.start();

        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        std::thread::scope(|s| {
            let writer = s.spawn(|| tx.write(&payload));

            while !writer.is_finished() {
                tx.on_tx_done();
                std::thread::yield_now();
            }
            assert_eq!(writer.join().unwrap(), Ok(()));
        });

        drain(&tx, &uart);
        assert_eq!(uart.wire(), payload);
    }

    #[test]
    fn test_stop_releases_blocked_writer() {
        let uart = SimUart::new();
        let mut mem = [0u8; 4];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Interrupt);
        tx.start();

        std::thread::scope(|s| {
            let writer = s.spawn(|| tx.write(b"0123456789"));

            while !tx.has_waiter() {
                std::thread::yield_now();
            }
            tx.stop();

            assert_eq!(writer.join().unwrap(), Err(Error::Stopped));
        });

        assert!(!tx.is_started());
        assert_eq!(tx.pending(), 0);
        assert!(!uart.is_tx_irq_enabled());
    }

    #[test]
    fn test_flush_waits_for_isr_to_empty_buffer() {
        let uart = SimUart::new();
        let mut mem = [0u8; DEFAULT_TX_BUF_SIZE];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Interrupt);
        tx.start();

        assert_eq!(tx.write(b"flush"), Ok(()));
        std::thread::scope(|s| {
            let flusher = s.spawn(|| tx.flush());

            while !flusher.is_finished() {
                tx.on_tx_done();
                std::thread::yield_now();
            }
            assert_eq!(flusher.join().unwrap(), Ok(()));
        });
        assert_eq!(uart.wire(), b"flush");
        assert_eq!(tx.flush(), Ok(()));
    }

    #[test]
    fn test_fifo_isr_feeds_in_chunks() {
        let uart = SimUart::new();
        uart.set_tx_fifo_room(3);
        let mut mem = [0u8; 16];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Interrupt);
        tx.start();

        assert_eq!(tx.write(b"fifo-burst"), Ok(()));
        assert!(!tx.on_tx_fifo_done());
        assert_eq!(uart.wire(), b"fif");

        while uart.is_tx_irq_enabled() {
            tx.on_tx_fifo_done();
        }
        assert_eq!(uart.wire(), b"fifo-burst");
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    #[should_panic(expected = "at least one byte")]
    fn test_single_slot_storage_rejected() {
        let uart = SimUart::new();
        let mut mem = [0u8; 1];
        let _ = transmitter(&uart, &mut mem, FirstTxMode::Manual);
    }

    #[test]
    fn test_restart_releases_blocked_writer() {
        let uart = SimUart::new();
        let mut mem = [0u8; 4];
        let tx = transmitter(&uart, &mut mem, FirstTxMode::Interrupt);
        tx.start();

        std::thread::scope(|s| {
            let writer = s.spawn(|| tx.write(b"0123456789"));

            while !tx.has_waiter() {
                std::thread::yield_now();
            }
            tx.start();

            assert_eq!(writer.join().unwrap(), Err(Error::Stopped));
        });

        assert!(tx.is_started());
        assert_eq!(tx.pending(), 0);

        // 新会话正常工作
        assert_eq!(tx.write(b"ok"), Ok(()));
        drain(&tx, &uart);
        assert!(uart.wire().ends_with(b"ok"));
    }
}
