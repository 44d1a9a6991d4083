//! 主机仿真的 UART 寄存器块 (仅测试)
//!
//! 接收侧是一个带错误标志的字节队列；发送侧把写入的字节追加到 `wire`。
//! 发送数据寄存器总是立即变空，所以只要发送中断使能，`is_tx_irq()` 就为真。

use std::collections::VecDeque;
use std::sync::Mutex;

use super::hal::{UartFifoHal, UartHal};

#[derive(Default)]
struct SimState {
    rx_enabled: bool,
    rx_irq_enabled: bool,
    rx_fifo: VecDeque<(u8, bool)>,
    tx_enabled: bool,
    tx_irq_enabled: bool,
    wire: Vec<u8>,
    pipe_resets: usize,
    tx_fifo_room: usize,
}

pub(crate) struct SimUart {
    state: Mutex<SimState>,
}

impl SimUart {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                tx_fifo_room: 4,
                ..Default::default()
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    /// 线路上到达若干正常字节
    pub fn inject(&self, bytes: &[u8]) {
        self.with(|s| s.rx_fifo.extend(bytes.iter().map(|&b| (b, false))));
    }

    /// 线路上到达一个带帧错误的字节
    pub fn inject_error(&self, byte: u8) {
        self.with(|s| s.rx_fifo.push_back((byte, true)));
    }

    pub fn rx_pending(&self) -> usize {
        self.with(|s| s.rx_fifo.len())
    }

    pub fn rx_enabled(&self) -> bool {
        self.with(|s| s.rx_enabled && s.rx_irq_enabled)
    }

    pub fn tx_enabled(&self) -> bool {
        self.with(|s| s.tx_enabled)
    }

    pub fn wire(&self) -> Vec<u8> {
        self.with(|s| s.wire.clone())
    }

    pub fn pipe_resets(&self) -> usize {
        self.with(|s| s.pipe_resets)
    }

    /// 把线路上已发出的字节送回接收队列 (回环)
    pub fn loop_back(&self) -> usize {
        self.with(|s| {
            let n = s.wire.len();
            let bytes: Vec<u8> = s.wire.drain(..).collect();
            s.rx_fifo.extend(bytes.into_iter().map(|b| (b, false)));
            n
        })
    }

    pub fn set_tx_fifo_room(&self, room: usize) {
        self.with(|s| s.tx_fifo_room = room);
    }
}

impl UartHal for SimUart {
    fn enable_rx(&self) {
        self.with(|s| s.rx_enabled = true);
    }

    fn disable_rx(&self) {
        self.with(|s| s.rx_enabled = false);
    }

    fn enable_rx_irq(&self) {
        self.with(|s| s.rx_irq_enabled = true);
    }

    fn disable_rx_irq(&self) {
        self.with(|s| s.rx_irq_enabled = false);
    }

    fn is_rx_irq(&self) -> bool {
        self.with(|s| s.rx_enabled && s.rx_irq_enabled && !s.rx_fifo.is_empty())
    }

    fn clr_rx_irq(&self) {}

    fn is_rx_error(&self) -> bool {
        self.with(|s| s.rx_enabled && s.rx_fifo.front().is_some_and(|&(_, err)| err))
    }

    fn clr_rx_errors(&self) {
        self.with(|s| {
            if s.rx_fifo.front().is_some_and(|&(_, err)| err) {
                s.rx_fifo.pop_front();
            }
        });
    }

    fn rx_byte(&self) -> u8 {
        self.with(|s| s.rx_fifo.pop_front().map_or(0, |(b, _)| b))
    }

    fn enable_tx(&self) {
        self.with(|s| s.tx_enabled = true);
    }

    fn disable_tx(&self) {
        self.with(|s| s.tx_enabled = false);
    }

    fn enable_tx_irq(&self) {
        self.with(|s| s.tx_irq_enabled = true);
    }

    fn disable_tx_irq(&self) {
        self.with(|s| s.tx_irq_enabled = false);
    }

    fn is_tx_irq_enabled(&self) -> bool {
        self.with(|s| s.tx_irq_enabled)
    }

    fn is_tx_irq(&self) -> bool {
        self.with(|s| s.tx_enabled && s.tx_irq_enabled)
    }

    fn clr_tx_irq(&self) {}

    fn transmit_byte(&self, byte: u8) {
        self.with(|s| s.wire.push(byte));
    }

    fn reset_tx_pipe(&self) {
        self.with(|s| s.pipe_resets += 1);
    }
}

impl UartFifoHal for SimUart {
    fn read_rx_fifo(&self, dst: &mut [u8]) -> usize {
        self.with(|s| {
            let mut n = 0;
            while n < dst.len() {
                match s.rx_fifo.pop_front() {
                    Some((b, _)) => {
                        dst[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            n
        })
    }

    fn write_tx_fifo(&self, src: &[u8]) -> usize {
        self.with(|s| {
            let n = src.len().min(s.tx_fifo_room);
            s.wire.extend_from_slice(&src[..n]);
            n
        })
    }
}
