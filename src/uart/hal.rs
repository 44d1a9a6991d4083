//! UART 硬件抽象层契约
//!
//! 驱动只依赖寄存器级别的操作，波特率、帧格式、引脚复用等初始化
//! 由应用在启动驱动之前完成 (平台差异太大，不适合统一的 init)。
//!
//! 所有方法都取 `&self`: 寄存器本身就是共享的，线程与 ISR 都会访问。
//! 名为 enable/disable 的操作必须是幂等的；每一对 check + clear
//! 只处理一个硬件事件。

use auto_impl::auto_impl;

/// 寄存器型 UART 的逐字节操作
#[auto_impl(&)]
pub trait UartHal {
    // ===== 接收 =====

    /// 使能接收器
    fn enable_rx(&self);

    /// 关闭接收器
    fn disable_rx(&self);

    /// 使能 "接收数据可用" 中断
    fn enable_rx_irq(&self);

    /// 关闭 "接收数据可用" 中断
    fn disable_rx_irq(&self);

    /// 当前中断请求是否为接收中断
    fn is_rx_irq(&self) -> bool;

    /// 清除接收中断请求 (读数据寄存器即可清除时可以为空)
    fn clr_rx_irq(&self);

    /// 当前字节是否带有帧错误/奇偶错误/溢出
    fn is_rx_error(&self) -> bool;

    /// 清除当前字节的所有接收错误标志
    fn clr_rx_errors(&self);

    /// 最近接收的字节 (不论是否有错误)
    fn rx_byte(&self) -> u8;

    // ===== 发送 =====

    /// 使能发送器
    fn enable_tx(&self);

    /// 关闭发送器
    fn disable_tx(&self);

    /// 使能 "发送数据寄存器空" 中断
    fn enable_tx_irq(&self);

    /// 关闭 "发送数据寄存器空" 中断
    fn disable_tx_irq(&self);

    /// 发送中断当前是否使能
    fn is_tx_irq_enabled(&self) -> bool;

    /// 当前中断请求是否为发送完成中断
    fn is_tx_irq(&self) -> bool;

    /// 清除发送中断请求 (写数据寄存器即可清除时可以为空)
    fn clr_tx_irq(&self);

    /// 把字节写入发送数据寄存器并启动发送
    fn transmit_byte(&self, byte: u8);

    /// 为 "手动发送第一个字节" 复位/准备发送引擎
    fn reset_tx_pipe(&self);
}

/// 带硬件 FIFO 的 UART: 一次中断搬运多个字节
///
/// 驱动把环形缓冲区的连续区域直接交给这两个方法，
/// 硬件数据不经过中间缓冲区。
#[auto_impl(&)]
pub trait UartFifoHal: UartHal {
    /// 从接收 FIFO 读取最多 `dst.len()` 个字节
    ///
    /// # Returns
    /// 实际读取的字节数，FIFO 为空时返回 0
    fn read_rx_fifo(&self, dst: &mut [u8]) -> usize;

    /// 向发送 FIFO 写入最多 `src.len()` 个字节
    ///
    /// # Returns
    /// 实际接受的字节数，FIFO 已满时返回 0
    fn write_tx_fifo(&self, src: &[u8]) -> usize;
}
