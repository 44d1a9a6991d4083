//! 字节流适配
//!
//! 接收器/发送器实现 `embedded-io` 的阻塞读写 trait，可以直接交给
//! 任何基于 `embedded_io::{Read, Write}` 的协议层。驱动方法只需要 `&self`，
//! 所以引用 (`&Receiver` / `&Transmitter`) 同样实现了这些 trait，
//! 一个驱动可以同时被多处持有。
//!
//! `SerialStream` 把一个输入流和一个输出流组合成全双工流。

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io::{ErrorType, Read, ReadReady, Write};
use heapless::Vec;

use super::hal::UartHal;
use super::receiver::Receiver;
use super::transmitter::Transmitter;
use super::Error;
use crate::sync::ThreadWaiter;

// ===== Receiver =====

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> ErrorType for Receiver<'_, M, H, W> {
    type Error = Error;
}

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> ErrorType for &Receiver<'_, M, H, W> {
    type Error = Error;
}

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> Read for Receiver<'_, M, H, W> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        Receiver::read(self, buf)
    }
}

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> Read for &Receiver<'_, M, H, W> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        Receiver::read(self, buf)
    }
}

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> ReadReady for Receiver<'_, M, H, W> {
    fn read_ready(&mut self) -> Result<bool, Error> {
        ready(self)
    }
}

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> ReadReady for &Receiver<'_, M, H, W> {
    fn read_ready(&mut self) -> Result<bool, Error> {
        ready(self)
    }
}

fn ready<M: RawMutex, H: UartHal, W: ThreadWaiter>(rx: &Receiver<'_, M, H, W>) -> Result<bool, Error> {
    if rx.is_started() {
        Ok(rx.available())
    } else {
        Err(Error::NotStarted)
    }
}

// ===== Transmitter =====

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> ErrorType for Transmitter<'_, M, H, W> {
    type Error = Error;
}

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> ErrorType for &Transmitter<'_, M, H, W> {
    type Error = Error;
}

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> Write for Transmitter<'_, M, H, W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        Transmitter::write(self, buf).map(|()| buf.len())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Transmitter::flush(self)
    }
}

impl<M: RawMutex, H: UartHal, W: ThreadWaiter> Write for &Transmitter<'_, M, H, W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        Transmitter::write(self, buf).map(|()| buf.len())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Transmitter::flush(self)
    }
}

// ===== 全双工流 =====

/// `read_until` 错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadUntilError<E> {
    /// 底层读取失败
    Io(E),
    /// 遇到结束符之前缓冲区已满
    Overflow,
    /// 输入流结束
    Eof,
}

/// 输入流 + 输出流
///
/// # Example
/// ```ignore
/// let mut stream = SerialStream::new(&rx, &tx);
/// stream.write_all(b"AT\r\n")?;
///
/// let mut line: heapless::Vec<u8, 64> = heapless::Vec::new();
/// stream.read_until(b'\n', &mut line)?;
/// ```
pub struct SerialStream<R, T> {
    input: R,
    output: T,
}

impl<R, T> SerialStream<R, T> {
    pub fn new(input: R, output: T) -> Self {
        Self { input, output }
    }

    pub fn input(&mut self) -> &mut R {
        &mut self.input
    }

    pub fn output(&mut self) -> &mut T {
        &mut self.output
    }

    /// 拆分为独立的输入流和输出流
    pub fn split(self) -> (R, T) {
        (self.input, self.output)
    }
}

impl<R: Read, T> SerialStream<R, T> {
    /// 逐字节读取并追加到 `line`，直到读到 `terminator` (包含在结果中)
    ///
    /// 逐字节读取保证结束符之后的数据留在驱动缓冲区中。
    ///
    /// # Returns
    /// 本次追加的字节数
    pub fn read_until<const N: usize>(
        &mut self,
        terminator: u8,
        line: &mut Vec<u8, N>,
    ) -> Result<usize, ReadUntilError<R::Error>> {
        let start = line.len();
        let mut byte = [0u8; 1];
        loop {
            if self.input.read(&mut byte).map_err(ReadUntilError::Io)? == 0 {
                return Err(ReadUntilError::Eof);
            }
            line.push(byte[0]).map_err(|_| ReadUntilError::Overflow)?;
            if byte[0] == terminator {
                return Ok(line.len() - start);
            }
        }
    }
}

impl<E, R, T> ErrorType for SerialStream<R, T>
where
    E: embedded_io::Error,
    R: ErrorType<Error = E>,
    T: ErrorType<Error = E>,
{
    type Error = E;
}

impl<E, R, T> Read for SerialStream<R, T>
where
    E: embedded_io::Error,
    R: Read<Error = E>,
    T: ErrorType<Error = E>,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, E> {
        self.input.read(buf)
    }
}

impl<E, R, T> ReadReady for SerialStream<R, T>
where
    E: embedded_io::Error,
    R: ReadReady<Error = E>,
    T: ErrorType<Error = E>,
{
    fn read_ready(&mut self) -> Result<bool, E> {
        self.input.read_ready()
    }
}

impl<E, R, T> Write for SerialStream<R, T>
where
    E: embedded_io::Error,
    R: ErrorType<Error = E>,
    T: Write<Error = E>,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, E> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> Result<(), E> {
        self.output.flush()
    }
}
