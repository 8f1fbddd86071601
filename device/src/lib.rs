//! 主机模拟的加速器。
//!
//! 流上的拷贝与 kernel 只在 [`Stream::synchronize`] 时按提交顺序执行，
//! 主机代码只能通过 [`Pending`] 在同步之后取得设备写出的数据。

mod dev_mem;
mod device;
mod stream;

pub use dev_mem::{DevMem, DevPtr};
pub use device::{DEFAULT_MEMORY, Device};
pub use stream::{Kernel, Pending, Stream};

#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
pub enum DeviceError {
    #[error("device {device}: cannot allocate {requested} bytes, {available} bytes available")]
    OutOfMemory {
        device: usize,
        requested: usize,
        available: usize,
    },
    #[error("device memory #{id}: access [{offset}, {offset}+{len}) out of {capacity} elements")]
    OutOfBounds {
        id: usize,
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error("device memory #{0} is already borrowed by another access")]
    Aliased(usize),
    #[error("copy of {src} elements into {dst} elements")]
    SizeMismatch { src: usize, dst: usize },
    #[error("device data read before the stream was synchronized")]
    NotSynchronized,
}
