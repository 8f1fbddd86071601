use crate::{DevMem, DevPtr, DeviceError};
use std::{
    cell::{Ref, RefCell, RefMut},
    collections::VecDeque,
    rc::Rc,
};

type Op<'a> = Box<dyn FnOnce(&Kernel) -> Result<(), DeviceError> + 'a>;

/// 有序执行队列。
///
/// 提交的操作不会立即执行，[`Stream::synchronize`] 按提交顺序执行所有操作并阻塞到完成。
pub struct Stream<'a> {
    device: usize,
    queue: RefCell<VecDeque<(&'static str, Op<'a>)>>,
}

/// kernel 执行期间的设备侧访问权，只由 [`Stream::synchronize`] 构造。
pub struct Kernel {
    _private: (),
}

impl Kernel {
    #[inline]
    pub fn read<'p, T>(&self, ptr: DevPtr<'p, T>, len: usize) -> Result<Ref<'p, [T]>, DeviceError> {
        ptr.mem().borrow_range(ptr.offset(), len)
    }

    #[inline]
    pub fn write<'p, T>(
        &self,
        ptr: DevPtr<'p, T>,
        len: usize,
    ) -> Result<RefMut<'p, [T]>, DeviceError> {
        ptr.mem().borrow_range_mut(ptr.offset(), len)
    }
}

/// 设备到主机拷贝的结果，同步之前不可读。
pub struct Pending<T>(Rc<RefCell<Option<Vec<T>>>>);

impl<T> Pending<T> {
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub fn take(self) -> Result<Vec<T>, DeviceError> {
        self.0.borrow_mut().take().ok_or(DeviceError::NotSynchronized)
    }
}

impl Drop for Stream<'_> {
    #[inline]
    fn drop(&mut self) {
        if let Err(e) = self.synchronize() {
            log::warn!("stream on device {} dropped with error: {e}", self.device)
        }
    }
}

impl<'a> Stream<'a> {
    #[inline]
    pub(crate) fn new(device: usize) -> Self {
        Self {
            device,
            queue: RefCell::new(VecDeque::new()),
        }
    }

    #[inline]
    pub fn device(&self) -> usize {
        self.device
    }

    /// 已提交但尚未执行的操作数。
    #[inline]
    pub fn pending_ops(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn launch(
        &self,
        name: &'static str,
        f: impl FnOnce(&Kernel) -> Result<(), DeviceError> + 'a,
    ) {
        log::trace!("device {}: enqueue {name}", self.device);
        self.queue.borrow_mut().push_back((name, Box::new(f)))
    }

    pub fn memcpy_h2d<T: Copy + 'static>(
        &self,
        dst: &'a DevMem<T>,
        src: &[T],
    ) -> Result<(), DeviceError> {
        if src.len() != dst.len() {
            return Err(DeviceError::SizeMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        // 暂存主机数据，提交后主机侧即可复用源缓冲
        let staging = src.to_vec();
        self.launch("memcpy_h2d", move |kernel| {
            kernel
                .write(dst.as_ptr(), staging.len())?
                .copy_from_slice(&staging);
            Ok(())
        });
        Ok(())
    }

    pub fn memcpy_d2h<T: Copy + 'static>(&self, src: &'a DevMem<T>) -> Pending<T> {
        let slot = Rc::new(RefCell::new(None));
        let pending = Pending(slot.clone());
        self.launch("memcpy_d2h", move |kernel| {
            let data = kernel.read(src.as_ptr(), src.len())?.to_vec();
            *slot.borrow_mut() = Some(data);
            Ok(())
        });
        pending
    }

    /// 按序执行队列中的全部操作。
    ///
    /// 遇到错误时丢弃剩余操作并返回第一个错误。
    pub fn synchronize(&self) -> Result<(), DeviceError> {
        let kernel = Kernel { _private: () };
        loop {
            let Some((name, op)) = self.queue.borrow_mut().pop_front() else {
                return Ok(());
            };
            if let Err(e) = op(&kernel) {
                let dropped = self.queue.borrow_mut().drain(..).count();
                log::warn!(
                    "device {}: {name} failed ({e}), {dropped} queued op(s) dropped",
                    self.device
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{Device, DeviceError};

    #[test]
    fn test_deferred() {
        let dev = Device::new(3);
        let mem = dev.malloc::<f32>(4).unwrap();
        let stream = dev.stream();
        assert_eq!(stream.device(), 3);

        stream.memcpy_h2d(&mem, &[1., 2., 3., 4.]).unwrap();
        stream.launch("scale", |kernel| {
            kernel.write(mem.as_ptr().add(2), 2)?[1] *= 10.;
            Ok(())
        });
        let result = stream.memcpy_d2h(&mem);
        assert_eq!(stream.pending_ops(), 3);
        // 同步之前不可读
        assert!(!result.is_ready());

        stream.synchronize().unwrap();
        assert_eq!(stream.pending_ops(), 0);
        assert_eq!(result.take().unwrap(), [1., 2., 3., 40.]);
    }

    #[test]
    fn test_read_before_sync() {
        let dev = Device::new(0);
        let mem = dev.malloc::<f64>(2).unwrap();
        let stream = dev.stream();
        let result = stream.memcpy_d2h(&mem);
        assert_eq!(result.take(), Err(DeviceError::NotSynchronized));
    }

    #[test]
    fn test_error_drops_queue() {
        let dev = Device::new(0);
        let mem = dev.malloc::<u32>(2).unwrap();
        let stream = dev.stream();

        stream.launch("overrun", |kernel| {
            kernel.write(mem.as_ptr().add(1), 2)?.fill(7);
            Ok(())
        });
        let result = stream.memcpy_d2h(&mem);
        assert!(matches!(
            stream.synchronize(),
            Err(DeviceError::OutOfBounds { offset: 1, len: 2, .. })
        ));
        assert_eq!(stream.pending_ops(), 0);
        assert!(!result.is_ready());
    }

    #[test]
    fn test_size_mismatch() {
        let dev = Device::new(0);
        let mem = dev.malloc::<u8>(3).unwrap();
        let stream = dev.stream();
        assert_eq!(
            stream.memcpy_h2d(&mem, &[0; 4]),
            Err(DeviceError::SizeMismatch { src: 4, dst: 3 })
        );
        assert_eq!(stream.pending_ops(), 0);
    }
}
