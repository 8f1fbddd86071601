use crate::{DevMem, DeviceError, Stream};
use std::{alloc::Layout, cell::Cell, cell::RefCell, fmt, rc::Rc};

/// 模拟设备的默认显存容量。
pub const DEFAULT_MEMORY: usize = 4 << 30;

pub struct Device {
    index: usize,
    pool: Rc<MemPool>,
}

/// 显存记账，所有 [`DevMem`] 共享。
pub(crate) struct MemPool {
    device: usize,
    capacity: usize,
    used: Cell<usize>,
    live: Cell<usize>,
    next_id: Cell<usize>,
}

impl MemPool {
    pub(crate) fn reserve(&self, bytes: usize) -> Result<usize, DeviceError> {
        let available = self.capacity - self.used.get();
        if bytes > available {
            return Err(DeviceError::OutOfMemory {
                device: self.device,
                requested: bytes,
                available,
            });
        }
        self.used.set(self.used.get() + bytes);
        self.live.set(self.live.get() + 1);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(id)
    }

    pub(crate) fn release(&self, bytes: usize) {
        debug_assert!(self.live.get() > 0 && self.used.get() >= bytes);
        self.used.set(self.used.get() - bytes);
        self.live.set(self.live.get() - 1);
    }
}

impl Device {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self::with_memory(index, DEFAULT_MEMORY)
    }

    pub fn with_memory(index: usize, bytes: usize) -> Self {
        Self {
            index,
            pool: Rc::new(MemPool {
                device: index,
                capacity: bytes,
                used: Cell::new(0),
                live: Cell::new(0),
                next_id: Cell::new(0),
            }),
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn total_memory(&self) -> usize {
        self.pool.capacity
    }

    /// 当前已分配的显存字节数。
    #[inline]
    pub fn allocated(&self) -> usize {
        self.pool.used.get()
    }

    /// 当前存活的显存块数量。
    #[inline]
    pub fn live_allocations(&self) -> usize {
        self.pool.live.get()
    }

    pub fn malloc<T: Copy + Default>(&self, len: usize) -> Result<DevMem<T>, DeviceError> {
        let oom = || DeviceError::OutOfMemory {
            device: self.index,
            requested: usize::MAX,
            available: self.pool.capacity - self.pool.used.get(),
        };
        let bytes = Layout::array::<T>(len).map_err(|_| oom())?.size();
        let id = self.pool.reserve(bytes)?;

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            self.pool.release(bytes);
            return Err(DeviceError::OutOfMemory {
                device: self.index,
                requested: bytes,
                available: self.pool.capacity - self.pool.used.get(),
            });
        }
        data.resize(len, T::default());

        log::trace!("device {}: malloc #{id} ({bytes} bytes)", self.index);
        Ok(DevMem {
            id,
            len,
            bytes,
            data: RefCell::new(data),
            pool: self.pool.clone(),
        })
    }

    #[inline]
    pub fn stream<'a>(&self) -> Stream<'a> {
        Stream::new(self.index)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "emulated device {} ({} MiB, {} MiB in use)",
            self.index,
            self.total_memory() >> 20,
            self.pool.used.get() >> 20,
        )
    }
}

#[test]
fn test_accounting() {
    let dev = Device::with_memory(0, 1024);
    assert_eq!(dev.total_memory(), 1024);
    {
        let a = dev.malloc::<f64>(64).unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(dev.allocated(), 512);
        assert_eq!(dev.live_allocations(), 1);

        let _b = dev.malloc::<f32>(128).unwrap();
        assert_eq!(dev.allocated(), 1024);

        let Err(DeviceError::OutOfMemory { available: 0, .. }) = dev.malloc::<u8>(1) else {
            panic!("allocation beyond capacity should fail")
        };
        assert_eq!(dev.live_allocations(), 2);
    }
    assert_eq!(dev.allocated(), 0);
    assert_eq!(dev.live_allocations(), 0);
}

#[test]
fn test_huge() {
    let dev = Device::new(0);
    assert!(dev.malloc::<f64>(usize::MAX / 4).is_err());
    assert_eq!(dev.allocated(), 0);
    assert_eq!(dev.live_allocations(), 0);
}
