use crate::{DeviceError, device::MemPool};
use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

/// 一块设备显存，释放发生在 drop 时且只发生一次。
///
/// 主机代码不能直接读写其内容，只能经由流上的拷贝或 kernel 访问。
pub struct DevMem<T> {
    pub(crate) id: usize,
    pub(crate) len: usize,
    pub(crate) bytes: usize,
    pub(crate) data: RefCell<Vec<T>>,
    pub(crate) pool: Rc<MemPool>,
}

impl<T> Drop for DevMem<T> {
    #[inline]
    fn drop(&mut self) {
        log::trace!("free device memory #{} ({} bytes)", self.id, self.bytes);
        self.pool.release(self.bytes)
    }
}

impl<T> fmt::Debug for DevMem<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DevMem(#{}, {} bytes)", self.id, self.bytes)
    }
}

impl<T> DevMem<T> {
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> DevPtr<'_, T> {
        DevPtr {
            mem: self,
            offset: 0,
        }
    }

    /// 按固定步长切出 `count` 个元素指针，对应批量运算的指针数组。
    pub fn ptrs(&self, stride: usize, count: usize) -> Vec<DevPtr<'_, T>> {
        assert!(
            stride.checked_mul(count).is_some_and(|len| len <= self.len()),
            "pointer table exceeds device memory"
        );
        (0..count).map(|i| self.as_ptr().add(i * stride)).collect()
    }

    pub(crate) fn borrow_range(
        &self,
        offset: usize,
        len: usize,
    ) -> Result<Ref<'_, [T]>, DeviceError> {
        let data = self
            .data
            .try_borrow()
            .map_err(|_| DeviceError::Aliased(self.id))?;
        self.check_range(offset, len, data.len())?;
        Ok(Ref::map(data, |v| &v[offset..][..len]))
    }

    pub(crate) fn borrow_range_mut(
        &self,
        offset: usize,
        len: usize,
    ) -> Result<RefMut<'_, [T]>, DeviceError> {
        let data = self
            .data
            .try_borrow_mut()
            .map_err(|_| DeviceError::Aliased(self.id))?;
        self.check_range(offset, len, data.len())?;
        Ok(RefMut::map(data, |v| &mut v[offset..][..len]))
    }

    fn check_range(&self, offset: usize, len: usize, capacity: usize) -> Result<(), DeviceError> {
        if offset.checked_add(len).is_some_and(|end| end <= capacity) {
            Ok(())
        } else {
            Err(DeviceError::OutOfBounds {
                id: self.id,
                offset,
                len,
                capacity,
            })
        }
    }
}

/// 指向 [`DevMem`] 内部的非拥有指针，有效期不超过所指的显存块。
pub struct DevPtr<'a, T> {
    mem: &'a DevMem<T>,
    offset: usize,
}

impl<T> Clone for DevPtr<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DevPtr<'_, T> {}

impl<T> fmt::Debug for DevPtr<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DevPtr(#{} + {})", self.mem.id, self.offset)
    }
}

impl<T> PartialEq for DevPtr<'_, T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.mem.id == other.mem.id && self.offset == other.offset
    }
}

impl<'a, T> DevPtr<'a, T> {
    #[inline]
    #[must_use]
    pub fn add(self, count: usize) -> Self {
        Self {
            mem: self.mem,
            offset: self.offset + count,
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub(crate) fn mem(&self) -> &'a DevMem<T> {
        self.mem
    }
}

#[test]
fn test_ptrs() {
    let dev = crate::Device::new(0);
    let mem = dev.malloc::<f32>(12).unwrap();
    let ptrs = mem.ptrs(4, 3);
    assert_eq!(
        ptrs.iter().map(DevPtr::offset).collect::<Vec<_>>(),
        [0, 4, 8]
    );
    assert!(ptrs[1] == mem.as_ptr().add(4));
    let other = dev.malloc::<f32>(4).unwrap();
    assert_ne!(other.id(), mem.id());
    assert!(other.as_ptr() != mem.as_ptr());
    // 元素窗口互不重叠且不越界
    assert!(mem.borrow_range(8, 4).is_ok());
    assert!(matches!(
        mem.borrow_range(9, 4),
        Err(DeviceError::OutOfBounds { offset: 9, .. })
    ));
}

#[test]
#[should_panic(expected = "pointer table exceeds device memory")]
fn test_ptrs_overflow() {
    let dev = crate::Device::new(0);
    let mem = dev.malloc::<u8>(4).unwrap();
    let _ = mem.ptrs(usize::MAX, 2);
}
