//! 测例缓冲区：主机上一块连续内存容纳整批元素，设备镜像同样布局。

use crate::HarnessError;
use blas::{Layout, Scalar};
use device::{DevMem, Device};

/// 向上取整到 `align` 的倍数，溢出时返回 `None`。
#[inline]
pub const fn roundup(x: usize, align: usize) -> Option<usize> {
    x.div_ceil(align).checked_mul(align)
}

/// 元素数超出 `usize` 表示范围的操作数。
#[inline]
pub fn too_large(operand: &'static str) -> HarnessError {
    HarnessError::HostAlloc {
        operand,
        elements: usize::MAX,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MatrixView {
    pub layout: Layout,
    pub rows: usize,
    pub cols: usize,
    pub ld: usize,
}

impl MatrixView {
    /// leading dimension 取次维度（至少为 1）向上对齐到 `align`。
    #[inline]
    pub fn aligned(layout: Layout, rows: usize, cols: usize, align: usize) -> Option<Self> {
        Some(Self {
            layout,
            rows,
            cols,
            ld: roundup(layout.minor(rows, cols).max(1), align)?,
        })
    }

    /// 按存储顺序的次维度，即列主序的行数。
    #[inline]
    pub fn minor(&self) -> usize {
        self.layout.minor(self.rows, self.cols)
    }

    #[inline]
    pub fn major(&self) -> usize {
        self.layout.major(self.rows, self.cols)
    }

    #[inline]
    pub fn size(&self) -> Option<usize> {
        self.ld.checked_mul(self.major())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VectorView {
    pub len: usize,
    pub inc: isize,
}

impl VectorView {
    #[inline]
    pub fn size(&self) -> Option<usize> {
        match self.len {
            0 => Some(0),
            n => (n - 1).checked_mul(self.inc.unsigned_abs())?.checked_add(1),
        }
    }
}

/// 一个操作数的整批主机存储，第 `s` 个元素位于 `[s·len, (s+1)·len)`。
pub struct HostArena<T> {
    name: &'static str,
    element_len: usize,
    data: Vec<T>,
}

impl<T: Scalar> HostArena<T> {
    pub fn alloc(name: &'static str, batch: usize, element_len: usize) -> Result<Self, HarnessError> {
        let err = |elements| HarnessError::HostAlloc {
            operand: name,
            elements,
        };
        let total = batch
            .checked_mul(element_len)
            .ok_or_else(|| err(usize::MAX))?;
        let mut data = Vec::new();
        data.try_reserve_exact(total).map_err(|_| err(total))?;
        data.resize(total, T::zero());
        log::debug!("host {name}: {batch} x {element_len} {}", T::NAME);
        Ok(Self {
            name,
            element_len,
            data,
        })
    }

    /// 在设备上分配同样大小的镜像，内容由流上的拷贝填充。
    #[inline]
    pub fn device_mirror(&self, device: &Device) -> Result<DevMem<T>, HarnessError> {
        log::debug!("device {}: mirror {}", device.index(), self.name);
        Ok(device.malloc(self.data.len())?)
    }
}

impl<T> HostArena<T> {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn element_len(&self) -> usize {
        self.element_len
    }

    #[inline]
    pub fn element(&self, s: usize) -> &[T] {
        &self.data[s * self.element_len..][..self.element_len]
    }

    #[inline]
    pub fn element_mut(&mut self, s: usize) -> &mut [T] {
        &mut self.data[s * self.element_len..][..self.element_len]
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use blas::Layout;
    use num_complex::Complex;

    #[test]
    fn test_roundup() {
        assert_eq!(roundup(5, 1), Some(5));
        assert_eq!(roundup(5, 4), Some(8));
        assert_eq!(roundup(8, 4), Some(8));
        assert_eq!(roundup(0, 32), Some(0));
        assert_eq!(roundup(usize::MAX - 1, 4), None);
    }

    #[test]
    fn test_views() {
        let a = MatrixView::aligned(Layout::ColMajor, 5, 3, 4).unwrap();
        assert_eq!((a.ld, a.size()), (8, Some(24)));
        let a = MatrixView::aligned(Layout::RowMajor, 5, 3, 4).unwrap();
        assert_eq!((a.ld, a.size()), (4, Some(20)));
        // 空矩阵的 leading dimension 至少为 1
        let a = MatrixView::aligned(Layout::ColMajor, 0, 0, 1).unwrap();
        assert_eq!((a.ld, a.size()), (1, Some(0)));
        // 元素数溢出
        let a = MatrixView::aligned(Layout::ColMajor, 1 << 33, 1 << 33, 1).unwrap();
        assert_eq!(a.size(), None);
        assert!(MatrixView::aligned(Layout::RowMajor, 1, usize::MAX, 8).is_none());

        assert_eq!(VectorView { len: 4, inc: -3 }.size(), Some(10));
        assert_eq!(VectorView { len: 0, inc: 2 }.size(), Some(0));
        assert_eq!(VectorView { len: 1 << 40, inc: 1 << 30 }.size(), None);
    }

    #[test]
    fn test_arena() {
        let mut arena = HostArena::<f32>::alloc("A", 3, 4).unwrap();
        arena.element_mut(1).fill(1.);
        assert_eq!(arena.as_slice(), [0., 0., 0., 0., 1., 1., 1., 1., 0., 0., 0., 0.]);
        assert_eq!(arena.element(2), [0.; 4]);

        let empty = HostArena::<f64>::alloc("C", 4, 0).unwrap();
        assert!(empty.element(3).is_empty());
    }

    #[test]
    fn test_alloc_failure() {
        let Err(HarnessError::HostAlloc { operand: "B", .. }) =
            HostArena::<f64>::alloc("B", usize::MAX / 2, 4)
        else {
            panic!("oversized allocation should fail")
        };
    }

    #[test]
    fn test_device_mirror() {
        let dev = Device::new(0);
        let arena = HostArena::<f64>::alloc("A", 2, 8).unwrap();
        {
            let mirror = arena.device_mirror(&dev).unwrap();
            assert_eq!(mirror.len(), 16);
            assert_eq!(dev.allocated(), 128);
        }
        assert_eq!(dev.live_allocations(), 0);

        let small = Device::with_memory(0, 64);
        assert!(matches!(
            arena.device_mirror(&small),
            Err(HarnessError::Device(device::DeviceError::OutOfMemory { .. }))
        ));
    }

    fn mirror<T: Scalar>() {
        let dev = Device::new(0);
        let arena = HostArena::<T>::alloc("C", 2, 3).unwrap();
        assert_eq!((arena.name(), arena.element_len()), ("C", 3));
        let mem = arena.device_mirror(&dev).unwrap();
        assert_eq!(mem.len(), 6);
        assert_eq!(dev.allocated(), 6 * size_of::<T>());
    }

    #[test]
    fn test_mirror_all_types() {
        mirror::<f32>();
        mirror::<f64>();
        mirror::<Complex<f32>>();
        mirror::<Complex<f64>>();
    }
}
