//! 设备上的批量运算。

use crate::{BlasError, Layout, Op, Scalar, Uplo, blas_assert, level3};
use device::{DevPtr, Stream};

/// 长度为 1 的参数广播到所有批元素。
#[inline]
fn at<T: Copy>(v: &[T], s: usize) -> T {
    if v.len() == 1 { v[0] } else { v[s] }
}

struct Job<'a, T> {
    uplo: Uplo,
    trans: Op,
    n: usize,
    k: usize,
    alpha: T,
    beta: T,
    a: (DevPtr<'a, T>, usize, usize),
    b: (DevPtr<'a, T>, usize, usize),
    c: (DevPtr<'a, T>, usize, usize),
}

/// 批量对称秩 2k 更新，整批作为一个 kernel 提交到 `stream`。
///
/// 标量参数的切片长度为 1（广播）或 `batch`。批元素的参数错误写入 `info[s]`（`-参数位置`），
/// 合法元素的 `info[s]` 为 0，并在 `stream` 同步时计算。
/// `info` 为空时跳过的元素只记录日志。批级别的参数错误直接返回，不提交任何工作。
#[allow(clippy::too_many_arguments)]
pub fn syr2k<'a, T: Scalar>(
    layout: Layout,
    uplo: &[Uplo],
    trans: &[Op],
    n: &[usize],
    k: &[usize],
    alpha: &[T],
    a: &[DevPtr<'a, T>],
    lda: &[usize],
    b: &[DevPtr<'a, T>],
    ldb: &[usize],
    beta: &[T],
    c: &[DevPtr<'a, T>],
    ldc: &[usize],
    batch: usize,
    info: &mut [i64],
    stream: &Stream<'a>,
) -> Result<(), BlasError> {
    const NAME: &str = "batch::syr2k";
    macro_rules! broadcast {
        ($($arg:ident => $pos:literal),+) => {
            $( blas_assert!(NAME, $pos, $arg.len() == 1 || $arg.len() == batch, "length must be 1 or batch"); )+
        };
    }
    broadcast!(uplo => 2, trans => 3, n => 4, k => 5, alpha => 6, lda => 8, ldb => 10, beta => 11, ldc => 13);
    blas_assert!(NAME, 7, a.len() >= batch, "fewer A pointers than batch");
    blas_assert!(NAME, 9, b.len() >= batch, "fewer B pointers than batch");
    blas_assert!(NAME, 12, c.len() >= batch, "fewer C pointers than batch");
    blas_assert!(NAME, 15, info.is_empty() || info.len() == batch, "info length must be 0 or batch");

    let mut jobs = Vec::with_capacity(batch);
    for s in 0..batch {
        let (uplo, trans, n, k) = (at(uplo, s), at(trans, s), at(n, s), at(k, s));
        let (lda, ldb, ldc) = (at(lda, s), at(ldb, s), at(ldc, s));
        let code = match level3::validate::<T>(NAME, layout, uplo, trans, n, k, lda, ldb, ldc) {
            Ok([a_len, b_len, c_len]) => {
                jobs.push(Job {
                    uplo,
                    trans,
                    n,
                    k,
                    alpha: at(alpha, s),
                    beta: at(beta, s),
                    a: (a[s], a_len, lda),
                    b: (b[s], b_len, ldb),
                    c: (c[s], c_len, ldc),
                });
                0
            }
            Err(e) => {
                log::debug!("batch element {s} skipped: {e}");
                e.info()
            }
        };
        if let Some(info) = info.get_mut(s) {
            *info = code
        }
    }

    log::trace!("{NAME}: {} of {batch} element(s) queued", jobs.len());
    stream.launch("syr2k_batch", move |kernel| {
        for job in jobs {
            let a = kernel.read(job.a.0, job.a.1)?;
            let b = kernel.read(job.b.0, job.b.1)?;
            let mut c = kernel.write(job.c.0, job.c.1)?;
            level3::kernel(
                layout, job.uplo, job.trans, job.n, job.k, job.alpha, &a, job.a.2, &b, job.b.2,
                job.beta, &mut c, job.c.2,
            )
        }
        Ok(())
    });
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::{Layout, Op, Uplo};
    use device::{Device, DeviceError};

    #[test]
    fn test_deferred_batch() {
        const N: usize = 2;
        const BATCH: usize = 3;
        let dev = Device::new(0);
        let a = dev.malloc::<f64>(N * BATCH).unwrap();
        let c = dev.malloc::<f64>(N * N * BATCH).unwrap();
        let stream = dev.stream();

        let host_a = (0..N * BATCH).map(|i| i as f64).collect::<Vec<_>>();
        stream.memcpy_h2d(&a, &host_a).unwrap();
        stream.memcpy_h2d(&c, &[1.; N * N * BATCH]).unwrap();

        let pa = a.ptrs(N, BATCH);
        let pc = c.ptrs(N * N, BATCH);
        let mut info = [-1; BATCH];
        super::syr2k(
            Layout::ColMajor,
            &[Uplo::Lower],
            &[Op::NoTrans],
            &[N],
            &[1],
            &[0.5],
            &pa,
            &[N],
            &pa,
            &[N],
            &[0.],
            &pc,
            &[N],
            BATCH,
            &mut info,
            &stream,
        )
        .unwrap();
        assert_eq!(info, [0; BATCH]);

        let result = stream.memcpy_d2h(&c);
        assert!(!result.is_ready());
        stream.synchronize().unwrap();
        let result = result.take().unwrap();
        for s in 0..BATCH {
            let x = &host_a[s * N..][..N];
            let c = &result[s * N * N..][..N * N];
            // C = x·xᵀ，上三角保持原值
            assert_eq!(c, [x[0] * x[0], x[1] * x[0], 1., x[1] * x[1]]);
        }
    }

    #[test]
    fn test_per_element_info() {
        let dev = Device::new(0);
        let m = dev.malloc::<f32>(8).unwrap();
        let out = dev.malloc::<f32>(8).unwrap();
        let stream = dev.stream();
        let p = m.ptrs(4, 2);
        let pc = out.ptrs(4, 2);
        let mut info = [0; 2];
        super::syr2k(
            Layout::ColMajor,
            &[Uplo::Upper, Uplo::General],
            &[Op::NoTrans],
            &[2],
            &[2],
            &[1.],
            &p,
            &[2, 1],
            &p,
            &[2],
            &[1.],
            &pc,
            &[2],
            2,
            &mut info,
            &stream,
        )
        .unwrap();
        assert_eq!(info, [0, -2]);
    }

    #[test]
    fn test_batch_level_error() {
        let dev = Device::new(0);
        let m = dev.malloc::<f64>(4).unwrap();
        let stream = dev.stream();
        let p = m.ptrs(2, 2);
        let e = super::syr2k(
            Layout::ColMajor,
            &[Uplo::Upper],
            &[Op::NoTrans, Op::NoTrans, Op::NoTrans],
            &[1],
            &[1],
            &[1.],
            &p,
            &[1],
            &p,
            &[1],
            &[1.],
            &p,
            &[1],
            2,
            &mut [],
            &stream,
        )
        .unwrap_err();
        assert_eq!(e.info(), -3);
        assert_eq!(stream.pending_ops(), 0);
    }

    #[test]
    fn test_out_of_bounds_at_sync() {
        let dev = Device::new(0);
        let m = dev.malloc::<f64>(3).unwrap();
        let out = dev.malloc::<f64>(3).unwrap();
        let stream = dev.stream();
        let p = [m.as_ptr()];
        let pc = [out.as_ptr()];
        let mut info = [0];
        // C 需要 4 个元素，越界只在执行时发现
        super::syr2k(
            Layout::ColMajor,
            &[Uplo::Upper],
            &[Op::NoTrans],
            &[2],
            &[0],
            &[1.],
            &p,
            &[2],
            &p,
            &[2],
            &[2.],
            &pc,
            &[2],
            1,
            &mut info,
            &stream,
        )
        .unwrap();
        assert_eq!(info, [0]);
        assert!(matches!(
            stream.synchronize(),
            Err(DeviceError::OutOfBounds { .. })
        ));
    }
}
