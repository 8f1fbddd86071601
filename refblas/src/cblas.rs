use crate::{LapackError, lapack_assert, ssq::Ssq};
use blas::{Layout, Op, Scalar, Uplo};

/// 参考对称秩 2k 更新，按逻辑下标逐元素求值。
///
/// 与被测 kernel 不共享任何代码：不做行主序到列主序的变换，内积在最内层累加。
#[allow(clippy::too_many_arguments)]
pub fn syr2k<T: Scalar>(
    layout: Layout,
    uplo: Uplo,
    trans: Op,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) -> Result<(), LapackError> {
    const NAME: &str = "cblas_syr2k";
    lapack_assert!(NAME, 2, uplo != Uplo::General, "uplo must be upper or lower");
    lapack_assert!(
        NAME,
        3,
        !(T::IS_COMPLEX && trans == Op::ConjTrans),
        "conjugate transpose is not supported for complex types"
    );
    let (rows, cols) = match trans {
        Op::NoTrans => (n, k),
        _ => (k, n),
    };
    let ld_min = match layout {
        Layout::ColMajor => rows,
        Layout::RowMajor => cols,
    }
    .max(1);
    lapack_assert!(NAME, 8, lda >= ld_min, "lda too small");
    lapack_assert!(NAME, 10, ldb >= ld_min, "ldb too small");
    lapack_assert!(NAME, 13, ldc >= n.max(1), "ldc < max(1, n)");

    // op(M)(i, l)
    let op = |m: &[T], ld: usize, i: usize, l: usize| match trans {
        Op::NoTrans => m[layout.index(i, l, ld)],
        _ => m[layout.index(l, i, ld)],
    };
    for j in 0..n {
        for i in (0..n).filter(|&i| uplo.contains(i, j)) {
            let mut sum = T::zero();
            for l in 0..k {
                sum += op(a, lda, i, l) * op(b, ldb, j, l) + op(b, ldb, i, l) * op(a, lda, j, l);
            }
            let c = &mut c[layout.index(i, j, ldc)];
            *c = if beta == T::zero() {
                alpha * sum
            } else {
                alpha * sum + beta * *c
            };
        }
    }
    Ok(())
}

/// 逻辑元素 `i` 在步长为 `inc` 的向量中的位置。
#[inline]
fn element(n: usize, i: usize, inc: isize) -> usize {
    if inc >= 0 {
        i * inc as usize
    } else {
        (n - 1 - i) * inc.unsigned_abs()
    }
}

/// `y := x`。
pub fn copy<T: Copy>(n: usize, x: &[T], incx: isize, y: &mut [T], incy: isize) {
    for i in 0..n {
        y[element(n, i, incy)] = x[element(n, i, incx)]
    }
}

/// 2-范数，带缩放以避免中间结果上溢。复数为各分量平方和的平方根。
pub fn nrm2<T: Scalar>(n: usize, x: &[T], incx: usize) -> T::Real {
    let mut ssq = Ssq::new();
    if incx > 0 {
        x.iter().step_by(incx).take(n).for_each(|&x| ssq.add_scalar(x));
    }
    ssq.sqrt()
}

#[cfg(test)]
mod test {
    use super::*;
    use num_complex::Complex;

    #[test]
    fn test_syr2k_matches_kernel() {
        const N: usize = 4;
        const K: usize = 3;
        const LD: usize = 5;
        let a = (0..LD * LD).map(|i| (i as f64 * 0.37).sin()).collect::<Vec<_>>();
        let b = (0..LD * LD).map(|i| (i as f64 * 0.91).cos()).collect::<Vec<_>>();
        let c0 = (0..LD * LD).map(|i| i as f64 / 10.).collect::<Vec<_>>();

        for layout in [Layout::ColMajor, Layout::RowMajor] {
            for uplo in [Uplo::Upper, Uplo::Lower] {
                for trans in [Op::NoTrans, Op::Trans] {
                    let mut expect = c0.clone();
                    let mut result = c0.clone();
                    syr2k(layout, uplo, trans, N, K, 1.5, &a, LD, &b, LD, 0.25, &mut expect, LD)
                        .unwrap();
                    blas::syr2k(layout, uplo, trans, N, K, 1.5, &a, LD, &b, LD, 0.25, &mut result, LD)
                        .unwrap();
                    let (max, _) = test_utils::diff(&result, &expect);
                    assert!(max < 1e-13, "{layout:?} {uplo:?} {trans:?}: {max:e}");
                }
            }
        }
    }

    #[test]
    fn test_syr2k_complex_symmetric() {
        let i = Complex::new(0f64, 1.);
        let one = Complex::new(1., 0.);
        let mut c = [Complex::new(0., 0.)];
        // 2·i·i = -2，结果不取共轭
        syr2k(Layout::ColMajor, Uplo::Lower, Op::Trans, 1, 1, one, &[i], 1, &[i], 1, one, &mut c, 1)
            .unwrap();
        assert_eq!(c[0], Complex::new(-2., 0.));
    }

    #[test]
    fn test_syr2k_invalid() {
        let mut c = [0.; 4];
        let e = syr2k(
            Layout::ColMajor, Uplo::General, Op::NoTrans, 2, 1, 1., &[0.; 2], 2, &[0.; 2], 2, 0.,
            &mut c, 2,
        );
        assert!(matches!(e, Err(LapackError::InvalidArgument { pos: 2, .. })));
    }

    #[test]
    fn test_copy() {
        let x = [1, 2, 3];
        let mut y = [0; 6];
        copy(3, &x, 1, &mut y, -2);
        assert_eq!(y, [3, 0, 2, 0, 1, 0]);
    }

    #[test]
    fn test_nrm2() {
        assert_eq!(nrm2(2, &[3f64, 0., 4.], 2), 5.);
        assert_eq!(nrm2::<f32>(0, &[], 1), 0.);
        let z = [Complex::new(1f64, 2.), Complex::new(2., 4.)];
        assert!((nrm2(2, &z, 1) - 5.).abs() < 1e-15);
    }
}
