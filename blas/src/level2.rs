use crate::{BlasError, Layout, Scalar, Uplo, blas_assert, required_len};

/// 对称秩 2 更新 `A := alpha·x·yᵀ + alpha·y·xᵀ + A`，只写 `uplo` 指定的三角。
///
/// 复数也是对称（而非 Hermite）更新，不取共轭。
#[allow(clippy::too_many_arguments)]
pub fn syr2<T: Scalar>(
    layout: Layout,
    uplo: Uplo,
    n: usize,
    alpha: T,
    x: &[T],
    incx: isize,
    y: &[T],
    incy: isize,
    a: &mut [T],
    lda: usize,
) -> Result<(), BlasError> {
    const NAME: &str = "syr2";
    blas_assert!(NAME, 2, uplo != Uplo::General, "uplo must be upper or lower");
    blas_assert!(NAME, 6, incx != 0, "incx must not be zero");
    blas_assert!(NAME, 8, incy != 0, "incy must not be zero");
    blas_assert!(NAME, 10, lda >= n.max(1), "lda < max(1, n)");
    blas_assert!(NAME, 5, x.len() >= vector_len(n, incx), "x too short");
    blas_assert!(NAME, 7, y.len() >= vector_len(n, incy), "y too short");
    blas_assert!(NAME, 9, a.len() >= required_len(n, n, lda), "A too short");

    if n == 0 || alpha == T::zero() {
        return Ok(());
    }

    // 对称矩阵的行主序存储等价于列主序存储的转置，只需交换三角
    let uplo = uplo.in_col_major(layout);
    let ix = |i| vector_index(n, i, incx);
    let iy = |i| vector_index(n, i, incy);
    for j in 0..n {
        let (xj, yj) = (x[ix(j)], y[iy(j)]);
        if xj == T::zero() && yj == T::zero() {
            continue;
        }
        let temp1 = alpha * yj;
        let temp2 = alpha * xj;
        let rows = match uplo {
            Uplo::Upper => 0..j + 1,
            _ => j..n,
        };
        for i in rows {
            a[i + j * lda] += x[ix(i)] * temp1 + y[iy(i)] * temp2;
        }
    }
    Ok(())
}

/// 长度为 `n`、步长为 `inc` 的向量占用的元素数。
#[inline]
pub(crate) fn vector_len(n: usize, inc: isize) -> usize {
    if n == 0 {
        0
    } else {
        (n - 1).saturating_mul(inc.unsigned_abs()).saturating_add(1)
    }
}

/// 负步长时第 0 个逻辑元素位于存储末尾。
#[inline]
fn vector_index(n: usize, i: usize, inc: isize) -> usize {
    if inc > 0 {
        i * inc as usize
    } else {
        (n - 1 - i) * inc.unsigned_abs()
    }
}
